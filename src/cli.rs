//! `sdcm` command-line front end.
//!
//! [`run`] prints the banner, parses the flags, loads credentials, and hands the selected command to a
//! [`Session`]. Every run ends by printing the correlation id and the [`ExitStatus`], which becomes the
//! process exit code.

pub mod args;
pub mod commands;
pub mod exit;
pub mod render;

pub use args::{Args, Command, ListKind};
pub use commands::Session;
pub use exit::ExitStatus;

// std
use std::ffi::OsString;
// crates.io
use clap::{Parser, error::ErrorKind};
use tracing_subscriber::EnvFilter;
// self
use crate::{
	_prelude::*,
	api::DevCenterClient,
	auth::load_credentials,
	blob::AzureBlobClient,
	http::ReqwestTransport,
	invoke::{InvokerConfig, ResilientHttpInvoker, new_correlation_id},
	poll::PollConfig,
};

/// Pause before every API call of a run.
pub const REQUEST_DELAY: Duration = Duration::from_millis(250);

/// Runs `sdcm` with the process arguments.
pub async fn run() -> ExitStatus {
	run_from(std::env::args_os()).await
}

/// Runs `sdcm` with `args` (the first item is the program name).
pub async fn run_from<I, A>(args: I) -> ExitStatus
where
	I: IntoIterator<Item = A>,
	A: Into<OsString> + Clone,
{
	println!("sdcm v{}", env!("CARGO_PKG_VERSION"));

	let correlation_id = new_correlation_id();
	let status = match Args::try_parse_from(args) {
		Ok(args) => {
			install_reporting(args.verbose);

			execute(&args, &correlation_id).await
		},
		Err(e) => parse_failure(e),
	};

	println!("Correlation Id: {correlation_id}");
	println!("Return: {status}");

	status
}

/// Installs `color-eyre` and a stderr `tracing` subscriber; `RUST_LOG` wins over `-v`.
pub fn install_reporting(verbosity: u8) {
	let _ = color_eyre::install();
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		EnvFilter::new(match verbosity {
			0 => "warn",
			1 => "info",
			2 => "debug",
			_ => "trace",
		})
	});
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.with_writer(std::io::stderr)
		.try_init();
}

async fn execute(args: &Args, correlation_id: &str) -> ExitStatus {
	let credentials = match load_credentials(args.creds, &args.config_path()) {
		Ok(credentials) if !credentials.is_empty() => credentials,
		Ok(_) => {
			error_parsing("Unable to get Dev Center Credentials");

			return ExitStatus::NoDevCenterCredentialsFound;
		},
		Err(e) => {
			tracing::warn!(error = %e, "credentials could not be loaded");
			error_parsing("Unable to get Dev Center Credentials");

			return ExitStatus::NoDevCenterCredentialsFound;
		},
	};
	let Some(credential) = credentials.into_iter().nth(args.server) else {
		error_parsing(&format!("OverrideServer invalid - {}", args.server));

		return ExitStatus::OverrideServerInvalid;
	};

	if let Some(path) = args.create.as_deref().filter(|path| !path.is_file()) {
		error_parsing(&format!("CreateOption invalid - {}", path.display()));

		return ExitStatus::CreateInputFileDoesNotExist;
	}
	if let Some(raw) = args.list.as_deref().filter(|raw| raw.parse::<ListKind>().is_err()) {
		return commands::invalid_list(raw);
	}

	let timeout = match args.timeout() {
		Ok(timeout) => {
			if args.timeout.is_some() {
				println!("> HttpTimeout: {} seconds", timeout.as_secs());
			}

			timeout
		},
		Err(raw) => {
			println!("> HttpTimeout: Invalid value {raw}, using default timeout");

			Duration::from_secs(args::DEFAULT_TIMEOUT_SECS)
		},
	};
	let transport = match ReqwestTransport::with_timeout(timeout) {
		Ok(transport) => Arc::new(transport),
		Err(e) => return commands::exception("Setup", "HttpClient", e),
	};
	let cancel = CancellationToken::new();
	let invoker = ResilientHttpInvoker::new(credential, transport)
		.with_config(InvokerConfig {
			request_delay: REQUEST_DELAY,
			correlation_id: Some(correlation_id.to_owned()),
			..Default::default()
		})
		.with_cancellation(cancel.clone());
	let client = match DevCenterClient::new(invoker) {
		Ok(client) => client,
		Err(e) => return commands::exception("Setup", "DevCenterClient", e),
	};
	let poll = PollConfig { deadline: args.max_wait(), ..Default::default() };
	let interrupt = tokio::spawn({
		let cancel = cancel.clone();

		async move {
			if tokio::signal::ctrl_c().await.is_ok() {
				tracing::warn!("interrupt received; cancelling");
				cancel.cancel();
			}
		}
	});
	let session =
		Session::new(client, Arc::new(AzureBlobClient::default()), poll, cancel, correlation_id);
	let status = session.run(args).await;

	interrupt.abort();

	status
}

fn parse_failure(e: clap::Error) -> ExitStatus {
	match e.kind() {
		ErrorKind::DisplayHelp
		| ErrorKind::DisplayVersion
		| ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
			let _ = e.print();

			ExitStatus::Success
		},
		_ => {
			error_parsing(e.render().to_string().trim_end());
			println!("Try running with just '--help' for more information.");

			ExitStatus::CommandLineOptionParsingFailed
		},
	}
}

fn error_parsing(message: &str) {
	println!("Error Parsing Options: {message}");
}
