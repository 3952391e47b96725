//! Command-line surface of `sdcm`.

// crates.io
use clap::{ArgAction, Parser};
// self
use crate::{_prelude::*, auth::CredentialSource};

/// Default per-request HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5 * 60;
/// Default credentials file name, resolved next to the executable.
pub const DEFAULT_CONFIG_FILE: &str = "authconfig.json";

/// Manage hardware-certification content: products, submissions, shipping labels and packages.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "sdcm", version, about)]
pub struct Args {
	/// Path to a JSON file describing the product, submission or shipping label to create.
	#[arg(short = 'c', long = "create", value_name = "FILE")]
	pub create: Option<PathBuf>,
	/// Commit the submission given by --productid and --submissionid.
	#[arg(long)]
	pub commit: bool,
	/// List a product, submission, shippinglabel or partnersubmission.
	#[arg(short = 'l', long = "list", value_name = "KIND")]
	pub list: Option<String>,
	/// Upload a package to the given product and submission.
	#[arg(short = 'u', long = "upload", value_name = "FILE")]
	pub upload: Option<PathBuf>,
	/// Download the signed package of a submission to FILE.
	#[arg(short = 'd', long = "download", value_name = "FILE")]
	pub download: Option<PathBuf>,
	/// Download the driver metadata of a submission to FILE.
	#[arg(short = 'm', long = "metadata", value_name = "FILE")]
	pub metadata: Option<PathBuf>,
	/// Wait for the submission (or, with --shippinglabelid, the shipping label) to finish processing.
	#[arg(short = 'w', long)]
	pub wait: bool,
	/// While waiting, also wait for driver metadata.
	#[arg(long = "waitmetadata")]
	pub wait_metadata: bool,
	/// Request metadata creation for an older submission.
	#[arg(long = "createmetadata")]
	pub create_metadata: bool,
	/// List audiences.
	#[arg(short = 'a', long)]
	pub audience: bool,
	/// Translate a partner's publisher, product and submission ids into the ids visible to this account.
	#[arg(long)]
	pub translate: bool,
	/// Product id.
	#[arg(long = "productid", value_name = "ID")]
	pub product_id: Option<String>,
	/// Submission id.
	#[arg(long = "submissionid", value_name = "ID")]
	pub submission_id: Option<String>,
	/// Shipping label id.
	#[arg(long = "shippinglabelid", value_name = "ID")]
	pub shipping_label_id: Option<String>,
	/// Publisher id of a partner.
	#[arg(long = "publisherid", value_name = "ID")]
	pub publisher_id: Option<String>,
	/// Share a new shipping label with this partner publisher instead of Windows Update.
	#[arg(long = "partnerid", value_name = "ID")]
	pub partner_id: Option<String>,
	/// Index of the credentials entry to use.
	#[arg(long, value_name = "N", default_value_t = 0)]
	pub server: usize,
	/// Where credentials come from.
	#[arg(long, value_enum, ignore_case = true, default_value_t = CredentialSource::EnvThenFile)]
	pub creds: CredentialSource,
	/// Credentials file; defaults to authconfig.json next to the executable.
	#[arg(long, value_name = "FILE")]
	pub config: Option<PathBuf>,
	/// HTTP request timeout in seconds.
	#[arg(short = 't', long, value_name = "SECONDS")]
	pub timeout: Option<String>,
	/// Give up waiting after this many seconds.
	#[arg(long = "max-wait", value_name = "SECONDS")]
	pub max_wait: Option<u64>,
	/// Increase log verbosity (repeatable).
	#[arg(short = 'v', action = ArgAction::Count)]
	pub verbose: u8,
}
impl Args {
	/// The single command selected by the flags, in precedence order.
	pub fn command(&self) -> Command {
		if let Some(path) = &self.create {
			Command::Create(path.clone())
		} else if self.commit {
			Command::Commit
		} else if let Some(kind) = &self.list {
			Command::List(kind.clone())
		} else if let Some(path) = &self.download {
			Command::Download(path.clone())
		} else if let Some(path) = &self.metadata {
			Command::Metadata(path.clone())
		} else if let Some(path) = &self.upload {
			Command::Upload(path.clone())
		} else if self.wait {
			Command::Wait
		} else if self.audience {
			Command::Audience
		} else if self.create_metadata {
			Command::CreateMetadata
		} else if self.translate {
			Command::Translate
		} else {
			Command::None
		}
	}

	/// Parsed `--timeout`; `Err` carries the rejected text.
	pub fn timeout(&self) -> Result<Duration, &str> {
		match self.timeout.as_deref() {
			None => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
			Some(raw) => raw.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| raw),
		}
	}

	/// `--max-wait` as a deadline.
	pub fn max_wait(&self) -> Option<Duration> {
		self.max_wait.map(Duration::from_secs)
	}

	/// Credentials file to read.
	pub fn config_path(&self) -> PathBuf {
		if let Some(path) = &self.config {
			return path.clone();
		}

		std::env::current_exe()
			.ok()
			.and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_CONFIG_FILE)))
			.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
	}
}

/// Command selected on the command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
	/// Create the entity described in the file.
	Create(PathBuf),
	/// Commit a submission.
	Commit,
	/// List entities of the named kind.
	List(String),
	/// Download a signed package.
	Download(PathBuf),
	/// Download driver metadata.
	Metadata(PathBuf),
	/// Upload a package.
	Upload(PathBuf),
	/// Wait for processing to finish.
	Wait,
	/// List audiences.
	Audience,
	/// Request metadata creation.
	CreateMetadata,
	/// Translate partner ids.
	Translate,
	/// No command flag was given.
	None,
}

/// Resource kinds accepted by `--list`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListKind {
	/// Products.
	Product,
	/// Submissions of a product.
	Submission,
	/// Shipping labels of a submission.
	ShippingLabel,
	/// A partner's submission mapped to this account.
	PartnerSubmission,
}
impl FromStr for ListKind {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"product" => Ok(Self::Product),
			"submission" => Ok(Self::Submission),
			"shippinglabel" => Ok(Self::ShippingLabel),
			"partnersubmission" => Ok(Self::PartnerSubmission),
			_ => Err(()),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn parse(args: &[&str]) -> Args {
		Args::try_parse_from(std::iter::once("sdcm").chain(args.iter().copied()))
			.expect("Arguments should parse.")
	}

	#[test]
	fn long_flag_names_parse() {
		let args = parse(&[
			"--wait",
			"--waitmetadata",
			"--productid",
			"1",
			"--submissionid",
			"9",
			"--creds",
			"EnvOnly",
			"-vv",
			"--max-wait",
			"600",
		]);

		assert_eq!(args.command(), Command::Wait);
		assert!(args.wait_metadata);
		assert_eq!(args.creds, CredentialSource::EnvOnly);
		assert_eq!(args.verbose, 2);
		assert_eq!(args.max_wait(), Some(Duration::from_secs(600)));
		assert_eq!(args.product_id.as_deref(), Some("1"));
	}

	#[test]
	fn create_takes_precedence() {
		let args = parse(&["--commit", "-c", "new.json", "-a"]);

		assert_eq!(args.command(), Command::Create(PathBuf::from("new.json")));
		assert_eq!(parse(&[]).command(), Command::None);
	}

	#[test]
	fn timeout_falls_back_on_garbage() {
		assert_eq!(parse(&["-t", "30"]).timeout(), Ok(Duration::from_secs(30)));
		assert_eq!(parse(&["-t", "soon"]).timeout(), Err("soon"));
		assert_eq!(parse(&[]).timeout(), Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)));
	}

	#[test]
	fn list_kinds_ignore_case() {
		assert_eq!("ShippingLabel".parse(), Ok(ListKind::ShippingLabel));
		assert_eq!("PARTNERSUBMISSION".parse(), Ok(ListKind::PartnerSubmission));
		assert_eq!("labels".parse::<ListKind>(), Err(()));
	}

	#[test]
	fn unknown_flags_are_rejected() {
		assert!(Args::try_parse_from(["sdcm", "--bogus"]).is_err());
	}
}
