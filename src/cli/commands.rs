//! Command handlers of `sdcm`; each maps every failure point to its own [`ExitStatus`].

// std
use std::io::Write;
// crates.io
use color_eyre::Report;
use serde::de::{self, Deserializer};
// self
use crate::{
	_prelude::*,
	api::{
		DevCenterClient, DownloadKind, DriverMetadata, NewProduct, NewShippingLabel, NewSubmission,
		Submission, WorkflowStatus,
	},
	blob::{BlobTransfer, ProgressSink},
	cli::{
		args::{Args, Command, ListKind},
		exit::ExitStatus,
		render,
	},
	decode::{ApiResponse, ErrorDetails},
	http::ApiTransport,
	poll::{PollConfig, PollObserver, PollOutcome, PollingWaiter, ShippingLabelTarget, SubmissionTarget},
};

/// Service code of a commit against a submission that is no longer pending.
pub const REQUEST_INVALID_FOR_CURRENT_STATE: &str = "requestInvalidForCurrentState";
/// Message accompanying [`REQUEST_INVALID_FOR_CURRENT_STATE`] on commit.
pub const ONLY_PENDING_SUBMISSIONS_CAN_BE_COMMITTED: &str = "Only pending submissions can be committed.";
/// Service code of a lookup that found nothing.
pub const ENTITY_NOT_FOUND: &str = "entityNotFound";

const GO_LIVE_DELAY: time::Duration = time::Duration::days(7);

/// Contents of a `--create` file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInput {
	/// Which payload to send.
	pub create_type: CreateType,
	/// Product body.
	#[serde(default)]
	pub create_product: Option<NewProduct>,
	/// Submission body.
	#[serde(default)]
	pub create_submission: Option<NewSubmission>,
	/// Shipping label body; targeting and go-live are filled in from the submission.
	#[serde(default)]
	pub create_shipping_label: Option<NewShippingLabel>,
}

/// Entity kind named by `createType`, given either by name (any case) or by index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateType {
	/// `shippingLabel` or `0`.
	ShippingLabel,
	/// `product` or `1`.
	Product,
	/// `submission` or `2`.
	Submission,
	/// Anything else.
	Unsupported,
}
impl<'de> Deserialize<'de> for CreateType {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Raw {
			Name(String),
			Index(i64),
		}

		let kind = match Raw::deserialize(deserializer).map_err(de::Error::custom)? {
			Raw::Name(name) => match name.to_ascii_lowercase().as_str() {
				"shippinglabel" => Self::ShippingLabel,
				"product" => Self::Product,
				"submission" => Self::Submission,
				_ => Self::Unsupported,
			},
			Raw::Index(0) => Self::ShippingLabel,
			Raw::Index(1) => Self::Product,
			Raw::Index(2) => Self::Submission,
			Raw::Index(_) => Self::Unsupported,
		};

		Ok(kind)
	}
}

/// Everything one command run needs.
pub struct Session<T, B>
where
	T: ?Sized + ApiTransport,
	B: ?Sized + BlobTransfer,
{
	client: DevCenterClient<T>,
	blobs: Arc<B>,
	poll: PollConfig,
	cancel: CancellationToken,
	correlation_id: String,
}
impl<T, B> Session<T, B>
where
	T: ?Sized + ApiTransport,
	B: ?Sized + BlobTransfer,
{
	/// Bundles the API client, blob client and wait settings of one run.
	pub fn new(
		client: DevCenterClient<T>,
		blobs: Arc<B>,
		poll: PollConfig,
		cancel: CancellationToken,
		correlation_id: impl Into<String>,
	) -> Self {
		Self { client, blobs, poll, cancel, correlation_id: correlation_id.into() }
	}

	/// Runs the command selected by `args`.
	pub async fn run(&self, args: &Args) -> ExitStatus {
		let flow = match args.command() {
			Command::Create(path) => self.create(&path, args).await,
			Command::Commit => self.commit(args).await,
			Command::List(raw) => match raw.parse::<ListKind>() {
				Ok(kind) => self.list(&raw, kind, args).await,
				Err(()) => Err(invalid_list(&raw)),
			},
			Command::Download(path) => self.download(&path, args).await,
			Command::Metadata(path) => self.metadata(&path, args).await,
			Command::Upload(path) => self.upload(&path, args).await,
			Command::Wait => self.wait(args).await,
			Command::Audience => self.audience().await,
			Command::CreateMetadata => self.create_metadata(args).await,
			Command::Translate => self.translate(args).await,
			Command::None => Ok(ExitStatus::Success),
		};

		flow.unwrap_or_else(|status| status)
	}

	async fn create(&self, path: &Path, args: &Args) -> Result<ExitStatus, ExitStatus> {
		println!("> Create Option");

		let input = read_create_input(path)?;

		match input.create_type {
			CreateType::Product => match &input.create_product {
				Some(product) => self.create_product(product).await,
				None => Err(invalid_create()),
			},
			CreateType::Submission => match &input.create_submission {
				Some(submission) => self.create_submission(submission, args).await,
				None => Err(invalid_create()),
			},
			CreateType::ShippingLabel => match input.create_shipping_label {
				Some(label) => self.create_shipping_label(label, args).await,
				None => Err(invalid_create()),
			},
			CreateType::Unsupported => Err(invalid_create()),
		}
	}

	async fn create_product(&self, product: &NewProduct) -> Result<ExitStatus, ExitStatus> {
		let products = self
			.call(
				"CreateOption",
				"NewProduct",
				ExitStatus::NewProductApiFailed,
				self.client.new_product(product),
			)
			.await?;

		print!("{}", render::product(&first(products, "CreateOption", "NewProduct")?));

		Ok(ExitStatus::Success)
	}

	async fn create_submission(
		&self,
		submission: &NewSubmission,
		args: &Args,
	) -> Result<ExitStatus, ExitStatus> {
		require(&[(args.product_id.is_some(), "productid", ExitStatus::NewSubmissionProductIdMissing)])?;

		let product_id = id(&args.product_id);

		println!("> Creating Submission");

		let submissions = self
			.call(
				"CreateOption",
				"NewSubmission",
				ExitStatus::NewSubmissionApiFailed,
				self.client.new_submission(product_id, submission),
			)
			.await?;

		print!("{}", render::submission(&first(submissions, "CreateOption", "NewSubmission")?));

		Ok(ExitStatus::Success)
	}

	async fn create_shipping_label(
		&self,
		label: NewShippingLabel,
		args: &Args,
	) -> Result<ExitStatus, ExitStatus> {
		require(&[
			(args.product_id.is_some(), "productid", ExitStatus::NewShippingLabelProductIdMissing),
			(args.submission_id.is_some(), "submissionid", ExitStatus::NewShippingLabelSubmissionIdMissing),
		])?;

		let (product_id, submission_id) = (id(&args.product_id), id(&args.submission_id));

		println!("> Get Driver Metadata");

		let submission = self
			.submission(
				"CreateOption",
				product_id,
				submission_id,
				ExitStatus::NewShippingLabelGetSubmissionApiFailed,
			)
			.await?;
		let Some(item) = submission.download(DownloadKind::DriverMetadata) else {
			println!("> ERROR: No Metadata available for this submission");

			return Err(ExitStatus::NewShippingLabelGetSubmissionApiFailed);
		};

		println!("> driverMetadata Url: {}", item.url);

		let url = item.parsed_url().map_err(|e| exception("CreateOption", "GetSubmission", e))?;
		let text = self
			.blobs
			.download_text(&url)
			.await
			.map_err(|e| exception("CreateOption", "GetSubmission", e))?;
		let metadata =
			DriverMetadata::parse(&text).map_err(|e| exception("CreateOption", "GetSubmission", e))?;
		let mut label = label
			.with_hardware_ids(metadata.hardware_ids())
			.with_go_live(OffsetDateTime::now_utc() + GO_LIVE_DELAY)
			.map_err(|e| exception("CreateOption", "NewShippingLabel", e))?;

		if let Some(partner) = &args.partner_id {
			println!("> Shipping to Partner (not Windows Update): {partner}");

			label = label.shared_with(partner.as_str());
		}

		println!("> Creating Shipping Label");

		let labels = self
			.call(
				"CreateOption",
				"NewShippingLabel",
				ExitStatus::NewShippingLabelCreateApiFailed,
				self.client.new_shipping_label(product_id, submission_id, &label),
			)
			.await?;

		print!("{}", render::shipping_label(&first(labels, "CreateOption", "NewShippingLabel")?));

		Ok(ExitStatus::Success)
	}

	async fn commit(&self, args: &Args) -> Result<ExitStatus, ExitStatus> {
		println!("> Commit Option");
		require(&[
			(args.product_id.is_some(), "productid", ExitStatus::CommitProductIdMissing),
			(args.submission_id.is_some(), "submissionid", ExitStatus::CommitSubmissionIdMissing),
		])?;
		println!("> Sending Commit");

		let response = self
			.client
			.commit_submission(id(&args.product_id), id(&args.submission_id))
			.await
			.map_err(|e| exception("CommitOption", "CommitSubmission", e))?;

		match response {
			ApiResponse::Success(()) => {
				println!("> Commit OK");

				Ok(ExitStatus::Success)
			},
			ApiResponse::Failure(details)
				if details.has_code(REQUEST_INVALID_FOR_CURRENT_STATE)
					&& details.message == ONLY_PENDING_SUBMISSIONS_CAN_BE_COMMITTED =>
			{
				println!(
					"CommitOption CommitSubmission request invalid for currentState, {ONLY_PENDING_SUBMISSIONS_CAN_BE_COMMITTED}"
				);
				print!("{}", render::error_details(&details, &self.correlation_id));

				Err(ExitStatus::CommitRequestInvalidForCurrentState)
			},
			ApiResponse::Failure(details) => Err(self.rejected(
				"CommitOption",
				"CommitSubmission",
				&details,
				ExitStatus::CommitApiFailed,
			)),
		}
	}

	async fn list(&self, raw: &str, kind: ListKind, args: &Args) -> Result<ExitStatus, ExitStatus> {
		println!("> List Option {raw}");

		match kind {
			ListKind::Product => {
				let products = self
					.call(
						"ListOption",
						"GetProducts",
						ExitStatus::ListGetProductsApiFailed,
						self.client.get_products(args.product_id.as_deref()),
					)
					.await?;

				products.iter().for_each(|product| print!("{}", render::product(product)));
			},
			ListKind::Submission => {
				require(&[(args.product_id.is_some(), "productid", ExitStatus::ListGetSubmissionApiFailed)])?;

				let response = self
					.client
					.get_submissions(id(&args.product_id), args.submission_id.as_deref())
					.await
					.map_err(|e| exception("ListOption", "GetSubmission", e))?;
				let submissions = match response {
					ApiResponse::Success(submissions) => submissions,
					ApiResponse::Failure(details)
						if !details.is_rate_limited() && details.has_code(ENTITY_NOT_FOUND) =>
					{
						println!("ListOption GetSubmission entity not found, try translate option.");
						print!("{}", render::error_details(&details, &self.correlation_id));

						return Err(ExitStatus::SubmissionEntityNotFound);
					},
					ApiResponse::Failure(details) =>
						return Err(self.rejected(
							"ListOption",
							"GetSubmission",
							&details,
							ExitStatus::ListGetSubmissionApiFailed,
						)),
				};

				submissions.iter().for_each(|submission| print!("{}", render::submission(submission)));
			},
			ListKind::ShippingLabel => {
				require(&[
					(args.product_id.is_some(), "productid", ExitStatus::ListGetShippingLabelApiFailed),
					(args.submission_id.is_some(), "submissionid", ExitStatus::ListGetShippingLabelApiFailed),
				])?;

				let labels = self
					.call(
						"ListOption",
						"GetShippingLabels",
						ExitStatus::ListGetShippingLabelApiFailed,
						self.client.get_shipping_labels(
							id(&args.product_id),
							id(&args.submission_id),
							args.shipping_label_id.as_deref(),
						),
					)
					.await?;

				labels.iter().for_each(|label| print!("{}", render::shipping_label(label)));
			},
			ListKind::PartnerSubmission => {
				require(&[
					(args.publisher_id.is_some(), "publisherid", ExitStatus::ListGetPartnerSubmissionApiFailed),
					(args.product_id.is_some(), "productid", ExitStatus::ListGetPartnerSubmissionApiFailed),
					(
						args.submission_id.is_some(),
						"submissionid",
						ExitStatus::ListGetPartnerSubmissionApiFailed,
					),
				])?;

				let submissions = self
					.call(
						"ListOption",
						"GetPartnerSubmission",
						ExitStatus::ListGetPartnerSubmissionApiFailed,
						self.client.get_partner_submission(
							id(&args.publisher_id),
							id(&args.product_id),
							id(&args.submission_id),
						),
					)
					.await?;

				submissions.iter().for_each(|submission| print!("{}", render::submission(submission)));
			},
		}

		Ok(ExitStatus::Success)
	}

	async fn download(&self, path: &Path, args: &Args) -> Result<ExitStatus, ExitStatus> {
		println!("> Download Option {}", path.display());

		let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
		let mut checks = Vec::new();

		if !parent.is_dir() {
			println!("> ERROR: Output path does not exist: {}", parent.display());
			checks.push(ExitStatus::DownloadOutputPathNotExist);
		}
		if path.exists() {
			println!("> ERROR: Output file exists already: {}", path.display());
			checks.push(ExitStatus::DownloadOutputFileAlreadyExists);
		}

		require(&[
			(args.product_id.is_some(), "productid", ExitStatus::DownloadProductIdMissing),
			(args.submission_id.is_some(), "submissionid", ExitStatus::DownloadSubmissionIdMissing),
		])?;

		if let Some(status) = checks.pop() {
			return Err(status);
		}

		println!("> Fetch Submission Info");

		let submission = self
			.submission(
				"DownloadOption",
				id(&args.product_id),
				id(&args.submission_id),
				ExitStatus::DownloadGetSubmissionApiFailed,
			)
			.await?;

		match submission.download(DownloadKind::SignedPackage) {
			Some(item) => {
				println!("> signedPackage Url: {}", item.url);
				self.fetch_blob(&item.url, path, "DownloadOption").await?;
			},
			None => println!("> ERROR: No signed package available for this submission"),
		}

		Ok(ExitStatus::Success)
	}

	async fn metadata(&self, path: &Path, args: &Args) -> Result<ExitStatus, ExitStatus> {
		println!("> Metadata Download Option {}", path.display());
		require(&[
			(args.product_id.is_some(), "productid", ExitStatus::MetadataProductIdMissing),
			(args.submission_id.is_some(), "submissionid", ExitStatus::MetadataSubmissionIdMissing),
		])?;
		println!("> Fetch Submission Info");

		let submission = self
			.submission(
				"MetadataOption",
				id(&args.product_id),
				id(&args.submission_id),
				ExitStatus::MetadataGetSubmissionApiFailed,
			)
			.await?;

		match submission.download(DownloadKind::DriverMetadata) {
			Some(item) => {
				println!("> driverMetadata Url: {}", item.url);
				self.fetch_blob(&item.url, path, "MetadataOption").await?;
			},
			None => println!("> ERROR: No Metadata available for this submission"),
		}

		Ok(ExitStatus::Success)
	}

	async fn upload(&self, path: &Path, args: &Args) -> Result<ExitStatus, ExitStatus> {
		println!("> Upload Option");
		require(&[
			(args.product_id.is_some(), "productid", ExitStatus::UploadProductIdMissing),
			(args.submission_id.is_some(), "submissionid", ExitStatus::UploadSubmissionIdMissing),
		])?;
		println!("> Fetch Submission Info");

		let submission = self
			.submission(
				"SubmissionPackagePath",
				id(&args.product_id),
				id(&args.submission_id),
				ExitStatus::UploadGetSubmissionApiFailed,
			)
			.await?;
		let Some(item) = submission.download(DownloadKind::InitialPackage) else {
			println!("> ERROR: No initialPackage upload location for this submission");

			return Ok(ExitStatus::Success);
		};

		println!("> initialPackage Url: {}", item.url);
		println!("> Uploading Submission Package");

		let url = item.parsed_url().map_err(|e| exception("SubmissionPackagePath", "Upload", e))?;
		let report = self
			.blobs
			.upload(path, &url, &ConsoleProgress)
			.await
			.map_err(|e| exception("SubmissionPackagePath", "Upload", e))?;

		println!("> Uploaded {} bytes (sha256 {})", report.bytes, report.sha256);

		Ok(ExitStatus::Success)
	}

	async fn wait(&self, args: &Args) -> Result<ExitStatus, ExitStatus> {
		println!("> Wait Option");
		require(&[
			(args.product_id.is_some(), "productid", ExitStatus::WaitProductIdMissing),
			(args.submission_id.is_some(), "submissionid", ExitStatus::WaitSubmissionIdMissing),
		])?;

		let (product_id, submission_id) = (id(&args.product_id), id(&args.submission_id));
		let status = match &args.shipping_label_id {
			None => {
				let waiter = self.waiter("GetSubmission");
				let target = SubmissionTarget::new(&self.client, product_id, submission_id, args.wait_metadata);

				match waiter.wait(&target, &self.cancel).await {
					Ok(outcome) => {
						report_downloads(outcome.entity());

						match outcome {
							PollOutcome::Ready(_) => {
								println!("> Submission Ready");

								ExitStatus::Success
							},
							PollOutcome::ReadyWithExtra(_) => {
								println!("> Submission Ready with Metadata");

								ExitStatus::Success
							},
							PollOutcome::Failed(_) => ExitStatus::WaitSubmissionFailedInHwdc,
						}
					},
					Err(Error::Api(details)) => self.rejected(
						"WaitOption",
						"GetSubmission",
						&details,
						ExitStatus::WaitGetSubmissionApiFailed,
					),
					Err(e) => return Err(exception("WaitOption", "GetSubmission", e)),
				}
			},
			Some(label_id) => {
				let waiter = self.waiter("GetShippingLabels");
				let target = ShippingLabelTarget::new(&self.client, product_id, submission_id, label_id);

				match waiter.wait(&target, &self.cancel).await {
					Ok(PollOutcome::Ready(_)) => {
						println!("> Shipping Label Ready");

						ExitStatus::Success
					},
					Ok(PollOutcome::ReadyWithExtra(_)) => {
						println!("> Shipping Label for Sharing Ready");

						ExitStatus::Success
					},
					Ok(PollOutcome::Failed(_)) => ExitStatus::WaitShippingLabelFailedInHwdc,
					Err(Error::Api(details)) => self.rejected(
						"WaitOption",
						"GetShippingLabels",
						&details,
						ExitStatus::WaitGetShippingLabelApiFailed,
					),
					Err(e) => return Err(exception("WaitOption", "GetShippingLabels", e)),
				}
			},
		};

		println!("> Done");

		if status.is_success() { Ok(status) } else { Err(status) }
	}

	async fn audience(&self) -> Result<ExitStatus, ExitStatus> {
		println!("> Audience Option");

		let audiences = self
			.call(
				"AudienceOption",
				"GetAudiences",
				ExitStatus::AudienceGetAudienceApiFailed,
				self.client.get_audiences(),
			)
			.await?;

		audiences.iter().for_each(|audience| print!("{}", render::audience(audience)));

		Ok(ExitStatus::Success)
	}

	async fn create_metadata(&self, args: &Args) -> Result<ExitStatus, ExitStatus> {
		println!("> Create MetaData Option");
		require(&[
			(args.product_id.is_some(), "productid", ExitStatus::CreateMetadataProductIdMissing),
			(args.submission_id.is_some(), "submissionid", ExitStatus::CreateMetadataSubmissionIdMissing),
		])?;
		println!("> Sending Create MetaData");
		self.call(
			"CreateMetaData",
			"CreateMetaData",
			ExitStatus::CreateMetadataApiFailed,
			self.client.create_metadata(id(&args.product_id), id(&args.submission_id)),
		)
		.await?;
		println!("> Create MetaData OK");

		Ok(ExitStatus::Success)
	}

	async fn translate(&self, args: &Args) -> Result<ExitStatus, ExitStatus> {
		println!("> Translate Option");
		require(&[
			(args.publisher_id.is_some(), "publisherid", ExitStatus::TranslatePublisherIdMissing),
			(args.product_id.is_some(), "productid", ExitStatus::TranslateProductIdMissing),
			(args.submission_id.is_some(), "submissionid", ExitStatus::TranslateSubmissionIdMissing),
		])?;
		println!("> Requesting Translation");

		let submissions = self
			.call(
				"TranslateOption",
				"GetPartnerSubmission",
				ExitStatus::TranslateApiFailed,
				self.client.get_partner_submission(
					id(&args.publisher_id),
					id(&args.product_id),
					id(&args.submission_id),
				),
			)
			.await?;
		let Some(submission) = submissions.first() else {
			println!("> Translate Failed");

			return Err(ExitStatus::TranslateApiFailed);
		};

		println!("> Translate OK");
		print!("{}", render::submission(submission));

		Ok(ExitStatus::Success)
	}

	async fn submission(
		&self,
		section: &'static str,
		product_id: &str,
		submission_id: &str,
		failed: ExitStatus,
	) -> Result<Submission, ExitStatus> {
		let submissions = self
			.call(section, "GetSubmission", failed, self.client.get_submission(product_id, submission_id))
			.await?;

		first(submissions, section, "GetSubmission")
	}

	async fn fetch_blob(&self, url: &str, path: &Path, section: &'static str) -> Result<(), ExitStatus> {
		let url = Url::parse(url).map_err(|e| exception(section, "Download", e))?;
		let report = self
			.blobs
			.download(&url, path, &ConsoleProgress)
			.await
			.map_err(|e| exception(section, "Download", e))?;

		println!("> Downloaded {} bytes (sha256 {})", report.bytes, report.sha256);

		Ok(())
	}

	async fn call<V, F>(
		&self,
		section: &'static str,
		call: &'static str,
		failed: ExitStatus,
		fut: F,
	) -> Result<V, ExitStatus>
	where
		F: Future<Output = Result<ApiResponse<V>>>,
	{
		match fut.await {
			Ok(ApiResponse::Success(value)) => Ok(value),
			Ok(ApiResponse::Failure(details)) => Err(self.rejected(section, call, &details, failed)),
			Err(e) => Err(exception(section, call, e)),
		}
	}

	fn rejected(
		&self,
		section: &str,
		call: &str,
		details: &ErrorDetails,
		failed: ExitStatus,
	) -> ExitStatus {
		if details.is_rate_limited() {
			println!("{section} {call} experienced a HTTP 429 Too Many Requests response.");

			return ExitStatus::Http429RateLimitExceeded;
		}

		print!("{}", render::error_details(details, &self.correlation_id));

		failed
	}

	fn waiter(&self, call: &'static str) -> PollingWaiter<B> {
		PollingWaiter::new(self.blobs.clone())
			.with_config(self.poll.clone())
			.with_observer(Arc::new(ConsoleObserver { call }))
	}
}
impl<T, B> Debug for Session<T, B>
where
	T: ?Sized + ApiTransport,
	B: ?Sized + BlobTransfer,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Session")
			.field("client", &self.client)
			.field("poll", &self.poll)
			.field("correlation_id", &self.correlation_id)
			.finish()
	}
}

/// Prints status changes of a wait the way the console commands do.
#[derive(Clone, Copy, Debug)]
pub struct ConsoleObserver {
	call: &'static str,
}
impl PollObserver for ConsoleObserver {
	fn status_changed(&self, _: &str, status: &WorkflowStatus, error_report: Option<&str>) {
		print!("{}", render::workflow_status(status));

		if let Some(report) = error_report {
			println!("> Error Report:");
			println!("{report}");
		}
	}

	fn rate_limited(&self, _: &str) {
		println!("WaitOption {} experienced a HTTP 429 Too Many Requests response.", self.call);
	}

	fn status_missing(&self, target: &str) {
		println!("WaitOption {target} WorkflowStatus was NULL. Will continue to wait...");
	}
}

/// Byte counter on stdout.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleProgress;
impl ProgressSink for ConsoleProgress {
	fn report(&self, transferred: u64, total: Option<u64>) {
		let mut stdout = std::io::stdout().lock();
		let _ = match total {
			Some(total) => write!(stdout, "\r{transferred} / {total} bytes"),
			None => write!(stdout, "\r{transferred} bytes"),
		};
		let _ = stdout.flush();
	}

	fn finish(&self) {
		println!();
	}
}

/// Prints `ListOption invalid - {raw}` and returns [`ExitStatus::ListInvalidOption`].
pub fn invalid_list(raw: &str) -> ExitStatus {
	println!("Error Parsing Options: ListOption invalid - {raw}");

	ExitStatus::ListInvalidOption
}

/// Prints a failure without a service verdict and returns [`ExitStatus::PartnerCenterHttpException`].
pub fn exception(section: &str, call: &str, error: impl Into<Report>) -> ExitStatus {
	let report = error.into();

	tracing::error!(section, call, error = %report, "command failed");
	println!("{section} {call} failed:");
	println!("{report:?}");

	ExitStatus::PartnerCenterHttpException
}

fn read_create_input(path: &Path) -> Result<CreateInput, ExitStatus> {
	let text = std::fs::read_to_string(path).map_err(|e| unhandled(Report::new(e)))?;

	serde_json::from_str(&text).map_err(|e| unhandled(Report::new(e)))
}

fn unhandled(report: Report) -> ExitStatus {
	println!("Unhandled Exception:");
	println!("{report:?}");

	ExitStatus::UnhandledException
}

fn invalid_create() -> ExitStatus {
	println!("> Invalid Create Option selected");

	ExitStatus::Unspecified
}

fn require(checks: &[(bool, &str, ExitStatus)]) -> Result<(), ExitStatus> {
	let mut missing = None;

	for (present, name, status) in checks {
		if !present {
			println!("> ERROR: {name} not specified");

			missing = Some(*status);
		}
	}

	match missing {
		Some(status) => Err(status),
		None => Ok(()),
	}
}

fn first<E>(entities: Vec<E>, section: &str, call: &str) -> Result<E, ExitStatus> {
	entities.into_iter().next().ok_or_else(|| {
		println!("{section} {call} returned no entity.");

		ExitStatus::PartnerCenterHttpException
	})
}

fn id(value: &Option<String>) -> &str {
	value.as_deref().unwrap_or_default()
}

fn report_downloads(submission: &Submission) {
	for kind in [DownloadKind::DriverMetadata, DownloadKind::SignedPackage] {
		if let Some(item) = submission.download(kind) {
			println!("> {kind} Url: {}", item.url);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		_preludet::{ScriptedReply, ScriptedTransport, fast_retry_policy, test_credentials},
		blob::{BlobFuture, TransferReport},
		error::BlobError,
		invoke::{InvokerConfig, ResilientHttpInvoker},
	};

	const METADATA: &str = r#"{
		"BundleInfoMap": {
			"b1": {
				"InfInfoMap": {
					"driver.inf": {
						"OSPnPInfoMap": {"WINDOWS_v100_X64_NI_FULL": {"PCI\\VEN_8086&DEV_0001": {}}}
					}
				}
			}
		}
	}"#;

	#[derive(Default)]
	struct FakeBlobs;
	impl BlobTransfer for FakeBlobs {
		fn download<'a>(
			&'a self,
			_: &'a Url,
			_: &'a Path,
			_: &'a dyn ProgressSink,
		) -> BlobFuture<'a, TransferReport> {
			Box::pin(async { Err(Error::from(BlobError::Status { operation: "download", status: 403, body: String::new() })) })
		}

		fn upload<'a>(
			&'a self,
			_: &'a Path,
			_: &'a Url,
			_: &'a dyn ProgressSink,
		) -> BlobFuture<'a, TransferReport> {
			Box::pin(async { Ok(TransferReport { bytes: 0, sha256: String::new() }) })
		}

		fn download_text<'a>(&'a self, _: &'a Url) -> BlobFuture<'a, String> {
			Box::pin(async { Ok(METADATA.to_owned()) })
		}
	}

	fn session(replies: Vec<ScriptedReply>) -> (Arc<ScriptedTransport>, Session<ScriptedTransport, FakeBlobs>) {
		let transport = Arc::new(ScriptedTransport::new(replies));
		let invoker = ResilientHttpInvoker::new(test_credentials(), transport.clone())
			.with_config(InvokerConfig { retry: fast_retry_policy(), ..Default::default() });
		let client = DevCenterClient::new(invoker).expect("Client should build.");
		let session = Session::new(
			client,
			Arc::new(FakeBlobs),
			PollConfig::default(),
			CancellationToken::new(),
			"correlation-under-test",
		);

		(transport, session)
	}

	fn ids(product: Option<&str>, submission: Option<&str>) -> Args {
		Args {
			product_id: product.map(str::to_owned),
			submission_id: submission.map(str::to_owned),
			..Default::default()
		}
	}

	fn scratch_file(contents: &str) -> PathBuf {
		let path = std::env::temp_dir().join(format!("sdcm-create-{}.json", uuid::Uuid::new_v4()));

		std::fs::write(&path, contents).expect("Scratch file should be writable.");

		path
	}

	#[test]
	fn create_type_accepts_names_and_indices() {
		let parse = |raw: &str| {
			serde_json::from_str::<CreateInput>(&format!(r#"{{"createType":{raw}}}"#))
				.expect("Create input should decode.")
				.create_type
		};

		assert_eq!(parse("\"product\""), CreateType::Product);
		assert_eq!(parse("\"ShippingLabel\""), CreateType::ShippingLabel);
		assert_eq!(parse("2"), CreateType::Submission);
		assert_eq!(parse("3"), CreateType::Unsupported);
		assert_eq!(parse("\"partnerSubmission\""), CreateType::Unsupported);
	}

	#[tokio::test]
	async fn commit_without_ids_reports_the_last_missing_one() {
		let (transport, session) = session(Vec::new());
		let status = session.run(&Args { commit: true, ..ids(None, None) }).await;

		assert_eq!(status, ExitStatus::CommitSubmissionIdMissing);
		assert!(transport.sent().is_empty());
	}

	#[tokio::test]
	async fn commit_of_committed_submission_has_its_own_code() {
		let (_, session) = session(vec![ScriptedReply::json(
			400,
			r#"{"error":{"code":"requestInvalidForCurrentState","message":"Only pending submissions can be committed."}}"#,
		)]);
		let status = session.run(&Args { commit: true, ..ids(Some("1"), Some("9")) }).await;

		assert_eq!(status, ExitStatus::CommitRequestInvalidForCurrentState);
	}

	#[tokio::test]
	async fn throttled_commands_exit_with_429() {
		let (_, session) = session(vec![ScriptedReply::json(429, r#"{"statusCode":429,"message":"Rate limit is exceeded."}"#)]);
		let status = session.run(&Args { audience: true, ..Default::default() }).await;

		assert_eq!(status, ExitStatus::Http429RateLimitExceeded);
	}

	#[tokio::test]
	async fn missing_submission_suggests_translate() {
		let (_, session) = session(vec![ScriptedReply::json(
			404,
			r#"{"error":{"code":"entityNotFound","message":"Submission not found"}}"#,
		)]);
		let status =
			session.run(&Args { list: Some("Submission".into()), ..ids(Some("1"), Some("9")) }).await;

		assert_eq!(status, ExitStatus::SubmissionEntityNotFound);
	}

	#[tokio::test]
	async fn invalid_list_kind_is_rejected() {
		let (transport, session) = session(Vec::new());
		let status = session.run(&Args { list: Some("labels".into()), ..Default::default() }).await;

		assert_eq!(status, ExitStatus::ListInvalidOption);
		assert!(transport.sent().is_empty());
	}

	#[tokio::test]
	async fn empty_translation_fails() {
		let (_, session) = session(vec![ScriptedReply::status(200)]);
		let args = Args { translate: true, publisher_id: Some("77".into()), ..ids(Some("1"), Some("9")) };

		assert_eq!(session.run(&args).await, ExitStatus::TranslateApiFailed);
	}

	#[tokio::test]
	async fn shipping_label_targets_metadata_hardware_ids() {
		let (transport, session) = session(vec![
			ScriptedReply::json(
				200,
				r#"{"id":"9","downloads":{"items":[{"type":"driverMetadata","url":"https://blob.invalid/metadata"}]}}"#,
			),
			ScriptedReply::json(201, r#"{"id":"3","name":"Label"}"#),
		]);
		let create = scratch_file(
			r#"{"createType":"shippingLabel","createShippingLabel":{"name":"Label","publishingSpecifications":{"visibleToAccounts":[]},"targeting":{}}}"#,
		);
		let args = Args {
			create: Some(create.clone()),
			partner_id: Some("77".into()),
			..ids(Some("1"), Some("9"))
		};
		let status = session.run(&args).await;

		std::fs::remove_file(&create).expect("Scratch file should be removable.");
		assert_eq!(status, ExitStatus::Success);

		let sent = transport.sent();
		let body: serde_json::Value =
			serde_json::from_slice(sent[1].body()).expect("Label body should be JSON.");

		assert_eq!(body["targeting"]["hardwareIds"][0]["pnpString"], "pci\\ven_8086&dev_0001");
		assert_eq!(body["targeting"]["hardwareIds"][0]["operatingSystemCode"], "WINDOWS_v100_X64_NI_FULL");
		assert_eq!(body["destination"], "anotherPartner");
		assert_eq!(body["recipientSpecifications"]["receiverPublisherId"], "77");
		assert!(body["publishingSpecifications"]["goLiveDate"].is_string());
	}

	#[tokio::test]
	async fn shipping_label_without_metadata_fails_lookup() {
		let (_, session) = session(vec![ScriptedReply::json(200, r#"{"id":"9"}"#)]);
		let create = scratch_file(r#"{"createType":0,"createShippingLabel":{"name":"Label"}}"#);
		let status = session.run(&Args { create: Some(create.clone()), ..ids(Some("1"), Some("9")) }).await;

		std::fs::remove_file(&create).expect("Scratch file should be removable.");
		assert_eq!(status, ExitStatus::NewShippingLabelGetSubmissionApiFailed);
	}

	#[tokio::test]
	async fn malformed_create_file_is_unhandled() {
		let (_, session) = session(Vec::new());
		let create = scratch_file("{not json");
		let status = session.run(&Args { create: Some(create.clone()), ..Default::default() }).await;

		std::fs::remove_file(&create).expect("Scratch file should be removable.");
		assert_eq!(status, ExitStatus::UnhandledException);
	}

	#[tokio::test]
	async fn failed_download_is_an_exception() {
		let (_, session) = session(vec![ScriptedReply::json(
			200,
			r#"{"id":"9","downloads":{"items":[{"type":"signedPackage","url":"https://blob.invalid/signed"}]}}"#,
		)]);
		let target = std::env::temp_dir().join(format!("sdcm-signed-{}.zip", uuid::Uuid::new_v4()));
		let status = session.run(&Args { download: Some(target), ..ids(Some("1"), Some("9")) }).await;

		assert_eq!(status, ExitStatus::PartnerCenterHttpException);
	}

	#[tokio::test(start_paused = true)]
	async fn failed_submission_ends_the_wait() {
		let (_, session) = session(vec![
			ScriptedReply::json(200, r#"{"id":"9","workflowStatus":{"currentStep":"preProcess","state":"inProgress"}}"#),
			ScriptedReply::json(200, r#"{"id":"9","workflowStatus":{"currentStep":"preProcess","state":"failed"}}"#),
		]);
		let status = session.run(&Args { wait: true, ..ids(Some("1"), Some("9")) }).await;

		assert_eq!(status, ExitStatus::WaitSubmissionFailedInHwdc);
	}
}
