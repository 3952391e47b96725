//! Cancellable status polling for long-running service workflows.
//!
//! [`PollingWaiter::wait`] fetches a [`PollTarget`] every interval until the target's predicate reports a
//! terminal [`TargetVerdict`]. Throttled fetches pause without touching the [`PollState`]; any other
//! rejection ends the wait. Every distinct `(currentStep, state)` pair is reported once to the
//! [`PollObserver`], together with the error report text when the service attached one. Cancellation and
//! the optional deadline are honored at every fetch and every pause.

pub mod target;

pub use target::*;

// crates.io
use tokio::time::Instant;
// self
use crate::{
	_prelude::*,
	api::WorkflowStatus,
	blob::BlobTransfer,
	decode::{ApiResponse, ErrorDetails},
	obs::{self, CallKind},
};

/// Boxed future returned by [`PollTarget::fetch`].
pub type PollFuture<'a, E> = Pin<Box<dyn Future<Output = Result<ApiResponse<Vec<E>>>> + 'a + Send>>;

/// Timing of a wait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollConfig {
	/// Pause between fetches.
	pub interval: Duration,
	/// Pause after a throttled fetch.
	pub rate_limit_pause: Duration,
	/// Give up after this long; `None` waits indefinitely.
	pub deadline: Option<Duration>,
}
impl Default for PollConfig {
	fn default() -> Self {
		Self { interval: Duration::from_secs(5), rate_limit_pause: Duration::from_secs(5), deadline: None }
	}
}

/// Last status reported during one wait.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PollState {
	last_step: Option<String>,
	last_state: Option<String>,
	terminal: bool,
}
impl PollState {
	/// Records `status`; returns `true` when its `(currentStep, state)` differs from the last one.
	pub fn observe(&mut self, status: &WorkflowStatus) -> bool {
		if self.last_step == status.current_step && self.last_state == status.state {
			return false;
		}

		self.last_step = status.current_step.clone();
		self.last_state = status.state.clone();

		true
	}

	/// Step of the last reported status.
	pub fn last_step(&self) -> Option<&str> {
		self.last_step.as_deref()
	}

	/// State of the last reported status.
	pub fn last_state(&self) -> Option<&str> {
		self.last_state.as_deref()
	}

	/// `true` once a terminal verdict was reached.
	pub fn is_terminal(&self) -> bool {
		self.terminal
	}
}

/// Predicate result for one fetched entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetVerdict {
	/// Keep polling.
	Pending,
	/// Done.
	Ready,
	/// Done, with the optional extra condition met as well.
	ReadyWithExtra,
	/// The service reported a failure.
	Failed,
}
impl TargetVerdict {
	/// `true` for every verdict except [`TargetVerdict::Pending`].
	pub fn is_terminal(self) -> bool {
		self != Self::Pending
	}
}

/// Terminal result of a wait, carrying the last fetched entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome<E> {
	/// Target reached its ready condition.
	Ready(E),
	/// Target reached its ready condition and the extra one.
	ReadyWithExtra(E),
	/// Service reported a failure.
	Failed(E),
}
impl<E> PollOutcome<E> {
	/// Last fetched entity.
	pub fn entity(&self) -> &E {
		match self {
			Self::Ready(entity) | Self::ReadyWithExtra(entity) | Self::Failed(entity) => entity,
		}
	}

	/// Consumes the outcome, returning the last fetched entity.
	pub fn into_entity(self) -> E {
		match self {
			Self::Ready(entity) | Self::ReadyWithExtra(entity) | Self::Failed(entity) => entity,
		}
	}

	/// `true` for [`PollOutcome::Failed`].
	pub fn is_failed(&self) -> bool {
		matches!(self, Self::Failed(_))
	}

	fn from_verdict(verdict: TargetVerdict, entity: E) -> Option<Self> {
		match verdict {
			TargetVerdict::Pending => None,
			TargetVerdict::Ready => Some(Self::Ready(entity)),
			TargetVerdict::ReadyWithExtra => Some(Self::ReadyWithExtra(entity)),
			TargetVerdict::Failed => Some(Self::Failed(entity)),
		}
	}
}

/// Something whose workflow status can be polled.
pub trait PollTarget
where
	Self: Send + Sync,
{
	/// Fetched entity.
	type Entity: Send;

	/// Name used in logs and observer callbacks.
	fn describe(&self) -> String;

	/// Fetches the entity once.
	fn fetch(&self) -> PollFuture<'_, Self::Entity>;

	/// Workflow status of `entity`, if the service reported one.
	fn status<'a>(&self, entity: &'a Self::Entity) -> Option<&'a WorkflowStatus>;

	/// Terminal predicate.
	fn verdict(&self, entity: &Self::Entity) -> TargetVerdict;
}

/// Receives progress of a wait.
pub trait PollObserver
where
	Self: Send + Sync,
{
	/// A new `(currentStep, state)` pair was observed; `error_report` carries the report text if any.
	fn status_changed(&self, target: &str, status: &WorkflowStatus, error_report: Option<&str>);

	/// A fetch was throttled.
	fn rate_limited(&self, _target: &str) {}

	/// The entity carried no workflow status yet.
	fn status_missing(&self, _target: &str) {}
}

/// Observer that only emits log events.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogObserver;
impl PollObserver for LogObserver {
	fn status_changed(&self, target: &str, status: &WorkflowStatus, _: Option<&str>) {
		obs::log_status_change(target, status.current_step.as_deref(), status.state.as_deref());
	}
}

/// Drives [`PollTarget`]s to a terminal verdict.
pub struct PollingWaiter<B>
where
	B: ?Sized + BlobTransfer,
{
	blobs: Arc<B>,
	config: PollConfig,
	observer: Arc<dyn PollObserver>,
}
impl<B> PollingWaiter<B>
where
	B: ?Sized + BlobTransfer,
{
	/// Creates a waiter that fetches error reports through `blobs`.
	pub fn new(blobs: Arc<B>) -> Self {
		Self { blobs, config: PollConfig::default(), observer: Arc::new(LogObserver) }
	}

	/// Replaces the timing.
	pub fn with_config(mut self, config: PollConfig) -> Self {
		self.config = config;

		self
	}

	/// Replaces the observer.
	pub fn with_observer(mut self, observer: Arc<dyn PollObserver>) -> Self {
		self.observer = observer;

		self
	}

	/// Active timing.
	pub fn config(&self) -> &PollConfig {
		&self.config
	}

	/// Polls `target` until it reaches a terminal verdict.
	///
	/// Returns [`Error::Api`] for non-throttling rejections and for a fetch that found no entity,
	/// [`Error::Cancelled`] once `cancel` fires, and [`Error::DeadlineExceeded`] when the configured
	/// deadline passes first.
	pub async fn wait<P>(&self, target: &P, cancel: &CancellationToken) -> Result<PollOutcome<P::Entity>>
	where
		P: ?Sized + PollTarget,
	{
		obs::observe(CallKind::Poll, "wait", self.run(target, cancel)).await
	}

	async fn run<P>(&self, target: &P, cancel: &CancellationToken) -> Result<PollOutcome<P::Entity>>
	where
		P: ?Sized + PollTarget,
	{
		let watch = Watch::new(cancel, self.config.deadline);
		let name = target.describe();
		let mut state = PollState::default();

		loop {
			let entities = match watch.guard(target.fetch()).await? {
				ApiResponse::Success(entities) => entities,
				ApiResponse::Failure(details) if details.is_rate_limited() => {
					obs::log_rate_limited(&name, self.config.rate_limit_pause);
					self.observer.rate_limited(&name);
					watch.sleep(self.config.rate_limit_pause).await?;

					continue;
				},
				ApiResponse::Failure(details) => return Err(Error::Api(details)),
			};
			let Some(entity) = entities.into_iter().next() else {
				return Err(Error::Api(not_found(&name)));
			};
			let verdict = target.verdict(&entity);

			match target.status(&entity) {
				Some(status) => {
					if state.observe(status) {
						let report = match status.error_report_url() {
							Some(url) => self.error_report(url, &watch).await?,
							None => None,
						};

						self.observer.status_changed(&name, status, report.as_deref());
					}
				},
				None => {
					self.observer.status_missing(&name);
					watch.sleep(self.config.interval).await?;

					continue;
				},
			}

			if let Some(outcome) = PollOutcome::from_verdict(verdict, entity) {
				state.terminal = true;

				return Ok(outcome);
			}

			watch.sleep(self.config.interval).await?;
		}
	}

	async fn error_report(&self, url: &str, watch: &Watch<'_>) -> Result<Option<String>> {
		let parsed = match Url::parse(url) {
			Ok(parsed) => parsed,
			Err(e) => {
				obs::log_error_report_unavailable(url, &e);

				return Ok(None);
			},
		};

		match watch.guard(self.blobs.download_text(&parsed)).await {
			Ok(text) => Ok(Some(text)),
			Err(e @ (Error::Cancelled | Error::DeadlineExceeded { .. })) => Err(e),
			Err(e) => {
				obs::log_error_report_unavailable(url, &e);

				Ok(None)
			},
		}
	}
}
impl<B> Debug for PollingWaiter<B>
where
	B: ?Sized + BlobTransfer,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PollingWaiter").field("config", &self.config).finish()
	}
}

struct Watch<'a> {
	cancel: &'a CancellationToken,
	started: Instant,
	deadline: Option<Instant>,
}
impl<'a> Watch<'a> {
	fn new(cancel: &'a CancellationToken, deadline: Option<Duration>) -> Self {
		let started = Instant::now();

		Self { cancel, started, deadline: deadline.map(|deadline| started + deadline) }
	}

	async fn guard<F, V>(&self, fut: F) -> Result<V>
	where
		F: Future<Output = Result<V>>,
	{
		tokio::select! {
			biased;
			_ = self.cancel.cancelled() => Err(Error::Cancelled),
			_ = expiry(self.deadline) => Err(Error::DeadlineExceeded { waited: self.started.elapsed() }),
			value = fut => value,
		}
	}

	async fn sleep(&self, duration: Duration) -> Result<()> {
		self.guard(pause(duration)).await
	}
}

async fn expiry(deadline: Option<Instant>) {
	match deadline {
		Some(at) => tokio::time::sleep_until(at).await,
		None => std::future::pending().await,
	}
}

async fn pause(duration: Duration) -> Result<()> {
	tokio::time::sleep(duration).await;

	Ok(())
}

fn not_found(target: &str) -> ErrorDetails {
	ErrorDetails {
		code: "entityNotFound".into(),
		message: format!("{target} returned no entity."),
		http_status: StatusCode::OK.as_u16(),
		..Default::default()
	}
}
