use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cvats_core::error::{CvatsError, Result};
use cvats_core::extraction::{ExtractApi, ExtractionOutcome, ExtractionRequest};
use cvats_core::progress::ProgressSink;

/// Status reported before every backoff wait.
pub const STILL_WORKING: &str = "Extracting…";

/// Shortest wait between two polls, whatever the policy says.
pub const MIN_POLL_DELAY: Duration = Duration::from_millis(50);

/// Backoff schedule for a pending extraction job.
///
/// Delays below [`MIN_POLL_DELAY`] are raised to it and a `factor` below 1
/// (or NaN) counts as 1. A `deadline` too large to add to the current
/// instant means no deadline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub factor: f64,
    /// Total client-side wait budget, measured from the first pending response.
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1200),
            max_delay: Duration::from_millis(4000),
            factor: 1.5,
            deadline: Duration::from_millis(25_000),
        }
    }
}

impl PollPolicy {
    /// `min(round(current * factor), max_delay)`, in whole milliseconds.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let grown = (current.as_millis() as f64 * self.factor.max(1.0)).round() as u64;
        Duration::from_millis(grown)
            .min(self.max_delay)
            .max(MIN_POLL_DELAY)
    }

    fn first_delay(&self) -> Duration {
        self.initial_delay.max(MIN_POLL_DELAY)
    }
}

/// Drives a "start job, then poll until done" exchange with the extraction endpoint.
#[derive(Clone)]
pub struct JobPoller {
    api: Arc<dyn ExtractApi>,
    policy: PollPolicy,
}

impl JobPoller {
    pub fn new(api: Arc<dyn ExtractApi>) -> Self {
        Self::with_policy(api, PollPolicy::default())
    }

    pub fn with_policy(api: Arc<dyn ExtractApi>, policy: PollPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Extract the text of the uploaded object named by `key`.
    ///
    /// Returns at once when the start call already carries the final text.
    /// Otherwise polls with capped multiplicative backoff until the job
    /// resolves, the backend reports a failure, the deadline passes
    /// ([`CvatsError::ExtractionTimeout`]) or `cancel` fires
    /// ([`CvatsError::Cancelled`]).
    pub async fn extract_text(
        &self,
        key: &str,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if key.trim().is_empty() {
            return Err(CvatsError::Validation(
                "extraction key must not be empty".into(),
            ));
        }

        info!(key, "Starting text extraction");
        let job_id = match self.call(ExtractionRequest::start(key), cancel).await? {
            ExtractionOutcome::Done(text) => {
                info!(key, text_len = text.len(), "Extraction finished immediately");
                return Ok(text);
            }
            ExtractionOutcome::Pending(Some(job_id)) => job_id,
            ExtractionOutcome::Pending(None) => {
                return Err(CvatsError::MalformedResponse(
                    "pending extraction response has no jobId".into(),
                ));
            }
        };

        let mut delay = self.policy.first_delay();
        let deadline = Instant::now().checked_add(self.policy.deadline);
        let mut polls: u32 = 0;

        while deadline.map_or(true, |deadline| Instant::now() < deadline) {
            progress.report(STILL_WORKING);
            cancellable(cancel, tokio::time::sleep(delay)).await?;

            polls += 1;
            debug!(
                job_id = %job_id,
                poll = polls,
                delay_ms = delay.as_millis() as u64,
                "Polling extraction job"
            );

            match self.call(ExtractionRequest::poll(job_id.as_str()), cancel).await? {
                ExtractionOutcome::Done(text) => {
                    info!(job_id = %job_id, polls, text_len = text.len(), "Extraction finished");
                    return Ok(text);
                }
                ExtractionOutcome::Pending(_) => {}
            }

            delay = self.policy.next_delay(delay);
        }

        warn!(job_id = %job_id, polls, "Extraction still pending at deadline");
        Err(CvatsError::ExtractionTimeout)
    }

    async fn call(
        &self,
        request: ExtractionRequest,
        cancel: &CancellationToken,
    ) -> Result<ExtractionOutcome> {
        cancellable(cancel, self.api.extract(&request))
            .await??
            .into_outcome()
    }
}

/// Run `fut` unless `cancel` fires first. An already-cancelled token wins.
pub(crate) async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CvatsError::Cancelled),
        output = fut => Ok(output),
    }
}
