/// Receives human-readable status updates. Purely observational.
pub trait ProgressSink: Send + Sync {
    fn report(&self, status: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, status: &str) {
        self(status)
    }
}

/// Forwards every status to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, status: &str) {
        tracing::info!(status, "progress");
    }
}
