use crate::{CleanError, CleanRequest, Cleaner};
use tracing::debug;

/// Accepts every request without running anything or writing an output.
#[derive(Debug, Default)]
pub struct NoopCleaner;

#[async_trait::async_trait]
impl Cleaner for NoopCleaner {
    async fn clean(&self, request: &CleanRequest) -> Result<(), CleanError> {
        debug!("noop cleaner: {:?} -> {:?}", request.input, request.output);
        Ok(())
    }
}
