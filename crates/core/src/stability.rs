//! Size-stability check guarding against files still being copied in.

use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Samples the size of `path`, waits `window`, samples again. Any I/O error
/// counts as unstable; the file is retried next cycle.
pub async fn is_stable(path: &Path, window: Duration) -> bool {
    let first = match fs::metadata(path).await {
        Ok(m) => m.len(),
        Err(e) => {
            debug!("Could not stat {:?}: {}", path, e);
            return false;
        }
    };
    tokio::time::sleep(window).await;
    let second = match fs::metadata(path).await {
        Ok(m) => m.len(),
        Err(e) => {
            debug!("Could not stat {:?}: {}", path, e);
            return false;
        }
    };
    if first != second {
        debug!("{:?} still changing ({} -> {} bytes)", path, first, second);
        return false;
    }
    true
}
