use crate::{CleanError, CleanRequest, Cleaner};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// Runs the cleaner as a subprocess and waits for it.
#[derive(Debug, Clone)]
pub struct CommandCleaner {
    program: String,
}

impl CommandCleaner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for CommandCleaner {
    fn default() -> Self {
        Self::new("cleanvid")
    }
}

#[async_trait::async_trait]
impl Cleaner for CommandCleaner {
    async fn clean(&self, request: &CleanRequest) -> Result<(), CleanError> {
        let args = request.args();
        info!(
            "Running: {} {}",
            self.program,
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CleanError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(CleanError::Failed {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}
