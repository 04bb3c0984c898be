//! Cleaner abstraction: the external tool that produces the cleaned video.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub mod command;
pub mod noop;

pub use command::CommandCleaner;
pub use noop::NoopCleaner;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// One invocation of the cleaner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub word_list: PathBuf,
    pub subtitle: Option<PathBuf>,
}

impl CleanRequest {
    /// Argument contract: `-i <video> -o <output> -w <wordlist> [-s <subtitle>]`.
    pub fn args(&self) -> Vec<std::ffi::OsString> {
        let mut args: Vec<std::ffi::OsString> = vec![
            "-i".into(),
            self.input.clone().into_os_string(),
            "-o".into(),
            self.output.clone().into_os_string(),
            "-w".into(),
            self.word_list.clone().into_os_string(),
        ];
        if let Some(subs) = &self.subtitle {
            args.push("-s".into());
            args.push(subs.clone().into_os_string());
        }
        args
    }
}

#[async_trait::async_trait]
pub trait Cleaner: Send + Sync {
    /// Runs to completion. `Ok` only on a zero exit status.
    async fn clean(&self, request: &CleanRequest) -> Result<(), CleanError>;
}
