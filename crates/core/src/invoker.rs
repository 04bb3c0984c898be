//! Runs the cleaner for one candidate and relocates its inputs afterwards.

use crate::config::AppConfig;
use crate::models::CandidatePair;
use crate::relocate::move_into_dir;
use providers::{CleanError, CleanRequest, Cleaner};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::{fs, task};
use tracing::{error, info, warn};

pub const OUTPUT_SUFFIX: &str = "_clean";

/// Where things go and what happens to inputs once cleaned.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub output_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub word_list: PathBuf,
    pub preserve_input: bool,
    pub write_output_next_to_input: bool,
}

impl ProcessOptions {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&cfg.output_dir),
            processed_dir: PathBuf::from(&cfg.processed_dir),
            word_list: cfg.word_list(),
            preserve_input: cfg.preserve_input,
            write_output_next_to_input: cfg.write_output_next_to_input,
        }
    }
}

/// `name.mp4` → `name_clean.mp4`, beside the input or in `output_dir`.
pub fn output_path(video: &Path, output_dir: &Path, next_to_input: bool) -> PathBuf {
    let mut name: OsString = video.file_stem().unwrap_or_default().to_os_string();
    name.push(OUTPUT_SUFFIX);
    if let Some(ext) = video.extension() {
        name.push(".");
        name.push(ext);
    }
    let dir = if next_to_input {
        video.parent().unwrap_or_else(|| Path::new("."))
    } else {
        output_dir
    };
    dir.join(name)
}

/// For `dir/X_clean.ext`, the input it would have been produced from:
/// `dir/X.ext`. `None` when the stem lacks the output suffix.
pub fn source_for_output(video: &Path) -> Option<PathBuf> {
    let stem = video.file_stem()?.to_str()?;
    let base = stem.strip_suffix(OUTPUT_SUFFIX).filter(|b| !b.is_empty())?;
    let mut name = OsString::from(base);
    if let Some(ext) = video.extension() {
        name.push(".");
        name.push(ext);
    }
    Some(video.with_file_name(name))
}

/// Invokes the cleaner; on success and unless inputs are preserved, moves the
/// video and subtitle into the processed directory. Relocation failures are
/// logged and do not turn the success into a failure.
pub async fn process(
    cleaner: &dyn Cleaner,
    pair: &CandidatePair,
    options: &ProcessOptions,
) -> Result<PathBuf, CleanError> {
    let output = output_path(
        &pair.video,
        &options.output_dir,
        options.write_output_next_to_input,
    );
    let subtitle = match &pair.subtitle {
        Some(s) if is_file(s).await => Some(s.clone()),
        _ => None,
    };
    let request = CleanRequest {
        input: pair.video.clone(),
        output: output.clone(),
        word_list: options.word_list.clone(),
        subtitle: subtitle.clone(),
    };

    if let Err(e) = cleaner.clean(&request).await {
        error!("Failed processing {:?}: {}", pair.video, e);
        return Err(e);
    }
    info!("Processed {:?} -> {:?}", pair.video, output);

    if !options.preserve_input {
        let video = pair.video.clone();
        let processed_dir = options.processed_dir.clone();
        let moved =
            task::spawn_blocking(move || relocate_inputs(&video, subtitle.as_deref(), &processed_dir))
                .await;
        if let Err(e) = moved {
            warn!("Relocation task for {:?} failed: {}", pair.video, e);
        }
    }
    Ok(output)
}

/// Each move is attempted on its own; failures are only logged.
fn relocate_inputs(video: &Path, subtitle: Option<&Path>, processed_dir: &Path) {
    if let Err(e) = move_into_dir(video, processed_dir) {
        warn!("Could not move processed video {:?}: {:#}", video, e);
    }
    if let Some(subs) = subtitle {
        if let Err(e) = move_into_dir(subs, processed_dir) {
            warn!("Could not move processed subtitle {:?}: {:#}", subs, e);
        }
    }
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_file()).unwrap_or(false)
}
