use crate::config::AppConfig;
use crate::detector::{needs_processing, Observation};
use crate::invoker::{self, ProcessOptions};
use crate::models::{canonical_key, CandidatePair};
use crate::scanner::{self, Classifier};
use crate::stability;
use anyhow::Context;
use providers::Cleaner;
use serde::Serialize;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storage::FingerprintStore;
use tokio::task;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub discovered: usize,
    pub unstable: usize,
    pub unchanged: usize,
    pub processed: usize,
    pub failed: usize,
}

/// Owns the store and drives scan → gate → detect → process → persist.
pub struct Service {
    roots: Vec<PathBuf>,
    options: ProcessOptions,
    stability_window: Duration,
    poll_interval: Duration,
    classifier: Classifier,
    store: FingerprintStore,
    cleaner: Arc<dyn Cleaner>,
}

impl Service {
    pub fn new(
        config: &AppConfig,
        store: FingerprintStore,
        cleaner: Arc<dyn Cleaner>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            roots: config.watch_roots(),
            options: ProcessOptions::from_config(config),
            stability_window: config.stability_window(),
            poll_interval: config.poll_interval(),
            classifier: Classifier::new().context("building extension filters")?,
            store,
            cleaner,
        })
    }

    pub fn store(&self) -> &FingerprintStore {
        &self.store
    }

    /// Creates watch roots, the output directory and the processed directory.
    /// Failures are logged; a missing root just scans empty.
    pub fn ensure_directories(&self) {
        let dirs = self
            .roots
            .iter()
            .chain([&self.options.output_dir, &self.options.processed_dir]);
        for dir in dirs {
            if let Err(e) = fs::create_dir_all(dir) {
                warn!("Could not create {:?}: {}", dir, e);
            }
        }
    }

    /// With outputs written beside their inputs, `X_clean.ext` is this
    /// service's own output when `X.ext` sits in the same directory or has a
    /// record. Any other `*_clean` video is an ordinary candidate.
    fn is_own_output(&self, source: Option<&Path>, source_present: bool) -> bool {
        let Some(source) = source else {
            return false;
        };
        source_present
            || canonical_key(source)
                .map(|key| self.store.get(&key).is_some())
                .unwrap_or(false)
    }

    /// One full pass over every watch root. Candidates that can't be read are
    /// skipped; the store is saved after each successful invocation.
    pub async fn run_cycle(&mut self) -> anyhow::Result<CycleSummary> {
        let roots = self.roots.clone();
        let classifier = self.classifier.clone();
        let next_to_input = self.options.write_output_next_to_input;
        let scanned = task::spawn_blocking(move || {
            scanner::scan_roots(&roots, &classifier)
                .into_iter()
                .map(|pair| {
                    let source = if next_to_input {
                        invoker::source_for_output(&pair.video)
                    } else {
                        None
                    };
                    let present = source.as_deref().map(Path::is_file).unwrap_or(false);
                    (pair, source, present)
                })
                .collect::<Vec<_>>()
        })
        .await
        .context("scanner task failed")?;

        let pairs: Vec<CandidatePair> = scanned
            .into_iter()
            .filter_map(|(pair, source, present)| {
                if self.is_own_output(source.as_deref(), present) {
                    debug!("Skipping cleaned output {:?}", pair.video);
                    None
                } else {
                    Some(pair)
                }
            })
            .collect();

        let mut summary = CycleSummary {
            discovered: pairs.len(),
            ..CycleSummary::default()
        };

        for pair in &pairs {
            if !stability::is_stable(&pair.video, self.stability_window).await {
                summary.unstable += 1;
                continue;
            }

            let candidate = pair.clone();
            let observed = task::spawn_blocking(move || Observation::of(&candidate))
                .await
                .context("stat task failed")?;
            let observation = match observed {
                Ok(o) => o,
                Err(e) => {
                    debug!("Skipping {:?} this cycle: {}", pair.video, e);
                    summary.unstable += 1;
                    continue;
                }
            };
            if !needs_processing(&observation, &self.store) {
                summary.unchanged += 1;
                continue;
            }

            match invoker::process(self.cleaner.as_ref(), pair, &self.options).await {
                Ok(_) => {
                    summary.processed += 1;
                    let (key, record) = observation.into_record(chrono::Utc::now().timestamp());
                    self.store.insert(key, record);
                    if let Err(e) = self.persist().await {
                        error!("Could not save processed DB: {:#}", e);
                    }
                }
                Err(_) => summary.failed += 1,
            }
        }

        if summary.processed > 0 || summary.failed > 0 {
            info!(
                "Cycle done: {} candidates, {} processed, {} failed, {} unchanged, {} unstable",
                summary.discovered,
                summary.processed,
                summary.failed,
                summary.unchanged,
                summary.unstable
            );
        } else {
            debug!("Cycle done: {:?}", summary);
        }
        Ok(summary)
    }

    async fn persist(&self) -> anyhow::Result<()> {
        let bytes = self.store.to_json()?;
        let path = self.store.path().to_path_buf();
        task::spawn_blocking(move || storage::write_atomic(&path, &bytes))
            .await
            .context("store write task failed")??;
        debug!("Saved processed DB ({} records)", self.store.len());
        Ok(())
    }

    /// Cycle, sleep, repeat until `shutdown` resolves. A failed cycle is
    /// logged and the loop carries on after the usual interval.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Starting cleanvid service: watch_dirs={} output={:?}",
            self.roots
                .iter()
                .map(|r| r.to_string_lossy())
                .collect::<Vec<_>>()
                .join(","),
            self.options.output_dir
        );
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                result = self.run_cycle() => {
                    if let Err(e) = result {
                        error!("Error in service loop: {:#}", e);
                    }
                }
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        info!("Service stopped");
    }
}
