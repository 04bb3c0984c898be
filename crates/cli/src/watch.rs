use anyhow::Result;
use cleanvid_core::config::AppConfig;
use cleanvid_core::pipeline::{CycleSummary, Service};
use providers::CommandCleaner;
use std::sync::Arc;
use storage::FingerprintStore;
use tracing::{info, warn};

/// Loads the store, wires the subprocess cleaner and creates the directories.
pub fn build_service(cfg: &AppConfig) -> Result<Service> {
    let store = FingerprintStore::load(&cfg.db_path);
    info!("Loaded {} processed record(s) from {}", store.len(), cfg.db_path);

    let word_list = cfg.word_list();
    if !word_list.is_file() {
        warn!("Word list {:?} not found; cleaner runs will likely fail", word_list);
    }

    let cleaner = Arc::new(CommandCleaner::new(cfg.cleaner_program.clone()));
    let service = Service::new(cfg, store, cleaner)?;
    service.ensure_directories();
    Ok(service)
}

/// Runs until Ctrl-C. An in-flight cycle is dropped, which kills a running
/// cleaner; its file has no record yet and is picked up again on restart.
pub async fn watch(cfg: AppConfig) -> Result<()> {
    let mut service = build_service(&cfg)?;
    service
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Could not listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Interrupt received");
        })
        .await;
    Ok(())
}

pub async fn run_once(cfg: AppConfig) -> Result<CycleSummary> {
    let mut service = build_service(&cfg)?;
    service.run_cycle().await
}
