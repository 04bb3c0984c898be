use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use cleanvid_core::models::canonical_key;
use serde::Serialize;
use std::path::Path;
use storage::{Fingerprint, FingerprintStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRow {
    pub path: String,
    pub video: Option<Fingerprint>,
    pub subs: Option<Fingerprint>,
    pub processed_at: String,
}

pub fn list_records(db_path: &str) -> Vec<RecordRow> {
    let store = FingerprintStore::load(db_path);
    store
        .iter()
        .map(|(path, rec)| RecordRow {
            path: path.clone(),
            video: rec.video,
            subs: rec.subs,
            processed_at: Utc
                .timestamp_opt(rec.processed_at, 0)
                .single()
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| rec.processed_at.to_string()),
        })
        .collect()
}

/// Drops the records for `paths` so they are reprocessed next cycle. Returns
/// how many were removed; the store is only rewritten if something changed.
pub fn forget(db_path: &str, paths: &[String]) -> Result<usize> {
    let mut store = FingerprintStore::load(db_path);
    let mut removed = 0;
    for p in paths {
        let key = canonical_key(Path::new(p)).with_context(|| format!("resolving {}", p))?;
        if store.remove(&key).is_some() {
            removed += 1;
        }
    }
    if removed > 0 {
        store.save().context("saving processed DB")?;
    }
    Ok(removed)
}
