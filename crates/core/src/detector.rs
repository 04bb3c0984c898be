//! Decides whether a candidate needs (re)processing.

use crate::models::{canonical_key, fingerprint, CandidatePair, Fingerprint, FingerprintRecord};
use std::io;
use storage::FingerprintStore;
use tracing::debug;

/// Fingerprints observed for a candidate this cycle, plus the store key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub key: String,
    pub video: Fingerprint,
    pub subs: Option<Fingerprint>,
}

impl Observation {
    /// Stats the pair. Fails only if the video itself can't be stat'ed; an
    /// unreadable subtitle counts as no subtitle.
    pub fn of(pair: &CandidatePair) -> io::Result<Self> {
        let key = canonical_key(&pair.video)?;
        let video = fingerprint(&pair.video)?;
        let subs = pair.subtitle.as_deref().and_then(|s| match fingerprint(s) {
            Ok(fp) => Some(fp),
            Err(e) => {
                debug!("Could not stat subtitle {:?}: {}", s, e);
                None
            }
        });
        Ok(Self { key, video, subs })
    }

    pub fn into_record(self, processed_at: i64) -> (String, FingerprintRecord) {
        (
            self.key,
            FingerprintRecord {
                video: Some(self.video),
                subs: self.subs,
                processed_at,
            },
        )
    }
}

/// True unless a record exists whose video and subtitle fingerprints both
/// match what is on disk now.
pub fn needs_processing(observation: &Observation, store: &FingerprintStore) -> bool {
    match store.get(&observation.key) {
        None => true,
        Some(record) => !record.matches(Some(observation.video), observation.subs),
    }
}
