use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

pub use storage::{Fingerprint, FingerprintRecord};

/// A video plus the subtitle sharing its stem, if any. Rebuilt every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub stem: String,
    pub video: PathBuf,
    pub subtitle: Option<PathBuf>,
}

/// Size and whole-second mtime of `path`.
pub fn fingerprint(path: &Path) -> io::Result<Fingerprint> {
    let meta = fs::metadata(path)?;
    let mtime = match meta.modified()?.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    };
    Ok(Fingerprint {
        size: meta.len(),
        mtime,
    })
}

/// Absolute form of `path` with `.` and `..` collapsed lexically (symlinks
/// are not resolved); the store key.
pub fn canonical_key(path: &Path) -> io::Result<String> {
    let mut normalized = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_reports_size() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("a.mkv");
        fs::write(&path, b"12345").unwrap();
        let fp = fingerprint(&path).unwrap();
        assert_eq!(fp.size, 5);
        assert!(fp.mtime > 0);
    }

    #[test]
    fn fingerprint_of_missing_file_errors() {
        let temp = tempfile::tempdir().unwrap();
        assert!(fingerprint(&temp.path().join("gone.mkv")).is_err());
    }

    #[test]
    fn canonical_key_is_absolute() {
        let key = canonical_key(Path::new("relative/movie.mkv")).unwrap();
        assert!(Path::new(&key).is_absolute());
        assert!(key.ends_with("movie.mkv"));
    }

    #[cfg(unix)]
    #[test]
    fn canonical_key_collapses_parent_dirs() {
        assert_eq!(
            canonical_key(Path::new("/data/in/../in/./movie.mkv")).unwrap(),
            "/data/in/movie.mkv"
        );
        assert_eq!(canonical_key(Path::new("/../movie.mkv")).unwrap(), "/movie.mkv");
    }
}
