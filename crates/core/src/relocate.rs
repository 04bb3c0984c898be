use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Moves `from` into `dir`, keeping its file name and replacing any file of
/// that name already there. Falls back to copy-then-delete when a plain
/// rename fails (watch roots on removable drives live on other filesystems).
pub fn move_into_dir(from: &Path, dir: &Path) -> Result<PathBuf> {
    let file_name = from
        .file_name()
        .with_context(|| format!("{:?} has no file name", from))?;
    fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    let to = dir.join(file_name);

    if let Err(e) = fs::rename(from, &to) {
        debug!("rename {:?} -> {:?} failed ({}), copying instead", from, to, e);
        fs::copy(from, &to).with_context(|| format!("copying {:?} to {:?}", from, to))?;
        fs::remove_file(from).with_context(|| format!("removing {:?} after copy", from))?;
    }
    Ok(to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_and_creates_destination() {
        let temp = tempfile::tempdir().unwrap();
        let src = temp.path().join("movie.mkv");
        fs::write(&src, b"video").unwrap();
        let dest_dir = temp.path().join("processed").join("nested");

        let moved = move_into_dir(&src, &dest_dir).unwrap();
        assert_eq!(moved, dest_dir.join("movie.mkv"));
        assert!(!src.exists());
        assert_eq!(fs::read(&moved).unwrap(), b"video");
    }

    #[test]
    fn replaces_existing_file_of_same_name() {
        let temp = tempfile::tempdir().unwrap();
        let dest_dir = temp.path().join("processed");
        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(dest_dir.join("movie.mkv"), b"old").unwrap();
        let src = temp.path().join("movie.mkv");
        fs::write(&src, b"new").unwrap();

        move_into_dir(&src, &dest_dir).unwrap();
        assert_eq!(fs::read(dest_dir.join("movie.mkv")).unwrap(), b"new");
    }

    #[test]
    fn missing_source_errors() {
        let temp = tempfile::tempdir().unwrap();
        assert!(move_into_dir(&temp.path().join("gone.mkv"), temp.path()).is_err());
    }
}
