use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "CLEANVID";
const MOUNTED_SWEARS_FILE: &str = "/data/swears.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub watch_dirs: Vec<String>,
    pub output_dir: String,
    pub processed_dir: String,
    /// Seconds between cycles.
    pub poll_interval: f64,
    pub preserve_input: bool,
    pub write_output_next_to_input: bool,
    pub swears_file: Option<String>,
    #[serde(rename = "db")]
    pub db_path: String,
    /// Seconds between the two size samples of the stability gate.
    pub stability_window: f64,
    pub cleaner_program: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            watch_dirs: vec![
                "/data/in".to_string(),
                "/data/usb1".to_string(),
                "/data/usb2".to_string(),
            ],
            output_dir: "/data/out".to_string(),
            processed_dir: "/data/processed".to_string(),
            poll_interval: 10.0,
            preserve_input: true,
            write_output_next_to_input: true,
            swears_file: None,
            db_path: "/data/.cleanvid_processed.json".to_string(),
            stability_window: 1.0,
            cleaner_program: "cleanvid".to_string(),
        }
    }
}

impl AppConfig {
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        self.watch_dirs
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.poll_interval)
    }

    pub fn stability_window(&self) -> Duration {
        Duration::from_secs_f64(self.stability_window)
    }

    /// The configured word list, else the mounted `/data/swears.txt`, else
    /// `swears.txt` beside the executable.
    pub fn word_list(&self) -> PathBuf {
        if let Some(p) = self.swears_file.as_deref().filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        let mounted = Path::new(MOUNTED_SWEARS_FILE);
        if mounted.is_file() {
            return mounted.to_path_buf();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|d| d.join("swears.txt")))
            .unwrap_or_else(|| PathBuf::from("swears.txt"))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.watch_roots().is_empty() {
            bail!("at least one watch directory is required");
        }
        for (name, secs) in [
            ("poll_interval", self.poll_interval),
            ("stability_window", self.stability_window),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                bail!("{} must be a non-negative number of seconds, got {}", name, secs);
            }
        }
        Ok(())
    }
}

/// Defaults, then the config file, then `CLEANVID_*` environment variables.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/cleanvid").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("watch_dirs"),
    );
    let cfg: AppConfig = settings
        .build()
        .context("reading configuration")?
        .try_deserialize()
        .context("parsing configuration")?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    // Tests that call `load` read the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    struct EnvVars(&'static [(&'static str, &'static str)]);

    impl EnvVars {
        fn set(vars: &'static [(&'static str, &'static str)]) -> Self {
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
            Self(vars)
        }
    }

    impl Drop for EnvVars {
        fn drop(&mut self) {
            for (k, _) in self.0 {
                std::env::remove_var(k);
            }
        }
    }

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.watch_roots().len(), 3);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(10));
        assert_eq!(cfg.stability_window(), Duration::from_secs(1));
        assert!(cfg.preserve_input);
        assert!(cfg.write_output_next_to_input);
        assert_eq!(cfg.db_path, "/data/.cleanvid_processed.json");
        cfg.validate().unwrap();
    }

    #[test]
    fn file_overrides_defaults() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("cleanvid.toml");
        fs::write(
            &file,
            r#"
            watch_dirs = ["/a", " ", "/b"]
            poll_interval = 2.5
            preserve_input = false
            db = "/tmp/db.json"
            "#,
        )
        .unwrap();
        let cfg = load(Some(file.to_str().unwrap())).unwrap();
        assert_eq!(cfg.watch_roots(), vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(2500));
        assert!(!cfg.preserve_input);
        assert_eq!(cfg.db_path, "/tmp/db.json");
        assert_eq!(cfg.output_dir, "/data/out");
    }

    #[test]
    fn environment_overrides_file_and_defaults() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("cleanvid.toml");
        fs::write(
            &file,
            r#"
            watch_dirs = ["/a"]
            poll_interval = 7
            preserve_input = true
            db = "/from/file.json"
            "#,
        )
        .unwrap();
        let _env = EnvVars::set(&[
            ("CLEANVID_WATCH_DIRS", "/x, ,/y"),
            ("CLEANVID_PRESERVE_INPUT", "no"),
            ("CLEANVID_POLL_INTERVAL", "2.5"),
            ("CLEANVID_DB", "/tmp/p.json"),
        ]);

        let cfg = load(Some(file.to_str().unwrap())).unwrap();
        assert_eq!(cfg.watch_roots(), vec![PathBuf::from("/x"), PathBuf::from("/y")]);
        assert!(!cfg.preserve_input);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(2500));
        assert_eq!(cfg.db_path, "/tmp/p.json");
        assert_eq!(cfg.processed_dir, "/data/processed");
    }

    #[test]
    fn single_watch_dir_from_environment() {
        let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("cleanvid.toml");
        fs::write(&file, "output_dir = \"/out\"\n").unwrap();
        let _env = EnvVars::set(&[
            ("CLEANVID_WATCH_DIRS", "/only"),
            ("CLEANVID_WRITE_OUTPUT_NEXT_TO_INPUT", "1"),
        ]);

        let cfg = load(Some(file.to_str().unwrap())).unwrap();
        assert_eq!(cfg.watch_roots(), vec![PathBuf::from("/only")]);
        assert!(cfg.write_output_next_to_input);
        assert_eq!(cfg.output_dir, "/out");
    }

    #[test]
    fn rejects_negative_interval() {
        let cfg = AppConfig {
            poll_interval: -1.0,
            ..AppConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_watch_list() {
        let cfg = AppConfig {
            watch_dirs: vec!["".to_string()],
            ..AppConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn explicit_word_list_wins() {
        let cfg = AppConfig {
            swears_file: Some("/etc/words.txt".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(cfg.word_list(), PathBuf::from("/etc/words.txt"));
    }
}
