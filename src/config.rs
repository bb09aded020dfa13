//! Configuration loading from `.env` files.

use std::{env, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};

/// Backend settings consumed at `init` time.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Backend name, `mem` for the built-in store.
    pub backend: String,
    /// Maximum number of events kept before the oldest is evicted.
    pub max_size: usize,
    /// Hard cap on the number of events a single query yields.
    pub max_limit: usize,
    /// Limit applied when no filter in a query names one.
    pub default_limit: usize,
    /// Accept filters carrying `search`.
    pub search: bool,
    /// Event corpus used by the command line driver.
    pub events_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: "mem".into(),
            max_size: 100_000,
            max_limit: 500,
            default_limit: 500,
            search: true,
            events_file: PathBuf::from("events.json"),
        }
    }
}

impl Settings {
    /// Load settings from the specified `.env` file.
    ///
    /// A missing file is not an error; variables already present in the
    /// environment are used and everything else falls back to
    /// [`Settings::default`].
    pub fn from_env(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            dotenvy::from_filename(path).context("reading env file")?;
        }
        let defaults = Settings::default();
        let backend = env::var("BACKEND")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.backend);
        let max_size = parse_var("MAX_SIZE")?.unwrap_or(defaults.max_size);
        let max_limit = parse_var("MAX_LIMIT")?.unwrap_or(defaults.max_limit);
        let default_limit = parse_var("DEFAULT_LIMIT")?.unwrap_or(defaults.default_limit);
        let search = env::var("SEARCH").map_or(defaults.search, |v| v.trim() != "0");
        let events_file = env::var("EVENTS_FILE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.events_file);
        Ok(Self {
            backend,
            max_size,
            max_limit,
            default_limit,
            search,
            events_file,
        })
    }
}

/// Parse an optional numeric variable; empty counts as unset.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => {
            let parsed = v
                .trim()
                .parse()
                .with_context(|| format!("parsing {name}={v}"))?;
            Ok(Some(parsed))
        }
        _ => Ok(None),
    }
}

/// Split a comma-separated string into trimmed string values.
pub fn csv_strings(input: impl AsRef<str>) -> Vec<String> {
    let s = input.as_ref();
    s.split(',')
        .filter_map(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .collect()
}

/// Split a comma-separated string into `u32` values, skipping invalid entries.
pub fn csv_u32(input: impl AsRef<str>) -> Vec<u32> {
    let s = input.as_ref();
    s.split(',').filter_map(|s| s.trim().parse().ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs, sync::Mutex};
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 6] = [
        "BACKEND",
        "MAX_SIZE",
        "MAX_LIMIT",
        "DEFAULT_LIMIT",
        "SEARCH",
        "EVENTS_FILE",
    ];

    fn clear_env() {
        for v in VARS {
            env::remove_var(v);
        }
    }

    #[test]
    fn loads_env() {
        let _g = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");
        fs::write(
            &env_path,
            concat!(
                "BACKEND=mem\n",
                "MAX_SIZE=1000\n",
                "MAX_LIMIT=50\n",
                "DEFAULT_LIMIT=20\n",
                "SEARCH=0\n",
                "EVENTS_FILE=/tmp/corpus.ndjson\n",
            ),
        )
        .unwrap();
        let cfg = Settings::from_env(env_path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.backend, "mem");
        assert_eq!(cfg.max_size, 1000);
        assert_eq!(cfg.max_limit, 50);
        assert_eq!(cfg.default_limit, 20);
        assert!(!cfg.search);
        assert_eq!(cfg.events_file, PathBuf::from("/tmp/corpus.ndjson"));
        clear_env();
    }

    #[test]
    fn defaults_when_absent() {
        let _g = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.env");
        let cfg = Settings::from_env(missing.to_str().unwrap()).unwrap();
        assert_eq!(cfg, Settings::default());
    }

    #[test]
    fn empty_values_fall_back() {
        let _g = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");
        fs::write(&env_path, "BACKEND=\nMAX_SIZE=\nEVENTS_FILE=\n").unwrap();
        let cfg = Settings::from_env(env_path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.backend, "mem");
        assert_eq!(cfg.max_size, 100_000);
        assert_eq!(cfg.events_file, PathBuf::from("events.json"));
        clear_env();
    }

    #[test]
    fn invalid_number_errors() {
        let _g = ENV_MUTEX.lock().unwrap();
        clear_env();
        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env");
        fs::write(&env_path, "MAX_SIZE=lots\n").unwrap();
        let err = Settings::from_env(env_path.to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("MAX_SIZE"));
        clear_env();
    }

    #[test]
    fn csv_helpers() {
        assert_eq!(csv_strings("a, b , ,c"), vec!["a", "b", "c"]);
        assert!(csv_strings("").is_empty());
        assert_eq!(csv_u32("1, 2, x,3"), vec![1, 2, 3]);
        assert!(csv_u32("").is_empty());
    }
}
