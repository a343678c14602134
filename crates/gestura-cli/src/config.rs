//! Configuration file – reads/writes `~/.gestura/config.toml`.

use gestura_runtime::{BufferingPolicy, RecognizerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted CLI configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Recognizer tuning (window length, hysteresis, smoothing, labels).
    #[serde(default)]
    pub recognizer: RecognizerConfig,
}

/// Return the path to `~/.gestura/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".gestura").join("config.toml")
}

/// Load the config from a specific path, applying environment overrides.
pub fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Resolve the effective config: `path` if given, else the default file,
/// else built-in defaults (with environment overrides in every case).
pub fn resolve(path: Option<&Path>) -> Result<(Config, Option<PathBuf>), String> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    match load_from(&path)? {
        Some(cfg) => Ok((cfg, Some(path))),
        None => {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            Ok((cfg, None))
        }
    }
}

/// Apply `GESTURA_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `GESTURA_SEQUENCE_LENGTH` | `recognizer.sequence_length` |
/// | `GESTURA_MISSED_FRAME_THRESHOLD` | `recognizer.missed_frame_threshold` |
/// | `GESTURA_HISTORY_SIZE` | `recognizer.history_size` |
/// | `GESTURA_POLICY` | `recognizer.policy` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    let r = &mut cfg.recognizer;
    if let Ok(v) = std::env::var("GESTURA_SEQUENCE_LENGTH")
        && let Ok(n) = v.trim().parse::<usize>()
    {
        r.sequence_length = n;
    }
    if let Ok(v) = std::env::var("GESTURA_MISSED_FRAME_THRESHOLD")
        && let Ok(n) = v.trim().parse::<u32>()
    {
        r.missed_frame_threshold = n;
    }
    if let Ok(v) = std::env::var("GESTURA_HISTORY_SIZE")
        && let Ok(n) = v.trim().parse::<usize>()
    {
        r.history_size = n;
    }
    if let Ok(v) = std::env::var("GESTURA_POLICY")
        && let Ok(policy) = v.parse::<BufferingPolicy>()
    {
        r.policy = policy;
    }
}

/// Save the config to `path`, creating the parent directory if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
