use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

/// Get the default plancraft data directory: ~/.plancraft
pub fn get_plancraft_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".plancraft"))
}

/// Expand `~` and `$VAR` in a configured path.
pub fn expand_path(raw: &str) -> anyhow::Result<PathBuf> {
    let expanded = shellexpand::full(raw).with_context(|| format!("cannot expand path {raw:?}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config file {}", path.display()))?;
    toml::from_str::<AppConfig>(&s).with_context(|| format!("invalid config file {}", path.display()))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    let data_dir = get_plancraft_data_dir()?;

    // Priority 1: $PLANCRAFT_CONFIG
    let explicit = std::env::var("PLANCRAFT_CONFIG")
        .ok()
        .filter(|v| !v.trim().is_empty());
    // Priority 2: ~/.plancraft/config.toml
    let home_config = data_dir.join("config.toml");
    // Priority 3: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg: AppConfig = if let Some(path) = explicit {
        load_from_path(&expand_path(&path)?)?
    } else if home_config.exists() {
        load_from_path(&home_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    if cfg.cache.directory.as_deref().map(str::trim).unwrap_or("").is_empty() {
        cfg.cache.directory = Some(data_dir.join("cache").to_string_lossy().to_string());
    }

    if cfg.logging.file
        && cfg
            .logging
            .directory
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    {
        cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg)?;
    Ok(cfg)
}

/// Environment variable overrides (highest priority).
pub fn apply_env_overrides(cfg: &mut AppConfig) -> anyhow::Result<()> {
    if let Ok(v) = std::env::var("PLANCRAFT_RETRY_DELAY_MS") {
        if !v.trim().is_empty() {
            cfg.retry.delay_ms = v
                .trim()
                .parse()
                .with_context(|| format!("PLANCRAFT_RETRY_DELAY_MS is not a number: {v:?}"))?;
        }
    }
    if let Ok(v) = std::env::var("PLANCRAFT_CACHE_DIR") {
        if !v.trim().is_empty() {
            cfg.cache.directory = Some(v);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[retry]\ndelay_ms = 5\n[output]\nformat = \"jsonl\"\n").unwrap();

        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.retry.delay_ms, 5);
        assert_eq!(cfg.output.format, "jsonl");
    }

    #[test]
    fn test_invalid_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[retry\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("bad.toml"));
    }

    #[test]
    fn test_expand_plain_path() {
        assert_eq!(expand_path("/tmp/plans").unwrap(), PathBuf::from("/tmp/plans"));
    }
}
