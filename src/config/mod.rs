mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

use crate::images::CompressionPreset;
use crate::images::StorageMode;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./reportforge.toml",
        "./config.toml",
        "~/.config/reportforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn validate_preset(name: &str, preset: &CompressionPreset) -> Result<()> {
    if preset.max_dimension == 0 {
        anyhow::bail!("images.{}.max_dimension cannot be 0", name);
    }
    if !(0.0..=1.0).contains(&preset.quality) {
        anyhow::bail!(
            "images.{}.quality must be between 0 and 1, got {}",
            name,
            preset.quality
        );
    }
    Ok(())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_preset("blob_preset", &config.images.blob_preset)?;
    validate_preset("inline_preset", &config.images.inline_preset)?;

    if config.images.max_inline_bytes == 0 {
        anyhow::bail!("images.max_inline_bytes cannot be 0");
    }

    if config.resolve.timeout_ms == 0 {
        anyhow::bail!("resolve.timeout_ms cannot be 0");
    }

    if config.legacy.timeout_ms == 0 {
        anyhow::bail!("legacy.timeout_ms cannot be 0");
    }

    if config.images.storage == StorageMode::Remote && config.blob.base_url.is_none() {
        anyhow::bail!("images.storage is \"remote\" but blob.base_url is not set");
    }

    if config.cache.prefix.is_empty() {
        tracing::warn!("cache.prefix is empty, cache eviction will consider every local entry");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database.collection, "laporan");
        assert_eq!(config.images.storage, StorageMode::Inline);
        assert_eq!(config.images.max_inline_bytes, 900_000);
        assert_eq!(config.images.blob_preset, CompressionPreset::BLOB);
        assert_eq!(config.images.inline_preset, CompressionPreset::INLINE);
        assert_eq!(config.resolve.timeout_ms, 5000);
        assert_eq!(config.legacy.collection, "images");
        assert_eq!(config.cache.prefix, "img_");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_full_config() {
        let file = write_config(
            r#"
            [database]
            path = "/var/lib/reportforge/data.db"

            [images]
            storage = "remote"
            max_inline_bytes = 500000

            [images.inline_preset]
            max_dimension = 800
            quality = 0.6

            [resolve]
            timeout_ms = 3000

            [legacy]
            base_url = "https://legacy.example"

            [cache]
            quota_bytes = 1048576

            [blob]
            base_url = "https://blob.example/upload"
            public_base_url = "https://cdn.example"
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.images.storage, StorageMode::Remote);
        assert_eq!(config.images.inline_preset.max_dimension, 800);
        assert_eq!(config.images.blob_preset, CompressionPreset::BLOB);
        assert_eq!(config.resolve.timeout_ms, 3000);
        assert_eq!(config.legacy.base_url.as_deref(), Some("https://legacy.example"));
        assert_eq!(config.legacy.timeout_ms, 10_000);
        assert_eq!(config.cache.quota_bytes, 1_048_576);
        assert_eq!(config.blob.public_base_url.as_deref(), Some("https://cdn.example"));
    }

    #[test]
    fn test_rejects_quality_out_of_range() {
        let file = write_config(
            r#"
            [images.blob_preset]
            max_dimension = 1200
            quality = 1.5
            "#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("quality"));
    }

    #[test]
    fn test_rejects_zero_values() {
        let mut config = Config::default();
        config.resolve.timeout_ms = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.images.inline_preset.max_dimension = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_remote_storage_requires_blob_url() {
        let mut config = Config::default();
        config.images.storage = StorageMode::Remote;
        assert!(validate_config(&config).is_err());

        config.blob.base_url = Some("https://blob.example".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let result = load_config_or_default(Some(Path::new("/nonexistent/reportforge.toml")));
        assert!(result.is_err());
    }
}
