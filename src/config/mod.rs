mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Largest page the catalog's paginated endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 50;

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

    // Try default locations
    let default_paths = [
        "./newreleases.toml",
        "~/.config/newreleases/config.toml",
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

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.catalog.base_url.trim().is_empty() {
        anyhow::bail!("Catalog base_url cannot be empty");
    }
    if config.catalog.requests_per_second == 0 {
        anyhow::bail!("Catalog requests_per_second must be at least 1");
    }

    if config.scan.window_days == 0 {
        anyhow::bail!("Scan window_days must be at least 1");
    }
    if config.scan.page_size == 0 || config.scan.page_size > MAX_PAGE_SIZE {
        anyhow::bail!(
            "Scan page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE,
            config.scan.page_size
        );
    }
    if config.scan.max_pages == 0 {
        anyhow::bail!("Scan max_pages must be at least 1");
    }

    if config.scheduler.batch_size == 0 {
        anyhow::bail!("Scheduler batch_size must be at least 1");
    }
    if config.scheduler.concurrency == 0 {
        anyhow::bail!("Scheduler concurrency must be at least 1");
    }

    let sources = &config.sources;
    if !(sources.followed || sources.liked_tracks || sources.saved_albums) {
        anyhow::bail!("At least one artist source must be enabled");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        validate_config(&config).unwrap();
        assert_eq!(config.scan.window_days, 10);
        assert!(!config.scan.use_optimized_search);
        assert_eq!(config.scheduler.batch_size, 10);
        assert_eq!(config.scheduler.concurrency, 1);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[scan]\nwindow_days = 14\nuse_optimized_search = true\n\n[sources]\nsaved_albums = false"
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.scan.window_days, 14);
        assert!(config.scan.use_optimized_search);
        assert_eq!(config.scan.page_size, 20);
        assert!(config.sources.followed);
        assert!(!config.sources.saved_albums);
        assert_eq!(config.catalog.base_url, "https://api.spotify.com/v1");
    }

    #[test]
    fn rejects_invalid_values() {
        let mut config = Config::default();
        config.scan.page_size = 51;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.scheduler.concurrency = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.sources.followed = false;
        config.sources.liked_tracks = false;
        config.sources.saved_albums = false;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config(Path::new("/nonexistent/newreleases.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn explicit_token_wins() {
        let config = CatalogConfig {
            access_token: Some("from-file".into()),
            ..CatalogConfig::default()
        };
        assert_eq!(config.resolve_access_token().as_deref(), Some("from-file"));
    }
}
