use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};
use reqwest::Url;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/query";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self { endpoint: None }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("Could not parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)
            .with_context(|| format!("Could not write config file {}", path.display()))?;
        Ok(())
    }

    /// Validate and persist `endpoint`, keeping the rest of the file.
    pub fn save_endpoint(endpoint: &str) -> Result<PathBuf> {
        let config_path = Self::get_config_path()?;
        Self::save_endpoint_to(&config_path, endpoint)?;
        Ok(config_path)
    }

    /// An unreadable existing file is an error rather than being replaced.
    pub fn save_endpoint_to(path: &Path, endpoint: &str) -> Result<()> {
        let url = parse_endpoint(endpoint)?;
        let mut config = Self::load_from(path)?;
        config.endpoint = Some(url.to_string());
        config.save_to(path)
    }

    /// The command line (or `NOVA_ENDPOINT`) wins over the file, which wins
    /// over the built-in default.
    pub fn resolve_endpoint(&self, cli_endpoint: Option<&str>) -> Result<Url> {
        let raw = cli_endpoint
            .or(self.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT);
        parse_endpoint(raw)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("nova").join("config.json"))
    }
}

pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .with_context(|| format!("Invalid answer service endpoint: {raw}"))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(anyhow!(
            "Unsupported endpoint scheme '{other}' (expected http or https)"
        )),
    }
}

/// Where the interactive mode writes its log, since the terminal is taken.
pub fn log_path() -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;

    Ok(cache_dir.join("nova").join("nova.log"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            endpoint: Some("http://10.0.0.5:8080/query".to_string()),
        };

        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_tolerates_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();

        assert_eq!(Config::load_from(&path).unwrap().endpoint, None);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "endpoint = nope").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_save_endpoint_updates_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        Config::save_endpoint_to(&path, "http://10.0.0.5:8080/query").unwrap();
        assert_eq!(
            Config::load_from(&path).unwrap().endpoint.as_deref(),
            Some("http://10.0.0.5:8080/query")
        );

        Config::save_endpoint_to(&path, "https://nova.example.com/query").unwrap();
        assert_eq!(
            Config::load_from(&path).unwrap().endpoint.as_deref(),
            Some("https://nova.example.com/query")
        );
    }

    #[test]
    fn test_save_endpoint_keeps_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(Config::save_endpoint_to(&path, "http://10.0.0.5:8080/query").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_save_endpoint_rejects_invalid_url() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        assert!(Config::save_endpoint_to(&path, "ftp://example.com").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_endpoint_precedence() {
        let empty = Config::new();
        assert_eq!(
            empty.resolve_endpoint(None).unwrap().as_str(),
            DEFAULT_ENDPOINT
        );

        let from_file = Config {
            endpoint: Some("https://nova.example.com/query".to_string()),
        };
        assert_eq!(
            from_file.resolve_endpoint(None).unwrap().as_str(),
            "https://nova.example.com/query"
        );
        assert_eq!(
            from_file
                .resolve_endpoint(Some("http://localhost:9000/ask"))
                .unwrap()
                .as_str(),
            "http://localhost:9000/ask"
        );
    }

    #[test]
    fn test_parse_endpoint_rejects_bad_urls() {
        assert!(parse_endpoint("not a url").is_err());
        assert!(parse_endpoint("ftp://example.com/query").is_err());
        assert!(parse_endpoint(" http://127.0.0.1:5000/query ").is_ok());
    }
}
