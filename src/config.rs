use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "shelfmark")]
#[command(about = "Runs the shelfmark lending desk service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    /// Overrides `app.port` from the config file.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shelfmark")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_session_idle")]
    pub scan_session_idle_seconds: u64,
    #[serde(default = "default_scan_debounce")]
    pub scan_debounce_millis: u64,
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout() -> u64 {
    10
}

fn default_session_idle() -> u64 {
    1800
}

fn default_scan_debounce() -> u64 {
    1500
}

impl Default for App {
    fn default() -> Self {
        App {
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            scan_session_idle_seconds: default_session_idle(),
            scan_debounce_millis: default_scan_debounce(),
        }
    }
}

impl App {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.scan_session_idle_seconds)
    }

    pub fn scan_debounce(&self) -> Duration {
        Duration::from_millis(self.scan_debounce_millis)
    }
}

/// The spreadsheet-backed lending service.
#[derive(Debug, Deserialize, Clone)]
pub struct Library {
    pub api_url: String,
    #[serde(default = "default_library_name")]
    pub name: String,
}

fn default_library_name() -> String {
    "the library".to_string()
}

/// Public book metadata providers. Overridable so tests and mirrors can point elsewhere.
#[derive(Debug, Deserialize, Clone)]
pub struct Providers {
    #[serde(default = "default_google_books")]
    pub google_books_url: String,
    #[serde(default = "default_open_library")]
    pub open_library_url: String,
    #[serde(default = "default_covers")]
    pub covers_url: String,
}

fn default_google_books() -> String {
    "https://www.googleapis.com/books/v1".to_string()
}

fn default_open_library() -> String {
    "https://openlibrary.org".to_string()
}

fn default_covers() -> String {
    "https://covers.openlibrary.org".to_string()
}

impl Default for Providers {
    fn default() -> Self {
        Providers {
            google_books_url: default_google_books(),
            open_library_url: default_open_library(),
            covers_url: default_covers(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    pub library: Library,
    #[serde(default)]
    pub providers: Providers,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str =
            fs::read_to_string(path).with_context(|| format!("reading config file {}", path))?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Config> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        if config.library.api_url.trim().is_empty() {
            anyhow::bail!("library.api_url must not be empty");
        }
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find("}") {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(var = var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let cfg = Config::from_yaml("library:\n  api_url: https://example.test/exec\n").unwrap();
        assert_eq!(cfg.app.get_port(), 8080);
        assert_eq!(cfg.app.request_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.library.name, "the library");
        assert_eq!(cfg.providers.google_books_url, "https://www.googleapis.com/books/v1");
        assert_eq!(cfg.providers.covers_url, "https://covers.openlibrary.org");
    }

    #[test]
    fn test_env_default_substitution() {
        let yaml = "library:\n  api_url: ${SHELFMARK_TEST_UNSET_URL:-https://fallback.test/exec}\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.library.api_url, "https://fallback.test/exec");
    }

    #[test]
    fn test_empty_api_url_is_rejected() {
        let yaml = "library:\n  api_url: \"\"\n";
        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_missing_library_section_is_rejected() {
        assert!(Config::from_yaml("app:\n  port: 9000\n").is_err());
    }
}
