use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "bytedance/seedance-1-pro";
pub const DEFAULT_REPLICATE_BASE_URL: &str = "https://api.replicate.com/v1";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Replicate API token. `None` keeps the server up but fails every generation.
    pub api_key: Option<String>,
    pub model: String,
    pub replicate_base_url: String,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub download_timeout: u64,
    /// No bound on the provider call when unset.
    pub inference_timeout: Option<u64>,
    pub inference_workers: usize,
    pub max_download_mb: u64,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            replicate_base_url: DEFAULT_REPLICATE_BASE_URL.to_string(),
            upload_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("static"),
            download_timeout: 60,
            inference_timeout: None,
            inference_workers: 4,
            max_download_mb: 500,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// The configured credential, treating a blank value as absent.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout)
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout.map(Duration::from_secs)
    }

    pub fn max_download_bytes(&self) -> u64 {
        self.max_download_mb.saturating_mul(1024 * 1024)
    }
}

/// Shortens a secret for logging: first 10 and last 4 characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 14 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
