use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{GrabError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// YouTube Data API settings
    pub api: ApiConfig,

    /// External executables
    pub tools: ToolsConfig,

    /// Where and how results are written
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API key; prompted for at startup when empty
    pub key: String,

    /// Base URL of the Data API
    pub base_url: String,

    /// Search page size
    pub max_results: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Download executable (yt-dlp compatible)
    pub downloader: String,

    /// Transcode executable (ffmpeg compatible)
    pub transcoder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination directory, current directory when unset
    pub directory: Option<PathBuf>,

    /// mp3 bitrate used when the source bitrate is unknown
    pub default_bitrate_kbps: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            max_results: 10,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            downloader: "yt-dlp".to_string(),
            transcoder: "ffmpeg".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            default_bitrate_kbps: 192,
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs_err::read_to_string(&config_path)
                .map_err(|e| GrabError::Config(format!("failed to read config file: {}", e)))?;
            Self::from_yaml(&content)
        } else {
            let config = Self::default();
            if let Err(e) = config.save().await {
                tracing::warn!("Could not write default config: {}", e);
            }
            Ok(config)
        }
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| GrabError::Config(format!("failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)
                .map_err(|e| GrabError::Config(format!("failed to create config directory: {}", e)))?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| GrabError::Config(format!("failed to serialize config: {}", e)))?;

        fs_err::write(config_path, content)
            .map_err(|e| GrabError::Config(format!("failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| GrabError::Config("could not determine config directory".to_string()))?;

        Ok(config_dir.join("audiograb").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if !(1..=50).contains(&self.api.max_results) {
            return Err(GrabError::Config(format!(
                "api.max_results must be between 1 and 50, got {}",
                self.api.max_results
            )));
        }

        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(GrabError::Config(format!(
                "api.base_url is not a valid URL: {}",
                self.api.base_url
            )));
        }

        if self.tools.downloader.trim().is_empty() || self.tools.transcoder.trim().is_empty() {
            return Err(GrabError::Config("tools.downloader and tools.transcoder must be set".to_string()));
        }

        if self.output.default_bitrate_kbps == 0 {
            return Err(GrabError::Config("output.default_bitrate_kbps must be positive".to_string()));
        }

        Ok(())
    }

    /// Configured API key, if any
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api.key.trim();
        (!key.is_empty()).then_some(key)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output.directory.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Display current configuration
    pub fn display(&self) {
        let key = match self.api_key() {
            Some(key) => mask_secret(key),
            None => "(not set, prompted at startup)".to_string(),
        };
        println!("Current Configuration:");
        println!("  API Key: {}", key);
        println!("  API Base URL: {}", self.api.base_url);
        println!("  Max Results: {}", self.api.max_results);
        println!("  Downloader: {}", self.tools.downloader);
        println!("  Transcoder: {}", self.tools.transcoder);
        println!("  Output Directory: {}", self.output_dir().display());
        println!("  Default Bitrate: {}k", self.output.default_bitrate_kbps);
    }
}

/// Keep the last four characters of a secret visible
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let visible: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), visible)
}
