use crate::proximity::DEFAULT_BUFFER_KM;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub glaciers: GlacierConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub stations_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    // Empty list disables the country check
    #[serde(default)]
    pub allowed_countries: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GlacierConfig {
    pub path: PathBuf,
    #[serde(default = "default_name_field")]
    pub name_field: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_buffer_km")]
    pub buffer_km: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            buffer_km: default_buffer_km(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_name_field() -> String {
    "glac_name".to_string()
}

fn default_buffer_km() -> f64 {
    DEFAULT_BUFFER_KM
}

fn default_port() -> u16 {
    8080
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Applies command-line overrides on top of the file values and re-validates.
    pub fn with_overrides(mut self, stations_url: Option<String>, buffer_km: Option<f64>) -> Result<Self> {
        if let Some(url) = stations_url {
            self.source.stations_url = url;
        }
        if let Some(km) = buffer_km {
            self.filter.buffer_km = km;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.stations_url.trim().is_empty() {
            return Err(anyhow!("source.stations_url must not be empty"));
        }
        if !self.filter.buffer_km.is_finite() || self.filter.buffer_km < 0.0 {
            return Err(anyhow!(
                "filter.buffer_km must be a non-negative number, got {}",
                self.filter.buffer_km
            ));
        }
        Ok(())
    }
}
