//! Load — config loading from file and environment variables.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::model::{default_workers, AnalysisConfig};

pub const DEFAULT_CONFIG_FILE: &str = "/etc/ramut/ramut.toml";

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl AnalysisConfig {
    /// Load configuration from file or environment variables
    /// Priority: Environment Variables > Config File > Defaults
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = std::env::var("RAMUT_CONFIG_FILE")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&config_path).exists() {
            tracing::info!("Loading configuration from: {}", config_path);
            Self::from_file(&config_path)?
        } else {
            tracing::info!("Config file not found at {}, using environment variables", config_path);
            Self::from_env()
        };

        config.apply_env();
        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: AnalysisConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let defaults = AnalysisConfig::default();
        Self {
            root: std::env::var("RAMUT_ROOT").ok(),
            ref_cov: env_parse("RAMUT_REF_COV").unwrap_or(defaults.ref_cov),
            ref_diff: env_parse("RAMUT_REF_DIFF").unwrap_or(defaults.ref_diff),
            parse_date: env_parse("RAMUT_PARSE_DATE").unwrap_or(defaults.parse_date),
            reference_year: env_parse("RAMUT_REFERENCE_YEAR"),
            max_workers: env_parse("RAMUT_MAX_WORKERS").unwrap_or_else(default_workers),
            ..defaults
        }
    }

    /// Environment variables override file values.
    fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("RAMUT_ROOT") {
            self.root = Some(root);
        }
        if let Some(v) = env_parse("RAMUT_REF_COV") {
            self.ref_cov = v;
        }
        if let Some(v) = env_parse("RAMUT_REF_DIFF") {
            self.ref_diff = v;
        }
        if let Some(v) = env_parse("RAMUT_PARSE_DATE") {
            self.parse_date = v;
        }
        if let Some(v) = env_parse("RAMUT_REFERENCE_YEAR") {
            self.reference_year = Some(v);
        }
        if let Some(v) = env_parse("RAMUT_MAX_WORKERS") {
            self.max_workers = v;
        }
    }

    /// Validate that configuration values are sane
    pub fn validate(&self) -> Result<(), String> {
        self.thresholds().validate()?;
        if self.max_workers == 0 {
            return Err("max_workers must be > 0".to_string());
        }
        match self.reference_year {
            Some(year) if !(1..=9999).contains(&year) => {
                return Err(format!("reference_year out of range: {}", year));
            }
            None if self.parse_date => {
                return Err("parse_date requires reference_year".to_string());
            }
            _ => {}
        }
        if let Some(root) = &self.root {
            if root.is_empty() {
                return Err("root must not be empty when set".to_string());
            }
        }
        self.kill.validate()?;
        self.files.validate()?;
        Ok(())
    }
}
