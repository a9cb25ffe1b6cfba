/// Importer configuration
use crate::error::{CliError, Result};
use dpcm_audio::{ConversionRequest, Quality, Region, ResamplerBackend, MAX_GAIN_DB};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `DPCM_IMPORT__QUALITY=12`
pub const ENV_PREFIX: &str = "DPCM_IMPORT";

/// Configuration file picked up from the working directory when no
/// `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "dpcm-import.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImportConfig {
    /// Quality index, 0 (4.2 kHz) to 15 (33.1 kHz)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Gain in dB, within +/-12
    #[serde(default)]
    pub gain_db: f32,

    #[serde(default)]
    pub region: Region,

    #[serde(default)]
    pub backend: ResamplerBackend,
}

impl ImportConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `dpcm-import.toml` in the
    /// working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true);
        Self::load_with(path, environment)
    }

    /// Load with a caller-supplied environment source
    pub fn load_with(path: Option<&Path>, environment: config::Environment) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(environment);

        let config = settings.build()?;
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        Quality::new(self.quality).map_err(|e| CliError::Config(e.to_string()))?;

        if !self.gain_db.is_finite() || self.gain_db.abs() > MAX_GAIN_DB {
            return Err(CliError::Config(format!(
                "gain_db must be within +/-{} dB, got {}",
                MAX_GAIN_DB, self.gain_db
            )));
        }

        Ok(())
    }

    /// Build the conversion request these settings describe
    pub fn request(&self) -> Result<ConversionRequest> {
        let quality = Quality::new(self.quality)?;
        Ok(ConversionRequest::new(quality, self.gain_db)?
            .with_region(self.region)
            .with_backend(self.backend))
    }
}

fn default_quality() -> u8 {
    Quality::MAX.index()
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            gain_db: 0.0,
            region: Region::default(),
            backend: ResamplerBackend::default(),
        }
    }
}
