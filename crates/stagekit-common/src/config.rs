//! Runner configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

use crate::logging::{LogConfig, LogFormat};
use crate::{Result, StageKitError};

/// Stage runner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageKitConfig {
    /// Drawing surface size
    pub canvas: CanvasConfig,

    /// Delay between redraws in milliseconds
    pub frame_interval_ms: u64,

    /// Stop after this many frames (None = run until stopped)
    pub max_frames: Option<u64>,

    /// Image used by textured stages
    pub texture_path: Option<PathBuf>,

    /// Logging settings
    pub log: LogSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// trace, debug, info, warn or error
    pub level: String,

    /// pretty, compact or json
    pub format: String,

    /// Optional EnvFilter directive string
    pub filter: Option<String>,
}

impl Default for StageKitConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            // setInterval without a delay fires as fast as the host allows
            frame_interval_ms: 16,
            max_frames: None,
            texture_path: None,
            log: LogSettings::default(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            filter: None,
        }
    }
}

impl StageKitConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            StageKitError::config_with_source(format!("cannot read {}", path.display()), e)
        })?;
        Self::from_json(&text)
    }

    /// Reject values no stage can run with.
    pub fn validate(&self) -> Result<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(StageKitError::config(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if self.frame_interval_ms == 0 {
            return Err(StageKitError::config("frame_interval_ms must be at least 1"));
        }
        self.log.to_log_config()?;
        Ok(())
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Width over height of the canvas.
    pub fn aspect(&self) -> f64 {
        self.canvas.width as f64 / self.canvas.height as f64
    }
}

impl LogSettings {
    /// Convert into the logging setup understood by [`crate::init_logging`].
    pub fn to_log_config(&self) -> Result<LogConfig> {
        let level: Level = self.level.parse().map_err(|_| {
            StageKitError::config(format!("unknown log level '{}'", self.level))
        })?;
        let format: LogFormat = self.format.parse()?;
        Ok(LogConfig {
            level,
            format,
            filter: self.filter.clone(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StageKitConfig::default();
        assert_eq!(config.canvas.width, 640);
        assert_eq!(config.canvas.height, 480);
        assert_eq!(config.frame_interval(), Duration::from_millis(16));
        assert!(config.max_frames.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            StageKitConfig::from_json(r#"{ "canvas": { "width": 800 }, "max_frames": 3 }"#)
                .unwrap();
        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.canvas.height, 480);
        assert_eq!(config.max_frames, Some(3));
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_rejects_empty_canvas() {
        let err = StageKitConfig::from_json(r#"{ "canvas": { "width": 0, "height": 10 } }"#)
            .unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_rejects_zero_interval() {
        assert!(StageKitConfig::from_json(r#"{ "frame_interval_ms": 0 }"#).is_err());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let err = StageKitConfig::from_json(r#"{ "log": { "level": "loud" } }"#).unwrap_err();
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_malformed_json() {
        let err = StageKitConfig::from_json("{ canvas: ").unwrap_err();
        assert_eq!(err.category(), "json");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "frame_interval_ms": 33, "log": {{ "format": "json" }} }}"#
        )
        .unwrap();

        let config = StageKitConfig::load(file.path()).unwrap();
        assert_eq!(config.frame_interval_ms, 33);
        assert_eq!(config.log.to_log_config().unwrap().format, LogFormat::Json);
    }

    #[test]
    fn test_load_missing_file() {
        let err = StageKitConfig::load("/definitely/not/here.json").unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_aspect() {
        let config = StageKitConfig::default();
        assert!((config.aspect() - 640.0 / 480.0).abs() < 1e-12);
    }
}
