use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorCode;
use crate::platform::ContextAttributes;

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "ember.toml";

/// Defaults for windows created by the window manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    pub title: String,
    pub class_name: String,
}

impl WindowConfig {
    pub const DEFAULT_WIDTH: u32 = 800;
    pub const DEFAULT_HEIGHT: u32 = 600;
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
            title: "Ember".to_string(),
            class_name: "ember".to_string(),
        }
    }
}

/// Version, profile and vsync of persistent graphics contexts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub major_version: u32,
    pub minor_version: u32,
    pub core_profile: bool,
    pub debug: bool,
    /// Frames to wait per buffer swap; 0 disables vsync
    pub swap_interval: i32,
}

impl ContextConfig {
    /// Profiles exist from OpenGL 3.2 on
    pub const MIN_PROFILE_VERSION: (u32, u32) = (3, 2);

    pub fn attributes(&self) -> ContextAttributes {
        ContextAttributes {
            major_version: self.major_version,
            minor_version: self.minor_version,
            core_profile: self.core_profile,
            debug: self.debug,
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            major_version: 3,
            minor_version: 3,
            core_profile: true,
            debug: cfg!(debug_assertions),
            swap_interval: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub window: WindowConfig,
    pub context: ContextConfig,
}

impl PlatformConfig {
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml(&contents)?;
        log::info!("[config] Loaded {}", path.display());
        Ok(config)
    }

    /// Loads `path`, else [`DEFAULT_CONFIG_FILE`] when it exists, else the defaults
    pub fn load_or_default(path: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::load(&path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            Self::load(fallback)
        } else {
            log::debug!("[config] No {DEFAULT_CONFIG_FILE}, using defaults");
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let WindowConfig {
            width,
            height,
            class_name,
            ..
        } = &self.window;

        // The OS takes window extents as signed 32-bit values
        let limit = i32::MAX as u32;
        if *width == 0 || *height == 0 || *width > limit || *height > limit {
            return Err(ConfigError::InvalidWindowSize {
                width: *width,
                height: *height,
            });
        }

        if class_name.trim().is_empty() {
            return Err(ConfigError::EmptyClassName);
        }

        let context = &self.context;
        let version = (context.major_version, context.minor_version);
        if context.core_profile && version < ContextConfig::MIN_PROFILE_VERSION {
            return Err(ConfigError::UnsupportedProfile {
                major: context.major_version,
                minor: context.minor_version,
            });
        }

        if context.swap_interval < 0 {
            return Err(ConfigError::InvalidSwapInterval(context.swap_interval));
        }

        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file")]
    Parse(#[from] toml::de::Error),

    #[error("Window size {width}x{height} must be non-zero and fit in an i32")]
    InvalidWindowSize { width: u32, height: u32 },

    #[error("Window class name must not be empty")]
    EmptyClassName,

    #[error("OpenGL {major}.{minor} has no core profile")]
    UnsupportedProfile { major: u32, minor: u32 },

    #[error("Swap interval {0} must not be negative")]
    InvalidSwapInterval(i32),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> u32 {
        match self {
            ConfigError::Io { .. } => 0x000800,
            ConfigError::Parse(_) => 0x000801,
            ConfigError::InvalidWindowSize { .. } => 0x000802,
            ConfigError::EmptyClassName => 0x000803,
            ConfigError::UnsupportedProfile { .. } => 0x000804,
            ConfigError::InvalidSwapInterval(_) => 0x000805,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = PlatformConfig::from_toml("").unwrap();

        assert_eq!(config, PlatformConfig::default());
        assert_eq!((config.window.width, config.window.height), (800, 600));
        assert_eq!(config.window.class_name, "ember");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = PlatformConfig::from_toml(
            r#"
            [window]
            title = "Demo"
            width = 1024

            [context]
            swap_interval = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.window.title, "Demo");
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.context.swap_interval, 0);
        assert_eq!(config.context.major_version, 3);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let error = PlatformConfig::from_toml("[window]\nwidth = \"wide\"").unwrap_err();

        assert!(matches!(error, ConfigError::Parse(_)));
        assert_eq!(error.code(), 0x000801);
    }

    #[test]
    fn zero_window_size_is_rejected() {
        let mut config = PlatformConfig::default();
        config.window.height = 0;

        let error = config.validate().unwrap_err();
        assert!(matches!(
            error,
            ConfigError::InvalidWindowSize { width: 800, height: 0 }
        ));
    }

    #[test]
    fn window_size_beyond_i32_is_rejected() {
        let mut config = PlatformConfig::default();
        config.window.width = u32::MAX;

        let error = config.validate().unwrap_err();
        assert_eq!(error.code(), 0x000802);

        config.window.width = i32::MAX as u32;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn core_profile_needs_3_2() {
        let mut config = PlatformConfig::default();
        config.context.major_version = 3;
        config.context.minor_version = 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnsupportedProfile { major: 3, minor: 1 })
        ));

        config.context.core_profile = false;
        assert!(config.validate().is_ok());

        config.context.core_profile = true;
        config.context.minor_version = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn attributes_mirror_context_settings() {
        let context = ContextConfig {
            major_version: 4,
            minor_version: 6,
            core_profile: false,
            debug: true,
            swap_interval: 2,
        };

        assert_eq!(
            context.attributes(),
            ContextAttributes {
                major_version: 4,
                minor_version: 6,
                core_profile: false,
                debug: true,
            }
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let path = PathBuf::from("definitely/not/here/ember.toml");

        let error = PlatformConfig::load_or_default(Some(path)).unwrap_err();

        assert!(matches!(error, ConfigError::Io { .. }));
        assert_eq!(error.code(), 0x000800);
    }

    #[test]
    fn load_reads_a_file_from_disk() {
        let path = std::env::temp_dir().join(format!("ember-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[window]\nclass_name = \"from-disk\"\n").unwrap();

        let config = PlatformConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.unwrap().window.class_name, "from-disk");
    }
}
