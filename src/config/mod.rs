//! Configuration management.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between media directory polls.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Default number of steps the simulated renderer reports.
const DEFAULT_SIMULATED_STEPS: u32 = 20;

/// Default pause between simulated renderer steps.
const DEFAULT_SIMULATED_STEP_DELAY_MS: u64 = 50;

/// Main configuration for daybook.
#[derive(Debug, Clone)]
pub struct DaybookConfig {
    /// Directory holding the journal snapshot.
    pub data_dir: PathBuf,
    /// Directory of externally managed video files.
    pub media_dir: PathBuf,
    /// Interval between media directory polls.
    pub poll_interval: Duration,
    /// Renderer configuration.
    pub renderer: RendererConfig,
}

/// Recap renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// External renderer command, invoked with ffmpeg-style arguments.
    pub command: String,
    /// Use the simulated renderer instead of spawning the command.
    pub simulated: bool,
    /// Number of progress steps the simulated renderer reports.
    pub simulated_steps: u32,
    /// Pause between simulated renderer steps.
    pub simulated_step_delay: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: "ffmpeg".to_string(),
            simulated: false,
            simulated_steps: DEFAULT_SIMULATED_STEPS,
            simulated_step_delay: Duration::from_millis(DEFAULT_SIMULATED_STEP_DELAY_MS),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Media directory.
    pub media_dir: Option<String>,
    /// Poll interval in seconds.
    pub poll_interval_secs: Option<u64>,
    /// Renderer section.
    pub renderer: Option<ConfigFileRenderer>,
}

/// Renderer section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileRenderer {
    /// Renderer command.
    pub command: Option<String>,
    /// Use the simulated renderer.
    pub simulated: Option<bool>,
    /// Simulated renderer step count.
    pub simulated_steps: Option<u32>,
    /// Simulated renderer step delay in milliseconds.
    pub simulated_step_delay_ms: Option<u64>,
}

impl Default for DaybookConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from(".daybook");
        Self {
            media_dir: data_dir.join("videos"),
            data_dir,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            renderer: RendererConfig::default(),
        }
    }
}

impl DaybookConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: e.to_string(),
            })?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. `DAYBOOK_CONFIG_PATH` environment variable
    /// 2. Platform-specific config dir (`~/Library/Application Support/daybook/` on macOS)
    /// 3. XDG config dir (`~/.config/daybook/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        if let Ok(path) = std::env::var("DAYBOOK_CONFIG_PATH") {
            if let Ok(config) = Self::load_from_file(std::path::Path::new(&path)) {
                return config;
            }
        }

        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("daybook").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("daybook")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `DaybookConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(&data_dir);
            // Media defaults under the data dir unless set explicitly.
            config.media_dir = config.data_dir.join("videos");
        }
        if let Some(media_dir) = file.media_dir {
            config.media_dir = PathBuf::from(media_dir);
        }
        if let Some(secs) = file.poll_interval_secs {
            config.poll_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(renderer) = file.renderer {
            if let Some(command) = renderer.command {
                config.renderer.command = command;
            }
            if let Some(simulated) = renderer.simulated {
                config.renderer.simulated = simulated;
            }
            if let Some(steps) = renderer.simulated_steps {
                config.renderer.simulated_steps = steps;
            }
            if let Some(ms) = renderer.simulated_step_delay_ms {
                config.renderer.simulated_step_delay = Duration::from_millis(ms);
            }
        }

        config
    }

    /// Path of the journal snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("journal.json")
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Sets the media directory.
    #[must_use]
    pub fn with_media_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.media_dir = path.into();
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Switches to the simulated renderer.
    #[must_use]
    pub const fn with_simulated_renderer(mut self) -> Self {
        self.renderer.simulated = true;
        self
    }
}
