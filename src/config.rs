use crate::error::{ConcatError, Result};
use crate::params::VideoInfo;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for chapter-concat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// External program locations
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Title and file name generators
    #[serde(default)]
    pub plugins: PluginConfig,

    /// Persisted user preferences, read-only during a run
    #[serde(default)]
    pub preferences: PreferencesConfig,

    /// Logging and output behaviour
    #[serde(default)]
    pub output: OutputConfig,

    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    pub ffprobe: String,
    pub ffmpeg: String,
    /// Interpreter used to run plugins
    pub python: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffprobe: "ffprobe".to_string(),
            ffmpeg: "ffmpeg".to_string(),
            python: if cfg!(windows) { "py" } else { "python" }.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Called as `<python> <plugin> <file name> <duration seconds>`
    pub chapter_title: Option<PathBuf>,

    /// Called as `<python> <plugin> <file name>`
    pub savefile_name: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesConfig {
    /// Output policy offered at the parameter confirmation step
    #[serde(default)]
    pub default_video_info: VideoInfo,

    /// `<dir>/<prefix>XXXXXX` template for the run's temporary directory
    pub temporary_directory_template: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub log_level: String,

    /// Replace an existing output file without asking
    pub overwrite_existing: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            overwrite_existing: false,
        }
    }
}

impl Config {
    /// Load configuration from the first readable config file, else the environment.
    ///
    /// A config file that exists but does not parse is an error.
    pub fn load() -> Result<Self> {
        let mut config_paths = vec![
            PathBuf::from("chapter-concat.toml"),
            PathBuf::from("config/chapter-concat.toml"),
        ];
        if let Some(home) = std::env::var_os("HOME") {
            config_paths.push(PathBuf::from(home).join(".config/chapter-concat/config.toml"));
        }

        for path in &config_paths {
            if path.is_file() {
                return Self::load_from(path);
            }
        }

        Ok(Self::from_env())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path).map_err(|e| ConcatError::filesystem(path, e))?;
        let mut config: Config =
            toml::from_str(&config_str).map_err(|e| ConcatError::Config(format!("{}: {}", path.display(), e)))?;
        config.source = Some(path.to_path_buf());
        Ok(config.with_env_overrides())
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(ffmpeg) = std::env::var("CHAPTER_CONCAT_FFMPEG") {
            self.tools.ffmpeg = ffmpeg;
        }
        if let Ok(ffprobe) = std::env::var("CHAPTER_CONCAT_FFPROBE") {
            self.tools.ffprobe = ffprobe;
        }
        if let Ok(python) = std::env::var("CHAPTER_CONCAT_PYTHON") {
            self.tools.python = python;
        }
        if let Ok(template) = std::env::var("CHAPTER_CONCAT_TMP_TEMPLATE") {
            self.preferences.temporary_directory_template = Some(PathBuf::from(template));
        }
        if let Ok(log_level) = std::env::var("CHAPTER_CONCAT_LOG_LEVEL") {
            self.output.log_level = log_level;
        }
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (name, program) in [
            ("ffprobe", &self.tools.ffprobe),
            ("ffmpeg", &self.tools.ffmpeg),
            ("python", &self.tools.python),
        ] {
            if program.trim().is_empty() {
                return Err(ConcatError::Config(format!("tools.{name} must not be empty")));
            }
        }

        for plugin in [&self.plugins.chapter_title, &self.plugins.savefile_name]
            .into_iter()
            .flatten()
        {
            if !plugin.is_file() {
                return Err(ConcatError::Config(format!("plugin not found: {}", plugin.display())));
            }
        }

        let video = &self.preferences.default_video_info;
        for (name, usable) in [
            ("resolution", video.resolution.is_output_policy()),
            ("framerate", video.framerate.is_output_policy()),
            ("audio_codec", video.audio_codec.is_output_policy()),
            ("video_codec", video.video_codec.is_output_policy()),
        ] {
            if !usable {
                return Err(ConcatError::UnresolvedParameter(name));
            }
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        let video = &self.preferences.default_video_info;
        format!(
            "Chapter Concat Configuration:\n\
            - ffprobe: {}\n\
            - ffmpeg: {}\n\
            - Chapter title plugin: {}\n\
            - Savefile name plugin: {}\n\
            - Output resolution: {}\n\
            - Output framerate: {}\n\
            - Output video codec: {}\n\
            - Output audio codec: {}",
            self.tools.ffprobe,
            self.tools.ffmpeg,
            display_plugin(&self.plugins.chapter_title),
            display_plugin(&self.plugins.savefile_name),
            video.resolution,
            video.framerate,
            video.video_codec,
            video.audio_codec,
        )
    }
}

fn display_plugin(plugin: &Option<PathBuf>) -> String {
    plugin
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_ffmpeg(mut self, program: impl Into<String>) -> Self {
        self.config.tools.ffmpeg = program.into();
        self
    }

    pub fn with_ffprobe(mut self, program: impl Into<String>) -> Self {
        self.config.tools.ffprobe = program.into();
        self
    }

    pub fn with_chapter_title_plugin(mut self, plugin: PathBuf) -> Self {
        self.config.plugins.chapter_title = Some(plugin);
        self
    }

    pub fn with_savefile_name_plugin(mut self, plugin: PathBuf) -> Self {
        self.config.plugins.savefile_name = Some(plugin);
        self
    }

    pub fn with_default_video_info(mut self, info: VideoInfo) -> Self {
        self.config.preferences.default_video_info = info;
        self
    }

    pub fn with_temporary_directory_template(mut self, template: PathBuf) -> Self {
        self.config.preferences.temporary_directory_template = Some(template);
        self
    }

    pub fn overwrite_existing(mut self, overwrite: bool) -> Self {
        self.config.output.overwrite_existing = overwrite;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
