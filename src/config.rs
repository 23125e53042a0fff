use clap::{ArgAction, Parser};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{AimError, Result};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llava";
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
pub const DEFAULT_TONE: &str = "witty, curious";
pub const DEFAULT_KEYWORD_COUNT: u32 = 5;
pub const DEFAULT_SETTINGS_FILE: &str = "aim_config.json";

/// Caption images with a local vision model and embed the result with exiftool.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Image file, or directory of images, to tag in place
    pub input_path: PathBuf,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Base URL of the Ollama server
    #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_OLLAMA_HOST)]
    pub ollama_host: String,

    /// Vision model name [default: llava]
    #[arg(short, long)]
    pub model: Option<String>,

    /// Sampling temperature, 0.0 - 2.0 [default: 0.5]
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Comma separated tone of the generated text [default: "witty, curious"]
    #[arg(long)]
    pub tone: Option<String>,

    /// Number of keywords to ask for [default: 5]
    #[arg(short, long)]
    pub keyword_count: Option<u32>,

    /// JSON file with `model`, `temperature`, `tone` and `keyword_count`
    /// [default: ./aim_config.json when present]
    #[arg(short, long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// exiftool executable
    #[arg(long, env = "EXIFTOOL_PATH", default_value = "exiftool")]
    pub exiftool: PathBuf,

    /// Per-request timeout for the inference service
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Let exiftool keep its `_original` backup next to each file
    #[arg(long)]
    pub keep_backup: bool,

    /// Print the existing metadata of each image instead of tagging it
    #[arg(long)]
    pub inspect: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Config {
    /// Defaults for everything except the input path, as if only the path had been given.
    pub fn for_input(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            recursive: false,
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            model: None,
            temperature: None,
            tone: None,
            keyword_count: None,
            settings: None,
            exiftool: PathBuf::from("exiftool"),
            timeout_secs: 120,
            keep_backup: false,
            inspect: false,
            verbose: 0,
        }
    }

    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve model settings: command line over settings file over defaults.
    pub fn model_settings(&self) -> Result<ModelSettings> {
        let working_dir = std::env::current_dir().unwrap_or_default();
        self.model_settings_in(&working_dir)
    }

    /// Like [`Config::model_settings`], looking for the default settings file in
    /// `working_dir` when `--settings` is not given.
    pub fn model_settings_in(&self, working_dir: &Path) -> Result<ModelSettings> {
        let mut settings = match self.settings_path(working_dir) {
            Some(path) => ModelSettings::load(&path)?,
            None => ModelSettings::default(),
        };

        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(temperature) = self.temperature {
            settings.temperature = temperature;
        }
        if let Some(tone) = &self.tone {
            settings.tone = tone.clone();
        }
        if let Some(keyword_count) = self.keyword_count {
            settings.keyword_count = keyword_count;
        }

        settings.validate()?;
        Ok(settings)
    }

    fn settings_path(&self, working_dir: &Path) -> Option<PathBuf> {
        match &self.settings {
            Some(path) => Some(path.clone()),
            None => {
                let default = working_dir.join(DEFAULT_SETTINGS_FILE);
                default.is_file().then_some(default)
            }
        }
    }
}

/// Generation settings that may live in a JSON file between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub model: String,
    pub temperature: f32,
    pub tone: String,
    pub keyword_count: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            tone: DEFAULT_TONE.to_string(),
            keyword_count: DEFAULT_KEYWORD_COUNT,
        }
    }
}

impl ModelSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| AimError::FileSystem {
            path: path.to_path_buf(),
            operation: "read settings file".to_string(),
            source: e,
        })?;

        serde_json::from_str(&text).map_err(|e| AimError::Configuration {
            message: format!("invalid settings file {}: {}", path.display(), e),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(AimError::Validation {
                field: "model".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(AimError::Validation {
                field: "temperature".to_string(),
                reason: format!("must be between 0.0 and 2.0, got {}", self.temperature),
            });
        }
        if self.tone.split(',').all(|t| t.trim().is_empty()) {
            return Err(AimError::Validation {
                field: "tone".to_string(),
                reason: "must name at least one tone".to_string(),
            });
        }
        if self.keyword_count == 0 {
            return Err(AimError::Validation {
                field: "keyword_count".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
