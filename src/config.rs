use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Completion criterion family of a test
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TestMode {
    Time,
    Words,
    Quote,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
pub enum Difficulty {
    /// no penalty
    Normal,
    /// a word closed with a mistake in it ends the test
    Expert,
    /// the first incorrect character ends the test
    Master,
}

/// Per-session test settings. `duration_secs` only matters in time mode,
/// `word_count` only in words mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TestConfig {
    pub mode: TestMode,
    pub duration_secs: u32,
    pub word_count: usize,
    pub difficulty: Difficulty,
    pub text_source: String,
    pub punctuation: bool,
    pub custom_text: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            mode: TestMode::Time,
            duration_secs: 30,
            word_count: 25,
            difficulty: Difficulty::Normal,
            text_source: "english".to_string(),
            punctuation: false,
            custom_text: None,
        }
    }
}

/// Partial update merged into a [`TestConfig`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub mode: Option<TestMode>,
    pub duration_secs: Option<u32>,
    pub word_count: Option<usize>,
    pub difficulty: Option<Difficulty>,
    pub text_source: Option<String>,
    pub punctuation: Option<bool>,
    /// `Some(None)` clears a previously set custom text
    pub custom_text: Option<Option<String>>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == ConfigPatch::default()
    }
}

impl TestConfig {
    /// Merges `patch` and reports whether the target text has to be reloaded.
    pub fn apply(&mut self, patch: ConfigPatch) -> bool {
        let before = self.clone();

        if let Some(mode) = patch.mode {
            self.mode = mode;
        }
        if let Some(secs) = patch.duration_secs {
            self.duration_secs = secs.max(1);
        }
        if let Some(count) = patch.word_count {
            self.word_count = count.max(1);
        }
        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(source) = patch.text_source {
            self.text_source = source;
        }
        if let Some(punctuation) = patch.punctuation {
            self.punctuation = punctuation;
        }
        if let Some(custom) = patch.custom_text {
            self.custom_text = custom.filter(|t| !t.trim().is_empty());
        }

        self.mode != before.mode
            || self.text_source != before.text_source
            || self.punctuation != before.punctuation
            || self.custom_text != before.custom_text
            || (self.mode == TestMode::Words && self.word_count != before.word_count)
    }

    pub fn duration_ms(&self) -> u64 {
        u64::from(self.duration_secs) * 1000
    }
}

pub trait ConfigStore {
    fn load(&self) -> TestConfig;
    fn save(&self, cfg: &TestConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "typeamp") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("typeamp_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> TestConfig {
        match fs::read(&self.path) {
            Ok(bytes) => match serde_json::from_slice::<TestConfig>(&bytes) {
                Ok(cfg) => cfg,
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                    TestConfig::default()
                }
            },
            Err(_) => TestConfig::default(),
        }
    }

    fn save(&self, cfg: &TestConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
