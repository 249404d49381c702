use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};
use tempfile::NamedTempFile;
use tryon_genai::{DEFAULT_ENDPOINT, DEFAULT_IMAGE_MODEL, DEFAULT_REQUEST_TIMEOUT, GenerationConfig};
use tryon_media::DEFAULT_FETCH_TIMEOUT;

pub const SETTINGS_DIRECTORY_NAME: &str = "tryon";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const ENV_PREFIX: &str = "TRYON_";
/// Checked in order when no credential is configured anywhere else.
pub const FALLBACK_API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl AppSettings {
    pub fn normalized(mut self) -> Self {
        self.api_key = self.api_key.trim().to_string();
        self.endpoint = non_blank_or(&self.endpoint, default_endpoint);
        self.model = non_blank_or(&self.model, default_model);
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = default_fetch_timeout_secs();
        }
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub fn to_generation_config(&self) -> GenerationConfig {
        GenerationConfig::new(&self.api_key, &self.endpoint, &self.model)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Credential rendering safe for terminals and logs.
    pub fn masked_api_key(&self) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            return "(not set)".to_string();
        }

        let chars = key.chars().count();
        if chars <= 8 {
            return "*".repeat(chars);
        }

        let tail: String = key.chars().skip(chars - 4).collect();
        format!("{}{tail}", "*".repeat(chars - 4))
    }

    /// Fills an empty credential from the first non-blank candidate.
    pub fn with_fallback_api_key<I>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        if self.has_api_key() {
            return self;
        }

        if let Some(key) = candidates
            .into_iter()
            .flatten()
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
        {
            self.api_key = key;
        }
        self
    }
}

/// Settings as seen by the running process: the persisted file with the
/// environment layered on top.
pub struct SettingsStore {
    settings: Arc<ArcSwap<AppSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".tryon"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = with_environment(Self::load_from_disk(&config_path));
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Effective settings, environment included.
    pub fn settings(&self) -> Arc<AppSettings> {
        self.settings.load_full()
    }

    /// File-only settings. Edits start from here so environment values are
    /// never written to disk.
    pub fn persisted(&self) -> AppSettings {
        Self::load_from_disk(&self.config_path)
    }

    pub fn update(&self, settings: AppSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings
            .store(Arc::new(with_environment(normalized_settings)));
        Ok(())
    }

    fn load_from_disk(path: &Path) -> AppSettings {
        if !path.exists() {
            tracing::info!(?path, "settings file not found, using defaults");
            return AppSettings::default();
        }

        let figment =
            Figment::from(Serialized::defaults(AppSettings::default())).merge(Json::file(path));

        match figment.extract::<AppSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(?path, %error, "failed to parse settings, using defaults");
                AppSettings::default()
            }
        }
    }

    /// Stages the JSON in a sibling temp file, then moves it over the settings file.
    fn persist(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        let directory = match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(directory).context(PrepareDirectorySnafu {
            stage: "prepare-settings-directory",
            directory,
        })?;

        let mut staged = NamedTempFile::new_in(directory).context(StageFileSnafu {
            stage: "stage-settings-file",
            directory,
        })?;
        serde_json::to_writer_pretty(&mut staged, settings).context(EncodeSettingsSnafu {
            stage: "encode-settings-json",
        })?;
        staged.persist(&self.config_path).context(CommitFileSnafu {
            stage: "commit-settings-file",
            path: self.config_path.clone(),
        })?;

        tracing::info!(path = ?self.config_path, "saved settings");
        Ok(())
    }
}

/// Layers `TRYON_*` variables over `base`, then falls back to the common
/// credential variables if the key is still empty.
fn with_environment(base: AppSettings) -> AppSettings {
    let figment =
        Figment::from(Serialized::defaults(base.clone())).merge(Env::prefixed(ENV_PREFIX));

    let settings = match figment.extract::<AppSettings>() {
        Ok(settings) => settings.normalized(),
        Err(error) => {
            tracing::warn!(%error, "ignoring malformed {ENV_PREFIX}* environment");
            base
        }
    };

    settings.with_fallback_api_key(
        FALLBACK_API_KEY_VARS
            .iter()
            .map(|name| std::env::var(name).ok()),
    )
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("cannot prepare settings directory {directory:?} on `{stage}`: {source}"))]
    PrepareDirectory {
        stage: &'static str,
        directory: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot stage settings in {directory:?} on `{stage}`: {source}"))]
    StageFile {
        stage: &'static str,
        directory: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("cannot encode settings on `{stage}`: {source}"))]
    EncodeSettings {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("cannot move staged settings onto {path:?} on `{stage}`: {source}"))]
    CommitFile {
        stage: &'static str,
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

fn non_blank_or(value: &str, default: fn() -> String) -> String {
    let value = value.trim();
    if value.is_empty() {
        default()
    } else {
        value.to_string()
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_fetch_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let persisted = store.persisted();
        assert_eq!(persisted, AppSettings::default());
        assert_eq!(persisted.model, DEFAULT_IMAGE_MODEL);
        assert_eq!(persisted.request_timeout_secs, 90);
    }

    #[test]
    fn update_persists_normalized_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let store = SettingsStore::new(path.clone());

        store
            .update(AppSettings {
                api_key: "  secret-key  ".to_string(),
                endpoint: "   ".to_string(),
                model: " custom-image-model ".to_string(),
                request_timeout_secs: 0,
                fetch_timeout_secs: 5,
            })
            .unwrap();

        assert!(path.exists());
        let entries = std::fs::read_dir(path.parent().unwrap()).unwrap().count();
        assert_eq!(entries, 1, "staged file must not be left behind");

        let reloaded = SettingsStore::new(path).persisted();
        assert_eq!(reloaded.api_key, "secret-key");
        assert_eq!(reloaded.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(reloaded.model, "custom-image-model");
        assert_eq!(reloaded.request_timeout_secs, 90);
        assert_eq!(reloaded.fetch_timeout_secs, 5);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"model": "other-model"}"#).unwrap();

        let persisted = SettingsStore::new(path).persisted();
        assert_eq!(persisted.model, "other-model");
        assert_eq!(persisted.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert_eq!(SettingsStore::new(path).persisted(), AppSettings::default());
    }

    #[test]
    fn fallback_key_only_fills_blank_credential() {
        let filled = AppSettings::default()
            .with_fallback_api_key([None, Some("  ".to_string()), Some("env-key".to_string())]);
        assert_eq!(filled.api_key, "env-key");

        let configured = AppSettings {
            api_key: "file-key".to_string(),
            ..AppSettings::default()
        }
        .with_fallback_api_key([Some("env-key".to_string())]);
        assert_eq!(configured.api_key, "file-key");
    }

    #[test]
    fn masked_key_hides_all_but_tail() {
        let mut settings = AppSettings::default();
        assert_eq!(settings.masked_api_key(), "(not set)");

        settings.api_key = "short".to_string();
        assert_eq!(settings.masked_api_key(), "*****");

        settings.api_key = "AIzaSyExample1234".to_string();
        assert_eq!(settings.masked_api_key(), "*************1234");
    }

    #[test]
    fn generation_config_carries_timeout() {
        let settings = AppSettings {
            api_key: "k".to_string(),
            request_timeout_secs: 12,
            ..AppSettings::default()
        };

        let config = settings.to_generation_config();
        assert!(config.has_api_key());
        assert_eq!(config.request_timeout, Duration::from_secs(12));
        assert_eq!(config.model, DEFAULT_IMAGE_MODEL);
    }
}
