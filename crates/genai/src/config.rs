use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Connection settings for the generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_IMAGE_MODEL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl GenerationConfig {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let endpoint = endpoint.into().trim().trim_end_matches('/').to_string();
        let model = model.into().trim().to_string();

        Self {
            api_key: api_key.into().trim().to_string(),
            endpoint: if endpoint.is_empty() {
                DEFAULT_ENDPOINT.to_string()
            } else {
                endpoint
            },
            model: if model.is_empty() {
                DEFAULT_IMAGE_MODEL.to_string()
            } else {
                model
            },
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self::new(api_key, DEFAULT_ENDPOINT, DEFAULT_IMAGE_MODEL)
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn generate_content_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

/// Process-wide configuration slot, read by the client on every call.
pub type SharedConfig = Arc<ArcSwap<GenerationConfig>>;

pub fn shared_config(config: GenerationConfig) -> SharedConfig {
    Arc::new(ArcSwap::from_pointee(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_fall_back_to_defaults() {
        let config = GenerationConfig::new("  key  ", " ", "");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, DEFAULT_IMAGE_MODEL);
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        let config = GenerationConfig::new("key", "http://localhost:8080/v1beta/", "m");
        assert_eq!(
            config.generate_content_url(),
            "http://localhost:8080/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn shared_config_swaps_in_place() {
        let shared = shared_config(GenerationConfig::default());
        assert!(!shared.load().has_api_key());

        shared.store(Arc::new(GenerationConfig::with_api_key("secret")));
        assert!(shared.load().has_api_key());
    }
}
