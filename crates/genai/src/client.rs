use std::sync::Arc;

use futures::future::BoxFuture;
use snafu::{ResultExt, ensure};

use super::config::{GenerationConfig, SharedConfig};
use super::error::{
    ApiStatusSnafu, BuildHttpClientSnafu, DecodeResponseSnafu, GenerationError,
    GenerationResult, MissingApiKeySnafu, TransportSnafu,
};
use super::prompt::{garment_request, try_on_request};
use super::response::GenerationOutcome;
use super::wire::{GenerateContentRequest, GenerateContentResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

// Error bodies can be large HTML pages; keep logs and messages readable.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Image synthesis operations used by the wizard.
///
/// Both operations return a display-ready data URI.
pub trait ImageGenerator: Send + Sync {
    fn synthesize_garment<'a>(
        &'a self,
        prompt: &'a str,
    ) -> BoxFuture<'a, GenerationResult<String>>;

    fn synthesize_try_on<'a>(
        &'a self,
        person_data_uri: &'a str,
        garment_data_uri: &'a str,
    ) -> BoxFuture<'a, GenerationResult<String>>;
}

pub struct GenerationClient {
    http: reqwest::Client,
    config: SharedConfig,
}

impl GenerationClient {
    pub fn new(config: SharedConfig) -> GenerationResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context(BuildHttpClientSnafu {
                stage: "build-generation-client",
            })?;
        Ok(Self { http, config })
    }

    /// Loads the current configuration and fails fast when no credential is set.
    fn active_config(&self, stage: &'static str) -> GenerationResult<Arc<GenerationConfig>> {
        let config = self.config.load_full();
        ensure!(config.has_api_key(), MissingApiKeySnafu { stage });
        Ok(config)
    }

    async fn generate(
        &self,
        config: &GenerationConfig,
        request: &GenerateContentRequest,
    ) -> GenerationResult<GenerationOutcome> {
        let response = self
            .http
            .post(config.generate_content_url())
            .header(API_KEY_HEADER, config.api_key.as_str())
            .timeout(config.request_timeout)
            .json(request)
            .send()
            .await
            .context(TransportSnafu {
                stage: "send-generate-request",
            })?;

        let status = response.status();
        let payload = response.text().await.context(TransportSnafu {
            stage: "read-generate-response",
        })?;

        if !status.is_success() {
            return ApiStatusSnafu {
                stage: "generate-http-status",
                status: status.as_u16(),
                body: truncate_body(&payload),
            }
            .fail();
        }

        let response: GenerateContentResponse =
            serde_json::from_str(&payload).context(DecodeResponseSnafu {
                stage: "decode-generate-response",
            })?;

        Ok(GenerationOutcome::from(response))
    }

    async fn garment(&self, prompt: &str) -> GenerationResult<String> {
        let config = self.active_config("synthesize-garment")?;
        tracing::info!(model = %config.model, prompt_len = prompt.len(), "synthesizing garment");

        let outcome = self.generate(&config, &garment_request(prompt)).await?;
        outcome.into_garment_image()
    }

    async fn try_on(
        &self,
        person_data_uri: &str,
        garment_data_uri: &str,
    ) -> GenerationResult<String> {
        let config = self.active_config("synthesize-try-on")?;
        tracing::info!(
            model = %config.model,
            person_len = person_data_uri.len(),
            garment_len = garment_data_uri.len(),
            "synthesizing try-on composite"
        );

        let request = try_on_request(person_data_uri, garment_data_uri);
        let outcome = self.generate(&config, &request).await?;
        outcome.into_try_on_image()
    }
}

impl ImageGenerator for GenerationClient {
    fn synthesize_garment<'a>(
        &'a self,
        prompt: &'a str,
    ) -> BoxFuture<'a, GenerationResult<String>> {
        Box::pin(async move { self.garment(prompt).await.inspect_err(log_failure) })
    }

    fn synthesize_try_on<'a>(
        &'a self,
        person_data_uri: &'a str,
        garment_data_uri: &'a str,
    ) -> BoxFuture<'a, GenerationResult<String>> {
        Box::pin(async move {
            self.try_on(person_data_uri, garment_data_uri)
                .await
                .inspect_err(log_failure)
        })
    }
}

fn log_failure(error: &GenerationError) {
    tracing::error!(
        kind = ?error.kind(),
        stage = error.stage(),
        error = %error,
        "generation failed"
    );
}

fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
