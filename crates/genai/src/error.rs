use snafu::Snafu;

/// Coarse failure class used by callers to pick a user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No usable credential; nothing was sent.
    Configuration,
    /// The request never produced a readable model response.
    Transport,
    /// The model answered but did not return an image.
    Generation,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GenerationError {
    #[snafu(display("API key is not configured"))]
    MissingApiKey { stage: &'static str },
    #[snafu(display("failed to build http client on `{stage}`, {source}"))]
    BuildHttpClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("generation request failed on `{stage}`, {source}"))]
    Transport {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("generation endpoint returned status {status}: {body}"))]
    ApiStatus {
        stage: &'static str,
        status: u16,
        body: String,
    },
    #[snafu(display("failed to decode generation response on `{stage}`, {source}"))]
    DecodeResponse {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("model returned no image for {operation}"))]
    NoImage {
        stage: &'static str,
        operation: &'static str,
    },
    #[snafu(display("model returned text instead of an image: {excerpt}"))]
    NoImageWithText {
        stage: &'static str,
        excerpt: String,
    },
    #[snafu(display("generation stopped early, reason: {reason}"))]
    Blocked { stage: &'static str, reason: String },
}

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::MissingApiKey { .. } => FailureKind::Configuration,
            Self::BuildHttpClient { .. }
            | Self::Transport { .. }
            | Self::ApiStatus { .. }
            | Self::DecodeResponse { .. } => FailureKind::Transport,
            Self::NoImage { .. } | Self::NoImageWithText { .. } | Self::Blocked { .. } => {
                FailureKind::Generation
            }
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::MissingApiKey { stage }
            | Self::BuildHttpClient { stage, .. }
            | Self::Transport { stage, .. }
            | Self::ApiStatus { stage, .. }
            | Self::DecodeResponse { stage, .. }
            | Self::NoImage { stage, .. }
            | Self::NoImageWithText { stage, .. }
            | Self::Blocked { stage, .. } => stage,
        }
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;
