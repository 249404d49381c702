use std::path::PathBuf;

use snafu::Snafu;

/// Shown to users whenever a remote image cannot be turned into a payload.
pub const REMOTE_IMAGE_HINT: &str = "Could not read this image (the host may block cross-origin \
     access). Download it and upload the local file instead.";

/// Shown to users when a local file cannot be read.
pub const LOCAL_IMAGE_HINT: &str = "Image upload failed.";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum MediaError {
    #[snafu(display("failed to read image file {path:?} on `{stage}`: {source}"))]
    ReadFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to build image fetch client on `{stage}`: {source}"))]
    BuildFetchClient {
        stage: &'static str,
        source: reqwest::Error,
    },
    #[snafu(display("failed to fetch image from '{url}' on `{stage}`: {source}"))]
    Fetch {
        stage: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[snafu(display("image host '{url}' answered with status {status}"))]
    FetchStatus {
        stage: &'static str,
        url: String,
        status: u16,
    },
    #[snafu(display("failed to read image body from '{url}' on `{stage}`: {source}"))]
    FetchBody {
        stage: &'static str,
        url: String,
        source: reqwest::Error,
    },
    #[snafu(display("image payload is not valid base64 on `{stage}`: {source}"))]
    DecodePayload {
        stage: &'static str,
        source: base64::DecodeError,
    },
}

impl MediaError {
    /// Returns true for failures that happened while talking to a remote host.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::BuildFetchClient { .. }
                | Self::Fetch { .. }
                | Self::FetchStatus { .. }
                | Self::FetchBody { .. }
        )
    }

    /// User-facing text for this failure.
    ///
    /// Network failures always point at local upload as the fallback.
    pub fn user_message(&self) -> &'static str {
        if self.is_network() {
            REMOTE_IMAGE_HINT
        } else {
            LOCAL_IMAGE_HINT
        }
    }
}

pub type MediaResult<T> = Result<T, MediaError>;
