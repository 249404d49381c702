use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use snafu::{ResultExt, ensure};

use super::data_uri::{DEFAULT_MIME_TYPE, encode_bytes_as_data_uri, sniff_mime_type};
use super::error::{
    BuildFetchClientSnafu, FetchBodySnafu, FetchSnafu, FetchStatusSnafu, MediaResult,
};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns a remote image reference into an API-ready data URI.
pub trait ImageFetcher: Send + Sync {
    fn fetch_and_encode_as_data_uri<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, MediaResult<String>>;
}

pub struct HttpImageFetcher {
    http: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn with_timeout(timeout: Duration) -> MediaResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context(BuildFetchClientSnafu {
                stage: "build-fetch-client",
            })?;
        Ok(Self { http })
    }

    async fn fetch(&self, url: &str) -> MediaResult<String> {
        let response = self.http.get(url).send().await.context(FetchSnafu {
            stage: "send-fetch-request",
            url,
        })?;

        let status = response.status();
        ensure!(
            status.is_success(),
            FetchStatusSnafu {
                stage: "fetch-http-status",
                url,
                status: status.as_u16(),
            }
        );

        let declared_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(image_mime_from_content_type);

        let bytes = response.bytes().await.context(FetchBodySnafu {
            stage: "read-fetch-body",
            url,
        })?;

        let mime_type = declared_mime
            .or_else(|| sniff_mime_type(&bytes).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        tracing::debug!(
            url,
            size_bytes = bytes.len(),
            mime_type = %mime_type,
            "fetched remote image"
        );

        Ok(encode_bytes_as_data_uri(&bytes, &mime_type))
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch_and_encode_as_data_uri<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, MediaResult<String>> {
        Box::pin(async move {
            self.fetch(url).await.inspect_err(|error| {
                tracing::warn!(url, error = %error, "remote image could not be encoded");
            })
        })
    }
}

/// Keeps only `image/*` content types, dropping parameters such as charset.
fn image_mime_from_content_type(raw: &str) -> Option<String> {
    let mime_type = raw.split(';').next()?.trim().to_ascii_lowercase();
    mime_type.starts_with("image/").then_some(mime_type)
}
