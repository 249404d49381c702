use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ImageFormat;
use snafu::ResultExt;

use super::error::{DecodePayloadSnafu, MediaResult, ReadFileSnafu};

/// MIME type assumed whenever a payload does not declare one.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";
const IMAGE_PREFIX: &str = "data:image/";

const STRIPPABLE_SUBTYPES: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Wraps raw bytes into a `data:<mime>;base64,<payload>` string.
pub fn encode_bytes_as_data_uri(bytes: &[u8], mime_type: &str) -> String {
    format!("{DATA_PREFIX}{mime_type}{BASE64_MARKER}{}", BASE64.encode(bytes))
}

/// Reads a local image file and encodes it as a data URI.
///
/// The MIME type is sniffed from the file's magic bytes, then guessed from the
/// extension, and finally defaults to [`DEFAULT_MIME_TYPE`].
pub async fn encode_file_as_data_uri(path: impl AsRef<Path>) -> MediaResult<String> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await.context(ReadFileSnafu {
        stage: "read-image-file",
        path: path.to_path_buf(),
    })?;

    let mime_type = sniff_mime_type(&bytes)
        .or_else(|| mime_type_from_path(path))
        .unwrap_or(DEFAULT_MIME_TYPE);

    tracing::debug!(
        path = %path.display(),
        size_bytes = bytes.len(),
        mime_type,
        "encoded local image file"
    );

    Ok(encode_bytes_as_data_uri(&bytes, mime_type))
}

/// Returns only the base64 payload of a data URI.
///
/// Only the common raster markers (`png`, `jpg`, `jpeg`, `webp`) are removed,
/// matched case-sensitively. Anything else is returned unchanged, so applying
/// this twice is the same as applying it once.
pub fn strip_encoding_prefix(data_uri: &str) -> &str {
    let Some(rest) = data_uri.strip_prefix(IMAGE_PREFIX) else {
        return data_uri;
    };

    STRIPPABLE_SUBTYPES
        .iter()
        .find_map(|subtype| rest.strip_prefix(subtype)?.strip_prefix(BASE64_MARKER))
        .unwrap_or(data_uri)
}

/// Parses the MIME marker of a data URI, defaulting to `image/jpeg`.
pub fn extract_mime_type(data_uri: &str) -> &str {
    let Some(rest) = data_uri.strip_prefix(DATA_PREFIX) else {
        return DEFAULT_MIME_TYPE;
    };
    let Some((mime_type, _)) = rest.split_once(BASE64_MARKER) else {
        return DEFAULT_MIME_TYPE;
    };
    let Some(subtype) = mime_type.strip_prefix("image/") else {
        return DEFAULT_MIME_TYPE;
    };

    if !subtype.is_empty() && subtype.bytes().all(|byte| byte.is_ascii_alphabetic()) {
        mime_type
    } else {
        DEFAULT_MIME_TYPE
    }
}

/// Decodes the binary payload of a data URI (or of a bare base64 string).
pub fn decode_data_uri(data_uri: &str) -> MediaResult<Vec<u8>> {
    let payload = match data_uri.split_once(BASE64_MARKER) {
        Some((head, payload)) if head.starts_with(DATA_PREFIX) => payload,
        _ => data_uri,
    };

    BASE64.decode(payload.trim()).context(DecodePayloadSnafu {
        stage: "decode-data-uri",
    })
}

/// Detects an image MIME type from magic bytes.
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

/// File extension conventionally used for a MIME type.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    ImageFormat::from_mime_type(mime_type)
        .and_then(|format| format.extensions_str().first().copied())
        .unwrap_or("jpg")
}

fn mime_type_from_path(path: &Path) -> Option<&'static str> {
    ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type())
}
