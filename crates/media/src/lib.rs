pub mod data_uri;
pub mod error;
pub mod fetch;

pub use data_uri::{
    DEFAULT_MIME_TYPE, decode_data_uri, encode_bytes_as_data_uri, encode_file_as_data_uri,
    extension_for_mime, extract_mime_type, sniff_mime_type, strip_encoding_prefix,
};
pub use error::{LOCAL_IMAGE_HINT, MediaError, MediaResult, REMOTE_IMAGE_HINT};
pub use fetch::{DEFAULT_FETCH_TIMEOUT, HttpImageFetcher, ImageFetcher};
