use super::ids::AssetId;

/// Where an image asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetOrigin {
    Preset,
    Upload,
    Generated,
}

/// Which selection slot of the wizard an asset occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetSlot {
    Person,
    Clothing,
}

/// An image plus its origin and, when known, its API-ready payload.
///
/// Assets are never edited in place; [`ImageAsset::with_payload`] returns a
/// superseding copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAsset {
    pub id: AssetId,
    /// Display source: a remote URL or a data URI.
    pub url: String,
    /// Data URI usable as a generation payload.
    pub base64: Option<String>,
    pub origin: AssetOrigin,
}

impl ImageAsset {
    /// A remote preset; its payload is fetched on demand.
    pub fn preset(id: impl Into<AssetId>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            base64: None,
            origin: AssetOrigin::Preset,
        }
    }

    pub fn uploaded(data_uri: impl Into<String>) -> Self {
        Self::embedded(
            AssetId::generate_with_prefix("upload"),
            data_uri.into(),
            AssetOrigin::Upload,
        )
    }

    pub fn generated(data_uri: impl Into<String>) -> Self {
        Self::embedded(
            AssetId::generate_with_prefix("gen"),
            data_uri.into(),
            AssetOrigin::Generated,
        )
    }

    fn embedded(id: AssetId, data_uri: String, origin: AssetOrigin) -> Self {
        Self {
            id,
            url: data_uri.clone(),
            base64: Some(data_uri),
            origin,
        }
    }

    pub fn payload(&self) -> Option<&str> {
        self.base64.as_deref()
    }

    pub fn needs_encoding(&self) -> bool {
        self.base64.is_none()
    }

    pub fn with_payload(&self, data_uri: impl Into<String>) -> Self {
        Self {
            base64: Some(data_uri.into()),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_assets_display_their_payload() {
        let asset = ImageAsset::generated("data:image/png;base64,AAAA");
        assert_eq!(asset.origin, AssetOrigin::Generated);
        assert_eq!(asset.url, "data:image/png;base64,AAAA");
        assert_eq!(asset.payload(), Some("data:image/png;base64,AAAA"));
        assert!(asset.id.as_str().starts_with("gen_"));
    }

    #[test]
    fn preset_gains_payload_without_changing_identity() {
        let preset = ImageAsset::preset("p1", "https://example.com/p1.jpg");
        assert!(preset.needs_encoding());

        let encoded = preset.with_payload("data:image/jpeg;base64,AAAA");
        assert_eq!(encoded.id, preset.id);
        assert_eq!(encoded.url, preset.url);
        assert!(!encoded.needs_encoding());
        assert!(preset.needs_encoding());
    }
}
