use super::asset::ImageAsset;

const PERSON_PRESETS: [(&str, &str); 3] = [
    ("p1", "https://p1.ssl.qhimg.com/t016f3f01da12c3fec7.jpg"),
    ("p2", "https://picsum.photos/id/64/800/1000"),
    ("p3", "https://picsum.photos/id/338/800/1000"),
];

const CLOTHING_PRESETS: [(&str, &str); 2] = [
    (
        "c1",
        "https://th.bing.com/th/id/OIP._QL4rw1fOr5BJDMGs7lMNwHaNJ?o=7rm=3&rs=1&pid=ImgDetMain&o=7&rm=3",
    ),
    ("c2", "https://picsum.photos/id/447/800/800"),
];

pub fn preset_person_images() -> Vec<ImageAsset> {
    PERSON_PRESETS
        .iter()
        .map(|(id, url)| ImageAsset::preset(*id, *url))
        .collect()
}

pub fn preset_clothing_images() -> Vec<ImageAsset> {
    CLOTHING_PRESETS
        .iter()
        .map(|(id, url)| ImageAsset::preset(*id, *url))
        .collect()
}

/// Looks up a preset of either kind by id.
pub fn find_preset(id: &str) -> Option<ImageAsset> {
    PERSON_PRESETS
        .iter()
        .chain(CLOTHING_PRESETS.iter())
        .find(|(preset_id, _)| *preset_id == id)
        .map(|(id, url)| ImageAsset::preset(*id, *url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetOrigin;

    #[test]
    fn presets_have_no_payload_yet() {
        let all = preset_person_images()
            .into_iter()
            .chain(preset_clothing_images())
            .collect::<Vec<_>>();

        assert_eq!(all.len(), 5);
        assert!(
            all.iter()
                .all(|asset| asset.origin == AssetOrigin::Preset && asset.needs_encoding())
        );
    }

    #[test]
    fn presets_are_found_by_id() {
        let found = find_preset("c2").map(|asset| asset.id.to_string());
        assert_eq!(found.as_deref(), Some("c2"));
        assert!(find_preset("zz").is_none());
    }
}
