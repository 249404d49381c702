use tryon_media::{extract_mime_type, strip_encoding_prefix};

use super::safety::permissive_safety_settings;
use super::wire::{Content, GenerateContentRequest, GenerationOptions, Part};

pub const PERSON_LABEL: &str = "Look at the person in the previous image.";
pub const GARMENT_LABEL: &str = "Look at the clothing in the previous image.";
pub const TRY_ON_INSTRUCTION: &str = "Generate a high-quality, realistic full-body photo of the \
     person from the first image wearing the clothing from the second image. Maintain the \
     person's pose, facial features, body shape, and the clothing's texture and design details. \
     The lighting should be natural.";

const RESPONSE_MODALITIES: [&str; 2] = ["TEXT", "IMAGE"];

pub fn garment_prompt(description: &str) -> String {
    format!(
        "Generate a high-quality, flat-lay product photography of a piece of clothing.\n\
         Description: {}.\n\
         The background should be plain white or simple solid color.\n\
         Focus on the texture and design details of the garment.",
        description.trim()
    )
}

pub fn garment_request(description: &str) -> GenerateContentRequest {
    request(vec![Part::text(garment_prompt(description))])
}

/// Builds the composite request: person, label, garment, label and instruction.
///
/// Each image keeps the MIME type declared by its own data URI.
pub fn try_on_request(person_data_uri: &str, garment_data_uri: &str) -> GenerateContentRequest {
    request(vec![
        image_part(person_data_uri),
        Part::text(PERSON_LABEL),
        image_part(garment_data_uri),
        Part::text(format!("{GARMENT_LABEL} {TRY_ON_INSTRUCTION}")),
    ])
}

fn image_part(data_uri: &str) -> Part {
    Part::inline(extract_mime_type(data_uri), strip_encoding_prefix(data_uri))
}

fn request(parts: Vec<Part>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(parts)],
        safety_settings: permissive_safety_settings(),
        generation_config: Some(GenerationOptions {
            response_modalities: RESPONSE_MODALITIES.to_vec(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn garment_prompt_embeds_description() {
        let prompt = garment_prompt("  red silk evening gown ");
        assert!(prompt.contains("Description: red silk evening gown."));
        assert!(prompt.contains("flat-lay product photography"));
    }

    #[test]
    fn try_on_parts_keep_order_and_mime_types() {
        let request = try_on_request(
            "data:image/png;base64,UEVSU09O",
            "data:image/webp;base64,R0FSTUVOVA==",
        );
        let value = serde_json::to_value(&request).unwrap();
        let parts = &value["contents"][0]["parts"];

        assert_eq!(
            parts[0],
            json!({"inlineData": {"mimeType": "image/png", "data": "UEVSU09O"}})
        );
        assert_eq!(parts[1], json!({"text": PERSON_LABEL}));
        assert_eq!(
            parts[2],
            json!({"inlineData": {"mimeType": "image/webp", "data": "R0FSTUVOVA=="}})
        );
        assert!(
            parts[3]["text"]
                .as_str()
                .unwrap()
                .starts_with(GARMENT_LABEL)
        );
        assert_eq!(parts.as_array().unwrap().len(), 4);
    }

    #[test]
    fn bare_payload_defaults_to_jpeg() {
        let request = try_on_request("UEVSU09O", "R0FSTUVOVA==");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            json!("image/jpeg")
        );
    }

    #[test]
    fn requests_carry_permissive_safety_settings() {
        let value = serde_json::to_value(garment_request("denim jacket")).unwrap();
        let settings = value["safetySettings"].as_array().unwrap();

        assert_eq!(settings.len(), 4);
        assert!(
            settings
                .iter()
                .all(|setting| setting["threshold"] == json!("BLOCK_NONE"))
        );
        assert_eq!(
            value["generationConfig"]["responseModalities"],
            json!(["TEXT", "IMAGE"])
        );
    }
}
