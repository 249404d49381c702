use super::error::{BlockedSnafu, GenerationResult, NoImageSnafu, NoImageWithTextSnafu};
use super::wire::{GenerateContentResponse, Part};

/// Maximum number of characters of model text carried in a failure.
pub const TEXT_EXCERPT_CHARS: usize = 100;

const FALLBACK_IMAGE_MIME: &str = "image/png";

/// Inline image payload returned by the model, still base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    pub fn to_data_uri(&self) -> String {
        let mime_type = if self.mime_type.trim().is_empty() {
            FALLBACK_IMAGE_MIME
        } else {
            self.mime_type.trim()
        };
        format!("data:{mime_type};base64,{}", self.data)
    }
}

/// A response part after classification at the client boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Image(InlineImage),
    Text(String),
    Unknown,
}

impl From<Part> for ResponsePart {
    fn from(part: Part) -> Self {
        match (part.inline_data, part.text) {
            (Some(blob), _) if !blob.data.is_empty() => Self::Image(InlineImage {
                mime_type: blob.mime_type,
                data: blob.data,
            }),
            (_, Some(text)) if !text.trim().is_empty() => Self::Text(text),
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Safety(String),
    Other(String),
}

impl FinishReason {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.to_ascii_uppercase().as_str() {
            "STOP" => Self::Stop,
            "SAFETY" | "IMAGE_SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" => {
                Self::Safety(raw.to_string())
            }
            _ => Self::Other(raw.to_string()),
        }
    }

    pub fn is_safety(&self) -> bool {
        matches!(self, Self::Safety(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "STOP",
            Self::Safety(raw) | Self::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCandidate {
    pub parts: Vec<ResponsePart>,
    pub finish_reason: Option<FinishReason>,
}

/// Fully classified model response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationOutcome {
    pub candidates: Vec<ClassifiedCandidate>,
    pub block_reason: Option<String>,
}

impl From<GenerateContentResponse> for GenerationOutcome {
    fn from(response: GenerateContentResponse) -> Self {
        let candidates = response
            .candidates
            .into_iter()
            .map(|candidate| ClassifiedCandidate {
                parts: candidate
                    .content
                    .map(|content| content.parts)
                    .unwrap_or_default()
                    .into_iter()
                    .map(ResponsePart::from)
                    .collect(),
                finish_reason: candidate
                    .finish_reason
                    .as_deref()
                    .filter(|raw| !raw.trim().is_empty())
                    .map(FinishReason::parse),
            })
            .collect();

        Self {
            candidates,
            block_reason: response
                .prompt_feedback
                .and_then(|feedback| feedback.block_reason)
                .filter(|reason| !reason.trim().is_empty()),
        }
    }
}

impl GenerationOutcome {
    pub fn first_image(&self) -> Option<&InlineImage> {
        self.parts().find_map(|part| match part {
            ResponsePart::Image(image) => Some(image),
            ResponsePart::Text(_) | ResponsePart::Unknown => None,
        })
    }

    pub fn first_text(&self) -> Option<&str> {
        self.parts().find_map(|part| match part {
            ResponsePart::Text(text) => Some(text.as_str()),
            ResponsePart::Image(_) | ResponsePart::Unknown => None,
        })
    }

    /// First finish reason that is present and not a normal stop.
    pub fn abnormal_finish(&self) -> Option<&FinishReason> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.finish_reason.as_ref())
            .find(|reason| **reason != FinishReason::Stop)
    }

    /// Resolves a garment synthesis: any image wins, nothing else is inspected.
    pub fn into_garment_image(self) -> GenerationResult<String> {
        match self.first_image() {
            Some(image) => Ok(image.to_data_uri()),
            None => NoImageSnafu {
                stage: "resolve-garment-image",
                operation: "garment synthesis",
            }
            .fail(),
        }
    }

    /// Resolves a try-on synthesis.
    ///
    /// Without an image the model's own text is the most useful diagnostic,
    /// then an abnormal finish reason, then a generic failure.
    pub fn into_try_on_image(self) -> GenerationResult<String> {
        if let Some(image) = self.first_image() {
            return Ok(image.to_data_uri());
        }

        if let Some(text) = self.first_text() {
            return NoImageWithTextSnafu {
                stage: "resolve-try-on-text",
                excerpt: excerpt(text),
            }
            .fail();
        }

        if let Some(reason) = self.abnormal_finish() {
            return BlockedSnafu {
                stage: "resolve-try-on-finish-reason",
                reason: reason.as_str(),
            }
            .fail();
        }

        if let Some(reason) = &self.block_reason {
            return BlockedSnafu {
                stage: "resolve-try-on-prompt-feedback",
                reason: reason.as_str(),
            }
            .fail();
        }

        NoImageSnafu {
            stage: "resolve-try-on-image",
            operation: "try-on synthesis",
        }
        .fail()
    }

    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .flat_map(|candidate| candidate.parts.iter())
    }
}

fn excerpt(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(TEXT_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
