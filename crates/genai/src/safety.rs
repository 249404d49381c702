//! Content-safety thresholds attached to every generation request.
//!
//! Product policy: try-on requests are photos of people and clothing, which
//! the default moderation thresholds routinely flag (bare arms, swimwear,
//! underwear product shots). Every harm category is therefore sent at the most
//! permissive threshold the API accepts. This is a deliberate product decision
//! made for this use case, not an oversight; reviewers changing it should
//! expect a large share of ordinary try-on requests to come back blocked.

use super::wire::SafetySetting;

/// Most permissive threshold accepted by the API.
pub const PERMISSIVE_THRESHOLD: &str = "BLOCK_NONE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarmCategory {
    Harassment,
    HateSpeech,
    SexuallyExplicit,
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [Self; 4] = [
        Self::Harassment,
        Self::HateSpeech,
        Self::SexuallyExplicit,
        Self::DangerousContent,
    ];

    pub fn as_api_str(self) -> &'static str {
        match self {
            Self::Harassment => "HARM_CATEGORY_HARASSMENT",
            Self::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            Self::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            Self::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }
}

pub fn permissive_safety_settings() -> Vec<SafetySetting> {
    HarmCategory::ALL
        .into_iter()
        .map(|category| SafetySetting {
            category: category.as_api_str(),
            threshold: PERMISSIVE_THRESHOLD,
        })
        .collect()
}
