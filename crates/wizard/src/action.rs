use std::fmt;

use tryon_genai::FailureKind;

use super::asset::{AssetSlot, ImageAsset};
use super::state::{LoadingState, Step};

/// Input to the wizard reducer: a user intent or an operation completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAction {
    /// A person image was picked or uploaded.
    SelectPerson(ImageAsset),
    /// A garment image was picked or uploaded.
    SelectClothing(ImageAsset),
    /// Reading a local file failed before anything could be selected.
    UploadFailed { message: String },
    /// Prompt text edited. Not a mutating operation, accepted at any time.
    SetPrompt(String),
    RequestGarment,
    GarmentSynthesized { data_uri: String },
    GarmentFailed { kind: FailureKind, detail: String },
    RequestTryOn,
    AssetEncoded { slot: AssetSlot, data_uri: String },
    AssetEncodeFailed { slot: AssetSlot, message: String, detail: String },
    TryOnSynthesized { data_uri: String, created_at_unix_seconds: u64 },
    TryOnFailed { kind: FailureKind, detail: String },
    GoToStep(Step),
    /// Leaves the result screen to pick a different garment for the same person.
    TryAnotherGarment,
    Reset,
}

impl WizardAction {
    /// Completions answer a [`Command`]; everything else is a user intent.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Self::GarmentSynthesized { .. }
                | Self::GarmentFailed { .. }
                | Self::AssetEncoded { .. }
                | Self::AssetEncodeFailed { .. }
                | Self::TryOnSynthesized { .. }
                | Self::TryOnFailed { .. }
        )
    }
}

/// Side effect the driver must perform and answer with a completion action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SynthesizeGarment { prompt: String },
    EncodeAsset { slot: AssetSlot, url: String },
    SynthesizeTryOn { person: String, garment: String },
}

/// Rejection reason for illegal transitions. Rejected actions never touch state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Busy { active: LoadingState },
    MissingSelection { person: bool, clothing: bool },
    EmptyPrompt,
    StepUnavailable(Step),
    UnexpectedCompletion { loading: LoadingState },
}

impl fmt::Display for Rejection {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy { active } => {
                write!(formatter, "another operation is running ({active:?})")
            }
            Self::MissingSelection { person, clothing } => write!(
                formatter,
                "try-on needs both images (person: {person}, clothing: {clothing})"
            ),
            Self::EmptyPrompt => formatter.write_str("garment description is empty"),
            Self::StepUnavailable(step) => {
                write!(formatter, "step {step:?} is not reachable yet")
            }
            Self::UnexpectedCompletion { loading } => {
                write!(
                    formatter,
                    "completion does not match the operation in flight ({loading:?})"
                )
            }
        }
    }
}

impl std::error::Error for Rejection {}

pub type TransitionResult = Result<Option<Command>, Rejection>;
