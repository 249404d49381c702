mod action;
mod asset;
mod driver;
mod history;
mod ids;
pub mod messages;
mod presets;
mod state;

pub use action::{Command, Rejection, TransitionResult, WizardAction};
pub use asset::{AssetOrigin, AssetSlot, ImageAsset};
pub use driver::Wizard;
pub use history::{HistoryItem, now_unix_seconds};
pub use ids::{AssetId, HistoryId};
pub use presets::{find_preset, preset_clothing_images, preset_person_images};
pub use state::{LoadingState, Step, WizardState};
