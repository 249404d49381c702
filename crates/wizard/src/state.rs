use std::collections::HashMap;

use tryon_genai::FailureKind;

use super::action::{Command, Rejection, TransitionResult, WizardAction};
use super::asset::{AssetSlot, ImageAsset};
use super::history::HistoryItem;
use super::ids::HistoryId;
use super::messages;
use super::presets::{preset_clothing_images, preset_person_images};

/// Wizard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Step {
    #[default]
    SelectPerson,
    SelectClothing,
    Result,
}

impl Step {
    pub fn label(self) -> &'static str {
        match self {
            Self::SelectPerson => messages::STEP_SELECT_PERSON,
            Self::SelectClothing => messages::STEP_SELECT_CLOTHING,
            Self::Result => messages::STEP_RESULT,
        }
    }
}

/// The single operation currently in flight, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    ConvertingPreset,
    GeneratingClothing,
    GeneratingTryOn,
}

impl LoadingState {
    pub fn is_idle(self) -> bool {
        self == Self::Idle
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::Idle => None,
            Self::ConvertingPreset => Some(messages::LOADING_CONVERTING_PRESET),
            Self::GeneratingClothing => Some(messages::LOADING_GENERATING_CLOTHING),
            Self::GeneratingTryOn => Some(messages::LOADING_GENERATING_TRY_ON),
        }
    }
}

/// Complete state of one wizard session.
///
/// All mutation goes through [`WizardState::apply`], which enforces the
/// single-operation guard and the step invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    current_step: Step,
    loading: LoadingState,
    error: Option<String>,
    error_detail: Option<String>,
    person_image: Option<ImageAsset>,
    clothing_image: Option<ImageAsset>,
    result_image: Option<String>,
    prompt: String,
    person_candidates: Vec<ImageAsset>,
    clothing_candidates: Vec<ImageAsset>,
    history: Vec<HistoryItem>,
    // Remote URL -> fetched data URI, so a preset is downloaded at most once per session.
    payload_cache: HashMap<String, String>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::with_candidates(preset_person_images(), preset_clothing_images())
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidates(
        person_candidates: Vec<ImageAsset>,
        clothing_candidates: Vec<ImageAsset>,
    ) -> Self {
        Self {
            current_step: Step::SelectPerson,
            loading: LoadingState::Idle,
            error: None,
            error_detail: None,
            person_image: None,
            clothing_image: None,
            result_image: None,
            prompt: String::new(),
            person_candidates,
            clothing_candidates,
            history: Vec::new(),
            payload_cache: HashMap::new(),
        }
    }

    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub fn loading(&self) -> LoadingState {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Technical description of the last failure, for logs and diagnostics.
    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn person_image(&self) -> Option<&ImageAsset> {
        self.person_image.as_ref()
    }

    pub fn clothing_image(&self) -> Option<&ImageAsset> {
        self.clothing_image.as_ref()
    }

    pub fn result_image(&self) -> Option<&str> {
        self.result_image.as_deref()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn person_candidates(&self) -> &[ImageAsset] {
        &self.person_candidates
    }

    pub fn clothing_candidates(&self) -> &[ImageAsset] {
        &self.clothing_candidates
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn can_go_to(&self, step: Step) -> bool {
        self.loading.is_idle() && self.step_reachable(step)
    }

    pub fn ensure_idle(&self) -> Result<(), Rejection> {
        if self.loading.is_idle() {
            Ok(())
        } else {
            Err(Rejection::Busy {
                active: self.loading,
            })
        }
    }

    /// Applies one action deterministically.
    ///
    /// User intents other than prompt edits are rejected while an operation is
    /// in flight. Completions must match the in-flight operation.
    pub fn apply(&mut self, action: WizardAction) -> TransitionResult {
        if !action.is_completion() && !matches!(action, WizardAction::SetPrompt(_)) {
            self.ensure_idle()?;
        }

        match action {
            WizardAction::SelectPerson(asset) => {
                self.person_image = Some(asset);
                self.current_step = Step::SelectClothing;
                self.clear_error();
                Ok(None)
            }
            WizardAction::SelectClothing(asset) => {
                self.clothing_image = Some(asset);
                self.clear_error();
                Ok(None)
            }
            WizardAction::UploadFailed { message } => {
                self.error = Some(message);
                self.error_detail = None;
                Ok(None)
            }
            WizardAction::SetPrompt(prompt) => {
                self.prompt = prompt;
                Ok(None)
            }
            WizardAction::RequestGarment => self.apply_request_garment(),
            WizardAction::GarmentSynthesized { data_uri } => {
                self.expect_loading(LoadingState::GeneratingClothing)?;
                let asset = ImageAsset::generated(data_uri);
                self.clothing_candidates.insert(0, asset.clone());
                self.clothing_image = Some(asset);
                self.prompt.clear();
                self.loading = LoadingState::Idle;
                Ok(None)
            }
            WizardAction::GarmentFailed { kind, detail } => {
                self.expect_loading(LoadingState::GeneratingClothing)?;
                self.fail(failure_message(kind, messages::GARMENT_FAILED), detail);
                Ok(None)
            }
            WizardAction::RequestTryOn => self.apply_request_try_on(),
            WizardAction::AssetEncoded { slot, data_uri } => {
                self.expect_loading(LoadingState::ConvertingPreset)?;
                self.apply_encoded(slot, data_uri)
            }
            WizardAction::AssetEncodeFailed {
                slot: _,
                message,
                detail,
            } => {
                self.expect_loading(LoadingState::ConvertingPreset)?;
                self.fail(message, detail);
                Ok(None)
            }
            WizardAction::TryOnSynthesized {
                data_uri,
                created_at_unix_seconds,
            } => {
                self.expect_loading(LoadingState::GeneratingTryOn)?;
                self.apply_try_on_result(data_uri, created_at_unix_seconds);
                Ok(None)
            }
            WizardAction::TryOnFailed { kind, detail } => {
                self.expect_loading(LoadingState::GeneratingTryOn)?;
                self.fail(failure_message(kind, messages::TRY_ON_FAILED), detail);
                Ok(None)
            }
            WizardAction::GoToStep(step) => {
                if !self.step_reachable(step) {
                    return Err(Rejection::StepUnavailable(step));
                }
                self.current_step = step;
                Ok(None)
            }
            WizardAction::TryAnotherGarment => {
                if self.current_step != Step::Result {
                    return Err(Rejection::StepUnavailable(Step::SelectClothing));
                }
                // The old composite belongs to the previous garment.
                self.result_image = None;
                self.current_step = Step::SelectClothing;
                Ok(None)
            }
            WizardAction::Reset => {
                self.person_image = None;
                self.clothing_image = None;
                self.result_image = None;
                self.clear_error();
                self.current_step = Step::SelectPerson;
                Ok(None)
            }
        }
    }

    fn apply_request_garment(&mut self) -> TransitionResult {
        if self.prompt.trim().is_empty() {
            return Err(Rejection::EmptyPrompt);
        }

        self.clear_error();
        self.loading = LoadingState::GeneratingClothing;
        Ok(Some(Command::SynthesizeGarment {
            prompt: self.prompt.clone(),
        }))
    }

    fn apply_request_try_on(&mut self) -> TransitionResult {
        if self.person_image.is_none() || self.clothing_image.is_none() {
            return Err(Rejection::MissingSelection {
                person: self.person_image.is_some(),
                clothing: self.clothing_image.is_some(),
            });
        }

        self.clear_error();
        Ok(Some(self.next_try_on_command()))
    }

    fn apply_encoded(&mut self, slot: AssetSlot, data_uri: String) -> TransitionResult {
        let Some(asset) = self.selection(slot) else {
            return Err(Rejection::MissingSelection {
                person: self.person_image.is_some(),
                clothing: self.clothing_image.is_some(),
            });
        };

        let encoded = asset.with_payload(data_uri.clone());
        self.payload_cache.insert(encoded.url.clone(), data_uri);
        *self.selection_mut(slot) = Some(encoded);

        Ok(Some(self.next_try_on_command()))
    }

    /// Fills payloads from the cache, then asks for the first missing one or
    /// starts the composite call once both are present.
    fn next_try_on_command(&mut self) -> Command {
        for slot in [AssetSlot::Person, AssetSlot::Clothing] {
            let Some(asset) = self.selection(slot) else {
                continue;
            };
            if !asset.needs_encoding() {
                continue;
            }

            if let Some(cached) = self.payload_cache.get(&asset.url) {
                let encoded = asset.with_payload(cached.clone());
                *self.selection_mut(slot) = Some(encoded);
                continue;
            }

            let url = asset.url.clone();
            self.loading = LoadingState::ConvertingPreset;
            return Command::EncodeAsset { slot, url };
        }

        self.loading = LoadingState::GeneratingTryOn;
        Command::SynthesizeTryOn {
            person: self.payload_of(AssetSlot::Person),
            garment: self.payload_of(AssetSlot::Clothing),
        }
    }

    fn apply_try_on_result(&mut self, data_uri: String, created_at_unix_seconds: u64) {
        let item = HistoryItem {
            id: HistoryId::generate(),
            person_image: self.display_url_of(AssetSlot::Person),
            clothing_image: self.display_url_of(AssetSlot::Clothing),
            result_image: data_uri.clone(),
            created_at_unix_seconds,
        };

        self.history.insert(0, item);
        self.result_image = Some(data_uri);
        self.current_step = Step::Result;
        self.loading = LoadingState::Idle;
    }

    fn step_reachable(&self, step: Step) -> bool {
        match step {
            Step::SelectPerson => true,
            Step::SelectClothing => self.person_image.is_some(),
            Step::Result => self.result_image.is_some(),
        }
    }

    fn expect_loading(&self, expected: LoadingState) -> Result<(), Rejection> {
        if self.loading == expected {
            Ok(())
        } else {
            Err(Rejection::UnexpectedCompletion {
                loading: self.loading,
            })
        }
    }

    fn selection(&self, slot: AssetSlot) -> Option<&ImageAsset> {
        match slot {
            AssetSlot::Person => self.person_image.as_ref(),
            AssetSlot::Clothing => self.clothing_image.as_ref(),
        }
    }

    fn selection_mut(&mut self, slot: AssetSlot) -> &mut Option<ImageAsset> {
        match slot {
            AssetSlot::Person => &mut self.person_image,
            AssetSlot::Clothing => &mut self.clothing_image,
        }
    }

    fn payload_of(&self, slot: AssetSlot) -> String {
        self.selection(slot)
            .and_then(ImageAsset::payload)
            .unwrap_or_default()
            .to_string()
    }

    fn display_url_of(&self, slot: AssetSlot) -> String {
        self.selection(slot)
            .map(|asset| asset.url.clone())
            .unwrap_or_default()
    }

    fn fail(&mut self, message: impl Into<String>, detail: String) {
        self.error = Some(message.into());
        self.error_detail = Some(detail);
        self.loading = LoadingState::Idle;
    }

    fn clear_error(&mut self) {
        self.error = None;
        self.error_detail = None;
    }
}

fn failure_message(kind: FailureKind, generic: &'static str) -> &'static str {
    match kind {
        FailureKind::Configuration => messages::API_KEY_MISSING,
        FailureKind::Transport | FailureKind::Generation => generic,
    }
}
