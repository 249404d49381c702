use std::path::Path;
use std::sync::Arc;

use tryon_genai::ImageGenerator;
use tryon_media::{ImageFetcher, encode_file_as_data_uri};

use super::action::{Command, Rejection, WizardAction};
use super::asset::{AssetSlot, ImageAsset};
use super::history::now_unix_seconds;
use super::state::{Step, WizardState};

/// Runs the wizard: feeds actions to the reducer and executes the commands it
/// emits until the session is idle again.
///
/// Operations run to completion one at a time; a failure always lands in
/// [`WizardState::error`] instead of being returned.
pub struct Wizard {
    state: WizardState,
    generator: Arc<dyn ImageGenerator>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl Wizard {
    pub fn new(generator: Arc<dyn ImageGenerator>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with_state(WizardState::new(), generator, fetcher)
    }

    pub fn with_state(
        state: WizardState,
        generator: Arc<dyn ImageGenerator>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            state,
            generator,
            fetcher,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Applies an action and drives every resulting command to completion.
    pub async fn dispatch(&mut self, action: WizardAction) -> Result<(), Rejection> {
        let mut next = self.state.apply(action)?;

        while let Some(command) = next {
            if let Some(progress) = self.state.loading().label() {
                tracing::info!(
                    step = self.state.current_step().label(),
                    progress,
                    "wizard progress"
                );
            }
            let completion = self.run(command).await;
            next = self.state.apply(completion)?;
        }

        if let Some(error) = self.state.error() {
            tracing::warn!(
                step = self.state.current_step().label(),
                error,
                detail = self.state.error_detail().unwrap_or_default(),
                "wizard operation ended with an error"
            );
        }

        Ok(())
    }

    pub async fn select_person(&mut self, asset: ImageAsset) -> Result<(), Rejection> {
        self.dispatch(WizardAction::SelectPerson(asset)).await
    }

    pub async fn select_clothing(&mut self, asset: ImageAsset) -> Result<(), Rejection> {
        self.dispatch(WizardAction::SelectClothing(asset)).await
    }

    /// Reads a local image and selects it for `slot`.
    ///
    /// Read failures become the wizard error rather than a rejection.
    pub async fn upload(
        &mut self,
        slot: AssetSlot,
        path: impl AsRef<Path>,
    ) -> Result<(), Rejection> {
        self.state.ensure_idle()?;

        let action = match encode_file_as_data_uri(path.as_ref()).await {
            Ok(data_uri) => {
                let asset = ImageAsset::uploaded(data_uri);
                match slot {
                    AssetSlot::Person => WizardAction::SelectPerson(asset),
                    AssetSlot::Clothing => WizardAction::SelectClothing(asset),
                }
            }
            Err(error) => {
                tracing::warn!(?slot, error = %error, "image upload failed");
                WizardAction::UploadFailed {
                    message: error.user_message().to_string(),
                }
            }
        };

        self.dispatch(action).await
    }

    pub async fn set_prompt(&mut self, prompt: impl Into<String>) -> Result<(), Rejection> {
        self.dispatch(WizardAction::SetPrompt(prompt.into())).await
    }

    pub async fn generate_garment(&mut self) -> Result<(), Rejection> {
        self.dispatch(WizardAction::RequestGarment).await
    }

    pub async fn try_on(&mut self) -> Result<(), Rejection> {
        self.dispatch(WizardAction::RequestTryOn).await
    }

    pub async fn go_to_step(&mut self, step: Step) -> Result<(), Rejection> {
        self.dispatch(WizardAction::GoToStep(step)).await
    }

    pub async fn try_another_garment(&mut self) -> Result<(), Rejection> {
        self.dispatch(WizardAction::TryAnotherGarment).await
    }

    pub async fn reset(&mut self) -> Result<(), Rejection> {
        self.dispatch(WizardAction::Reset).await
    }

    async fn run(&self, command: Command) -> WizardAction {
        match command {
            Command::SynthesizeGarment { prompt } => {
                match self.generator.synthesize_garment(&prompt).await {
                    Ok(data_uri) => WizardAction::GarmentSynthesized { data_uri },
                    Err(error) => WizardAction::GarmentFailed {
                        kind: error.kind(),
                        detail: error.to_string(),
                    },
                }
            }
            Command::EncodeAsset { slot, url } => {
                match self.fetcher.fetch_and_encode_as_data_uri(&url).await {
                    Ok(data_uri) => WizardAction::AssetEncoded { slot, data_uri },
                    Err(error) => WizardAction::AssetEncodeFailed {
                        slot,
                        message: error.user_message().to_string(),
                        detail: error.to_string(),
                    },
                }
            }
            Command::SynthesizeTryOn { person, garment } => {
                match self.generator.synthesize_try_on(&person, &garment).await {
                    Ok(data_uri) => WizardAction::TryOnSynthesized {
                        data_uri,
                        created_at_unix_seconds: now_unix_seconds(),
                    },
                    Err(error) => WizardAction::TryOnFailed {
                        kind: error.kind(),
                        detail: error.to_string(),
                    },
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::future::BoxFuture;
    use tryon_genai::{GenerationError, GenerationResult};
    use tryon_media::{MediaError, MediaResult, REMOTE_IMAGE_HINT};

    use super::*;
    use crate::asset::AssetOrigin;
    use crate::messages;
    use crate::state::LoadingState;

    const GOWN_URI: &str = "data:image/png;base64,R09XTg==";
    const RESULT_URI: &str = "data:image/png;base64,UkVTVUxU";
    const FETCHED_URI: &str = "data:image/jpeg;base64,RkVUQ0hFRA==";

    #[derive(Clone, Copy)]
    enum TryOnReply {
        Image,
        TextOnly,
    }

    struct FakeGenerator {
        try_on_reply: TryOnReply,
        garment_calls: AtomicUsize,
        try_on_calls: Mutex<Vec<(String, String)>>,
    }

    impl FakeGenerator {
        fn new(try_on_reply: TryOnReply) -> Arc<Self> {
            Arc::new(Self {
                try_on_reply,
                garment_calls: AtomicUsize::new(0),
                try_on_calls: Mutex::new(Vec::new()),
            })
        }

        fn try_on_calls(&self) -> Vec<(String, String)> {
            self.try_on_calls.lock().unwrap().clone()
        }
    }

    impl ImageGenerator for FakeGenerator {
        fn synthesize_garment<'a>(
            &'a self,
            _prompt: &'a str,
        ) -> BoxFuture<'a, GenerationResult<String>> {
            self.garment_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(GOWN_URI.to_string()) })
        }

        fn synthesize_try_on<'a>(
            &'a self,
            person_data_uri: &'a str,
            garment_data_uri: &'a str,
        ) -> BoxFuture<'a, GenerationResult<String>> {
            self.try_on_calls
                .lock()
                .unwrap()
                .push((person_data_uri.to_string(), garment_data_uri.to_string()));
            let reply = self.try_on_reply;
            Box::pin(async move {
                match reply {
                    TryOnReply::Image => Ok(RESULT_URI.to_string()),
                    TryOnReply::TextOnly => Err(GenerationError::NoImageWithText {
                        stage: "fake",
                        excerpt: "I cannot process this request".to_string(),
                    }),
                }
            })
        }
    }

    struct FakeFetcher {
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                fail,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ImageFetcher for FakeFetcher {
        fn fetch_and_encode_as_data_uri<'a>(
            &'a self,
            url: &'a str,
        ) -> BoxFuture<'a, MediaResult<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(MediaError::FetchStatus {
                        stage: "fake",
                        url: url.to_string(),
                        status: 403,
                    })
                } else {
                    Ok(FETCHED_URI.to_string())
                }
            })
        }
    }

    fn wizard(generator: &Arc<FakeGenerator>, fetcher: &Arc<FakeFetcher>) -> Wizard {
        Wizard::new(generator.clone(), fetcher.clone())
    }

    #[tokio::test]
    async fn prompt_to_selected_garment() {
        let generator = FakeGenerator::new(TryOnReply::Image);
        let fetcher = FakeFetcher::new(false);
        let mut wizard = wizard(&generator, &fetcher);

        wizard.set_prompt("red silk evening gown").await.unwrap();
        wizard.generate_garment().await.unwrap();

        let state = wizard.state();
        let selected = state.clothing_image().unwrap();
        assert_eq!(selected.origin, AssetOrigin::Generated);
        assert_eq!(selected.url, GOWN_URI);
        assert_eq!(&state.clothing_candidates()[0], selected);
        assert!(state.loading().is_idle());
        assert_eq!(generator.garment_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn preset_pair_is_encoded_once_each_before_composite() {
        let generator = FakeGenerator::new(TryOnReply::Image);
        let fetcher = FakeFetcher::new(false);
        let mut wizard = wizard(&generator, &fetcher);

        let person = wizard.state().person_candidates()[0].clone();
        let garment = wizard.state().clothing_candidates()[1].clone();
        wizard.select_person(person).await.unwrap();
        wizard.select_clothing(garment).await.unwrap();
        wizard.try_on().await.unwrap();

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(
            generator.try_on_calls(),
            vec![(FETCHED_URI.to_string(), FETCHED_URI.to_string())]
        );

        let state = wizard.state();
        assert_eq!(state.current_step(), Step::Result);
        assert_eq!(state.history().len(), 1);
        // History shows what the user saw, not the fetched payload.
        assert!(state.history()[0].person_image.starts_with("https://"));
    }

    #[tokio::test]
    async fn repeated_try_on_does_not_refetch() {
        let generator = FakeGenerator::new(TryOnReply::Image);
        let fetcher = FakeFetcher::new(false);
        let mut wizard = wizard(&generator, &fetcher);

        let person = wizard.state().person_candidates()[2].clone();
        wizard.select_person(person).await.unwrap();
        wizard.set_prompt("denim jacket").await.unwrap();
        wizard.generate_garment().await.unwrap();
        wizard.try_on().await.unwrap();
        wizard.try_another_garment().await.unwrap();
        wizard.try_on().await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert_eq!(generator.try_on_calls().len(), 2);
        assert_eq!(wizard.state().history().len(), 2);
    }

    #[tokio::test]
    async fn text_only_reply_surfaces_generic_error() {
        let generator = FakeGenerator::new(TryOnReply::TextOnly);
        let fetcher = FakeFetcher::new(false);
        let mut wizard = wizard(&generator, &fetcher);

        wizard
            .select_person(ImageAsset::uploaded("data:image/png;base64,UA=="))
            .await
            .unwrap();
        wizard
            .select_clothing(ImageAsset::uploaded("data:image/png;base64,Rw=="))
            .await
            .unwrap();
        wizard.try_on().await.unwrap();

        let state = wizard.state();
        assert_eq!(state.error(), Some(messages::TRY_ON_FAILED));
        assert!(state.error_detail().unwrap().contains("I cannot process"));
        assert_eq!(state.loading(), LoadingState::Idle);
        assert_eq!(state.current_step(), Step::SelectClothing);
        assert!(state.history().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_aborts_before_composite() {
        let generator = FakeGenerator::new(TryOnReply::Image);
        let fetcher = FakeFetcher::new(true);
        let mut wizard = wizard(&generator, &fetcher);

        let person = wizard.state().person_candidates()[0].clone();
        wizard.select_person(person).await.unwrap();
        wizard
            .select_clothing(ImageAsset::uploaded("data:image/png;base64,Rw=="))
            .await
            .unwrap();
        wizard.try_on().await.unwrap();

        assert_eq!(fetcher.calls(), 1);
        assert!(generator.try_on_calls().is_empty());
        assert_eq!(wizard.state().error(), Some(REMOTE_IMAGE_HINT));
        assert!(wizard.state().loading().is_idle());
    }

    #[tokio::test]
    async fn try_on_without_selection_makes_no_calls() {
        let generator = FakeGenerator::new(TryOnReply::Image);
        let fetcher = FakeFetcher::new(false);
        let mut wizard = wizard(&generator, &fetcher);
        let before = wizard.state().clone();

        let rejection = wizard.try_on().await.unwrap_err();

        assert!(matches!(rejection, Rejection::MissingSelection { .. }));
        assert_eq!(wizard.state(), &before);
        assert_eq!(fetcher.calls(), 0);
        assert!(generator.try_on_calls().is_empty());
    }

    #[tokio::test]
    async fn reset_after_result_keeps_history() {
        let generator = FakeGenerator::new(TryOnReply::Image);
        let fetcher = FakeFetcher::new(false);
        let mut wizard = wizard(&generator, &fetcher);

        wizard
            .select_person(ImageAsset::uploaded("data:image/png;base64,UA=="))
            .await
            .unwrap();
        wizard
            .select_clothing(ImageAsset::uploaded("data:image/png;base64,Rw=="))
            .await
            .unwrap();
        wizard.try_on().await.unwrap();
        wizard.reset().await.unwrap();

        let state = wizard.state();
        assert_eq!(state.current_step(), Step::SelectPerson);
        assert!(state.person_image().is_none());
        assert!(state.clothing_image().is_none());
        assert!(state.result_image().is_none());
        assert_eq!(state.history().len(), 1);
    }

    #[tokio::test]
    async fn upload_reads_local_file() {
        let generator = FakeGenerator::new(TryOnReply::Image);
        let fetcher = FakeFetcher::new(false);
        let mut wizard = wizard(&generator, &fetcher);

        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"person-bytes").unwrap();

        wizard.upload(AssetSlot::Person, file.path()).await.unwrap();

        let person = wizard.state().person_image().unwrap();
        assert_eq!(person.origin, AssetOrigin::Upload);
        assert!(person.url.starts_with("data:image/png;base64,"));
        assert_eq!(wizard.state().current_step(), Step::SelectClothing);
    }

    #[tokio::test]
    async fn failed_upload_sets_error_only() {
        let generator = FakeGenerator::new(TryOnReply::Image);
        let fetcher = FakeFetcher::new(false);
        let mut wizard = wizard(&generator, &fetcher);
        let dir = tempfile::tempdir().unwrap();

        wizard
            .upload(AssetSlot::Clothing, dir.path().join("missing.jpg"))
            .await
            .unwrap();

        assert_eq!(wizard.state().error(), Some(tryon_media::LOCAL_IMAGE_HINT));
        assert!(wizard.state().clothing_image().is_none());
    }
}
