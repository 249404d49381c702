use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use snafu::{OptionExt, ResultExt, Snafu};
use tryon_genai::{GenerationClient, GenerationError, shared_config};
use tryon_media::{
    HttpImageFetcher, MediaError, decode_data_uri, extension_for_mime, extract_mime_type,
};
use tryon_wizard::{
    AssetId, AssetSlot, ImageAsset, Rejection, Wizard, WizardState, find_preset,
    preset_clothing_images, preset_person_images,
};

use crate::settings::{AppSettings, SettingsError, SettingsStore};

#[derive(Parser, Debug)]
#[command(name = "tryon", version, about = "Virtual try-on from the command line")]
pub struct Cli {
    /// Settings file to use instead of the per-user default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the built-in person and garment images.
    Presets,
    /// Design a garment from a text description.
    Garment(GarmentArgs),
    /// Dress a person in a garment and save the composite.
    Compose(ComposeArgs),
    /// Show or change the saved settings.
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct GarmentArgs {
    /// Garment description, e.g. "red silk evening gown".
    pub prompt: String,

    /// Output image path.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct ComposeArgs {
    /// Person image: local file, http(s) URL or preset id (`preset:p1` forces the preset).
    #[arg(long)]
    pub person: String,

    /// Garment image: local file, http(s) URL or preset id.
    #[arg(long, required_unless_present = "prompt", conflicts_with = "prompt")]
    pub garment: Option<String>,

    /// Design the garment from this description instead.
    #[arg(long)]
    pub prompt: Option<String>,

    /// Output image path.
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[arg(long)]
    pub api_key: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub endpoint: Option<String>,
}

impl ConfigArgs {
    fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.model.is_none() && self.endpoint.is_none()
    }
}

pub const PRESET_PREFIX: &str = "preset:";

/// Where a command-line image argument points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Preset(ImageAsset),
    Remote(String),
    File(PathBuf),
}

impl ImageSource {
    pub fn parse(raw: &str) -> Self {
        Self::parse_in(raw, Path::new(""))
    }

    /// Resolves `raw` against `base_dir`. An existing file shadows a bare
    /// preset id; `preset:<id>` always names the preset.
    pub fn parse_in(raw: &str, base_dir: &Path) -> Self {
        let raw = raw.trim();
        if let Some(asset) = raw.strip_prefix(PRESET_PREFIX).and_then(find_preset) {
            return Self::Preset(asset);
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Self::Remote(raw.to_string());
        }

        let path = base_dir.join(raw);
        if path.exists() {
            return Self::File(path);
        }
        match find_preset(raw) {
            Some(asset) => Self::Preset(asset),
            None => Self::File(path),
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("settings error on `{stage}`: {source}"))]
    Settings {
        stage: &'static str,
        source: SettingsError,
    },
    #[snafu(display("failed to set up generation client on `{stage}`: {source}"))]
    SetupGenerator {
        stage: &'static str,
        source: GenerationError,
    },
    #[snafu(display("failed to set up image fetcher on `{stage}`: {source}"))]
    SetupFetcher {
        stage: &'static str,
        source: MediaError,
    },
    #[snafu(display("request rejected on `{stage}`: {source}"))]
    Rejected {
        stage: &'static str,
        source: Rejection,
    },
    #[snafu(display("{message}"))]
    WizardFailed {
        stage: &'static str,
        message: String,
        detail: Option<String>,
    },
    #[snafu(display("wizard finished without an image on `{stage}`"))]
    MissingImage { stage: &'static str },
    #[snafu(display("generated image is unreadable on `{stage}`: {source}"))]
    DecodeImage {
        stage: &'static str,
        source: MediaError,
    },
    #[snafu(display("failed to write {path:?} on `{stage}`: {source}"))]
    WriteOutput {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CliError {
    /// Technical detail worth printing under the user-facing message.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::WizardFailed { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let store = match cli.config {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::load(),
    };

    match cli.cmd {
        Command::Presets => {
            print_presets();
            Ok(())
        }
        Command::Garment(args) => cmd_garment(&store, args).await,
        Command::Compose(args) => cmd_compose(&store, args).await,
        Command::Config(args) => cmd_config(&store, args),
    }
}

fn print_presets() {
    for (slot, assets) in [
        ("person", preset_person_images()),
        ("clothing", preset_clothing_images()),
    ] {
        for asset in assets {
            println!("{:<4} {slot:<9} {}", asset.id.as_str(), asset.url);
        }
    }
}

async fn cmd_garment(store: &SettingsStore, args: GarmentArgs) -> Result<(), CliError> {
    let mut wizard = build_wizard(&store.settings())?;

    wizard
        .set_prompt(args.prompt)
        .await
        .context(RejectedSnafu { stage: "set-prompt" })?;
    wizard
        .generate_garment()
        .await
        .context(RejectedSnafu {
            stage: "generate-garment",
        })?;
    ensure_no_error(wizard.state(), "generate-garment")?;

    let garment = wizard
        .state()
        .clothing_image()
        .and_then(ImageAsset::payload)
        .context(MissingImageSnafu {
            stage: "read-garment",
        })?;
    write_image(garment, &args.out).await
}

async fn cmd_compose(store: &SettingsStore, args: ComposeArgs) -> Result<(), CliError> {
    let mut wizard = build_wizard(&store.settings())?;

    select(&mut wizard, AssetSlot::Person, ImageSource::parse(&args.person)).await?;
    ensure_no_error(wizard.state(), "select-person")?;

    match (args.prompt, args.garment) {
        (Some(prompt), _) => {
            wizard
                .set_prompt(prompt)
                .await
                .context(RejectedSnafu { stage: "set-prompt" })?;
            wizard.generate_garment().await.context(RejectedSnafu {
                stage: "generate-garment",
            })?;
            ensure_no_error(wizard.state(), "generate-garment")?;
        }
        (None, Some(garment)) => {
            select(&mut wizard, AssetSlot::Clothing, ImageSource::parse(&garment)).await?;
            ensure_no_error(wizard.state(), "select-clothing")?;
        }
        (None, None) => {}
    }

    wizard
        .try_on()
        .await
        .context(RejectedSnafu { stage: "try-on" })?;
    ensure_no_error(wizard.state(), "try-on")?;

    let result = wizard.state().result_image().context(MissingImageSnafu {
        stage: "read-result",
    })?;
    write_image(result, &args.out).await
}

fn cmd_config(store: &SettingsStore, args: ConfigArgs) -> Result<(), CliError> {
    if args.is_empty() {
        print_settings(store.config_path(), &store.settings());
        return Ok(());
    }

    let mut settings = store.persisted();
    if let Some(api_key) = args.api_key {
        settings.api_key = api_key;
    }
    if let Some(model) = args.model {
        settings.model = model;
    }
    if let Some(endpoint) = args.endpoint {
        settings.endpoint = endpoint;
    }

    store.update(settings).context(SettingsSnafu {
        stage: "update-settings",
    })?;
    println!("saved {}", store.config_path().display());
    Ok(())
}

fn print_settings(path: &Path, settings: &AppSettings) {
    println!("file:            {}", path.display());
    println!("api_key:         {}", settings.masked_api_key());
    println!("endpoint:        {}", settings.endpoint);
    println!("model:           {}", settings.model);
    println!("request timeout: {}s", settings.request_timeout_secs);
    println!("fetch timeout:   {}s", settings.fetch_timeout_secs);
}

fn build_wizard(settings: &AppSettings) -> Result<Wizard, CliError> {
    if !settings.has_api_key() {
        tracing::warn!("no API key configured; set one with `tryon config --api-key`");
    }

    let generator = GenerationClient::new(shared_config(settings.to_generation_config()))
        .context(SetupGeneratorSnafu {
            stage: "build-generation-client",
        })?;
    let fetcher = HttpImageFetcher::with_timeout(settings.fetch_timeout()).context(
        SetupFetcherSnafu {
            stage: "build-image-fetcher",
        },
    )?;

    Ok(Wizard::new(Arc::new(generator), Arc::new(fetcher)))
}

async fn select(wizard: &mut Wizard, slot: AssetSlot, source: ImageSource) -> Result<(), CliError> {
    let asset = match source {
        ImageSource::Preset(asset) => asset,
        ImageSource::Remote(url) => {
            ImageAsset::preset(AssetId::generate_with_prefix("remote"), url)
        }
        ImageSource::File(path) => {
            return wizard
                .upload(slot, &path)
                .await
                .context(RejectedSnafu { stage: "upload" });
        }
    };

    let selected = match slot {
        AssetSlot::Person => wizard.select_person(asset).await,
        AssetSlot::Clothing => wizard.select_clothing(asset).await,
    };
    selected.context(RejectedSnafu { stage: "select" })
}

fn ensure_no_error(state: &WizardState, stage: &'static str) -> Result<(), CliError> {
    match state.error() {
        Some(message) => WizardFailedSnafu {
            stage,
            message: message.to_string(),
            detail: state.error_detail().map(str::to_string),
        }
        .fail(),
        None => Ok(()),
    }
}

/// Appends the extension matching the image type when `path` has none.
fn output_path(data_uri: &str, path: &Path) -> PathBuf {
    if path.extension().is_some() {
        return path.to_path_buf();
    }
    path.with_extension(extension_for_mime(extract_mime_type(data_uri)))
}

async fn write_image(data_uri: &str, path: &Path) -> Result<(), CliError> {
    let path = &output_path(data_uri, path);
    let bytes = decode_data_uri(data_uri).context(DecodeImageSnafu {
        stage: "decode-output-image",
    })?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .context(WriteOutputSnafu {
                stage: "create-output-directory",
                path: parent.to_path_buf(),
            })?;
    }

    tokio::fs::write(path, &bytes).await.context(WriteOutputSnafu {
        stage: "write-output-image",
        path: path.to_path_buf(),
    })?;

    tracing::info!(?path, bytes = bytes.len(), "wrote image");
    Ok(())
}
