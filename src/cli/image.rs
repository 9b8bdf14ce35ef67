use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::glance::{ApiVersion, ImageSource, ListedImage, NewImage};
use crate::bootstrap::{self, SessionContext};
use crate::credentials::CredentialSet;
use crate::error::ModuleError;
use crate::identity::IdentitySessionProvider;
use crate::image::ImageCatalogClient;

/// Supported operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CommandName {
    /// List every image known to the image service
    ImageList,
    /// Create an image from a URL unless one with the same name exists
    ImageCreate,
}

/// Parameters shared by both operations
#[derive(Debug, Clone, Args)]
pub struct ImageArgs {
    /// Path to the openrc file holding the OS_* credentials
    #[arg(long)]
    pub openrc_path: PathBuf,

    /// Image name (required for image-create)
    #[arg(long)]
    pub image_name: Option<String>,

    /// URL the image data is copied from (required for image-create)
    #[arg(long)]
    pub image_url: Option<String>,

    /// Disk format, e.g. qcow2 or raw (required for image-create)
    #[arg(long)]
    pub image_disk_format: Option<String>,

    /// Container format, e.g. bare (required for image-create)
    #[arg(long)]
    pub image_container_format: Option<String>,

    /// Make the created image public
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub image_is_public: Option<bool>,

    /// Image API version
    #[arg(long, value_enum, default_value_t = ApiVersion::V1)]
    pub api_version: ApiVersion,
}

/// Parameters of an image-create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub image: ImageSource,
    pub is_public: bool,
}

/// A validated command, ready to dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ImageList,
    ImageCreate(CreateParams),
}

impl Command {
    /// Validate the parameters required by `name`. Nothing is read or
    /// contacted here.
    pub fn from_args(name: CommandName, args: &ImageArgs) -> Result<Self, ModuleError> {
        match name {
            CommandName::ImageList => Ok(Command::ImageList),
            CommandName::ImageCreate => {
                let required = [
                    ("image_name", &args.image_name),
                    ("image_url", &args.image_url),
                    ("image_disk_format", &args.image_disk_format),
                    ("image_container_format", &args.image_container_format),
                ];
                let missing: Vec<&'static str> = required
                    .iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| *name)
                    .collect();
                if !missing.is_empty() {
                    return Err(ModuleError::MissingArguments(missing));
                }

                let [name, url, disk_format, container_format] =
                    required.map(|(_, value)| value.clone().unwrap_or_default());
                Ok(Command::ImageCreate(CreateParams {
                    image: ImageSource {
                        name,
                        url,
                        disk_format,
                        container_format,
                    },
                    is_public: args.image_is_public.unwrap_or(false),
                }))
            }
        }
    }
}

/// Facts reported back to the caller
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ImageFacts {
    pub glance_images: BTreeMap<String, Value>,
}

/// Outcome of a completed command
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModuleResult {
    pub changed: bool,
    pub ansible_facts: ImageFacts,
    /// Listing behind the facts, kept for table output
    #[serde(skip)]
    pub images: Vec<ListedImage>,
}

impl ModuleResult {
    fn from_listing(changed: bool, images: Vec<ListedImage>) -> Result<Self> {
        let mut glance_images = BTreeMap::new();
        let mut named = Vec::with_capacity(images.len());
        for image in images {
            let Some(name) = image.name().map(str::to_string) else {
                debug!(image_id = ?image.id(), "Skipping image without a name");
                continue;
            };
            named.push(image.clone());
            glance_images.insert(name, image.into_fact()?);
        }
        Ok(Self {
            changed,
            ansible_facts: ImageFacts { glance_images },
            images: named,
        })
    }
}

/// Run a validated command against the image catalog
pub async fn dispatch(command: &Command, client: &dyn ImageCatalogClient) -> Result<ModuleResult> {
    match command {
        Command::ImageList => image_list(client).await,
        Command::ImageCreate(params) => image_create(client, params).await,
    }
}

async fn image_list(client: &dyn ImageCatalogClient) -> Result<ModuleResult> {
    let images = client.list_images().await?;
    info!(count = images.len(), "Listed images");
    ModuleResult::from_listing(false, images)
}

async fn image_create(
    client: &dyn ImageCatalogClient,
    params: &CreateParams,
) -> Result<ModuleResult> {
    let existing = client.list_images().await?;
    if existing
        .iter()
        .any(|image| image.name() == Some(params.image.name.as_str()))
    {
        info!(image = %params.image.name, "Image already exists, nothing to do");
        return ModuleResult::from_listing(false, existing);
    }

    let new_image = NewImage::for_version(
        client.api_version(),
        params.image.clone(),
        params.is_public,
    );
    client.create_image(&new_image).await?;

    let images = client.list_images().await?;
    ModuleResult::from_listing(true, images)
}

/// Full invocation: validate, resolve credentials, open a session, then
/// dispatch against the client `connect` builds for that session.
pub async fn execute<F, C>(
    name: CommandName,
    args: &ImageArgs,
    identity: &dyn IdentitySessionProvider,
    connect: F,
) -> Result<ModuleResult, ModuleError>
where
    F: FnOnce(&SessionContext, ApiVersion) -> C,
    C: ImageCatalogClient,
{
    let command = Command::from_args(name, args)?;
    let credentials = CredentialSet::from_file(&args.openrc_path)?.auth_credentials()?;
    let session = bootstrap::establish_session(identity, &credentials).await?;
    let client = connect(&session, args.api_version);
    dispatch(&command, &client)
        .await
        .map_err(ModuleError::Runtime)
}
