//! Image service request/response types for API versions 1 and 2

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Image API version the client speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ApiVersion {
    #[default]
    #[value(name = "1")]
    V1,
    #[value(name = "2")]
    V2,
}

impl ApiVersion {
    /// Path segment appended to the catalog endpoint (`v1`, `v2`)
    pub fn path_segment(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiVersion::V1 => write!(f, "1"),
            ApiVersion::V2 => write!(f, "2"),
        }
    }
}

/// Version 2 image visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn from_public_flag(is_public: bool) -> Self {
        if is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Image record as returned by `GET /v1/images/detail`
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ImageV1 {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub disk_format: Option<String>,
    #[serde(default)]
    pub container_format: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub min_disk: u64,
    #[serde(default)]
    pub min_ram: u64,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Response from `GET /v1/images/detail`
#[derive(Debug, Deserialize)]
pub struct ImagesV1Response {
    pub images: Vec<ImageV1>,
}

/// Response from `GET /v2/images`
#[derive(Debug, Deserialize)]
pub struct ImagesV2Response {
    pub images: Vec<Value>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Body of `POST /v2/images`
#[derive(Debug, Serialize)]
pub struct CreateImageV2Request<'a> {
    pub name: &'a str,
    pub disk_format: &'a str,
    pub container_format: &'a str,
    pub visibility: Visibility,
}

/// Response from `POST /v2/images` (only the field the import step needs)
#[derive(Debug, Deserialize)]
pub struct CreatedImageV2 {
    pub id: String,
}

/// Body of `POST /v2/images/{id}/import`
#[derive(Debug, Serialize)]
pub struct ImportImageRequest<'a> {
    pub method: ImportMethod<'a>,
}

#[derive(Debug, Serialize)]
pub struct ImportMethod<'a> {
    pub name: &'static str,
    pub uri: &'a str,
}

impl<'a> ImportImageRequest<'a> {
    pub fn web_download(uri: &'a str) -> Self {
        Self {
            method: ImportMethod {
                name: "web-download",
                uri,
            },
        }
    }
}

/// An entry of an image listing, shaped by the API version that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum ListedImage {
    /// Typed version 1 record, reported as its attribute mapping
    V1(ImageV1),
    /// Raw version 2 entry, reported unchanged
    V2(Value),
}

impl ListedImage {
    pub fn name(&self) -> Option<&str> {
        match self {
            ListedImage::V1(image) => image.name.as_deref(),
            ListedImage::V2(value) => value.get("name").and_then(Value::as_str),
        }
    }

    fn str_field(&self, field: &str) -> Option<String> {
        match self {
            ListedImage::V1(image) => match field {
                "id" => Some(image.id.clone()),
                "status" => image.status.clone(),
                "disk_format" => image.disk_format.clone(),
                "container_format" => image.container_format.clone(),
                "visibility" => Some(Visibility::from_public_flag(image.is_public).to_string()),
                _ => None,
            },
            ListedImage::V2(value) => value.get(field).and_then(Value::as_str).map(str::to_string),
        }
    }

    pub fn id(&self) -> Option<String> {
        self.str_field("id")
    }

    pub fn status(&self) -> Option<String> {
        self.str_field("status")
    }

    pub fn disk_format(&self) -> Option<String> {
        self.str_field("disk_format")
    }

    pub fn container_format(&self) -> Option<String> {
        self.str_field("container_format")
    }

    /// `public`/`private`, derived from `is_public` for version 1 records
    pub fn visibility(&self) -> Option<String> {
        self.str_field("visibility")
    }

    /// Descriptor reported in the `glance_images` fact
    pub fn into_fact(self) -> serde_json::Result<Value> {
        match self {
            ListedImage::V1(image) => serde_json::to_value(image),
            ListedImage::V2(value) => Ok(value),
        }
    }
}

/// Remote-sourced image to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub name: String,
    pub url: String,
    pub disk_format: String,
    pub container_format: String,
}

/// A creation call, with the public flag already expressed in the
/// vocabulary of the target API version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewImage {
    V1 { image: ImageSource, is_public: bool },
    V2 { image: ImageSource, visibility: Visibility },
}

impl NewImage {
    pub fn for_version(version: ApiVersion, image: ImageSource, is_public: bool) -> Self {
        match version {
            ApiVersion::V1 => NewImage::V1 { image, is_public },
            ApiVersion::V2 => NewImage::V2 {
                image,
                visibility: Visibility::from_public_flag(is_public),
            },
        }
    }

    pub fn source(&self) -> &ImageSource {
        match self {
            NewImage::V1 { image, .. } | NewImage::V2 { image, .. } => image,
        }
    }
}
