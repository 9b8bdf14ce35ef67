//! Test doubles for the identity and image capabilities

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use serde_json::json;

use crate::api::glance::{ApiVersion, ImageV1, ListedImage, NewImage};
use crate::api::keystone::{CatalogEndpoint, CatalogEntry};
use crate::credentials::AuthCredentials;
use crate::identity::{IdentitySession, IdentitySessionProvider, ServiceCatalog};
use crate::image::ImageCatalogClient;

/// Serve `app` on an ephemeral local port and return its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// Identity provider returning a fixed session, or failing
pub struct FakeIdentity {
    outcome: Result<IdentitySession, String>,
    calls: Mutex<usize>,
}

impl FakeIdentity {
    pub fn with_image_endpoint(internal_url: &str) -> Self {
        let catalog = ServiceCatalog::new(vec![CatalogEntry {
            service_type: "image".to_string(),
            endpoints: vec![CatalogEndpoint {
                region: Some("RegionOne".to_string()),
                public_url: Some("http://public.example:9292".to_string()),
                internal_url: Some(internal_url.to_string()),
                admin_url: None,
            }],
        }]);
        Self {
            outcome: Ok(IdentitySession {
                token: "fake-token".to_string(),
                catalog,
            }),
            calls: Mutex::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl IdentitySessionProvider for FakeIdentity {
    async fn authenticate(&self, _credentials: &AuthCredentials) -> Result<IdentitySession> {
        *self.calls.lock().unwrap() += 1;
        self.outcome.clone().map_err(|message| anyhow::anyhow!(message))
    }
}

/// In-memory image catalog that records creation calls.
///
/// Clones share state, so a test can keep a handle after passing one on.
#[derive(Clone)]
pub struct FakeCatalog {
    version: ApiVersion,
    images: Arc<Mutex<Vec<ListedImage>>>,
    created: Arc<Mutex<Vec<NewImage>>>,
    fail_listing: bool,
}

impl FakeCatalog {
    pub fn new(version: ApiVersion) -> Self {
        Self {
            version,
            images: Arc::new(Mutex::new(Vec::new())),
            created: Arc::new(Mutex::new(Vec::new())),
            fail_listing: false,
        }
    }

    pub fn failing_listing(version: ApiVersion) -> Self {
        Self {
            fail_listing: true,
            ..Self::new(version)
        }
    }

    pub fn with_image(self, name: &str) -> Self {
        let image = match self.version {
            ApiVersion::V1 => ListedImage::V1(ImageV1 {
                id: format!("id-{}", name),
                name: Some(name.to_string()),
                status: Some("active".to_string()),
                ..Default::default()
            }),
            ApiVersion::V2 => ListedImage::V2(json!({
                "id": format!("id-{}", name),
                "name": name,
                "status": "active",
                "visibility": "private"
            })),
        };
        self.images.lock().unwrap().push(image);
        self
    }

    pub fn created(&self) -> Vec<NewImage> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageCatalogClient for FakeCatalog {
    fn api_version(&self) -> ApiVersion {
        self.version
    }

    async fn list_images(&self) -> Result<Vec<ListedImage>> {
        if self.fail_listing {
            anyhow::bail!("Failed to list images (status 503 Service Unavailable): ");
        }
        Ok(self.images.lock().unwrap().clone())
    }

    async fn create_image(&self, new_image: &NewImage) -> Result<()> {
        self.created.lock().unwrap().push(new_image.clone());
        let source = new_image.source();
        let image = match new_image {
            NewImage::V1 { is_public, .. } => ListedImage::V1(ImageV1 {
                id: format!("id-{}", source.name),
                name: Some(source.name.clone()),
                status: Some("queued".to_string()),
                disk_format: Some(source.disk_format.clone()),
                container_format: Some(source.container_format.clone()),
                is_public: *is_public,
                ..Default::default()
            }),
            NewImage::V2 { visibility, .. } => ListedImage::V2(json!({
                "id": format!("id-{}", source.name),
                "name": source.name,
                "status": "queued",
                "disk_format": source.disk_format,
                "container_format": source.container_format,
                "visibility": visibility.to_string()
            })),
        };
        self.images.lock().unwrap().push(image);
        Ok(())
    }
}
