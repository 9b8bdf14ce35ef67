//! Image catalog access for API versions 1 and 2

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, info, warn};
use url::Url;

use crate::api::glance::{
    ApiVersion, CreateImageV2Request, CreatedImageV2, ImageSource, ImagesV1Response,
    ImagesV2Response, ImportImageRequest, ListedImage, NewImage, Visibility,
};
use crate::bootstrap::SessionContext;

/// Page size requested when listing images
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Operations the dispatcher needs from the image service
#[async_trait]
pub trait ImageCatalogClient: Send + Sync {
    /// API version this client speaks
    fn api_version(&self) -> ApiVersion;

    /// Every image visible to the session, across all pages
    async fn list_images(&self) -> Result<Vec<ListedImage>>;

    /// Register a new image whose data is pulled from its source URL
    async fn create_image(&self, new_image: &NewImage) -> Result<()>;
}

/// Image service client over HTTP
pub struct GlanceClient {
    http_client: Client,
    root: String,
    base_url: String,
    token: String,
    version: ApiVersion,
    page_size: usize,
}

impl GlanceClient {
    pub fn new(http_client: Client, session: &SessionContext, version: ApiVersion) -> Self {
        Self {
            http_client,
            root: session.endpoint_root().to_string(),
            base_url: session.versioned_endpoint(version),
            token: session.token.clone(),
            version,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("X-Auth-Token", &self.token)
    }

    async fn list_v1(&self) -> Result<Vec<ListedImage>> {
        let url = format!("{}/images/detail", self.base_url);
        let limit = self.page_size.to_string();
        let mut images = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut query = vec![("limit", limit.clone())];
            if let Some(marker) = &marker {
                query.push(("marker", marker.clone()));
            }

            let response = self
                .authorized(self.http_client.get(&url).query(&query))
                .send()
                .await
                .context("Failed to list images")?;
            let page: ImagesV1Response = ensure_success(response, "list images")
                .await?
                .json()
                .await
                .context("Failed to parse image list response")?;

            // The server may cap pages below `limit`, so only an empty
            // page ends the listing
            if page.images.is_empty() {
                break;
            }
            marker = page.images.last().map(|image| image.id.clone());
            debug!(count = page.images.len(), "Fetched image page");
            images.extend(page.images.into_iter().map(ListedImage::V1));
        }

        Ok(images)
    }

    async fn list_v2(&self) -> Result<Vec<ListedImage>> {
        let mut images = Vec::new();
        let mut previous_next: Option<String> = None;
        let mut request = self
            .http_client
            .get(format!("{}/images", self.base_url))
            .query(&[("limit", self.page_size.to_string())]);

        loop {
            let response = self
                .authorized(request)
                .send()
                .await
                .context("Failed to list images")?;
            let page: ImagesV2Response = ensure_success(response, "list images")
                .await?
                .json()
                .await
                .context("Failed to parse image list response")?;

            debug!(count = page.images.len(), "Fetched image page");
            images.extend(page.images.into_iter().map(ListedImage::V2));

            match page.next {
                Some(next) if previous_next.as_deref() == Some(next.as_str()) => {
                    warn!(next = %next, "Image listing repeated its next link, stopping");
                    break;
                }
                Some(next) => {
                    request = self.http_client.get(self.resolve_next(&next));
                    previous_next = Some(next);
                }
                None => break,
            }
        }

        Ok(images)
    }

    /// `next` links are either absolute or relative to the endpoint root
    fn resolve_next(&self, next: &str) -> String {
        if Url::parse(next).is_ok() {
            next.to_string()
        } else {
            format!("{}/{}", self.root, next.trim_start_matches('/'))
        }
    }

    async fn create_v1(&self, image: &ImageSource, is_public: bool) -> Result<()> {
        let response = self
            .authorized(self.http_client.post(format!("{}/images", self.base_url)))
            .header("x-image-meta-name", &image.name)
            .header("x-image-meta-disk_format", &image.disk_format)
            .header("x-image-meta-container_format", &image.container_format)
            .header("x-image-meta-is_public", is_public.to_string())
            .header("x-glance-api-copy-from", &image.url)
            .send()
            .await
            .context("Failed to send create image request")?;
        ensure_success(response, "create image").await?;
        Ok(())
    }

    async fn create_v2(&self, image: &ImageSource, visibility: Visibility) -> Result<()> {
        let request = CreateImageV2Request {
            name: &image.name,
            disk_format: &image.disk_format,
            container_format: &image.container_format,
            visibility,
        };
        let response = self
            .authorized(self.http_client.post(format!("{}/images", self.base_url)))
            .json(&request)
            .send()
            .await
            .context("Failed to send create image request")?;
        let created: CreatedImageV2 = ensure_success(response, "create image")
            .await?
            .json()
            .await
            .context("Failed to parse create image response")?;

        debug!(image_id = %created.id, uri = %image.url, "Starting web-download import");

        if let Err(err) = self.import_v2(&created.id, &image.url).await {
            self.delete_v2(&created.id).await;
            return Err(err);
        }
        Ok(())
    }

    async fn import_v2(&self, image_id: &str, uri: &str) -> Result<()> {
        let response = self
            .authorized(self.http_client.post(format!(
                "{}/images/{}/import",
                self.base_url, image_id
            )))
            .json(&ImportImageRequest::web_download(uri))
            .send()
            .await
            .context("Failed to send image import request")?;
        ensure_success(response, "import image data").await?;
        Ok(())
    }

    /// Remove a registered image whose data never arrived. A leftover
    /// `queued` image would satisfy later existence checks by name.
    async fn delete_v2(&self, image_id: &str) {
        match self.send_delete_v2(image_id).await {
            Ok(()) => info!(image_id = %image_id, "Deleted image after failed import"),
            Err(err) => warn!(
                image_id = %image_id,
                error = %format!("{:#}", err),
                "Failed to delete image after failed import"
            ),
        }
    }

    async fn send_delete_v2(&self, image_id: &str) -> Result<()> {
        let response = self
            .authorized(
                self.http_client
                    .delete(format!("{}/images/{}", self.base_url, image_id)),
            )
            .send()
            .await
            .context("Failed to send delete image request")?;
        ensure_success(response, "delete image").await?;
        Ok(())
    }
}

async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    anyhow::bail!("Failed to {} (status {}): {}", action, status, error_text)
}

#[async_trait]
impl ImageCatalogClient for GlanceClient {
    fn api_version(&self) -> ApiVersion {
        self.version
    }

    async fn list_images(&self) -> Result<Vec<ListedImage>> {
        match self.version {
            ApiVersion::V1 => self.list_v1().await,
            ApiVersion::V2 => self.list_v2().await,
        }
    }

    async fn create_image(&self, new_image: &NewImage) -> Result<()> {
        info!(
            image = %new_image.source().name,
            source = %new_image.source().url,
            api_version = %self.version,
            "Creating image"
        );
        match new_image {
            NewImage::V1 { image, is_public } => self.create_v1(image, *is_public).await,
            NewImage::V2 { image, visibility } => self.create_v2(image, *visibility).await,
        }
    }
}
