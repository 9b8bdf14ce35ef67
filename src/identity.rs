//! Identity service sessions and service catalog lookup

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::api::keystone::{
    CatalogEndpoint, CatalogEntry, PasswordCredentials, TokenRequest, TokenRequestAuth,
    TokenResponse,
};
use crate::credentials::{AuthCredentials, EndpointType};

/// Something that can exchange credentials for an authenticated session
#[async_trait]
pub trait IdentitySessionProvider: Send + Sync {
    /// Authenticate and return the session token with its service catalog
    async fn authenticate(&self, credentials: &AuthCredentials) -> Result<IdentitySession>;
}

/// Token plus the catalog of endpoints it may be used against
#[derive(Debug, Clone)]
pub struct IdentitySession {
    pub token: String,
    pub catalog: ServiceCatalog,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceCatalog {
    entries: Vec<CatalogEntry>,
}

impl ServiceCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Find the URL of `service_type` for the given interface.
    ///
    /// With a region, only endpoints in that region are considered.
    pub fn endpoint_url(
        &self,
        service_type: &str,
        endpoint_type: EndpointType,
        region: Option<&str>,
    ) -> Result<String> {
        self.entries
            .iter()
            .filter(|entry| entry.service_type == service_type)
            .flat_map(|entry| entry.endpoints.iter())
            .filter(|endpoint| match region {
                Some(region) => endpoint.region.as_deref() == Some(region),
                None => true,
            })
            .find_map(|endpoint| interface_url(endpoint, endpoint_type))
            .ok_or_else(|| match region {
                Some(region) => anyhow::anyhow!(
                    "No {} endpoint for service type '{}' in region '{}'",
                    endpoint_type,
                    service_type,
                    region
                ),
                None => anyhow::anyhow!(
                    "No {} endpoint for service type '{}' in service catalog",
                    endpoint_type,
                    service_type
                ),
            })
    }
}

fn interface_url(endpoint: &CatalogEndpoint, endpoint_type: EndpointType) -> Option<String> {
    match endpoint_type {
        EndpointType::Public => endpoint.public_url.clone(),
        EndpointType::Internal => endpoint.internal_url.clone(),
        EndpointType::Admin => endpoint.admin_url.clone(),
    }
}

/// Identity v2.0 password authentication over HTTP
pub struct KeystoneClient {
    http_client: Client,
}

impl KeystoneClient {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl IdentitySessionProvider for KeystoneClient {
    async fn authenticate(&self, credentials: &AuthCredentials) -> Result<IdentitySession> {
        let url = format!(
            "{}/tokens",
            credentials.auth_url.as_str().trim_end_matches('/')
        );

        let request = TokenRequest {
            auth: TokenRequestAuth {
                tenant_name: &credentials.tenant_name,
                password_credentials: PasswordCredentials {
                    username: &credentials.username,
                    password: &credentials.password,
                },
            },
        };

        debug!(url = %url, username = %credentials.username, "Requesting identity token");

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send token request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!(
                "Failed to authenticate (status {}): {}",
                status,
                error_text
            );
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token response")?;

        info!(
            tenant = %credentials.tenant_name,
            services = token_response.access.service_catalog.len(),
            "Authenticated against identity service"
        );

        Ok(IdentitySession {
            token: token_response.access.token.id,
            catalog: ServiceCatalog::new(token_response.access.service_catalog),
        })
    }
}
