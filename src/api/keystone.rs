//! Identity v2.0 token request/response types

use serde::{Deserialize, Serialize};

/// Body of `POST /tokens`
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub auth: TokenRequestAuth<'a>,
}

#[derive(Debug, Serialize)]
pub struct TokenRequestAuth<'a> {
    #[serde(rename = "tenantName")]
    pub tenant_name: &'a str,
    #[serde(rename = "passwordCredentials")]
    pub password_credentials: PasswordCredentials<'a>,
}

#[derive(Debug, Serialize)]
pub struct PasswordCredentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Response from `POST /tokens`
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access: Access,
}

#[derive(Debug, Deserialize)]
pub struct Access {
    pub token: Token,
    #[serde(rename = "serviceCatalog", default)]
    pub service_catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct Token {
    pub id: String,
}

/// One service in the catalog
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<CatalogEndpoint>,
}

/// Endpoint URLs of a service in one region
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogEndpoint {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(rename = "publicURL", default)]
    pub public_url: Option<String>,
    #[serde(rename = "internalURL", default)]
    pub internal_url: Option<String>,
    #[serde(rename = "adminURL", default)]
    pub admin_url: Option<String>,
}
