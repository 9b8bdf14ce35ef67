//! Reading `OS_*` credentials from a shell-style openrc file.
//!
//! Only lines of the form `export OS_NAME=VALUE` contribute; anything else in
//! the file (comments, unrelated exports, shell logic) is ignored.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};
use url::Url;

use crate::error::ModuleError;

lazy_static! {
    static ref EXPORT_LINE: Regex =
        Regex::new(r"^\s*export\s+(OS_[A-Za-z0-9_]+)=(.*)$").expect("valid export pattern");
}

pub const OS_USERNAME: &str = "OS_USERNAME";
pub const OS_PASSWORD: &str = "OS_PASSWORD";
pub const OS_TENANT_NAME: &str = "OS_TENANT_NAME";
pub const OS_AUTH_URL: &str = "OS_AUTH_URL";
pub const OS_ENDPOINT_TYPE: &str = "OS_ENDPOINT_TYPE";
pub const OS_REGION_NAME: &str = "OS_REGION_NAME";

/// Variables resolved from an openrc file
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    vars: HashMap<String, String>,
}

impl CredentialSet {
    /// Read and parse the credentials file at `path`
    pub fn from_file(path: &Path) -> Result<Self, ModuleError> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| ModuleError::CredentialsFile {
                path: path.to_path_buf(),
                source,
            })?;
        let set = Self::parse(&contents);
        if set.is_empty() {
            warn!(path = %path.display(), "No OS_* exports found in credentials file");
        } else {
            debug!(
                path = %path.display(),
                variables = ?set.names(),
                "Resolved credentials file"
            );
        }
        Ok(set)
    }

    /// Parse file contents. Later lines override earlier ones.
    pub fn parse(contents: &str) -> Self {
        let mut vars = HashMap::new();
        for line in contents.lines() {
            if let Some(caps) = EXPORT_LINE.captures(line) {
                vars.insert(caps[1].to_string(), unquote(caps[2].trim_end()).to_string());
            }
        }
        Self { vars }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Variable names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn require(&self, name: &'static str) -> Result<&str, ModuleError> {
        self.get(name).ok_or(ModuleError::MissingVariable(name))
    }

    /// Extract what the identity service needs to open a session
    pub fn auth_credentials(&self) -> Result<AuthCredentials, ModuleError> {
        let username = self.require(OS_USERNAME)?.to_string();
        let password = self.require(OS_PASSWORD)?.to_string();
        let tenant_name = self.require(OS_TENANT_NAME)?.to_string();
        let auth_url = self.require(OS_AUTH_URL)?;
        let endpoint_type = self.require(OS_ENDPOINT_TYPE)?;

        let auth_url = Url::parse(auth_url).map_err(|e| ModuleError::InvalidVariable {
            name: OS_AUTH_URL,
            reason: e.to_string(),
        })?;
        let endpoint_type =
            endpoint_type
                .parse::<EndpointType>()
                .map_err(|reason| ModuleError::InvalidVariable {
                    name: OS_ENDPOINT_TYPE,
                    reason,
                })?;

        Ok(AuthCredentials {
            username,
            password,
            tenant_name,
            auth_url,
            endpoint_type,
            region_name: self.get(OS_REGION_NAME).map(str::to_string),
        })
    }
}

// Values are never printed, only names
impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("names", &self.names())
            .finish()
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Which network path of a catalog endpoint to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointType {
    Public,
    Internal,
    Admin,
}

impl EndpointType {
    /// Key of this interface in an Identity v2.0 catalog endpoint
    pub fn catalog_key(&self) -> &'static str {
        match self {
            EndpointType::Public => "publicURL",
            EndpointType::Internal => "internalURL",
            EndpointType::Admin => "adminURL",
        }
    }
}

impl FromStr for EndpointType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "publicurl" | "public" => Ok(EndpointType::Public),
            "internalurl" | "internal" => Ok(EndpointType::Internal),
            "adminurl" | "admin" => Ok(EndpointType::Admin),
            other => Err(format!(
                "unknown endpoint type '{}' (expected publicURL, internalURL or adminURL)",
                other
            )),
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.catalog_key())
    }
}

/// Credentials for a password authentication against the identity service
#[derive(Clone)]
pub struct AuthCredentials {
    pub username: String,
    pub password: String,
    pub tenant_name: String,
    pub auth_url: Url,
    pub endpoint_type: EndpointType,
    pub region_name: Option<String>,
}

impl fmt::Debug for AuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredentials")
            .field("username", &self.username)
            .field("password", &"********")
            .field("tenant_name", &self.tenant_name)
            .field("auth_url", &self.auth_url.as_str())
            .field("endpoint_type", &self.endpoint_type)
            .field("region_name", &self.region_name)
            .finish()
    }
}
