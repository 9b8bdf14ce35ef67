//! Turning credentials into a session bound to the image service endpoint

use tracing::info;

use crate::api::glance::ApiVersion;
use crate::credentials::AuthCredentials;
use crate::error::ModuleError;
use crate::identity::IdentitySessionProvider;

/// Catalog type of the image service
pub const IMAGE_SERVICE_TYPE: &str = "image";

/// Token and image service endpoint for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub token: String,
    pub endpoint: String,
}

impl SessionContext {
    /// Endpoint root without a trailing slash
    pub fn endpoint_root(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// `<endpoint>/v<version>`
    pub fn versioned_endpoint(&self, version: ApiVersion) -> String {
        format!("{}/{}", self.endpoint_root(), version.path_segment())
    }
}

/// Authenticate and resolve the image endpoint.
///
/// Every failure here is an initialization error.
pub async fn establish_session(
    identity: &dyn IdentitySessionProvider,
    credentials: &AuthCredentials,
) -> Result<SessionContext, ModuleError> {
    let session = identity
        .authenticate(credentials)
        .await
        .map_err(ModuleError::Initialization)?;

    let endpoint = session
        .catalog
        .endpoint_url(
            IMAGE_SERVICE_TYPE,
            credentials.endpoint_type,
            credentials.region_name.as_deref(),
        )
        .map_err(ModuleError::Initialization)?;

    info!(
        endpoint = %endpoint,
        endpoint_type = %credentials.endpoint_type,
        "Resolved image service endpoint"
    );

    Ok(SessionContext {
        token: session.token,
        endpoint,
    })
}
