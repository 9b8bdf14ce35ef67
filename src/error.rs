use std::path::PathBuf;

/// Classified failures of a single invocation.
///
/// Configuration, validation and initialization failures are reported as a
/// structured `failed` record with a return code. Runtime failures from the
/// image service are not classified further and escape `main` as-is.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Failed to open credentials file {}: {source}", .path.display())]
    CredentialsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Missing required variable {0} in credentials file")]
    MissingVariable(&'static str),
    #[error("Invalid value for {name}: {reason}")]
    InvalidVariable { name: &'static str, reason: String },
    #[error("missing required arguments: {}", .0.join(", "))]
    MissingArguments(Vec<&'static str>),
    #[error("Initialization error: {0:#}")]
    Initialization(anyhow::Error),
    #[error(transparent)]
    Runtime(anyhow::Error),
}

impl ModuleError {
    /// Return code reported for classified failures. `None` for runtime
    /// failures, which are not reported as a structured record.
    pub fn rc(&self) -> Option<i32> {
        match self {
            ModuleError::CredentialsFile { .. }
            | ModuleError::MissingVariable(_)
            | ModuleError::InvalidVariable { .. }
            | ModuleError::MissingArguments(_) => Some(1),
            ModuleError::Initialization(_) => Some(2),
            ModuleError::Runtime(_) => None,
        }
    }
}
