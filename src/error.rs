use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Which file of a load request a read was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Cert,
    Key,
    Ca,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileRole::Cert => "crt",
            FileRole::Key => "key",
            FileRole::Ca => "ca",
        })
    }
}

/// Discriminant of a [`LoadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    MissingRequest,
    MissingCertPath,
    MissingKeyPath,
    FileRead,
    CredentialConstruction,
}

/// The single failure a load operation can end with.
///
/// Messages name the offending field or file path but never include file contents.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("load request is required")]
    MissingRequest,

    #[error("certificate path is required")]
    MissingCertPath,

    #[error("private key path is required")]
    MissingKeyPath,

    #[error("unable to read {role} file: {}", path.display())]
    FileRead {
        role: FileRole,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to construct credential: {reason}")]
    CredentialConstruction {
        reason: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::MissingRequest => LoadErrorKind::MissingRequest,
            LoadError::MissingCertPath => LoadErrorKind::MissingCertPath,
            LoadError::MissingKeyPath => LoadErrorKind::MissingKeyPath,
            LoadError::FileRead { .. } => LoadErrorKind::FileRead,
            LoadError::CredentialConstruction { .. } => LoadErrorKind::CredentialConstruction,
        }
    }

    /// Path of the file that failed to read, if this is a read failure.
    pub fn path(&self) -> Option<&Path> {
        match self {
            LoadError::FileRead { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<FileRole> {
        match self {
            LoadError::FileRead { role, .. } => Some(*role),
            _ => None,
        }
    }

    pub(crate) fn construction(reason: impl Into<String>) -> Self {
        LoadError::CredentialConstruction {
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn rejected(reason: impl Into<String>, source: impl Into<BoxError>) -> Self {
        LoadError::CredentialConstruction {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }
}

/// Errors from reading a load request out of a TOML file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
