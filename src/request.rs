//! Load requests and their TOML representation.

use crate::error::{ConfigError, LoadError};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};

/// Paths of the files making up one credential.
///
/// An empty path counts as absent, for CA entries too. `ca_paths` may be
/// empty, in which case no CA file is read at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoadRequest {
    #[serde(default, rename = "cert", alias = "crt")]
    pub cert_path: PathBuf,
    #[serde(default, rename = "key")]
    pub key_path: PathBuf,
    #[serde(default, rename = "ca", deserialize_with = "one_or_many")]
    pub ca_paths: Vec<PathBuf>,
}

impl LoadRequest {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
            ca_paths: Vec::new(),
        }
    }

    /// Appends one CA file to the chain. An empty path is ignored.
    pub fn with_ca(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !is_absent(&path) {
            self.ca_paths.push(path);
        }
        self
    }

    pub fn with_ca_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.ca_paths.extend(
            paths
                .into_iter()
                .map(P::into)
                .filter(|path| !is_absent(path)),
        );
        self
    }

    /// CA paths that name a file, in request order.
    pub fn ca_files(&self) -> impl Iterator<Item = &Path> {
        self.ca_paths
            .iter()
            .map(PathBuf::as_path)
            .filter(|path| !is_absent(path))
    }

    /// Parses a request from a TOML document.
    ///
    /// `ca` may be a single string or an array of strings. Missing `cert` or
    /// `key` entries are left empty for [`validate`] to report.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML request file.
    ///
    /// Relative paths inside the file are taken as-is, i.e. relative to the
    /// working directory of the process.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    let paths = match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    };
    Ok(paths.into_iter().filter(|path| !is_absent(path)).collect())
}

fn is_absent(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

/// Checks that a request is present and names both mandatory files.
///
/// Performs no I/O.
pub fn validate(request: Option<&LoadRequest>) -> Result<&LoadRequest, LoadError> {
    let request = request.ok_or(LoadError::MissingRequest)?;

    if is_absent(&request.cert_path) {
        return Err(LoadError::MissingCertPath);
    }
    if is_absent(&request.key_path) {
        return Err(LoadError::MissingKeyPath);
    }

    Ok(request)
}
