//! The load pipeline: validate, read cert, read key, read CA chain, build.

mod chain;
mod fetch;

pub use chain::assemble_chain;
pub use fetch::{Fetch, FsFetcher};

use crate::credential::Credential;
use crate::error::{FileRole, LoadError};
use crate::provider;
use crate::request::{LoadRequest, validate};
use log::{debug, info, warn};
use rustls::crypto::CryptoProvider;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;

/// File contents gathered by one load operation.
///
/// `ca` is empty when no CA file was requested. It is never partially filled:
/// either every requested CA file was read, or the load failed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RawMaterial {
    pub cert: Vec<u8>,
    pub key: Vec<u8>,
    pub ca: Vec<Vec<u8>>,
}

impl fmt::Debug for RawMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMaterial")
            .field("cert", &format_args!("{} bytes", self.cert.len()))
            .field("key", &format_args!("{} bytes", self.key.len()))
            .field("ca", &self.ca.len())
            .finish()
    }
}

/// Position of a load operation in the pipeline. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    ReadingCert,
    ReadingKey,
    ReadingCa,
    Building,
    Done,
    Failed,
}

/// Loads credentials from files.
///
/// A loader holds no per-load state, so one instance can serve any number of
/// concurrent loads.
#[derive(Clone)]
pub struct Loader<F = FsFetcher> {
    fetcher: F,
    provider: Arc<CryptoProvider>,
}

impl Loader {
    /// Creates a loader reading from the filesystem with the current default
    /// crypto provider (see [`provider::current`]).
    pub fn new() -> Self {
        Self::with_fetcher(FsFetcher)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fetch> Loader<F> {
    pub fn with_fetcher(fetcher: F) -> Self {
        Self {
            fetcher,
            provider: provider::current(),
        }
    }

    /// Replaces the crypto provider used to build credentials.
    pub fn with_provider(mut self, provider: Arc<CryptoProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Runs one load to completion.
    ///
    /// Cert, key and CA files are read in that order, each stage starting only
    /// after the previous one succeeded. CA files are read concurrently. The
    /// first failure ends the load.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The request is absent or lacks a cert or key path
    /// - Any requested file cannot be read
    /// - The material is rejected while building the credential
    pub async fn load<'a>(
        &self,
        request: impl Into<Option<&'a LoadRequest>>,
    ) -> Result<Credential, LoadError> {
        let mut stage = Stage::Validating;
        let result = self.run(request.into(), &mut stage).await;

        match &result {
            Ok(credential) => {
                advance(&mut stage, Stage::Done);
                info!(
                    "Loaded {} certificate(s) and {} CA certificate(s)",
                    credential.cert_chain().len(),
                    credential.ca_certs().len()
                );
            }
            Err(e) => {
                warn!("Credential load failed while {:?}: {}", stage, e);
                advance(&mut stage, Stage::Failed);
            }
        }

        result
    }

    async fn run(
        &self,
        request: Option<&LoadRequest>,
        stage: &mut Stage,
    ) -> Result<Credential, LoadError> {
        let request = validate(request)?;

        advance(stage, Stage::ReadingCert);
        let cert = self.fetcher.fetch(FileRole::Cert, &request.cert_path).await?;

        advance(stage, Stage::ReadingKey);
        let key = self.fetcher.fetch(FileRole::Key, &request.key_path).await?;

        let ca_paths: Vec<PathBuf> = request.ca_files().map(Path::to_path_buf).collect();
        let ca = if ca_paths.is_empty() {
            Vec::new()
        } else {
            advance(stage, Stage::ReadingCa);
            assemble_chain(&self.fetcher, &ca_paths).await?
        };

        advance(stage, Stage::Building);
        Credential::build(self.provider.clone(), RawMaterial { cert, key, ca })
    }
}

impl<F: Fetch + Clone + 'static> Loader<F> {
    /// Starts a load on the tokio runtime and returns the channel its single
    /// result will be delivered on.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        &self,
        request: Option<LoadRequest>,
    ) -> oneshot::Receiver<Result<Credential, LoadError>> {
        let (tx, rx) = oneshot::channel();
        let loader = self.clone();

        tokio::spawn(async move {
            let result = loader.load(request.as_ref()).await;
            if tx.send(result).is_err() {
                debug!("Load result dropped, receiver went away");
            }
        });

        rx
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    debug!("Load stage {:?} -> {:?}", stage, next);
    *stage = next;
}
