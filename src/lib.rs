//! # crypto-reader
//!
//! Loads a TLS certificate, private key and optional CA chain from files and
//! assembles them into a [`Credential`] that rustls can use directly.
//!
//! ## Features
//!
//! - Input validation before any file is touched
//! - Sequential cert and key reads, concurrent CA reads with order preserved
//! - First failure wins: exactly one result per load, never a partial credential
//! - Errors that name the failing file and its role, never its contents
//!
//! ## Example
//!
//! ```no_run
//! use crypto_reader::{LoadRequest, Loader, provider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     provider::install_default();
//!
//!     let request = LoadRequest::new("certs/cert.pem", "certs/key.pem").with_ca("certs/ca.pem");
//!     let credential = Loader::new().load(&request).await?;
//!     let _server_config = credential.server_config()?;
//!     Ok(())
//! }
//! ```

pub mod credential;
pub mod error;
pub mod loader;
pub mod provider;
pub mod request;

pub use credential::Credential;
pub use error::{ConfigError, FileRole, LoadError, LoadErrorKind};
pub use loader::{Fetch, FsFetcher, Loader, RawMaterial, Stage};
pub use request::{LoadRequest, validate};

/// Loads a credential with a default [`Loader`].
pub async fn load<'a>(
    request: impl Into<Option<&'a LoadRequest>>,
) -> Result<Credential, LoadError> {
    Loader::new().load(request).await
}
