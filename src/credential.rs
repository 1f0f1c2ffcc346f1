//! Assembly of fetched key material into a credential for rustls.

use crate::error::LoadError;
use crate::loader::RawMaterial;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::sign::CertifiedKey;
use rustls::{ClientConfig, InconsistentKeys, RootCertStore, ServerConfig};
use std::fmt;
use std::sync::Arc;

/// Certificate chain, private key and optional CA roots, ready for rustls.
///
/// Immutable once built. Clones share the same underlying material.
#[derive(Clone)]
pub struct Credential {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<CryptoProvider>,
    cert_chain: Vec<CertificateDer<'static>>,
    private_key: PrivateKeyDer<'static>,
    certified_key: Arc<CertifiedKey>,
    ca_certs: Vec<CertificateDer<'static>>,
    roots: Arc<RootCertStore>,
}

impl Credential {
    /// Builds a credential from fully fetched material.
    ///
    /// The certificate and key files must be PEM. Each CA buffer may hold any
    /// number of PEM certificates; they are kept in buffer order.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::CredentialConstruction`] if:
    /// - The certificate file holds no certificate or is not valid PEM
    /// - The key file holds no private key or is not valid PEM
    /// - The provider rejects the key, or the key does not match the certificate
    /// - A CA certificate cannot be added to the root store
    pub fn build(provider: Arc<CryptoProvider>, material: RawMaterial) -> Result<Self, LoadError> {
        let cert_chain = parse_certs(&material.cert)
            .map_err(|e| LoadError::rejected("malformed certificate", e))?;
        if cert_chain.is_empty() {
            return Err(LoadError::construction("no certificate found"));
        }

        let mut reader = material.key.as_slice();
        let private_key = rustls_pemfile::private_key(&mut reader)
            .map_err(|e| LoadError::rejected("malformed private key", e))?
            .ok_or_else(|| LoadError::construction("no private key found"))?;

        let signing_key = provider
            .key_provider
            .load_private_key(private_key.clone_key())
            .map_err(|e| LoadError::rejected("unsupported private key", e))?;

        let certified_key = CertifiedKey::new(cert_chain.clone(), signing_key);
        match certified_key.keys_match() {
            // Some key types cannot report their public half; nothing to compare.
            Ok(()) | Err(rustls::Error::InconsistentKeys(InconsistentKeys::Unknown)) => {}
            Err(e) => {
                return Err(LoadError::rejected(
                    "private key does not match certificate",
                    e,
                ));
            }
        }

        let mut ca_certs = Vec::new();
        for buf in &material.ca {
            let certs =
                parse_certs(buf).map_err(|e| LoadError::rejected("malformed CA certificate", e))?;
            if certs.is_empty() {
                return Err(LoadError::construction("no certificate found in CA file"));
            }
            ca_certs.extend(certs);
        }

        let mut roots = RootCertStore::empty();
        for cert in &ca_certs {
            roots
                .add(cert.clone())
                .map_err(|e| LoadError::rejected("invalid CA certificate", e))?;
        }

        Ok(Self {
            inner: Arc::new(Inner {
                provider,
                cert_chain,
                private_key,
                certified_key: Arc::new(certified_key),
                ca_certs,
                roots: Arc::new(roots),
            }),
        })
    }

    pub fn cert_chain(&self) -> &[CertificateDer<'static>] {
        &self.inner.cert_chain
    }

    pub fn private_key(&self) -> &PrivateKeyDer<'static> {
        &self.inner.private_key
    }

    /// Certificate chain bound to its signing key, for custom cert resolvers.
    pub fn certified_key(&self) -> Arc<CertifiedKey> {
        self.inner.certified_key.clone()
    }

    /// CA certificates in the order their files were requested.
    pub fn ca_certs(&self) -> &[CertificateDer<'static>] {
        &self.inner.ca_certs
    }

    pub fn root_store(&self) -> Arc<RootCertStore> {
        self.inner.roots.clone()
    }

    /// Server-side TLS config presenting this credential.
    ///
    /// When CA certificates were loaded, clients must present a certificate
    /// issued by one of them. Otherwise client auth is disabled.
    pub fn server_config(&self) -> Result<ServerConfig, LoadError> {
        let builder = ServerConfig::builder_with_provider(self.inner.provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| LoadError::rejected("unsupported protocol versions", e))?;

        let builder = if self.inner.ca_certs.is_empty() {
            builder.with_no_client_auth()
        } else {
            let verifier = WebPkiClientVerifier::builder_with_provider(
                self.inner.roots.clone(),
                self.inner.provider.clone(),
            )
            .build()
            .map_err(|e| LoadError::rejected("client verifier", e))?;
            builder.with_client_cert_verifier(verifier)
        };

        builder
            .with_single_cert(
                self.inner.cert_chain.clone(),
                self.inner.private_key.clone_key(),
            )
            .map_err(|e| LoadError::rejected("server config", e))
    }

    /// Client-side TLS config trusting the loaded CA certificates and
    /// authenticating with this credential.
    pub fn client_config(&self) -> Result<ClientConfig, LoadError> {
        ClientConfig::builder_with_provider(self.inner.provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| LoadError::rejected("unsupported protocol versions", e))?
            .with_root_certificates(self.inner.roots.clone())
            .with_client_auth_cert(
                self.inner.cert_chain.clone(),
                self.inner.private_key.clone_key(),
            )
            .map_err(|e| LoadError::rejected("client config", e))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("certs", &self.inner.cert_chain.len())
            .field("ca_certs", &self.inner.ca_certs.len())
            .finish_non_exhaustive()
    }
}

fn parse_certs(buf: &[u8]) -> std::io::Result<Vec<CertificateDer<'static>>> {
    let mut reader = buf;
    rustls_pemfile::certs(&mut reader).collect()
}
