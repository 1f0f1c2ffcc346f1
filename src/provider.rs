//! Crypto provider selection.
//!
//! Nothing in this crate installs a process-wide provider on its own. Binaries
//! call [`install_default`] once at startup; library users that do not want to
//! touch global state can pass a provider to
//! [`Loader::with_provider`](crate::Loader::with_provider) instead.

use log::debug;
use rustls::crypto::{CryptoProvider, ring};
use std::sync::Arc;

/// Installs the `ring` provider as the process default.
///
/// Idempotent: if a default is already installed (by us or anyone else) it is
/// left in place and returned.
pub fn install_default() -> Arc<CryptoProvider> {
    if let Some(provider) = CryptoProvider::get_default() {
        return provider.clone();
    }

    // Losing a race here is fine, the winner is the default either way.
    if ring::default_provider().install_default().is_ok() {
        debug!("Installed ring as the default crypto provider");
    }

    current()
}

/// Returns the installed default provider, or a fresh `ring` provider if none
/// is installed. Never modifies global state.
pub fn current() -> Arc<CryptoProvider> {
    CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(ring::default_provider()))
}
