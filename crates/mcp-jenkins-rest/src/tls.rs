use std::sync::Once;

static INSTALL_PROVIDER: Once = Once::new();

/// Installs the ring crypto provider for rustls. reqwest is built without a
/// default provider, so this must run before the first client is built.
pub fn install_crypto_provider() {
    INSTALL_PROVIDER.call_once(|| {
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            tracing::debug!("rustls crypto provider was already installed");
        }
    });
}
