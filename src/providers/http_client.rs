use reqwest::Client;
use std::time::Duration;

/// Shared HTTP client settings for completion backends.
pub fn build_provider_client(timeout: Duration) -> Client {
    install_crypto_provider();
    Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Select ring as the process-level rustls provider. Safe to call repeatedly.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}
