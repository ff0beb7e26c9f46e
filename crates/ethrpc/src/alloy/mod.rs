pub mod errors;
mod instrumentation;

#[cfg(any(test, feature = "test-util"))]
use alloy::providers::mock;
use {
    crate::AlloyProvider,
    alloy::{
        network::EthereumWallet,
        providers::{Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
        signers::local::PrivateKeySigner,
    },
    anyhow::{Context, Result},
    instrumentation::InstrumentationLayer,
    url::Url,
};

/// Creates a provider that signs and fills (nonce, chain id) every
/// transaction it sends with the given signer.
pub fn provider_with_signer(url: &Url, signer: PrivateKeySigner) -> AlloyProvider {
    let rpc = ClientBuilder::default()
        .layer(InstrumentationLayer::new("main"))
        .http(url.clone());
    tracing::info!(signer = ?signer.address(), "using signing account");

    ProviderBuilder::new()
        .wallet(EthereumWallet::new(signer))
        .connect_client(rpc)
        .erased()
}

/// Parses a hex encoded private key (with or without `0x` prefix).
pub fn signer_from_private_key(private_key: &str) -> Result<PrivateKeySigner> {
    private_key
        .trim()
        .parse()
        .context("private key is not a valid hex encoded secp256k1 key")
}

#[cfg(any(test, feature = "test-util"))]
pub fn mocked_provider(asserter: mock::Asserter) -> AlloyProvider {
    ProviderBuilder::new()
        .connect_mocked_client(asserter)
        .erased()
}
