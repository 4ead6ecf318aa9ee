use std::io::IsTerminal;

use reqwest::Url;

use self::utils::{prompt_secret_handle_errors, prompt_text_handle_errors};
use crate::cli::PrivateKey;

mod utils;

/// Credentials the deployment cannot run without.
pub struct Credentials {
    pub rpc_url: Url,
    pub private_key: PrivateKey,
}

/// Takes the configured RPC url and private key, asking for whatever is
/// missing when attached to a terminal.
pub fn resolve_credentials(
    rpc_url: Option<&Url>,
    private_key: Option<&PrivateKey>,
) -> eyre::Result<Credentials> {
    let interactive = std::io::stdin().is_terminal();

    let rpc_url = match rpc_url {
        Some(rpc_url) => rpc_url.clone(),
        None if interactive => prompt_text_handle_errors("Rpc Url:")?,
        None => eyre::bail!(
            "No RPC url given, pass --rpc-url, set RPC_URL or select a configured --network"
        ),
    };

    let private_key = match private_key {
        Some(private_key) => private_key.clone(),
        None if interactive => prompt_secret_handle_errors("Private key:")?,
        None => eyre::bail!(
            "No private key given, pass --private-key or set PRIVATE_KEY"
        ),
    };

    Ok(Credentials {
        rpc_url,
        private_key,
    })
}
