use solana_sdk::signature::{Keypair, Signer};

const SECRET_KEY_LEN: usize = 64;

#[derive(thiserror::Error, Debug)]
pub enum KeypairError {
    #[error("Minter key is not valid base58: {0}")]
    InvalidBase58(#[from] bs58::decode::Error),

    #[error("Minter key is not a valid JSON byte array: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Minter key must be 64 bytes, got {0}")]
    InvalidLength(usize),

    #[error("Minter key bytes do not form a valid ed25519 keypair: {0}")]
    InvalidKeypair(String),
}

/// Parses the minter's secret key.
///
/// Accepts either a base58 string (wallet export format) or the JSON byte
/// array stored in Solana CLI keypair files.
pub fn parse_keypair(secret: &str) -> Result<Keypair, KeypairError> {
    let secret = secret.trim();

    let bytes: Vec<u8> = if secret.starts_with('[') {
        serde_json::from_str(secret)?
    } else {
        bs58::decode(secret).into_vec()?
    };

    if bytes.len() != SECRET_KEY_LEN {
        return Err(KeypairError::InvalidLength(bytes.len()));
    }

    #[allow(deprecated)]
    let keypair =
        Keypair::from_bytes(&bytes).map_err(|e| KeypairError::InvalidKeypair(e.to_string()))?;

    tracing::info!(minter = %keypair.pubkey(), "Loaded minter wallet");

    Ok(keypair)
}
