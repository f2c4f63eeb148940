use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::extract::path_params;
use crate::api::state::AppState;
use crate::error::{AppError, Result};
use crate::models::MintedNft;
use crate::services::nft_metadata::{self, NftMetadata};
use crate::services::solana_minter::token_account_address;

/// An attendance NFT as listed in a wallet's collection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletNft {
    pub mint: String,
    pub token_account: String,
    pub metadata: NftMetadata,
    pub image_url: Option<String>,
}

impl WalletNft {
    fn from_minted(wallet_address: &str, nft: MintedNft) -> Self {
        Self {
            token_account: token_account_address(wallet_address, &nft.mint_address)
                .unwrap_or_default(),
            metadata: nft_metadata::for_collection(&nft.event),
            image_url: nft.event.nft_image_url,
            mint: nft.mint_address,
        }
    }
}

/// NFT metadata by mint address
async fn get_nft_metadata(
    State(state): State<AppState>,
    mint_address: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<NftMetadata>> {
    let mint_address = path_params(mint_address)?;

    let nft = MintedNft::find_by_mint(&state.pool, mint_address.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("NFT not found".to_string()))?;

    Ok(Json(nft_metadata::for_lookup(&nft.event, &nft.attendee)))
}

/// All attendance NFTs minted to a wallet
async fn list_wallet_nfts(
    State(state): State<AppState>,
    wallet_address: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<WalletNft>>> {
    let wallet_address = path_params(wallet_address)?;
    let wallet_address = wallet_address.trim();

    let nfts = MintedNft::list_by_wallet(&state.pool, wallet_address).await?;

    tracing::debug!(wallet = %wallet_address, count = nfts.len(), "Listed wallet NFTs");

    Ok(Json(
        nfts.into_iter()
            .map(|nft| WalletNft::from_minted(wallet_address, nft))
            .collect(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/nfts/:mint_address", get(get_nft_metadata))
        .route("/api/nfts/user/:wallet_address", get(list_wallet_nfts))
}
