use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Event fields needed to authorize, mint and describe an attendance NFT.
///
/// Loaded through joins, so the columns are aliased with an `event_` prefix
/// where they would otherwise clash with the joined tables.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EventNftInfo {
    pub event_id: Uuid,
    pub event_title: String,
    pub event_date: DateTime<Utc>,
    pub nft_name: Option<String>,
    pub nft_symbol: Option<String>,
    pub nft_image_url: Option<String>,
    pub creator_wallet_address: String,
}

impl EventNftInfo {
    /// Whether `wallet_address` belongs to the organizer who created the event
    pub fn is_created_by(&self, wallet_address: &str) -> bool {
        self.creator_wallet_address == wallet_address.trim()
    }
}
