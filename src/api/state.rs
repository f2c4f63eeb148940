use sqlx::PgPool;
use std::sync::Arc;

use crate::services::solana_minter::NftMinter;

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when no minter wallet is configured
    pub minter: Option<Arc<dyn NftMinter>>,
}

impl AppState {
    pub fn minter(&self) -> Option<&dyn NftMinter> {
        self.minter.as_deref()
    }
}
