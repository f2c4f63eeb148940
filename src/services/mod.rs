// Services module - Business logic

pub mod attendance;
pub mod minter_wallet;
pub mod nft_metadata;
pub mod solana_minter;
