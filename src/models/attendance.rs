use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{event::EventNftInfo, user::Attendee, user::UserSummary};

/// Name of the unique (user, event) constraint on `attendances`
pub const UNIQUE_USER_EVENT_CONSTRAINT: &str = "attendances_user_event_key";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub nft_mint_address: Option<String>,
    pub nft_transaction_signature: Option<String>,
    pub confirmed_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    pub fn is_minted(&self) -> bool {
        self.nft_mint_address.is_some()
    }

    /// Record a confirmed attendance in the not-minted state
    pub async fn create(pool: &PgPool, user_id: Uuid, event_id: Uuid) -> Result<Self, sqlx::Error> {
        let attendance = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO attendances (user_id, event_id)
            VALUES ($1, $2)
            RETURNING id, event_id, user_id, nft_mint_address, nft_transaction_signature, confirmed_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(event_id)
        .fetch_one(pool)
        .await?;

        Ok(attendance)
    }

    /// Move an attendance from not minted to minted.
    ///
    /// Returns `None` when the row is gone or already carries a mint address.
    pub async fn record_mint(
        pool: &PgPool,
        id: Uuid,
        mint_address: &str,
        transaction_signature: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let attendance = sqlx::query_as::<_, Self>(
            r#"
            UPDATE attendances
            SET nft_mint_address = $2,
                nft_transaction_signature = $3,
                updated_at = NOW()
            WHERE id = $1 AND nft_mint_address IS NULL
            RETURNING id, event_id, user_id, nft_mint_address, nft_transaction_signature, confirmed_at, updated_at
            "#,
        )
        .bind(id)
        .bind(mint_address)
        .bind(transaction_signature)
        .fetch_optional(pool)
        .await?;

        Ok(attendance)
    }

    /// List attendances of an event, optionally only those still awaiting a mint
    pub async fn list_by_event(
        pool: &PgPool,
        event_id: Uuid,
        unminted_only: bool,
    ) -> Result<Vec<AttendanceWithUser>, sqlx::Error> {
        let query = if unminted_only {
            r#"
            SELECT a.id, a.event_id, a.user_id, a.nft_mint_address, a.nft_transaction_signature,
                   a.confirmed_at, a.updated_at,
                   u.name AS user_name, u.wallet_address AS user_wallet_address
            FROM attendances a
            JOIN users u ON u.id = a.user_id
            WHERE a.event_id = $1 AND a.nft_mint_address IS NULL
            ORDER BY a.confirmed_at ASC
            "#
        } else {
            r#"
            SELECT a.id, a.event_id, a.user_id, a.nft_mint_address, a.nft_transaction_signature,
                   a.confirmed_at, a.updated_at,
                   u.name AS user_name, u.wallet_address AS user_wallet_address
            FROM attendances a
            JOIN users u ON u.id = a.user_id
            WHERE a.event_id = $1
            ORDER BY a.confirmed_at ASC
            "#
        };

        let attendances = sqlx::query_as::<_, AttendanceWithUser>(query)
            .bind(event_id)
            .fetch_all(pool)
            .await?;

        Ok(attendances)
    }
}

/// Attendance row with the attendee's public fields, as listed to organizers
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AttendanceWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attendance: Attendance,
    #[sqlx(flatten)]
    pub user: UserSummary,
}

/// An attendance with everything the mint retry needs
#[derive(Debug, Clone, FromRow)]
pub struct AttendanceContext {
    #[sqlx(flatten)]
    pub attendance: Attendance,
    #[sqlx(flatten)]
    pub event: EventNftInfo,
    #[sqlx(flatten)]
    pub attendee: Attendee,
}

impl AttendanceContext {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let context = sqlx::query_as::<_, Self>(
            r#"
            SELECT
                a.id, a.event_id, a.user_id, a.nft_mint_address, a.nft_transaction_signature,
                a.confirmed_at, a.updated_at,
                e.title AS event_title,
                e.date AS event_date,
                e.nft_name,
                e.nft_symbol,
                e.nft_image_url,
                c.wallet_address AS creator_wallet_address,
                u.wallet_address,
                u.name
            FROM attendances a
            JOIN events e ON e.id = a.event_id
            JOIN users c ON c.id = e.creator_id
            JOIN users u ON u.id = a.user_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(context)
    }
}

/// A minted attendance NFT with the event and holder it was minted for
#[derive(Debug, Clone, FromRow)]
pub struct MintedNft {
    pub mint_address: String,
    #[sqlx(flatten)]
    pub event: EventNftInfo,
    #[sqlx(flatten)]
    pub attendee: Attendee,
}

const MINTED_NFT_COLUMNS: &str = r#"
    a.nft_mint_address AS mint_address,
    e.id AS event_id,
    e.title AS event_title,
    e.date AS event_date,
    e.nft_name,
    e.nft_symbol,
    e.nft_image_url,
    c.wallet_address AS creator_wallet_address,
    u.id AS user_id,
    u.wallet_address,
    u.name
"#;

impl MintedNft {
    pub async fn find_by_mint(pool: &PgPool, mint_address: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {MINTED_NFT_COLUMNS}
            FROM attendances a
            JOIN events e ON e.id = a.event_id
            JOIN users c ON c.id = e.creator_id
            JOIN users u ON u.id = a.user_id
            WHERE a.nft_mint_address = $1
            "#
        );

        let nft = sqlx::query_as::<_, Self>(&query)
            .bind(mint_address)
            .fetch_optional(pool)
            .await?;

        Ok(nft)
    }

    /// All NFTs minted to the user owning `wallet_address`
    pub async fn list_by_wallet(pool: &PgPool, wallet_address: &str) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {MINTED_NFT_COLUMNS}
            FROM attendances a
            JOIN events e ON e.id = a.event_id
            JOIN users c ON c.id = e.creator_id
            JOIN users u ON u.id = a.user_id
            WHERE u.wallet_address = $1 AND a.nft_mint_address IS NOT NULL
            ORDER BY e.date DESC
            "#
        );

        let nfts = sqlx::query_as::<_, Self>(&query)
            .bind(wallet_address)
            .fetch_all(pool)
            .await?;

        Ok(nfts)
    }
}
