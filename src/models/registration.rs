use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{event::EventNftInfo, user::Attendee};

/// A registration together with everything attendance confirmation needs
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationContext {
    pub registration_id: Uuid,
    #[sqlx(flatten)]
    pub event: EventNftInfo,
    #[sqlx(flatten)]
    pub attendee: Attendee,
}

impl RegistrationContext {
    /// Load a registration with its event, the event creator and the registrant
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let context = sqlx::query_as::<_, Self>(
            r#"
            SELECT
                r.id AS registration_id,
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
            FROM registrations r
            JOIN events e ON e.id = r.event_id
            JOIN users c ON c.id = e.creator_id
            JOIN users u ON u.id = r.user_id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(context)
    }
}
