use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// The registrant an attendance NFT is minted for
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub user_id: Uuid,
    pub wallet_address: String,
    pub name: Option<String>,
}

impl Attendee {
    /// Display name, falling back to the wallet address
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.wallet_address,
        }
    }

    pub fn has_wallet(&self) -> bool {
        !self.wallet_address.trim().is_empty()
    }
}

/// Public user fields embedded in attendance listings
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[sqlx(rename = "user_id")]
    pub id: Uuid,
    #[sqlx(rename = "user_name")]
    pub name: Option<String>,
    #[sqlx(rename = "user_wallet_address")]
    pub wallet_address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_prefers_name() {
        let attendee = Attendee {
            user_id: Uuid::new_v4(),
            wallet_address: "Wallet111".to_string(),
            name: Some("Ada".to_string()),
        };
        assert_eq!(attendee.display_name(), "Ada");
    }

    #[test]
    fn test_display_name_falls_back_to_wallet() {
        let attendee = Attendee {
            user_id: Uuid::new_v4(),
            wallet_address: "Wallet111".to_string(),
            name: Some("  ".to_string()),
        };
        assert_eq!(attendee.display_name(), "Wallet111");
    }
}
