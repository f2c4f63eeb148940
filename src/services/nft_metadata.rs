use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::{Attendee, EventNftInfo};

pub const DEFAULT_SYMBOL: &str = "POAP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftAttribute {
    pub trait_type: String,
    pub value: String,
}

impl NftAttribute {
    fn new(trait_type: &str, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.to_string(),
            value: value.into(),
        }
    }
}

/// Display metadata of an attendance NFT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMetadata {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<NftAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

/// Formats an event date the way it appears on the NFT, e.g. "March 5, 2025"
pub fn format_event_date(date: &DateTime<Utc>) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn base_metadata(event: &EventNftInfo) -> NftMetadata {
    let formatted_date = format_event_date(&event.event_date);

    let name = match event.nft_name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => format!("Attendance: {}", event.event_title),
    };
    let symbol = match event.nft_symbol.as_deref() {
        Some(symbol) if !symbol.trim().is_empty() => symbol.to_string(),
        _ => DEFAULT_SYMBOL.to_string(),
    };

    NftMetadata {
        name,
        symbol,
        description: format!(
            "Proof of attendance for {} on {}",
            event.event_title, formatted_date
        ),
        image: event.nft_image_url.clone().unwrap_or_default(),
        attributes: vec![
            NftAttribute::new("Event", event.event_title.clone()),
            NftAttribute::new("Date", formatted_date),
        ],
        external_url: None,
    }
}

/// Metadata minted for `attendee` at `event`
pub fn for_mint(event: &EventNftInfo, attendee: &Attendee) -> NftMetadata {
    let mut metadata = base_metadata(event);
    metadata
        .attributes
        .push(NftAttribute::new("Attendee", attendee.display_name()));
    metadata
}

/// Metadata served for a single minted NFT
pub fn for_lookup(event: &EventNftInfo, attendee: &Attendee) -> NftMetadata {
    let mut metadata = for_mint(event, attendee);
    metadata
        .attributes
        .push(NftAttribute::new("Event ID", event.event_id.to_string()));
    metadata.external_url = Some(format!("/events/{}", event.event_id));
    metadata
}

/// Metadata listed in a wallet's collection
pub fn for_collection(event: &EventNftInfo) -> NftMetadata {
    let mut metadata = base_metadata(event);
    metadata
        .attributes
        .push(NftAttribute::new("Event ID", event.event_id.to_string()));
    metadata
}

/// Off-chain JSON document in the Metaplex token standard layout
pub fn offchain_json(metadata: &NftMetadata, creator_address: &str) -> serde_json::Value {
    json!({
        "name": metadata.name,
        "symbol": metadata.symbol,
        "description": metadata.description,
        "image": metadata.image,
        "attributes": metadata.attributes,
        "seller_fee_basis_points": 0,
        "external_url": "",
        "properties": {
            "files": [{ "uri": metadata.image, "type": "image/png" }],
            "category": "image",
            "creators": [{ "address": creator_address, "share": 100 }],
        },
    })
}
