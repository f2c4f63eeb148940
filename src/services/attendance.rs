use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db;
use crate::models::{
    attendance::UNIQUE_USER_EVENT_CONSTRAINT, Attendance, AttendanceContext, Attendee,
    EventNftInfo, RegistrationContext,
};
use crate::services::nft_metadata::{self, NftMetadata};
use crate::services::solana_minter::{MintError, MintReceipt, NftMinter};

#[derive(thiserror::Error, Debug)]
pub enum AttendanceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Registration not found")]
    RegistrationNotFound,

    #[error("Attendance record not found")]
    AttendanceNotFound,

    #[error("Registration does not belong to this event")]
    RegistrationEventMismatch,

    #[error("Attendance does not belong to this event")]
    AttendanceEventMismatch,

    #[error("Attendance does not belong to this user")]
    UserMismatch,

    #[error("Only the event creator can {0}")]
    NotEventCreator(&'static str),

    #[error("Attendance already confirmed")]
    AlreadyConfirmed,

    #[error("NFT was already minted for this attendance record")]
    AlreadyMinted,

    #[error("Failed to mint NFT")]
    Minting(#[source] MintError),
}

/// Why an attendance was left unminted without contacting the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MintSkipReason {
    MissingWallet,
    MissingNftImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintAttempt {
    Minted(MintReceipt),
    Skipped(MintSkipReason),
}

/// Attendance as returned by the confirm and retry endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceOutcome {
    #[serde(flatten)]
    pub attendance: Attendance,
    pub nft_minted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint_skipped: Option<MintSkipReason>,
}

impl AttendanceOutcome {
    fn not_minted(attendance: Attendance, skipped: Option<MintSkipReason>) -> Self {
        Self {
            attendance,
            nft_minted: false,
            mint_skipped: skipped,
        }
    }

    fn minted(attendance: Attendance) -> Self {
        Self {
            nft_minted: attendance.is_minted(),
            attendance,
            mint_skipped: None,
        }
    }
}

pub fn authorize_confirmation(
    context: &RegistrationContext,
    event_id: Uuid,
    confirmed_by: &str,
) -> Result<(), AttendanceError> {
    if context.event.event_id != event_id {
        return Err(AttendanceError::RegistrationEventMismatch);
    }

    if !context.event.is_created_by(confirmed_by) {
        return Err(AttendanceError::NotEventCreator("confirm attendance"));
    }

    Ok(())
}

pub fn authorize_retry(
    context: &AttendanceContext,
    event_id: Uuid,
    confirmed_by: &str,
    user_id: Uuid,
) -> Result<(), AttendanceError> {
    if context.attendance.event_id != event_id {
        return Err(AttendanceError::AttendanceEventMismatch);
    }

    if context.attendance.user_id != user_id {
        return Err(AttendanceError::UserMismatch);
    }

    if !context.event.is_created_by(confirmed_by) {
        return Err(AttendanceError::NotEventCreator("retry NFT minting"));
    }

    if context.attendance.is_minted() {
        return Err(AttendanceError::AlreadyMinted);
    }

    Ok(())
}

/// Metadata to mint, or the reason this attendee cannot receive an NFT
pub fn mint_plan(event: &EventNftInfo, attendee: &Attendee) -> Result<NftMetadata, MintSkipReason> {
    if !attendee.has_wallet() {
        return Err(MintSkipReason::MissingWallet);
    }

    match event.nft_image_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Ok(nft_metadata::for_mint(event, attendee)),
        _ => Err(MintSkipReason::MissingNftImage),
    }
}

pub async fn attempt_mint(
    minter: Option<&dyn NftMinter>,
    event: &EventNftInfo,
    attendee: &Attendee,
) -> Result<MintAttempt, MintError> {
    let metadata = match mint_plan(event, attendee) {
        Ok(metadata) => metadata,
        Err(reason) => {
            tracing::info!(
                event_id = %event.event_id,
                user_id = %attendee.user_id,
                reason = ?reason,
                "Skipping NFT mint"
            );
            return Ok(MintAttempt::Skipped(reason));
        }
    };

    let minter = minter.ok_or(MintError::NotConfigured)?;

    tracing::info!(
        payer = %minter.payer_address(),
        receiver = %attendee.wallet_address,
        name = %metadata.name,
        "Starting NFT minting"
    );

    let receipt = minter.mint(&attendee.wallet_address, &metadata).await?;

    Ok(MintAttempt::Minted(receipt))
}

async fn persist_mint(
    pool: &PgPool,
    attendance_id: Uuid,
    receipt: &MintReceipt,
) -> Result<AttendanceOutcome, AttendanceError> {
    let updated = Attendance::record_mint(
        pool,
        attendance_id,
        &receipt.mint_address,
        &receipt.tx_signature,
    )
    .await
    .map_err(|e| {
        log_unrecorded_mint(attendance_id, receipt, "Failed to record NFT mint");
        e
    })?;

    match updated {
        Some(attendance) => {
            tracing::info!(
                attendance_id = %attendance.id,
                mint = %receipt.mint_address,
                signature = %receipt.tx_signature,
                "Recorded NFT mint"
            );
            Ok(AttendanceOutcome::minted(attendance))
        }
        None => {
            log_unrecorded_mint(
                attendance_id,
                receipt,
                "Attendance was minted concurrently; new mint left unrecorded",
            );
            Err(AttendanceError::AlreadyMinted)
        }
    }
}

/// The mint exists on chain but not in the database; the log is the only trace of it
fn log_unrecorded_mint(attendance_id: Uuid, receipt: &MintReceipt, message: &str) {
    tracing::error!(
        attendance_id = %attendance_id,
        orphaned_mint = %receipt.mint_address,
        signature = %receipt.tx_signature,
        "{}",
        message
    );
}

/// Confirms that a registrant attended and mints their attendance NFT.
///
/// The attendance row is written before minting. A mint that fails for any
/// reason leaves the row without a mint address for a later retry.
#[tracing::instrument(skip(pool, minter, confirmed_by))]
pub async fn confirm_attendance(
    pool: &PgPool,
    minter: Option<&dyn NftMinter>,
    event_id: Uuid,
    registration_id: Uuid,
    confirmed_by: &str,
) -> Result<AttendanceOutcome, AttendanceError> {
    let context = RegistrationContext::find_by_id(pool, registration_id)
        .await?
        .ok_or(AttendanceError::RegistrationNotFound)?;

    authorize_confirmation(&context, event_id, confirmed_by)?;

    let attendance = match Attendance::create(pool, context.attendee.user_id, event_id).await {
        Ok(attendance) => attendance,
        Err(e) if db::is_unique_violation(&e, UNIQUE_USER_EVENT_CONSTRAINT) => {
            return Err(AttendanceError::AlreadyConfirmed);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        attendance_id = %attendance.id,
        user_id = %attendance.user_id,
        "Attendance confirmed"
    );

    match attempt_mint(minter, &context.event, &context.attendee).await {
        Ok(MintAttempt::Minted(receipt)) => persist_mint(pool, attendance.id, &receipt).await,
        Ok(MintAttempt::Skipped(reason)) => Ok(AttendanceOutcome::not_minted(attendance, Some(reason))),
        Err(e) => {
            tracing::error!(
                attendance_id = %attendance.id,
                error = %e,
                "Failed to mint NFT; attendance left for retry"
            );
            Ok(AttendanceOutcome::not_minted(attendance, None))
        }
    }
}

/// Retries the mint of an attendance left without an NFT
#[tracing::instrument(skip(pool, minter, confirmed_by))]
pub async fn retry_mint(
    pool: &PgPool,
    minter: Option<&dyn NftMinter>,
    event_id: Uuid,
    attendance_id: Uuid,
    confirmed_by: &str,
    user_id: Uuid,
) -> Result<AttendanceOutcome, AttendanceError> {
    let context = AttendanceContext::find_by_id(pool, attendance_id)
        .await?
        .ok_or(AttendanceError::AttendanceNotFound)?;

    authorize_retry(&context, event_id, confirmed_by, user_id)?;

    match attempt_mint(minter, &context.event, &context.attendee).await {
        Ok(MintAttempt::Minted(receipt)) => persist_mint(pool, attendance_id, &receipt).await,
        Ok(MintAttempt::Skipped(reason)) => {
            Ok(AttendanceOutcome::not_minted(context.attendance, Some(reason)))
        }
        Err(e) => {
            tracing::error!(attendance_id = %attendance_id, error = %e, "NFT mint retry failed");
            Err(AttendanceError::Minting(e))
        }
    }
}
