use async_trait::async_trait;
use serde::Serialize;
use solana_client::{
    client_error::ClientError,
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcSendTransactionConfig, RpcSimulateTransactionConfig},
};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    instruction::Instruction,
    native_token::LAMPORTS_PER_SOL,
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction,
    transaction::Transaction,
};
use solana_transaction_status::UiTransactionEncoding;
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use spl_token::{instruction::AuthorityType, state::Mint};
use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::services::minter_wallet::{self, KeypairError};
use crate::services::nft_metadata::{self, NftMetadata};

#[derive(thiserror::Error, Debug)]
pub enum MintError {
    #[error("NFT minting wallet not configured")]
    NotConfigured,

    #[error("Invalid receiver wallet address: {0}")]
    InvalidWallet(String),

    #[error(
        "Payer has insufficient balance: {} SOL. Need at least {} SOL.",
        sol(.balance),
        sol(.required)
    )]
    InsufficientBalance { balance: u64, required: u64 },

    #[error("Failed to build mint instructions: {0}")]
    Instruction(#[from] ProgramError),

    #[error("Failed to sign transaction: {0}")]
    Signing(String),

    #[error("Solana RPC error: {0}")]
    Rpc(#[from] ClientError),

    #[error("Transaction simulation failed: {error}")]
    SimulationFailed { error: String, logs: Vec<String> },

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Transaction {signature} was not confirmed before its blockhash expired")]
    Expired { signature: String },
}

fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

fn sol(lamports: &u64) -> f64 {
    lamports_to_sol(*lamports)
}

/// Result of a successful on-chain mint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub mint_address: String,
    pub tx_signature: String,
}

/// Creates attendance NFTs on chain
#[async_trait]
pub trait NftMinter: Send + Sync {
    /// Address of the wallet paying for and creating the NFTs
    fn payer_address(&self) -> String;

    /// Mint a single NFT described by `metadata` to `receiver_wallet`
    async fn mint(
        &self,
        receiver_wallet: &str,
        metadata: &NftMetadata,
    ) -> Result<MintReceipt, MintError>;

    /// Check that the chain endpoint is reachable
    async fn check_health(&self) -> Result<(), MintError>;
}

#[derive(Debug, Clone, Copy)]
pub struct MinterSettings {
    pub min_payer_balance_lamports: u64,
    pub confirm_timeout: Duration,
    pub poll_interval: Duration,
}

impl From<&Config> for MinterSettings {
    fn from(config: &Config) -> Self {
        Self {
            min_payer_balance_lamports: config.min_payer_balance_lamports,
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            poll_interval: Duration::from_millis(config.confirm_poll_interval_ms),
        }
    }
}

/// Builds the instructions that create a one-of-one SPL token in `receiver`'s wallet.
///
/// Order: create the mint account, initialize it with zero decimals, create
/// the receiver's associated token account, mint a single token, then revoke
/// the mint authority so the supply stays at one.
pub fn build_mint_instructions(
    payer: &Pubkey,
    mint: &Pubkey,
    receiver: &Pubkey,
    mint_rent_lamports: u64,
) -> Result<Vec<Instruction>, ProgramError> {
    let token_program = spl_token::id();
    let receiver_token_account = get_associated_token_address(receiver, mint);

    Ok(vec![
        system_instruction::create_account(
            payer,
            mint,
            mint_rent_lamports,
            Mint::LEN as u64,
            &token_program,
        ),
        spl_token::instruction::initialize_mint2(&token_program, mint, payer, Some(payer), 0)?,
        create_associated_token_account(payer, receiver, mint, &token_program),
        spl_token::instruction::mint_to(
            &token_program,
            mint,
            &receiver_token_account,
            payer,
            &[],
            1,
        )?,
        spl_token::instruction::set_authority(
            &token_program,
            mint,
            None,
            AuthorityType::MintTokens,
            payer,
            &[],
        )?,
    ])
}

/// Associated token account holding `mint` for `wallet`, if both are valid keys
pub fn token_account_address(wallet: &str, mint: &str) -> Option<String> {
    let wallet = Pubkey::from_str(wallet).ok()?;
    let mint = Pubkey::from_str(mint).ok()?;
    Some(get_associated_token_address(&wallet, &mint).to_string())
}

/// Mints attendance NFTs through a Solana JSON-RPC endpoint
pub struct SolanaNftMinter {
    rpc: RpcClient,
    payer: Keypair,
    settings: MinterSettings,
}

impl SolanaNftMinter {
    pub fn new(rpc_url: String, payer: Keypair, settings: MinterSettings) -> Self {
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url, CommitmentConfig::confirmed()),
            payer,
            settings,
        }
    }

    /// Builds the minter from configuration; `None` when no minter key is set
    pub fn from_config(config: &Config) -> Result<Option<Self>, KeypairError> {
        use secrecy::ExposeSecret;

        let Some(secret) = config.minter_private_key.as_ref() else {
            return Ok(None);
        };

        let payer = minter_wallet::parse_keypair(secret.expose_secret())?;

        Ok(Some(Self::new(
            config.rpc_url(),
            payer,
            MinterSettings::from(config),
        )))
    }

    async fn ensure_payer_balance(&self) -> Result<(), MintError> {
        let balance = self.rpc.get_balance(&self.payer.pubkey()).await?;

        tracing::debug!(
            payer = %self.payer.pubkey(),
            balance_sol = lamports_to_sol(balance),
            "Checked payer balance"
        );

        if balance < self.settings.min_payer_balance_lamports {
            return Err(MintError::InsufficientBalance {
                balance,
                required: self.settings.min_payer_balance_lamports,
            });
        }

        Ok(())
    }

    async fn simulate(&self, transaction: &Transaction) -> Result<(), MintError> {
        let simulation = self
            .rpc
            .simulate_transaction_with_config(
                transaction,
                RpcSimulateTransactionConfig {
                    commitment: Some(self.rpc.commitment()),
                    encoding: Some(UiTransactionEncoding::Base64),
                    ..Default::default()
                },
            )
            .await?;

        if let Some(err) = simulation.value.err {
            let logs = simulation.value.logs.unwrap_or_default();
            tracing::error!(error = ?err, logs = ?logs, "Transaction simulation failed");
            return Err(MintError::SimulationFailed {
                error: format!("{:?}", err),
                logs,
            });
        }

        Ok(())
    }

    /// Polls the signature status until it lands, fails, or its blockhash expires
    async fn wait_for_confirmation(
        &self,
        signature: &Signature,
        last_valid_block_height: u64,
    ) -> Result<(), MintError> {
        let deadline = Instant::now() + self.settings.confirm_timeout;

        loop {
            match self
                .rpc
                .get_signature_status_with_commitment(signature, CommitmentConfig::confirmed())
                .await?
            {
                Some(Ok(())) => return Ok(()),
                Some(Err(err)) => {
                    return Err(MintError::TransactionFailed(format!("{:?}", err)));
                }
                None => {}
            }

            let block_height = self.rpc.get_block_height().await?;
            if block_height > last_valid_block_height || Instant::now() >= deadline {
                return Err(MintError::Expired {
                    signature: signature.to_string(),
                });
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}

#[async_trait]
impl NftMinter for SolanaNftMinter {
    fn payer_address(&self) -> String {
        self.payer.pubkey().to_string()
    }

    #[tracing::instrument(skip(self, metadata), fields(name = %metadata.name))]
    async fn mint(
        &self,
        receiver_wallet: &str,
        metadata: &NftMetadata,
    ) -> Result<MintReceipt, MintError> {
        let start = Instant::now();

        let receiver = Pubkey::from_str(receiver_wallet)
            .map_err(|_| MintError::InvalidWallet(receiver_wallet.to_string()))?;
        let payer = self.payer.pubkey();

        self.ensure_payer_balance().await?;

        let offchain = nft_metadata::offchain_json(metadata, &payer.to_string());
        tracing::debug!(metadata = %offchain, "Built NFT JSON metadata");

        let mint = Keypair::new();
        tracing::debug!(mint = %mint.pubkey(), "Generated mint account");

        let rent = self
            .rpc
            .get_minimum_balance_for_rent_exemption(Mint::LEN)
            .await?;
        let instructions = build_mint_instructions(&payer, &mint.pubkey(), &receiver, rent)?;

        let (blockhash, last_valid_block_height) = self
            .rpc
            .get_latest_blockhash_with_commitment(self.rpc.commitment())
            .await?;

        let mut transaction = Transaction::new_with_payer(&instructions, Some(&payer));
        transaction
            .try_sign(&[&self.payer, &mint], blockhash)
            .map_err(|e| MintError::Signing(e.to_string()))?;

        self.simulate(&transaction).await?;
        tracing::debug!("Transaction simulation successful");

        let signature = self
            .rpc
            .send_transaction_with_config(
                &transaction,
                RpcSendTransactionConfig {
                    skip_preflight: false,
                    preflight_commitment: Some(CommitmentLevel::Confirmed),
                    encoding: Some(UiTransactionEncoding::Base64),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(signature = %signature, "Mint transaction sent");

        self.wait_for_confirmation(&signature, last_valid_block_height)
            .await?;

        tracing::info!(
            mint = %mint.pubkey(),
            signature = %signature,
            duration_ms = start.elapsed().as_millis(),
            "NFT minted"
        );

        Ok(MintReceipt {
            mint_address: mint.pubkey().to_string(),
            tx_signature: signature.to_string(),
        })
    }

    async fn check_health(&self) -> Result<(), MintError> {
        self.rpc.get_health().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use solana_sdk::system_program;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings() -> MinterSettings {
        MinterSettings {
            min_payer_balance_lamports: 50_000_000,
            confirm_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
        }
    }

    fn metadata() -> NftMetadata {
        NftMetadata {
            name: "Attendance: RustConf".to_string(),
            symbol: "POAP".to_string(),
            description: "Proof of attendance for RustConf on March 5, 2025".to_string(),
            image: "https://img.example/seal.png".to_string(),
            attributes: vec![],
            external_url: None,
        }
    }

    async fn mock_rpc(server: &MockServer, rpc_method: &str, result: serde_json::Value) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": rpc_method })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "result": result,
                "id": 1,
            })))
            .mount(server)
            .await;
    }

    /// Funded payer, rent and a blockhash valid up to height 200
    async fn mock_mint_prelude(server: &MockServer) {
        mock_rpc(server, "getVersion", json!({ "solana-core": "2.1.0", "feature-set": 1 })).await;
        mock_rpc(
            server,
            "getBalance",
            json!({ "context": { "slot": 1 }, "value": 2_000_000_000u64 }),
        )
        .await;
        mock_rpc(server, "getMinimumBalanceForRentExemption", json!(1_461_600)).await;
        mock_rpc(
            server,
            "getLatestBlockhash",
            json!({
                "context": { "slot": 1 },
                "value": {
                    "blockhash": "11111111111111111111111111111111",
                    "lastValidBlockHeight": 200
                }
            }),
        )
        .await;
    }

    async fn mock_signature_status(server: &MockServer, status: serde_json::Value) {
        mock_rpc(
            server,
            "getSignatureStatuses",
            json!({ "context": { "slot": 1 }, "value": [status] }),
        )
        .await;
    }

    #[test]
    fn test_build_mint_instructions_order() {
        let payer = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let receiver = Pubkey::new_unique();

        let instructions = build_mint_instructions(&payer, &mint, &receiver, 1_461_600).unwrap();

        let programs: Vec<Pubkey> = instructions.iter().map(|ix| ix.program_id).collect();
        assert_eq!(
            programs,
            vec![
                system_program::id(),
                spl_token::id(),
                spl_associated_token_account::id(),
                spl_token::id(),
                spl_token::id(),
            ]
        );

        // create_account: funding payer and the new mint both sign
        assert_eq!(instructions[0].accounts[0].pubkey, payer);
        assert_eq!(instructions[0].accounts[1].pubkey, mint);
        assert!(instructions[0].accounts[1].is_signer);

        // mint_to targets the receiver's associated token account
        let token_account = get_associated_token_address(&receiver, &mint);
        assert_eq!(instructions[3].accounts[0].pubkey, mint);
        assert_eq!(instructions[3].accounts[1].pubkey, token_account);
    }

    #[test]
    fn test_token_account_address() {
        let wallet = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        assert_eq!(
            token_account_address(&wallet.to_string(), &mint.to_string()),
            Some(get_associated_token_address(&wallet, &mint).to_string())
        );
        assert_eq!(token_account_address("not a key", &mint.to_string()), None);
    }

    #[test]
    fn test_insufficient_balance_message() {
        let err = MintError::InsufficientBalance {
            balance: 10_000_000,
            required: 50_000_000,
        };
        assert_eq!(
            err.to_string(),
            "Payer has insufficient balance: 0.01 SOL. Need at least 0.05 SOL."
        );
    }

    #[tokio::test]
    async fn test_mint_rejects_invalid_receiver() {
        let minter = SolanaNftMinter::new(
            "http://127.0.0.1:9".to_string(),
            Keypair::new(),
            settings(),
        );

        let result = minter.mint("definitely-not-a-pubkey", &metadata()).await;
        assert!(matches!(result, Err(MintError::InvalidWallet(_))));
    }

    #[tokio::test]
    async fn test_mint_fails_on_low_payer_balance() {
        let server = MockServer::start().await;
        mock_rpc(&server, "getVersion", json!({ "solana-core": "2.1.0", "feature-set": 1 })).await;
        mock_rpc(
            &server,
            "getBalance",
            json!({ "context": { "slot": 1 }, "value": 1_000 }),
        )
        .await;

        let minter = SolanaNftMinter::new(server.uri(), Keypair::new(), settings());
        let receiver = Pubkey::new_unique().to_string();

        let result = minter.mint(&receiver, &metadata()).await;
        assert!(matches!(
            result,
            Err(MintError::InsufficientBalance {
                balance: 1_000,
                required: 50_000_000
            })
        ));
    }

    #[tokio::test]
    async fn test_mint_stops_on_failed_simulation() {
        let server = MockServer::start().await;
        mock_mint_prelude(&server).await;
        mock_rpc(
            &server,
            "simulateTransaction",
            json!({
                "context": { "slot": 1 },
                "value": {
                    "err": "AccountNotFound",
                    "logs": ["Program log: payer account missing"],
                    "accounts": null,
                    "unitsConsumed": 0,
                    "returnData": null
                }
            }),
        )
        .await;

        let minter = SolanaNftMinter::new(server.uri(), Keypair::new(), settings());
        let receiver = Pubkey::new_unique().to_string();

        match minter.mint(&receiver, &metadata()).await {
            Err(MintError::SimulationFailed { error, logs }) => {
                assert!(error.contains("AccountNotFound"));
                assert_eq!(logs, vec!["Program log: payer account missing".to_string()]);
            }
            other => panic!("expected simulation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mint_surfaces_rejected_send() {
        let server = MockServer::start().await;
        mock_mint_prelude(&server).await;
        mock_rpc(
            &server,
            "simulateTransaction",
            json!({
                "context": { "slot": 1 },
                "value": {
                    "err": null,
                    "logs": [],
                    "accounts": null,
                    "unitsConsumed": 0,
                    "returnData": null
                }
            }),
        )
        .await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "method": "sendTransaction" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "error": { "code": -32002, "message": "Blockhash not found" },
                "id": 1,
            })))
            .mount(&server)
            .await;

        let minter = SolanaNftMinter::new(server.uri(), Keypair::new(), settings());
        let receiver = Pubkey::new_unique().to_string();

        let result = minter.mint(&receiver, &metadata()).await;
        assert!(matches!(result, Err(MintError::Rpc(_))));
    }

    #[tokio::test]
    async fn test_confirmation_succeeds() {
        let server = MockServer::start().await;
        mock_signature_status(
            &server,
            json!({
                "slot": 150,
                "confirmations": 0,
                "err": null,
                "status": { "Ok": null },
                "confirmationStatus": "confirmed"
            }),
        )
        .await;

        let minter = SolanaNftMinter::new(server.uri(), Keypair::new(), settings());

        let result = minter.wait_for_confirmation(&Signature::default(), 200).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_confirmation_reports_failed_transaction() {
        let server = MockServer::start().await;
        mock_signature_status(
            &server,
            json!({
                "slot": 150,
                "confirmations": 0,
                "err": { "InstructionError": [0, "InvalidAccountData"] },
                "status": { "Err": { "InstructionError": [0, "InvalidAccountData"] } },
                "confirmationStatus": "confirmed"
            }),
        )
        .await;

        let minter = SolanaNftMinter::new(server.uri(), Keypair::new(), settings());

        match minter.wait_for_confirmation(&Signature::default(), 200).await {
            Err(MintError::TransactionFailed(msg)) => {
                assert_eq!(msg, "InstructionError(0, InvalidAccountData)");
            }
            other => panic!("expected failed transaction, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_confirmation_expires_with_blockhash() {
        let server = MockServer::start().await;
        mock_signature_status(&server, json!(null)).await;
        mock_rpc(&server, "getBlockHeight", json!(300)).await;

        let minter = SolanaNftMinter::new(server.uri(), Keypair::new(), settings());
        let signature = Signature::default();

        match minter.wait_for_confirmation(&signature, 200).await {
            Err(MintError::Expired { signature: expired }) => {
                assert_eq!(expired, signature.to_string());
            }
            other => panic!("expected expiry, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_confirmation_times_out() {
        let server = MockServer::start().await;
        mock_signature_status(&server, json!(null)).await;
        mock_rpc(&server, "getBlockHeight", json!(100)).await;

        let minter = SolanaNftMinter::new(
            server.uri(),
            Keypair::new(),
            MinterSettings {
                confirm_timeout: Duration::from_millis(50),
                ..settings()
            },
        );

        let result = minter.wait_for_confirmation(&Signature::default(), 200).await;
        assert!(matches!(result, Err(MintError::Expired { .. })));
    }
}
