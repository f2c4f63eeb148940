use secrecy::Secret;
use serde::Deserialize;

const DEFAULT_MIN_PAYER_BALANCE_LAMPORTS: u64 = 50_000_000;
const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONFIRM_POLL_INTERVAL_MS: u64 = 500;

/// Solana cluster the minter talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cluster {
    Devnet,
    Testnet,
    MainnetBeta,
    Localnet,
}

impl Cluster {
    pub fn rpc_url(&self) -> &'static str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Localnet => "http://127.0.0.1:8899",
        }
    }
}

impl std::str::FromStr for Cluster {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Cluster::MainnetBeta),
            "localnet" | "localhost" => Ok(Cluster::Localnet),
            other => Err(format!("unknown Solana network: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Solana
    pub solana_network: Cluster,
    pub solana_rpc_url: Option<String>,

    // NFT minting
    pub minter_private_key: Option<Secret<String>>,
    pub min_payer_balance_lamports: u64,
    pub confirm_timeout_secs: u64,
    pub confirm_poll_interval_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        let solana_network = match config.get::<String>("solana_network") {
            Ok(network) => network.parse().map_err(config::ConfigError::Message)?,
            Err(_) => Cluster::Devnet,
        };

        Ok(Self {
            database_url: config.get("database_url")?,
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port")?,

            solana_network,
            solana_rpc_url: config.get("solana_rpc_url").ok(),

            minter_private_key: config
                .get::<String>("minter_private_key")
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(Secret::new),
            min_payer_balance_lamports: config
                .get("min_payer_balance_lamports")
                .unwrap_or(DEFAULT_MIN_PAYER_BALANCE_LAMPORTS),
            confirm_timeout_secs: config
                .get("confirm_timeout_secs")
                .unwrap_or(DEFAULT_CONFIRM_TIMEOUT_SECS),
            confirm_poll_interval_ms: config
                .get("confirm_poll_interval_ms")
                .unwrap_or(DEFAULT_CONFIRM_POLL_INTERVAL_MS),
        })
    }

    /// RPC endpoint, preferring an explicit override over the cluster default
    pub fn rpc_url(&self) -> String {
        self.solana_rpc_url
            .clone()
            .unwrap_or_else(|| self.solana_network.rpc_url().to_string())
    }
}
