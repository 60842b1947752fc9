use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub watchlist: WatchlistConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    #[serde(default = "default_network_name")]
    pub name: String,
    /// Base URL of a Blockscout v2 API instance for the configured network.
    #[serde(default = "default_explorer_url")]
    pub explorer_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_network_name(),
            explorer_url: default_explorer_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_network_name() -> String {
    "lisk-sepolia".to_string()
}

fn default_explorer_url() -> String {
    "https://sepolia-blockscout.lisk.com/api/v2".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

// ============================================================
// Scoring Config
// ============================================================

/// Weights and thresholds for the wallet scoring rubric.
/// Weights are additive percentage points; the defaults sum to 100.
#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    #[serde(default = "default_w_both_directions")]
    pub weight_both_directions: f64,
    #[serde(default = "default_w_amount_consistency")]
    pub weight_amount_consistency: f64,
    #[serde(default = "default_w_multiple_counterparties")]
    pub weight_multiple_counterparties: f64,
    #[serde(default = "default_w_spend_delay")]
    pub weight_spend_delay: f64,
    #[serde(default = "default_w_verified_contracts")]
    pub weight_verified_contracts: f64,
    #[serde(default = "default_w_known_contracts")]
    pub weight_known_contracts: f64,
    #[serde(default = "default_w_standard_methods")]
    pub weight_standard_methods: f64,
    #[serde(default = "default_w_established_funder")]
    pub weight_established_funder: f64,
    #[serde(default = "default_w_wallet_age")]
    pub weight_wallet_age: f64,
    #[serde(default = "default_w_multiple_tokens")]
    pub weight_multiple_tokens: f64,
    #[serde(default = "default_w_contract_functions")]
    pub weight_contract_functions: f64,
    #[serde(default = "default_w_clean_reputation")]
    pub weight_clean_reputation: f64,

    /// Scores at or above this are Low risk.
    #[serde(default = "default_low_risk_min")]
    pub low_risk_min: f64,
    /// Scores at or above this (but below `low_risk_min`) are Medium risk.
    #[serde(default = "default_medium_risk_min")]
    pub medium_risk_min: f64,

    /// Minimum delay between funding and first spend to count as deliberate.
    #[serde(default = "default_min_spend_delay_secs")]
    pub min_spend_delay_secs: i64,
    #[serde(default = "default_min_wallet_age_days")]
    pub min_wallet_age_days: i64,
    #[serde(default = "default_min_counterparties")]
    pub min_counterparties: u32,
    #[serde(default = "default_min_tokens")]
    pub min_tokens: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_both_directions: default_w_both_directions(),
            weight_amount_consistency: default_w_amount_consistency(),
            weight_multiple_counterparties: default_w_multiple_counterparties(),
            weight_spend_delay: default_w_spend_delay(),
            weight_verified_contracts: default_w_verified_contracts(),
            weight_known_contracts: default_w_known_contracts(),
            weight_standard_methods: default_w_standard_methods(),
            weight_established_funder: default_w_established_funder(),
            weight_wallet_age: default_w_wallet_age(),
            weight_multiple_tokens: default_w_multiple_tokens(),
            weight_contract_functions: default_w_contract_functions(),
            weight_clean_reputation: default_w_clean_reputation(),
            low_risk_min: default_low_risk_min(),
            medium_risk_min: default_medium_risk_min(),
            min_spend_delay_secs: default_min_spend_delay_secs(),
            min_wallet_age_days: default_min_wallet_age_days(),
            min_counterparties: default_min_counterparties(),
            min_tokens: default_min_tokens(),
        }
    }
}

fn default_w_both_directions() -> f64 {
    15.0
}

fn default_w_amount_consistency() -> f64 {
    10.0
}

fn default_w_multiple_counterparties() -> f64 {
    10.0
}

fn default_w_spend_delay() -> f64 {
    5.0
}

fn default_w_verified_contracts() -> f64 {
    10.0
}

fn default_w_known_contracts() -> f64 {
    5.0
}

fn default_w_standard_methods() -> f64 {
    5.0
}

fn default_w_established_funder() -> f64 {
    10.0
}

fn default_w_wallet_age() -> f64 {
    10.0
}

fn default_w_multiple_tokens() -> f64 {
    5.0
}

fn default_w_contract_functions() -> f64 {
    5.0
}

fn default_w_clean_reputation() -> f64 {
    10.0
}

fn default_low_risk_min() -> f64 {
    70.0
}

fn default_medium_risk_min() -> f64 {
    40.0
}

fn default_min_spend_delay_secs() -> i64 {
    600
}

fn default_min_wallet_age_days() -> i64 {
    7
}

fn default_min_counterparties() -> u32 {
    2
}

fn default_min_tokens() -> u32 {
    2
}

impl ScoringConfig {
    pub fn weights(&self) -> [f64; 12] {
        [
            self.weight_both_directions,
            self.weight_amount_consistency,
            self.weight_multiple_counterparties,
            self.weight_spend_delay,
            self.weight_verified_contracts,
            self.weight_known_contracts,
            self.weight_standard_methods,
            self.weight_established_funder,
            self.weight_wallet_age,
            self.weight_multiple_tokens,
            self.weight_contract_functions,
            self.weight_clean_reputation,
        ]
    }
}

// ============================================================
// Auth Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
    #[serde(default = "default_challenge_ttl_secs")]
    pub challenge_ttl_secs: i64,
}

fn default_token_ttl_minutes() -> i64 {
    1440
}

fn default_challenge_ttl_secs() -> i64 {
    300
}

// ============================================================
// API Config
// ============================================================

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_host")]
    pub host: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_api_port() -> u16 {
    3000
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

// ============================================================
// Watchlist Config
// ============================================================

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WatchlistConfig {
    /// CSV file of flagged addresses (scam/mixer/sanctions entities).
    /// When absent, flag linkage is unknown and the clean-reputation
    /// criterion scores zero.
    pub path: Option<String>,
}

impl Config {
    pub fn load(path: &str) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("Failed to read config file '{}': {}", path, e))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| eyre::eyre!("Failed to parse config file '{}': {}", path, e))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables take precedence over the file for secrets.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            if !url.is_empty() {
                self.database.url = url;
            }
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                self.auth.jwt_secret = secret;
            }
        }
    }

    fn validate(&self) -> eyre::Result<()> {
        if self.auth.jwt_secret.len() < 16 {
            return Err(eyre::eyre!(
                "auth.jwt_secret must be at least 16 characters"
            ));
        }
        if self.auth.challenge_ttl_secs <= 0 || self.auth.token_ttl_minutes <= 0 {
            return Err(eyre::eyre!("auth TTLs must be positive"));
        }
        let s = &self.scoring;
        if s.medium_risk_min >= s.low_risk_min {
            return Err(eyre::eyre!(
                "scoring.medium_risk_min ({}) must be below scoring.low_risk_min ({})",
                s.medium_risk_min,
                s.low_risk_min
            ));
        }
        if s.weights().iter().any(|w| *w < 0.0) {
            return Err(eyre::eyre!("scoring weights must be non-negative"));
        }
        let total: f64 = s.weights().iter().sum();
        if total > 100.0 {
            return Err(eyre::eyre!(
                "scoring weights sum to {}, which exceeds the 100-point scale",
                total
            ));
        }
        if !self.network.explorer_url.starts_with("http") {
            return Err(eyre::eyre!(
                "network.explorer_url must be an http(s) URL, got '{}'",
                self.network.explorer_url
            ));
        }
        Ok(())
    }
}
