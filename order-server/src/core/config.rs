use shared::money::{BPS_MAX, Money};
use std::path::PathBuf;
use std::str::FromStr;

/// Read and parse an environment variable, falling back to `default`
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// How a store is charged when it fails to fulfil an accepted order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationFeePolicy {
    /// Flat amount per cancellation
    Fixed(Money),
    /// Share of the order's base amount, rounded half away from zero
    BasisPoints(u32),
}

impl CancellationFeePolicy {
    pub fn fee_for(&self, base_amount: Money) -> Money {
        match *self {
            CancellationFeePolicy::Fixed(fee) => fee,
            CancellationFeePolicy::BasisPoints(bps) => base_amount.basis_points(bps.min(BPS_MAX)),
        }
    }
}

impl Default for CancellationFeePolicy {
    fn default() -> Self {
        // 10%
        CancellationFeePolicy::BasisPoints(1_000)
    }
}

/// Business rules of the order engine
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | DEFAULT_SERVICE_RADIUS_M | 30000 | Radius applied when a store upsert omits one |
/// | REQUIRE_PAYMENT_BEFORE_ACCEPT | false | New orders need a charged payment before merchant accept |
/// | CANCELLATION_FEE_FIXED | - | Flat fee in minor units (wins over BPS) |
/// | CANCELLATION_FEE_BPS | 1000 | Fee as basis points of base amount |
/// | CHARGE_STORE_ON_DRIVER_CANCEL | false | Charge the fee when a driver cancels |
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub default_service_radius_m: f64,
    pub require_payment_before_accept: bool,
    pub cancellation_fee: CancellationFeePolicy,
    pub charge_store_on_driver_cancel: bool,
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cancellation_fee = match std::env::var("CANCELLATION_FEE_FIXED")
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
        {
            Some(minor) => CancellationFeePolicy::Fixed(Money::from_minor(minor.max(0))),
            None => CancellationFeePolicy::BasisPoints(env_or("CANCELLATION_FEE_BPS", 1_000)),
        };
        Self {
            default_service_radius_m: env_or(
                "DEFAULT_SERVICE_RADIUS_M",
                defaults.default_service_radius_m,
            ),
            require_payment_before_accept: env_or(
                "REQUIRE_PAYMENT_BEFORE_ACCEPT",
                defaults.require_payment_before_accept,
            ),
            cancellation_fee,
            charge_store_on_driver_cancel: env_or(
                "CHARGE_STORE_ON_DRIVER_CANCEL",
                defaults.charge_store_on_driver_cancel,
            ),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_service_radius_m: 30_000.0,
            require_payment_before_accept: false,
            cancellation_fee: CancellationFeePolicy::default(),
            charge_store_on_driver_cancel: false,
        }
    }
}

/// Outbound payment gateway settings
#[derive(Debug, Clone)]
pub struct PaymentGatewayConfig {
    /// Verification API base URL; verification is off without it
    pub base_url: Option<String>,
    pub secret_key: Option<String>,
    /// Re-check every inbound callback against the gateway
    pub verify_callbacks: bool,
    pub timeout_ms: u64,
}

impl PaymentGatewayConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env_opt("PAYMENT_GATEWAY_URL"),
            secret_key: env_opt("PAYMENT_GATEWAY_SECRET"),
            verify_callbacks: env_or("VERIFY_PAYMENT_CALLBACKS", true),
            timeout_ms: env_or("PAYMENT_GATEWAY_TIMEOUT_MS", 10_000),
        }
    }

    /// Gateway verification can run
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.secret_key.is_some()
    }
}

/// Server configuration
///
/// # Environment
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | Database and logs |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development / staging / production |
/// | LOG_LEVEL | info | tracing filter when RUST_LOG is unset |
/// | LOG_JSON | false | JSON console output |
/// | REQUEST_TIMEOUT_MS | 30000 | Per-request timeout |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | Graceful shutdown budget |
///
/// Engine and gateway variables are listed on [`EngineConfig`] and
/// [`PaymentGatewayConfig`].
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: String,
    pub http_port: u16,
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub request_timeout_ms: u64,
    pub shutdown_timeout_ms: u64,
    pub engine: EngineConfig,
    pub payment: PaymentGatewayConfig,
}

impl Config {
    /// Load from environment variables, defaults for anything unset
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30_000),
            shutdown_timeout_ms: env_or("SHUTDOWN_TIMEOUT_MS", 10_000),
            engine: EngineConfig::from_env(),
            payment: PaymentGatewayConfig::from_env(),
        }
    }

    /// Override the work dir and port (tests)
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// redb file holding orders, stores, ledger and reasons
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("orders.redb")
    }

    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_policy() {
        let base = Money::from_minor(8000);
        assert_eq!(
            CancellationFeePolicy::BasisPoints(1_000).fee_for(base),
            Money::from_minor(800)
        );
        assert_eq!(
            CancellationFeePolicy::Fixed(Money::from_minor(250)).fee_for(base),
            Money::from_minor(250)
        );
        // capped at 100%
        assert_eq!(CancellationFeePolicy::BasisPoints(20_000).fee_for(base), base);
    }

    #[test]
    fn test_paths_live_under_work_dir() {
        let config = Config::with_overrides("/tmp/orders-test", 0);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/orders-test/orders.redb"));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/orders-test/logs"));
    }

    #[test]
    fn test_engine_defaults() {
        let engine = EngineConfig::default();
        assert_eq!(engine.default_service_radius_m, 30_000.0);
        assert!(!engine.charge_store_on_driver_cancel);
        assert_eq!(engine.cancellation_fee, CancellationFeePolicy::BasisPoints(1_000));
    }
}
