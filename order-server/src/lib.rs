//! Order Server - delivery order lifecycle and store ledger engine
//!
//! # Overview
//!
//! - **Orders** (`orders`): event-sourced order state machine on redb, with
//!   ledger postings committed in the same transaction as the transition
//! - **Authorization** (`auth`): actor extractor and the transition allow-list
//! - **Geofence** (`geo`): delivery radius check at checkout
//! - **Payments** (`payment`): gateway client and callback reconciliation
//! - **HTTP API** (`api`): axum routes over the engine
//!
//! # Module layout
//!
//! ```text
//! order-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # actor extractor, policy
//! ├── api/           # HTTP routes and handlers
//! ├── orders/        # manager, actions, appliers, storage, ledger, reasons
//! ├── payment/       # gateway client, reconciler
//! ├── utils/         # error mapping, logger
//! └── geo.rs         # geofence
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod geo;
pub mod orders;
pub mod payment;
pub mod utils;

// Re-export public types
pub use auth::CurrentActor;
pub use core::{Config, EngineConfig, Server, ServerState};
pub use orders::{OrderStorage, OrdersManager};
pub use payment::{HttpPaymentGateway, PaymentGateway, PaymentReconciler};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// Security log helper - writes to the `security` target
///
/// Security logs go to `security/security.YYYY-MM-DD.log` and are never
/// rotated away.
///
/// ```ignore
/// security_log!("WARN", "permission_denied", actor_id = "m-1", operation = "record_payout");
/// ```
#[macro_export]
macro_rules! security_log {
    ("WARN", $event:expr, $($arg:tt)*) => {
        tracing::warn!(
            target: "security",
            event = $event,
            timestamp = %chrono::Local::now().to_rfc3339(),
            $($arg)*
        );
    };
    ("ERROR", $event:expr, $($arg:tt)*) => {
        tracing::error!(
            target: "security",
            event = $event,
            timestamp = %chrono::Local::now().to_rfc3339(),
            $($arg)*
        );
    };
    ($level:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            timestamp = %chrono::Local::now().to_rfc3339(),
            $($arg)*
        );
    };
}

/// Load `.env`, create the work directory and start logging
pub fn setup_environment() -> anyhow::Result<Config> {
    // Missing .env is fine
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    std::fs::create_dir_all(&config.work_dir)?;

    let log_dir = config.log_dir();
    init_logger_with_file(
        &config.log_level,
        config.log_json,
        log_dir.to_str(),
    )?;

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
   ____          __
  / __ \_________/ /__  _____
 / / / / ___/ __  / _ \/ ___/
/ /_/ / /  / /_/ /  __/ /
\____/_/   \__,_/\___/_/
   ________  ______   _____  _____
  / ___/ _ \/ ___/ | / / _ \/ ___/
 (__  )  __/ /   | |/ /  __/ /
/____/\___/_/    |___/\___/_/
    "#
    );
}
