use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use crate::core::{Config, Result, ServerError};
use crate::orders::OrdersManager;
use crate::payment::{HttpPaymentGateway, PaymentGateway, PaymentReconciler};

/// Shared handles for every HTTP handler
///
/// Cloning is cheap: the manager shares its storage and channels, the
/// reconciler sits behind an `Arc`.
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | Immutable configuration |
/// | orders | Order engine (commands, stores, ledger, reasons) |
/// | reconciler | Gateway callback entry point |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub orders: OrdersManager,
    pub reconciler: Arc<PaymentReconciler>,
}

impl ServerState {
    pub fn new(config: Config, orders: OrdersManager, reconciler: Arc<PaymentReconciler>) -> Self {
        Self {
            config,
            orders,
            reconciler,
        }
    }

    /// Initialize server state
    ///
    /// 1. Work directory (database and logs)
    /// 2. Order database at `work_dir/orders.redb`
    /// 3. Gateway client, when verification is enabled and configured
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir).map_err(ServerError::WorkDir)?;

        let orders = OrdersManager::new(config.db_path(), config.engine.clone())?;
        tracing::info!(
            db_path = %config.db_path().display(),
            epoch = %orders.epoch(),
            "Order engine ready"
        );

        let gateway: Option<Arc<dyn PaymentGateway>> =
            if config.payment.verify_callbacks && config.payment.is_configured() {
                Some(Arc::new(HttpPaymentGateway::from_config(&config.payment)?))
            } else {
                if config.payment.verify_callbacks {
                    tracing::warn!(
                        "VERIFY_PAYMENT_CALLBACKS is set but the gateway is not configured; callbacks are applied unverified"
                    );
                }
                None
            };

        let reconciler = Arc::new(PaymentReconciler::new(orders.clone(), gateway));
        Ok(Self::new(config.clone(), orders, reconciler))
    }

    /// Start background tasks
    ///
    /// Must run before `Server::run()` starts accepting requests.
    /// - change notification logger
    pub async fn start_background_tasks(&self) {
        let mut changes = self.orders.subscribe_changes();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => tracing::debug!(
                        order_id = %change.order_id,
                        old_status = ?change.old_status,
                        new_status = ?change.new_status,
                        payment_status = ?change.payment_status,
                        sequence = change.sequence,
                        "Order changed"
                    ),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Change notification subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }

    pub fn orders(&self) -> &OrdersManager {
        &self.orders
    }

    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }
}
