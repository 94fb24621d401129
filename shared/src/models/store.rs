//! Store Model

use crate::money::Money;
use crate::order::GeoPoint;
use serde::{Deserialize, Serialize};

/// Store entity
///
/// Registration fields are owned by the store-management collaborator;
/// `ledger_balance` is owned by the ledger and only changes through postings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub store_id: i64,
    #[serde(default)]
    pub name: String,
    /// Merchant account that may act on this store's orders
    pub owner_id: String,
    pub is_verified: bool,
    pub is_open: bool,
    pub location: GeoPoint,
    /// Delivery radius in metres
    pub service_radius_m: f64,
    /// Cached sum of this store's ledger entries
    #[serde(default)]
    pub ledger_balance: Money,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Store {
    /// Verified and open
    pub fn accepts_orders(&self) -> bool {
        self.is_verified && self.is_open
    }
}

/// Upsert store payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreUpsert {
    #[serde(default)]
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_open: bool,
    pub location: GeoPoint,
    /// Falls back to the configured default radius
    pub service_radius_m: Option<f64>,
}
