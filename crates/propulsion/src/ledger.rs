//! Vessel-wide resource inventory seen by the warp core.

use std::collections::BTreeMap;

use blueshift_config::ResourceStockConfig;

/// Inventory operations the warp core needs from the host.
///
/// Shortfalls are reported by granting less than requested; nothing here fails.
pub trait ResourceLedger {
    /// Current `(amount, capacity)` of a resource. Unknown resources report `(0, 0)`.
    fn available(&self, resource: &str) -> (f64, f64);

    /// Remove up to `amount` of a resource, returning what was actually granted.
    fn request(&mut self, resource: &str, amount: f64) -> f64;

    /// Store up to `amount` of a resource, returning what fit.
    fn deposit(&mut self, resource: &str, amount: f64) -> f64;
}

/// Amount and capacity of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stock {
    pub amount: f64,
    pub max_amount: f64,
}

/// In-memory ledger keyed by resource name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePool {
    stocks: BTreeMap<String, Stock>,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper for tests and sandboxes.
    pub fn with_stock(mut self, resource: &str, amount: f64, max_amount: f64) -> Self {
        self.insert(resource, amount, max_amount);
        self
    }

    pub fn from_config(stocks: &[ResourceStockConfig]) -> Self {
        let mut pool = Self::new();
        for stock in stocks {
            pool.insert(&stock.resource, stock.amount, stock.max_amount);
        }
        pool
    }

    /// Add or replace a resource. The amount is clamped into `[0, max_amount]`.
    pub fn insert(&mut self, resource: &str, amount: f64, max_amount: f64) {
        let max_amount = max_amount.max(0.0);
        self.stocks.insert(
            resource.to_string(),
            Stock {
                amount: amount.clamp(0.0, max_amount),
                max_amount,
            },
        );
    }

    pub fn amount(&self, resource: &str) -> f64 {
        self.stocks.get(resource).map_or(0.0, |stock| stock.amount)
    }
}

impl ResourceLedger for ResourcePool {
    fn available(&self, resource: &str) -> (f64, f64) {
        self.stocks
            .get(resource)
            .map_or((0.0, 0.0), |stock| (stock.amount, stock.max_amount))
    }

    fn request(&mut self, resource: &str, amount: f64) -> f64 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let Some(stock) = self.stocks.get_mut(resource) else {
            return 0.0;
        };
        let granted = amount.min(stock.amount);
        stock.amount -= granted;
        granted
    }

    fn deposit(&mut self, resource: &str, amount: f64) -> f64 {
        if amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let Some(stock) = self.stocks.get_mut(resource) else {
            return 0.0;
        };
        let stored = amount.min((stock.max_amount - stock.amount).max(0.0));
        stock.amount += stored;
        stored
    }
}
