use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::config::CartConfig;
use crate::domain::cart::CartLine;
use crate::domain::product::ProductId;

pub const DEFAULT_MIRROR_TTL_SECS: i64 = 60;

/// Client-side copy of cart quantities, used only for the badge count.
///
/// The remote cart is authoritative. Successful writes adjust the copy,
/// but freshness is measured from the last [`replace`](Self::replace) with
/// remote lines, so a stale mirror reports no count until reconciled.
#[derive(Clone, Debug)]
pub struct LocalMirror {
    quantities: BTreeMap<ProductId, u32>,
    reconciled_at: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl Default for LocalMirror {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_MIRROR_TTL_SECS))
    }
}

impl LocalMirror {
    pub fn new(ttl: Duration) -> Self {
        Self { quantities: BTreeMap::new(), reconciled_at: None, ttl }
    }

    pub fn from_config(config: &CartConfig) -> Self {
        let ttl = i64::try_from(config.mirror_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| Duration::seconds(DEFAULT_MIRROR_TTL_SECS));
        Self::new(ttl)
    }

    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.reconciled_at.is_some_and(|at| now - at < self.ttl)
    }

    pub fn badge_count(&self, now: DateTime<Utc>) -> Option<u32> {
        self.is_fresh(now).then(|| self.quantities.values().copied().fold(0u32, u32::saturating_add))
    }

    pub fn quantity(&self, product_id: ProductId) -> Option<u32> {
        self.quantities.get(&product_id).copied()
    }

    pub fn record_add(&mut self, product_id: ProductId, quantity: u32) {
        let entry = self.quantities.entry(product_id).or_insert(0);
        *entry = entry.saturating_add(quantity);
    }

    pub fn record_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.quantities.remove(&product_id);
        } else {
            self.quantities.insert(product_id, quantity);
        }
    }

    pub fn record_remove(&mut self, product_id: ProductId) {
        self.quantities.remove(&product_id);
    }

    pub fn record_clear(&mut self) {
        self.quantities.clear();
    }

    /// Forces the next badge read to reconcile.
    pub fn invalidate(&mut self) {
        self.reconciled_at = None;
    }

    pub fn replace(&mut self, lines: &[CartLine], now: DateTime<Utc>) {
        self.quantities.clear();
        for line in lines {
            self.record_add(line.product_id, line.quantity);
        }
        self.reconciled_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::LocalMirror;
    use crate::config::CartConfig;
    use crate::domain::cart::{CartLine, UserId};
    use crate::domain::product::ProductId;

    fn line(product: u32, quantity: u32) -> CartLine {
        CartLine {
            user_id: UserId("u-1".to_string()),
            product_id: ProductId(product),
            quantity,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn configured_ttl_bounds_freshness() {
        let now = Utc::now();
        let mut mirror = LocalMirror::from_config(&CartConfig { mirror_ttl_secs: 5 });
        mirror.replace(&[line(91, 2)], now);

        assert_eq!(mirror.badge_count(now + Duration::seconds(4)), Some(2));
        assert_eq!(mirror.badge_count(now + Duration::seconds(5)), None);
    }

    #[test]
    fn never_reconciled_mirror_has_no_badge() {
        let mut mirror = LocalMirror::default();
        mirror.record_add(ProductId(91), 2);
        assert_eq!(mirror.badge_count(Utc::now()), None);
        assert_eq!(mirror.quantity(ProductId(91)), Some(2));
    }

    #[test]
    fn reconciled_mirror_tracks_writes_until_it_expires() {
        let now = Utc::now();
        let mut mirror = LocalMirror::new(Duration::seconds(30));
        mirror.replace(&[line(91, 1), line(92, 3)], now);
        assert_eq!(mirror.badge_count(now), Some(4));

        mirror.record_add(ProductId(91), 2);
        mirror.record_quantity(ProductId(92), 1);
        assert_eq!(mirror.badge_count(now + Duration::seconds(10)), Some(4));

        mirror.record_remove(ProductId(91));
        assert_eq!(mirror.badge_count(now + Duration::seconds(10)), Some(1));

        assert_eq!(mirror.badge_count(now + Duration::seconds(30)), None);
    }

    #[test]
    fn invalidation_and_clear() {
        let now = Utc::now();
        let mut mirror = LocalMirror::default();
        mirror.replace(&[line(91, 1)], now);
        mirror.record_clear();
        assert_eq!(mirror.badge_count(now), Some(0));

        mirror.invalidate();
        assert_eq!(mirror.badge_count(now), None);
    }
}
