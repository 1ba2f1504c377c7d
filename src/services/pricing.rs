use crate::entities::product;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Returns the unit price actually charged for `product` at `now`.
///
/// The promotional price applies iff it is set and `now` falls inside the
/// inclusive `[offer_start, offer_end]` window; otherwise the base price
/// applies. Callers must use one captured `now` for a whole settlement so
/// that line items cannot straddle a window boundary mid-transaction.
pub fn effective_price(product: &product::Model, now: DateTime<Utc>) -> Decimal {
    if let (Some(offer_price), Some(start), Some(end)) =
        (product.offer_price, product.offer_start, product.offer_end)
    {
        if start <= now && now <= end {
            return offer_price;
        }
    }
    product.price
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn product(
        price: Decimal,
        offer_price: Option<Decimal>,
        offer_start: Option<DateTime<Utc>>,
        offer_end: Option<DateTime<Utc>>,
    ) -> product::Model {
        product::Model {
            id: Uuid::new_v4(),
            sku: "SKU-1".into(),
            name: "Widget".into(),
            description: None,
            price,
            offer_price,
            offer_start,
            offer_end,
            stock_quantity: 10,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn offer_applies_inside_window() {
        let now = Utc::now();
        let p = product(
            dec!(100),
            Some(dec!(80)),
            Some(now - Duration::days(1)),
            Some(now + Duration::days(1)),
        );
        assert_eq!(effective_price(&p, now), dec!(80));
    }

    #[test]
    fn base_price_after_window_without_data_change() {
        let now = Utc::now();
        let p = product(
            dec!(100),
            Some(dec!(80)),
            Some(now - Duration::days(2)),
            Some(now - Duration::days(1)),
        );
        // Same row, clock moved past offer_end
        assert_eq!(effective_price(&p, now), dec!(100));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let start = Utc::now();
        let end = start + Duration::hours(1);
        let p = product(dec!(100), Some(dec!(80)), Some(start), Some(end));

        assert_eq!(effective_price(&p, start), dec!(80));
        assert_eq!(effective_price(&p, end), dec!(80));
        assert_eq!(
            effective_price(&p, start - Duration::seconds(1)),
            dec!(100)
        );
        assert_eq!(effective_price(&p, end + Duration::seconds(1)), dec!(100));
    }

    #[test]
    fn no_offer_price_means_base_price() {
        let now = Utc::now();
        let p = product(
            dec!(100),
            None,
            Some(now - Duration::days(1)),
            Some(now + Duration::days(1)),
        );
        assert_eq!(effective_price(&p, now), dec!(100));
    }

    #[test]
    fn missing_window_bound_disables_offer() {
        let now = Utc::now();
        let p = product(dec!(100), Some(dec!(80)), Some(now - Duration::days(1)), None);
        assert_eq!(effective_price(&p, now), dec!(100));

        let p = product(dec!(100), Some(dec!(80)), None, Some(now + Duration::days(1)));
        assert_eq!(effective_price(&p, now), dec!(100));
    }
}
