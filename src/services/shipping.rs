use crate::entities::shipping_rule::{self, ShippingKind};
use rust_decimal::Decimal;

/// Returns the shipping cost for `rule` given the order subtotal.
///
/// No rule selected means no shipping charge. `ThresholdFree` rules waive
/// the cost once the subtotal reaches `free_over`; a null threshold always
/// ships free. The kind set is closed, so there is no fallback branch for
/// unrecognized rules.
pub fn shipping_cost(rule: Option<&shipping_rule::Model>, subtotal: Decimal) -> Decimal {
    let Some(rule) = rule else {
        return Decimal::ZERO;
    };

    match rule.kind {
        ShippingKind::Flat => rule.flat_cost,
        ShippingKind::Free => Decimal::ZERO,
        ShippingKind::ThresholdFree => match rule.free_over {
            Some(minimum) if subtotal < minimum => rule.flat_cost,
            _ => Decimal::ZERO,
        },
    }
}
