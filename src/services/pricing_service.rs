use rust_decimal::Decimal;

use crate::models::day_selection::DaySelection;
use crate::models::pricing::{PricingConfiguration, Totals};

pub struct PricingService;

// Inputs are bounded by validation, so saturation never changes a real total.
fn sum<I: IntoIterator<Item = Decimal>>(amounts: I) -> Decimal {
    amounts
        .into_iter()
        .fold(Decimal::ZERO, |total, amount| total.saturating_add(amount))
}

impl PricingService {
    /// Sum of room-line totals for one day
    pub fn calculate_room_cost(day: &DaySelection) -> Decimal {
        sum(day.room_selections.iter().map(|room| room.total_price))
    }

    /// Sum of meal price times quantity for one day
    pub fn calculate_meal_cost(day: &DaySelection) -> Decimal {
        sum(day.meals.iter().map(|meal| meal.total()))
    }

    pub fn calculate_transport_cost(day: &DaySelection) -> Decimal {
        day.transport
            .as_ref()
            .map(|transport| transport.total())
            .unwrap_or(Decimal::ZERO)
    }

    /// Catalog and custom activities are priced the same way
    pub fn calculate_activity_cost(day: &DaySelection) -> Decimal {
        sum(day.activities.iter().map(|activity| activity.price))
    }

    pub fn day_subtotal(day: &DaySelection) -> Decimal {
        sum([
            Self::calculate_room_cost(day),
            Self::calculate_meal_cost(day),
            Self::calculate_transport_cost(day),
            Self::calculate_activity_cost(day),
        ])
    }

    /// Markup on the subtotal, GST on subtotal plus markup, discount last.
    /// Values are exact and unrounded; the grand total never goes below zero.
    pub fn compute_totals<'a, I>(days: I, pricing: &PricingConfiguration) -> Totals
    where
        I: IntoIterator<Item = &'a DaySelection>,
    {
        let hundred = Decimal::ONE_HUNDRED;
        let subtotal = sum(days.into_iter().map(Self::day_subtotal));
        let markup_amount = subtotal.saturating_mul(pricing.markup_percentage) / hundred;
        let taxable = subtotal.saturating_add(markup_amount);
        let gst_amount = taxable.saturating_mul(pricing.gst_percentage) / hundred;
        let discount_amount = pricing.discount_amount;
        let grand_total = taxable
            .saturating_add(gst_amount)
            .saturating_sub(discount_amount)
            .max(Decimal::ZERO);

        Totals {
            subtotal,
            markup_amount,
            gst_amount,
            discount_amount,
            grand_total,
        }
    }
}
