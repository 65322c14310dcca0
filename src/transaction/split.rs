//! The split calculator: derives the profit/debt breakdown of a trip payment.

/// The derived monetary fields for a trip-price submission.
///
/// Fees are modeled as a debt owed to the platform and recoverable later, so
/// `rider_profit` already nets out fees. Downstream aggregation must not
/// subtract `platform_debt` from profit again.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TripSplit {
    /// Trip price plus bonuses.
    pub gross_total: f64,
    /// The amount paid out, equal to the gross total.
    pub amount_received: f64,
    /// What the driver keeps: trip price plus bonuses plus (negative) fees.
    pub rider_profit: f64,
    /// What the driver owes the platform: the fees with the sign flipped.
    pub platform_debt: f64,
}

impl TripSplit {
    /// Compute the split for a trip.
    ///
    /// `system_fees` is typically negative, representing a deduction from the
    /// gross total.
    pub fn from_trip(trip_price: f64, bonuses: f64, system_fees: f64) -> Self {
        let gross_total = trip_price + bonuses;

        Self {
            gross_total,
            amount_received: gross_total,
            rider_profit: trip_price + bonuses + system_fees,
            platform_debt: -system_fees,
        }
    }
}
