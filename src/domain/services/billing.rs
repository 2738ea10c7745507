/// Final balance owed at job completion: materials plus labor, minus any
/// deposit already captured. Labor is hours times the rate snapshot on the
/// booking; the product is rounded to the nearest cent exactly once. The
/// result can be negative when the deposit exceeded the job total.
pub fn final_balance_cents(
    hours_worked: f64,
    hourly_rate_cents: i64,
    materials_cents: i64,
    deposit_credit_cents: i64,
) -> i64 {
    // The float product saturates on `as i64`, and the integer steps
    // saturate explicitly, so absurd inputs clamp instead of wrapping.
    let labor_cents = (hours_worked * hourly_rate_cents as f64).round() as i64;
    materials_cents
        .saturating_add(labor_cents)
        .saturating_sub(deposit_credit_cents)
}
