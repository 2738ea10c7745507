use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CREW_OF_TWO_CENTS: i64 = 8500;
pub const DEFAULT_CREW_OF_THREE_CENTS: i64 = 12000;
pub const DEFAULT_CREW_OF_FOUR_CENTS: i64 = 15000;

/// Hourly labor rates per crew size, in cents. A single document for the
/// whole business; saving overwrites it in place.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamRates {
    pub crew_of_two_cents: i64,
    pub crew_of_three_cents: i64,
    pub crew_of_four_cents: i64,
    pub updated_at: DateTime<Utc>,
}

impl Default for TeamRates {
    fn default() -> Self {
        Self {
            crew_of_two_cents: DEFAULT_CREW_OF_TWO_CENTS,
            crew_of_three_cents: DEFAULT_CREW_OF_THREE_CENTS,
            crew_of_four_cents: DEFAULT_CREW_OF_FOUR_CENTS,
            updated_at: Utc::now(),
        }
    }
}

impl TeamRates {
    pub fn rate_for(&self, crew_size: i64) -> Option<i64> {
        match crew_size {
            2 => Some(self.crew_of_two_cents),
            3 => Some(self.crew_of_three_cents),
            4 => Some(self.crew_of_four_cents),
            _ => None,
        }
    }
}
