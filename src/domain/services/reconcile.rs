use chrono::Utc;
use tracing::warn;

use crate::domain::models::booking::{Booking, BookingStatus};
use crate::domain::models::calendar_day::{CalendarDay, TimeSlot};
use crate::domain::services::slots::sort_by_time;

/// Rebuild slot occupancy for one day from the active booking set. Every
/// slot is reset to open first, so stale markers left by deleted or moved
/// bookings disappear. When two bookings claim the same time the one
/// processed last wins; with creation-ordered input that is the newest.
pub fn reconcile(slots: Vec<TimeSlot>, bookings: &[Booking]) -> Vec<TimeSlot> {
    let mut slots = sort_by_time(slots);

    for slot in &mut slots {
        slot.is_available = true;
        slot.booking_id = None;
    }

    for booking in bookings {
        if booking.status == BookingStatus::Cancelled {
            continue;
        }

        match slots.iter_mut().find(|s| s.time == booking.service.time_slot) {
            Some(slot) => {
                if let Some(prev) = &slot.booking_id {
                    warn!(
                        "bookings {} and {} both claim {} on {}; keeping the latter",
                        prev, booking.id, booking.service.time_slot, booking.service.date
                    );
                }
                slot.is_available = false;
                slot.booking_id = Some(booking.id.clone());
            }
            None => {
                warn!(
                    "booking {} references slot {} on {} which no longer exists",
                    booking.id, booking.service.time_slot, booking.service.date
                );
            }
        }
    }

    slots
}

pub fn reconcile_day(mut day: CalendarDay, bookings: &[Booking]) -> CalendarDay {
    day.time_slots = reconcile(day.time_slots, bookings);
    day.updated_at = Utc::now();
    day
}
