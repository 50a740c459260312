//! Reconciles detector presence signals with seat and booking state.

use crate::library::{released_event, Library};
use crate::models::{BookingStatus, Seat, SeatStatus};
use crate::service::SeatService;
use carrel_shared::{ArrivalConfirmedEvent, ReleaseReason, SeatEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// One reading from the occupancy detector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySignal {
    pub seat_id: String,
    pub occupied: bool,
}

impl OccupancySignal {
    pub fn new(seat_id: impl Into<String>, occupied: bool) -> Self {
        Self {
            seat_id: seat_id.into(),
            occupied,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyOutcome {
    /// A frozen seat's holder was seen
    ArrivalConfirmed,
    /// Someone sat down at a seat that was not frozen
    MarkedOccupied,
    /// An occupied seat was seen empty
    Released,
    Unchanged,
}

impl Library {
    /// Apply a detector reading. Unknown seats yield `None`.
    pub fn record_occupancy(
        &mut self,
        seat_id: &str,
        occupied: bool,
        now: DateTime<Utc>,
    ) -> Option<OccupancyOutcome> {
        let Some(seat) = self.registry.get_mut(seat_id) else {
            debug!("Ignoring occupancy signal for unknown seat {}", seat_id);
            return None;
        };
        let was = seat.status;

        if !occupied {
            if was != SeatStatus::Occupied {
                return Some(OccupancyOutcome::Unchanged);
            }
            seat.vacate(now);
            info!("Seat {} vacated (detector)", seat_id);
            self.emit(released_event(seat_id, ReleaseReason::Vacated, now));
            if self.rules.complete_booking_on_absence {
                self.close_active(seat_id, BookingStatus::Completed, now);
            }
            return Some(OccupancyOutcome::Released);
        }

        if was != SeatStatus::Occupied {
            seat.occupy(now);
        }
        let booking_id = self.stamp_arrival(seat_id, now);

        let outcome = match was {
            SeatStatus::Occupied => return Some(OccupancyOutcome::Unchanged),
            SeatStatus::Frozen => OccupancyOutcome::ArrivalConfirmed,
            SeatStatus::Available | SeatStatus::Reserved => OccupancyOutcome::MarkedOccupied,
        };

        info!("Seat {} occupied (detector, was {})", seat_id, was);
        self.emit(SeatEvent::ArrivalConfirmed(ArrivalConfirmedEvent {
            seat_id: seat_id.to_string(),
            booking_id,
            detected: true,
            timestamp: now.timestamp_millis(),
        }));
        Some(outcome)
    }
}

/// Feeds detector signals into the seat service
#[derive(Clone)]
pub struct OccupancyReconciler {
    service: SeatService,
}

impl OccupancyReconciler {
    pub fn new(service: SeatService) -> Self {
        Self { service }
    }

    pub async fn apply(&self, signal: OccupancySignal) -> Option<OccupancyOutcome> {
        self.service
            .record_occupancy(&signal.seat_id, signal.occupied)
            .await
    }
}

/// Forwards a reading only when it differs from the previous one for that
/// seat. Seats start out as empty.
#[derive(Debug, Default)]
pub struct EdgeFilter {
    last: HashMap<String, bool>,
}

impl EdgeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from current seat state so a restart does not miss the first
    /// "empty" reading for an occupied seat.
    pub fn from_seats<'a>(seats: impl IntoIterator<Item = &'a Seat>) -> Self {
        Self {
            last: seats
                .into_iter()
                .map(|s| (s.id.clone(), s.status == SeatStatus::Occupied))
                .collect(),
        }
    }

    pub fn observe(&mut self, signal: &OccupancySignal) -> bool {
        let previous = self
            .last
            .insert(signal.seat_id.clone(), signal.occupied)
            .unwrap_or(false);
        previous != signal.occupied
    }
}
