use uuid::Uuid;

/// A seat entered its freeze window on behalf of a new booking.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SeatFrozenEvent {
    pub seat_id: String,
    pub booking_id: Uuid,
    pub user_id: String,
    pub frozen_until: i64, // Unix millis
    pub timestamp: i64,
}

/// The holder showed up, either confirmed by hand or seen by the detector.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct ArrivalConfirmedEvent {
    pub seat_id: String,
    pub booking_id: Option<Uuid>,
    pub detected: bool,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseReason {
    Released,
    Cancelled,
    Expired,
    Vacated,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SeatReleasedEvent {
    pub seat_id: String,
    pub reason: ReleaseReason,
    pub timestamp: i64,
}

/// A booking left the `active` state. `status` is the ledger spelling
/// (`completed`, `cancelled`, `no-show`).
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct BookingClosedEvent {
    pub booking_id: Uuid,
    pub seat_id: String,
    pub status: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct SeatStatusOverriddenEvent {
    pub seat_id: String,
    pub status: String,
    pub timestamp: i64,
}

/// Everything the seat service broadcasts after a state change.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SeatEvent {
    SeatFrozen(SeatFrozenEvent),
    ArrivalConfirmed(ArrivalConfirmedEvent),
    SeatReleased(SeatReleasedEvent),
    BookingClosed(BookingClosedEvent),
    StatusOverridden(SeatStatusOverriddenEvent),
    LibraryReset {
        seat_count: usize,
        timestamp: i64,
    },
}

impl SeatEvent {
    pub fn seat_id(&self) -> Option<&str> {
        match self {
            SeatEvent::SeatFrozen(e) => Some(&e.seat_id),
            SeatEvent::ArrivalConfirmed(e) => Some(&e.seat_id),
            SeatEvent::SeatReleased(e) => Some(&e.seat_id),
            SeatEvent::BookingClosed(e) => Some(&e.seat_id),
            SeatEvent::StatusOverridden(e) => Some(&e.seat_id),
            SeatEvent::LibraryReset { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_is_tagged() {
        let event = SeatEvent::SeatReleased(SeatReleasedEvent {
            seat_id: "A1".to_string(),
            reason: ReleaseReason::Expired,
            timestamp: 0,
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "seat_released");
        assert_eq!(json["reason"], "expired");
        assert_eq!(event.seat_id(), Some("A1"));
    }
}
