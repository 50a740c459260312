use crate::models::Booking;
use uuid::Uuid;

/// Append-only booking log
#[derive(Debug, Clone, Default)]
pub struct BookingLedger {
    bookings: Vec<Booking>,
}

impl BookingLedger {
    pub fn new(bookings: Vec<Booking>) -> Self {
        Self { bookings }
    }

    pub(crate) fn append(&mut self, booking: Booking) {
        self.bookings.push(booking);
    }

    pub fn get(&self, booking_id: &Uuid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == *booking_id)
    }

    /// The single active booking for a seat, if any
    pub fn active_for(&self, seat_id: &str) -> Option<&Booking> {
        self.bookings
            .iter()
            .rev()
            .find(|b| b.seat_id == seat_id && b.is_active())
    }

    pub(crate) fn active_for_mut(&mut self, seat_id: &str) -> Option<&mut Booking> {
        self.bookings
            .iter_mut()
            .rev()
            .find(|b| b.seat_id == seat_id && b.is_active())
    }

    pub fn as_slice(&self) -> &[Booking] {
        &self.bookings
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Booking> {
        self.bookings.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.bookings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookingStatus, Holder};
    use chrono::{Duration, Utc};

    #[test]
    fn test_active_lookup_skips_closed() {
        let now = Utc::now();
        let mut ledger = BookingLedger::default();

        let mut old = Booking::new("A1", Holder::new("u-1", "Ada"), 30, now, now);
        old.status = BookingStatus::NoShow;
        ledger.append(old);
        assert!(ledger.active_for("A1").is_none());

        let fresh = Booking::new("A1", Holder::new("u-2", "Grace"), 60, now + Duration::minutes(15), now);
        let fresh_id = fresh.id;
        ledger.append(fresh);

        assert_eq!(ledger.active_for("A1").unwrap().id, fresh_id);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.get(&fresh_id).is_some());
    }
}
