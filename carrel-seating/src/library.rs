use crate::error::{SeatingError, SeatingResult};
use crate::layout::SeatLayout;
use crate::ledger::BookingLedger;
use crate::models::{Booking, BookingStatus, Holder, LibraryStats, Seat, SeatStatus};
use crate::registry::SeatRegistry;
use carrel_shared::{
    ArrivalConfirmedEvent, BookingClosedEvent, ReleaseReason, SeatEvent, SeatFrozenEvent,
    SeatReleasedEvent, SeatStatusOverriddenEvent,
};
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

pub const DEFAULT_FREEZE_MINUTES: i64 = 15;

/// Timing and reconciliation policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatingRules {
    /// Hold after booking before a no-show is declared
    pub freeze_window: Duration,
    /// Complete the seat's active booking when the detector sees it vacated
    pub complete_booking_on_absence: bool,
}

impl Default for SeatingRules {
    fn default() -> Self {
        Self {
            freeze_window: Duration::minutes(DEFAULT_FREEZE_MINUTES),
            complete_booking_on_absence: false,
        }
    }
}

/// Everything that gets persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LibrarySnapshot {
    pub layout: SeatLayout,
    pub seats: Vec<Seat>,
    pub bookings: Vec<Booking>,
}

/// Seat registry and booking ledger, mutated together.
///
/// Every operation takes `now` explicitly; callers own the clock.
/// State changes are queued as [`SeatEvent`]s until [`Library::drain_events`].
#[derive(Debug)]
pub struct Library {
    pub(crate) registry: SeatRegistry,
    pub(crate) ledger: BookingLedger,
    pub(crate) layout: SeatLayout,
    pub(crate) rules: SeatingRules,
    outbox: Vec<SeatEvent>,
}

impl Library {
    /// Fresh library seeded from a default layout with an empty ledger
    pub fn new(layout: SeatLayout, rules: SeatingRules, now: DateTime<Utc>) -> Self {
        Self {
            registry: SeatRegistry::new(layout.seats(now)),
            ledger: BookingLedger::default(),
            layout,
            rules,
            outbox: Vec::new(),
        }
    }

    /// Rebuild from persisted state, repairing anything that breaks the
    /// seat or ledger invariants. An empty seat list falls back to the
    /// layout defaults.
    pub fn from_snapshot(snapshot: LibrarySnapshot, rules: SeatingRules, now: DateTime<Utc>) -> Self {
        let LibrarySnapshot { layout, mut seats, mut bookings } = snapshot;

        if seats.is_empty() {
            warn!("Snapshot has no seats, seeding {} layout", layout);
            seats = layout.seats(now);
        }

        for seat in seats.iter_mut() {
            match (seat.status, seat.frozen_until) {
                (SeatStatus::Frozen, None) => {
                    warn!("Seat {} frozen without expiry, releasing", seat.id);
                    seat.vacate(now);
                }
                (status, Some(_)) if status != SeatStatus::Frozen => {
                    warn!("Seat {} is {} but carried a freeze expiry, dropping it", seat.id, status);
                    seat.frozen_until = None;
                }
                _ => {}
            }
        }

        // Keep only the newest active booking per seat
        let mut newest_active: HashMap<String, usize> = HashMap::new();
        for (idx, booking) in bookings.iter().enumerate() {
            if booking.is_active() {
                newest_active.insert(booking.seat_id.clone(), idx);
            }
        }
        for (idx, booking) in bookings.iter_mut().enumerate() {
            if booking.is_active() && newest_active.get(&booking.seat_id) != Some(&idx) {
                warn!("Booking {} superseded on seat {}, completing", booking.id, booking.seat_id);
                booking.status = BookingStatus::Completed;
            }
        }

        Self {
            registry: SeatRegistry::new(seats),
            ledger: BookingLedger::new(bookings),
            layout,
            rules,
            outbox: Vec::new(),
        }
    }

    pub fn snapshot(&self) -> LibrarySnapshot {
        LibrarySnapshot {
            layout: self.layout,
            seats: self.registry.to_vec(),
            bookings: self.ledger.as_slice().to_vec(),
        }
    }

    pub fn layout(&self) -> SeatLayout {
        self.layout
    }

    pub fn rules(&self) -> &SeatingRules {
        &self.rules
    }

    pub fn registry(&self) -> &SeatRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &BookingLedger {
        &self.ledger
    }

    pub fn seat(&self, seat_id: &str) -> Option<&Seat> {
        self.registry.get(seat_id)
    }

    pub fn active_booking(&self, seat_id: &str) -> Option<&Booking> {
        self.ledger.active_for(seat_id)
    }

    /// Freeze an available seat for `holder` and open a booking.
    pub fn book(
        &mut self,
        seat_id: &str,
        holder: Holder,
        duration_minutes: u32,
        now: DateTime<Utc>,
    ) -> SeatingResult<Booking> {
        if duration_minutes == 0 {
            return Err(SeatingError::InvalidDuration);
        }

        let seat = self
            .registry
            .get_mut(seat_id)
            .ok_or_else(|| SeatingError::NotFound(seat_id.to_string()))?;

        if !seat.is_available() {
            return Err(SeatingError::Unavailable {
                seat_id: seat_id.to_string(),
                status: seat.status,
            });
        }

        // An available seat can still have an open booking after a
        // release-by-absence or an admin override.
        if let Some(stale) = self.ledger.active_for_mut(seat_id) {
            warn!("Closing stale booking {} on seat {}", stale.id, seat_id);
            stale.status = BookingStatus::Completed;
            let event = closed_event(stale, now);
            self.outbox.push(event);
        }

        let frozen_until = now + self.rules.freeze_window;

        seat.status = SeatStatus::Frozen;
        seat.reserved_by = Some(holder.user_id.clone());
        seat.reserved_at = Some(now);
        seat.reservation_duration = Some(duration_minutes);
        seat.frozen_until = Some(frozen_until);
        seat.last_updated = now;

        let booking = Booking::new(seat_id, holder, duration_minutes, frozen_until, now);
        self.ledger.append(booking.clone());

        info!(
            "Seat {} frozen for {} until {} (booking {})",
            seat_id, booking.user_id, frozen_until, booking.id
        );
        self.outbox.push(SeatEvent::SeatFrozen(SeatFrozenEvent {
            seat_id: seat_id.to_string(),
            booking_id: booking.id,
            user_id: booking.user_id.clone(),
            frozen_until: frozen_until.timestamp_millis(),
            timestamp: now.timestamp_millis(),
        }));

        Ok(booking)
    }

    /// The holder arrived at a frozen seat.
    pub fn confirm_arrival(&mut self, seat_id: &str, now: DateTime<Utc>) -> SeatingResult<Seat> {
        let seat = self
            .registry
            .get_mut(seat_id)
            .ok_or_else(|| SeatingError::NotFound(seat_id.to_string()))?;

        if seat.status != SeatStatus::Frozen {
            return Err(SeatingError::NotFrozen(seat_id.to_string()));
        }

        seat.occupy(now);
        let seat = seat.clone();
        let booking_id = self.stamp_arrival(seat_id, now);

        info!("Arrival confirmed at seat {}", seat_id);
        self.outbox.push(SeatEvent::ArrivalConfirmed(ArrivalConfirmedEvent {
            seat_id: seat_id.to_string(),
            booking_id,
            detected: false,
            timestamp: now.timestamp_millis(),
        }));

        Ok(seat)
    }

    /// Free a seat and complete its active booking. Returns the completed
    /// booking, if there was one.
    pub fn release(&mut self, seat_id: &str, now: DateTime<Utc>) -> SeatingResult<Option<Booking>> {
        let seat = self
            .registry
            .get_mut(seat_id)
            .ok_or_else(|| SeatingError::NotFound(seat_id.to_string()))?;

        let was = seat.status;
        seat.vacate(now);
        if was != SeatStatus::Available {
            info!("Seat {} released (was {})", seat_id, was);
            self.outbox.push(released_event(seat_id, ReleaseReason::Released, now));
        }

        Ok(self.close_active(seat_id, BookingStatus::Completed, now))
    }

    /// Holder gives up a booking before arriving.
    pub fn cancel(&mut self, seat_id: &str, now: DateTime<Utc>) -> SeatingResult<Booking> {
        if self.registry.get(seat_id).is_none() {
            return Err(SeatingError::NotFound(seat_id.to_string()));
        }

        let pending = self
            .ledger
            .active_for(seat_id)
            .is_some_and(|b| b.arrived_at.is_none());
        if !pending {
            return Err(SeatingError::NoActiveBooking(seat_id.to_string()));
        }

        if let Some(seat) = self.registry.get_mut(seat_id) {
            seat.vacate(now);
        }
        self.outbox.push(released_event(seat_id, ReleaseReason::Cancelled, now));

        self.close_active(seat_id, BookingStatus::Cancelled, now)
            .ok_or_else(|| SeatingError::NoActiveBooking(seat_id.to_string()))
    }

    /// Administrative override. Touches no booking; only keeps the
    /// freeze-expiry in step with the new status.
    pub fn set_status(&mut self, seat_id: &str, status: SeatStatus, now: DateTime<Utc>) -> SeatingResult<Seat> {
        let freeze_window = self.rules.freeze_window;
        let seat = self
            .registry
            .get_mut(seat_id)
            .ok_or_else(|| SeatingError::NotFound(seat_id.to_string()))?;

        if status == SeatStatus::Frozen {
            if seat.frozen_until.is_none() {
                seat.frozen_until = Some(now + freeze_window);
            }
        } else {
            seat.frozen_until = None;
        }
        seat.status = status;
        seat.last_updated = now;

        info!("Seat {} status overridden to {}", seat_id, status);
        self.outbox.push(SeatEvent::StatusOverridden(SeatStatusOverriddenEvent {
            seat_id: seat_id.to_string(),
            status: status.as_str().to_string(),
            timestamp: now.timestamp_millis(),
        }));

        Ok(seat.clone())
    }

    /// Reseed seats from `layout` and clear the ledger
    pub fn reset(&mut self, layout: SeatLayout, now: DateTime<Utc>) {
        self.registry.replace_all(layout.seats(now));
        self.ledger.clear();
        self.layout = layout;

        info!("Library reset to {} layout ({} seats)", layout, self.registry.len());
        self.outbox.push(SeatEvent::LibraryReset {
            seat_count: self.registry.len(),
            timestamp: now.timestamp_millis(),
        });
    }

    pub fn stats(&self, now: DateTime<Utc>) -> LibraryStats {
        let total = self.registry.len();
        let available = self.registry.count(SeatStatus::Available);
        let reserved = self.registry.count(SeatStatus::Reserved);
        let occupied = self.registry.count(SeatStatus::Occupied);
        let frozen = self.registry.count(SeatStatus::Frozen);

        let occupancy_percentage = if total > 0 {
            (((occupied + frozen + reserved) as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };

        let current_hour = now.hour();
        let peak_hour = if (14..=18).contains(&current_hour) {
            "2PM - 6PM"
        } else {
            "10AM - 2PM"
        };

        LibraryStats {
            total_seats: total,
            available_seats: available,
            reserved_seats: reserved,
            occupied_seats: occupied,
            frozen_seats: frozen,
            occupancy_percentage,
            peak_hour: peak_hour.to_string(),
            current_hour,
        }
    }

    pub fn drain_events(&mut self) -> Vec<SeatEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn emit(&mut self, event: SeatEvent) {
        self.outbox.push(event);
    }

    /// Set `arrived_at` on the seat's active booking if still unset
    pub(crate) fn stamp_arrival(&mut self, seat_id: &str, now: DateTime<Utc>) -> Option<uuid::Uuid> {
        let booking = self.ledger.active_for_mut(seat_id)?;
        booking.mark_arrived(now);
        Some(booking.id)
    }

    pub(crate) fn close_active(
        &mut self,
        seat_id: &str,
        status: BookingStatus,
        now: DateTime<Utc>,
    ) -> Option<Booking> {
        let booking = self.ledger.active_for_mut(seat_id)?;
        booking.status = status;
        let closed = booking.clone();

        info!("Booking {} on seat {} is now {}", closed.id, seat_id, status);
        self.outbox.push(closed_event(&closed, now));
        Some(closed)
    }
}

pub(crate) fn released_event(seat_id: &str, reason: ReleaseReason, now: DateTime<Utc>) -> SeatEvent {
    SeatEvent::SeatReleased(SeatReleasedEvent {
        seat_id: seat_id.to_string(),
        reason,
        timestamp: now.timestamp_millis(),
    })
}

pub(crate) fn closed_event(booking: &Booking, now: DateTime<Utc>) -> SeatEvent {
    SeatEvent::BookingClosed(BookingClosedEvent {
        booking_id: booking.id,
        seat_id: booking.seat_id.clone(),
        status: booking.status.as_str().to_string(),
        timestamp: now.timestamp_millis(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
    }

    fn library() -> Library {
        Library::new(SeatLayout::Demo, SeatingRules::default(), t0())
    }

    fn ada() -> Holder {
        Holder::new("u-1", "Ada")
    }

    fn assert_freeze_invariant(library: &Library) {
        for seat in library.registry.iter() {
            assert_eq!(
                seat.status == SeatStatus::Frozen,
                seat.frozen_until.is_some(),
                "seat {} breaks the freeze invariant",
                seat.id
            );
        }
    }

    fn assert_single_active(library: &Library) {
        let mut seen = std::collections::HashSet::new();
        for booking in library.ledger.as_slice().iter().filter(|b| b.is_active()) {
            assert!(seen.insert(booking.seat_id.clone()), "two active bookings on {}", booking.seat_id);
        }
    }

    #[test]
    fn test_book_freezes_seat() {
        let mut library = library();
        let booking = library.book("A1", ada(), 30, t0()).unwrap();

        let seat = library.seat("A1").unwrap();
        assert_eq!(seat.status, SeatStatus::Frozen);
        assert_eq!(seat.frozen_until, Some(t0() + Duration::minutes(15)));
        assert_eq!(seat.reserved_by.as_deref(), Some("u-1"));
        assert_eq!(seat.reservation_duration, Some(30));

        assert_eq!(booking.status, BookingStatus::Active);
        assert_eq!(booking.frozen_until, seat.frozen_until);
        assert_eq!(booking.duration, 30);
        assert_eq!(library.active_booking("A1").unwrap().id, booking.id);
        assert_freeze_invariant(&library);
    }

    #[test]
    fn test_book_rejects_non_available_without_mutation() {
        let mut library = library();
        library.book("A1", ada(), 30, t0()).unwrap();
        let before = library.snapshot();
        library.drain_events();

        let err = library.book("A1", Holder::new("u-2", "Grace"), 60, t0()).unwrap_err();
        assert_eq!(
            err,
            SeatingError::Unavailable { seat_id: "A1".to_string(), status: SeatStatus::Frozen }
        );
        assert_eq!(library.snapshot(), before);
        assert!(library.drain_events().is_empty());

        assert_eq!(
            library.book("Z9", ada(), 30, t0()).unwrap_err(),
            SeatingError::NotFound("Z9".to_string())
        );
        assert_eq!(library.book("A2", ada(), 0, t0()).unwrap_err(), SeatingError::InvalidDuration);
    }

    #[test]
    fn test_confirm_arrival() {
        let mut library = library();
        library.book("A1", ada(), 30, t0()).unwrap();

        let seat = library.confirm_arrival("A1", t0() + Duration::minutes(5)).unwrap();
        assert_eq!(seat.status, SeatStatus::Occupied);
        assert_eq!(seat.frozen_until, None);
        assert_eq!(seat.occupied_by.as_deref(), Some("u-1"));

        let booking = library.active_booking("A1").unwrap();
        assert_eq!(booking.arrived_at, Some(t0() + Duration::minutes(5)));
        assert_freeze_invariant(&library);

        assert_eq!(
            library.confirm_arrival("A2", t0()).unwrap_err(),
            SeatingError::NotFrozen("A2".to_string())
        );
    }

    #[test]
    fn test_release_completes_booking() {
        let mut library = library();
        let booking = library.book("A1", ada(), 30, t0()).unwrap();
        library.confirm_arrival("A1", t0()).unwrap();

        let completed = library.release("A1", t0() + Duration::minutes(30)).unwrap().unwrap();
        assert_eq!(completed.id, booking.id);
        assert_eq!(completed.status, BookingStatus::Completed);

        let seat = library.seat("A1").unwrap();
        assert_eq!(seat.status, SeatStatus::Available);
        assert!(seat.reserved_by.is_none() && seat.occupied_by.is_none() && seat.reserved_at.is_none());
        assert!(library.active_booking("A1").is_none());
    }

    #[test]
    fn test_release_of_free_seat_is_quiet() {
        let mut library = library();
        assert_eq!(library.release("B1", t0()).unwrap(), None);
        assert!(library.drain_events().is_empty());
    }

    #[test]
    fn test_cancel_pending_booking() {
        let mut library = library();
        library.book("B1", ada(), 45, t0()).unwrap();

        let cancelled = library.cancel("B1", t0() + Duration::minutes(2)).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(library.seat("B1").unwrap().is_available());

        // Nothing left to cancel
        assert_eq!(
            library.cancel("B1", t0()).unwrap_err(),
            SeatingError::NoActiveBooking("B1".to_string())
        );
    }

    #[test]
    fn test_cancel_after_arrival_is_refused() {
        let mut library = library();
        library.book("B1", ada(), 45, t0()).unwrap();
        library.confirm_arrival("B1", t0()).unwrap();

        assert!(library.cancel("B1", t0()).is_err());
        assert_eq!(library.seat("B1").unwrap().status, SeatStatus::Occupied);
    }

    #[test]
    fn test_set_status_keeps_freeze_invariant() {
        let mut library = library();

        let seat = library.set_status("A2", SeatStatus::Frozen, t0()).unwrap();
        assert_eq!(seat.frozen_until, Some(t0() + Duration::minutes(15)));

        let seat = library.set_status("A2", SeatStatus::Reserved, t0()).unwrap();
        assert_eq!(seat.status, SeatStatus::Reserved);
        assert_eq!(seat.frozen_until, None);
        assert_freeze_invariant(&library);
    }

    #[test]
    fn test_set_status_leaves_bookings_alone() {
        let mut library = library();
        let booking = library.book("A1", ada(), 30, t0()).unwrap();

        library.set_status("A1", SeatStatus::Available, t0()).unwrap();
        assert_eq!(library.active_booking("A1").unwrap().id, booking.id);

        // Rebooking closes the orphan rather than stacking a second active booking
        let second = library.book("A1", Holder::new("u-2", "Grace"), 60, t0()).unwrap();
        assert_eq!(library.active_booking("A1").unwrap().id, second.id);
        assert_eq!(
            library.ledger.get(&booking.id).unwrap().status,
            BookingStatus::Completed
        );
        assert_single_active(&library);
    }

    #[test]
    fn test_stats() {
        let mut library = library();
        library.book("A1", ada(), 30, t0()).unwrap();
        library.set_status("B1", SeatStatus::Occupied, t0()).unwrap();

        let stats = library.stats(t0());
        assert_eq!(stats.total_seats, 4);
        assert_eq!(stats.available_seats, 2);
        assert_eq!(stats.frozen_seats, 1);
        assert_eq!(stats.occupied_seats, 1);
        assert_eq!(stats.occupancy_percentage, 50);
        assert_eq!(stats.current_hour, 9);
        assert_eq!(stats.peak_hour, "10AM - 2PM");

        let afternoon = Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap();
        assert_eq!(library.stats(afternoon).peak_hour, "2PM - 6PM");
    }

    #[test]
    fn test_stats_rounding() {
        let mut library = Library::new(SeatLayout::Full, SeatingRules::default(), t0());
        library.set_status("A01", SeatStatus::Reserved, t0()).unwrap();
        // 1 of 24 is 4.17%
        assert_eq!(library.stats(t0()).occupancy_percentage, 4);
    }

    #[test]
    fn test_reset_switches_layout() {
        let mut library = library();
        library.book("A1", ada(), 30, t0()).unwrap();

        library.reset(SeatLayout::Full, t0());
        assert_eq!(library.layout(), SeatLayout::Full);
        assert_eq!(library.registry.len(), 24);
        assert!(library.ledger.is_empty());
    }

    #[test]
    fn test_from_snapshot_repairs_invariants() {
        let mut snapshot = library().snapshot();

        snapshot.seats[0].status = SeatStatus::Frozen; // A1, no expiry
        snapshot.seats[1].frozen_until = Some(t0()); // A2 available with expiry

        let first = Booking::new("B1", ada(), 30, t0(), t0());
        let second = Booking::new("B1", Holder::new("u-2", "Grace"), 30, t0(), t0());
        let second_id = second.id;
        snapshot.bookings = vec![first, second];

        let library = Library::from_snapshot(snapshot, SeatingRules::default(), t0());
        assert_freeze_invariant(&library);
        assert_single_active(&library);
        assert_eq!(library.seat("A1").unwrap().status, SeatStatus::Available);
        assert_eq!(library.active_booking("B1").unwrap().id, second_id);
    }

    #[test]
    fn test_from_empty_snapshot_seeds_layout() {
        let snapshot = LibrarySnapshot {
            layout: SeatLayout::Full,
            seats: vec![],
            bookings: vec![],
        };
        let library = Library::from_snapshot(snapshot, SeatingRules::default(), t0());
        assert_eq!(library.registry.len(), 24);
    }

    #[test]
    fn test_events_are_queued_in_order() {
        let mut library = library();
        library.book("A1", ada(), 30, t0()).unwrap();
        library.release("A1", t0()).unwrap();

        let events = library.drain_events();
        assert!(matches!(events[0], SeatEvent::SeatFrozen(_)));
        assert!(matches!(events[1], SeatEvent::SeatReleased(_)));
        assert!(matches!(events[2], SeatEvent::BookingClosed(_)));
        assert!(library.drain_events().is_empty());
    }
}
