use crate::error::SeatingResult;
use crate::layout::SeatLayout;
use crate::library::{Library, LibrarySnapshot};
use crate::models::{Booking, Holder, LibraryStats, Seat, SeatStatus};
use crate::reconciler::OccupancyOutcome;
use crate::sweeper::SweepReport;
use carrel_core::Clock;
use carrel_shared::SeatEvent;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

const EVENT_CHANNEL_CAPACITY: usize = 100;

/// Single-writer front for a [`Library`].
///
/// Every call holds the library lock for one read-modify-write, so the
/// sweeper, the detector feed and operator commands never interleave
/// inside a transition. Events go out after the lock is dropped.
#[derive(Clone)]
pub struct SeatService {
    library: Arc<Mutex<Library>>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<SeatEvent>,
}

impl SeatService {
    pub fn new(library: Library, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            library: Arc::new(Mutex::new(library)),
            clock,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SeatEvent> {
        self.events.subscribe()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    async fn mutate<T>(&self, op: impl FnOnce(&mut Library, DateTime<Utc>) -> T) -> T {
        let (result, events) = {
            let mut library = self.library.lock().await;
            let now = self.clock.now();
            let result = op(&mut *library, now);
            (result, library.drain_events())
        };

        for event in events {
            // No subscribers is fine
            self.events.send(event).ok();
        }
        result
    }

    pub async fn book(&self, seat_id: &str, holder: Holder, duration_minutes: u32) -> SeatingResult<Booking> {
        self.mutate(|lib, now| lib.book(seat_id, holder, duration_minutes, now)).await
    }

    pub async fn confirm_arrival(&self, seat_id: &str) -> SeatingResult<Seat> {
        self.mutate(|lib, now| lib.confirm_arrival(seat_id, now)).await
    }

    pub async fn release(&self, seat_id: &str) -> SeatingResult<Option<Booking>> {
        self.mutate(|lib, now| lib.release(seat_id, now)).await
    }

    pub async fn cancel(&self, seat_id: &str) -> SeatingResult<Booking> {
        self.mutate(|lib, now| lib.cancel(seat_id, now)).await
    }

    pub async fn set_status(&self, seat_id: &str, status: SeatStatus) -> SeatingResult<Seat> {
        self.mutate(|lib, now| lib.set_status(seat_id, status, now)).await
    }

    pub async fn record_occupancy(&self, seat_id: &str, occupied: bool) -> Option<OccupancyOutcome> {
        self.mutate(|lib, now| lib.record_occupancy(seat_id, occupied, now)).await
    }

    /// One expiry pass with a single "now"
    pub async fn sweep(&self) -> SweepReport {
        self.mutate(|lib, now| lib.sweep_expired(now)).await
    }

    pub async fn reset(&self, layout: SeatLayout) {
        self.mutate(|lib, now| lib.reset(layout, now)).await
    }

    pub async fn seat(&self, seat_id: &str) -> Option<Seat> {
        self.library.lock().await.seat(seat_id).cloned()
    }

    pub async fn seats(&self) -> Vec<Seat> {
        self.library.lock().await.registry().to_vec()
    }

    pub async fn bookings(&self) -> Vec<Booking> {
        self.library.lock().await.ledger().as_slice().to_vec()
    }

    pub async fn active_booking(&self, seat_id: &str) -> Option<Booking> {
        self.library.lock().await.active_booking(seat_id).cloned()
    }

    pub async fn layout(&self) -> SeatLayout {
        self.library.lock().await.layout()
    }

    pub async fn stats(&self) -> LibraryStats {
        let library = self.library.lock().await;
        library.stats(self.clock.now())
    }

    pub async fn snapshot(&self) -> LibrarySnapshot {
        self.library.lock().await.snapshot()
    }
}
