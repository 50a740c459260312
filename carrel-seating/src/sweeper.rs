use crate::library::{closed_event, released_event, Library};
use crate::models::BookingStatus;
use crate::service::SeatService;
use carrel_shared::ReleaseReason;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// What one expiry pass changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub released_seats: Vec<String>,
    pub no_shows: Vec<Uuid>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.released_seats.is_empty() && self.no_shows.is_empty()
    }
}

impl Library {
    /// Release frozen seats and mark no-show bookings whose freeze window
    /// ended at or before `now`. The two passes are independent.
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        let mut events = Vec::new();

        for seat in self.registry.iter_mut() {
            if seat.freeze_elapsed(now) {
                seat.vacate(now);
                info!("Seat {} freeze window elapsed, released", seat.id);
                events.push(released_event(&seat.id, ReleaseReason::Expired, now));
                report.released_seats.push(seat.id.clone());
            }
        }

        for booking in self.ledger.iter_mut() {
            if booking.is_no_show(now) {
                booking.status = BookingStatus::NoShow;
                info!("Booking {} on seat {} marked no-show", booking.id, booking.seat_id);
                events.push(closed_event(booking, now));
                report.no_shows.push(booking.id);
            }
        }

        for event in events {
            self.emit(event);
        }
        report
    }
}

/// Periodically runs [`SeatService::sweep`] until cancelled
pub struct ExpirySweeper {
    service: SeatService,
    period: Duration,
    shutdown: CancellationToken,
}

impl ExpirySweeper {
    pub fn new(service: SeatService, period: Duration, shutdown: CancellationToken) -> Self {
        Self {
            service,
            period: period.max(Duration::from_millis(1)),
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        info!("Expiry sweeper started, every {:?}", self.period);

        // First pass one period in, not immediately
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let report = self.service.sweep().await;
                    if !report.is_empty() {
                        info!(
                            "Sweep released {} seat(s), {} no-show(s)",
                            report.released_seats.len(),
                            report.no_shows.len()
                        );
                    }
                }
            }
        }

        info!("Expiry sweeper stopped");
    }
}
