use crate::error::StoreResult;
use crate::kv::KeyValueStore;
use carrel_seating::{Booking, LibrarySnapshot, Seat, SeatLayout};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

pub const SEATS_KEY: &str = "library_seats";
pub const BOOKINGS_KEY: &str = "library_bookings";
pub const DEMO_MODE_KEY: &str = "library_demo_mode";

/// Load/save adapter between the seat service and a [`KeyValueStore`].
///
/// Loading never fails: unreadable, malformed or empty blobs fall back
/// to the default seat set and an empty ledger.
#[derive(Clone)]
pub struct SnapshotRepository {
    store: Arc<dyn KeyValueStore>,
    default_layout: SeatLayout,
}

impl SnapshotRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, default_layout: SeatLayout) -> Self {
        Self { store, default_layout }
    }

    pub async fn load(&self, now: DateTime<Utc>) -> LibrarySnapshot {
        let layout = match self.read(DEMO_MODE_KEY).await {
            Some(flag) if flag.trim().trim_matches('"') == "false" => SeatLayout::Full,
            Some(_) => SeatLayout::Demo,
            None => self.default_layout,
        };

        let seats = match self.read(SEATS_KEY).await {
            Some(raw) => match serde_json::from_str::<Vec<Seat>>(&raw) {
                Ok(seats) if !seats.is_empty() => seats,
                Ok(_) => {
                    warn!("Stored seat list is empty, using {} layout", layout);
                    layout.seats(now)
                }
                Err(e) => {
                    warn!("Discarding malformed seat state: {}", e);
                    layout.seats(now)
                }
            },
            None => layout.seats(now),
        };

        let bookings = match self.read(BOOKINGS_KEY).await {
            Some(raw) => serde_json::from_str::<Vec<Booking>>(&raw).unwrap_or_else(|e| {
                warn!("Discarding malformed booking log: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        info!("Loaded {} seat(s) and {} booking(s)", seats.len(), bookings.len());
        LibrarySnapshot { layout, seats, bookings }
    }

    pub async fn save(&self, snapshot: &LibrarySnapshot) -> StoreResult<()> {
        let seats = serde_json::to_string(&snapshot.seats)?;
        let bookings = serde_json::to_string(&snapshot.bookings)?;
        let demo_mode = if snapshot.layout.is_demo() { "true" } else { "false" };

        self.store.set(SEATS_KEY, &seats).await?;
        self.store.set(BOOKINGS_KEY, &bookings).await?;
        self.store.set(DEMO_MODE_KEY, demo_mode).await?;
        Ok(())
    }

    /// Missing, blank and unreadable all read as `None`
    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(Some(value)) if !value.trim().is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                warn!("Could not read {}: {}", key, e);
                None
            }
        }
    }
}
