use carrel_core::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Seat status as shown on the floor map
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Reserved,
    Occupied,
    Frozen,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "available",
            SeatStatus::Reserved => "reserved",
            SeatStatus::Occupied => "occupied",
            SeatStatus::Frozen => "frozen",
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(SeatStatus::Available),
            "reserved" => Ok(SeatStatus::Reserved),
            "occupied" => Ok(SeatStatus::Occupied),
            "frozen" => Ok(SeatStatus::Frozen),
            _ => Err(CoreError::UnknownVariant {
                kind: "seat status",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Zone {
    A,
    B,
}

impl Zone {
    pub const ALL: [Zone; 2] = [Zone::A, Zone::B];

    pub fn letter(&self) -> char {
        match self {
            Zone::A => 'A',
            Zone::B => 'B',
        }
    }
}

/// A single study seat.
///
/// `frozen_until` is set exactly when `status` is [`SeatStatus::Frozen`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: String,
    pub zone: Zone,
    pub number: u32,
    pub status: SeatStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupied_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation_duration: Option<u32>, // minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_until: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

impl Seat {
    pub fn new(id: impl Into<String>, zone: Zone, number: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            zone,
            number,
            status: SeatStatus::Available,
            occupied_by: None,
            reserved_by: None,
            reserved_at: None,
            reservation_duration: None,
            frozen_until: None,
            last_updated: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    /// Frozen and past its freeze window
    pub fn freeze_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.status == SeatStatus::Frozen && self.frozen_until.is_some_and(|until| until <= now)
    }

    /// Back to available with every holder field cleared
    pub(crate) fn vacate(&mut self, now: DateTime<Utc>) {
        self.status = SeatStatus::Available;
        self.occupied_by = None;
        self.reserved_by = None;
        self.reserved_at = None;
        self.reservation_duration = None;
        self.frozen_until = None;
        self.last_updated = now;
    }

    pub(crate) fn occupy(&mut self, now: DateTime<Utc>) {
        if self.status == SeatStatus::Frozen {
            self.occupied_by = self.reserved_by.clone();
        }
        self.status = SeatStatus::Occupied;
        self.frozen_until = None;
        self.last_updated = now;
    }
}

/// Booking status in the ledger
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Active,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Active => "active",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no-show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a booking is held for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holder {
    pub user_id: String,
    pub user_name: String,
}

impl Holder {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}

/// Ledger entry. Never deleted, only moved out of `Active`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub seat_id: String,
    pub user_id: String,
    pub user_name: String,
    pub start_time: DateTime<Utc>,
    pub duration: u32, // minutes
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frozen_until: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrived_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        seat_id: impl Into<String>,
        holder: Holder,
        duration: u32,
        frozen_until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            seat_id: seat_id.into(),
            user_id: holder.user_id,
            user_name: holder.user_name,
            start_time: now,
            duration,
            status: BookingStatus::Active,
            frozen_until: Some(frozen_until),
            arrived_at: None,
            created_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }

    /// Active, never arrived, and the freeze window is over
    pub fn is_no_show(&self, now: DateTime<Utc>) -> bool {
        self.is_active()
            && self.arrived_at.is_none()
            && self.frozen_until.is_some_and(|until| until <= now)
    }

    pub(crate) fn mark_arrived(&mut self, now: DateTime<Utc>) -> bool {
        if self.arrived_at.is_some() {
            return false;
        }
        self.arrived_at = Some(now);
        true
    }
}

/// Derived counters for dashboards
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LibraryStats {
    pub total_seats: usize,
    pub available_seats: usize,
    pub reserved_seats: usize,
    pub occupied_seats: usize,
    pub frozen_seats: usize,
    pub occupancy_percentage: u32,
    pub peak_hour: String,
    pub current_hour: u32,
}
