use crate::models::{Seat, Zone};
use carrel_core::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FULL_SEATS_PER_ZONE: u32 = 12;
const DEMO_SEATS_PER_ZONE: u32 = 2;

/// Which default floor plan to seed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SeatLayout {
    /// Four seats, one per detector region: A1, A2, B1, B2
    #[default]
    Demo,
    /// Twelve seats per zone: A01..A12, B01..B12
    Full,
}

impl SeatLayout {
    pub fn seats(&self, now: DateTime<Utc>) -> Vec<Seat> {
        let mut seats = Vec::new();
        for zone in Zone::ALL {
            match self {
                SeatLayout::Demo => {
                    for number in 1..=DEMO_SEATS_PER_ZONE {
                        seats.push(Seat::new(format!("{}{}", zone.letter(), number), zone, number, now));
                    }
                }
                SeatLayout::Full => {
                    for number in 1..=FULL_SEATS_PER_ZONE {
                        seats.push(Seat::new(format!("{}{:02}", zone.letter(), number), zone, number, now));
                    }
                }
            }
        }
        seats
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, SeatLayout::Demo)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SeatLayout::Demo => "demo",
            SeatLayout::Full => "full",
        }
    }
}

impl fmt::Display for SeatLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeatLayout {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(SeatLayout::Demo),
            "full" => Ok(SeatLayout::Full),
            _ => Err(CoreError::UnknownVariant {
                kind: "seat layout",
                value: s.to_string(),
            }),
        }
    }
}
