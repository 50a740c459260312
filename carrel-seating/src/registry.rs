use crate::models::{Seat, SeatStatus};
use std::collections::BTreeMap;

/// Current state of every seat, keyed and ordered by seat id
#[derive(Debug, Clone, Default)]
pub struct SeatRegistry {
    seats: BTreeMap<String, Seat>,
}

impl SeatRegistry {
    pub fn new(seats: Vec<Seat>) -> Self {
        Self {
            seats: seats.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn get(&self, seat_id: &str) -> Option<&Seat> {
        self.seats.get(seat_id)
    }

    pub(crate) fn get_mut(&mut self, seat_id: &str) -> Option<&mut Seat> {
        self.seats.get_mut(seat_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Seat> {
        self.seats.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Seat> {
        self.seats.values_mut()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn count(&self, status: SeatStatus) -> usize {
        self.seats.values().filter(|s| s.status == status).count()
    }

    pub(crate) fn replace_all(&mut self, seats: Vec<Seat>) {
        *self = Self::new(seats);
    }

    pub fn to_vec(&self) -> Vec<Seat> {
        self.seats.values().cloned().collect()
    }
}
