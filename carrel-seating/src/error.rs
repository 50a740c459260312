use crate::models::SeatStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatingError {
    #[error("Seat not found: {0}")]
    NotFound(String),

    #[error("Seat {seat_id} is {status}, not available")]
    Unavailable {
        seat_id: String,
        status: SeatStatus,
    },

    #[error("Seat {0} is not frozen")]
    NotFrozen(String),

    #[error("No active booking for seat {0}")]
    NoActiveBooking(String),

    #[error("Booking duration must be at least one minute")]
    InvalidDuration,
}

pub type SeatingResult<T> = Result<T, SeatingError>;
