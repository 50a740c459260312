pub mod models;

pub use models::events::{
    ArrivalConfirmedEvent, BookingClosedEvent, ReleaseReason, SeatEvent, SeatFrozenEvent,
    SeatReleasedEvent, SeatStatusOverriddenEvent,
};
