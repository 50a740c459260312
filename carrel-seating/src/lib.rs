pub mod error;
pub mod layout;
pub mod ledger;
pub mod library;
pub mod models;
pub mod reconciler;
pub mod registry;
pub mod service;
pub mod sweeper;

pub use error::{SeatingError, SeatingResult};
pub use layout::SeatLayout;
pub use ledger::BookingLedger;
pub use library::{Library, LibrarySnapshot, SeatingRules, DEFAULT_FREEZE_MINUTES};
pub use models::{Booking, BookingStatus, Holder, LibraryStats, Seat, SeatStatus, Zone};
pub use reconciler::{EdgeFilter, OccupancyOutcome, OccupancyReconciler, OccupancySignal};
pub use registry::SeatRegistry;
pub use service::SeatService;
pub use sweeper::{ExpirySweeper, SweepReport, DEFAULT_SWEEP_INTERVAL};
