pub mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Unknown {kind}: {value}")]
    UnknownVariant {
        kind: &'static str,
        value: String,
    },
}
