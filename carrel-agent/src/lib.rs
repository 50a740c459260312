pub mod command;
pub mod console;
pub mod session;
pub mod worker;

pub use command::{parse_line, Command, CommandError};
pub use console::Console;
