use carrel_seating::{OccupancySignal, SeatLayout, SeatStatus};

/// One console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Book {
        seat_id: String,
        user_id: String,
        user_name: String,
        minutes: u32,
    },
    Arrive(String),
    Release(String),
    Cancel(String),
    Status(String, SeatStatus),
    Detect(OccupancySignal),
    Seats,
    Bookings,
    Stats,
    Reset,
    Layout(SeatLayout),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("{command}: missing {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("Invalid {argument}: {value}")]
    InvalidArgument {
        argument: &'static str,
        value: String,
    },

    #[error("{0}: unexpected trailing arguments")]
    TrailingArguments(&'static str),
}

/// Parse a console line. Blank lines and `#` comments are `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "book" => parse_book(&args)?,
        "arrive" => Command::Arrive(single_seat("arrive", &args)?),
        "release" => Command::Release(single_seat("release", &args)?),
        "cancel" => Command::Cancel(single_seat("cancel", &args)?),
        "status" => {
            let (seat, value) = pair("status", "status", &args)?;
            let status = value.parse().map_err(|_| CommandError::InvalidArgument {
                argument: "status",
                value: value.to_string(),
            })?;
            Command::Status(seat.to_string(), status)
        }
        "detect" => {
            let (seat, value) = pair("detect", "occupancy", &args)?;
            Command::Detect(OccupancySignal::new(seat, parse_occupied(value)?))
        }
        "layout" => {
            let value = args.first().ok_or(CommandError::MissingArgument {
                command: "layout",
                argument: "layout",
            })?;
            no_more("layout", &args, 1)?;
            let layout = value.parse().map_err(|_| CommandError::InvalidArgument {
                argument: "layout",
                value: value.to_string(),
            })?;
            Command::Layout(layout)
        }
        "seats" => bare("seats", &args, Command::Seats)?,
        "bookings" => bare("bookings", &args, Command::Bookings)?,
        "stats" => bare("stats", &args, Command::Stats)?,
        "reset" => bare("reset", &args, Command::Reset)?,
        "quit" | "exit" => bare("quit", &args, Command::Quit)?,
        other => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

// book <seat> <user-id> <user name...> <minutes>
fn parse_book(args: &[&str]) -> Result<Command, CommandError> {
    let missing = |argument| CommandError::MissingArgument {
        command: "book",
        argument,
    };

    let (seat_id, rest) = args.split_first().ok_or(missing("seat"))?;
    let (user_id, rest) = rest.split_first().ok_or(missing("user id"))?;
    let (minutes, name) = rest.split_last().ok_or(missing("minutes"))?;
    if name.is_empty() {
        return Err(missing("user name"));
    }

    let minutes = minutes.parse::<u32>().map_err(|_| CommandError::InvalidArgument {
        argument: "minutes",
        value: minutes.to_string(),
    })?;

    Ok(Command::Book {
        seat_id: seat_id.to_string(),
        user_id: user_id.to_string(),
        user_name: name.join(" "),
        minutes,
    })
}

fn parse_occupied(value: &str) -> Result<bool, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "occupied" | "yes" => Ok(true),
        "false" | "0" | "empty" | "no" => Ok(false),
        _ => Err(CommandError::InvalidArgument {
            argument: "occupancy",
            value: value.to_string(),
        }),
    }
}

fn single_seat(command: &'static str, args: &[&str]) -> Result<String, CommandError> {
    let seat = args.first().ok_or(CommandError::MissingArgument {
        command,
        argument: "seat",
    })?;
    no_more(command, args, 1)?;
    Ok(seat.to_string())
}

fn pair<'a>(
    command: &'static str,
    second: &'static str,
    args: &[&'a str],
) -> Result<(&'a str, &'a str), CommandError> {
    match args {
        [] => Err(CommandError::MissingArgument { command, argument: "seat" }),
        [_] => Err(CommandError::MissingArgument { command, argument: second }),
        [seat, value] => Ok((*seat, *value)),
        _ => Err(CommandError::TrailingArguments(command)),
    }
}

fn bare(command: &'static str, args: &[&str], parsed: Command) -> Result<Command, CommandError> {
    no_more(command, args, 0)?;
    Ok(parsed)
}

fn no_more(command: &'static str, args: &[&str], expected: usize) -> Result<(), CommandError> {
    if args.len() > expected {
        return Err(CommandError::TrailingArguments(command));
    }
    Ok(())
}
