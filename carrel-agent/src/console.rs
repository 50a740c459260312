use crate::command::{parse_line, Command};
use carrel_seating::{EdgeFilter, OccupancyOutcome, OccupancyReconciler, SeatService};
use serde::Serialize;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Line-oriented operator and detector feed
pub struct Console<W> {
    service: SeatService,
    reconciler: OccupancyReconciler,
    filter: EdgeFilter,
    out: W,
}

impl<W: AsyncWrite + Unpin> Console<W> {
    pub async fn new(service: SeatService, out: W) -> Self {
        let filter = EdgeFilter::from_seats(&service.seats().await);
        Self {
            reconciler: OccupancyReconciler::new(service.clone()),
            service,
            filter,
            out,
        }
    }

    /// Runs until EOF, `quit`, or `shutdown`
    pub async fn run<R: AsyncBufRead + Unpin>(
        &mut self,
        input: R,
        shutdown: &CancellationToken,
    ) -> io::Result<()> {
        let mut lines = input.lines();

        loop {
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else {
                debug!("Console input closed");
                break;
            };

            match parse_line(&line) {
                Ok(None) => continue,
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    let reply = self.execute(command).await;
                    self.say(&reply).await?;
                }
                Err(e) => self.say(&format!("error: {}", e)).await?,
            }
        }

        self.out.flush().await
    }

    pub async fn execute(&mut self, command: Command) -> String {
        match command {
            Command::Book { seat_id, user_id, user_name, minutes } => {
                let holder = carrel_seating::Holder::new(user_id, user_name);
                match self.service.book(&seat_id, holder, minutes).await {
                    Ok(b) => format!(
                        "booked {} for {} until {} (booking {})",
                        b.seat_id,
                        b.user_name,
                        b.frozen_until.map(|t| t.to_rfc3339()).unwrap_or_default(),
                        b.id
                    ),
                    Err(e) => format!("rejected: {}", e),
                }
            }
            Command::Arrive(seat_id) => match self.service.confirm_arrival(&seat_id).await {
                Ok(seat) => format!("arrived at {}", seat.id),
                Err(e) => format!("rejected: {}", e),
            },
            Command::Release(seat_id) => match self.service.release(&seat_id).await {
                Ok(Some(b)) => format!("released {}, booking {} completed", seat_id, b.id),
                Ok(None) => format!("released {}", seat_id),
                Err(e) => format!("rejected: {}", e),
            },
            Command::Cancel(seat_id) => match self.service.cancel(&seat_id).await {
                Ok(b) => format!("cancelled booking {} on {}", b.id, seat_id),
                Err(e) => format!("rejected: {}", e),
            },
            Command::Status(seat_id, status) => match self.service.set_status(&seat_id, status).await {
                Ok(seat) => format!("{} is now {}", seat.id, seat.status),
                Err(e) => format!("rejected: {}", e),
            },
            Command::Detect(signal) => {
                if !self.filter.observe(&signal) {
                    return format!("ignored: {} unchanged", signal.seat_id);
                }
                let seat_id = signal.seat_id.clone();
                match self.reconciler.apply(signal).await {
                    None => format!("ignored: unknown seat {}", seat_id),
                    Some(outcome) => format!("{}: {}", seat_id, describe(outcome)),
                }
            }
            Command::Seats => to_json(&self.service.seats().await),
            Command::Bookings => to_json(&self.service.bookings().await),
            Command::Stats => to_json(&self.service.stats().await),
            Command::Reset => {
                let layout = self.service.layout().await;
                self.reset(layout).await
            }
            Command::Layout(layout) => self.reset(layout).await,
            Command::Quit => "bye".to_string(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    async fn reset(&mut self, layout: carrel_seating::SeatLayout) -> String {
        self.service.reset(layout).await;
        self.filter = EdgeFilter::new();
        format!("reset to {} layout", layout)
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await
    }
}

fn describe(outcome: OccupancyOutcome) -> &'static str {
    match outcome {
        OccupancyOutcome::ArrivalConfirmed => "arrival confirmed",
        OccupancyOutcome::MarkedOccupied => "occupied",
        OccupancyOutcome::Released => "released",
        OccupancyOutcome::Unchanged => "unchanged",
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("error: {}", e))
}
