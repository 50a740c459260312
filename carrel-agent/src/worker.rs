use carrel_seating::SeatService;
use carrel_shared::SeatEvent;
use carrel_store::SnapshotRepository;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Saves a snapshot after every burst of seat events, and once more on
/// shutdown.
pub async fn start_persistence_worker(
    service: SeatService,
    repo: SnapshotRepository,
    mut events: broadcast::Receiver<SeatEvent>,
    shutdown: CancellationToken,
) {
    info!("Persistence worker started");
    persist(&service, &repo).await;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            received = events.recv() => match received {
                Ok(event) => {
                    log_event(&event);
                    // Coalesce whatever else is already queued into one save
                    while let Ok(event) = events.try_recv() {
                        log_event(&event);
                    }
                    persist(&service, &repo).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Persistence worker lagged, {} event(s) skipped", skipped);
                    persist(&service, &repo).await;
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    persist(&service, &repo).await;
    info!("Persistence worker stopped");
}

fn log_event(event: &SeatEvent) {
    match serde_json::to_string(event) {
        Ok(json) => info!("Seat event: {}", json),
        Err(e) => error!("Failed to serialize seat event: {}", e),
    }
}

async fn persist(service: &SeatService, repo: &SnapshotRepository) {
    let snapshot = service.snapshot().await;
    match repo.save(&snapshot).await {
        Ok(()) => debug!("Persisted {} seat(s), {} booking(s)", snapshot.seats.len(), snapshot.bookings.len()),
        Err(e) => error!("Failed to persist seat state: {}", e),
    }
}
