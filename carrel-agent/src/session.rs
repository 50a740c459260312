use crate::console::Console;
use crate::worker::start_persistence_worker;
use anyhow::Context;
use carrel_core::Clock;
use carrel_seating::{ExpirySweeper, Library, SeatService};
use carrel_store::{
    Config, FileStore, KeyValueStore, MemoryStore, RedisStore, SnapshotRepository, StorageBackend,
    StorageConfig,
};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn open_store(storage: &StorageConfig) -> anyhow::Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory storage, state is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::File => {
            info!("Using file storage at {}", storage.path.display());
            Arc::new(FileStore::new(&storage.path))
        }
        StorageBackend::Redis => Arc::new(
            RedisStore::new(&storage.redis_url)
                .await
                .context("Failed to connect to Redis")?,
        ),
    };
    Ok(store)
}

/// One hosting session: load state, sweep and persist in the background,
/// serve the console until it ends, then stop everything.
pub async fn run<R, W>(
    config: &Config,
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    input: R,
    output: W,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let repo = SnapshotRepository::new(store, config.rules.default_layout);
    let now = clock.now();
    let library = Library::from_snapshot(repo.load(now).await, config.rules.seating_rules(), now);
    info!("Session started with {} layout", library.layout());

    let service = SeatService::new(library, clock);

    let persistence = tokio::spawn(start_persistence_worker(
        service.clone(),
        repo,
        service.subscribe(),
        shutdown.child_token(),
    ));
    let sweeper = ExpirySweeper::new(
        service.clone(),
        config.rules.sweep_interval(),
        shutdown.child_token(),
    )
    .spawn();

    let mut console = Console::new(service, output).await;
    let result = console.run(input, &shutdown).await;

    shutdown.cancel();
    sweeper.await.context("Expiry sweeper panicked")?;
    persistence.await.context("Persistence worker panicked")?;
    info!("Session ended");

    result.context("Console I/O failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use carrel_core::ManualClock;
    use carrel_seating::{Booking, Seat, SeatStatus};
    use carrel_store::{BOOKINGS_KEY, SEATS_KEY};
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn test_session_persists_on_exit() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()));
        let mut output = Vec::new();

        run(
            &Config::default(),
            store.clone(),
            clock,
            "book B1 u-1 Ada 30\nstatus A2 reserved\n".as_bytes(),
            &mut output,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let seats: Vec<Seat> = serde_json::from_str(&store.get(SEATS_KEY).await.unwrap().unwrap()).unwrap();
        let b1 = seats.iter().find(|s| s.id == "B1").unwrap();
        assert_eq!(b1.status, SeatStatus::Frozen);
        let a2 = seats.iter().find(|s| s.id == "A2").unwrap();
        assert_eq!(a2.status, SeatStatus::Reserved);

        let bookings: Vec<Booking> = serde_json::from_str(&store.get(BOOKINGS_KEY).await.unwrap().unwrap()).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].user_name, "Ada");
    }

    #[tokio::test]
    async fn test_session_resumes_saved_state() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()));

        let mut first = Vec::new();
        run(&Config::default(), store.clone(), clock.clone(), "layout full\nbook A03 u-1 Ada 30\n".as_bytes(), &mut first, CancellationToken::new())
            .await
            .unwrap();

        let mut second = Vec::new();
        run(&Config::default(), store, clock, "book A03 u-2 Grace 30\n".as_bytes(), &mut second, CancellationToken::new())
            .await
            .unwrap();

        let reply = String::from_utf8(second).unwrap();
        assert_eq!(reply.trim(), "rejected: Seat A03 is frozen, not available");
    }
}
