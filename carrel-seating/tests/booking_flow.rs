use carrel_core::ManualClock;
use carrel_seating::{
    BookingStatus, Holder, Library, OccupancyOutcome, OccupancyReconciler, OccupancySignal,
    SeatLayout, SeatService, SeatStatus, SeatingRules,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::Arc;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn setup() -> (SeatService, OccupancyReconciler, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let library = Library::new(SeatLayout::Demo, SeatingRules::default(), t0());
    let service = SeatService::new(library, clock.clone());
    let reconciler = OccupancyReconciler::new(service.clone());
    (service, reconciler, clock)
}

async fn assert_invariants(service: &SeatService) {
    for seat in service.seats().await {
        assert_eq!(seat.status == SeatStatus::Frozen, seat.frozen_until.is_some(), "seat {}", seat.id);
    }
    let mut active = HashSet::new();
    for booking in service.bookings().await.into_iter().filter(|b| b.is_active()) {
        assert!(active.insert(booking.seat_id.clone()), "seat {}", booking.seat_id);
    }
}

#[tokio::test]
async fn test_unclaimed_booking_becomes_no_show() {
    let (service, _reconciler, clock) = setup();
    let booking = service.book("A1", Holder::new("u-1", "Ada"), 30).await.unwrap();

    clock.advance(Duration::minutes(15));
    let report = service.sweep().await;
    assert_eq!(report.no_shows, vec![booking.id]);

    assert_eq!(service.seat("A1").await.unwrap().status, SeatStatus::Available);
    assert_eq!(service.bookings().await[0].status, BookingStatus::NoShow);
    assert_invariants(&service).await;
}

#[tokio::test]
async fn test_confirmed_arrival_survives_expiry() {
    let (service, _reconciler, clock) = setup();
    service.book("A1", Holder::new("u-1", "Ada"), 30).await.unwrap();

    clock.advance(Duration::minutes(6));
    service.confirm_arrival("A1").await.unwrap();

    clock.advance(Duration::minutes(30));
    assert!(service.sweep().await.is_empty());

    let seat = service.seat("A1").await.unwrap();
    assert_eq!(seat.status, SeatStatus::Occupied);
    let booking = service.active_booking("A1").await.unwrap();
    assert_eq!(booking.arrived_at, Some(t0() + Duration::minutes(6)));
    assert_invariants(&service).await;
}

#[tokio::test]
async fn test_release_after_arrival_completes() {
    let (service, _reconciler, _clock) = setup();
    service.book("A1", Holder::new("u-1", "Ada"), 30).await.unwrap();
    service.confirm_arrival("A1").await.unwrap();

    let completed = service.release("A1").await.unwrap().unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    assert_eq!(service.seat("A1").await.unwrap().status, SeatStatus::Available);
    assert_invariants(&service).await;
}

#[tokio::test]
async fn test_detector_confirms_frozen_seat() {
    let (service, reconciler, clock) = setup();
    service.book("B2", Holder::new("u-2", "Grace"), 60).await.unwrap();

    clock.advance(Duration::minutes(2));
    let outcome = reconciler.apply(OccupancySignal::new("B2", true)).await;
    assert_eq!(outcome, Some(OccupancyOutcome::ArrivalConfirmed));

    let seat = service.seat("B2").await.unwrap();
    assert_eq!(seat.status, SeatStatus::Occupied);
    assert!(seat.frozen_until.is_none());
    assert!(service.active_booking("B2").await.unwrap().arrived_at.is_some());

    clock.advance(Duration::minutes(20));
    assert!(service.sweep().await.no_shows.is_empty());
    assert_invariants(&service).await;
}

#[tokio::test]
async fn test_detector_empty_on_free_seat_is_noop() {
    let (service, reconciler, _clock) = setup();
    let before = service.snapshot().await;

    assert_eq!(
        reconciler.apply(OccupancySignal::new("B2", false)).await,
        Some(OccupancyOutcome::Unchanged)
    );
    assert_eq!(reconciler.apply(OccupancySignal::new("nope", true)).await, None);
    assert_eq!(service.snapshot().await, before);
}

#[tokio::test]
async fn test_rebooking_after_vacate_keeps_single_active() {
    let (service, reconciler, _clock) = setup();
    let first = service.book("A2", Holder::new("u-1", "Ada"), 30).await.unwrap();
    reconciler.apply(OccupancySignal::new("A2", true)).await;
    reconciler.apply(OccupancySignal::new("A2", false)).await;

    // Vacated by the detector: booking stays open until the seat is rebooked
    assert_eq!(service.active_booking("A2").await.unwrap().id, first.id);

    let second = service.book("A2", Holder::new("u-3", "Linus"), 45).await.unwrap();
    assert_eq!(service.active_booking("A2").await.unwrap().id, second.id);
    assert_invariants(&service).await;
}
