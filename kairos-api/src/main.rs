use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use kairos_api::{app, reaper::spawn_hold_reaper, AppState};
use kairos_availability::{AvailabilityProjector, SchedulingEngine, SlotHoldArbiter};
use kairos_booking::BookingRepository;
use kairos_core::EventPublisher;
use kairos_schedule::ScheduleRepository;
use kairos_store::{InMemoryBookingRepository, InMemoryScheduleRepository, TracingPublisher};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kairos_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = kairos_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Kairos API on port {}", config.server.port);

    let schedules: Arc<dyn ScheduleRepository> = Arc::new(InMemoryScheduleRepository::new());
    let bookings: Arc<dyn BookingRepository> = Arc::new(InMemoryBookingRepository::new());
    let publisher: Arc<dyn EventPublisher> = Arc::new(TracingPublisher);

    let arbiter = Arc::new(SlotHoldArbiter::new(
        schedules.clone(),
        bookings.clone(),
        chrono::Duration::seconds(config.business_rules.slot_hold_seconds as i64),
    ));
    let projector = Arc::new(AvailabilityProjector::new(
        schedules.clone(),
        bookings.clone(),
        arbiter.clone(),
        config.business_rules.granularity_minutes,
    ));
    let engine = Arc::new(SchedulingEngine::new(
        schedules,
        bookings,
        arbiter.clone(),
        projector.clone(),
        publisher,
    ));

    spawn_hold_reaper(
        arbiter.clone(),
        Duration::from_secs(config.business_rules.reaper_interval_seconds),
    );

    let app_state = AppState {
        engine,
        projector,
        arbiter,
        business_rules: config.business_rules.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
