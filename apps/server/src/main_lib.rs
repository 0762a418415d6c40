use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use bookdrive_core::{
    allocations::{AllocationService, AllocationServiceTrait},
    consistency::{ConsistencyService, ConsistencyServiceTrait},
    donations::{DonationService, DonationServiceTrait},
    drives::{DriveService, DriveServiceTrait},
    events::DomainEventSink,
    schools::{SchoolService, SchoolServiceTrait},
    users::{UserService, UserServiceTrait},
};
use bookdrive_storage_sqlite::{
    allocations::AllocationRepository,
    db::{self, write_actor},
    donations::DonationRepository,
    drives::DriveRepository,
    schools::SchoolRepository,
    users::UserRepository,
};

use crate::{config::Config, domain_events::LoggingDomainEventSink};

pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
    pub drive_service: Arc<dyn DriveServiceTrait>,
    pub school_service: Arc<dyn SchoolServiceTrait>,
    pub donation_service: Arc<dyn DonationServiceTrait>,
    pub allocation_service: Arc<dyn AllocationServiceTrait>,
    pub consistency_service: Arc<dyn ConsistencyServiceTrait>,
    pub db_path: String,
}

/// Installs the global subscriber. `log` records from the library crates are
/// forwarded into tracing.
pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    // A second call (tests build several states) keeps the first subscriber.
    let _ = if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let user_repository = Arc::new(UserRepository::new(pool.clone(), writer.clone()));
    let drive_repository = Arc::new(DriveRepository::new(pool.clone(), writer.clone()));
    let school_repository = Arc::new(SchoolRepository::new(pool.clone(), writer.clone()));
    let donation_repository = Arc::new(DonationRepository::new(pool.clone(), writer.clone()));
    let allocation_repository = Arc::new(AllocationRepository::new(pool.clone(), writer));

    let domain_event_sink: Arc<dyn DomainEventSink> = Arc::new(LoggingDomainEventSink::new());

    let allocation_service = Arc::new(AllocationService::new(
        drive_repository.clone(),
        user_repository.clone(),
        school_repository.clone(),
        donation_repository.clone(),
        allocation_repository.clone(),
        allocation_repository.clone(),
        domain_event_sink.clone(),
        config.allocation_mode,
    ));
    tracing::info!("Allocation mode: {:?}", allocation_service.mode());

    let consistency_service = Arc::new(ConsistencyService::new(
        drive_repository.clone(),
        user_repository.clone(),
        donation_repository.clone(),
        allocation_repository,
        domain_event_sink.clone(),
    ));
    let donation_service = Arc::new(DonationService::new(
        donation_repository,
        drive_repository.clone(),
        user_repository.clone(),
        domain_event_sink,
    ));

    Ok(Arc::new(AppState {
        user_service: Arc::new(UserService::new(user_repository)),
        drive_service: Arc::new(DriveService::new(drive_repository)),
        school_service: Arc::new(SchoolService::new(school_repository)),
        donation_service,
        allocation_service,
        consistency_service,
        db_path,
    }))
}
