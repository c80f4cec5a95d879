use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("io error")]
    Io(#[from] std::io::Error),

    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}
