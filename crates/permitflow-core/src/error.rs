use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("baseline store error: {0}")]
    Store(#[source] BoxError),

    #[error("routing log error: {0}")]
    Log(#[source] BoxError),

    #[error("unknown period label '{0}'")]
    UnknownPeriod(String),

    #[error("unknown metric type '{0}'")]
    UnknownMetricType(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
