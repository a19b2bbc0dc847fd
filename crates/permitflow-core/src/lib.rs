pub mod aggregator;
pub mod clock;
pub mod config;
pub mod error;
pub mod estimator;
pub mod normalizer;
pub mod percentile;
pub mod refresh;
pub mod resolver;
pub mod store;
pub mod trend;
pub mod types;
