pub mod api;
pub mod cache;
pub mod config;
pub mod datasource;
pub mod domain;
pub mod engine;
pub mod error;
pub mod services;

pub use cache::TtlCache;
pub use config::Config;
pub use datasource::{DataSource, DataSourceError};
pub use domain::{Address, PositionState, RawFill, Side, Trade};
pub use engine::BuilderFilter;
pub use error::AppError;
