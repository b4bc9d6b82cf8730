pub mod buffer;
pub mod config;
pub mod error;
pub mod models;
pub mod record;
pub mod report;
pub mod runner;
pub mod scheduler;
pub mod sensor;
pub mod session;
pub mod stats;
pub mod storage;
pub mod utils;

pub use buffer::SampleBuffer;
pub use error::{PersistError, WorkoutError};
pub use models::{
    Interval, IntervalStatistics, Phase, QuantityKind, QuantitySample, SessionState,
    WorkoutConfiguration, WorkoutRecord,
};
pub use scheduler::{IntervalScheduler, Transition};
pub use session::WorkoutSession;
pub use storage::{JsonStorage, MemoryStorage, PersistenceGateway};
