pub mod detector;
pub mod engine;
pub mod export;
pub mod row_pipeline;
pub mod throttle;
pub mod validator;

pub use crate::domain::model::{GeocodeResult, GeocodeSession, InputTable, OutputTable};
pub use crate::domain::ports::{ConfigProvider, Pipeline, ProgressReporter, ReverseGeocoder, Storage};
pub use crate::utils::error::Result;
