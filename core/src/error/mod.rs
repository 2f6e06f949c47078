#[allow(clippy::module_inception)]
pub mod batch;
pub mod error;
pub mod executor;

pub use batch::{BatchError, ErrorCode};
pub use error::CliError;
pub use executor::ExecutorError;
