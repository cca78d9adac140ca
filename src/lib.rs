pub mod common;
pub mod error;
pub mod iperfer_blocking;
pub mod measure;

pub use common::{Args, PayloadSource, Role, RunConfig};
pub use error::{Error, Result};
pub use measure::{Direction, Report, TransferStats};
