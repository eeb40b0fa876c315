pub mod dispatch;
pub mod error;
pub mod routing;

pub use error::WorkflowError;
