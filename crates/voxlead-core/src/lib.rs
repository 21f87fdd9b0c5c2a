//! # Voxlead Core
//!
//! Shared foundation for the Voxlead workspace: configuration, the error
//! type, the lead/report data model, the store and sender trait seams the
//! dispatch job is built against, and input validation helpers.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;
pub mod validate;

pub use config::VoxleadConfig;
pub use error::{Result, VoxleadError};
pub use traits::{FollowUpSender, FollowUpStore};
pub use types::{CallRequest, DispatchReport, RecordError};
