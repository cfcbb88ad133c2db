//! The account actions run on every pass.
//!
//! Each action is a [`TaskUnit`]. Tasks share one [`TaskContext`]: the remote
//! API plus the token chain established before any task runs.

pub mod check_in;
pub mod quota;
pub mod share;
pub mod traits;
pub mod upload;

pub use check_in::CheckInTask;
pub use quota::QuotaQueryTask;
pub use share::{select_target, ShareTask};
pub use traits::*;
pub use upload::UploadTask;
