//! Remote calls against the Caiyun cloud service.
//!
//! [`CloudApi`] is the seam every credential step and task goes through.
//! [`CaiyunClient`] talks to the real service over HTTP; [`MockCloudApi`]
//! scripts replies and records calls for tests.

pub mod api;
pub mod error;
pub mod http;
pub mod mock;
mod wire;

pub use api::*;
pub use error::*;
pub use http::*;
pub use mock::*;
