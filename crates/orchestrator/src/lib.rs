//! Task orchestration for the maintenance run.
//!
//! [`Orchestrator`] runs registered [`caiyun_tasks::TaskUnit`]s in order with
//! per-unit failure isolation. [`MaintenancePass`] is the driver that
//! establishes credentials and registers the four account tasks.

pub mod orchestrator;
pub mod pass;

pub use orchestrator::*;
pub use pass::*;
