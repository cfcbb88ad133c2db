//! Unattended daily maintenance for a Caiyun personal cloud account.
//!
//! Each pass exchanges the account's durable credential for session and
//! execution tokens, then checks in, uploads a synthetic file, shares a file
//! and reports the cloud quota. Task failures are isolated; a credential
//! failure stops the pass.

pub mod schedule;
pub mod telemetry;

pub use caiyun_auth as auth;
pub use caiyun_client as client;
pub use caiyun_config as config;
pub use caiyun_orchestrator as orchestrator;
pub use caiyun_tasks as tasks;
pub use caiyun_types as types;

pub use caiyun_config::{validate_config, AppConfig, ConfigLoader};
pub use caiyun_orchestrator::{MaintenancePass, PassError, RunReport};
