//! manage kibana alerting rules declaratively
//!
//! - [kibana] talks to the kibana alerting api
//! - [resource] maps declarative rule configurations onto kibana and plans changes
//! - [cli] reads resource and state files and drives the [resource::Reconciler]

pub mod cli;
pub mod http_client;
pub mod kibana;
pub mod log;
pub mod resource;
pub mod settings;
pub mod telemetry;
