//! client for the kibana alerting rule api
//!
//! [KibanaApi] is the contract the [reconciler][crate::resource::Reconciler] depends on,
//! [KibanaClient] implements it on top of an [HttpClientApi][crate::http_client::HttpClientApi].

use async_trait::async_trait;
use thiserror::Error;

pub use self::{
	alert::{Action, Alert},
	client::KibanaClient,
};
use crate::http_client::HttpError;

mod alert;
mod client;
#[cfg(test)]
pub mod mock;

#[derive(Debug, Error)]
pub enum KibanaError {
	/// the request didn't make it to kibana or the response body couldn't be read
	#[error("{operation} failed: {source}")]
	Http {
		operation: &'static str,
		#[source]
		source: HttpError,
	},

	/// kibana answered with something else than 200 or 204
	#[error("{operation} failed: received status {status}: {body}")]
	Remote {
		operation: &'static str,
		status: u16,
		body: String,
		/// request body of create and update calls
		request: Option<String>,
	},

	/// there is no rule with this id
	#[error("rule {id} not found")]
	NotFound { id: String },

	#[error("{operation} failed: {source}")]
	Serialization {
		operation: &'static str,
		#[source]
		source: serde_json::Error,
	},
}

impl KibanaError {
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}
}

/// the six alerting rule operations
#[async_trait]
pub trait KibanaApi: Send + Sync {
	/// create rule, returns the id assigned by kibana
	async fn create_alert_rule(&self, alert: &Alert) -> Result<String, KibanaError>;

	async fn read_alert_rule(&self, alert_id: &str) -> Result<Alert, KibanaError>;

	async fn update_alert_rule(&self, alert_id: &str, alert: &Alert) -> Result<(), KibanaError>;

	async fn delete_alert_rule(&self, alert_id: &str) -> Result<(), KibanaError>;

	async fn enable_rule(&self, alert_id: &str) -> Result<(), KibanaError>;

	async fn disable_rule(&self, alert_id: &str) -> Result<(), KibanaError>;
}
