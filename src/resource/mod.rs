//! the `kibana_alert_rule` resource
//!
//! Maps between the flat declarative representation ([AlertRuleConfig]) and the
//! [Alert][crate::kibana::Alert] entity, and drives create, read, update and delete through a
//! [KibanaApi][crate::kibana::KibanaApi].

use serde::Serialize;
use thiserror::Error;

pub use self::{
	config::{deflate_actions, flatten_actions, ActionConfig, AlertRuleConfig, AlertRuleState},
	plan::{changed_fields, json_equal, plan, Plan, FORCE_NEW},
	reconciler::Reconciler,
};
use crate::kibana::KibanaError;

pub(crate) mod config;
mod plan;
mod reconciler;

#[derive(Debug, Error)]
pub enum ResourceError {
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("{field} is not valid json: {source}")]
	InvalidJson {
		field: String,
		#[source]
		source: serde_json::Error,
	},

	#[error(transparent)]
	Kibana(#[from] KibanaError),

	/// The rule exists in kibana but a later step of the creation failed, e.g. the disable call
	/// after creating a disabled rule. Nothing is rolled back.
	#[error("rule {id} was created but {source}")]
	PartiallyCreated {
		id: String,
		#[source]
		source: KibanaError,
	},

	/// A replacement deleted the prior rule but its successor couldn't be created. Kibana now
	/// knows neither rule.
	#[error("rule {id} was deleted for replacement but {source}")]
	DeletedForReplace {
		id: String,
		#[source]
		source: Box<ResourceError>,
	},
}

impl ResourceError {
	/// the rule is gone on the kibana side and should be forgotten
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::Kibana(err) if err.is_not_found())
	}

	/// id of a rule that exists remotely although the operation failed
	pub fn created_id(&self) -> Option<&str> {
		match self {
			Self::PartiallyCreated { id, .. } => Some(id),
			Self::DeletedForReplace { source, .. } => source.created_id(),
			_ => None,
		}
	}

	/// id of a rule that was deleted remotely before the operation failed
	pub fn deleted_id(&self) -> Option<&str> {
		match self {
			Self::DeletedForReplace { id, .. } => Some(id),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
	Error,
	Warning,
}

/// user facing report of a failed operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
	pub severity: Severity,
	pub summary: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
}

impl Diagnostic {
	pub fn warning(summary: impl Into<String>) -> Self {
		Self { severity: Severity::Warning, summary: summary.into(), detail: None }
	}
}

impl From<&KibanaError> for Diagnostic {
	fn from(err: &KibanaError) -> Self {
		let (summary, detail) = match err {
			KibanaError::Remote { operation, status, body, request } => {
				let mut detail = format!("response body:\n{body}");
				if let Some(request) = request {
					detail.push_str(&format!("\nrequest body:\n{request}"));
				}
				(format!("{operation} failed: received status {status}"), Some(detail))
			}
			KibanaError::Http { operation, source } => {
				(format!("{operation} failed"), Some(source.to_string()))
			}
			KibanaError::Serialization { operation, source } => {
				(format!("{operation} failed"), Some(source.to_string()))
			}
			KibanaError::NotFound { .. } => (err.to_string(), None),
		};

		Self { severity: Severity::Error, summary, detail }
	}
}

impl From<&ResourceError> for Diagnostic {
	fn from(err: &ResourceError) -> Self {
		match err {
			ResourceError::Kibana(err) => Self::from(err),
			ResourceError::PartiallyCreated { id, source } => {
				let inner = Self::from(source);
				Self {
					summary: format!("rule {id} was created but {}", inner.summary),
					..inner
				}
			}
			ResourceError::DeletedForReplace { id, source } => {
				let inner = Self::from(source.as_ref());
				Self {
					summary: format!("rule {id} was deleted for replacement but {}", inner.summary),
					..inner
				}
			}
			ResourceError::InvalidConfig(_) | ResourceError::InvalidJson { .. } => {
				Self { severity: Severity::Error, summary: err.to_string(), detail: None }
			}
		}
	}
}
