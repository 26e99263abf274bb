//! declarative representation of an alerting rule and its mapping to [Alert]
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ResourceError;
use crate::kibana::{Action, Alert};

/// desired state of an alerting rule as written by the user
///
/// `params` fields hold json documents as strings and are compared structurally, see
/// [json_equal][super::json_equal].
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AlertRuleConfig {
	/// kibana space the rule lives in, the default space if unset
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub space_id: Option<String>,
	pub name: String,
	#[serde(default)]
	pub tags: Vec<String>,
	/// can't be changed after creation
	pub rule_type_id: String,
	pub schedule: IndexMap<String, String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub throttle: Option<String>,
	/// `onActionGroupChange`, `onActiveAlert` or `onThrottleInterval`, checked by kibana
	pub notify_when: String,
	/// unset leaves enablement to kibana
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub enabled: Option<bool>,
	/// can't be changed after creation
	pub consumer: String,
	pub params: String,
	#[serde(default)]
	pub actions: Vec<ActionConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
	/// id of the connector
	pub id: String,
	pub group: String,
	pub params: String,
}

/// what is remembered about a managed rule between runs
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AlertRuleState {
	/// id assigned by kibana
	pub id: String,
	pub config: AlertRuleConfig,
}

impl AlertRuleConfig {
	/// check everything that can be checked without asking kibana
	pub fn validate(&self) -> Result<(), ResourceError> {
		let required = [
			("name", &self.name),
			("rule_type_id", &self.rule_type_id),
			("notify_when", &self.notify_when),
			("consumer", &self.consumer),
		];

		for (field, value) in required {
			if value.trim().is_empty() {
				return Err(ResourceError::InvalidConfig(format!("{field} must not be empty")));
			}
		}

		if self.schedule.is_empty() {
			return Err(ResourceError::InvalidConfig(String::from("schedule must not be empty")));
		}

		parse_params("params", &self.params)?;

		for (index, action) in self.actions.iter().enumerate() {
			if action.id.is_empty() || action.group.is_empty() {
				return Err(ResourceError::InvalidConfig(format!(
					"actions[{index}] needs an id and a group"
				)));
			}
			parse_params(&format!("actions[{index}].params"), &action.params)?;
		}

		Ok(())
	}

	/// payload for creating the rule
	pub fn to_alert(&self) -> Result<Alert, ResourceError> {
		Ok(Alert {
			name: self.name.clone(),
			tags: self.tags.clone(),
			rule_type_id: self.rule_type_id.clone(),
			schedule: self.schedule.clone(),
			throttle: self.throttle.clone().unwrap_or_default(),
			notify_when: self.notify_when.clone(),
			// `false` is dropped from the payload and kibana wouldn't honor it anyway
			enabled: self.enabled.unwrap_or(true),
			consumer: self.consumer.clone(),
			params: parse_params("params", &self.params)?,
			actions: deflate_actions(&self.actions)?,
		})
	}

	/// Payload for updating the rule. Kibana rejects rule type, consumer and enablement in
	/// updates, they are left out.
	pub fn to_update_alert(&self) -> Result<Alert, ResourceError> {
		Ok(Alert {
			rule_type_id: String::new(),
			consumer: String::new(),
			enabled: false,
			..self.to_alert()?
		})
	}

	/// declarative representation of a rule read from kibana
	pub fn from_alert(alert: Alert, space_id: Option<String>) -> Result<Self, ResourceError> {
		Ok(Self {
			space_id,
			name: alert.name,
			tags: alert.tags,
			rule_type_id: alert.rule_type_id,
			schedule: alert.schedule,
			throttle: Some(alert.throttle).filter(|throttle| !throttle.is_empty()),
			notify_when: alert.notify_when,
			enabled: Some(alert.enabled),
			consumer: alert.consumer,
			params: encode_params("params", &alert.params)?,
			actions: flatten_actions(&alert.actions)?,
		})
	}
}

/// turn flat action records into [Action]s
pub fn deflate_actions(actions: &[ActionConfig]) -> Result<Vec<Action>, ResourceError> {
	actions
		.iter()
		.enumerate()
		.map(|(index, action)| {
			Ok(Action {
				id: action.id.clone(),
				group: action.group.clone(),
				params: parse_params(&format!("actions[{index}].params"), &action.params)?,
			})
		})
		.collect()
}

/// turn [Action]s into flat action records
pub fn flatten_actions(actions: &[Action]) -> Result<Vec<ActionConfig>, ResourceError> {
	actions
		.iter()
		.enumerate()
		.map(|(index, action)| {
			Ok(ActionConfig {
				id: action.id.clone(),
				group: action.group.clone(),
				params: encode_params(&format!("actions[{index}].params"), &action.params)?,
			})
		})
		.collect()
}

fn parse_params(field: &str, params: &str) -> Result<Value, ResourceError> {
	serde_json::from_str(params)
		.map_err(|source| ResourceError::InvalidJson { field: field.to_owned(), source })
}

fn encode_params(field: &str, params: &Value) -> Result<String, ResourceError> {
	serde_json::to_string(params)
		.map_err(|source| ResourceError::InvalidJson { field: field.to_owned(), source })
}
