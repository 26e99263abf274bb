//! decide what has to happen to get from the stored state to the desired configuration
use serde::Serialize;
use serde_json::Value;

use super::config::{AlertRuleConfig, AlertRuleState};

/// fields that can't be updated in place, changing them recreates the rule
pub const FORCE_NEW: [&str; 3] = ["space_id", "rule_type_id", "consumer"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "fields", rename_all = "snake_case")]
pub enum Plan {
	/// nothing is known about the rule yet
	Create,
	NoOp,
	/// the listed fields differ and can be updated in place
	Update(Vec<&'static str>),
	/// at least one of the listed fields is in [FORCE_NEW]
	Replace(Vec<&'static str>),
}

/// Structural equality of two json documents, key order and whitespace don't matter. If either
/// side isn't valid json the documents are considered different.
pub fn json_equal(old: &str, new: &str) -> bool {
	match (serde_json::from_str::<Value>(old), serde_json::from_str::<Value>(new)) {
		(Ok(old), Ok(new)) => old == new,
		_ => false,
	}
}

/// compare the stored state with the desired configuration
pub fn plan(prior: Option<&AlertRuleState>, desired: &AlertRuleConfig) -> Plan {
	let prior = match prior {
		Some(prior) => prior,
		None => return Plan::Create,
	};

	let changed = changed_fields(&prior.config, desired);

	if changed.is_empty() {
		Plan::NoOp
	} else if changed.iter().any(|field| FORCE_NEW.contains(field)) {
		Plan::Replace(changed)
	} else {
		Plan::Update(changed)
	}
}

/// names of the fields whose desired value differs from the stored one
pub fn changed_fields(prior: &AlertRuleConfig, desired: &AlertRuleConfig) -> Vec<&'static str> {
	let mut changed = Vec::new();

	let mut check = |field: &'static str, differs: bool| {
		if differs {
			changed.push(field);
		}
	};

	check("space_id", prior.space_id != desired.space_id);
	check("name", prior.name != desired.name);
	check("tags", prior.tags != desired.tags);
	check("rule_type_id", prior.rule_type_id != desired.rule_type_id);
	check("schedule", prior.schedule != desired.schedule);
	check(
		"throttle",
		prior.throttle.as_deref().unwrap_or_default()
			!= desired.throttle.as_deref().unwrap_or_default(),
	);
	check("notify_when", prior.notify_when != desired.notify_when);
	check("enabled", desired.enabled.map_or(false, |enabled| prior.enabled != Some(enabled)));
	check("consumer", prior.consumer != desired.consumer);
	check("params", !json_equal(&prior.params, &desired.params));
	check(
		"actions",
		prior.actions.len() != desired.actions.len()
			|| prior.actions.iter().zip(&desired.actions).any(|(prior, desired)| {
				prior.id != desired.id
					|| prior.group != desired.group
					|| !json_equal(&prior.params, &desired.params)
			}),
	);

	changed
}
