//! data structures exchanged with the kibana alerting api
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DefaultOnNull};

/// alerting rule as sent to and received from kibana
///
/// Zero valued fields are left out of the request body, missing fields in a response default to
/// their zero value and unknown fields are ignored.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Alert {
	#[serde(skip_serializing_if = "String::is_empty")]
	pub name: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub tags: Vec<String>,
	#[serde(skip_serializing_if = "String::is_empty")]
	pub rule_type_id: String,
	/// interval unit to value, e.g. `interval` => `5m`
	#[serde(skip_serializing_if = "IndexMap::is_empty")]
	pub schedule: IndexMap<String, String>,
	#[serde_as(as = "DefaultOnNull")]
	#[serde(skip_serializing_if = "String::is_empty")]
	pub throttle: String,
	#[serde_as(as = "DefaultOnNull")]
	#[serde(skip_serializing_if = "String::is_empty")]
	pub notify_when: String,
	/// kibana ignores `false` on creation, see [crate::resource::Reconciler::create]
	#[serde(skip_serializing_if = "is_false")]
	pub enabled: bool,
	#[serde(skip_serializing_if = "String::is_empty")]
	pub consumer: String,
	/// opaque rule type parameters
	#[serde(skip_serializing_if = "Value::is_null")]
	pub params: Value,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub actions: Vec<Action>,
}

/// notification attached to an [Alert], `id` references an existing connector
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Action {
	pub id: String,
	pub group: String,
	/// opaque connector parameters
	pub params: Value,
}

/// body returned by the rule creation endpoint, everything but the id is ignored
#[derive(Debug, Deserialize)]
pub(crate) struct Created {
	pub id: String,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
	!*value
}
