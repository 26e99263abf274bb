//! in-memory [KibanaApi] for reconciler tests
#![allow(clippy::expect_used)]

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Mutex,
	},
};

use async_trait::async_trait;

use super::{Alert, KibanaApi, KibanaError};

/// hands out ids for created rules
pub trait IdGenerator: Send + Sync {
	fn next_id(&self) -> String;
}

/// `rule-1`, `rule-2`, ...
#[derive(Debug, Default)]
pub struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
	fn next_id(&self) -> String {
		format!("rule-{}", self.0.fetch_add(1, Ordering::Relaxed) + 1)
	}
}

/// a call received by [KibanaMockClient]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
	Create(Alert),
	Read(String),
	Update(String, Alert),
	Delete(String),
	Enable(String),
	Disable(String),
}

/// Stores rules in memory. Like kibana it ignores `enabled` on creation: a freshly created
/// rule is always enabled until [KibanaApi::disable_rule] is called.
pub struct KibanaMockClient {
	pub create_should_fail: bool,
	pub read_should_fail: bool,
	pub update_should_fail: bool,
	pub delete_should_fail: bool,
	pub enable_should_fail: bool,
	pub disable_should_fail: bool,
	ids: Box<dyn IdGenerator>,
	alerts: Mutex<HashMap<String, Alert>>,
	calls: Mutex<Vec<Call>>,
}

impl Default for KibanaMockClient {
	fn default() -> Self {
		Self::with_id_generator(SequentialIds::default())
	}
}

impl KibanaMockClient {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_id_generator(ids: impl IdGenerator + 'static) -> Self {
		Self {
			create_should_fail: false,
			read_should_fail: false,
			update_should_fail: false,
			delete_should_fail: false,
			enable_should_fail: false,
			disable_should_fail: false,
			ids: Box::new(ids),
			alerts: Mutex::new(HashMap::new()),
			calls: Mutex::new(Vec::new()),
		}
	}

	/// every call received so far, oldest first
	pub fn calls(&self) -> Vec<Call> {
		self.calls.lock().expect("mock lock poisoned").clone()
	}

	pub fn clear_calls(&self) {
		self.calls.lock().expect("mock lock poisoned").clear();
	}

	/// rule as currently stored
	pub fn stored(&self, alert_id: &str) -> Option<Alert> {
		self.alerts.lock().expect("mock lock poisoned").get(alert_id).cloned()
	}

	/// put a rule into the store without recording a call
	pub fn insert(&self, alert_id: &str, alert: Alert) {
		self.alerts.lock().expect("mock lock poisoned").insert(alert_id.to_owned(), alert);
	}

	fn record(&self, call: Call) {
		self.calls.lock().expect("mock lock poisoned").push(call);
	}

	fn set_enabled(&self, alert_id: &str, enabled: bool) -> Result<(), KibanaError> {
		match self.alerts.lock().expect("mock lock poisoned").get_mut(alert_id) {
			Some(alert) => {
				alert.enabled = enabled;
				Ok(())
			}
			None => Err(KibanaError::NotFound { id: alert_id.to_owned() }),
		}
	}
}

/// the error kibana would answer a rejected call with
fn rejected(operation: &'static str) -> KibanaError {
	KibanaError::Remote { operation, status: 500, body: String::from("mock failure"), request: None }
}

#[async_trait]
impl KibanaApi for KibanaMockClient {
	async fn create_alert_rule(&self, alert: &Alert) -> Result<String, KibanaError> {
		self.record(Call::Create(alert.clone()));
		if self.create_should_fail {
			return Err(rejected("creating rule"));
		}

		let alert_id = self.ids.next_id();
		self.insert(&alert_id, Alert { enabled: true, ..alert.clone() });

		Ok(alert_id)
	}

	async fn read_alert_rule(&self, alert_id: &str) -> Result<Alert, KibanaError> {
		self.record(Call::Read(alert_id.to_owned()));
		if self.read_should_fail {
			return Err(rejected("reading rule"));
		}

		self.stored(alert_id).ok_or_else(|| KibanaError::NotFound { id: alert_id.to_owned() })
	}

	async fn update_alert_rule(&self, alert_id: &str, alert: &Alert) -> Result<(), KibanaError> {
		self.record(Call::Update(alert_id.to_owned(), alert.clone()));
		if self.update_should_fail {
			return Err(rejected("updating rule"));
		}

		let mut alerts = self.alerts.lock().expect("mock lock poisoned");
		let stored =
			alerts.get_mut(alert_id).ok_or_else(|| KibanaError::NotFound { id: alert_id.to_owned() })?;

		// like kibana, rule type, consumer and enablement can't change through an update
		*stored = Alert {
			rule_type_id: stored.rule_type_id.clone(),
			consumer: stored.consumer.clone(),
			enabled: stored.enabled,
			..alert.clone()
		};

		Ok(())
	}

	async fn delete_alert_rule(&self, alert_id: &str) -> Result<(), KibanaError> {
		self.record(Call::Delete(alert_id.to_owned()));
		if self.delete_should_fail {
			return Err(rejected("deleting rule"));
		}

		self.alerts
			.lock()
			.expect("mock lock poisoned")
			.remove(alert_id)
			.map(drop)
			.ok_or_else(|| KibanaError::NotFound { id: alert_id.to_owned() })
	}

	async fn enable_rule(&self, alert_id: &str) -> Result<(), KibanaError> {
		self.record(Call::Enable(alert_id.to_owned()));
		if self.enable_should_fail || alert_id.is_empty() {
			return Err(rejected("enabling rule"));
		}

		self.set_enabled(alert_id, true)
	}

	async fn disable_rule(&self, alert_id: &str) -> Result<(), KibanaError> {
		self.record(Call::Disable(alert_id.to_owned()));
		if self.disable_should_fail || alert_id.is_empty() {
			return Err(rejected("disabling rule"));
		}

		self.set_enabled(alert_id, false)
	}
}
