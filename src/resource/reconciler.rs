//! create, read, update and delete protocol of the alert rule resource
use super::{
	config::{AlertRuleConfig, AlertRuleState},
	plan::{plan, Plan},
	ResourceError,
};
use crate::kibana::KibanaApi;

/// Keeps kibana in line with the declarative configuration.
///
/// Every operation is a sequence of blocking calls against kibana and stops at the first error.
/// Nothing is rolled back.
#[derive(Debug)]
pub struct Reconciler<K> {
	client: K,
}

impl<K: KibanaApi> Reconciler<K> {
	pub fn new(client: K) -> Self {
		Self { client }
	}

	pub fn client(&self) -> &K {
		&self.client
	}

	/// Create the rule and read it back.
	///
	/// Kibana ignores `enabled: false` on creation, so a rule that should start disabled is
	/// disabled right after it was created. If that or the read back fails the error carries the
	/// id of the created rule.
	pub async fn create(&self, config: &AlertRuleConfig) -> Result<AlertRuleState, ResourceError> {
		config.validate()?;

		let alert = config.to_alert()?;
		let id = self.client.create_alert_rule(&alert).await?;

		tracing::info!("created rule {} ({})", id, config.name);

		if config.enabled == Some(false) {
			self.client
				.disable_rule(&id)
				.await
				.map_err(|source| ResourceError::PartiallyCreated { id: id.clone(), source })?;

			tracing::info!("disabled rule {id} after creation");
		}

		let fetched = self.fetch(&id, config.space_id.clone()).await;
		match fetched {
			Ok(state) => Ok(state),
			Err(ResourceError::Kibana(source)) => Err(ResourceError::PartiallyCreated { id, source }),
			Err(err) => Err(err),
		}
	}

	/// fetch the rule and map it back into its declarative representation
	pub async fn read(
		&self,
		id: &str,
		space_id: Option<String>,
	) -> Result<AlertRuleState, ResourceError> {
		self.fetch(id, space_id).await
	}

	/// start managing an existing rule
	pub async fn import(
		&self,
		id: &str,
		space_id: Option<String>,
	) -> Result<AlertRuleState, ResourceError> {
		let state = self.fetch(id, space_id).await?;
		tracing::info!("imported rule {} ({})", id, state.config.name);
		Ok(state)
	}

	/// Push the desired configuration to an existing rule.
	///
	/// Enablement can't be changed by the update call, a changed `enabled` is applied with an
	/// explicit enable or disable call before the update.
	pub async fn update(
		&self,
		prior: &AlertRuleState,
		desired: &AlertRuleConfig,
	) -> Result<AlertRuleState, ResourceError> {
		desired.validate()?;

		let alert = desired.to_update_alert()?;
		let id = prior.id.as_str();

		match desired.enabled {
			Some(true) if prior.config.enabled != Some(true) => {
				self.client.enable_rule(id).await?;
				tracing::info!("enabled rule {id}");
			}
			Some(false) if prior.config.enabled != Some(false) => {
				self.client.disable_rule(id).await?;
				tracing::info!("disabled rule {id}");
			}
			_ => {}
		}

		self.client.update_alert_rule(id, &alert).await?;
		tracing::info!("updated rule {id}");

		self.fetch(id, desired.space_id.clone()).await
	}

	pub async fn delete(&self, id: &str) -> Result<(), ResourceError> {
		self.client.delete_alert_rule(id).await?;
		tracing::info!("deleted rule {id}");
		Ok(())
	}

	/// do whatever [plan] says is necessary to get from `prior` to `desired`
	pub async fn apply(
		&self,
		prior: Option<&AlertRuleState>,
		desired: &AlertRuleConfig,
	) -> Result<AlertRuleState, ResourceError> {
		match (prior, plan(prior, desired)) {
			(Some(prior), Plan::NoOp) => {
				tracing::info!("rule {} is up to date", prior.id);
				Ok(prior.clone())
			}
			(Some(prior), Plan::Update(fields)) => {
				tracing::debug!("updating {:?} of rule {}", fields, prior.id);
				self.update(prior, desired).await
			}
			(Some(prior), Plan::Replace(fields)) => {
				tracing::info!("{:?} of rule {} can't be updated, replacing it", fields, prior.id);
				self.delete(&prior.id).await?;
				self.create(desired).await.map_err(|source| ResourceError::DeletedForReplace {
					id: prior.id.clone(),
					source: Box::new(source),
				})
			}
			(_, _) => self.create(desired).await,
		}
	}

	async fn fetch(
		&self,
		id: &str,
		space_id: Option<String>,
	) -> Result<AlertRuleState, ResourceError> {
		let alert = self.client.read_alert_rule(id).await?;

		Ok(AlertRuleState {
			id: id.to_owned(),
			config: AlertRuleConfig::from_alert(alert, space_id)?,
		})
	}
}
