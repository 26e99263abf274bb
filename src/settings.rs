use std::{fmt, time::Duration};

use anyhow::{bail, Context, Result};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use url::Url;

use crate::log::LogSettings;

static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// a credential that never shows up in logs or debug output
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
	pub fn new(secret: impl Into<String>) -> Self {
		Self(secret.into())
	}

	pub fn expose(&self) -> &str {
		&self.0
	}
}

impl fmt::Debug for Secret {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("[redacted]")
	}
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
	/// base url of kibana, e.g. `https://kibana.example.com:5601`
	pub kibana_host: Url,
	/// base64 encoded `user:password`
	#[serde(default)]
	pub kibana_auth: Option<Secret>,
	#[serde(default)]
	pub kibana_username: Option<String>,
	#[serde(default)]
	pub kibana_password: Option<Secret>,
	#[serde_as(as = "DurationSecondsWithFrac<f64>")]
	#[serde(default = "Settings::default_timeout")]
	pub kibana_timeout: Duration,
	#[serde(default)]
	pub log: LogSettings,
}

impl Settings {
	fn default_timeout() -> Duration {
		Duration::from_secs(30)
	}

	/// Load the settings once, later calls hand out the settings loaded first. Values from the
	/// environment (`KIBANA_HOST`, `KIBANA_AUTH`, ...) take precedence over the config file, a
	/// missing config file is fine.
	pub fn init(config_path: &str, level: Option<&str>) -> Result<&'static Self> {
		SETTINGS.get_or_try_init(|| {
			let builder = Config::builder()
				.add_source(config::File::with_name(config_path).required(false))
				.add_source(Environment::with_prefix("kibana").keep_prefix(true));

			let mut settings = Self::load(builder)
				.with_context(|| format!("failed to load config from {config_path} and environment"))?;

			if let Some(level) = level {
				settings.log.level = level.to_lowercase();
			}

			Ok(settings)
		})
	}

	fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
		let settings: Self = builder
			.build()
			.context("can't load config")?
			.try_deserialize()
			.context("can't load config")?;

		settings.auth_token()?;

		Ok(settings)
	}

	/// the token sent as `Authorization: Basic <token>`
	pub fn auth_token(&self) -> Result<Secret> {
		match (&self.kibana_auth, &self.kibana_username, &self.kibana_password) {
			(Some(token), None, None) => Ok(token.clone()),
			(None, Some(username), Some(password)) => {
				Ok(Secret(base64::encode(format!("{}:{}", username, password.expose()))))
			}
			(Some(_), _, _) => {
				bail!("kibana_auth can't be combined with kibana_username or kibana_password")
			}
			_ => bail!("either kibana_auth or kibana_username and kibana_password have to be set"),
		}
	}
}
