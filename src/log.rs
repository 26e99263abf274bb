use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing_subscriber::{
	filter::LevelFilter, fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
	EnvFilter,
};

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
	#[serde(default = "LogSettings::default_level")]
	pub level: String,
}

impl LogSettings {
	fn default_level() -> String {
		String::from("info")
	}
}

impl Default for LogSettings {
	fn default() -> Self {
		Self { level: Self::default_level() }
	}
}

/// log to stderr, stdout is reserved for command output
pub fn setup_logging(settings: &LogSettings) -> Result<()> {
	let level = tracing::Level::from_str(settings.level.as_str())
		.with_context(|| format!("invalid log level {:?}", settings.level))?;

	let fmt_layer = fmt::layer().with_writer(std::io::stderr);

	let filter_layer = EnvFilter::default()
		.add_directive(LevelFilter::from_level(level).into())
		.add_directive("hyper=warn".parse()?)
		.add_directive("reqwest=warn".parse()?);

	tracing_subscriber::registry().with(filter_layer).with(fmt_layer).try_init()?;

	Ok(())
}
