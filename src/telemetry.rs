//! prometheus meters of the http client in text exposition format
use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};

pub fn render(registry: &Registry) -> Result<String> {
	let mut buffer = vec![];
	let encoder = TextEncoder::new();
	let metric_families = registry.gather();

	encoder.encode(&metric_families, &mut buffer).context("failed to encode metrics")?;

	String::from_utf8(buffer).context("metrics are not valid utf-8")
}
