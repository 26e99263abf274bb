//! keeps kibana alerting rules in line with declarative resource files
//!
//! Features:
//! - plan, apply, refresh, import and destroy a rule
//! - params are compared as json, reformatting them is not a change
//! - rules that should start disabled are disabled right after creation

use anyhow::{Context, Result};
use kibana_alert_provider::{
	cli, http_client::ReqwestClient, kibana::KibanaClient, log, resource::Reconciler,
	settings::Settings, telemetry,
};

/// exit the complete program if one thread panics
fn setup_panic_handler() {
	let default_panic = std::panic::take_hook();
	std::panic::set_hook(Box::new(move |info| {
		default_panic(info);
		std::process::exit(1);
	}));
}

/// the entry point of the program
#[tokio::main]
pub async fn main() -> Result<()> {
	setup_panic_handler();

	let matches = cli::command().get_matches();

	let config_path = matches.value_of("config").unwrap_or("./provider.yaml");
	let settings = Settings::init(config_path, matches.value_of("level"))
		.context("failed to load config and command line arguments")?;

	log::setup_logging(&settings.log).context("could not setup logging")?;

	let http_client =
		ReqwestClient::new(settings.kibana_timeout).context("failed to construct http client")?;
	let registry = http_client.registry().clone();

	let auth = settings.auth_token()?;
	let kibana = KibanaClient::new(http_client, settings.kibana_host.as_str(), auth.expose())
		.context("kibana credentials are not a valid header value")?;

	let reconciler = Reconciler::new(kibana);

	let result = cli::run(&reconciler, &matches, &mut std::io::stdout()).await;

	if matches.is_present("metrics") {
		eprint!("{}", telemetry::render(&registry)?);
	}

	result
}
