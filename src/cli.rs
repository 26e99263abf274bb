//! command line interface around the [Reconciler]
//!
//! The desired configuration of a rule is read from a resource file (yaml, json or toml), what is
//! known about the managed rule is kept in a json state file between runs. Results are written
//! as json to the given writer, problems are reported as [Diagnostic]s on stderr.
use std::{fs, io::Write, path::Path};

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgMatches, Command};
use config::Config;
use serde::Serialize;

use crate::{
	kibana::KibanaApi,
	resource::{plan, AlertRuleConfig, AlertRuleState, Diagnostic, Reconciler, ResourceError},
};

pub fn command() -> Command<'static> {
	let resource = Arg::new("resource")
		.help("path of the resource file describing the desired rule")
		.takes_value(true)
		.short('r')
		.long("resource")
		.required(true);

	let state = Arg::new("state")
		.help("path of the state file of the managed rule")
		.takes_value(true)
		.short('s')
		.long("state");

	Command::new(clap::crate_name!())
		.version(clap::crate_version!())
		.about(clap::crate_description!())
		.author(clap::crate_authors!())
		.subcommand_required(true)
		.arg_required_else_help(true)
		.args(&[
			Arg::new("config")
				.help("path of config file")
				.takes_value(true)
				.short('c')
				.long("config")
				.default_value("./provider.yaml"),
			Arg::new("level")
				.help("log level")
				.possible_values(["error", "warn", "info", "debug", "trace"])
				.ignore_case(true)
				.takes_value(true)
				.long("log"),
			Arg::new("metrics")
				.help("print the http client meters to stderr before exiting")
				.long("metrics"),
		])
		.subcommand(
			Command::new("plan")
				.about("show what apply would do")
				.args(&[resource.clone(), state.clone()]),
		)
		.subcommand(
			Command::new("apply")
				.about("create, update or replace the rule and write the state file")
				.args(&[resource, state.clone().required(true)]),
		)
		.subcommand(
			Command::new("refresh")
				.about("update the state file from kibana")
				.arg(state.clone().required(true)),
		)
		.subcommand(
			Command::new("import")
				.about("start managing an existing rule")
				.args(&[
					Arg::new("id")
						.help("id of the rule in kibana")
						.takes_value(true)
						.long("id")
						.required(true),
					Arg::new("space-id")
						.help("kibana space of the rule")
						.takes_value(true)
						.long("space-id"),
					state.clone().required(true),
				]),
		)
		.subcommand(
			Command::new("destroy")
				.about("delete the rule and its state file")
				.arg(state.required(true)),
		)
}

/// run the subcommand selected in `matches`
pub async fn run<K: KibanaApi, W: Write>(
	reconciler: &Reconciler<K>,
	matches: &ArgMatches,
	out: &mut W,
) -> Result<()> {
	match matches.subcommand() {
		Some(("plan", args)) => {
			let desired = load_resource(required(args, "resource")?)?;
			let prior = match args.value_of("state") {
				Some(path) => read_state(path)?,
				None => None,
			};

			print(out, &plan(prior.as_ref(), &desired))
		}
		Some(("apply", args)) => {
			let desired = load_resource(required(args, "resource")?)?;
			let state_path = required(args, "state")?;
			let prior = read_state(state_path)?;

			match reconciler.apply(prior.as_ref(), &desired).await {
				Ok(state) => {
					write_state(state_path, &state)?;
					print(out, &state)
				}
				Err(err) => {
					if let Some(id) = err.created_id() {
						// enablement is unknown, the next apply sets it again
						let config = AlertRuleConfig { enabled: None, ..desired };
						write_state(state_path, &AlertRuleState { id: id.to_owned(), config })?;
					} else if let Some(id) = err.deleted_id() {
						tracing::warn!("rule {id} is gone, removing it from the state");
						remove_state(state_path)?;
					}
					Err(report(err))
				}
			}
		}
		Some(("refresh", args)) => {
			let state_path = required(args, "state")?;
			let prior = read_state(state_path)?
				.ok_or_else(|| anyhow!("no state file at {state_path}"))?;

			match reconciler.read(&prior.id, prior.config.space_id.clone()).await {
				Ok(state) => {
					write_state(state_path, &state)?;
					print(out, &state)
				}
				Err(err) if err.is_not_found() => {
					let diagnostic = Diagnostic::warning(format!(
						"rule {} is gone, removing it from the state",
						prior.id
					));
					tracing::warn!("{}", diagnostic.summary);
					emit(&diagnostic);
					remove_state(state_path)
				}
				Err(err) => Err(report(err)),
			}
		}
		Some(("import", args)) => {
			let state_path = required(args, "state")?;
			let id = required(args, "id")?;
			let space_id = args.value_of("space-id").map(str::to_owned);

			let state = reconciler.import(id, space_id).await.map_err(report)?;
			write_state(state_path, &state)?;
			print(out, &state)
		}
		Some(("destroy", args)) => {
			let state_path = required(args, "state")?;
			let prior = read_state(state_path)?
				.ok_or_else(|| anyhow!("no state file at {state_path}"))?;

			reconciler.delete(&prior.id).await.map_err(report)?;
			remove_state(state_path)
		}
		Some((other, _)) => Err(anyhow!("unknown subcommand {other}")),
		None => Err(anyhow!("no subcommand given")),
	}
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
	args.value_of(name).ok_or_else(|| anyhow!("--{name} is required"))
}

/// the format is guessed from the file extension
pub fn load_resource(path: &str) -> Result<AlertRuleConfig> {
	Config::builder()
		.add_source(config::File::with_name(path))
		.build()
		.and_then(Config::try_deserialize)
		.with_context(|| format!("can't load resource from {path}"))
}

/// a missing state file means the rule isn't managed yet
pub fn read_state(path: &str) -> Result<Option<AlertRuleState>> {
	if !Path::new(path).exists() {
		return Ok(None);
	}

	let content = fs::read(path).with_context(|| format!("can't read state file {path}"))?;
	let state = serde_json::from_slice(&content)
		.with_context(|| format!("state file {path} is corrupt"))?;

	Ok(Some(state))
}

pub fn write_state(path: &str, state: &AlertRuleState) -> Result<()> {
	let content = serde_json::to_vec_pretty(state).context("can't serialize state")?;
	fs::write(path, content).with_context(|| format!("can't write state file {path}"))?;
	tracing::debug!("wrote state of rule {} to {}", state.id, path);
	Ok(())
}

fn remove_state(path: &str) -> Result<()> {
	fs::remove_file(path).with_context(|| format!("can't remove state file {path}"))
}

fn print<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
	serde_json::to_writer_pretty(&mut *out, value).context("can't serialize output")?;
	writeln!(out).context("can't write output")
}

fn emit(diagnostic: &Diagnostic) {
	match serde_json::to_string(diagnostic) {
		Ok(json) => eprintln!("{json}"),
		Err(err) => tracing::error!("can't serialize diagnostic: {err}"),
	}
}

/// print the error as [Diagnostic] and hand it on
fn report(err: ResourceError) -> anyhow::Error {
	let diagnostic = Diagnostic::from(&err);
	tracing::error!("{}", diagnostic.summary);
	emit(&diagnostic);
	err.into()
}
