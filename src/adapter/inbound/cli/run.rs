//! Handler for a `ledgersim` invocation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info};

use super::command::Cli;
use super::diagnostic::{self, SettingsError};
use super::observer::ConsoleObserver;
use super::{banner, output};
use crate::adapter::inbound::signal::OsSignals;
use crate::adapter::outbound::node::{stage_plugin, LocalNetwork};
use crate::adapter::outbound::subnet::RpcSubnetProvisioner;
use crate::application::orchestrator::Orchestrator;
use crate::domain::cluster::ClusterConfig;
use crate::error::{ConfigError, Error};
use crate::infrastructure::config::settings::{Settings, DEFAULT_SETTINGS_FILE};
use crate::infrastructure::config::LogFormat;
use crate::runtime::cancel::CancelReason;

/// Exit status for a run that failed.
pub const EXIT_FAILURE: i32 = 1;
/// Exit status for a bad invocation or settings file.
pub const EXIT_USAGE: i32 = 2;

/// Execute one invocation and return the process exit status.
pub async fn execute(cli: Cli) -> i32 {
    output::configure(output::OutputConfig::new(cli.json, cli.quiet, cli.verbose));
    output::set_color(cli.color.forced());

    let (settings_path, required) = match &cli.config {
        Some(path) => (path.clone(), true),
        None => (PathBuf::from(DEFAULT_SETTINGS_FILE), false),
    };
    let settings = match Settings::load(&settings_path, required) {
        Ok(settings) => settings,
        Err(err) => {
            report_settings_error(&settings_path, &err);
            return EXIT_USAGE;
        }
    };

    let mut logging = settings.logging.clone().with_verbosity(cli.verbose);
    if let Some(format) = cli.log_format {
        logging.format = format;
    }
    if output::is_json() {
        logging.format = LogFormat::Json;
    }
    logging.init();

    if !cli.no_banner && !output::is_json() && !output::is_quiet() {
        banner::print_banner(cli.color.forced());
    }
    output::header(env!("CARGO_PKG_VERSION"));

    let cluster = ClusterConfig::local();
    let observer = Arc::new(ConsoleObserver::new(cluster.clone()));
    let provisioner = match RpcSubnetProvisioner::new(cluster.clone()) {
        Ok(provisioner) => Arc::new(provisioner),
        Err(err) => {
            report_failure(&err);
            return EXIT_FAILURE;
        }
    };
    let launcher = Arc::new(LocalNetwork::new(cluster.clone(), settings.node.clone()));
    let orchestrator = Orchestrator::new(launcher, provisioner, observer);

    let vm = match orchestrator.init(&cli.args) {
        Ok(vm) => vm,
        Err(err) => {
            report_usage_error(&err);
            return EXIT_USAGE;
        }
    };
    if let Some(vm) = &vm {
        if let Err(err) = stage_plugin(vm, &settings.node.plugin_dir(), cluster.file_mode).await {
            report_usage_error(&err);
            return EXIT_USAGE;
        }
    }

    output::section("Network");
    output::field("Nodes", cluster.node_count);
    output::field("Network", &cluster.network_name);
    output::field("Binary", settings.node.binary.display());
    output::field("Work dir", settings.node.work_dir.display());

    let signals = match OsSignals::register() {
        Ok(signals) => signals,
        Err(err) => {
            report_failure(&Error::Io(err));
            return EXIT_FAILURE;
        }
    };

    let outcome = orchestrator.run(&cluster, vm, signals).await;
    match &outcome.result {
        Ok(()) => match outcome.interrupted_by() {
            Some(signal) => {
                info!(%signal, "ledgersim stopped");
                output::success(&format!("Network stopped by {signal}"));
            }
            None => {
                info!("ledgersim stopped");
                output::success("Network stopped");
            }
        },
        Err(Error::Cancelled(CancelReason::Signal(signal))) => {
            info!(%signal, "ledgersim interrupted");
            output::warning("Interrupted before the run completed");
        }
        Err(err) => report_failure(err),
    }

    outcome.exit_code()
}

fn report_failure(err: &Error) {
    error!(error = %err, "ledgersim exited with error");
    output::error(&format!("ledgersim exited with error: {err}"));
}

fn report_usage_error(err: &ConfigError) {
    let diagnostic = diagnostic::usage(err);
    if output::is_json() {
        output::error(&diagnostic.message);
        return;
    }
    eprintln!("{:?}", miette::Report::new(diagnostic));
}

fn report_settings_error(path: &Path, err: &ConfigError) {
    if output::is_json() {
        output::error(&err.to_string());
        return;
    }

    match err {
        ConfigError::Parse(parse) => {
            let content = std::fs::read_to_string(path).unwrap_or_default();
            let span = parse
                .span()
                .map(|range| (range.start, range.end.saturating_sub(range.start)));
            let diagnostic = SettingsError::new(
                parse.message(),
                path.display().to_string(),
                content,
                span,
            );
            eprintln!("{:?}", miette::Report::new(diagnostic));
        }
        _ => {
            output::error(&err.to_string());
            output::hint(&format!(
                "settings are read from {} or the file given with --config",
                DEFAULT_SETTINGS_FILE
            ));
        }
    }
}
