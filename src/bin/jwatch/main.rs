mod cli;
mod sink;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use jwatch::{config::load_config, Credentials, LogSession, SessionOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::from(1)
        }
    }
}

fn real_main() -> Result<()> {
    let args = cli::JWatch::parse();

    if let Some(shell) = args.completions {
        let mut cmd = cli::JWatch::command();
        clap_complete::generate(shell, &mut cmd, "jwatch", &mut std::io::stdout());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(
            std::env::var("RUST_LOG").ok().as_deref(),
            args.verbose.tracing_level_filter(),
        ))
        .init();

    let config = load_config(args.config.as_ref())?;
    let mut options = SessionOptions::from(&config);
    options.insecure |= args.insecure;
    let viewer = args.viewer.as_deref().or(config.stream.viewer.as_deref());

    let Inputs {
        credentials,
        url,
        viewer,
    } = required_inputs(&args, viewer)?;

    let mut session = LogSession::new(credentials, &url, &options)?;
    tracing::info!(url = %session.base_url(), "watching job log");

    if !args.no_check {
        session
            .check()
            .with_context(|| format!("Failed to reach {url}"))?;
    }

    match viewer {
        Some(program) => sink::pipe_to_viewer(&mut session, &program),
        None => sink::copy_to_stdout(&mut session),
    }
}

/// `RUST_LOG` wins when it parses; otherwise the `-v`/`-q` level applies.
fn log_filter(rust_log: Option<&str>, verbosity: LevelFilter) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(verbosity.into()))
}

struct Inputs {
    credentials: Credentials,
    url: String,
    viewer: Option<PathBuf>,
}

/// Collects every missing input so the user sees all of them at once.
fn required_inputs(args: &cli::JWatch, viewer: Option<&str>) -> Result<Inputs> {
    let mut problems = vec![];
    let viewer = match viewer {
        Some(program) => {
            let found = sink::find_program(program);
            if found.is_none() {
                problems.push(format!("{program} is not installed"));
            }
            found
        }
        None => None,
    };
    if args.user.as_deref().is_none_or(str::is_empty) {
        problems.push("JENKINS_USER must be set".to_string());
    }
    if args.key.as_deref().is_none_or(str::is_empty) {
        problems.push("JENKINS_KEY must be set".to_string());
    }
    if args.url.as_deref().is_none_or(str::is_empty) {
        problems.push("url for jenkins job must be given".to_string());
    }

    match (&args.user, &args.key, &args.url) {
        (Some(user), Some(key), Some(url)) if problems.is_empty() => Ok(Inputs {
            credentials: Credentials::new(user, key),
            url: url.clone(),
            viewer,
        }),
        _ => anyhow::bail!(problems.join("\n")),
    }
}
