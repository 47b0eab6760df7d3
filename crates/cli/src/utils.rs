//! Process setup helpers.

use std::future::Future;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Directives applied on top of `RUST_LOG` to silence chatty dependencies.
const DEFAULT_DIRECTIVES: &[&str] = &["hyper=off", "hyper_util=off", "reqwest=off", "h2=off"];

/// Common setup for all binaries: error handler, `.env` file and terminal colors.
pub fn common_setup() {
    crate::handler::install();
    load_dotenv();
    enable_paint();
}

/// Initializes a tracing subscriber writing to stderr, filtered by `RUST_LOG`.
pub fn subscriber() {
    let registry = tracing_subscriber::registry().with(env_filter());
    let fmt = tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(true);
    if let Err(err) = registry.with(fmt).try_init() {
        debug!("tracing subscriber already initialized: {err}");
    }
}

fn env_filter() -> EnvFilter {
    let mut filter = EnvFilter::from_default_env();
    for directive in DEFAULT_DIRECTIVES {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Loads a `.env` file from the current directory or its parents, if any.
///
/// Values already present in the environment take precedence.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => trace!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!("failed to load .env: {err}"),
    }
}

/// Disables terminal colors unless both stdout and stderr are terminals that support them.
pub fn enable_paint() {
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);
}

/// Builds the single threaded tokio runtime every command runs on.
pub fn tokio_runtime() -> eyre::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread().enable_all().build()?)
}

/// Runs the future to completion on a fresh runtime.
pub fn block_on<F: Future>(future: F) -> eyre::Result<F::Output> {
    Ok(tokio_runtime()?.block_on(future))
}
