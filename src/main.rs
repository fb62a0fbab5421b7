// src/main.rs

use netdiag::logging::{self, LOG_ENV};
use netdiag::{cli, resolve_config, run_with_config};

#[tokio::main]
async fn main() {
    if let Err(err) = run_main().await {
        eprintln!("netdiag error: {err:?}");
        std::process::exit(1);
    }
}

async fn run_main() -> anyhow::Result<()> {
    let args = cli::parse();
    // The config decides whether dispatcher debug lines are wanted, so it is
    // resolved before the subscriber is installed.
    let cfg = resolve_config(&args)?;
    let env_level = std::env::var(LOG_ENV).ok();
    logging::init_logging(logging::resolve_level(
        args.log_level,
        env_level.as_deref(),
        cfg.config.debug,
    ))?;
    run_with_config(&args, cfg).await
}
