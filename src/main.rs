//! Command line entry point of `geode-publish`.

use std::process::ExitCode;

use clap::Parser as _;
use log::LevelFilter;

use geode_publish::{
    ReleaseError,
    config::{Args, Config},
    env,
    github::GitHubClient,
    pipeline::{self, ReleaseOutcome},
};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);

    // Single thread: every remote call waits for the previous one.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to create the async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(real_main(args)) {
        Ok(outcome) => {
            println!("Found module file: {}", outcome.module_filename);
            println!("Parsed version: {}", outcome.version);
            println!("Created tag {}", outcome.tag_name);
            println!("Release created and asset uploaded successfully");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn real_main(args: Args) -> Result<ReleaseOutcome, ReleaseError> {
    let config = Config::from_args(args)?;
    let token = env::github_token()?;
    let client = GitHubClient::new(&config.owner, &config.repo, token).map_err(|source| {
        ReleaseError::RemoteCallFailed {
            step: "create the GitHub client",
            source,
        }
    })?;

    pipeline::run(&client, &config).await
}

/// Configures the process-wide logger once, before anything logs.
fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("geode_publish", level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}
