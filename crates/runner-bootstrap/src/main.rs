// Entry point for `start-runner`, the container entrypoint that registers an
// ephemeral runner, runs it, and removes it on shutdown.

use runner_common::constants;
use runner_common::logging::{self, LogFormat};
use runner_common::HostContext;
use std::sync::Arc;

use runner_bootstrap::shutdown::install_signal_handlers;
use runner_bootstrap::{Bootstrap, GitHubClient, RunnerConfig, ScriptAgent};

fn main() {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Failed to build Tokio runtime: {e}");
            std::process::exit(constants::return_code::CONFIGURATION_ERROR);
        }
    };

    let exit_code = runtime.block_on(run());

    // Don't wait on the signal listener tasks.
    runtime.shutdown_background();
    std::process::exit(exit_code);
}

async fn run() -> i32 {
    logging::init(LogFormat::from_env());

    tracing::info!("Runner bootstrap starting.");
    tracing::info!(
        "  Version = {}",
        runner_sdk::build_constants::RunnerPackage::VERSION
    );
    tracing::info!(
        "  Commit  = {}",
        runner_sdk::build_constants::Source::COMMIT_HASH
    );
    tracing::info!("  Platform = {}", constants::CURRENT_PLATFORM);

    // Configuration errors are fatal before any network call is made.
    let config = match RunnerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return e.exit_code();
        }
    };

    let host_context = HostContext::new();
    install_signal_handlers(&host_context);

    let client = match GitHubClient::new() {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("{}", e);
            return e.exit_code();
        }
    };
    let agent = ScriptAgent::new(&host_context, config.agent_directory.clone());

    let bootstrap = Bootstrap::new(
        config,
        Arc::clone(&host_context),
        Arc::new(client),
        Arc::new(agent),
    );

    let exit_code = bootstrap.execute().await;
    tracing::info!("Runner bootstrap exiting with code {}", exit_code);
    exit_code
}
