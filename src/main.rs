use anyhow::Context;
use slack_broadcaster::config::load_settings;
use slack_broadcaster::logging;
use slack_broadcaster::server::{self, AppState};
use slack_broadcaster::slack::{SlackApi, SlackClient};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize rustls crypto provider
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    logging::init_tracing();

    tracing::info!("🚀 Starting Slack broadcaster");

    let settings = load_settings().context("Failed to load configuration")?;
    tracing::info!("✅ Configuration loaded");
    tracing::debug!(
        bind = %settings.server.bind,
        static_dir = ?settings.server.static_dir,
        cache_ttl_secs = settings.directory.cache_ttl_secs,
        max_concurrency = settings.dispatch.max_concurrency,
        "Config"
    );

    let api: Arc<dyn SlackApi> =
        Arc::new(SlackClient::new(&settings.slack).context("Failed to create Slack client")?);
    tracing::info!("Slack client created");

    // A bad token should not keep the server from starting
    match api.auth_test().await {
        Ok(identity) => tracing::info!(
            user_id = %identity.user_id,
            team_id = %identity.team_id,
            user = ?identity.user,
            team = ?identity.team,
            "Slack token verified"
        ),
        Err(e) => tracing::warn!(error = %e, "Slack token check failed"),
    }

    let state = Arc::new(AppState::new(api, &settings));

    server::serve(&settings.server.bind, state, async {
        let signal_name = setup_shutdown_handler().await;
        tracing::info!(
            signal = %signal_name,
            "Received shutdown signal, initiating graceful shutdown"
        );
    })
    .await
    .context("HTTP server failed")?;

    tracing::info!("Application shutdown sequence complete");
    Ok(())
}

/// Resolves on SIGINT, SIGTERM or SIGQUIT on Unix, Ctrl+C elsewhere
async fn setup_shutdown_handler() -> String {
    #[cfg(unix)]
    {
        use signal::unix::{SignalKind, signal};

        let (Ok(mut sigint), Ok(mut sigterm), Ok(mut sigquit)) = (
            signal(SignalKind::interrupt()),
            signal(SignalKind::terminate()),
            signal(SignalKind::quit()),
        ) else {
            tracing::warn!("Failed to install Unix signal handlers, falling back to Ctrl+C");
            return wait_for_ctrl_c().await;
        };

        tokio::select! {
            _ = sigint.recv() => {
                tracing::debug!("Caught SIGINT signal");
                "SIGINT (Ctrl+C)".to_string()
            }
            _ = sigterm.recv() => {
                tracing::debug!("Caught SIGTERM signal");
                "SIGTERM".to_string()
            }
            _ = sigquit.recv() => {
                tracing::debug!("Caught SIGQUIT signal");
                "SIGQUIT".to_string()
            }
        }
    }

    #[cfg(not(unix))]
    {
        wait_for_ctrl_c().await
    }
}

async fn wait_for_ctrl_c() -> String {
    match signal::ctrl_c().await {
        Ok(()) => {
            tracing::debug!("Caught Ctrl+C signal");
            "Ctrl+C".to_string()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<String>().await
        }
    }
}
