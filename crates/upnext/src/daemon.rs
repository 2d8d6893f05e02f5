//! Daemon wiring: calendar poller, notification scheduler, shutdown.

use std::sync::Arc;

use miette::Result;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use upnext_notify::{NotificationTransport, TemplateRenderer, transport_for_url};
use upnext_scheduler::{NotificationHandler, ScheduledNotification, Scheduler};
use upnext_sonarr::SonarrClient;

use crate::config::Config;
use crate::dispatcher::{DispatchError, Dispatcher};
use crate::poller::Poller;

/// Run the daemon until a shutdown signal arrives.
pub async fn run(config: Config) -> Result<()> {
    info!(sonarr_url = %config.sonarr.url, "starting upnext daemon");

    // Services are constructed once here and injected everywhere; nothing
    // rebuilds a client or renderer mid-flight.
    let sonarr = Arc::new(SonarrClient::new(config.sonarr.clone()));

    let transport: Arc<dyn NotificationTransport> = Arc::from(
        transport_for_url(&config.notification_url).map_err(|e| miette::miette!("{}", e))?,
    );

    let renderer = Arc::new(match &config.templates_dir {
        Some(dir) => {
            TemplateRenderer::with_user_templates(dir).map_err(|e| miette::miette!("{}", e))?
        }
        None => TemplateRenderer::new(),
    });

    let scheduler =
        Arc::new(Scheduler::load(&config.state_file).map_err(|e| miette::miette!("{}", e))?);

    if config.test_notification {
        send_test_notification(transport.as_ref()).await;
    }

    let dispatcher = Arc::new(Dispatcher::new(
        Arc::clone(&sonarr),
        Arc::clone(&renderer),
        Arc::clone(&transport),
        config.clone(),
    ));

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Handle shutdown signals
    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal");
        let _ = shutdown_tx_clone.send(true);
    });

    // One top-level handler per fired entry: expected drops are outcomes the
    // dispatcher already logged; hard failures are classified here.
    let handler: NotificationHandler = {
        let dispatcher = Arc::clone(&dispatcher);
        Arc::new(move |entry: ScheduledNotification| {
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move {
                match dispatcher.dispatch(entry.episode_id, entry.fire_at).await {
                    Ok(outcome) => {
                        debug!(key = %entry.key, ?outcome, "dispatch finished");
                    }
                    Err(DispatchError::Source(e)) => {
                        error!(key = %entry.key, error = %e, "dispatch failed; {}", e.remediation());
                    }
                    Err(DispatchError::Render(e)) => {
                        error!(key = %entry.key, error = %e, "dispatch failed to render notification");
                    }
                }
            })
        })
    };

    // Spawn scheduler task
    let scheduler_handle = {
        let scheduler = Arc::clone(&scheduler);
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move { scheduler.run(shutdown_rx, handler).await })
    };

    // Spawn poller task
    let poller_handle = {
        let poller = Poller::new(Arc::clone(&sonarr), Arc::clone(&scheduler), config.clone());
        let shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move { poller.run(shutdown_rx).await })
    };

    // Wait for shutdown signal
    let mut main_shutdown_rx = shutdown_rx.clone();
    loop {
        if main_shutdown_rx.changed().await.is_err() || *main_shutdown_rx.borrow() {
            break;
        }
    }

    info!("shutting down daemon tasks");

    let _ = poller_handle.await;
    let _ = scheduler_handle.await;

    info!("daemon shut down gracefully");
    Ok(())
}

/// Send a startup test notification so operators can verify their URL.
async fn send_test_notification(transport: &dyn NotificationTransport) {
    info!("sending test notification");
    match transport
        .send(
            "Upnext test notification",
            "If you can read this, your notification URL works.",
            None,
        )
        .await
    {
        Ok(true) => info!("test notification delivered"),
        Ok(false) => warn!("test notification was not delivered"),
        Err(e) => warn!(error = %e, "test notification failed"),
    }
}
