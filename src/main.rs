//! karaoke-queue admin listener entry point.
//!
//! Connects to the server as an admin, mounts the live queue, and logs the
//! projected buckets and operator notices until interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use karaoke_queue::api::HttpBackend;
use karaoke_queue::config::ClientConfig;
use karaoke_queue::domain::{EventBus, QueueView, Severity};
use karaoke_queue::service::{AdminQueue, QueueOptions};
use karaoke_queue::ws::PushClient;

const PING_INTERVAL: Duration = Duration::from_secs(25);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = ClientConfig::from_env().context("invalid configuration")?;
    tracing::info!(origin = %config.api_origin, ws = %config.ws_url, "starting karaoke-queue");

    // Check the credential before going live
    let backend = Arc::new(HttpBackend::new(&config)?);
    backend
        .verify_credentials()
        .await
        .context("admin credential rejected")?;

    // Push channel
    let bus = EventBus::new(config.event_bus_capacity);
    let mut push = PushClient::connect(&config.ws_url, bus.clone())
        .await
        .with_context(|| format!("failed to connect to {}", config.ws_url))?;

    // Admin queue
    let (queue, mut notices) = AdminQueue::mount(backend, &bus, QueueOptions::from(&config));
    let mut views = queue.watch();
    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.tick().await;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown requested");
                break;
            }
            changed = views.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = views.borrow_and_update().clone();
                log_view(&view);
            }
            Some(notice) = notices.recv() => match notice.severity {
                Severity::Error => tracing::error!(message = %notice.message, "notice"),
                Severity::Warning => tracing::warn!(message = %notice.message, "notice"),
                Severity::Info | Severity::Success => {
                    tracing::info!(message = %notice.message, "notice");
                }
            },
            ended = push.disconnected() => {
                match ended {
                    Ok(()) => tracing::error!("push channel ended, live updates stopped"),
                    Err(error) => tracing::error!(%error, "push channel lost, live updates stopped"),
                }
                break;
            }
            _ = ping.tick() => {
                if let Err(error) = push.ping() {
                    tracing::warn!(%error, "push channel is down");
                    break;
                }
            }
        }
    }

    queue.unmount().await;
    if let Err(error) = push.close().await {
        tracing::debug!(%error, "push channel already closed");
    }
    Ok(())
}

fn log_view(view: &QueueView) {
    tracing::info!(
        pending = view.counts.pending,
        on_stage = view.counts.on_stage,
        done = view.counts.done,
        no_show = view.counts.no_show,
        "queue updated"
    );
    for (bucket, requests) in [
        ("on_stage", &view.on_stage),
        ("pending", &view.pending),
        ("finished", &view.finished),
    ] {
        for request in requests {
            tracing::debug!(
                bucket,
                id = %request.id,
                name = %request.full_name,
                song = %format!("{} / {}", request.artist, request.title),
                status = %request.status,
                "entry"
            );
        }
    }
}
