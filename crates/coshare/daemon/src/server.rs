//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use coshare_service::{
    spawn_event_consumer, AnonymousReadLimiter, ChannelEventSink, CollectionService,
    EventConsumerHandle, TracingEventHandler,
};
use coshare_storage::{CoshareStorage, InMemoryCoshareStorage};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Coshare daemon server
pub struct Server {
    config: DaemonConfig,
    service: CollectionService,
    consumer: EventConsumerHandle,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        config.validate()?;

        let storage = build_storage(&config.storage).await?;
        let limiter = Arc::new(AnonymousReadLimiter::new(config.limiter.limiter_config()));

        let (sink, event_rx) = ChannelEventSink::channel(config.events.capacity);
        let consumer = spawn_event_consumer(event_rx, Arc::new(TracingEventHandler));

        let service = CollectionService::new(storage)
            .with_limiter(limiter)
            .with_event_sink(Arc::new(sink));

        Ok(Self {
            config,
            service,
            consumer,
        })
    }

    /// Run the server until a shutdown signal arrives
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let app = create_router(AppState::new(self.service.clone()));
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(%addr, "coshare daemon listening");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = spawn_limiter_sweeper(
            Arc::clone(self.service.limiter()),
            self.config.limiter.sweep_interval(),
            shutdown_rx,
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("coshare daemon shutting down");

        let _ = shutdown_tx.send(true);
        if let Err(e) = sweeper.await {
            tracing::warn!(error = %e, "limiter sweeper task failed");
        }

        drop(self.service);
        let handled = self.consumer.stop().await;
        tracing::info!(handled, "access event consumer drained");

        Ok(())
    }
}

async fn build_storage(config: &StorageConfig) -> DaemonResult<Arc<dyn CoshareStorage>> {
    match config {
        StorageConfig::Memory => {
            tracing::info!("using in-memory storage");
            Ok(Arc::new(InMemoryCoshareStorage::new()))
        }
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let storage = coshare_storage::PostgresCoshareStorage::connect_with_options(
                url,
                *max_connections,
                *connect_timeout_secs,
            )
            .await?;
            tracing::info!(max_connections, "using postgres storage");
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => Err(DaemonError::Config(
            "postgres storage requires the `postgres` feature".to_string(),
        )),
    }
}

/// Periodically evict expired rate-limit windows until `shutdown` flips.
pub fn spawn_limiter_sweeper(
    limiter: Arc<AnonymousReadLimiter>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = limiter.purge_expired();
                    if purged > 0 {
                        tracing::debug!(
                            purged,
                            tracked = limiter.tracked(),
                            "purged expired rate-limit windows"
                        );
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    })
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coshare_service::LimiterConfig;
    use coshare_types::ShareToken;

    #[tokio::test(start_paused = true)]
    async fn sweeper_evicts_expired_windows() {
        let limiter = Arc::new(AnonymousReadLimiter::new(LimiterConfig {
            ceiling: 5,
            window: Duration::from_secs(15),
        }));
        limiter.try_acquire(&ShareToken::generate());
        assert_eq!(limiter.tracked(), 1);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let period = Duration::from_secs(30);
        let sweeper = spawn_limiter_sweeper(Arc::clone(&limiter), period, shutdown_rx);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(limiter.tracked(), 0);

        shutdown_tx.send(true).unwrap();
        sweeper.await.unwrap();
    }

    #[tokio::test]
    async fn memory_storage_builds() {
        assert!(build_storage(&StorageConfig::Memory).await.is_ok());
    }

    #[cfg(not(feature = "postgres"))]
    #[tokio::test]
    async fn postgres_requires_feature() {
        let config = StorageConfig::Postgres {
            url: "postgres://localhost/coshare".to_string(),
            max_connections: 10,
            connect_timeout_secs: 5,
        };
        assert!(matches!(
            build_storage(&config).await,
            Err(DaemonError::Config(_))
        ));
    }

    #[tokio::test]
    async fn server_rejects_invalid_config() {
        let mut config = DaemonConfig::default();
        config.events.capacity = 0;
        assert!(Server::new(config).await.is_err());
    }
}
