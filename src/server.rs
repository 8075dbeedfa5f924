//! Parking service runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: connection pool, migrations,
//! repositories, availability reconciler, REST/websocket server, metrics,
//! and graceful shutdown.

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{error, info, warn};

use crate::application::AvailabilityReconciler;
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::{init_pool, run_migrations, SeaOrmRepositoryProvider, SharedPool};
use crate::interfaces::http::{create_api_router, ApiState};
use crate::notifications::{create_event_bus, SharedEventBus};
use crate::shared::errors::{AppError, InfraError};
use crate::shared::shutdown::{listen_for_shutdown_signals, ShutdownSignal};

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Handle to a running parking service.
///
/// ```rust,no_run
/// use parking_service::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub repos: Arc<dyn RepositoryProvider>,
    pub pool: SharedPool,
    pub reconciler: Arc<AvailabilityReconciler>,
    pub config: AppConfig,
    /// Address the HTTP listener is bound to
    pub local_addr: SocketAddr,

    shutdown: ShutdownSignal,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the service:
    /// 1. Install the Prometheus recorder
    /// 2. Initialize the connection pool and run migrations
    /// 3. Build repositories, event bus and reconciler
    /// 4. Serve the REST API, websocket stream and Swagger UI
    pub async fn start(opts: ServerOptions) -> Result<Self, AppError> {
        let config = opts.config;
        info!("Starting parking service...");

        let prometheus = prometheus_handle();

        info!("Database: {}", config.database.redacted_url());
        let pool = init_pool(config.database.pool_options()).await?;

        if opts.auto_migrate {
            if let Err(e) = run_migrations(&pool).await {
                pool.shutdown().await;
                return Err(e.into());
            }
        }

        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(
            pool.clone(),
            config.database.operation_timeout(),
        ));

        let event_bus = create_event_bus();
        let reconciler = Arc::new(
            AvailabilityReconciler::new(repos.clone(), event_bus.clone())
                .with_mapping(config.occupancy.mapping),
        );
        info!("Snapshot mapping: {:?}", config.occupancy.mapping);

        let router = create_api_router(ApiState {
            repos: repos.clone(),
            pool: pool.clone(),
            event_bus: event_bus.clone(),
            reconciler: reconciler.clone(),
            metrics: prometheus,
            started_at: Arc::new(Instant::now()),
        });

        let listener = match tokio::net::TcpListener::bind(config.server.address()).await {
            Ok(listener) => listener,
            Err(e) => {
                pool.shutdown().await;
                return Err(InfraError::Io(e).into());
            }
        };
        let local_addr = listener.local_addr().map_err(InfraError::Io)?;
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let shutdown = ShutdownSignal::new();
        let api_shutdown = shutdown.clone();
        let api_task = tokio::spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async move {
                api_shutdown.wait().await;
                info!("REST API server received shutdown signal");
            });
            if let Err(e) = server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            event_bus,
            repos,
            pool,
            reconciler,
            config,
            local_addr,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Trigger shutdown on SIGTERM / SIGINT.
    pub fn install_signal_handler(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.shutdown.clone()));
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for the HTTP server to stop, then drain the pool.
    ///
    /// In-flight requests get `server.shutdown_timeout` seconds once
    /// shutdown has been triggered.
    pub async fn wait(self) {
        let grace = Duration::from_secs(self.config.server.shutdown_timeout);
        let mut api_task = self.api_task;

        tokio::select! {
            result = &mut api_task => {
                if let Err(e) = result {
                    error!("REST API server task panicked: {}", e);
                }
            }
            _ = async {
                self.shutdown.wait().await;
                tokio::time::sleep(grace).await;
            } => {
                warn!("In-flight requests did not finish within {:?}, aborting", grace);
                api_task.abort();
            }
        }

        self.pool.shutdown().await;
        info!("Parking service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down parking service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// The global recorder can only be installed once per process.
fn prometheus_handle() -> PrometheusHandle {
    static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
    HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                handle
            }
            Err(e) => {
                warn!("Prometheus recorder unavailable ({}); /metrics will be empty", e);
                PrometheusBuilder::new().build_recorder().handle()
            }
        })
        .clone()
}

/// Initialize tracing from the logging config. `RUST_LOG` takes precedence.
///
/// `log` records from the repositories are bridged into the same subscriber.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };

    if let Err(e) = result {
        eprintln!("Tracing already initialized: {}", e);
    }
}
