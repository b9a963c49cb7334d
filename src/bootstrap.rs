//! Startup sequencing: connect with bounded retry, wire the layers, serve.
//!
//! The retry loop is a small state machine ([`ConnectMachine`]) driven by
//! [`connect_with_retry`], so attempt counting and backoff can be exercised
//! without a database or a real clock.

use crate::config::Config;
use crate::db::{self, SqlitePool, UserStorage};
use crate::error::{BootstrapError, StoreError};
use crate::router::{HttpSettings, tender_router};
use crate::server::{self, shutdown_signal};
use crate::service::UserService;
use backon::{BackoffBuilder, ConstantBackoff, ConstantBuilder};
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Fixed-interval retry policy for the boot-time connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Zero behaves as one.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// One delay per retry, so `max_attempts - 1` delays in total.
    fn schedule(&self) -> ConstantBackoff {
        ConstantBuilder::default()
            .with_delay(self.backoff)
            .with_max_times(self.max_attempts.saturating_sub(1) as usize)
            .build()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootState {
    Connecting { attempt: u32 },
    Connected,
    Serving,
    Failed,
}

pub struct ConnectMachine {
    state: BootState,
    schedule: ConstantBackoff,
}

impl ConnectMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            state: BootState::Connecting { attempt: 1 },
            schedule: policy.schedule(),
        }
    }

    pub fn state(&self) -> BootState {
        self.state
    }

    /// Number of the attempt in progress; 0 outside `Connecting`.
    pub fn attempt(&self) -> u32 {
        match self.state {
            BootState::Connecting { attempt } => attempt,
            _ => 0,
        }
    }

    /// `Connecting → Connected`.
    pub fn on_success(&mut self) {
        if let BootState::Connecting { .. } = self.state {
            self.state = BootState::Connected;
        }
    }

    /// Returns the delay before the next attempt, or `None` once the budget
    /// is spent and the machine has moved to `Failed`.
    pub fn on_failure(&mut self) -> Option<Duration> {
        let BootState::Connecting { attempt } = self.state else {
            return None;
        };
        match self.schedule.next() {
            Some(delay) => {
                self.state = BootState::Connecting {
                    attempt: attempt + 1,
                };
                Some(delay)
            }
            None => {
                self.state = BootState::Failed;
                None
            }
        }
    }

    /// `Connecting → Failed` without spending the remaining budget.
    pub fn abort(&mut self) {
        if let BootState::Connecting { .. } = self.state {
            self.state = BootState::Failed;
        }
    }

    /// `Connected → Serving`.
    pub fn on_listening(&mut self) {
        if self.state == BootState::Connected {
            self.state = BootState::Serving;
        }
    }
}

/// Drive `connect` through `machine` until it succeeds or the retry budget is
/// spent. The returned error carries the last attempt's failure. A malformed
/// connection string fails on the spot.
pub async fn connect_with_retry<T, F, Fut>(
    machine: &mut ConnectMachine,
    mut connect: F,
) -> Result<T, BootstrapError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    loop {
        let attempt = machine.attempt();
        match connect().await {
            Ok(conn) => {
                machine.on_success();
                info!(attempt, "connected to the database");
                return Ok(conn);
            }
            Err(e) if e.is_misconfiguration() => {
                machine.abort();
                return Err(BootstrapError::Database(e));
            }
            Err(e) => match machine.on_failure() {
                Some(delay) => {
                    warn!(
                        attempt,
                        error = %e,
                        retry_in_secs = delay.as_secs_f64(),
                        "database connection attempt failed"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(BootstrapError::Failed {
                        attempts: attempt,
                        source: e,
                    });
                }
            },
        }
    }
}

/// Full process lifecycle: connect, serve, and close the pool on the way out.
pub async fn run(cfg: &Config) -> Result<(), BootstrapError> {
    let settings = HttpSettings::from_config(cfg)?;

    let mut machine = ConnectMachine::new(cfg.retry_policy());
    let pool = connect_with_retry(&mut machine, || db::connect(&cfg.database_url)).await?;

    let result = serve(&mut machine, pool.clone(), cfg, &settings).await;

    pool.close().await;
    info!("database pool closed");
    result
}

async fn serve(
    machine: &mut ConnectMachine,
    pool: SqlitePool,
    cfg: &Config,
    settings: &HttpSettings,
) -> Result<(), BootstrapError> {
    let storage = UserStorage::new(pool);
    storage.init_schema().await.map_err(BootstrapError::Schema)?;

    let service = UserService::new(storage);
    let app = tender_router(service, settings);

    let addr = cfg.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| BootstrapError::Bind {
            addr: addr.clone(),
            source,
        })?;
    machine.on_listening();
    info!(%addr, "HTTP server listening");

    server::serve(listener, app, settings.idle_timeout, shutdown_signal())
        .await
        .map_err(BootstrapError::Serve)?;

    info!("HTTP server stopped");
    Ok(())
}
