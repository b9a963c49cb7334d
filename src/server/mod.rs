//! HTTP connection loop: accept, enforce the idle policy, hand each socket to
//! hyper, drain on shutdown.

mod idle;

pub use idle::IdleTimeout;

use axum::{Router, extract::ConnectInfo, http::Request};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
    service::TowerToHyperService,
};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tower::util::MapRequest;
use tracing::{debug, error, info, warn};

/// Serve `app` on `listener` until `shutdown` resolves, then wait for open
/// connections to finish their in-flight requests.
///
/// Each request carries `ConnectInfo<SocketAddr>` for the access log. A
/// connection with no traffic for `idle_timeout` is closed. An accept error
/// other than a peer aborting its handshake ends the loop with that error.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    idle_timeout: Duration,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send,
{
    let (signal_tx, signal_rx) = watch::channel(());
    let (close_tx, close_rx) = watch::channel(());
    tokio::pin!(shutdown);

    loop {
        let (stream, remote) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(conn) => conn,
                Err(e) if is_connection_error(&e) => {
                    debug!(error = %e, "dropped connection during accept");
                    continue;
                }
                Err(e) => return Err(e),
            },
            _ = &mut shutdown => break,
        };

        tokio::spawn(serve_connection(
            stream,
            remote,
            app.clone(),
            idle_timeout,
            signal_rx.clone(),
            close_rx.clone(),
        ));
    }

    drop(listener);
    drop(close_rx);
    // receivers may already be gone if no connection is open
    let _ = signal_tx.send(());

    let open = close_tx.receiver_count();
    if open > 0 {
        info!(open, "waiting for open connections to drain");
    }
    close_tx.closed().await;
    Ok(())
}

async fn serve_connection(
    stream: TcpStream,
    remote: SocketAddr,
    app: Router,
    idle_timeout: Duration,
    mut signal_rx: watch::Receiver<()>,
    close_rx: watch::Receiver<()>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!(%remote, error = %e, "failed to set TCP_NODELAY");
    }

    let svc = MapRequest::new(app, move |mut req: Request<Incoming>| {
        req.extensions_mut().insert(ConnectInfo(remote));
        req
    });
    let io = TokioIo::new(IdleTimeout::new(stream, idle_timeout));

    let builder = Builder::new(TokioExecutor::new());
    let conn = builder.serve_connection_with_upgrades(io, TowerToHyperService::new(svc));
    tokio::pin!(conn);

    let result = tokio::select! {
        result = conn.as_mut() => result,
        _ = signal_rx.changed() => {
            conn.as_mut().graceful_shutdown();
            conn.as_mut().await
        }
    };
    if let Err(e) = result {
        debug!(%remote, error = %e, "connection closed with error");
    }

    drop(close_rx);
}

fn is_connection_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}

/// Resolves on ctrl-c, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
