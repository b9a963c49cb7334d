mod common;

use axum::{Router, extract::ConnectInfo, routing::get};
use common::spawn_app;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct RunningServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

async fn start(app: Router, idle_timeout: Duration) -> RunningServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(tender::server::serve(
        listener,
        app,
        idle_timeout,
        async move {
            let _ = stopped.await;
        },
    ));
    RunningServer { addr, stop, handle }
}

async fn read_until_closed(stream: &mut TcpStream) -> Vec<u8> {
    let mut buf = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut buf))
        .await
        .expect("server kept the connection open")
        .expect("read failed");
    buf
}

#[tokio::test]
async fn silent_connection_is_closed_after_idle_timeout() {
    let app = spawn_app().await;
    let server = start(app.router.clone(), Duration::from_millis(300)).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let started = Instant::now();
    let received = read_until_closed(&mut stream).await;

    assert!(received.is_empty());
    assert!(started.elapsed() >= Duration::from_millis(250));
}

#[tokio::test]
async fn keep_alive_connection_is_served_then_closed_when_idle() {
    let app = spawn_app().await;
    let server = start(app.router.clone(), Duration::from_millis(300)).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /users HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let received = String::from_utf8(read_until_closed(&mut stream).await).unwrap();

    assert!(received.starts_with("HTTP/1.1 200"), "{received}");
    assert!(
        received.to_ascii_lowercase().contains("cross-origin-opener-policy: same-origin"),
        "{received}"
    );
    assert!(received.ends_with("[]"), "{received}");
}

#[tokio::test]
async fn requests_see_the_peer_address() {
    let app = Router::new().route(
        "/peer",
        get(|ConnectInfo(peer): ConnectInfo<SocketAddr>| async move { peer.to_string() }),
    );
    let server = start(app, Duration::from_millis(300)).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let local = stream.local_addr().unwrap();
    stream
        .write_all(b"GET /peer HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let received = String::from_utf8(read_until_closed(&mut stream).await).unwrap();

    assert!(received.starts_with("HTTP/1.1 200"), "{received}");
    assert!(received.ends_with(&local.to_string()), "{received}");
}

#[tokio::test]
async fn shutdown_stops_accepting_and_returns() {
    let app = spawn_app().await;
    let server = start(app.router.clone(), Duration::from_secs(60)).await;

    server.stop.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server.handle)
        .await
        .expect("server did not stop")
        .expect("server task panicked");
    assert!(result.is_ok());

    assert!(TcpStream::connect(server.addr).await.is_err());
}
