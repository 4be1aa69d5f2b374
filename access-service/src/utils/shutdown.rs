//! Process shutdown: OS signal handling and a bounded connection drain.

use axum::Router;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::task::JoinError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every open connection finished before the deadline.
    Completed,
    /// Connections were still open when the grace period ran out and the
    /// server task was aborted.
    DeadlineExceeded,
}

/// Serve `app` until `shutdown` resolves, then give in-flight requests at
/// most `grace` to finish. New connections stop being accepted as soon as
/// the signal arrives.
pub async fn serve_with_drain_deadline<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> io::Result<DrainOutcome>
where
    F: Future<Output = ()>,
{
    let (drain_tx, drain_rx) = oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = drain_rx.await;
        })
        .await
    });

    tokio::select! {
        joined = &mut server => return flatten(joined).map(|_| DrainOutcome::Completed),
        _ = shutdown => {}
    }

    let _ = drain_tx.send(());
    match tokio::time::timeout(grace, &mut server).await {
        Ok(joined) => flatten(joined).map(|_| DrainOutcome::Completed),
        Err(_) => {
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "Connections still open after grace period, aborting"
            );
            server.abort();
            Ok(DrainOutcome::DeadlineExceeded)
        }
    }
}

fn flatten(joined: Result<io::Result<()>, JoinError>) -> io::Result<()> {
    joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::sync::Arc;
    use std::time::Instant;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;
    use tokio::sync::Notify;

    async fn local_listener() -> TcpListener {
        TcpListener::bind("127.0.0.1:0").await.unwrap()
    }

    #[tokio::test]
    async fn test_idle_server_stops_without_waiting_for_grace() {
        let listener = local_listener().await;
        let app = Router::new().route("/", get(|| async { "ok" }));
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let started = Instant::now();
        let server = tokio::spawn(serve_with_drain_deadline(
            listener,
            app,
            async move {
                let _ = stop_rx.await;
            },
            Duration::from_secs(30),
        ));
        stop_tx.send(()).unwrap();

        let outcome = server.await.unwrap().unwrap();
        assert_eq!(outcome, DrainOutcome::Completed);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_stuck_request_is_cut_off_at_deadline() {
        let listener = local_listener().await;
        let addr = listener.local_addr().unwrap();
        let entered = Arc::new(Notify::new());
        let app = Router::new().route(
            "/stuck",
            get({
                let entered = entered.clone();
                move || {
                    let entered = entered.clone();
                    async move {
                        entered.notify_one();
                        std::future::pending::<&'static str>().await
                    }
                }
            }),
        );
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = tokio::spawn(serve_with_drain_deadline(
            listener,
            app,
            async move {
                let _ = stop_rx.await;
            },
            Duration::from_millis(200),
        ));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /stuck HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        entered.notified().await;
        stop_tx.send(()).unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), server)
            .await
            .expect("drain deadline not enforced")
            .unwrap()
            .unwrap();
        assert_eq!(outcome, DrainOutcome::DeadlineExceeded);
    }
}
