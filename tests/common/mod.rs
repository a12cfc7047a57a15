//! Shared utilities for integration testing.

use std::net::SocketAddr;

use modkit::Application;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// A running application; shuts down when dropped.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Serve `app` on an ephemeral local port.
pub async fn spawn_app(app: Application) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let _ = app
            .run_until(listener, async {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        addr,
        shutdown: Some(tx),
    }
}

/// Client that never reuses connections between tests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
