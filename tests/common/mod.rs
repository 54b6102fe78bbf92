//! Shared helpers for integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use capture_relay::{ServerConfig, routes, state::AppState};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// A running relay bound to an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    pub recordings: TempDir,
    pub public: TempDir,
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Wait until every session has left the hub
    pub async fn wait_for_idle(&self) {
        for _ in 0..200 {
            if self.state.hub.session_count() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "sessions still connected: {}",
            self.state.hub.session_count()
        );
    }

    /// All files in the recordings directory starting with `prefix`
    pub fn recordings_with_prefix(&self, prefix: &str) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.recordings.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(prefix))
            })
            .collect();
        files.sort();
        files
    }
}

pub fn test_config(recordings: &TempDir, public: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        recordings_dir: recordings.path().to_path_buf(),
        public_dir: public.path().to_path_buf(),
        ..Default::default()
    }
}

pub async fn start_test_server() -> TestServer {
    start_test_server_with(|_| {}).await
}

pub async fn start_test_server_with(customize: impl FnOnce(&mut ServerConfig)) -> TestServer {
    let recordings = TempDir::new().unwrap();
    let public = TempDir::new().unwrap();
    let mut config = test_config(&recordings, &public);
    customize(&mut config);

    let state = AppState::new(config).await;
    state.recordings.prepare().await.unwrap();

    let app = routes::create_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestServer {
        addr,
        state,
        recordings,
        public,
    }
}
