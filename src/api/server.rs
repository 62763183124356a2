//! API server lifecycle: starts/stops the axum HTTP server.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::oneshot;

use crate::api::router::api_router;
use crate::core_state::CoreState;

// ═══════════════════════════════════════════════════════════
// Public types
// ═══════════════════════════════════════════════════════════

/// Metadata for a running API server.
#[derive(Debug, Clone, Serialize)]
pub struct ApiServerInfo {
    pub server_addr: String,
    pub port: u16,
    pub started_at: String,
}

/// Handle to a running API server.
pub struct ApiServer {
    pub info: ApiServerInfo,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ApiServer {
    /// Send the graceful shutdown signal. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Signal shutdown and wait for in-flight requests to finish.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("API server task failed: {e}");
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Server lifecycle
// ═══════════════════════════════════════════════════════════

/// Bind `addr`, build the router and serve it in a background task.
///
/// Port 0 picks an ephemeral port; the bound address is in `info`.
pub async fn start_api_server(
    core: Arc<CoreState>,
    addr: SocketAddr,
) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = api_router(core);

    let info = ApiServerInfo {
        server_addr: addr.to_string(),
        port: addr.port(),
        started_at: chrono::Utc::now().to_rfc3339(),
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        info,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;
    use crate::crypto::PasswordHasher;
    use crate::models::{NewUser, Role};

    fn test_core() -> Arc<CoreState> {
        Arc::new(CoreState::in_memory(PasswordHasher::new(1_000)).unwrap())
    }

    fn localhost() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let server = start_api_server(test_core(), localhost())
            .await
            .expect("server should start");

        assert!(server.info.port > 0);
        assert!(!server.info.started_at.is_empty());

        let url = format!("http://127.0.0.1:{}/api/health", server.info.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        server.stop().await;
    }

    #[tokio::test]
    async fn protected_routes_reject_anonymous_requests() {
        let mut server = start_api_server(test_core(), localhost())
            .await
            .expect("server should start");

        let url = format!("http://127.0.0.1:{}/api/patients", server.info.port);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        server.shutdown();
    }

    #[tokio::test]
    async fn login_then_list_over_http() {
        let core = test_core();
        auth::create_user(
            &core,
            &NewUser {
                username: "reception".into(),
                password: "front-desk-1".into(),
                role: Role::Staff,
            },
        )
        .unwrap();

        let server = start_api_server(core, localhost())
            .await
            .expect("server should start");
        let base = format!("http://127.0.0.1:{}", server.info.port);
        let client = reqwest::Client::new();

        let login: serde_json::Value = client
            .post(format!("{base}/api/auth/login"))
            .json(&serde_json::json!({"username": "reception", "password": "front-desk-1"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let token = login["token"].as_str().unwrap();

        let resp = client
            .get(format!("{base}/api/patients"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let patients: Vec<serde_json::Value> = resp.json().await.unwrap();
        assert!(patients.is_empty());

        server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn health_answers_while_a_login_is_hashing() {
        let core = Arc::new(CoreState::in_memory(PasswordHasher::new(300_000)).unwrap());
        auth::create_user(
            &core,
            &NewUser {
                username: "reception".into(),
                password: "front-desk-1".into(),
                role: Role::Staff,
            },
        )
        .unwrap();

        let started = std::time::Instant::now();
        assert!(auth::login(&core, "reception", "wrong-pass").is_err());
        let hash_cost = started.elapsed();

        let server = start_api_server(core, localhost())
            .await
            .expect("server should start");
        let base = format!("http://127.0.0.1:{}", server.info.port);
        let client = reqwest::Client::new();

        let login = {
            let client = client.clone();
            let url = format!("{base}/api/auth/login");
            tokio::spawn(async move {
                client
                    .post(url)
                    .json(&serde_json::json!({"username": "reception", "password": "wrong-pass"}))
                    .send()
                    .await
                    .unwrap()
                    .status()
            })
        };

        tokio::time::sleep(hash_cost / 4).await;
        let started = std::time::Instant::now();
        let health = client.get(format!("{base}/api/health")).send().await.unwrap();
        let health_took = started.elapsed();

        assert_eq!(health.status(), reqwest::StatusCode::OK);
        assert_eq!(login.await.unwrap(), reqwest::StatusCode::UNAUTHORIZED);
        assert!(
            health_took < hash_cost / 2,
            "health took {health_took:?} during a {hash_cost:?} login"
        );

        server.stop().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let first = start_api_server(test_core(), localhost()).await.unwrap();
        let taken: SocketAddr = first.info.server_addr.parse().unwrap();

        let err = start_api_server(test_core(), taken).await.err().unwrap();
        assert!(err.contains("Failed to bind"));

        first.stop().await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start_api_server(test_core(), localhost())
            .await
            .expect("server should start");

        server.shutdown();
        server.shutdown();
    }
}
