//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own databases.

use super::constants::*;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tracklog_server::ledger::{ReactionService, SqliteLedgerStore, TargetKind};
use tracklog_server::provider::{
    BearerCredential, IdentityProvider, MetadataProvider, ProviderError, TargetMetadata,
    TrackMetadata,
};
use tracklog_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use tracklog_server::user::{SqliteUserStore, UserProfile};

/// Identity provider stub. Accepts tokens of the form `token-<user id>` and
/// resolves them to a user with that id.
struct StubIdentityProvider;

#[async_trait]
impl IdentityProvider for StubIdentityProvider {
    async fn current_user(
        &self,
        credential: &BearerCredential,
    ) -> Result<UserProfile, ProviderError> {
        match credential.access_token.strip_prefix("token-") {
            Some(user_id) if !user_id.is_empty() => Ok(UserProfile {
                id: user_id.to_string(),
                display_name: format!("Test {}", user_id),
                avatar_url: None,
                profile_url: None,
                country: Some("IT".to_string()),
            }),
            _ => Err(ProviderError::InvalidCredential),
        }
    }
}

/// Metadata provider stub. Knows TRACK_1_ID, everything else is unknown.
struct StubMetadataProvider;

#[async_trait]
impl MetadataProvider for StubMetadataProvider {
    async fn target_metadata(
        &self,
        kind: TargetKind,
        id: &str,
    ) -> Result<Option<TargetMetadata>, ProviderError> {
        if kind == TargetKind::Track && id == TRACK_1_ID {
            return Ok(Some(TargetMetadata::Track(TrackMetadata {
                id: id.to_string(),
                name: "Paranoid".to_string(),
                artists: vec!["Black Sabbath".to_string()],
                album: Some("Paranoid".to_string()),
                duration_secs: Some(172.0),
            })));
        }
        Ok(None)
    }
}

/// Test server instance with isolated databases
///
/// When dropped, the server gracefully shuts down and temp resources are
/// cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port
    pub async fn spawn() -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp db dir");

        let ledger_store = Arc::new(
            SqliteLedgerStore::new(temp_db_dir.path().join("ledger.db"))
                .expect("Failed to open ledger store"),
        );
        let reactions = Arc::new(ReactionService::new(ledger_store));

        let user_store = Arc::new(
            SqliteUserStore::new(temp_db_dir.path().join("users.db"))
                .expect("Failed to open user store"),
        );

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            default_page_size: 50,
        };

        let app = make_app(
            config,
            reactions,
            user_store,
            Arc::new(StubIdentityProvider),
            Arc::new(StubMetadataProvider),
        )
        .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
