#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::Value;

use ctf_admin_api::app::{router, AppState};
use ctf_admin_api::config::AppConfig;
use ctf_admin_api::database::MemoryStore;

/// A server over a fresh in-memory store, running on the test's runtime
pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;

        // Same startup as the binary: an empty store gets the default market
        let state = AppState::new(Arc::new(MemoryStore::new()));
        state.admin.seed_market().await?;
        let app = router(state, &AppConfig::development());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit a form; redirects are followed, so success yields the view JSON
    pub async fn post(&self, path: &str, fields: &[(&str, &str)]) -> Result<(StatusCode, Value)> {
        let resp = self.client.post(self.url(path)).form(fields).send().await?;
        let status = resp.status();
        let body = resp.json::<Value>().await?;
        Ok((status, body))
    }

    pub async fn view(&self, name: &str) -> Result<Value> {
        let resp = self
            .client
            .get(self.url(&format!("/admin/view/{}", name)))
            .send()
            .await?;
        anyhow::ensure!(resp.status() == StatusCode::OK, "view {} failed: {}", name, resp.status());
        let body = resp.json::<Value>().await?;
        Ok(body["data"].clone())
    }

    /// Levels as (number, buyout) pairs in sequence order
    pub async fn level_numbers(&self) -> Result<Vec<(i64, i64)>> {
        let levels = self.view("game_levels").await?;
        Ok(levels
            .as_array()
            .context("game_levels is not an array")?
            .iter()
            .map(|level| {
                (
                    level["number"].as_i64().unwrap_or(-1),
                    level["buyout"].as_i64().unwrap_or(-1),
                )
            })
            .collect())
    }
}
