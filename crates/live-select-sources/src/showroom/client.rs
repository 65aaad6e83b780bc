use crate::error::SourceError;
use crate::traits::SnapshotSupplier;
use async_trait::async_trait;
use live_select_config::ApiConfig;
use live_select_models::Snapshot;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Public endpoint listing every room on air, grouped by genre.
pub const ONLIVES_PATH: &str = "/api/live/onlives";

#[derive(Clone)]
pub struct ShowroomClient {
    client: Arc<Client>,
    base_url: String,
}

impl ShowroomClient {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(api: &ApiConfig) -> Result<Self, SourceError> {
        Self::new(&api.base_url, Duration::from_secs(api.timeout_seconds), &api.user_agent)
    }

    fn onlives_url(&self) -> String {
        format!("{}{}", self.base_url, ONLIVES_PATH)
    }
}

#[async_trait]
impl SnapshotSupplier for ShowroomClient {
    fn supplier_name(&self) -> &str {
        "showroom"
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, SourceError> {
        let url = self.onlives_url();
        debug!(url = %url, "Fetching live listing");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::new(format!(
                "Failed to fetch live listing: {} - {}",
                status, body
            )));
        }

        let body = response.text().await?;
        let snapshot: Snapshot = serde_json::from_str(&body)?;
        info!(
            genres = snapshot.genre_count(),
            rooms = snapshot.room_count(),
            "Fetched live listing"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response on a loopback port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_snapshot_decodes_onlives() {
        let body = r#"{"onlives":[
            {"genre_id":0,"genre_name":"Popular","lives":[{"room_id":11,"started_at":100,"main_name":"a","view_num":3}]},
            {"genre_id":102,"genre_name":"Idol","lives":[{"room_id":12,"started_at":200,"main_name":"b","genre_id":102}]}
        ]}"#;
        let base_url = serve_once("HTTP/1.1 200 OK", body).await;

        let client = ShowroomClient::new(&base_url, Duration::from_secs(5), "seedpick-test").unwrap();
        let snapshot = client.fetch_snapshot().await.unwrap();

        assert_eq!(snapshot.genre_count(), 2);
        assert_eq!(snapshot.room_count(), 2);
        assert_eq!(snapshot.onlives[1].genre_name, "Idol");
        assert_eq!(snapshot.onlives[1].lives[0].room_id, Some(12));
    }

    #[tokio::test]
    async fn test_fetch_snapshot_reports_http_status() {
        let base_url = serve_once("HTTP/1.1 503 Service Unavailable", "down").await;

        let client = ShowroomClient::new(&base_url, Duration::from_secs(5), "seedpick-test").unwrap();
        let err = client.fetch_snapshot().await.unwrap_err();
        assert!(err.message().contains("503"));
    }

    #[test]
    fn test_onlives_url_trims_trailing_slash() {
        let client = ShowroomClient::new("https://example.test/", Duration::from_secs(1), "ua").unwrap();
        assert_eq!(client.onlives_url(), "https://example.test/api/live/onlives");
    }
}
