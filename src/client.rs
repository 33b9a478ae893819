//! HTTP client for the medicine API.
//!
//! [`MedicineApi`] is the seam the sync controller talks to; [`HttpMedicineApi`]
//! implements it over reqwest.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};

use crate::config::ClientConfig;
use crate::error::{ErrorResponse, SyncError, SyncResult};
use crate::models::{Medicine, NewMedicine};

/// Remote operations the controller relies on.
#[async_trait]
pub trait MedicineApi: Send + Sync {
    /// List items, narrowed by `search` when it is non-empty.
    async fn list(&self, search: &str) -> SyncResult<Vec<Medicine>>;

    /// Create an item. A 400/409 refusal is a [`SyncError::Conflict`], any other
    /// non-2xx a [`SyncError::Server`].
    async fn create(&self, medicine: &NewMedicine) -> SyncResult<()>;

    async fn delete(&self, id: i64) -> SyncResult<()>;

    async fn update_quantity(&self, id: i64, quantity: i64) -> SyncResult<()>;
}

#[derive(Debug, Clone)]
pub struct HttpMedicineApi {
    client: Client,
    base_url: String,
}

impl HttpMedicineApi {
    pub fn new(config: &ClientConfig) -> SyncResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SyncError::Connectivity(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, &config.base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn medicines_url(&self) -> String {
        format!("{}/medicines", self.base_url)
    }

    fn medicine_url(&self, id: i64) -> String {
        format!("{}/medicines/{id}", self.base_url)
    }
}

/// Pulls `detail` out of an error body, falling back to the raw text.
async fn error_detail(response: Response) -> String {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorResponse>(&text) {
        Ok(body) => body.detail,
        Err(_) if text.trim().is_empty() => status.canonical_reason().unwrap_or("request failed").to_string(),
        Err(_) => text,
    }
}

/// Maps a non-2xx delete/update response.
async fn mutation_error(response: Response) -> SyncError {
    let status = response.status();
    let message = error_detail(response).await;
    if status == StatusCode::NOT_FOUND {
        SyncError::NotFound(message)
    } else {
        SyncError::Server {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl MedicineApi for HttpMedicineApi {
    async fn list(&self, search: &str) -> SyncResult<Vec<Medicine>> {
        let mut request = self.client.get(self.medicines_url());
        if !search.is_empty() {
            request = request.query(&[("search", search)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Server {
                status: status.as_u16(),
                message: error_detail(response).await,
            });
        }

        Ok(response.json::<Vec<Medicine>>().await?)
    }

    async fn create(&self, medicine: &NewMedicine) -> SyncResult<()> {
        let response = self.client.post(self.medicines_url()).json(medicine).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = error_detail(response).await;
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::CONFLICT => SyncError::Conflict(message),
                _ => SyncError::Server {
                    status: status.as_u16(),
                    message,
                },
            });
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> SyncResult<()> {
        let response = self.client.delete(self.medicine_url(id)).send().await?;

        if !response.status().is_success() {
            return Err(mutation_error(response).await);
        }
        Ok(())
    }

    async fn update_quantity(&self, id: i64, quantity: i64) -> SyncResult<()> {
        let response = self
            .client
            .put(self.medicine_url(id))
            .query(&[("quantity", quantity)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(mutation_error(response).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let api = HttpMedicineApi::with_client(Client::new(), "http://localhost:8000/");
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.medicines_url(), "http://localhost:8000/medicines");
        assert_eq!(api.medicine_url(7), "http://localhost:8000/medicines/7");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_connectivity_error() {
        // grab a free port, then release it so nothing is listening there
        let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let api = HttpMedicineApi::new(&ClientConfig {
            base_url: format!("http://127.0.0.1:{port}"),
            request_timeout_secs: 2,
            search_debounce_ms: 0,
        })
        .unwrap();

        let err = api.list("").await.unwrap_err();
        assert!(err.is_connectivity(), "got {err:?}");
    }
}
