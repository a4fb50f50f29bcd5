use crate::config::ApiConfig;
use crate::domain::ports::AttemptSource;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Downloads attempt records with a single GET. No retries.
pub struct HttpFetcher {
    client: Client,
    api: ApiConfig,
}

impl HttpFetcher {
    pub fn new(api: ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = api.timeout() {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| EtlError::ConfigError {
            message: format!("cannot build HTTP client: {}", e),
        })?;

        Ok(Self { client, api })
    }

    /// The endpoint without its query string, safe to log.
    fn endpoint(&self) -> String {
        match url::Url::parse(&self.api.api_url) {
            Ok(mut url) => {
                url.set_query(None);
                url.to_string()
            }
            Err(_) => self.api.api_url.clone(),
        }
    }
}

#[async_trait]
impl AttemptSource for HttpFetcher {
    async fn fetch(&self) -> Result<serde_json::Value> {
        let endpoint = self.endpoint();
        tracing::info!(
            "Downloading attempts from {} ({} .. {})",
            endpoint,
            self.api.start_date,
            self.api.end_date
        );

        // The request URL carries client_key, so it is stripped from errors.
        let response = self
            .client
            .get(&self.api.api_url)
            .query(&self.api.query_params())
            .send()
            .await
            .map_err(|e| EtlError::TransportError {
                url: endpoint.clone(),
                source: e.without_url(),
            })?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if status.is_client_error() || status.is_server_error() {
            return Err(EtlError::HttpError {
                status: status.as_u16(),
                url: endpoint,
            });
        }

        let body = response.text().await.map_err(|e| EtlError::TransportError {
            url: endpoint.clone(),
            source: e.without_url(),
        })?;

        let data: serde_json::Value =
            serde_json::from_str(&body).map_err(EtlError::DecodeError)?;

        tracing::info!("Download finished ({} bytes)", body.len());
        Ok(data)
    }
}
