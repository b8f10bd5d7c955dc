//! HTTPS transport for support document requests

use std::time::Duration;

use async_trait::async_trait;
use browserid_verify::{Transport, TransportResponse};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

/// Issues `GET https://<host><path>` with reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, host: &str, path: &str) -> Result<TransportResponse, String> {
        let url = format!("https://{}{}", host, path);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| format!("HTTPS request failed: {}", e))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response body: {}", e))?;

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}
