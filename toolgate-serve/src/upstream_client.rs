//! `reqwest`-backed implementation of [`toolgate_core::UpstreamClient`].

use async_trait::async_trait;
use toolgate_core::{UpstreamClient, UpstreamError, UpstreamResponse};

pub struct ReqwestUpstreamClient {
    client: reqwest::Client,
}

impl ReqwestUpstreamClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstreamClient {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: Vec<u8>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|err| UpstreamError::Request(err.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|err| UpstreamError::Request(err.to_string()))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
            headers,
        })
    }
}
