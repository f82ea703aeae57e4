use reqwest::{Client, ClientBuilder};
use std::future::Future;

use crate::config::Settings;
use crate::error::BoxError;

/// Why a GET produced no usable body.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP {status} for '{url}'")]
    Status { url: String, status: u16 },

    #[error("request to '{url}' failed: {source}")]
    Request {
        url: String,
        #[source]
        source: BoxError,
    },
}

/// Byte-level GET. Any non-success status is an error.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>>;
}

/// [`Fetch`] over a shared reqwest client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let request_error = |e: reqwest::Error| FetchError::Request {
            url: url.to_string(),
            source: Box::new(e),
        };

        let response = self.client.get(url).send().await.map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(request_error)?;
        Ok(body.to_vec())
    }
}
