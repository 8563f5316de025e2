use std::{
    io::{self, Write},
    time::Duration,
};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Response};

use super::{BaseUrl, ResourceUrl, TransportError};

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "geonames-sync/0.1";

/// Where resources are downloaded from.
#[async_trait(?Send)]
pub trait ResourceSource {
    /// Base URL of the dump endpoint.
    fn base_url(&self) -> &BaseUrl;
    /// Stream the resource identified by `url` into `sink`, returning the
    /// number of bytes written.
    async fn download(&self, url: &ResourceUrl, sink: &mut dyn Write)
    -> Result<u64, TransportError>;
}

/// HTTP implementation of [`ResourceSource`].
#[derive(Debug)]
pub struct HttpResourceSource {
    client: Client,
    base_url: BaseUrl,
    user_agent: String,
}

impl HttpResourceSource {
    /// Construct an HTTP-backed source for `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| TransportError::Client {
                message: err.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: BaseUrl::new(base_url),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        })
    }

    /// Override the default user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    async fn call(&self, url: &str) -> Result<Response, TransportError> {
        self.client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(err, url))
    }
}

#[async_trait(?Send)]
impl ResourceSource for HttpResourceSource {
    fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    async fn download(
        &self,
        url: &ResourceUrl,
        sink: &mut dyn Write,
    ) -> Result<u64, TransportError> {
        let response = self.call(url).await?;
        let mut body = response.bytes_stream();
        let mut written = 0_u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|err| convert_reqwest_error(err, url))?;
            sink.write_all(&chunk)
                .map_err(|source| TransportError::Sink {
                    url: url.to_string(),
                    source,
                })?;
            written = written.saturating_add(u64::try_from(chunk.len()).unwrap_or(u64::MAX));
        }
        sink.flush().map_err(|source| TransportError::Sink {
            url: url.to_string(),
            source,
        })?;
        Ok(written)
    }
}

fn convert_reqwest_error(error: reqwest::Error, url: &str) -> TransportError {
    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    TransportError::Network {
        url: url.to_owned(),
        source: io::Error::new(kind, error),
    }
}
