use reqwest::{Method, RequestBuilder};
use url::Url;

use crate::error::map_reqwest_error;
use crate::{ClientError, ClientSettings};

/// Shared reqwest client plus the API base URL. Requests built here carry no
/// credential; [`crate::ApiClient`] decorates them.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let base_url = Url::parse(settings.base_url.trim_end_matches('/'))
            .map_err(|err| ClientError::InvalidUrl(format!("{}: {err}", settings.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(settings.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` below the base URL, keeping any path prefix the base has.
    pub fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.url_with_segment(path, None)
    }

    /// Like [`Self::url`], with one extra percent-encoded trailing segment.
    pub fn url_with_segment(&self, path: &str, segment: Option<&str>) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            for part in path.split('/').filter(|part| !part.is_empty()) {
                segments.push(part);
            }
            if let Some(segment) = segment {
                segments.push(segment);
            }
            if path.ends_with('/') && segment.is_none() {
                segments.push("");
            }
        }
        Ok(url)
    }

    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    pub fn get(&self, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.request(Method::GET, self.url(path)?))
    }

    pub fn post(&self, path: &str) -> Result<RequestBuilder, ClientError> {
        Ok(self.request(Method::POST, self.url(path)?))
    }
}
