//! http transport used by the [kibana client][crate::kibana::KibanaClient]
//!
//! Everything above this module only depends on [HttpClientApi]. [ReqwestClient] does real
//! requests and records prometheus meters, [mock::HttpClientMock] replays scripted responses.
//!
//! Status codes are never interpreted here: a 404 or 500 is a successful call as far as this
//! module is concerned, only transport failures become an [HttpError].

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use http::{HeaderMap, StatusCode};
use thiserror::Error;
use url::Url;

#[cfg(test)]
pub mod mock;
mod reqwest_client;

pub use reqwest_client::ReqwestClient;

/// boxed error of the underlying transport
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// streaming response body returned by [HttpClientApi::get_return_reader]
pub type BodyStream = BoxStream<'static, Result<Bytes, HttpError>>;

#[derive(Debug, Error)]
pub enum HttpError {
	/// the target url is not an absolute url with scheme and host, no request was sent
	#[error("invalid url {0:?}")]
	InvalidUrl(String),

	/// dns, connection or body read failure
	#[error("http transport error: {0}")]
	Transport(#[source] BoxError),
}

/// verbs needed by the kibana client
///
/// Body-less verbs return `(body, status)`. The header map is sent as is with every request.
#[async_trait]
pub trait HttpClientApi: Send + Sync {
	async fn get(&self, url: &str, headers: &HeaderMap) -> Result<(Bytes, StatusCode), HttpError>;

	/// like [HttpClientApi::get] but also hands back the response headers
	async fn get_return_headers(
		&self,
		url: &str,
		headers: &HeaderMap,
	) -> Result<(Bytes, HeaderMap, StatusCode), HttpError>;

	/// like [HttpClientApi::get] but doesn't buffer the response body
	async fn get_return_reader(
		&self,
		url: &str,
		headers: &HeaderMap,
	) -> Result<(BodyStream, StatusCode), HttpError>;

	async fn post(
		&self,
		url: &str,
		headers: &HeaderMap,
		body: Bytes,
	) -> Result<(Bytes, StatusCode), HttpError>;

	async fn put(
		&self,
		url: &str,
		headers: &HeaderMap,
		body: Bytes,
	) -> Result<(Bytes, StatusCode), HttpError>;

	async fn patch(
		&self,
		url: &str,
		headers: &HeaderMap,
		body: Bytes,
	) -> Result<(Bytes, StatusCode), HttpError>;

	async fn delete(&self, url: &str, headers: &HeaderMap)
		-> Result<(Bytes, StatusCode), HttpError>;
}

/// parse `raw` and make sure it has a scheme and a non-empty host
pub fn validate_url(raw: &str) -> Result<Url, HttpError> {
	let url = Url::parse(raw).map_err(|_| HttpError::InvalidUrl(raw.to_owned()))?;

	if url.scheme().is_empty() || url.host_str().map_or(true, str::is_empty) {
		return Err(HttpError::InvalidUrl(raw.to_owned()));
	}

	Ok(url)
}
