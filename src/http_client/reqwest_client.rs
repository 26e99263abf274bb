//! [HttpClientApi] on top of [reqwest] that records prometheus meters
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http::{HeaderMap, Method, StatusCode};
use prometheus::{HistogramVec, IntCounterVec, Registry};
use url::Url;

use super::{validate_url, BodyStream, HttpClientApi, HttpError};

#[derive(Debug, Clone)]
/// prometheus meters for the http client
struct Metrics {
	/// total number of http requests
	http_requests: IntCounterVec,
	/// total number of requests answered with a non 2xx status
	http_requests_failed: IntCounterVec,
	/// time spent by http requests
	http_request_duration: HistogramVec,
}

impl Metrics {
	/// construct meters and register them in `registry`
	fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
		use prometheus::{exponential_buckets, histogram_opts, opts};

		let http_requests = IntCounterVec::new(
			opts!("requests_total", "total number of http requests")
				.namespace("kibana_provider")
				.subsystem("http_client"),
			&["host", "method"],
		)?;

		let http_requests_failed = IntCounterVec::new(
			opts!("requests_failed", "number of http requests answered with a non 2xx status")
				.namespace("kibana_provider")
				.subsystem("http_client"),
			&["host", "status_code"],
		)?;

		let http_request_duration = HistogramVec::new(
			histogram_opts!(
				"request_duration_seconds",
				"total time of a http request in seconds",
				exponential_buckets(0.01, 2., 12)?
			)
			.namespace("kibana_provider")
			.subsystem("http_client"),
			&["host"],
		)?;

		registry.register(Box::new(http_requests.clone()))?;
		registry.register(Box::new(http_requests_failed.clone()))?;
		registry.register(Box::new(http_request_duration.clone()))?;

		Ok(Self { http_requests, http_requests_failed, http_request_duration })
	}
}

#[derive(Debug, Clone)]
/// http client doing real network requests. No retries, a failed request is reported as is.
pub struct ReqwestClient {
	/// http client
	client: reqwest::Client,
	/// meters are kept in their own registry so multiple clients can coexist
	registry: Registry,
	/// prometheus meters for http requests
	metrics: Metrics,
}

impl ReqwestClient {
	/// construct http client, `timeout` applies to the whole request including the body
	pub fn new(timeout: Duration) -> Result<Self> {
		let registry = Registry::new();

		Ok(Self {
			client: reqwest::Client::builder()
				.timeout(timeout)
				.build()
				.context("failed to build reqwest client")?,
			metrics: Metrics::new(&registry).context("failed to register prometheus meters")?,
			registry,
		})
	}

	/// registry holding the meters of this client
	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	/// send request to an already validated url and return the response without reading the body
	async fn send(
		&self,
		method: Method,
		url: Url,
		headers: &HeaderMap,
		body: Option<Bytes>,
	) -> Result<reqwest::Response, HttpError> {
		let host = url.host_str().unwrap_or_default().to_owned();

		self.metrics.http_requests.with_label_values(&[host.as_str(), method.as_str()]).inc();

		tracing::trace!("{} {}", method, url);

		let mut request = self.client.request(method, url).headers(headers.clone());
		if let Some(body) = body {
			request = request.body(body);
		}

		let response = request.send().await.map_err(|err| HttpError::Transport(err.into()))?;

		if !response.status().is_success() {
			self.metrics
				.http_requests_failed
				.with_label_values(&[host.as_str(), response.status().as_str()])
				.inc();
		}

		Ok(response)
	}

	/// send request and buffer the whole response
	async fn request(
		&self,
		method: Method,
		url: &str,
		headers: &HeaderMap,
		body: Option<Bytes>,
	) -> Result<(Bytes, HeaderMap, StatusCode), HttpError> {
		let url = validate_url(url)?;
		let _timer = self
			.metrics
			.http_request_duration
			.with_label_values(&[url.host_str().unwrap_or_default()])
			.start_timer();

		let response = self.send(method, url, headers, body).await?;

		let status = response.status();
		let headers = response.headers().clone();
		let body = response.bytes().await.map_err(|err| HttpError::Transport(err.into()))?;

		Ok((body, headers, status))
	}
}

#[async_trait]
impl HttpClientApi for ReqwestClient {
	async fn get(&self, url: &str, headers: &HeaderMap) -> Result<(Bytes, StatusCode), HttpError> {
		let (body, _, status) = self.request(Method::GET, url, headers, None).await?;
		Ok((body, status))
	}

	async fn get_return_headers(
		&self,
		url: &str,
		headers: &HeaderMap,
	) -> Result<(Bytes, HeaderMap, StatusCode), HttpError> {
		self.request(Method::GET, url, headers, None).await
	}

	async fn get_return_reader(
		&self,
		url: &str,
		headers: &HeaderMap,
	) -> Result<(BodyStream, StatusCode), HttpError> {
		let response = self.send(Method::GET, validate_url(url)?, headers, None).await?;
		let status = response.status();

		let stream = response
			.bytes_stream()
			.map(|chunk| chunk.map_err(|err| HttpError::Transport(err.into())))
			.boxed();

		Ok((stream, status))
	}

	async fn post(
		&self,
		url: &str,
		headers: &HeaderMap,
		body: Bytes,
	) -> Result<(Bytes, StatusCode), HttpError> {
		let (body, _, status) = self.request(Method::POST, url, headers, Some(body)).await?;
		Ok((body, status))
	}

	async fn put(
		&self,
		url: &str,
		headers: &HeaderMap,
		body: Bytes,
	) -> Result<(Bytes, StatusCode), HttpError> {
		let (body, _, status) = self.request(Method::PUT, url, headers, Some(body)).await?;
		Ok((body, status))
	}

	async fn patch(
		&self,
		url: &str,
		headers: &HeaderMap,
		body: Bytes,
	) -> Result<(Bytes, StatusCode), HttpError> {
		let (body, _, status) = self.request(Method::PATCH, url, headers, Some(body)).await?;
		Ok((body, status))
	}

	async fn delete(
		&self,
		url: &str,
		headers: &HeaderMap,
	) -> Result<(Bytes, StatusCode), HttpError> {
		let (body, _, status) = self.request(Method::DELETE, url, headers, None).await?;
		Ok((body, status))
	}
}
