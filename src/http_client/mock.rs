//! scripted [HttpClientApi] for tests
#![allow(clippy::expect_used)]

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use http::{HeaderMap, Method, StatusCode};

use super::{BodyStream, HttpClientApi, HttpError};

/// canned response handed out by [HttpClientMock]
#[derive(Debug, Clone)]
pub struct FakeResponse {
	pub status: StatusCode,
	pub headers: HeaderMap,
	pub payload: Bytes,
}

impl FakeResponse {
	pub fn new(status: u16, payload: impl Into<Bytes>) -> Self {
		Self {
			status: StatusCode::from_u16(status).expect("invalid status code in test"),
			headers: HeaderMap::new(),
			payload: payload.into(),
		}
	}

	pub fn json(status: u16, payload: &serde_json::Value) -> Self {
		Self::new(status, payload.to_string())
	}
}

impl Default for FakeResponse {
	fn default() -> Self {
		Self { status: StatusCode::OK, headers: HeaderMap::new(), payload: Bytes::new() }
	}
}

/// a request as seen by [HttpClientMock]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
	pub method: Method,
	pub url: String,
	pub headers: HeaderMap,
	pub body: Option<Bytes>,
}

/// Replays queued [FakeResponse]s in FIFO order, one per call. An empty queue answers `200` with
/// an empty payload. With `should_fail` set every call fails with a transport error.
#[derive(Debug, Default)]
pub struct HttpClientMock {
	pub should_fail: bool,
	responses: Mutex<VecDeque<FakeResponse>>,
	requests: Mutex<Vec<RecordedRequest>>,
}

impl HttpClientMock {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self { should_fail: true, ..Self::default() }
	}

	pub fn push_payload(&self, response: FakeResponse) {
		self.responses.lock().expect("mock lock poisoned").push_back(response);
	}

	pub fn pop_payload(&self) -> FakeResponse {
		self.responses.lock().expect("mock lock poisoned").pop_front().unwrap_or_default()
	}

	/// every request received so far, oldest first
	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().expect("mock lock poisoned").clone()
	}

	fn call(
		&self,
		method: Method,
		url: &str,
		headers: &HeaderMap,
		body: Option<Bytes>,
	) -> Result<FakeResponse, HttpError> {
		self.requests.lock().expect("mock lock poisoned").push(RecordedRequest {
			method: method.clone(),
			url: url.to_owned(),
			headers: headers.clone(),
			body,
		});

		if self.should_fail {
			return Err(HttpError::Transport(
				format!("failed to {} resource", method.as_str().to_lowercase()).into(),
			));
		}

		Ok(self.pop_payload())
	}
}

#[async_trait]
impl HttpClientApi for HttpClientMock {
	async fn get(&self, url: &str, headers: &HeaderMap) -> Result<(Bytes, StatusCode), HttpError> {
		let response = self.call(Method::GET, url, headers, None)?;
		Ok((response.payload, response.status))
	}

	async fn get_return_headers(
		&self,
		url: &str,
		headers: &HeaderMap,
	) -> Result<(Bytes, HeaderMap, StatusCode), HttpError> {
		let response = self.call(Method::GET, url, headers, None)?;
		Ok((response.payload, response.headers, response.status))
	}

	async fn get_return_reader(
		&self,
		url: &str,
		headers: &HeaderMap,
	) -> Result<(BodyStream, StatusCode), HttpError> {
		let response = self.call(Method::GET, url, headers, None)?;
		let stream = futures::stream::once(async move { Ok(response.payload) }).boxed();
		Ok((stream, response.status))
	}

	async fn post(
		&self,
		url: &str,
		headers: &HeaderMap,
		body: Bytes,
	) -> Result<(Bytes, StatusCode), HttpError> {
		let response = self.call(Method::POST, url, headers, Some(body))?;
		Ok((response.payload, response.status))
	}

	async fn put(
		&self,
		url: &str,
		headers: &HeaderMap,
		body: Bytes,
	) -> Result<(Bytes, StatusCode), HttpError> {
		let response = self.call(Method::PUT, url, headers, Some(body))?;
		Ok((response.payload, response.status))
	}

	async fn patch(
		&self,
		url: &str,
		headers: &HeaderMap,
		body: Bytes,
	) -> Result<(Bytes, StatusCode), HttpError> {
		let response = self.call(Method::PATCH, url, headers, Some(body))?;
		Ok((response.payload, response.status))
	}

	async fn delete(
		&self,
		url: &str,
		headers: &HeaderMap,
	) -> Result<(Bytes, StatusCode), HttpError> {
		let response = self.call(Method::DELETE, url, headers, None)?;
		Ok((response.payload, response.status))
	}
}

#[cfg(test)]
mod tests {
	use futures::TryStreamExt;

	use super::*;

	#[tokio::test]
	async fn replays_queue_then_defaults_to_empty_ok() {
		let mock = HttpClientMock::new();
		mock.push_payload(FakeResponse::new(201, "first"));
		mock.push_payload(FakeResponse::new(500, "second"));

		let headers = HeaderMap::new();
		assert_eq!(
			mock.get("http://kibana/a", &headers).await.unwrap(),
			(Bytes::from_static(b"first"), StatusCode::CREATED)
		);
		assert_eq!(
			mock.post("http://kibana/b", &headers, Bytes::from_static(b"{}")).await.unwrap(),
			(Bytes::from_static(b"second"), StatusCode::INTERNAL_SERVER_ERROR)
		);
		assert_eq!(mock.delete("http://kibana/c", &headers).await.unwrap(), (Bytes::new(), StatusCode::OK));

		let (stream, status) = mock.get_return_reader("http://kibana/d", &headers).await.unwrap();
		let chunks: Vec<Bytes> = stream.try_collect().await.unwrap();
		assert_eq!(status, StatusCode::OK);
		assert!(chunks.concat().is_empty());

		let requests = mock.requests();
		let methods: Vec<_> = requests.iter().map(|r| r.method.as_str()).collect();
		assert_eq!(methods, ["GET", "POST", "DELETE", "GET"]);
		assert_eq!(requests[1].body.as_deref(), Some(&b"{}"[..]));
	}

	#[tokio::test]
	async fn failing_mock_fails_every_verb() {
		let mock = HttpClientMock::failing();
		mock.push_payload(FakeResponse::new(200, "never handed out"));
		let headers = HeaderMap::new();

		assert!(matches!(mock.get("http://kibana", &headers).await, Err(HttpError::Transport(_))));
		assert!(matches!(
			mock.get_return_headers("http://kibana", &headers).await,
			Err(HttpError::Transport(_))
		));
		assert!(matches!(
			mock.put("http://kibana", &headers, Bytes::new()).await,
			Err(HttpError::Transport(_))
		));
		assert!(matches!(
			mock.patch("http://kibana", &headers, Bytes::new()).await,
			Err(HttpError::Transport(_))
		));
		assert!(matches!(mock.delete("http://kibana", &headers).await, Err(HttpError::Transport(_))));

		let err = mock.post("http://kibana", &headers, Bytes::new()).await.unwrap_err();
		assert_eq!(err.to_string(), "http transport error: failed to post resource");
	}
}
