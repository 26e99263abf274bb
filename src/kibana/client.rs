use async_trait::async_trait;
use bytes::Bytes;
use http::{
	header::{InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE},
	HeaderMap, HeaderValue, StatusCode,
};

use super::{
	alert::{Alert, Created},
	KibanaApi, KibanaError,
};
use crate::http_client::{HttpClientApi, HttpError};

/// header kibana requires on every mutating api call
const XSRF_HEADER: &str = "kbn-xsrf";

/// [KibanaApi] talking to a kibana instance over http
#[derive(Debug)]
pub struct KibanaClient<C> {
	api: C,
	headers: HeaderMap,
	host: String,
}

impl<C: HttpClientApi> KibanaClient<C> {
	/// `auth` is the base64 encoded basic auth token, it is never logged
	pub fn new(api: C, host: &str, auth: &str) -> Result<Self, InvalidHeaderValue> {
		let mut authorization = HeaderValue::from_str(&format!("Basic {auth}"))?;
		authorization.set_sensitive(true);

		let mut headers = HeaderMap::with_capacity(3);
		headers.insert(AUTHORIZATION, authorization);
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		headers.insert(XSRF_HEADER, HeaderValue::from_static(env!("CARGO_PKG_NAME")));

		Ok(Self { api, headers, host: host.trim_end_matches('/').to_owned() })
	}

	/// the underlying http client
	pub fn api(&self) -> &C {
		&self.api
	}

	fn rules_url(&self) -> String {
		format!("{}/api/alerting/rule", self.host)
	}

	fn rule_url(&self, alert_id: &str) -> String {
		format!("{}/api/alerting/rule/{}", self.host, alert_id)
	}

	/// post an empty body to `_enable` or `_disable`
	async fn toggle(
		&self,
		operation: &'static str,
		alert_id: &str,
		endpoint: &str,
	) -> Result<(), KibanaError> {
		let url = format!("{}/{}", self.rule_url(alert_id), endpoint);

		let response = self
			.api
			.post(&url, &self.headers, Bytes::new())
			.await
			.map_err(|source| KibanaError::Http { operation, source })?;

		check_status(operation, response, None)?;
		Ok(())
	}
}

/// only 200 and 204 are accepted, everything else becomes a [KibanaError::Remote]
fn check_status(
	operation: &'static str,
	(body, status): (Bytes, StatusCode),
	request: Option<&[u8]>,
) -> Result<Bytes, KibanaError> {
	tracing::debug!("{operation}: received status {status}");

	if status == StatusCode::OK || status == StatusCode::NO_CONTENT {
		return Ok(body);
	}

	Err(KibanaError::Remote {
		operation,
		status: status.as_u16(),
		body: String::from_utf8_lossy(&body).into_owned(),
		request: request.map(|request| String::from_utf8_lossy(request).into_owned()),
	})
}

fn serialize(operation: &'static str, alert: &Alert) -> Result<Bytes, KibanaError> {
	serde_json::to_vec(alert)
		.map(Bytes::from)
		.map_err(|source| KibanaError::Serialization { operation, source })
}

fn http_error(operation: &'static str) -> impl FnOnce(HttpError) -> KibanaError {
	move |source| KibanaError::Http { operation, source }
}

#[async_trait]
impl<C: HttpClientApi> KibanaApi for KibanaClient<C> {
	async fn create_alert_rule(&self, alert: &Alert) -> Result<String, KibanaError> {
		const OPERATION: &str = "creating rule";

		let request = serialize(OPERATION, alert)?;

		let response = self
			.api
			.post(&self.rules_url(), &self.headers, request.clone())
			.await
			.map_err(http_error(OPERATION))?;

		let body = check_status(OPERATION, response, Some(&request))?;

		let Created { id } = serde_json::from_slice(&body)
			.map_err(|source| KibanaError::Serialization { operation: OPERATION, source })?;

		tracing::debug!("created rule {id}");

		Ok(id)
	}

	async fn read_alert_rule(&self, alert_id: &str) -> Result<Alert, KibanaError> {
		const OPERATION: &str = "reading rule";

		let (body, status) = self
			.api
			.get(&self.rule_url(alert_id), &self.headers)
			.await
			.map_err(http_error(OPERATION))?;

		if status == StatusCode::NOT_FOUND {
			return Err(KibanaError::NotFound { id: alert_id.to_owned() });
		}

		let body = check_status(OPERATION, (body, status), None)?;

		serde_json::from_slice(&body)
			.map_err(|source| KibanaError::Serialization { operation: OPERATION, source })
	}

	async fn update_alert_rule(&self, alert_id: &str, alert: &Alert) -> Result<(), KibanaError> {
		const OPERATION: &str = "updating rule";

		let request = serialize(OPERATION, alert)?;

		let response = self
			.api
			.put(&self.rule_url(alert_id), &self.headers, request.clone())
			.await
			.map_err(http_error(OPERATION))?;

		check_status(OPERATION, response, Some(&request))?;
		Ok(())
	}

	async fn delete_alert_rule(&self, alert_id: &str) -> Result<(), KibanaError> {
		const OPERATION: &str = "deleting rule";

		let response = self
			.api
			.delete(&self.rule_url(alert_id), &self.headers)
			.await
			.map_err(http_error(OPERATION))?;

		check_status(OPERATION, response, None)?;
		Ok(())
	}

	async fn enable_rule(&self, alert_id: &str) -> Result<(), KibanaError> {
		self.toggle("enabling rule", alert_id, "_enable").await
	}

	async fn disable_rule(&self, alert_id: &str) -> Result<(), KibanaError> {
		self.toggle("disabling rule", alert_id, "_disable").await
	}
}
