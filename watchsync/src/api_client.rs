use crate::api_client::error::ApiError;
use crate::configuration::Configuration;
use crate::history::{HistorySample, HistoryWriter};
use crate::types::content_id::ContentId;
use crate::types::user_identity::UserIdentity;
use async_trait::async_trait;
use reqwest::{Response, Url};
use serde::Serialize;
use serde_json::Value;

pub mod error;

const WATCH_HISTORY_PATH: &str = "dashboard/update_watch_history";
const SUMMARIZE_PATH: &str = "chat/summarize";

/// Client for the dashboard backend. Cheap to clone, clones share the connection pool.
#[derive(Clone)]
pub struct ApiClient {
	client: reqwest::Client,
	base_url: Url,
}

#[derive(Serialize)]
struct SummarizeRequest<'a> {
	user: &'a UserIdentity,
	conversation: &'a Value,
}

impl ApiClient {
	pub fn new(configuration: &Configuration) -> Result<Self, ApiError> {
		let client = reqwest::Client::builder()
			.connect_timeout(configuration.request_timeout)
			.timeout(configuration.request_timeout)
			.build()?;

		Ok(Self {
			client,
			base_url: parse_base_url(&configuration.api_base_url)?,
		})
	}

	pub async fn update_watch_history(&self, sample: &HistorySample) -> Result<(), ApiError> {
		let url = self.endpoint(WATCH_HISTORY_PATH, &[])?;
		let response = self.client.post(url).json(sample).send().await?;
		successful(response)?;
		Ok(())
	}

	/// Asks the backend to summarize the video, returning the raw response body.
	pub async fn summarize(
		&self,
		content_id: &ContentId,
		user: &UserIdentity,
		conversation: &Value,
	) -> Result<String, ApiError> {
		let url = self.endpoint(SUMMARIZE_PATH, &[("q", content_id.as_str())])?;
		let request = SummarizeRequest { user, conversation };
		let response = self.client.post(url).json(&request).send().await?;
		Ok(successful(response)?.text().await?)
	}

	fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, ApiError> {
		let mut url = self.base_url.join(path).map_err(|error| ApiError::InvalidUrl {
			url: format!("{}{path}", self.base_url),
			reason: error.to_string(),
		})?;
		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query);
		}
		Ok(url)
	}
}

#[async_trait]
impl HistoryWriter for ApiClient {
	async fn write_history(&self, sample: &HistorySample) -> Result<(), ApiError> {
		self.update_watch_history(sample).await
	}
}

fn successful(response: Response) -> Result<Response, ApiError> {
	let status = response.status();
	if status.is_success() {
		Ok(response)
	} else {
		Err(ApiError::Status(status))
	}
}

// `Url::join` replaces the last path segment unless the base ends with a slash.
fn parse_base_url(base_url: &str) -> Result<Url, ApiError> {
	let normalized = format!("{}/", base_url.trim_end_matches('/'));
	Url::parse(&normalized).map_err(|error| ApiError::InvalidUrl {
		url: base_url.to_string(),
		reason: error.to_string(),
	})
}
