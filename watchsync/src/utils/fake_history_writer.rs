use crate::api_client::error::ApiError;
use crate::history::{HistorySample, HistoryWriter};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;

/// Records every write instead of talking to the backend. Clones share their records.
#[derive(Clone, Default)]
pub struct FakeHistoryWriter {
	inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
	fail: bool,
	attempts: parking_lot::Mutex<Vec<HistorySample>>,
}

impl FakeHistoryWriter {
	/// A writer whose backend always answers with `503 Service Unavailable`.
	pub fn failing() -> Self {
		Self {
			inner: Arc::new(Inner {
				fail: true,
				attempts: Default::default(),
			}),
		}
	}

	/// Successfully written samples in the order they were written.
	pub fn writes(&self) -> Vec<HistorySample> {
		if self.inner.fail {
			return Vec::new();
		}
		self.inner.attempts.lock().clone()
	}

	pub fn attempts(&self) -> usize {
		self.inner.attempts.lock().len()
	}
}

impl From<FakeHistoryWriter> for Arc<dyn HistoryWriter> {
	fn from(fake_history_writer: FakeHistoryWriter) -> Self {
		Arc::new(fake_history_writer)
	}
}

#[async_trait]
impl HistoryWriter for FakeHistoryWriter {
	async fn write_history(&self, sample: &HistorySample) -> Result<(), ApiError> {
		self.inner.attempts.lock().push(sample.clone());
		if self.inner.fail {
			return Err(ApiError::Status(StatusCode::SERVICE_UNAVAILABLE));
		}
		Ok(())
	}
}
