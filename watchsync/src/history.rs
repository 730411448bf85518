use crate::api_client::error::ApiError;
use crate::history::debouncer::Debouncer;
use crate::types::content_id::ContentId;
use crate::types::user_identity::UserIdentity;
use crate::utils::aborting_join_handle::AbortingJoinHandle;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, warn};

pub mod debouncer;

/// One position sample as it is persisted to the watch history.
/// Serializes to the body of `POST /dashboard/update_watch_history`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistorySample {
	pub user: UserIdentity,
	#[serde(rename = "video_id")]
	pub content_id: ContentId,
	#[serde(rename = "timestamp")]
	pub timestamp_seconds: f64,
}

#[async_trait]
pub trait HistoryWriter: Send + Sync {
	async fn write_history(&self, sample: &HistorySample) -> Result<(), ApiError>;
}

/// Debounced, fire-and-forget forwarder from position samples to a [`HistoryWriter`].
///
/// Every [`HistoryGateway::submit`] restarts the quiescence window, so a steady stream of samples results in at most
/// one write per window, carrying the most recent sample. Writes are dispatched on their own task and never awaited;
/// failures are logged and dropped without retry since the next sample supersedes them anyway.
///
/// Dropping or closing the gateway drops the pending write along with it. A closed gateway ignores every later sample,
/// so a tick that was already running when its session was torn down cannot cause a write.
pub struct HistoryGateway {
	shared: Arc<GatewayShared>,
	driver: parking_lot::Mutex<Option<AbortingJoinHandle<()>>>,
}

struct GatewayShared {
	pending: parking_lot::Mutex<Debouncer<HistorySample, Instant>>,
	wakeup: Notify,
	writer: Arc<dyn HistoryWriter>,
}

impl HistoryGateway {
	pub fn new(writer: Arc<dyn HistoryWriter>, window: Duration) -> Self {
		let shared = Arc::new(GatewayShared {
			pending: parking_lot::Mutex::new(Debouncer::new(window)),
			wakeup: Notify::new(),
			writer,
		});
		let driver = tokio::spawn(drive(shared.clone())).into();

		Self {
			shared,
			driver: parking_lot::Mutex::new(Some(driver)),
		}
	}

	pub fn submit(&self, sample: HistorySample) {
		self.shared.pending.lock().submit(sample, Instant::now());
		self.shared.wakeup.notify_one();
	}

	pub fn has_pending_write(&self) -> bool {
		self.shared.pending.lock().is_pending()
	}

	/// Drops the pending write and stops the driver. Samples submitted afterwards are ignored.
	pub fn close(&self) {
		if let Some(sample) = self.shared.pending.lock().close() {
			debug!(
				"Cancelled pending watch history write for '{}' at {}s.",
				sample.content_id, sample.timestamp_seconds
			);
		}
		drop(self.driver.lock().take());
	}

	#[cfg(test)]
	pub fn is_closed(&self) -> bool {
		self.shared.pending.lock().is_closed() && self.driver.lock().is_none()
	}
}

async fn drive(shared: Arc<GatewayShared>) {
	loop {
		let (deadline, closed) = {
			let pending = shared.pending.lock();
			(pending.deadline(), pending.is_closed())
		};
		if closed {
			return;
		}
		let Some(deadline) = deadline else {
			shared.wakeup.notified().await;
			continue;
		};

		tokio::select! {
			() = shared.wakeup.notified() => {}
			() = sleep_until(deadline) => {
				let due = shared.pending.lock().take_due(Instant::now());
				if let Some(sample) = due {
					dispatch(shared.writer.clone(), sample);
				}
			}
		}
	}
}

fn dispatch(writer: Arc<dyn HistoryWriter>, sample: HistorySample) {
	debug!(
		"Saving watch history for '{}' at {}s.",
		sample.content_id, sample.timestamp_seconds
	);
	tokio::spawn(async move {
		if let Err(error) = writer.write_history(&sample).await {
			warn!(
				"Dropping watch history update for '{}' at {}s: {error}",
				sample.content_id, sample.timestamp_seconds
			);
		}
	});
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::utils::fake_history_writer::FakeHistoryWriter;
	use serde_json::json;
	use tokio::time::sleep;

	const WINDOW: Duration = Duration::from_millis(1000);

	fn sample(timestamp_seconds: f64) -> HistorySample {
		HistorySample {
			user: UserIdentity::from(json!({"name": "Ferris"})),
			content_id: ContentId::from("crab-rave"),
			timestamp_seconds,
		}
	}

	#[test]
	fn sample_should_serialize_to_the_history_endpoint_body() {
		let json = serde_json::to_value(sample(13.5)).expect("Failed to serialize");

		assert_eq!(
			json,
			json!({
				"user": {"name": "Ferris"},
				"video_id": "crab-rave",
				"timestamp": 13.5,
			})
		);
	}

	#[tokio::test(start_paused = true)]
	async fn a_burst_of_samples_should_result_in_exactly_one_write_of_the_last_sample() {
		let writer = FakeHistoryWriter::default();
		let gateway = HistoryGateway::new(writer.clone().into(), WINDOW);

		for timestamp in [0.5, 1.0, 1.5, 2.0, 2.5] {
			gateway.submit(sample(timestamp));
			sleep(Duration::from_millis(100)).await;
		}
		assert!(writer.writes().is_empty(), "Wrote before the window was quiescent");

		sleep(Duration::from_millis(1000)).await;

		assert_eq!(writer.writes(), vec![sample(2.5)]);
		assert!(!gateway.has_pending_write());
	}

	#[tokio::test(start_paused = true)]
	async fn each_quiescent_period_should_produce_its_own_write() {
		let writer = FakeHistoryWriter::default();
		let gateway = HistoryGateway::new(writer.clone().into(), WINDOW);

		gateway.submit(sample(1.0));
		sleep(Duration::from_millis(1500)).await;
		gateway.submit(sample(2.0));
		sleep(Duration::from_millis(1500)).await;

		assert_eq!(writer.writes(), vec![sample(1.0), sample(2.0)]);
	}

	#[tokio::test(start_paused = true)]
	async fn should_not_write_before_the_window_elapsed() {
		let writer = FakeHistoryWriter::default();
		let gateway = HistoryGateway::new(writer.clone().into(), WINDOW);

		gateway.submit(sample(1.0));
		sleep(Duration::from_millis(999)).await;

		assert!(writer.writes().is_empty());
		assert!(gateway.has_pending_write());
	}

	#[tokio::test(start_paused = true)]
	async fn close_should_prevent_the_pending_write() {
		let writer = FakeHistoryWriter::default();
		let gateway = HistoryGateway::new(writer.clone().into(), WINDOW);

		gateway.submit(sample(1.0));
		gateway.close();
		sleep(Duration::from_millis(2000)).await;

		assert!(writer.writes().is_empty());
		assert!(!gateway.has_pending_write());
		assert!(gateway.is_closed());
	}

	#[tokio::test(start_paused = true)]
	async fn samples_submitted_after_closing_should_never_be_written() {
		let writer = FakeHistoryWriter::default();
		let gateway = HistoryGateway::new(writer.clone().into(), WINDOW);
		gateway.close();

		gateway.submit(sample(1.5));
		assert!(!gateway.has_pending_write());
		sleep(Duration::from_millis(2000)).await;

		assert!(writer.writes().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn closing_twice_should_be_harmless() {
		let writer = FakeHistoryWriter::default();
		let gateway = HistoryGateway::new(writer.clone().into(), WINDOW);

		gateway.close();
		gateway.close();

		assert!(gateway.is_closed());
	}

	#[tokio::test(start_paused = true)]
	async fn dropping_the_gateway_should_drop_the_pending_write() {
		let writer = FakeHistoryWriter::default();
		let gateway = HistoryGateway::new(writer.clone().into(), WINDOW);

		gateway.submit(sample(1.0));
		drop(gateway);
		sleep(Duration::from_millis(2000)).await;

		assert!(writer.writes().is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn failed_writes_should_be_dropped_without_retry() {
		let writer = FakeHistoryWriter::failing();
		let gateway = HistoryGateway::new(writer.clone().into(), WINDOW);

		gateway.submit(sample(1.0));
		sleep(Duration::from_millis(5000)).await;

		assert_eq!(writer.attempts(), 1);
		assert!(!gateway.has_pending_write());

		gateway.submit(sample(6.0));
		sleep(Duration::from_millis(1500)).await;

		assert_eq!(writer.attempts(), 2);
	}
}
