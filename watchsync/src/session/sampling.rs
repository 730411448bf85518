use crate::history::{HistoryGateway, HistorySample};
use crate::player::{Player, PlayerState};
use crate::time_hub::TimeHub;
use crate::types::content_id::ContentId;
use crate::types::user_identity::UserIdentity;
use crate::utils::aborting_join_handle::AbortingJoinHandle;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info};

/// Everything a sampling tick reads from and fans out to.
pub struct SamplingTarget {
	pub content_id: ContentId,
	pub user: UserIdentity,
	pub player: Arc<dyn Player>,
	pub time_hub: Arc<TimeHub>,
	pub history: Arc<HistoryGateway>,
}

impl SamplingTarget {
	fn tick(&self, gate: &TickGate) {
		// Reading the position may block, so it happens outside of the gate.
		let position = self.player.current_time().max(0.0);

		let open = gate.open.lock();
		if !*open {
			return;
		}
		self.time_hub.set(position);
		self.history.submit(HistorySample {
			user: self.user.clone(),
			content_id: self.content_id.clone(),
			timestamp_seconds: position,
		});
	}
}

/// Closed by [`SamplingController::stop`]. Aborting the timer task doesn't interrupt a tick that is already running on
/// another worker, so every tick fans out only while holding this gate open.
#[derive(Debug)]
struct TickGate {
	open: parking_lot::Mutex<bool>,
}

impl TickGate {
	fn new() -> Self {
		Self {
			open: parking_lot::Mutex::new(true),
		}
	}

	fn close(&self) {
		*self.open.lock() = false;
	}
}

/// Owning the timer inside the state makes "has a timer iff sampling" hold by construction.
#[derive(Debug)]
enum SamplingState {
	Idle,
	Sampling {
		gate: Arc<TickGate>,
		_timer: AbortingJoinHandle<()>,
	},
}

/// Runs a fixed-interval sampler while the player reports [`PlayerState::Playing`].
pub struct SamplingController {
	target: Arc<SamplingTarget>,
	interval: Duration,
	state: SamplingState,
}

impl SamplingController {
	pub fn new(target: SamplingTarget, interval: Duration) -> Self {
		Self {
			target: Arc::new(target),
			interval,
			state: SamplingState::Idle,
		}
	}

	pub fn handle_state_change(&mut self, state: PlayerState) {
		if state.is_playing() {
			self.start();
		} else {
			self.stop();
		}
	}

	fn start(&mut self) {
		if self.is_sampling() {
			return;
		}

		info!("Sampling '{}' every {:?}.", self.target.content_id, self.interval);
		let gate = Arc::new(TickGate::new());
		let timer = tokio::spawn(sample(self.target.clone(), gate.clone(), self.interval));
		self.state = SamplingState::Sampling {
			gate,
			_timer: timer.into(),
		};
	}

	/// Goes back to idle, cancelling the timer if there is one. Once this returns, no tick reaches the hub or the
	/// history gateway anymore.
	pub fn stop(&mut self) {
		if let SamplingState::Sampling { gate, .. } = std::mem::replace(&mut self.state, SamplingState::Idle) {
			gate.close();
			debug!("Stopped sampling '{}'.", self.target.content_id);
		}
	}

	pub fn is_sampling(&self) -> bool {
		matches!(self.state, SamplingState::Sampling { .. })
	}
}

async fn sample(target: Arc<SamplingTarget>, gate: Arc<TickGate>, period: Duration) {
	// The first tick comes one period after playback started, not immediately.
	let mut interval = interval_at(Instant::now() + period, period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
	loop {
		interval.tick().await;
		target.tick(&gate);
	}
}
