//! An embed API without a browser: players run on the tokio clock and are driven by hand.

use crate::player::loader::ReadySignal;
use crate::player::{EmbedApi, Player, PlayerState, StateChangeSender};
use crate::types::content_id::ContentId;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

pub struct SimulatedEmbedApi {
	load_delay: Option<Duration>,
	script_injections: AtomicUsize,
	pending_load: parking_lot::Mutex<Option<ReadySignal>>,
	players: parking_lot::Mutex<HashMap<ContentId, Arc<SimulatedPlayer>>>,
}

impl SimulatedEmbedApi {
	/// The script finishes loading `load_delay` after it was injected. Needs a tokio runtime.
	pub fn loading_after(load_delay: Duration) -> Self {
		Self::new(Some(load_delay))
	}

	/// The script only finishes loading on [`SimulatedEmbedApi::complete_load`].
	#[cfg(test)]
	pub fn loading_on_demand() -> Self {
		Self::new(None)
	}

	fn new(load_delay: Option<Duration>) -> Self {
		Self {
			load_delay,
			script_injections: Default::default(),
			pending_load: Default::default(),
			players: Default::default(),
		}
	}

	/// Finishes loading the injected script. Returns `false` if nothing was waiting to be loaded.
	#[cfg(test)]
	pub fn complete_load(&self) -> bool {
		let pending_load = self.pending_load.lock().take();
		match pending_load {
			Some(ready) => {
				ready.signal();
				true
			}
			None => false,
		}
	}

	#[cfg(test)]
	pub fn script_injections(&self) -> usize {
		self.script_injections.load(Ordering::SeqCst)
	}

	/// The most recently constructed player for `content_id`.
	pub fn player(&self, content_id: &ContentId) -> Option<Arc<SimulatedPlayer>> {
		self.players.lock().get(content_id).cloned()
	}
}

impl EmbedApi for SimulatedEmbedApi {
	fn inject_script(&self, ready: ReadySignal) {
		self.script_injections.fetch_add(1, Ordering::SeqCst);
		match self.load_delay {
			Some(load_delay) => {
				tokio::spawn(async move {
					tokio::time::sleep(load_delay).await;
					ready.signal();
				});
			}
			None => *self.pending_load.lock() = Some(ready),
		}
	}

	fn create_player(&self, content_id: &ContentId, state_changes: StateChangeSender) -> Arc<dyn Player> {
		let player = Arc::new(SimulatedPlayer::new(state_changes));
		self.players.lock().insert(content_id.clone(), player.clone());
		player
	}
}

pub struct SimulatedPlayer {
	state_changes: StateChangeSender,
	clock: parking_lot::Mutex<PlaybackClock>,
	destroyed: AtomicBool,
}

#[derive(Clone, Copy, Debug)]
enum PlaybackClock {
	Stopped { at: Duration },
	Running { from: Duration, since: Instant },
}

impl PlaybackClock {
	fn position(self) -> Duration {
		match self {
			PlaybackClock::Stopped { at } => at,
			PlaybackClock::Running { from, since } => from + since.elapsed(),
		}
	}
}

impl SimulatedPlayer {
	fn new(state_changes: StateChangeSender) -> Self {
		Self {
			state_changes,
			clock: parking_lot::Mutex::new(PlaybackClock::Stopped { at: Duration::ZERO }),
			destroyed: AtomicBool::new(false),
		}
	}

	pub fn play(&self) {
		self.report(PlayerState::Playing);
	}

	pub fn pause(&self) {
		self.report(PlayerState::Paused);
	}

	/// Jumps to `position`, keeping the player running if it was.
	pub fn seek(&self, position: Duration) {
		let mut clock = self.clock.lock();
		*clock = match *clock {
			PlaybackClock::Stopped { .. } => PlaybackClock::Stopped { at: position },
			PlaybackClock::Running { .. } => PlaybackClock::Running {
				from: position,
				since: Instant::now(),
			},
		};
	}

	/// Moves the clock into `state` and notifies the state-change handler, like the real player would.
	pub fn report(&self, state: PlayerState) {
		{
			let mut clock = self.clock.lock();
			let position = clock.position();
			*clock = if state.is_playing() {
				match *clock {
					running @ PlaybackClock::Running { .. } => running,
					PlaybackClock::Stopped { at } => PlaybackClock::Running {
						from: at,
						since: Instant::now(),
					},
				}
			} else {
				PlaybackClock::Stopped { at: position }
			};
		}

		if self.is_destroyed() {
			debug!("Destroyed player dropped state change {state:?}.");
			return;
		}
		// Nobody listening any more is fine, the session may already be gone.
		let _ = self.state_changes.send(state);
	}

	pub fn is_destroyed(&self) -> bool {
		self.destroyed.load(Ordering::SeqCst)
	}

	/// Whether a session still receives this player's state changes.
	#[cfg(test)]
	pub fn has_subscriber(&self) -> bool {
		!self.state_changes.is_closed()
	}
}

impl Player for SimulatedPlayer {
	fn current_time(&self) -> f64 {
		self.clock.lock().position().as_secs_f64()
	}

	fn destroy(&self) {
		self.destroyed.store(true, Ordering::SeqCst);
	}
}
