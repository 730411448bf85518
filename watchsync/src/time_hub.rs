use tokio::sync::watch;

/// Last-write-wins store for the current playback position in seconds.
///
/// Written by the sampler of the active session, read by the transcript highlighter either by polling [`TimeHub::get`]
/// or by awaiting changes on a [`TimeHub::subscribe`] receiver.
pub struct TimeHub {
	position: watch::Sender<f64>,
}

impl Default for TimeHub {
	fn default() -> Self {
		Self {
			position: watch::Sender::new(0.0),
		}
	}
}

impl TimeHub {
	/// Overwrites the current position. Negative (and NaN) positions are stored as `0.0`.
	/// Backward jumps are fine, the player may have been seeked.
	pub fn set(&self, seconds: f64) {
		self.position.send_replace(seconds.max(0.0));
	}

	pub fn get(&self) -> f64 {
		*self.position.borrow()
	}

	pub fn subscribe(&self) -> watch::Receiver<f64> {
		self.position.subscribe()
	}
}
