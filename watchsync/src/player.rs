use crate::player::loader::ReadySignal;
use crate::types::content_id::ContentId;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

pub mod loader;
pub mod registry;
pub mod simulated;

/// Playback states reported by the embed API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
	Unstarted,
	Ended,
	Playing,
	Paused,
	Buffering,
	Cued,
}

impl PlayerState {
	pub fn is_playing(self) -> bool {
		self == PlayerState::Playing
	}
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown player state code: {0}")]
pub struct PlayerStateError(pub i8);

/// The embed API reports states as the integer codes of its `PlayerState` enumeration.
impl TryFrom<i8> for PlayerState {
	type Error = PlayerStateError;

	fn try_from(code: i8) -> Result<Self, Self::Error> {
		use PlayerState::*;
		Ok(match code {
			-1 => Unstarted,
			0 => Ended,
			1 => Playing,
			2 => Paused,
			3 => Buffering,
			5 => Cued,
			unknown => return Err(PlayerStateError(unknown)),
		})
	}
}

/// Where a player delivers its state-change notifications.
pub type StateChangeSender = mpsc::UnboundedSender<PlayerState>;

/// A constructed player instance of the video provider.
pub trait Player: Send + Sync {
	/// Current playback position in seconds.
	fn current_time(&self) -> f64;
	/// Tears down the embedded player. Called once, when the last lease on it is released.
	fn destroy(&self);
}

/// The video provider's embed API.
pub trait EmbedApi: Send + Sync {
	/// Starts loading the provider's script. Once it is available, the provider calls [`ReadySignal::signal`].
	fn inject_script(&self, ready: ReadySignal);
	/// Constructs a player for `content_id` that reports its state changes to `state_changes`.
	fn create_player(&self, content_id: &ContentId, state_changes: StateChangeSender) -> Arc<dyn Player>;
}
