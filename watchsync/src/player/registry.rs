use crate::player::Player;
use crate::types::content_id::ContentId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Process-wide map from content id to its one live player, reference counted through [`PlayerLease`]s.
#[derive(Default)]
pub struct PlayerRegistry {
	players: parking_lot::Mutex<HashMap<ContentId, RegisteredPlayer>>,
}

struct RegisteredPlayer {
	player: Arc<dyn Player>,
	leases: usize,
}

/// Shared ownership of a registered player. The player is destroyed when its last lease is dropped.
pub struct PlayerLease {
	registry: Arc<PlayerRegistry>,
	content_id: ContentId,
	player: Arc<dyn Player>,
	constructed: bool,
}

impl PlayerRegistry {
	/// Leases the player for `content_id`, calling `construct` only if no player for it is live.
	pub fn acquire(
		self: &Arc<Self>,
		content_id: &ContentId,
		construct: impl FnOnce() -> Arc<dyn Player>,
	) -> PlayerLease {
		let mut players = self.players.lock();
		let (player, constructed) = match players.get_mut(content_id) {
			Some(registered) => {
				registered.leases += 1;
				debug!("Reusing live player for '{content_id}' ({} leases).", registered.leases);
				(registered.player.clone(), false)
			}
			None => {
				info!("Constructing player for '{content_id}'.");
				let player = construct();
				players.insert(
					content_id.clone(),
					RegisteredPlayer {
						player: player.clone(),
						leases: 1,
					},
				);
				(player, true)
			}
		};

		PlayerLease {
			registry: self.clone(),
			content_id: content_id.clone(),
			player,
			constructed,
		}
	}

	#[cfg(test)]
	pub fn is_live(&self, content_id: &ContentId) -> bool {
		self.players.lock().contains_key(content_id)
	}

	fn release(&self, content_id: &ContentId) {
		let destroyed = {
			let mut players = self.players.lock();
			let Some(registered) = players.get_mut(content_id) else {
				warn!("Released a lease on '{content_id}' which has no registered player.");
				return;
			};
			registered.leases -= 1;
			if registered.leases == 0 {
				players.remove(content_id)
			} else {
				None
			}
		};

		if let Some(RegisteredPlayer { player, .. }) = destroyed {
			info!("Destroying player for '{content_id}'.");
			player.destroy();
		}
	}
}

impl PlayerLease {
	pub fn player(&self) -> &Arc<dyn Player> {
		&self.player
	}

	/// Whether acquiring this lease constructed the player, as opposed to joining a live one.
	pub fn constructed(&self) -> bool {
		self.constructed
	}
}

impl Drop for PlayerLease {
	fn drop(&mut self) {
		self.registry.release(&self.content_id);
	}
}
