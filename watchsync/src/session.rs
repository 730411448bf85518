use crate::context::ApplicationContext;
use crate::history::HistoryGateway;
use crate::player::PlayerState;
use crate::player::loader::PlayerLoader;
use crate::player::registry::PlayerLease;
use crate::session::sampling::{SamplingController, SamplingTarget};
use crate::session::session_id::SessionId;
use crate::types::content_id::ContentId;
use crate::types::user_identity::UserIdentity;
use crate::utils::aborting_join_handle::AbortingJoinHandle;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

pub mod sampling;
pub mod session_id;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
	/// Waiting for the embed API to become ready.
	Loading,
	Ready,
	/// The embed API did not become ready within the configured timeout.
	PlayerUnavailable,
	TornDown,
}

/// One mounted video view: a content id, its player and the sampler feeding the time hub and the watch history.
///
/// All resources are released by [`PlaybackSession::teardown`], which also runs on drop.
pub struct PlaybackSession {
	id: SessionId,
	content_id: ContentId,
	loader: Arc<PlayerLoader>,
	shared: Arc<SessionShared>,
	event_loop: Option<AbortingJoinHandle<()>>,
}

struct SessionShared {
	state: parking_lot::Mutex<SessionState>,
	history: Arc<HistoryGateway>,
}

struct SessionState {
	status: SessionStatus,
	player: Option<PlayerLease>,
	sampling: Option<SamplingController>,
}

impl PlaybackSession {
	/// Mounts a session. Must be called from within a tokio runtime.
	pub fn mount(context: &ApplicationContext, content_id: ContentId, user: UserIdentity) -> Self {
		let id = context.session_ids.next();
		let history = Arc::new(HistoryGateway::new(
			context.history_writer.clone(),
			context.configuration.history_debounce,
		));
		let shared = Arc::new(SessionShared {
			state: parking_lot::Mutex::new(SessionState {
				status: SessionStatus::Loading,
				player: None,
				sampling: None,
			}),
			history,
		});

		context.loader.ensure_loaded();
		let ready = context.loader.on_ready(id);
		let event_loop = tokio::spawn(run_session(
			SessionSetup {
				id,
				content_id: content_id.clone(),
				user,
				context: context.clone(),
			},
			shared.clone(),
			ready,
		));
		info!("Mounted {id} for '{content_id}'.");

		Self {
			id,
			content_id,
			loader: context.loader.clone(),
			shared,
			event_loop: Some(event_loop.into()),
		}
	}

	pub fn id(&self) -> SessionId {
		self.id
	}

	pub fn content_id(&self) -> &ContentId {
		&self.content_id
	}

	pub fn status(&self) -> SessionStatus {
		self.shared.state.lock().status
	}

	pub fn is_sampling(&self) -> bool {
		self.shared
			.state
			.lock()
			.sampling
			.as_ref()
			.is_some_and(SamplingController::is_sampling)
	}

	pub fn has_player(&self) -> bool {
		self.shared.state.lock().player.is_some()
	}

	pub fn has_pending_write(&self) -> bool {
		self.shared.history.has_pending_write()
	}

	/// Stops sampling, drops the pending history write, detaches from the player's state changes, releases the player
	/// and clears the readiness hook. Safe to call repeatedly and before the player was ever ready.
	pub fn teardown(&mut self) {
		// Cancelling the event loop drops the receiving end of the player's state changes.
		let Some(event_loop) = self.event_loop.take() else {
			return;
		};
		drop(event_loop);

		let (sampling, player) = {
			let mut state = self.shared.state.lock();
			state.status = SessionStatus::TornDown;
			(state.sampling.take(), state.player.take())
		};
		if let Some(mut sampling) = sampling {
			sampling.stop();
		}
		// Released outside the lock, the last lease destroys the player.
		drop(player);

		self.shared.history.close();
		self.loader.clear_ready_hook(self.id);
		info!("Tore down {} for '{}'.", self.id, self.content_id);
	}
}

impl Drop for PlaybackSession {
	fn drop(&mut self) {
		self.teardown();
	}
}

struct SessionSetup {
	id: SessionId,
	content_id: ContentId,
	user: UserIdentity,
	context: ApplicationContext,
}

/// Waits for the embed API, constructs the player and then handles its state changes in arrival order.
async fn run_session(setup: SessionSetup, shared: Arc<SessionShared>, ready: oneshot::Receiver<()>) {
	let SessionSetup {
		id,
		content_id,
		user,
		context,
	} = setup;
	let load_timeout = context.configuration.player_load_timeout;

	match tokio::time::timeout(load_timeout, ready).await {
		Ok(Ok(())) => {}
		Ok(Err(_)) => {
			debug!("Readiness hook of {id} was cleared before the player API became ready.");
			return;
		}
		Err(_) => {
			warn!("Player API did not become ready within {load_timeout:?}, '{content_id}' is unavailable.");
			context.loader.clear_ready_hook(id);
			let mut state = shared.state.lock();
			if state.status == SessionStatus::Loading {
				state.status = SessionStatus::PlayerUnavailable;
			}
			return;
		}
	}

	let (state_changes, mut notifications) = mpsc::unbounded_channel::<PlayerState>();
	{
		let mut state = shared.state.lock();
		if state.status != SessionStatus::Loading {
			return;
		}

		let embed_api = context.loader.embed_api().clone();
		let lease = context.players.acquire(&content_id, || {
			embed_api.create_player(&content_id, state_changes)
		});
		if !lease.constructed() {
			warn!("'{content_id}' already has a live player, {id} will not receive its state changes.");
		}

		let target = SamplingTarget {
			content_id: content_id.clone(),
			user,
			player: lease.player().clone(),
			time_hub: context.time_hub.clone(),
			history: shared.history.clone(),
		};
		state.sampling = Some(SamplingController::new(target, context.configuration.sampling_interval));
		state.player = Some(lease);
		state.status = SessionStatus::Ready;
	}
	info!("Player for '{content_id}' is ready.");

	while let Some(player_state) = notifications.recv().await {
		debug!("{id} received player state {player_state:?}.");
		let mut state = shared.state.lock();
		if let Some(sampling) = state.sampling.as_mut() {
			sampling.handle_state_change(player_state);
		}
	}

	debug!("Player of {id} stopped reporting state changes.");
	if let Some(sampling) = shared.state.lock().sampling.as_mut() {
		sampling.stop();
	}
}
