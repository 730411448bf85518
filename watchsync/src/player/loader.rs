use crate::player::EmbedApi;
use crate::session::session_id::SessionId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Loads the embed API's script once per process and tells sessions when the API is ready.
///
/// Readiness hooks are kept per [`SessionId`], so sessions mounting and unmounting never overwrite each other's hook.
pub struct PlayerLoader {
	embed_api: Arc<dyn EmbedApi>,
	script_injected: AtomicBool,
	hooks: parking_lot::Mutex<ReadyHooks>,
}

#[derive(Default)]
struct ReadyHooks {
	api_ready: bool,
	by_session: BTreeMap<SessionId, oneshot::Sender<()>>,
}

/// Handed to the embed API so it can report that its script finished loading.
#[derive(Clone)]
pub struct ReadySignal(Weak<PlayerLoader>);

impl ReadySignal {
	pub fn signal(&self) {
		match self.0.upgrade() {
			Some(loader) => loader.signal_ready(),
			None => debug!("Player API became ready after its loader was dropped."),
		}
	}
}

impl PlayerLoader {
	pub fn new(embed_api: Arc<dyn EmbedApi>) -> Arc<Self> {
		Arc::new(Self {
			embed_api,
			script_injected: AtomicBool::new(false),
			hooks: Default::default(),
		})
	}

	pub fn embed_api(&self) -> &Arc<dyn EmbedApi> {
		&self.embed_api
	}

	/// Injects the embed script unless that already happened.
	pub fn ensure_loaded(self: &Arc<Self>) {
		if self
			.script_injected
			.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.is_err()
		{
			debug!("Player script was already injected.");
			return;
		}

		info!("Injecting player script.");
		self.embed_api.inject_script(ReadySignal(Arc::downgrade(self)));
	}

	/// Registers the readiness hook of a session. The returned receiver completes once the API is ready, right away
	/// if it already is, or errors if the hook gets cleared first.
	pub fn on_ready(&self, session_id: SessionId) -> oneshot::Receiver<()> {
		let (sender, receiver) = oneshot::channel();

		let mut hooks = self.hooks.lock();
		if hooks.api_ready {
			let _ = sender.send(());
		} else if hooks.by_session.insert(session_id, sender).is_some() {
			debug!("Replaced readiness hook of {session_id}.");
		}

		receiver
	}

	/// Called once the embed API is available. Fires and removes every registered hook.
	pub fn signal_ready(&self) {
		let hooks = {
			let mut hooks = self.hooks.lock();
			hooks.api_ready = true;
			std::mem::take(&mut hooks.by_session)
		};

		info!("Player API is ready, notifying {} session(s).", hooks.len());
		for (_, hook) in hooks {
			// The session may have given up on the player in the meantime.
			let _ = hook.send(());
		}
	}

	/// Removes the readiness hook of a session. Returns whether there was one.
	pub fn clear_ready_hook(&self, session_id: SessionId) -> bool {
		self.hooks.lock().by_session.remove(&session_id).is_some()
	}

	#[cfg(test)]
	pub fn has_ready_hook(&self, session_id: SessionId) -> bool {
		self.hooks.lock().by_session.contains_key(&session_id)
	}
}
