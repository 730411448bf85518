use crate::configuration::Configuration;
use crate::history::HistoryWriter;
use crate::player::EmbedApi;
use crate::player::loader::PlayerLoader;
use crate::player::registry::PlayerRegistry;
use crate::session::session_id::SessionIdSequence;
use crate::time_hub::TimeHub;
use std::sync::Arc;

/// Process-wide state shared by every session.
#[derive(Clone)]
pub struct ApplicationContext {
	pub configuration: Configuration,
	pub time_hub: Arc<TimeHub>,
	pub loader: Arc<PlayerLoader>,
	pub players: Arc<PlayerRegistry>,
	pub history_writer: Arc<dyn HistoryWriter>,
	pub session_ids: Arc<SessionIdSequence>,
}

impl ApplicationContext {
	pub fn new(
		configuration: Configuration,
		embed_api: Arc<dyn EmbedApi>,
		history_writer: Arc<dyn HistoryWriter>,
	) -> ApplicationContext {
		Self {
			configuration,
			time_hub: Default::default(),
			loader: PlayerLoader::new(embed_api),
			players: Default::default(),
			history_writer,
			session_ids: Default::default(),
		}
	}
}
