use crate::api_client::ApiClient;
use crate::configuration::Configuration;
use crate::context::ApplicationContext;
use crate::error::WatchsyncError;
use crate::player::simulated::{SimulatedEmbedApi, SimulatedPlayer};
use crate::player::{PlayerState, PlayerStateError};
use crate::session::PlaybackSession;
use crate::time_hub::TimeHub;
use crate::types::content_id::ContentId;
use crate::types::user_identity::UserIdentity;
use crate::utils::aborting_join_handle::AbortingJoinHandle;
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PLAYER_COMMANDS: &str = "Commands: play, pause, seek <seconds>, buffer, end, state <code>, status, quit";

#[derive(clap::Parser)]
pub struct Commandline {
	#[arg(short = 'c', long = "config-file", default_value = "configuration.toml")]
	pub configuration_file_path: String,
	#[command(subcommand)]
	pub command: BaseCommand,
}

#[derive(clap::Subcommand)]
pub enum BaseCommand {
	/// Watch a video on the simulated player, controlled from stdin
	Run {
		/// Content id of the video
		#[arg(long)]
		video: String,
		/// The signed in user as JSON, passed to the backend verbatim
		#[arg(long)]
		user: Option<String>,
		/// How long the simulated player script takes to load
		#[arg(long, default_value_t = 200)]
		load_delay_ms: u64,
	},
	/// Ask the backend to summarize a video
	Summarize {
		/// Content id of the video
		#[arg(long)]
		video: String,
		/// The signed in user as JSON, passed to the backend verbatim
		#[arg(long)]
		user: Option<String>,
		/// JSON file containing the conversation so far
		#[arg(long)]
		conversation: Option<PathBuf>,
	},
	/// Print the configuration
	Configuration,
}

impl Commandline {
	pub async fn run(self) -> Result<(), WatchsyncError> {
		let configuration = Configuration::from_file(&self.configuration_file_path)?;

		tracing_subscriber::fmt()
			.with_env_filter(EnvFilter::new(&configuration.log_filters))
			.with_writer(std::io::stderr)
			.init();

		match self.command {
			BaseCommand::Run {
				video,
				user,
				load_delay_ms,
			} => {
				let user = parse_user(user.as_deref())?;
				let load_delay = Duration::from_millis(load_delay_ms);
				run_simulated_session(configuration, ContentId::from(video), user, load_delay).await?;
			}
			BaseCommand::Summarize {
				video,
				user,
				conversation,
			} => {
				let user = parse_user(user.as_deref())?;
				let conversation = match conversation {
					Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
					None => Value::Array(Vec::new()),
				};
				let summary = ApiClient::new(&configuration)?
					.summarize(&ContentId::from(video), &user, &conversation)
					.await?;
				println!("{summary}");
			}
			BaseCommand::Configuration => println!("{configuration:#?}"),
		}
		Ok(())
	}
}

fn parse_user(user: Option<&str>) -> Result<UserIdentity, serde_json::Error> {
	match user {
		Some(json) => serde_json::from_str::<Value>(json).map(UserIdentity::from),
		None => Ok(UserIdentity::anonymous()),
	}
}

async fn run_simulated_session(
	configuration: Configuration,
	content_id: ContentId,
	user: UserIdentity,
	load_delay: Duration,
) -> Result<(), WatchsyncError> {
	let api_client = ApiClient::new(&configuration)?;
	let embed_api = Arc::new(SimulatedEmbedApi::loading_after(load_delay));
	let context = ApplicationContext::new(configuration, embed_api.clone(), Arc::new(api_client));

	if user.is_anonymous() {
		warn!("No user given, watch history will be saved without one.");
	}
	let mut session = PlaybackSession::mount(&context, content_id.clone(), user);
	let _transcript = follow_transcript_position(&context.time_hub);

	println!("{PLAYER_COMMANDS}");
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	while let Some(line) = lines.next_line().await? {
		if line.trim().is_empty() {
			continue;
		}

		let command = match line.parse::<PlayerCommand>() {
			Ok(command) => command,
			Err(error) => {
				println!("{error} {PLAYER_COMMANDS}");
				continue;
			}
		};
		match command {
			PlayerCommand::Quit => break,
			PlayerCommand::Status => print_status(&session, &context.time_hub),
			command => match embed_api.player(&content_id) {
				Some(player) => command.apply(&player),
				None => println!("The player is not ready yet ({:?}).", session.status()),
			},
		}
	}

	session.teardown();
	Ok(())
}

fn print_status(session: &PlaybackSession, time_hub: &TimeHub) {
	println!(
		"{} '{}': {:?}, player: {}, sampling: {}, pending history write: {}, position: {:.1}s",
		session.id(),
		session.content_id(),
		session.status(),
		session.has_player(),
		session.is_sampling(),
		session.has_pending_write(),
		time_hub.get(),
	);
}

/// Stands in for the transcript highlighter by logging every position it would highlight.
fn follow_transcript_position(time_hub: &TimeHub) -> AbortingJoinHandle<()> {
	let mut positions = time_hub.subscribe();
	tokio::spawn(async move {
		while positions.changed().await.is_ok() {
			let position = *positions.borrow_and_update();
			info!("Transcript position: {position:.1}s");
		}
	})
	.into()
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum PlayerCommand {
	Play,
	Pause,
	Seek(Duration),
	Buffer,
	End,
	State(PlayerState),
	Status,
	Quit,
}

#[derive(Error, Debug, PartialEq)]
enum PlayerCommandError {
	#[error("Unknown command '{0}'.")]
	Unknown(String),
	#[error("Expected a non-negative position in seconds, got '{0}'.")]
	InvalidPosition(String),
	#[error("Expected a numeric state code, got '{0}'.")]
	InvalidStateCode(String),
	#[error(transparent)]
	State(#[from] PlayerStateError),
}

impl FromStr for PlayerCommand {
	type Err = PlayerCommandError;

	fn from_str(line: &str) -> Result<Self, Self::Err> {
		use PlayerCommand::*;

		let mut words = line.split_whitespace();
		let command = match (words.next(), words.next(), words.next()) {
			(Some("play"), None, None) => Play,
			(Some("pause"), None, None) => Pause,
			(Some("buffer"), None, None) => Buffer,
			(Some("end"), None, None) => End,
			(Some("status"), None, None) => Status,
			(Some("quit"), None, None) => Quit,
			(Some("seek"), Some(seconds), None) => seconds
				.parse::<f64>()
				.ok()
				.filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
				.map(|seconds| Seek(Duration::from_secs_f64(seconds)))
				.ok_or_else(|| PlayerCommandError::InvalidPosition(seconds.to_string()))?,
			(Some("state"), Some(code), None) => {
				let code = code
					.parse::<i8>()
					.map_err(|_| PlayerCommandError::InvalidStateCode(code.to_string()))?;
				State(PlayerState::try_from(code)?)
			}
			_ => return Err(PlayerCommandError::Unknown(line.trim().to_string())),
		};
		Ok(command)
	}
}

impl PlayerCommand {
	fn apply(self, player: &SimulatedPlayer) {
		match self {
			PlayerCommand::Play => player.play(),
			PlayerCommand::Pause => player.pause(),
			PlayerCommand::Seek(position) => player.seek(position),
			PlayerCommand::Buffer => player.report(PlayerState::Buffering),
			PlayerCommand::End => player.report(PlayerState::Ended),
			PlayerCommand::State(state) => player.report(state),
			PlayerCommand::Status | PlayerCommand::Quit => {}
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use serde_json::json;

	#[test]
	fn should_parse_player_commands() {
		assert_eq!("play".parse::<PlayerCommand>(), Ok(PlayerCommand::Play));
		assert_eq!("  pause ".parse::<PlayerCommand>(), Ok(PlayerCommand::Pause));
		assert_eq!("buffer".parse::<PlayerCommand>(), Ok(PlayerCommand::Buffer));
		assert_eq!("end".parse::<PlayerCommand>(), Ok(PlayerCommand::End));
		assert_eq!("status".parse::<PlayerCommand>(), Ok(PlayerCommand::Status));
		assert_eq!("quit".parse::<PlayerCommand>(), Ok(PlayerCommand::Quit));
		assert_eq!("seek 12.5".parse::<PlayerCommand>(), Ok(PlayerCommand::Seek(Duration::from_millis(12_500))));
		assert_eq!("state 5".parse::<PlayerCommand>(), Ok(PlayerCommand::State(PlayerState::Cued)));
	}

	#[test]
	fn should_reject_malformed_player_commands() {
		assert_eq!(
			"rewind".parse::<PlayerCommand>(),
			Err(PlayerCommandError::Unknown("rewind".to_string()))
		);
		assert_eq!(
			"play now".parse::<PlayerCommand>(),
			Err(PlayerCommandError::Unknown("play now".to_string()))
		);
		assert_eq!(
			"seek -3".parse::<PlayerCommand>(),
			Err(PlayerCommandError::InvalidPosition("-3".to_string()))
		);
		assert_eq!(
			"seek soon".parse::<PlayerCommand>(),
			Err(PlayerCommandError::InvalidPosition("soon".to_string()))
		);
		assert_eq!(
			"state playing".parse::<PlayerCommand>(),
			Err(PlayerCommandError::InvalidStateCode("playing".to_string()))
		);
		assert_eq!(
			"state 4".parse::<PlayerCommand>(),
			Err(PlayerCommandError::State(PlayerStateError(4)))
		);
	}

	#[test]
	fn should_parse_the_user_as_json() {
		let user = parse_user(Some(r#"{"name": "Ferris"}"#)).expect("Failed to parse user");

		assert_eq!(user, UserIdentity::from(json!({"name": "Ferris"})));
	}

	#[test]
	fn missing_user_should_be_anonymous() {
		assert!(parse_user(None).expect("Failed to parse user").is_anonymous());
	}

	#[test]
	fn should_reject_a_user_that_is_not_json() {
		assert!(parse_user(Some("Ferris")).is_err());
	}
}
