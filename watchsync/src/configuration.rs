use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Configuration {
	/// Where `/dashboard/update_watch_history` and `/chat/summarize` live.
	pub api_base_url: String,
	pub log_filters: String,
	#[serde(with = "humantime_serde", default = "default_sampling_interval")]
	pub sampling_interval: Duration,
	#[serde(with = "humantime_serde", default = "default_history_debounce")]
	pub history_debounce: Duration,
	/// How long a session waits for the player API before giving up on it.
	#[serde(with = "humantime_serde")]
	pub player_load_timeout: Duration,
	#[serde(with = "humantime_serde")]
	pub request_timeout: Duration,
}

fn default_sampling_interval() -> Duration {
	Duration::from_millis(500)
}

fn default_history_debounce() -> Duration {
	Duration::from_secs(1)
}

impl Configuration {
	pub fn from_file(path: impl AsRef<Path>) -> Result<Configuration, ConfigurationError> {
		let text = read_to_string(path)?;

		Ok(Configuration::try_from(text.as_str())?)
	}
}

impl TryFrom<&str> for Configuration {
	type Error = toml::de::Error;

	fn try_from(text: &str) -> Result<Self, Self::Error> {
		toml::from_str(text)
	}
}

#[derive(Error, Debug)]
pub enum ConfigurationError {
	#[error("Failed to deserialize with error: {0}")]
	DeserializationError(#[from] toml::de::Error),
	#[error("IO operation failed: {0}")]
	IoError(#[from] std::io::Error),
}
