use crate::api_client::error::ApiError;
use crate::configuration::ConfigurationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchsyncError {
	#[error("Failed to load configuration: {0}")]
	Configuration(#[from] ConfigurationError),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Backend request failed: {0}")]
	Api(#[from] ApiError),
	#[error("Invalid JSON: {0}")]
	Json(#[from] serde_json::Error),
}
