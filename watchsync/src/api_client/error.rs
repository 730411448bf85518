use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
	#[error("Invalid backend URL '{url}': {reason}")]
	InvalidUrl { url: String, reason: String },
	#[error("Request to the backend failed: {0}")]
	Request(#[from] reqwest::Error),
	#[error("Backend responded with status {0}")]
	Status(StatusCode),
}
