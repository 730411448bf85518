use serde::{Deserialize, Serialize};

/// Identifier of a video at the provider, e.g. the slug of the watch page.
#[derive(
	derive_more::From,
	derive_more::Into,
	derive_more::Deref,
	derive_more::Display,
	Clone,
	Debug,
	PartialEq,
	Eq,
	Hash,
	PartialOrd,
	Ord,
	Serialize,
	Deserialize,
)]
#[serde(transparent)]
pub struct ContentId(String);

impl From<&str> for ContentId {
	fn from(id: &str) -> Self {
		Self(id.to_string())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn content_id_should_serialize_as_plain_string() {
		let content_id = ContentId::from("dQw4w9WgXcQ");

		let json = serde_json::to_string(&content_id).expect("Failed to serialize");

		assert_eq!(json, r#""dQw4w9WgXcQ""#);
	}
}
