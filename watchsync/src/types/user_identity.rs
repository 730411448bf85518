use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The signed in user as handed over by the authentication layer.
///
/// The backend receives this verbatim, so its shape is owned by the identity provider and kept opaque here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(Value);

impl From<Value> for UserIdentity {
	fn from(value: Value) -> Self {
		Self(value)
	}
}

impl UserIdentity {
	pub fn anonymous() -> Self {
		Self(Value::Null)
	}

	pub fn is_anonymous(&self) -> bool {
		self.0.is_null()
	}
}
