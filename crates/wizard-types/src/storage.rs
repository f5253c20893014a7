//! Storage namespaces used by the wizard.

use std::str::FromStr;

/// Storage namespaces. Keys are stored as `<namespace>:<id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Wizard instances between requests.
	Sessions,
	/// Finalized orders.
	Orders,
}

impl StorageKey {
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Sessions => "sessions",
			StorageKey::Orders => "orders",
		}
	}

	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Sessions, Self::Orders].into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"sessions" => Ok(Self::Sessions),
			"orders" => Ok(Self::Orders),
			_ => Err(()),
		}
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
