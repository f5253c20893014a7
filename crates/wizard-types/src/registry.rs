//! Registry trait for pluggable implementations.

/// Ties a pluggable implementation to its configuration name.
///
/// Storage backends and every collaborator implementation provide a
/// `Registry` struct implementing this trait, so the service can build a
/// name-to-factory map without hard-coding each implementation.
pub trait ImplementationRegistry {
	/// Key under `<section>.implementations` in the TOML configuration,
	/// e.g. `"memory"` for `storage.implementations.memory` or
	/// `"price_list"` for `pricing.implementations.price_list`.
	const NAME: &'static str;

	/// Factory function type of the component family.
	type Factory;

	fn factory() -> Self::Factory;
}
