//! Main entry point for the order wizard service.
//!
//! Loads the configuration, wires the configured storage and collaborator
//! implementations into a wizard engine, and serves the HTTP API until
//! interrupted.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use wizard_config::Config;
use wizard_core::{WizardBuilder, WizardEngine, WizardFactories};

mod apis;
mod server;

use wizard_clients::implementations::memory::create_client_lookup;
use wizard_legal::implementations::basic::create_signature;
use wizard_pricing::implementations::price_list::create_pricing;
use wizard_receipt::implementations::text::create_receipt;
use wizard_storage::implementations::file::create_storage as create_file_storage;
use wizard_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the wizard service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/wizard.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started wizard service");

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Config path is not valid UTF-8: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.wizard.id);

	let engine = Arc::new(build_engine(config.clone())?);
	let maintenance = engine.spawn_maintenance();

	match config.api.clone().filter(|api| api.enabled) {
		Some(api_config) => {
			tokio::select! {
				result = server::start_server(api_config, Arc::clone(&engine)) => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Shutdown requested");
				}
			}
		},
		None => {
			tracing::warn!("API disabled; only background maintenance is running");
			tokio::signal::ctrl_c().await?;
		},
	}

	maintenance.abort();
	tracing::info!("Stopped wizard service");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
    ($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
        let mut factories = std::collections::HashMap::new();
        $(
            factories.insert(
                $name.to_string(),
                $factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
            );
        )*
        factories
    }};
}

/// Builds the wizard engine with every known implementation available to
/// the configuration.
fn build_engine(config: Config) -> Result<WizardEngine, Box<dyn std::error::Error>> {
	let builder = WizardBuilder::new(config);

	let storage_factories = create_factory_map!(
		wizard_storage::StorageInterface,
		wizard_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	let pricing_factories = create_factory_map!(
		wizard_pricing::PricingInterface,
		wizard_pricing::PricingError,
		"price_list" => create_pricing,
	);

	let client_factories = create_factory_map!(
		wizard_clients::ClientLookupInterface,
		wizard_clients::ClientError,
		"memory" => create_client_lookup,
	);

	let legal_factories = create_factory_map!(
		wizard_legal::SignatureInterface,
		wizard_legal::LegalError,
		"basic" => create_signature,
	);

	let receipt_factories = create_factory_map!(
		wizard_receipt::ReceiptInterface,
		wizard_receipt::ReceiptError,
		"text" => create_receipt,
	);

	let factories = WizardFactories {
		storage_factories,
		pricing_factories,
		client_factories,
		legal_factories,
		receipt_factories,
	};

	Ok(builder.build(factories)?)
}
