//! Multi-file configuration loading.
//!
//! Any loaded file may declare `include = "file.toml"` or
//! `include = ["a.toml", "b.toml"]`; paths are relative to the loader's base
//! directory. Includes are followed depth first, in declaration order. Loading the same file twice
//! (directly or through a cycle) and defining the same top-level section in
//! two files are both errors.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

pub struct ConfigLoader {
	base_path: PathBuf,
	/// Canonical paths already read.
	loaded_files: HashSet<PathBuf>,
	/// Top-level section name to the file that defined it.
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads `config_path` and everything it includes into one validated `Config`.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let mut combined = toml::map::Map::new();
		let mut pending = vec![self.resolve_path(config_path)?];

		while let Some(path) = pending.pop() {
			let includes = self.merge_file(&path, &mut combined).await?;
			for include in includes.iter().rev() {
				pending.push(self.resolve_path(include)?);
			}
		}

		tracing::debug!(
			files = self.loaded_files.len(),
			sections = combined.len(),
			"Configuration files merged"
		);

		let rendered = toml::to_string(&toml::Value::Table(combined)).map_err(|e| {
			ConfigError::Parse(format!("Failed to serialize combined config: {}", e))
		})?;
		rendered.parse()
	}

	/// Moves the sections of one file into `combined` and returns its includes.
	async fn merge_file(
		&mut self,
		path: &Path,
		combined: &mut toml::map::Map<String, toml::Value>,
	) -> Result<Vec<PathBuf>, ConfigError> {
		let content = self.load_file(path).await?;
		let mut table = match toml::from_str::<toml::Value>(&content)? {
			toml::Value::Table(table) => table,
			_ => return Err(ConfigError::Parse(format!("{} is not a table", path.display()))),
		};

		let includes = match table.remove("include") {
			Some(value) => Self::include_paths(&value)?,
			None => Vec::new(),
		};

		for (section, value) in table {
			if let Some(existing) = self.section_sources.get(&section) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					section,
					existing.display(),
					path.display()
				)));
			}
			self.section_sources.insert(section.clone(), path.to_path_buf());
			combined.insert(section, value);
		}

		Ok(includes)
	}

	async fn load_file(&mut self, path: &Path) -> Result<String, ConfigError> {
		let canonical = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		resolve_env_vars(&content)
	}

	fn include_paths(value: &toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
		match value {
			toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
			toml::Value::Array(items) => items
				.iter()
				.map(|item| {
					item.as_str().map(PathBuf::from).ok_or_else(|| {
						ConfigError::Validation("Include array must contain only strings".into())
					})
				})
				.collect(),
			_ => Err(ConfigError::Validation(
				"Include must be a string or array of strings".into(),
			)),
		}
	}

	fn resolve_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
		let path = path.as_ref();
		let resolved = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.base_path.join(path)
		};

		if !resolved.exists() {
			return Err(ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Configuration file not found: {}", resolved.display()),
			)));
		}
		Ok(resolved)
	}
}
