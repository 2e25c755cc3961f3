//! Multi-file configuration loading.
//!
//! A file may `include` other files, which may include further files.
//! Relative include paths are resolved against the including file's
//! directory. Every top-level section must come from exactly one file, so an
//! include can never silently override a section declared elsewhere.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

type Pending<'a> = Pin<Box<dyn Future<Output = Result<(), ConfigError>> + Send + 'a>>;

/// Collects the sections of a file and everything it includes into one table.
#[derive(Default)]
pub(crate) struct ConfigLoader {
	/// Canonical paths already read
	visited: HashSet<PathBuf>,
	/// File that declared each section
	origins: HashMap<String, PathBuf>,
	merged: toml::Table,
}

impl ConfigLoader {
	/// Loads `path` with its includes, then parses and validates the result.
	pub(crate) async fn load(mut self, path: impl AsRef<Path>) -> Result<Config, ConfigError> {
		let path = locate(Path::new("."), path.as_ref())?;
		self.absorb(path).await?;

		let config: Config = toml::Value::Table(self.merged).try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Merges one file's sections, then recurses into its includes.
	fn absorb(&mut self, path: PathBuf) -> Pending<'_> {
		Box::pin(async move {
			let canonical = tokio::fs::canonicalize(&path).await.map_err(|e| {
				ConfigError::Io(std::io::Error::new(
					e.kind(),
					format!("Cannot resolve path {}: {}", path.display(), e),
				))
			})?;
			if !self.visited.insert(canonical.clone()) {
				return Err(ConfigError::Validation(format!(
					"Circular include: {} is included more than once",
					canonical.display()
				)));
			}

			let text = resolve_env_vars(&tokio::fs::read_to_string(&path).await?)?;
			let mut table: toml::Table = toml::from_str(&text)?;
			let includes = match table.remove("include") {
				Some(value) => include_paths(value)?,
				None => Vec::new(),
			};

			for (section, value) in table {
				if let Some(first) = self.origins.get(&section) {
					return Err(ConfigError::Validation(format!(
						"Duplicate section '{}' in {} (already declared in {})",
						section,
						path.display(),
						first.display()
					)));
				}
				self.origins.insert(section.clone(), path.clone());
				self.merged.insert(section, value);
			}

			let dir = path.parent().unwrap_or_else(|| Path::new("."));
			for include in includes {
				let next = locate(dir, &include)?;
				self.absorb(next).await?;
			}
			Ok(())
		})
	}
}

/// Resolves `path` against `dir` unless absolute, and checks that it exists.
fn locate(dir: &Path, path: &Path) -> Result<PathBuf, ConfigError> {
	let resolved = if path.is_absolute() {
		path.to_path_buf()
	} else {
		dir.join(path)
	};
	if !resolved.is_file() {
		return Err(ConfigError::Io(std::io::Error::new(
			std::io::ErrorKind::NotFound,
			format!("Configuration file not found: {}", resolved.display()),
		)));
	}
	Ok(resolved)
}

/// Reads an `include` value: one path or an array of paths.
fn include_paths(value: toml::Value) -> Result<Vec<PathBuf>, ConfigError> {
	match value {
		toml::Value::String(path) => Ok(vec![PathBuf::from(path)]),
		toml::Value::Array(items) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				other => Err(ConfigError::Validation(format!(
					"include entries must be strings, got {}",
					other.type_str()
				))),
			})
			.collect(),
		other => Err(ConfigError::Validation(format!(
			"include must be a string or an array of strings, got {}",
			other.type_str()
		))),
	}
}
