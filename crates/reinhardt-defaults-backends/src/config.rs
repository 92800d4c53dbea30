//! Connection configuration
//!
//! Mirrors the framework's `DatabaseConfig` settings entry, with the session
//! strict mode as an explicit field instead of global connection state.

use reinhardt_defaults_core::Dialect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::{BackendError, Result};

const MEMORY_ENGINE: &str = "reinhardt.db.backends.memory";

fn default_strict() -> bool {
	true
}

/// Database connection configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
	/// Database engine/backend
	pub engine: String,

	/// Database name or path
	pub name: String,

	#[serde(default)]
	pub user: Option<String>,

	#[serde(default)]
	pub password: Option<String>,

	#[serde(default)]
	pub host: Option<String>,

	#[serde(default)]
	pub port: Option<u16>,

	/// Session strict mode (MySQL `STRICT_ALL_TABLES`)
	#[serde(default = "default_strict")]
	pub strict: bool,

	/// PostgreSQL schema search path, applied to every pooled connection
	#[serde(default)]
	pub search_path: Option<String>,

	/// Additional options, appended to the URL as query parameters
	#[serde(default)]
	pub options: HashMap<String, String>,
}

impl ConnectionConfig {
	/// Create a SQLite configuration
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_defaults_backends::ConnectionConfig;
	///
	/// let config = ConnectionConfig::sqlite(":memory:");
	///
	/// assert_eq!(config.engine, "reinhardt.db.backends.sqlite3");
	/// assert_eq!(config.to_url(), "sqlite::memory:");
	/// ```
	pub fn sqlite(name: impl Into<String>) -> Self {
		Self {
			engine: "reinhardt.db.backends.sqlite3".to_string(),
			name: name.into(),
			user: None,
			password: None,
			host: None,
			port: None,
			strict: true,
			search_path: None,
			options: HashMap::new(),
		}
	}

	pub fn postgresql(
		name: impl Into<String>,
		user: impl Into<String>,
		password: impl Into<String>,
		host: impl Into<String>,
		port: u16,
	) -> Self {
		Self {
			engine: "reinhardt.db.backends.postgresql".to_string(),
			name: name.into(),
			user: Some(user.into()),
			password: Some(password.into()),
			host: Some(host.into()),
			port: Some(port),
			strict: true,
			search_path: None,
			options: HashMap::new(),
		}
	}

	pub fn mysql(
		name: impl Into<String>,
		user: impl Into<String>,
		password: impl Into<String>,
		host: impl Into<String>,
		port: u16,
	) -> Self {
		Self {
			engine: "reinhardt.db.backends.mysql".to_string(),
			..Self::postgresql(name, user, password, host, port)
		}
	}

	/// An in-process emulation of `dialect`
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_defaults_backends::ConnectionConfig;
	/// use reinhardt_defaults_core::Dialect;
	///
	/// let config = ConnectionConfig::in_memory(Dialect::Oracle);
	///
	/// assert!(config.is_in_memory());
	/// assert_eq!(config.dialect().unwrap(), Dialect::Oracle);
	/// ```
	pub fn in_memory(dialect: Dialect) -> Self {
		let mut options = HashMap::new();
		options.insert("dialect".to_string(), dialect.name().to_string());
		Self {
			engine: MEMORY_ENGINE.to_string(),
			name: "memory".to_string(),
			options,
			..Self::sqlite("memory")
		}
	}

	/// Toggle the session strict mode
	pub fn with_strict(mut self, strict: bool) -> Self {
		self.strict = strict;
		self
	}

	/// Set the schema search path, e.g. `"schema_1, pg_catalog"`
	pub fn with_search_path(mut self, search_path: impl Into<String>) -> Self {
		self.search_path = Some(search_path.into());
		self
	}

	pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.options.insert(key.into(), value.into());
		self
	}

	pub fn is_in_memory(&self) -> bool {
		self.engine == MEMORY_ENGINE
	}

	/// Dialect this configuration connects to
	pub fn dialect(&self) -> Result<Dialect> {
		if self.is_in_memory() {
			let name = self
				.options
				.get("dialect")
				.ok_or_else(|| BackendError::Config("in-memory engine requires a dialect option".into()))?;
			return Dialect::from_str(name).map_err(BackendError::Config);
		}
		Dialect::from_str(&self.engine).map_err(|_| BackendError::UnsupportedEngine(self.engine.clone()))
	}

	/// Parse a configuration from TOML
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_defaults_backends::ConnectionConfig;
	///
	/// let config = ConnectionConfig::from_toml_str(
	///     r#"
	///     engine = "reinhardt.db.backends.mysql"
	///     name = "defaults_test"
	///     user = "root"
	///     host = "127.0.0.1"
	///     port = 3306
	///     strict = false
	///     "#,
	/// )
	/// .unwrap();
	///
	/// assert!(!config.strict);
	/// assert_eq!(config.to_url(), "mysql://root@127.0.0.1:3306/defaults_test");
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self> {
		Ok(toml::from_str(source)?)
	}

	/// Convert to a connection URL
	pub fn to_url(&self) -> String {
		let scheme = match self.dialect() {
			Ok(Dialect::Postgres) => "postgresql",
			Ok(Dialect::MySql) | Ok(Dialect::MariaDb) => "mysql",
			_ => "sqlite",
		};

		if scheme == "sqlite" {
			if self.name == ":memory:" {
				return "sqlite::memory:".to_string();
			}
			if std::path::Path::new(&self.name).is_absolute() {
				return format!("sqlite://{}", self.name);
			}
			return format!("sqlite:{}", self.name);
		}

		let mut url = format!("{}://", scheme);
		if let Some(user) = &self.user {
			url.push_str(&urlencoding::encode(user));
			if let Some(password) = &self.password {
				url.push(':');
				url.push_str(&urlencoding::encode(password));
			}
			url.push('@');
		}
		url.push_str(self.host.as_deref().unwrap_or("localhost"));
		if let Some(port) = self.port {
			url.push(':');
			url.push_str(&port.to_string());
		}
		url.push('/');
		url.push_str(&urlencoding::encode(&self.name));

		if !self.options.is_empty() {
			let mut query: Vec<String> = self
				.options
				.iter()
				.map(|(key, value)| {
					format!("{}={}", urlencoding::encode(key), urlencoding::encode(value))
				})
				.collect();
			query.sort();
			url.push('?');
			url.push_str(&query.join("&"));
		}

		url
	}
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self::sqlite(":memory:")
	}
}
