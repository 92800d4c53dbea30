//! SQL dialects whose default reporting differs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Database dialect a column was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
	#[serde(alias = "mysql2")]
	MySql,
	MariaDb,
	#[serde(alias = "postgresql")]
	Postgres,
	Oracle,
	#[serde(alias = "sqlite3")]
	Sqlite,
}

impl Dialect {
	/// Whether the session strict-mode flag changes how defaults behave
	///
	/// Only the MySQL family silently coerces missing values when strict mode
	/// is off. Every other dialect always rejects them.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_defaults_core::Dialect;
	///
	/// assert!(Dialect::MySql.honors_strict_mode());
	/// assert!(Dialect::MariaDb.honors_strict_mode());
	/// assert!(!Dialect::Postgres.honors_strict_mode());
	/// ```
	pub fn honors_strict_mode(&self) -> bool {
		matches!(self, Dialect::MySql | Dialect::MariaDb)
	}

	pub fn name(&self) -> &'static str {
		match self {
			Dialect::MySql => "mysql",
			Dialect::MariaDb => "mariadb",
			Dialect::Postgres => "postgres",
			Dialect::Oracle => "oracle",
			Dialect::Sqlite => "sqlite",
		}
	}
}

impl fmt::Display for Dialect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Dialect {
	type Err = String;

	/// Parse a dialect from a short name or a backend path such as
	/// `reinhardt.db.backends.postgresql`
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let engine = s.rsplit('.').next().unwrap_or(s).to_ascii_lowercase();
		match engine.as_str() {
			"mysql" | "mysql2" => Ok(Dialect::MySql),
			"mariadb" => Ok(Dialect::MariaDb),
			"postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
			"oracle" => Ok(Dialect::Oracle),
			"sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
			_ => Err(format!("unknown dialect: {}", s)),
		}
	}
}
