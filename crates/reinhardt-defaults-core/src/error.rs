//! Error types for default value normalization

use thiserror::Error;

use crate::sql_type::SqlType;

/// Errors raised while interpreting a raw column default
///
/// These never escape [`crate::normalize`] or [`crate::resolve`], which fail
/// closed and report the column as having no default. Callers that need the
/// reason use [`crate::try_resolve`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefaultsError {
	/// The dialect's default expression could not be parsed
	#[error("malformed default expression {expression:?}: {reason}")]
	MalformedExpression { expression: String, reason: String },

	/// The parsed default text does not fit the column type
	#[error("cannot coerce {value:?} to {sql_type}: {reason}")]
	Coercion {
		value: String,
		sql_type: SqlType,
		reason: String,
	},
}

impl DefaultsError {
	pub(crate) fn malformed(expression: &str, reason: impl Into<String>) -> Self {
		Self::MalformedExpression {
			expression: expression.to_string(),
			reason: reason.into(),
		}
	}

	pub(crate) fn coercion(value: &str, sql_type: &SqlType, reason: impl ToString) -> Self {
		Self::Coercion {
			value: value.to_string(),
			sql_type: sql_type.clone(),
			reason: reason.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, DefaultsError>;
