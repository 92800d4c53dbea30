//! Column defaults against MySQL and PostgreSQL servers
//!
//! Requires Docker; run with `--features integration-tests`.
//!
//! ## Test Categories
//!
//! - **MySQL strict mode**: implicit empty values versus insert errors
//! - **PostgreSQL literals**: casts, quoting and escapes as `pg_get_expr` renders them
//! - **PostgreSQL domains**: defaults on columns whose types are overridden by domains in another schema

#![cfg(feature = "integration-tests")]

use reinhardt_defaults_backends::{
	ColumnDefinition, ConnectionConfig, SchemaConnection, TableDefinition, connect,
};
use reinhardt_defaults_core::{DefaultValue, Dialect, NormalizedDefault, Record, SqlType};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use rstest::*;
use serial_test::serial;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

async fn host_port(container: &ContainerAsync<GenericImage>, port: u16, name: &str) -> u16 {
	// Wait briefly before first port query to ensure container networking is ready
	tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;

	let mut retry = 0;
	let max_retries = 7;
	loop {
		match container.get_host_port_ipv4(port).await {
			Ok(p) => break p,
			Err(e) if retry < max_retries => {
				retry += 1;
				eprintln!(
					"{} port query attempt {} of {} failed: {:?}",
					name, retry, max_retries, e
				);
				tokio::time::sleep(tokio::time::Duration::from_millis(200 * 2_u64.pow(retry)))
					.await;
			}
			Err(e) => panic!("Failed to get {} port after {} retries: {}", name, max_retries, e),
		}
	}
}

/// Connect with retries while the server finishes starting
async fn connect_with_retry(config: &ConnectionConfig) -> Arc<dyn SchemaConnection> {
	let mut retry = 0;
	let max_retries = 7;
	loop {
		match connect(config).await {
			Ok(connection) => break connection,
			Err(e) if retry < max_retries => {
				retry += 1;
				eprintln!(
					"Connection attempt {} of {} failed: {}",
					retry, max_retries, e
				);
				tokio::time::sleep(tokio::time::Duration::from_millis(200 * 2_u64.pow(retry)))
					.await;
			}
			Err(e) => panic!("Failed to connect after {} retries: {}", max_retries, e),
		}
	}
}

#[fixture]
async fn mysql_server() -> (ContainerAsync<GenericImage>, ConnectionConfig) {
	let container = GenericImage::new("mysql", "8.0")
		.with_exposed_port(3306.tcp())
		.with_wait_for(WaitFor::message_on_stderr(
			"port: 3306  MySQL Community Server",
		))
		.with_startup_timeout(std::time::Duration::from_secs(120))
		.with_env_var("MYSQL_ROOT_PASSWORD", "test")
		.with_env_var("MYSQL_DATABASE", "test_db")
		.start()
		.await
		.expect("Failed to start MySQL container");

	let port = host_port(&container, 3306, "MySQL").await;
	let config = ConnectionConfig::mysql("test_db", "root", "test", "localhost", port);
	(container, config)
}

#[fixture]
async fn postgres_server() -> (ContainerAsync<GenericImage>, ConnectionConfig) {
	let container = GenericImage::new("postgres", "16-alpine")
		.with_exposed_port(5432.tcp())
		.with_wait_for(WaitFor::message_on_stderr(
			"database system is ready to accept connections",
		))
		.with_startup_timeout(std::time::Duration::from_secs(120))
		.with_env_var("POSTGRES_HOST_AUTH_METHOD", "trust")
		.start()
		.await
		.expect("Failed to start PostgreSQL container");

	let port = host_port(&container, 5432, "PostgreSQL").await;
	let config = ConnectionConfig {
		password: None,
		..ConnectionConfig::postgresql("postgres", "postgres", "", "localhost", port)
	}
	.with_option("sslmode", "disable");
	(container, config)
}

fn text_table() -> TableDefinition {
	TableDefinition::new("texts")
		.column(ColumnDefinition::new("id", SqlType::Integer).default_value(1))
		.column(ColumnDefinition::new("non_null_text", SqlType::Text).not_null())
		.column(ColumnDefinition::new("non_null_blob", SqlType::Blob).not_null())
}

// ============================================================================
// MySQL strict mode
// ============================================================================

/// Test: a non-strict session reports and stores empty text and blob values
/// Category: MySQL strict mode
#[rstest]
#[tokio::test]
#[serial(mysql)]
async fn test_mysql_non_strict_text_defaults(
	#[future] mysql_server: (ContainerAsync<GenericImage>, ConnectionConfig),
) {
	// Arrange
	let (_container, config) = mysql_server.await;
	let connection = connect_with_retry(&config.with_strict(false)).await;
	connection.create_table(&text_table()).await.unwrap();

	// Act
	let columns = connection.table_columns("texts").await.unwrap();
	connection.insert("texts", &Record::default()).await.unwrap();
	let rows = connection.fetch_all("texts").await.unwrap();

	// Assert
	assert_eq!(connection.dialect(), Dialect::MySql);
	assert_eq!(
		columns.get("non_null_text").unwrap().default(),
		&NormalizedDefault::Literal(DefaultValue::from(""))
	);
	assert_eq!(rows[0].get("non_null_text"), Some(&DefaultValue::from("")));
	assert_eq!(
		rows[0].get("non_null_blob"),
		Some(&DefaultValue::Blob(Vec::new()))
	);
}

/// Test: a strict session reports no default and refuses the insert
/// Category: MySQL strict mode
#[rstest]
#[tokio::test]
#[serial(mysql)]
async fn test_mysql_strict_text_defaults(
	#[future] mysql_server: (ContainerAsync<GenericImage>, ConnectionConfig),
) {
	// Arrange
	let (_container, config) = mysql_server.await;
	let connection = connect_with_retry(&config.with_strict(true)).await;
	connection.create_table(&text_table()).await.unwrap();

	// Act
	let columns = connection.table_columns("texts").await.unwrap();
	let err = connection
		.insert("texts", &Record::default())
		.await
		.unwrap_err();

	// Assert
	assert_eq!(
		columns.get("non_null_text").unwrap().default(),
		&NormalizedDefault::NullDefault
	);
	assert!(
		err.to_string()
			.contains("Field 'non_null_text' doesn't have a default value"),
		"{}",
		err
	);
}

/// Test: integer defaults keep their sign and raw form
/// Category: MySQL strict mode
#[rstest]
#[tokio::test]
#[serial(mysql)]
async fn test_mysql_integer_defaults(
	#[future] mysql_server: (ContainerAsync<GenericImage>, ConnectionConfig),
) {
	// Arrange
	let (_container, config) = mysql_server.await;
	let connection = connect_with_retry(&config).await;
	connection
		.create_table(
			&TableDefinition::new("numbers")
				.column(ColumnDefinition::new("zero", SqlType::Integer).default_value(0))
				.column(
					ColumnDefinition::new("negative_integer", SqlType::Integer).default_value(-1),
				),
		)
		.await
		.unwrap();

	// Act
	let columns = connection.table_columns("numbers").await.unwrap();

	// Assert
	assert_eq!(columns.get("zero").unwrap().default_before_type_cast(), Some("0"));
	let negative = columns.get("negative_integer").unwrap();
	assert_eq!(negative.default_before_type_cast(), Some("-1"));
	assert_eq!(
		negative.default(),
		&NormalizedDefault::Literal(DefaultValue::Integer(-1))
	);
}

// ============================================================================
// PostgreSQL literals
// ============================================================================

/// Test: quoted, cast and escaped literals normalize to their text
/// Category: PostgreSQL literals
#[rstest]
#[tokio::test]
#[serial(postgres)]
async fn test_postgres_literal_defaults(
	#[future] postgres_server: (ContainerAsync<GenericImage>, ConnectionConfig),
) {
	// Arrange
	let (_container, config) = postgres_server.await;
	let connection = connect_with_retry(&config).await;
	connection
		.create_table(
			&TableDefinition::new("defaults")
				.column(
					ColumnDefinition::new("char1", SqlType::String)
						.default_expression("'foo''::bar'"),
				)
				.column(
					ColumnDefinition::new("multiline", SqlType::Text)
						.default_expression("'--- []\n\n'"),
				)
				.column(
					ColumnDefinition::new("negative_integer", SqlType::Integer).default_value(-1),
				)
				.column(
					ColumnDefinition::new("created_at", SqlType::DateTime)
						.default_expression("now()"),
				),
		)
		.await
		.unwrap();

	// Act
	let columns = connection.table_columns("defaults").await.unwrap();
	connection.insert("defaults", &Record::default()).await.unwrap();
	let rows = connection.fetch_all("defaults").await.unwrap();

	// Assert
	assert_eq!(
		columns.get("char1").unwrap().default(),
		&NormalizedDefault::Literal(DefaultValue::from("foo'::bar"))
	);
	assert_eq!(
		columns.get("multiline").unwrap().default(),
		&NormalizedDefault::Literal(DefaultValue::from("--- []\n\n"))
	);
	assert_eq!(
		columns.get("negative_integer").unwrap().default_before_type_cast(),
		Some("-1")
	);
	assert_eq!(columns.get("created_at").unwrap().default_function(), Some("now()"));
	assert_eq!(rows[0].get("char1"), Some(&DefaultValue::from("foo'::bar")));
	assert_eq!(rows[0].get("negative_integer"), Some(&DefaultValue::Integer(-1)));
}

/// Test: altering a default is visible on the next metadata reload
/// Category: PostgreSQL literals
#[rstest]
#[tokio::test]
#[serial(postgres)]
async fn test_postgres_alter_default(
	#[future] postgres_server: (ContainerAsync<GenericImage>, ConnectionConfig),
) {
	// Arrange
	let (_container, config) = postgres_server.await;
	let connection = connect_with_retry(&config).await;
	connection
		.create_table(
			&TableDefinition::new("people")
				.column(ColumnDefinition::new("surname", SqlType::String).default_value("Smith")),
		)
		.await
		.unwrap();

	// Act
	connection
		.alter_column_default("people", "surname", Some("'O''Connor'"))
		.await
		.unwrap();
	let columns = connection.table_columns("people").await.unwrap();

	// Assert
	assert_eq!(
		columns.get("surname").unwrap().default(),
		&NormalizedDefault::Literal(DefaultValue::from("O'Connor"))
	);
}

// ============================================================================
// PostgreSQL domains
// ============================================================================

/// Connect with `schema_1` first on the search path, its `text`, `varchar`
/// and `bpchar` domains shadowing the built-in types, and a `defaults` table
async fn domain_schema_connection(config: ConnectionConfig) -> Arc<dyn SchemaConnection> {
	let connection = connect_with_retry(&config.with_search_path("schema_1, pg_catalog")).await;
	for statement in [
		"CREATE SCHEMA schema_1",
		"CREATE DOMAIN schema_1.text AS text",
		"CREATE DOMAIN schema_1.varchar AS varchar",
		"CREATE DOMAIN schema_1.bpchar AS bpchar",
	] {
		connection.execute(statement).await.unwrap();
	}
	connection
		.create_table(
			&TableDefinition::new("defaults")
				.column(ColumnDefinition::new("text_col", SqlType::Text).default_value("some value"))
				.column(
					ColumnDefinition::new("string_col", SqlType::String).default_value("some value"),
				)
				.column(
					ColumnDefinition::new("decimal_col", SqlType::Decimal)
						.default_value(Decimal::from_str("3.14159265358979323846").unwrap()),
				),
		)
		.await
		.unwrap();
	connection
}

/// Test: text, string and decimal defaults read back through the domain schema
/// Category: PostgreSQL domains
#[rstest]
#[tokio::test]
#[serial(postgres)]
async fn test_postgres_domain_schema_defaults(
	#[future] postgres_server: (ContainerAsync<GenericImage>, ConnectionConfig),
) {
	// Arrange
	let (_container, config) = postgres_server.await;
	let connection = domain_schema_connection(config).await;

	// Act
	let record = connection.table_columns("defaults").await.unwrap().new_record();

	// Assert
	assert_eq!(record.get("text_col"), Some(&DefaultValue::from("some value")));
	assert_eq!(record.get("string_col"), Some(&DefaultValue::from("some value")));
	assert_eq!(
		record.get("decimal_col"),
		Some(&DefaultValue::Decimal(
			Decimal::from_str("3.14159265358979323846").unwrap()
		))
	);
}

/// Test: a bpchar column added with a raw statement reports its default
/// Category: PostgreSQL domains
#[rstest]
#[tokio::test]
#[serial(postgres)]
async fn test_postgres_domain_schema_bpchar_default(
	#[future] postgres_server: (ContainerAsync<GenericImage>, ConnectionConfig),
) {
	// Arrange
	let (_container, config) = postgres_server.await;
	let connection = domain_schema_connection(config).await;

	// Act
	connection
		.execute("ALTER TABLE defaults ADD bpchar_col bpchar DEFAULT 'some value'")
		.await
		.unwrap();
	let columns = connection.table_columns("defaults").await.unwrap();

	// Assert
	let bpchar = columns.get("bpchar_col").unwrap();
	assert_eq!(bpchar.sql_type(), &SqlType::Bpchar);
	assert_eq!(
		bpchar.default(),
		&NormalizedDefault::Literal(DefaultValue::from("some value"))
	);
}

/// Test: defaults set with schema-qualified casts and embedded `'::` read back as text
/// Category: PostgreSQL domains
#[rstest]
#[tokio::test]
#[serial(postgres)]
async fn test_postgres_domain_schema_altered_defaults(
	#[future] postgres_server: (ContainerAsync<GenericImage>, ConnectionConfig),
) {
	// Arrange
	let (_container, config) = postgres_server.await;
	let connection = domain_schema_connection(config).await;

	// Act
	connection
		.execute("ALTER TABLE defaults ALTER COLUMN text_col SET DEFAULT 'some text'::schema_1.text")
		.await
		.unwrap();
	connection
		.alter_column_default("defaults", "string_col", Some("'foo''::bar'"))
		.await
		.unwrap();
	let record = connection.table_columns("defaults").await.unwrap().new_record();

	// Assert
	assert_eq!(record.get("text_col"), Some(&DefaultValue::from("some text")));
	assert_eq!(record.get("string_col"), Some(&DefaultValue::from("foo'::bar")));
}
