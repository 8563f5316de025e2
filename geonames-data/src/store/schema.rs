use rusqlite::{Connection, Error as SqliteError, OptionalExtension, Transaction};
use thiserror::Error;

/// Version recorded in `geonames_schema_version` by this build.
pub const SCHEMA_VERSION: i64 = 1;

const PLACE_COLUMNS: &str = "
    latitude REAL,
    longitude REAL,
    timezone_id TEXT,
    population INTEGER,
    elevation INTEGER,
    dem INTEGER,
    feature_code TEXT,
    synced_at TEXT";

/// Create the entity tables inside `connection` and record the schema
/// version.
///
/// Existing databases must already carry [`SCHEMA_VERSION`]; any other
/// version is rejected so migrations can be applied explicitly.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use geonames_data::store::{SCHEMA_VERSION, initialise_schema};
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// initialise_schema(&mut conn).expect("create schema");
/// initialise_schema(&mut conn).expect("schema creation is repeatable");
///
/// let version: i64 = conn
///     .query_row("SELECT version FROM geonames_schema_version", [], |row| row.get(0))
///     .expect("read schema version");
/// assert_eq!(version, SCHEMA_VERSION);
/// ```
pub fn initialise_schema(connection: &mut Connection) -> Result<(), StoreSchemaError> {
    let transaction = connection
        .transaction()
        .map_err(|source| StoreSchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_place_tables(&transaction)?;
    create_translations(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| StoreSchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_place_tables(transaction: &Transaction<'_>) -> Result<(), StoreSchemaError> {
    run_migration_step(
        transaction,
        "create continents",
        &format!(
            "CREATE TABLE IF NOT EXISTS continents (
                geoname_id INTEGER PRIMARY KEY,
                code TEXT NOT NULL,
                name TEXT NOT NULL,{PLACE_COLUMNS}
            )"
        ),
    )?;
    run_migration_step(
        transaction,
        "create countries",
        &format!(
            "CREATE TABLE IF NOT EXISTS countries (
                geoname_id INTEGER PRIMARY KEY,
                code TEXT NOT NULL,
                iso3 TEXT NOT NULL,
                iso_numeric INTEGER,
                name TEXT NOT NULL,
                name_official TEXT,
                continent_id INTEGER,
                capital TEXT,
                currency_code TEXT,
                currency_name TEXT,
                tld TEXT,
                phone_code TEXT,
                postal_code_format TEXT,
                postal_code_regex TEXT,
                languages TEXT,
                neighbours TEXT,
                area REAL,
                fips TEXT,{PLACE_COLUMNS}
            )"
        ),
    )?;
    run_migration_step(
        transaction,
        "create divisions",
        &format!(
            "CREATE TABLE IF NOT EXISTS divisions (
                geoname_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                name_official TEXT NOT NULL,
                country_code TEXT NOT NULL,
                admin1_code TEXT,{PLACE_COLUMNS}
            )"
        ),
    )?;
    run_migration_step(
        transaction,
        "create cities",
        &format!(
            "CREATE TABLE IF NOT EXISTS cities (
                geoname_id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                name_official TEXT NOT NULL,
                country_code TEXT NOT NULL,
                admin1_code TEXT,
                admin2_code TEXT,{PLACE_COLUMNS}
            )"
        ),
    )?;
    run_migration_step(
        transaction,
        "index countries",
        "CREATE INDEX IF NOT EXISTS idx_countries_code ON countries(code)",
    )?;
    run_migration_step(
        transaction,
        "index cities",
        "CREATE INDEX IF NOT EXISTS idx_cities_country ON cities(country_code, admin1_code)",
    )
}

fn create_translations(transaction: &Transaction<'_>) -> Result<(), StoreSchemaError> {
    run_migration_step(
        transaction,
        "create translations",
        "CREATE TABLE IF NOT EXISTS translations (
            alternate_name_id INTEGER PRIMARY KEY,
            geoname_id INTEGER NOT NULL,
            language TEXT NOT NULL,
            name TEXT NOT NULL,
            is_preferred INTEGER NOT NULL DEFAULT 0,
            is_short INTEGER NOT NULL DEFAULT 0,
            is_colloquial INTEGER NOT NULL DEFAULT 0,
            is_historic INTEGER NOT NULL DEFAULT 0
        )",
    )?;
    run_migration_step(
        transaction,
        "index translations",
        "CREATE INDEX IF NOT EXISTS idx_translations_geoname
            ON translations(geoname_id, language)",
    )
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), StoreSchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS geonames_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM geonames_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| StoreSchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(found) => Err(StoreSchemaError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        }),
        None => transaction
            .execute(
                "INSERT INTO geonames_schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(|source| StoreSchemaError::Migration {
                step: "record schema version",
                source,
            }),
    }
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreSchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreSchemaError::Migration { step, source })
}

/// Errors raised when initialising the store schema.
#[derive(Debug, Error)]
pub enum StoreSchemaError {
    #[error("failed to execute migration step '{step}'")]
    Migration {
        step: &'static str,
        #[source]
        source: SqliteError,
    },
    #[error(
        "expected geonames schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch { expected: i64, found: i64 },
}
