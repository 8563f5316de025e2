use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;
use geonames_core::{
    CityAttributes, ContinentAttributes, CountryAttributes, DivisionAttributes, EntityAttributes,
    EntityClass, ExternalId, GeoStore, PersistenceError, PersistenceOperation, PlaceDetails,
    TranslationAttributes,
};
use log::debug;
use rusqlite::{Connection, Error as SqliteError, params};
use thiserror::Error;

use super::schema::{StoreSchemaError, initialise_schema};

/// Errors raised by [`SqliteGeoStore`].
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    #[error("failed to create directory for {path}: {source}")]
    CreateDir {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to open SQLite database at {path}: {source}")]
    Open {
        path: Utf8PathBuf,
        #[source]
        source: SqliteError,
    },
    #[error(transparent)]
    Schema(#[from] StoreSchemaError),
    #[error("identifier {id} exceeds SQLite i64 range")]
    IdOutOfRange { id: ExternalId },
    #[error("{column} value {value} exceeds SQLite i64 range")]
    ValueOutOfRange { column: &'static str, value: u64 },
    #[error("failed to {operation}: {source}")]
    Sqlite {
        operation: &'static str,
        #[source]
        source: SqliteError,
    },
}

/// [`GeoStore`] writing one SQLite table per entity class.
///
/// Writes are grouped into transactions of at most `batch_size` statements.
/// A batch is committed when it fills up and whenever [`GeoStore::flush`] is
/// called; an interrupted run keeps every committed batch.
#[derive(Debug)]
pub struct SqliteGeoStore {
    connection: Connection,
    batch_size: usize,
    pending: usize,
    last_class: EntityClass,
}

impl SqliteGeoStore {
    /// Statements per transaction unless configured otherwise.
    pub const DEFAULT_BATCH_SIZE: usize = 10_000;

    /// Open (or create) the database at `path` and migrate its schema.
    pub fn open(path: &Utf8Path) -> Result<Self, SqliteStoreError> {
        geonames_fs::ensure_parent_dir(path).map_err(|source| SqliteStoreError::CreateDir {
            path: path.to_path_buf(),
            source,
        })?;
        let connection =
            Connection::open(path.as_std_path()).map_err(|source| SqliteStoreError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_connection(connection)
    }

    /// Create a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection = Connection::open_in_memory().map_err(|source| SqliteStoreError::Open {
            path: Utf8PathBuf::from(":memory:"),
            source,
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, SqliteStoreError> {
        initialise_schema(&mut connection)?;
        Ok(Self {
            connection,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            pending: 0,
            last_class: EntityClass::Continent,
        })
    }

    /// Commit after every `batch_size` writes; zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Writes not yet committed.
    #[must_use]
    pub const fn pending(&self) -> usize {
        self.pending
    }

    #[cfg(test)]
    pub(crate) const fn connection(&self) -> &Connection {
        &self.connection
    }

    fn begin(&self) -> Result<(), SqliteStoreError> {
        if self.connection.is_autocommit() {
            self.connection
                .execute_batch("BEGIN")
                .map_err(|source| SqliteStoreError::Sqlite {
                    operation: "begin batch",
                    source,
                })?;
        }
        Ok(())
    }

    fn written(&mut self) -> Result<(), SqliteStoreError> {
        self.pending += 1;
        if self.pending >= self.batch_size {
            self.commit()?;
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SqliteStoreError> {
        if !self.connection.is_autocommit() {
            debug!("Committing {} pending writes", self.pending);
            self.connection
                .execute_batch("COMMIT")
                .map_err(|source| SqliteStoreError::Sqlite {
                    operation: "commit batch",
                    source,
                })?;
        }
        self.pending = 0;
        Ok(())
    }

    fn write(&mut self, id: ExternalId, attributes: &EntityAttributes) -> Result<(), SqliteStoreError> {
        let key = sql_id(id)?;
        self.begin()?;
        self.last_class = attributes.class();
        match attributes {
            EntityAttributes::Continent(continent) => self.write_continent(key, continent),
            EntityAttributes::Country(country) => self.write_country(key, country),
            EntityAttributes::Division(division) => self.write_division(key, division),
            EntityAttributes::City(city) => self.write_city(key, city),
            EntityAttributes::Translation(translation) => {
                self.write_translation(key, translation)
            }
        }?;
        self.written()
    }

    fn execute(
        &self,
        operation: &'static str,
        sql: &str,
        values: &[&dyn rusqlite::ToSql],
    ) -> Result<usize, SqliteStoreError> {
        let mut statement = self
            .connection
            .prepare_cached(sql)
            .map_err(|source| SqliteStoreError::Sqlite { operation, source })?;
        statement
            .execute(values)
            .map_err(|source| SqliteStoreError::Sqlite { operation, source })
    }

    fn write_continent(
        &self,
        key: i64,
        continent: &ContinentAttributes,
    ) -> Result<(), SqliteStoreError> {
        let place = PlaceRow::new(Some(&continent.place))?;
        self.execute(
            "upsert continent",
            "INSERT OR REPLACE INTO continents (
                geoname_id, code, name,
                latitude, longitude, timezone_id, population, elevation, dem,
                feature_code, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                key,
                continent.code,
                continent.name,
                place.latitude,
                place.longitude,
                place.timezone_id,
                place.population,
                place.elevation,
                place.dem,
                place.feature_code,
                place.synced_at,
            ],
        )
        .map(|_| ())
    }

    fn write_country(&self, key: i64, country: &CountryAttributes) -> Result<(), SqliteStoreError> {
        let place = PlaceRow::new(country.place.as_ref())?;
        let continent_id = country.continent_id.map(sql_id).transpose()?;
        self.execute(
            "upsert country",
            "INSERT OR REPLACE INTO countries (
                geoname_id, code, iso3, iso_numeric, name, name_official, continent_id,
                capital, currency_code, currency_name, tld, phone_code,
                postal_code_format, postal_code_regex, languages, neighbours, area, fips,
                latitude, longitude, timezone_id, population, elevation, dem,
                feature_code, synced_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26
            )",
            params![
                key,
                country.code,
                country.iso3,
                country.iso_numeric,
                country.name,
                country.name_official,
                continent_id,
                country.capital,
                country.currency_code,
                country.currency_name,
                country.tld,
                country.phone_code,
                country.postal_code_format,
                country.postal_code_regex,
                country.languages,
                country.neighbours,
                country.area,
                country.fips,
                place.latitude,
                place.longitude,
                place.timezone_id,
                place.population,
                place.elevation,
                place.dem,
                place.feature_code,
                place.synced_at,
            ],
        )
        .map(|_| ())
    }

    fn write_division(
        &self,
        key: i64,
        division: &DivisionAttributes,
    ) -> Result<(), SqliteStoreError> {
        let place = PlaceRow::new(Some(&division.place))?;
        self.execute(
            "upsert division",
            "INSERT OR REPLACE INTO divisions (
                geoname_id, name, name_official, country_code, admin1_code,
                latitude, longitude, timezone_id, population, elevation, dem,
                feature_code, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                key,
                division.name,
                division.name_official,
                division.country_code,
                division.admin1_code,
                place.latitude,
                place.longitude,
                place.timezone_id,
                place.population,
                place.elevation,
                place.dem,
                place.feature_code,
                place.synced_at,
            ],
        )
        .map(|_| ())
    }

    fn write_city(&self, key: i64, city: &CityAttributes) -> Result<(), SqliteStoreError> {
        let place = PlaceRow::new(Some(&city.place))?;
        self.execute(
            "upsert city",
            "INSERT OR REPLACE INTO cities (
                geoname_id, name, name_official, country_code, admin1_code, admin2_code,
                latitude, longitude, timezone_id, population, elevation, dem,
                feature_code, synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                key,
                city.name,
                city.name_official,
                city.country_code,
                city.admin1_code,
                city.admin2_code,
                place.latitude,
                place.longitude,
                place.timezone_id,
                place.population,
                place.elevation,
                place.dem,
                place.feature_code,
                place.synced_at,
            ],
        )
        .map(|_| ())
    }

    fn write_translation(
        &self,
        key: i64,
        translation: &TranslationAttributes,
    ) -> Result<(), SqliteStoreError> {
        self.execute(
            "upsert translation",
            "INSERT OR REPLACE INTO translations (
                alternate_name_id, geoname_id, language, name,
                is_preferred, is_short, is_colloquial, is_historic
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                key,
                sql_id(translation.geoname_id)?,
                translation.language,
                translation.name,
                translation.is_preferred,
                translation.is_short,
                translation.is_colloquial,
                translation.is_historic,
            ],
        )
        .map(|_| ())
    }

    fn delete(&mut self, class: EntityClass, id: ExternalId) -> Result<bool, SqliteStoreError> {
        let key = sql_id(id)?;
        let (table, column) = table_for(class);
        self.begin()?;
        self.last_class = class;
        let removed = self.execute(
            "delete row",
            &format!("DELETE FROM {table} WHERE {column} = ?1"),
            params![key],
        )?;
        self.written()?;
        Ok(removed > 0)
    }

    fn exists(&self, class: EntityClass) -> Result<bool, SqliteStoreError> {
        let (table, _) = table_for(class);
        self.connection
            .query_row(
                &format!("SELECT EXISTS (SELECT 1 FROM {table})"),
                [],
                |row| row.get(0),
            )
            .map_err(|source| SqliteStoreError::Sqlite {
                operation: "inspect table",
                source,
            })
    }
}

impl GeoStore for SqliteGeoStore {
    fn upsert(
        &mut self,
        id: ExternalId,
        attributes: &EntityAttributes,
    ) -> Result<(), PersistenceError> {
        self.write(id, attributes).map_err(|err| {
            PersistenceError::new(PersistenceOperation::Upsert, attributes.class(), err).with_id(id)
        })
    }

    fn delete_by_external_id(
        &mut self,
        class: EntityClass,
        id: ExternalId,
    ) -> Result<bool, PersistenceError> {
        self.delete(class, id)
            .map_err(|err| PersistenceError::new(PersistenceOperation::Delete, class, err).with_id(id))
    }

    fn has_any_rows(&self, class: EntityClass) -> Result<bool, PersistenceError> {
        self.exists(class)
            .map_err(|err| PersistenceError::new(PersistenceOperation::Inspect, class, err))
    }

    fn flush(&mut self) -> Result<(), PersistenceError> {
        let class = self.last_class;
        self.commit()
            .map_err(|err| PersistenceError::new(PersistenceOperation::Flush, class, err))
    }
}

const fn table_for(class: EntityClass) -> (&'static str, &'static str) {
    match class {
        EntityClass::Continent => ("continents", "geoname_id"),
        EntityClass::Country => ("countries", "geoname_id"),
        EntityClass::Division => ("divisions", "geoname_id"),
        EntityClass::City => ("cities", "geoname_id"),
        EntityClass::Translation => ("translations", "alternate_name_id"),
    }
}

fn sql_id(id: ExternalId) -> Result<i64, SqliteStoreError> {
    i64::try_from(id.get()).map_err(|_| SqliteStoreError::IdOutOfRange { id })
}

/// Place columns in their bound form; every column is null when the entity
/// has no geonames record yet.
#[derive(Debug, Default)]
struct PlaceRow<'a> {
    latitude: Option<f64>,
    longitude: Option<f64>,
    timezone_id: Option<&'a str>,
    population: Option<i64>,
    elevation: Option<i32>,
    dem: Option<i32>,
    feature_code: Option<&'a str>,
    synced_at: Option<String>,
}

impl<'a> PlaceRow<'a> {
    fn new(place: Option<&'a PlaceDetails>) -> Result<Self, SqliteStoreError> {
        let Some(place) = place else {
            return Ok(Self::default());
        };
        let population = place
            .population
            .map(|value| {
                i64::try_from(value).map_err(|_| SqliteStoreError::ValueOutOfRange {
                    column: "population",
                    value,
                })
            })
            .transpose()?;
        Ok(Self {
            latitude: Some(place.latitude),
            longitude: Some(place.longitude),
            timezone_id: place.timezone_id.as_deref(),
            population,
            elevation: place.elevation,
            dem: place.dem,
            feature_code: Some(place.feature_code.as_str()),
            synced_at: place.synced_at.map(|date: NaiveDate| date.to_string()),
        })
    }
}
