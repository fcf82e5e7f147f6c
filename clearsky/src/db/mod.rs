use std::{future::Future, str::FromStr};

use chrono::{DateTime, Utc};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

use crate::{
    error::CsError,
    reading::Reading,
    weather::aggregate::{GrainAverage, PropertyValue, average_by_grain},
};
use query::{Grain, Property, PropertySelection};

pub mod query;

/// Persistence and query capabilities the HTTP layer depends on.
pub trait WeatherStore: Send + Sync {
    fn create(&self, reading: Reading) -> impl Future<Output = Result<Reading, CsError>> + Send;

    fn find_all(&self) -> impl Future<Output = Result<Vec<Reading>, CsError>> + Send;

    /// Readings for `city`, newest first.
    fn find_by_city(
        &self,
        city: &str,
    ) -> impl Future<Output = Result<Vec<Reading>, CsError>> + Send;

    fn find_distinct_cities(&self) -> impl Future<Output = Result<Vec<String>, CsError>> + Send;

    fn find_latest_by_city(
        &self,
        city: &str,
    ) -> impl Future<Output = Result<Option<Reading>, CsError>> + Send;

    fn find_latest_property_by_city(
        &self,
        city: &str,
        property: Property,
    ) -> impl Future<Output = Result<Option<PropertyValue>, CsError>> + Send;

    fn find_avg_property_by_city_and_grain(
        &self,
        city: &str,
        selection: PropertySelection,
        grain: Grain,
    ) -> impl Future<Output = Result<Vec<GrainAverage>, CsError>> + Send;

    fn ping(&self) -> impl Future<Output = Result<(), CsError>> + Send;
}

const READING_COLUMNS: &str = "reading_id, city, description, humidity, temperature, pressure, \
                               wind_speed, wind_degree, timestamp";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, CsError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory database with the schema applied.
    pub async fn in_memory() -> Result<Self, CsError> {
        // Every connection to :memory: is its own database, so keep exactly one alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), CsError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

impl WeatherStore for SqliteStore {
    async fn create(&self, reading: Reading) -> Result<Reading, CsError> {
        let result = sqlx::query(
            "INSERT INTO readings (reading_id, city, description, humidity, temperature, \
             pressure, wind_speed, wind_degree, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&reading.reading_id)
        .bind(&reading.city)
        .bind(&reading.description)
        .bind(reading.humidity)
        .bind(reading.temperature)
        .bind(reading.pressure)
        .bind(reading.wind_speed)
        .bind(reading.wind_degree)
        .bind(reading.timestamp)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Stored reading: {reading}");
                Ok(reading)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(CsError::DuplicateReading(reading.reading_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_all(&self) -> Result<Vec<Reading>, CsError> {
        let sql = format!("SELECT {READING_COLUMNS} FROM readings ORDER BY rowid");
        Ok(sqlx::query_as::<_, Reading>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_by_city(&self, city: &str) -> Result<Vec<Reading>, CsError> {
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM readings WHERE city = ? \
             ORDER BY timestamp DESC, rowid DESC"
        );
        Ok(sqlx::query_as::<_, Reading>(&sql)
            .bind(city)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_distinct_cities(&self) -> Result<Vec<String>, CsError> {
        Ok(
            sqlx::query_scalar("SELECT DISTINCT city FROM readings ORDER BY city")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    async fn find_latest_by_city(&self, city: &str) -> Result<Option<Reading>, CsError> {
        let sql = format!(
            "SELECT {READING_COLUMNS} FROM readings WHERE city = ? \
             ORDER BY timestamp DESC, rowid DESC LIMIT 1"
        );
        Ok(sqlx::query_as::<_, Reading>(&sql)
            .bind(city)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_latest_property_by_city(
        &self,
        city: &str,
        property: Property,
    ) -> Result<Option<PropertyValue>, CsError> {
        // The column name comes from a closed enum, never from the request.
        let sql = format!(
            "SELECT CAST({} AS REAL), timestamp FROM readings WHERE city = ? \
             ORDER BY timestamp DESC, rowid DESC LIMIT 1",
            property.column()
        );
        let row: Option<(f64, Option<DateTime<Utc>>)> = sqlx::query_as(&sql)
            .bind(city)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value, timestamp)| PropertyValue {
            city: city.to_string(),
            property,
            value,
            timestamp,
        }))
    }

    async fn find_avg_property_by_city_and_grain(
        &self,
        city: &str,
        selection: PropertySelection,
        grain: Grain,
    ) -> Result<Vec<GrainAverage>, CsError> {
        let readings = self.find_by_city(city).await?;
        Ok(average_by_grain(&readings, selection, grain))
    }

    async fn ping(&self) -> Result<(), CsError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
