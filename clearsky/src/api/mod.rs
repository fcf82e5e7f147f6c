use poem::{Endpoint, EndpointExt, Route, middleware::Tracing};
use poem_openapi::{
    OpenApi, OpenApiService,
    param::{Path, Query},
    payload::Json,
};
use response::ReadingApiResponse;

use crate::{
    db::WeatherStore,
    error::CsError,
    reading::{NewReading, Reading},
    weather,
};

mod response;

pub struct ReadingsApi<S> {
    pub store: S,
}

#[OpenApi]
impl<S> ReadingsApi<S>
where
    S: WeatherStore + 'static,
{
    /// All stored readings.
    #[oai(method = "get", path = "/readings")]
    async fn find_all(&self) -> ReadingApiResponse<Vec<Reading>> {
        self.store.find_all().await.into()
    }

    /// Store a new reading. A `readingId` is generated when none is given.
    #[oai(method = "post", path = "/readings")]
    async fn create(&self, reading: Json<NewReading>) -> ReadingApiResponse<Reading> {
        self.create_reading(reading.0).await.into()
    }

    /// Every city that has at least one reading.
    #[oai(method = "get", path = "/readings/cities")]
    async fn find_distinct_cities(&self) -> ReadingApiResponse<Vec<String>> {
        self.store.find_distinct_cities().await.into()
    }

    /// Readings for one city, newest first.
    #[oai(method = "get", path = "/readings/city/:city")]
    async fn find_by_city(&self, city: Path<String>) -> ReadingApiResponse<Vec<Reading>> {
        self.store.find_by_city(&city).await.into()
    }

    /// Latest weather for a city.
    ///
    /// `property` narrows the answer to one metric, `grain` (hour or day)
    /// returns averages per bucket instead of a single reading.
    #[oai(method = "get", path = "/readings/latest")]
    async fn find_latest_weather(
        &self,
        city: Query<String>,
        property: Query<Option<String>>,
        grain: Query<Option<String>>,
    ) -> ReadingApiResponse<serde_json::Value> {
        self.latest_weather_json(&city, property.0.as_deref(), grain.0.as_deref())
            .await
            .into()
    }

    #[oai(method = "get", path = "/health")]
    async fn health(&self) -> ReadingApiResponse<String> {
        self.store.ping().await.map(|_| "ok".to_string()).into()
    }
}

impl<S> ReadingsApi<S>
where
    S: WeatherStore + 'static,
{
    async fn create_reading(&self, new: NewReading) -> Result<Reading, CsError> {
        let reading = Reading::try_from(new)?;
        self.store.create(reading).await
    }

    async fn latest_weather_json(
        &self,
        city: &str,
        property: Option<&str>,
        grain: Option<&str>,
    ) -> Result<serde_json::Value, CsError> {
        let latest = weather::latest_weather(&self.store, city, property, grain).await?;
        serde_json::to_value(latest).map_err(CsError::LatestToJson)
    }
}

/// Route tree serving the readings API under `api_prefix`.
pub fn routes<S>(store: S, api_prefix: &str) -> impl Endpoint + use<S>
where
    S: WeatherStore + 'static,
{
    let api_service = OpenApiService::new(
        ReadingsApi { store },
        "ClearSky",
        env!("CARGO_PKG_VERSION"),
    );
    let prefix = if api_prefix.is_empty() { "/" } else { api_prefix };

    Route::new().nest(prefix, api_service).with(Tracing)
}
