use serde::{Serialize, Serializer, ser::SerializeMap};
use tracing::info;

use crate::{
    db::{
        WeatherStore,
        query::{Grain, PropertySelection},
    },
    error::CsError,
    reading::Reading,
};
use aggregate::{GrainAverage, PropertyValue};

pub mod aggregate;

/// Result of a latest-weather lookup. `Empty` is written as `{}`.
#[derive(Debug, Clone, PartialEq)]
pub enum LatestWeather {
    Reading(Reading),
    Property(PropertyValue),
    Averages(Vec<GrainAverage>),
    Empty,
}

impl Serialize for LatestWeather {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            LatestWeather::Reading(reading) => reading.serialize(serializer),
            LatestWeather::Property(value) => value.serialize(serializer),
            LatestWeather::Averages(averages) => averages.serialize(serializer),
            LatestWeather::Empty => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Picks the query to run from which optional parameters were supplied.
///
/// Property and grain together average that property, property alone gives
/// its latest value, grain alone averages every property, and neither
/// returns the latest full reading.
pub async fn latest_weather<S>(
    store: &S,
    city: &str,
    property: Option<&str>,
    grain: Option<&str>,
) -> Result<LatestWeather, CsError>
where
    S: WeatherStore,
{
    let property = property.filter(|p| !p.trim().is_empty());
    let grain = grain.filter(|g| !g.trim().is_empty());

    match (property, grain) {
        (Some(property), Some(grain)) => {
            info!(city, property, grain, "Averaging property by grain");
            let selection: PropertySelection = property.parse()?;
            let grain: Grain = grain.parse()?;
            store
                .find_avg_property_by_city_and_grain(city, selection, grain)
                .await
                .map(LatestWeather::Averages)
        }
        (Some(property), None) => {
            info!(city, property, "Looking up latest property value");
            let property = match property.parse::<PropertySelection>()? {
                PropertySelection::One(property) => property,
                PropertySelection::All => {
                    return Err(CsError::InvalidProperty(format!(
                        "{property} is only allowed together with a grain"
                    )));
                }
            };
            let value = store.find_latest_property_by_city(city, property).await?;
            Ok(value.map_or(LatestWeather::Empty, LatestWeather::Property))
        }
        (None, Some(grain)) => {
            info!(city, grain, "Averaging all properties by grain");
            let grain: Grain = grain.parse()?;
            store
                .find_avg_property_by_city_and_grain(city, PropertySelection::All, grain)
                .await
                .map(LatestWeather::Averages)
        }
        (None, None) => {
            info!(city, "Looking up latest reading");
            let reading = store.find_latest_by_city(city).await?;
            Ok(reading.map_or(LatestWeather::Empty, LatestWeather::Reading))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::db::query::Property;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Latest(String),
        LatestProperty(String, Property),
        Averaged(String, PropertySelection, Grain),
    }

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<Call>>,
        latest: Option<Reading>,
    }

    impl RecordingStore {
        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl WeatherStore for RecordingStore {
        async fn create(&self, reading: Reading) -> Result<Reading, CsError> {
            Ok(reading)
        }

        async fn find_all(&self) -> Result<Vec<Reading>, CsError> {
            Ok(self.latest.iter().cloned().collect())
        }

        async fn find_by_city(&self, _city: &str) -> Result<Vec<Reading>, CsError> {
            Ok(vec![])
        }

        async fn find_distinct_cities(&self) -> Result<Vec<String>, CsError> {
            Ok(vec![])
        }

        async fn find_latest_by_city(&self, city: &str) -> Result<Option<Reading>, CsError> {
            self.record(Call::Latest(city.to_string()));
            Ok(self.latest.clone())
        }

        async fn find_latest_property_by_city(
            &self,
            city: &str,
            property: Property,
        ) -> Result<Option<PropertyValue>, CsError> {
            self.record(Call::LatestProperty(city.to_string(), property));
            Ok(None)
        }

        async fn find_avg_property_by_city_and_grain(
            &self,
            city: &str,
            selection: PropertySelection,
            grain: Grain,
        ) -> Result<Vec<GrainAverage>, CsError> {
            self.record(Call::Averaged(city.to_string(), selection, grain));
            Ok(vec![])
        }

        async fn ping(&self) -> Result<(), CsError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn property_and_grain_average_that_property() {
        let store = RecordingStore::default();
        latest_weather(&store, "X", Some("humidity"), Some("daily"))
            .await
            .unwrap();
        assert_eq!(
            store.calls(),
            vec![Call::Averaged(
                "X".into(),
                PropertySelection::One(Property::Humidity),
                Grain::Day
            )]
        );
    }

    #[tokio::test]
    async fn property_alone_reads_latest_value() {
        let store = RecordingStore::default();
        let result = latest_weather(&store, "X", Some("temperature"), None)
            .await
            .unwrap();
        assert_eq!(
            store.calls(),
            vec![Call::LatestProperty("X".into(), Property::Temperature)]
        );
        assert_eq!(result, LatestWeather::Empty);
    }

    #[tokio::test]
    async fn grain_alone_averages_everything() {
        let store = RecordingStore::default();
        latest_weather(&store, "X", None, Some("hour")).await.unwrap();
        assert_eq!(
            store.calls(),
            vec![Call::Averaged("X".into(), PropertySelection::All, Grain::Hour)]
        );
    }

    #[tokio::test]
    async fn no_parameters_returns_latest_reading() {
        let reading = Reading {
            reading_id: "r-9".into(),
            city: "X".into(),
            ..Reading::default()
        };
        let store = RecordingStore {
            latest: Some(reading.clone()),
            ..RecordingStore::default()
        };

        let result = latest_weather(&store, "X", None, None).await.unwrap();

        assert_eq!(store.calls(), vec![Call::Latest("X".into())]);
        assert_eq!(result, LatestWeather::Reading(reading));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["readingId"], "r-9");
    }

    #[tokio::test]
    async fn missing_reading_is_an_empty_object() {
        let store = RecordingStore::default();
        let result = latest_weather(&store, "X", None, None).await.unwrap();
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({}));
    }

    #[tokio::test]
    async fn blank_parameters_count_as_absent() {
        let store = RecordingStore::default();
        latest_weather(&store, "X", Some(""), Some("  ")).await.unwrap();
        assert_eq!(store.calls(), vec![Call::Latest("X".into())]);

        let store = RecordingStore::default();
        latest_weather(&store, "X", Some(""), Some("day")).await.unwrap();
        assert_eq!(
            store.calls(),
            vec![Call::Averaged("X".into(), PropertySelection::All, Grain::Day)]
        );
    }

    #[tokio::test]
    async fn all_without_grain_is_rejected() {
        let store = RecordingStore::default();
        let err = latest_weather(&store, "X", Some("ALL"), None)
            .await
            .unwrap_err();
        assert!(err.is_client_error());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_grain_is_rejected_before_querying() {
        let store = RecordingStore::default();
        let err = latest_weather(&store, "X", Some("pressure"), Some("fortnight"))
            .await
            .unwrap_err();
        assert!(matches!(err, CsError::InvalidGrain(_)));
        assert!(store.calls().is_empty());
    }
}
