use chrono::{DateTime, Utc};
use poem_openapi::Object;
use serde::Serialize;
use uuid::Uuid;

use crate::error::CsError;

/// One weather observation for a city.
///
/// `timestamp` is stored and used for ordering but never written out.
#[derive(Debug, Clone, PartialEq, Serialize, Object, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
#[oai(rename_all = "camelCase")]
pub struct Reading {
    pub reading_id: String,
    pub city: String,
    pub description: String,
    pub humidity: i32,
    pub temperature: i32,
    pub pressure: i32,
    pub wind_speed: f64,
    pub wind_degree: i32,
    #[serde(skip_serializing)]
    #[oai(skip)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            reading_id: generate_id(),
            city: String::new(),
            description: String::new(),
            humidity: 0,
            temperature: 0,
            pressure: 0,
            wind_speed: 0.0,
            wind_degree: 0,
            timestamp: None,
        }
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}[{}] - temperature: {}, pressure: {}, humidity: {}, wind: {} @ {}",
            self.city,
            self.reading_id,
            self.temperature,
            self.pressure,
            self.humidity,
            self.wind_speed,
            self.wind_degree
        )
    }
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Body of a create request. Wind may come flat or nested under `wind`.
#[derive(Debug, Clone, Default, Object)]
#[oai(rename_all = "camelCase")]
pub struct NewReading {
    pub reading_id: Option<String>,
    pub city: Option<String>,
    pub description: Option<String>,
    pub humidity: Option<i32>,
    pub temperature: Option<i32>,
    pub pressure: Option<i32>,
    pub wind_speed: Option<f64>,
    pub wind_degree: Option<i32>,
    pub wind: Option<Wind>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Nested wind block as reported by upstream weather feeds.
#[derive(Debug, Clone, Object)]
pub struct Wind {
    pub speed: String,
    pub degree: String,
}

impl Wind {
    fn unpack(&self) -> Result<(f64, i32), CsError> {
        let speed = self.speed.trim().parse::<f64>().map_err(|e| {
            tracing::error!("Failed to parse wind speed to float: {e}");
            CsError::InvalidPayload(format!("wind.speed '{}': {e}", self.speed))
        })?;
        let degree = self.degree.trim().parse::<i32>().map_err(|e| {
            tracing::error!("Failed to parse wind degree to integer: {e}");
            CsError::InvalidPayload(format!("wind.degree '{}': {e}", self.degree))
        })?;
        Ok((speed, degree))
    }
}

impl TryFrom<NewReading> for Reading {
    type Error = CsError;

    fn try_from(new: NewReading) -> Result<Self, Self::Error> {
        let (wind_speed, wind_degree) = match &new.wind {
            Some(wind) => wind.unpack()?,
            None => (
                new.wind_speed.unwrap_or_default(),
                new.wind_degree.unwrap_or_default(),
            ),
        };
        if !wind_speed.is_finite() {
            return Err(CsError::InvalidPayload(format!(
                "wind speed {wind_speed} is not a finite number"
            )));
        }

        Ok(Self {
            reading_id: new
                .reading_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(generate_id),
            city: new.city.unwrap_or_default(),
            description: new.description.unwrap_or_default(),
            humidity: new.humidity.unwrap_or_default(),
            temperature: new.temperature.unwrap_or_default(),
            pressure: new.pressure.unwrap_or_default(),
            wind_speed,
            wind_degree,
            timestamp: Some(new.timestamp.unwrap_or_else(Utc::now)),
        })
    }
}

#[cfg(test)]
mod tests {
    use poem_openapi::types::ParseFromJSON;
    use serde_json::json;

    use super::*;

    fn parse(payload: serde_json::Value) -> Result<Reading, CsError> {
        let new = NewReading::parse_from_json(Some(payload)).expect("payload should parse");
        Reading::try_from(new)
    }

    #[test]
    fn nested_wind_is_flattened() {
        let nested = parse(json!({
            "city": "Detroit",
            "wind": { "speed": "5.5", "degree": "180" }
        }))
        .unwrap();
        let flat = parse(json!({
            "city": "Detroit",
            "windSpeed": 5.5,
            "windDegree": 180
        }))
        .unwrap();

        assert_eq!(nested.wind_speed, 5.5);
        assert_eq!(nested.wind_degree, 180);
        assert_eq!(
            (nested.wind_speed, nested.wind_degree),
            (flat.wind_speed, flat.wind_degree)
        );
    }

    #[test]
    fn bad_wind_string_is_rejected() {
        let err = parse(json!({ "wind": { "speed": "fast", "degree": "90" } })).unwrap_err();
        assert!(matches!(err, CsError::InvalidPayload(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn non_finite_wind_speed_is_rejected() {
        for speed in ["NaN", "inf", "-infinity"] {
            let err = parse(json!({ "wind": { "speed": speed, "degree": "90" } })).unwrap_err();
            assert!(matches!(err, CsError::InvalidPayload(_)), "{speed} accepted");
        }

        let flat = NewReading {
            wind_speed: Some(f64::INFINITY),
            ..NewReading::default()
        };
        assert!(matches!(
            Reading::try_from(flat),
            Err(CsError::InvalidPayload(_))
        ));
    }

    #[test]
    fn supplied_id_is_kept() {
        let reading = parse(json!({ "readingId": "r-1", "city": "Austin" })).unwrap();
        assert_eq!(reading.reading_id, "r-1");
        assert_eq!(reading.city, "Austin");
    }

    #[test]
    fn missing_or_empty_id_is_generated() {
        let first = parse(json!({ "city": "Austin" })).unwrap();
        let second = parse(json!({ "readingId": "", "city": "Austin" })).unwrap();

        assert!(!first.reading_id.is_empty());
        assert!(!second.reading_id.is_empty());
        assert_ne!(first.reading_id, second.reading_id);
        assert!(first.timestamp.is_some());
    }

    #[test]
    fn output_omits_timestamp() {
        let reading = Reading {
            reading_id: "r-2".into(),
            city: "Oslo".into(),
            timestamp: Some(Utc::now()),
            ..Reading::default()
        };
        let value = serde_json::to_value(&reading).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["readingId"], "r-2");
        assert!(object.contains_key("windSpeed"));
        assert!(!object.contains_key("timestamp"));
        assert!(!object.contains_key("wind"));
    }

    #[test]
    fn default_readings_get_distinct_ids() {
        assert_ne!(Reading::default().reading_id, Reading::default().reading_id);
    }
}
