use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    db::query::{Grain, Property, PropertySelection},
    reading::Reading,
};

/// Most recent value of one property for a city.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyValue {
    pub city: String,
    pub property: Property,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Mean of the selected properties over one hour or day bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrainAverage {
    pub period: DateTime<Utc>,
    pub grain: Grain,
    pub samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wind_degree: Option<f64>,
}

impl GrainAverage {
    fn empty(period: DateTime<Utc>, grain: Grain, samples: usize) -> Self {
        Self {
            period,
            grain,
            samples,
            temperature: None,
            humidity: None,
            pressure: None,
            wind_speed: None,
            wind_degree: None,
        }
    }

    #[cfg(test)]
    fn get(&self, property: Property) -> Option<f64> {
        match property {
            Property::Temperature => self.temperature,
            Property::Humidity => self.humidity,
            Property::Pressure => self.pressure,
            Property::WindSpeed => self.wind_speed,
            Property::WindDegree => self.wind_degree,
        }
    }

    fn set(&mut self, property: Property, value: f64) {
        let slot = match property {
            Property::Temperature => &mut self.temperature,
            Property::Humidity => &mut self.humidity,
            Property::Pressure => &mut self.pressure,
            Property::WindSpeed => &mut self.wind_speed,
            Property::WindDegree => &mut self.wind_degree,
        };
        *slot = Some(value);
    }
}

/// Buckets readings by `grain` and averages the selected properties.
///
/// Buckets come back newest first. Readings without a timestamp cannot be
/// placed in a bucket and are skipped.
pub fn average_by_grain(
    readings: &[Reading],
    selection: PropertySelection,
    grain: Grain,
) -> Vec<GrainAverage> {
    let mut buckets: BTreeMap<DateTime<Utc>, Vec<&Reading>> = BTreeMap::new();
    for reading in readings {
        if let Some(timestamp) = reading.timestamp {
            buckets
                .entry(grain.truncate(timestamp))
                .or_default()
                .push(reading);
        }
    }

    buckets
        .into_iter()
        .rev()
        .map(|(period, members)| {
            let mut average = GrainAverage::empty(period, grain, members.len());
            for property in Property::ALL.into_iter().filter(|p| selection.includes(*p)) {
                let total: f64 = members.iter().map(|r| property.value_of(r)).sum();
                average.set(property, total / members.len() as f64);
            }
            average
        })
        .collect()
}
