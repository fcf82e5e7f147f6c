use std::str::FromStr;

use chrono::{DateTime, NaiveTime, TimeDelta, Timelike, Utc};
use serde::Serialize;

use crate::{error::CsError, reading::Reading};

/// A single weather metric that can be looked up or averaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    Temperature,
    Humidity,
    Pressure,
    WindSpeed,
    WindDegree,
}

impl Property {
    pub const ALL: [Property; 5] = [
        Property::Temperature,
        Property::Humidity,
        Property::Pressure,
        Property::WindSpeed,
        Property::WindDegree,
    ];

    /// Column backing this property in the `readings` table.
    pub fn column(self) -> &'static str {
        match self {
            Property::Temperature => "temperature",
            Property::Humidity => "humidity",
            Property::Pressure => "pressure",
            Property::WindSpeed => "wind_speed",
            Property::WindDegree => "wind_degree",
        }
    }

    pub fn value_of(self, reading: &Reading) -> f64 {
        match self {
            Property::Temperature => f64::from(reading.temperature),
            Property::Humidity => f64::from(reading.humidity),
            Property::Pressure => f64::from(reading.pressure),
            Property::WindSpeed => reading.wind_speed,
            Property::WindDegree => f64::from(reading.wind_degree),
        }
    }
}

impl std::fmt::Display for Property {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Property::Temperature => "temperature",
            Property::Humidity => "humidity",
            Property::Pressure => "pressure",
            Property::WindSpeed => "windSpeed",
            Property::WindDegree => "windDegree",
        };
        f.write_str(name)
    }
}

impl FromStr for Property {
    type Err = CsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Ok(Property::Temperature),
            "humidity" => Ok(Property::Humidity),
            "pressure" => Ok(Property::Pressure),
            "windspeed" | "wind_speed" => Ok(Property::WindSpeed),
            "winddegree" | "wind_degree" => Ok(Property::WindDegree),
            _ => Err(CsError::InvalidProperty(s.to_string())),
        }
    }
}

/// Either every property or one of them. `ALL` is the sentinel spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertySelection {
    All,
    One(Property),
}

impl PropertySelection {
    pub const ALL_SENTINEL: &'static str = "ALL";

    pub fn includes(self, property: Property) -> bool {
        match self {
            PropertySelection::All => true,
            PropertySelection::One(selected) => selected == property,
        }
    }
}

impl FromStr for PropertySelection {
    type Err = CsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(Self::ALL_SENTINEL) {
            Ok(PropertySelection::All)
        } else {
            s.parse().map(PropertySelection::One)
        }
    }
}

/// Temporal bucket size used when averaging readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grain {
    Hour,
    Day,
}

impl Grain {
    /// Start of the UTC bucket containing `timestamp`.
    pub fn truncate(self, timestamp: DateTime<Utc>) -> DateTime<Utc> {
        let midnight = timestamp.date_naive().and_time(NaiveTime::MIN).and_utc();
        match self {
            Grain::Day => midnight,
            Grain::Hour => midnight + TimeDelta::hours(i64::from(timestamp.hour())),
        }
    }
}

impl FromStr for Grain {
    type Err = CsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hour" | "hourly" | "hours" | "h" => Ok(Grain::Hour),
            "day" | "daily" | "days" | "d" => Ok(Grain::Day),
            _ => Err(CsError::InvalidGrain(s.to_string())),
        }
    }
}
