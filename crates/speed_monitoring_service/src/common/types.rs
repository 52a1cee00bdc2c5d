/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

macro_rules! impl_getter {
    ($name:ident, $inner:ty) => {
        impl $name {
            pub fn inner(&self) -> $inner {
                self.0.to_owned()
            }
        }
    };
}

#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
pub struct VehicleId(pub String);
impl_getter!(VehicleId, String);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
pub struct Latitude(pub f64);
impl_getter!(Latitude, f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
pub struct Longitude(pub f64);
impl_getter!(Longitude, f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
pub struct Direction(pub f64);
impl_getter!(Direction, f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
pub struct Accuracy(pub f64);
impl_getter!(Accuracy, f64);
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Hash, Ord)]
pub struct TimeStamp(pub DateTime<Utc>);
impl_getter!(TimeStamp, DateTime<Utc>);
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, Eq, PartialEq, PartialOrd, Hash, Ord)]
pub struct SpeedInKmph(pub u32);
impl_getter!(SpeedInKmph, u32);

#[derive(Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
pub struct SpeedInMeterPerSecond(pub f64);
impl_getter!(SpeedInMeterPerSecond, f64);

impl SpeedInMeterPerSecond {
    /// Converts to km/h, rounded to the nearest integer the way the speedometer shows it.
    pub fn to_kmph(&self) -> SpeedInKmph {
        SpeedInKmph((self.0 * 3.6).round().max(0.0) as u32)
    }
}

impl<'de> Deserialize<'de> for SpeedInMeterPerSecond {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{Error, Unexpected};

        struct SpeedVisitor;

        #[allow(clippy::needless_lifetimes)]
        impl<'de> serde::de::Visitor<'de> for SpeedVisitor {
            type Value = SpeedInMeterPerSecond;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str(
                    "a number (integer/float) or a string containing a floating-point number",
                )
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: Error,
            {
                Ok(SpeedInMeterPerSecond(value))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E> {
                Ok(SpeedInMeterPerSecond(v as f64))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
                Ok(SpeedInMeterPerSecond(v as f64))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: Error,
            {
                value
                    .parse::<f64>()
                    .map(SpeedInMeterPerSecond)
                    .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
            }
        }

        deserializer.deserialize_any(SpeedVisitor)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Point {
    pub lat: Latitude,
    pub lon: Longitude,
}

#[derive(
    Debug, Clone, EnumString, EnumIter, Display, Serialize, Deserialize, Eq, Hash, PartialEq, Copy,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RoadCategory {
    Expressway,
    Highway,
    Ghat,
    Tunnel,
    City,
}

/// One instantaneous positioning reading. Speed and heading are optional because
/// receivers omit them until they have a fix with motion.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub location: Point,
    pub accuracy: Accuracy,
    pub speed: Option<SpeedInMeterPerSecond>,
    pub heading: Option<Direction>,
    pub timestamp: TimeStamp,
}

#[derive(Debug, Clone, Display, Serialize, Deserialize, Eq, PartialEq, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SpeedBand {
    Compliant,
    NearLimit,
    Overspeeding,
}

#[derive(Debug, Clone, Display, Serialize, Deserialize, Eq, PartialEq, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "snake_case")]
pub enum InputMode {
    Live,
    Simulated,
}

/// Outbound notification handed to the notifier once per firing.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    pub vehicle_id: Option<VehicleId>,
    pub location_description: String,
    pub speed_kmh: SpeedInKmph,
    pub speed_limit_kmh: SpeedInKmph,
    pub warning_count: u32,
    pub fired_at: TimeStamp,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct APISuccess {
    result: String,
}

impl Default for APISuccess {
    fn default() -> Self {
        Self {
            result: "Success".to_string(),
        }
    }
}
