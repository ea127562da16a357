use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The GHCN-Daily elements aggregated into the tensor, in field-axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    MinTemperature, // TMIN
    MaxTemperature, // TMAX
    Precipitation,  // PRCP
    Snowfall,       // SNOW
    SnowDepth,      // SNWD
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::MinTemperature,
        Field::MaxTemperature,
        Field::Precipitation,
        Field::Snowfall,
        Field::SnowDepth,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "TMIN" => Some(Field::MinTemperature),
            "TMAX" => Some(Field::MaxTemperature),
            "PRCP" => Some(Field::Precipitation),
            "SNOW" => Some(Field::Snowfall),
            "SNWD" => Some(Field::SnowDepth),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Field::MinTemperature => "TMIN",
            Field::MaxTemperature => "TMAX",
            Field::Precipitation => "PRCP",
            Field::Snowfall => "SNOW",
            Field::SnowDepth => "SNWD",
        }
    }

    /// Position on the tensor's field axis
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Unit after dividing the raw value by the dataset scale divisor (10)
    pub fn units(&self) -> &'static str {
        match self {
            Field::MinTemperature | Field::MaxTemperature => "°C",
            Field::Precipitation => "mm",
            Field::Snowfall | Field::SnowDepth => "cm",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One line of a GHCN-Daily yearly archive.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub station_id: String,
    pub date: NaiveDate,
    pub element: String,
    /// Raw integer value in the element's native unit (tenths of °C, tenths of mm, mm)
    pub value: i64,
    pub quality_flag: Option<char>,
}

impl ObservationRecord {
    pub fn new(station_id: impl Into<String>, date: NaiveDate, element: impl Into<String>, value: i64) -> Self {
        Self {
            station_id: station_id.into(),
            date,
            element: element.into(),
            value,
            quality_flag: None,
        }
    }

    pub fn with_quality_flag(mut self, flag: Option<char>) -> Self {
        self.quality_flag = flag;
        self
    }

    pub fn field(&self) -> Option<Field> {
        Field::from_code(&self.element)
    }

    pub fn is_quality_flagged(&self) -> bool {
        self.quality_flag.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_codes() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(Field::from_code(field.code()), Some(*field));
            assert_eq!(field.index(), i);
        }
        assert_eq!(Field::from_code("AWND"), None);
        assert_eq!(Field::from_code("tmax"), None);
    }

    #[test]
    fn test_field_units() {
        assert_eq!(Field::MaxTemperature.units(), "°C");
        assert_eq!(Field::Precipitation.units(), "mm");
        assert_eq!(Field::SnowDepth.units(), "cm");
        assert_eq!(Field::Snowfall.to_string(), "SNOW");
    }

    #[test]
    fn test_record_field() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 15).unwrap();
        let record = ObservationRecord::new("USC00010008", date, "TMAX", 250);

        assert_eq!(record.field(), Some(Field::MaxTemperature));
        assert!(!record.is_quality_flagged());
        assert!(record.with_quality_flag(Some('I')).is_quality_flagged());
    }
}
