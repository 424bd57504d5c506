//! Season identifiers.

use crate::error::{CollectorError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A football season spanning two calendar years, e.g. `2024-2025`.
///
/// Accepts `2024-2025`, `2024/25`, `2024/2025` and a bare `2024` on input and
/// always renders in FBref's `YYYY-YYYY` form, which is also the stored form.
///
/// # Examples
///
/// ```rust
/// use pl_collector::Season;
///
/// let season: Season = "2024/25".parse().unwrap();
/// assert_eq!(season.to_string(), "2024-2025");
/// assert_eq!(season.start_year(), 2024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Season {
    start_year: u16,
}

impl Season {
    pub fn new(start_year: u16) -> Self {
        Self { start_year }
    }

    pub fn start_year(&self) -> u16 {
        self.start_year
    }

    pub fn end_year(&self) -> u16 {
        self.start_year.saturating_add(1)
    }
}

/// Accepted start years: the first league season to the last four-digit one.
const START_YEARS: std::ops::RangeInclusive<u16> = 1888..=9998;

impl Default for Season {
    fn default() -> Self {
        Self::new(2024)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.end_year())
    }
}

impl FromStr for Season {
    type Err = CollectorError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || CollectorError::InvalidSeason {
            input: s.to_string(),
        };
        let trimmed = s.trim();

        let Some((start, end)) = trimmed.split_once(['-', '/']) else {
            let start: u16 = trimmed.parse().map_err(|_| invalid())?;
            if !START_YEARS.contains(&start) {
                return Err(invalid());
            }
            return Ok(Self::new(start));
        };

        let start: u16 = start.parse().map_err(|_| invalid())?;
        if !START_YEARS.contains(&start) {
            return Err(invalid());
        }
        let end: u16 = end.parse().map_err(|_| invalid())?;
        let expected_end = start + 1;
        let matches = match end {
            e if e >= 1000 => e == expected_end,
            e => e == expected_end % 100,
        };
        if !matches {
            return Err(invalid());
        }
        Ok(Self::new(start))
    }
}

impl Serialize for Season {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Season {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_season_display() {
        assert_eq!(Season::new(2024).to_string(), "2024-2025");
        assert_eq!(Season::default().to_string(), "2024-2025");
    }

    #[test]
    fn test_season_parse_formats() {
        assert_eq!("2024-2025".parse::<Season>().unwrap(), Season::new(2024));
        assert_eq!("2023/24".parse::<Season>().unwrap(), Season::new(2023));
        assert_eq!("2023/2024".parse::<Season>().unwrap(), Season::new(2023));
        assert_eq!(" 2022 ".parse::<Season>().unwrap(), Season::new(2022));
        assert_eq!("1999-00".parse::<Season>().unwrap(), Season::new(1999));
    }

    #[test]
    fn test_season_parse_rejects_non_consecutive_years() {
        assert!("2024-2026".parse::<Season>().is_err());
        assert!("2024/23".parse::<Season>().is_err());
        assert!("twenty".parse::<Season>().is_err());
        assert!("".parse::<Season>().is_err());
    }

    #[test]
    fn test_season_parse_rejects_out_of_range_years() {
        assert!("65535-0".parse::<Season>().is_err());
        assert!("65535".parse::<Season>().is_err());
        assert!("9999".parse::<Season>().is_err());
        assert!("1066".parse::<Season>().is_err());
        assert_eq!("9998".parse::<Season>().unwrap().to_string(), "9998-9999");
        assert_eq!(Season::new(u16::MAX).end_year(), u16::MAX);
    }

    #[test]
    fn test_season_serde_uses_display_form() {
        let json = serde_json::to_string(&Season::new(2024)).unwrap();
        assert_eq!(json, "\"2024-2025\"");
        let back: Season = serde_json::from_str("\"2024/25\"").unwrap();
        assert_eq!(back, Season::new(2024));
    }
}
