//! Enumerated codes stored as 1-based small integers. Each enum knows its
//! form option spelling (what the UI submits) and its numeric code (what the
//! tables store and the search query matches on).

use crate::error::ValidationError;

fn unknown(field: &'static str, value: &str) -> ValidationError {
    ValidationError::UnknownCode { field, value: value.to_owned() }
}

/// Parses a numeric code from a query-string value.
pub fn parse_code<T>(
    field: &'static str,
    raw: &str,
    from_code: impl Fn(i64) -> Option<T>,
) -> Result<T, ValidationError> {
    raw.parse::<i64>()
        .ok()
        .and_then(from_code)
        .ok_or_else(|| unknown(field, raw))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HousingType {
    Lease = 1,
    ShortTerm = 2,
}

impl HousingType {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Lease),
            2 => Some(Self::ShortTerm),
            _ => None,
        }
    }

    pub fn from_option(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "lease" => Ok(Self::Lease),
            "short" => Ok(Self::ShortTerm),
            _ => Err(unknown("housing_type", raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveIn {
    Asap = 1,
    WithinThreeMonths = 2,
    OverThreeMonths = 3,
}

impl MoveIn {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Asap),
            2 => Some(Self::WithinThreeMonths),
            3 => Some(Self::OverThreeMonths),
            _ => None,
        }
    }

    pub fn from_option(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "ASAP" => Ok(Self::Asap),
            "3months" => Ok(Self::WithinThreeMonths),
            "over3months" => Ok(Self::OverThreeMonths),
            _ => Err(unknown("move_in", raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HousemateCount {
    OneToTwo = 1,
    ThreeToFive = 2,
    SixToTwelve = 3,
    TwelvePlus = 4,
}

impl HousemateCount {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::OneToTwo),
            2 => Some(Self::ThreeToFive),
            3 => Some(Self::SixToTwelve),
            4 => Some(Self::TwelvePlus),
            _ => None,
        }
    }

    pub fn from_option(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "1-2" => Ok(Self::OneToTwo),
            "3-5" => Ok(Self::ThreeToFive),
            "6-12" => Ok(Self::SixToTwelve),
            "12+" => Ok(Self::TwelvePlus),
            _ => Err(unknown("housemate_count", raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactMethod {
    Phone = 1,
    Email = 2,
    Twitter = 3,
    /// Communities only.
    Website = 4,
}

impl ContactMethod {
    pub fn from_option(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "phone" => Ok(Self::Phone),
            "email" => Ok(Self::Email),
            "twitter" => Ok(Self::Twitter),
            "website" => Ok(Self::Website),
            _ => Err(unknown("contact_method", raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPrice {
    UnderThousand = 1,
    TenToFifteenHundred = 2,
    FifteenToTwoThousand = 3,
    TwoToTwentyFiveHundred = 4,
    TwentyFiveToThreeThousand = 5,
    ThreeThousandPlus = 6,
}

impl RoomPrice {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_option(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "less1000" => Ok(Self::UnderThousand),
            "1000to1500" => Ok(Self::TenToFifteenHundred),
            "1500to2000" => Ok(Self::FifteenToTwoThousand),
            "2000to2500" => Ok(Self::TwoToTwentyFiveHundred),
            "2500to3000" => Ok(Self::TwentyFiveToThreeThousand),
            "3000plus" => Ok(Self::ThreeThousandPlus),
            _ => Err(unknown("room_price", raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    SanFrancisco = 1,
    Berkeley = 2,
    Oakland = 3,
    Hillsborough = 4,
}

impl Location {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_option(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "San Francisco" => Ok(Self::SanFrancisco),
            "Berkeley" => Ok(Self::Berkeley),
            "Oakland" => Ok(Self::Oakland),
            "Hillsborough" => Ok(Self::Hillsborough),
            _ => Err(unknown("location", raw)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_spellings_round_trip_to_codes() {
        assert_eq!(HousingType::from_option("lease").unwrap().code(), 1);
        assert_eq!(HousingType::from_option("short").unwrap().code(), 2);
        assert_eq!(MoveIn::from_option("over3months").unwrap().code(), 3);
        assert_eq!(HousemateCount::from_option("12+").unwrap().code(), 4);
        assert_eq!(RoomPrice::from_option("3000plus").unwrap().code(), 6);
        assert_eq!(Location::from_option("Oakland").unwrap().code(), 3);
    }

    #[test]
    fn unknown_option_is_rejected() {
        assert!(HousingType::from_option("sublet").is_err());
        assert!(ContactMethod::from_option("carrier-pigeon").is_err());
    }

    #[test]
    fn parse_code_validates_range() {
        assert_eq!(parse_code("move_in", "2", MoveIn::from_code).unwrap(), MoveIn::WithinThreeMonths);
        assert!(parse_code("move_in", "9", MoveIn::from_code).is_err());
        assert!(parse_code("move_in", "soon", MoveIn::from_code).is_err());
    }
}
