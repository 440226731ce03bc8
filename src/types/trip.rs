use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PlannerError, Result};

/// Budget tier selected on the trip form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    Low,
    Medium,
    High,
}

impl Budget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Budget::Low => "Low",
            Budget::Medium => "Medium",
            Budget::High => "High",
        }
    }
}

/// Who is travelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TravelType {
    Solo,
    Couple,
    Family,
    Friends,
    Business,
}

impl TravelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelType::Solo => "Solo",
            TravelType::Couple => "Couple",
            TravelType::Family => "Family",
            TravelType::Friends => "Friends",
            TravelType::Business => "Business",
        }
    }
}

/// Primary way of getting to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Train,
    Flight,
    Bus,
}

impl TravelMode {
    pub const ALL: [TravelMode; 3] = [TravelMode::Train, TravelMode::Flight, TravelMode::Bus];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Train => "train",
            TravelMode::Flight => "flight",
            TravelMode::Bus => "bus",
        }
    }

    /// Itinerary field holding the transport options for this mode.
    pub fn routes_field(&self) -> &'static str {
        match self {
            TravelMode::Train => "trainRoutes",
            TravelMode::Flight => "flightOptions",
            TravelMode::Bus => "busRoutes",
        }
    }

    /// Capitalised label, e.g. "Train".
    pub fn label(&self) -> &'static str {
        match self {
            TravelMode::Train => "Train",
            TravelMode::Flight => "Flight",
            TravelMode::Bus => "Bus",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! impl_from_str {
    ($ty:ty, $what:literal, { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = PlannerError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    other => Err(PlannerError::InvalidTrip(format!(
                        "unknown {} `{}`",
                        $what, other
                    ))),
                }
            }
        }
    };
}

impl_from_str!(TravelMode, "travel mode", {
    "train" => TravelMode::Train,
    "flight" => TravelMode::Flight,
    "bus" => TravelMode::Bus,
});

impl_from_str!(Budget, "budget", {
    "low" => Budget::Low,
    "medium" => Budget::Medium,
    "high" => Budget::High,
});

impl_from_str!(TravelType, "travel type", {
    "solo" => TravelType::Solo,
    "couple" => TravelType::Couple,
    "family" => TravelType::Family,
    "friends" => TravelType::Friends,
    "business" => TravelType::Business,
});

/// Trip form data as collected before a travel mode is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetails {
    pub start_city: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: Budget,
    pub travel_type: TravelType,
    /// Comma-delimited free text
    pub interests: String,
}

impl TripDetails {
    /// Form-level validation: both cities present and `end_date >= start_date`.
    pub fn validate(&self) -> Result<()> {
        if self.start_city.trim().is_empty() {
            return Err(PlannerError::InvalidTrip(
                "starting city is required".to_string(),
            ));
        }
        if self.destination.trim().is_empty() {
            return Err(PlannerError::InvalidTrip(
                "destination is required".to_string(),
            ));
        }
        if self.end_date < self.start_date {
            return Err(PlannerError::InvalidTrip(
                "end date cannot be before start date".to_string(),
            ));
        }
        Ok(())
    }

    /// Inclusive number of days between start and end date.
    pub fn day_count(&self) -> u32 {
        let span = (self.end_date - self.start_date).num_days().unsigned_abs();
        span as u32 + 1
    }

    /// English month name of the start date.
    pub fn travel_month(&self) -> &'static str {
        const MONTHS: [&str; 12] = [
            "January",
            "February",
            "March",
            "April",
            "May",
            "June",
            "July",
            "August",
            "September",
            "October",
            "November",
            "December",
        ];
        MONTHS[self.start_date.month0() as usize]
    }

    /// Interests split on commas, trimmed, empties dropped.
    pub fn interest_list(&self) -> Vec<&str> {
        self.interests
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Trip details with the travel mode attached; the only input generation accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    #[serde(flatten)]
    pub details: TripDetails,
    pub travel_mode: TravelMode,
}

impl TripRequest {
    pub fn new(details: TripDetails, travel_mode: TravelMode) -> Self {
        Self {
            details,
            travel_mode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotelLocation {
    BusStand,
    MallRoad,
    ScenicView,
}

impl HotelLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            HotelLocation::BusStand => "bus_stand",
            HotelLocation::MallRoad => "mall_road",
            HotelLocation::ScenicView => "scenic_view",
        }
    }

    /// Human phrasing used in prompts, e.g. "scenic view".
    pub fn describe(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl_from_str!(HotelLocation, "hotel location", {
    "bus_stand" => HotelLocation::BusStand,
    "mall_road" => HotelLocation::MallRoad,
    "scenic_view" => HotelLocation::ScenicView,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodPreference {
    Any,
    VegetarianOnly,
}

/// Refinement preferences. `None` on any field means "no preference".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    pub hotel_location: Option<HotelLocation>,
    pub food_preference: Option<FoodPreference>,
    pub budget_upgrade: Option<bool>,
}

impl UserPreferences {
    pub fn is_empty(&self) -> bool {
        self.hotel_location.is_none()
            && self.food_preference.is_none()
            && self.budget_upgrade.is_none()
    }

    pub fn vegetarian_only(&self) -> bool {
        self.food_preference == Some(FoodPreference::VegetarianOnly)
    }

    pub fn allows_upgrade(&self) -> bool {
        self.budget_upgrade == Some(true)
    }
}
