use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::trip::TravelMode;

/// Validated multi-section itinerary returned by the generation workflow.
///
/// Exactly one of `train_routes`, `flight_options` and `bus_routes` is
/// populated, matching `travel_mode_used`; the other two are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    /// Main destination of the trip
    pub destination_name: String,
    /// Travel mode the plan was generated for
    pub travel_mode_used: TravelMode,
    /// Train routes, only when travelling by train
    #[serde(default)]
    pub train_routes: Option<Vec<TrainRoute>>,
    /// Flight options, only when travelling by air
    #[serde(default)]
    pub flight_options: Option<Vec<FlightOption>>,
    /// Bus routes, only when travelling by bus
    #[serde(default)]
    pub bus_routes: Option<Vec<BusRoute>>,
    /// Transfer from the primary arrival point to the destination hotel
    #[serde(default)]
    pub transport_to_destination: Option<TransportToDestination>,
    /// Two or three hotel options matching the budget tier
    pub hotel_options: Vec<HotelOption>,
    /// One entry per day of the trip
    pub day_wise_itinerary: Vec<DayPlan>,
    #[serde(default)]
    pub food_guide: Option<FoodGuide>,
    #[serde(default)]
    pub weather_advice: Option<WeatherAdvice>,
    #[serde(default)]
    pub emergency_info: Option<EmergencyInfo>,
    #[serde(default)]
    pub cost_summary: Option<CostSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrainRoute {
    pub train_name_and_number: String,
    #[serde(default)]
    pub travel_time: String,
    #[serde(default)]
    pub availability_suggestion: String,
    #[serde(default)]
    pub break_journey_station: Option<String>,
    #[serde(default)]
    pub route_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlightOption {
    pub flight_number_and_airline: String,
    #[serde(default)]
    pub departure_airport: String,
    #[serde(default)]
    pub arrival_airport: String,
    #[serde(default)]
    pub timings: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub estimated_price: String,
    #[serde(default)]
    pub layovers: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusRoute {
    pub operator: String,
    #[serde(default)]
    pub bus_type: String,
    #[serde(default)]
    pub departure_point: String,
    #[serde(default)]
    pub arrival_point: String,
    #[serde(default)]
    pub timings: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub estimated_fare: String,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransportToDestination {
    #[serde(default)]
    pub from_station_or_airport: String,
    #[serde(default)]
    pub mode: String,
    #[serde(default)]
    pub estimated_cost: String,
    #[serde(default)]
    pub travel_time: String,
    #[serde(default)]
    pub scenic_route_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HotelOption {
    pub name: String,
    #[serde(default)]
    pub approx_price_per_night: String,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub distance_from_mall_road: String,
}

/// Hotel rating as either a star count or a free-text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Rating {
    Stars(f64),
    Label(String),
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rating::Stars(stars) => write!(f, "{stars} stars"),
            Rating::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DayPlan {
    /// 1-based day counter
    pub day: u32,
    #[serde(default)]
    pub title: String,
    /// Activities in chronological order
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// A day activity: a bare description or a timed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Activity {
    Text(String),
    Timed {
        #[serde(default)]
        time: Option<String>,
        description: String,
    },
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Text(text) => f.write_str(text),
            Activity::Timed {
                time: Some(time),
                description,
            } => write!(f, "{time}: {description}"),
            Activity::Timed { description, .. } => f.write_str(description),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoodGuide {
    #[serde(default)]
    pub must_try_local_dishes: Vec<String>,
    #[serde(default)]
    pub recommended_restaurants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAdvice {
    #[serde(default)]
    pub expected_temperature: String,
    #[serde(default)]
    pub packing_suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyInfo {
    #[serde(default)]
    pub nearest_hospital: String,
    #[serde(default)]
    pub pharmacies: Vec<String>,
    #[serde(default)]
    pub local_helpline_numbers: Vec<String>,
}

/// Per-category estimates; the sub-costs add up to `total_approximate_cost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    #[serde(default)]
    pub estimated_primary_transport_cost: String,
    #[serde(default)]
    pub primary_transport_description: String,
    #[serde(default)]
    pub estimated_local_transport_cost: String,
    #[serde(default)]
    pub estimated_hotel_cost: String,
    #[serde(default)]
    pub estimated_food_cost: String,
    #[serde(default)]
    pub total_approximate_cost: String,
}

impl Itinerary {
    /// Number of transport options for the mode the plan was generated for.
    pub fn transport_option_count(&self) -> usize {
        match self.travel_mode_used {
            TravelMode::Train => self.train_routes.as_ref().map_or(0, Vec::len),
            TravelMode::Flight => self.flight_options.as_ref().map_or(0, Vec::len),
            TravelMode::Bus => self.bus_routes.as_ref().map_or(0, Vec::len),
        }
    }

    /// Generate a human-readable rendering of the itinerary
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("=== Itinerary: {} ===", self.destination_name));
        lines.push(format!("Primary Travel: {}", self.travel_mode_used.label()));

        for route in self.train_routes.iter().flatten() {
            lines.push(format!("  - {}", route.train_name_and_number));
            if let Some(description) = &route.route_description {
                lines.push(format!("    Route: {}", description));
            }
            lines.push(format!("    Travel Time: {}", route.travel_time));
            lines.push(format!("    Availability: {}", route.availability_suggestion));
            if let Some(station) = &route.break_journey_station {
                lines.push(format!("    Break Journey at: {}", station));
            }
        }

        for flight in self.flight_options.iter().flatten() {
            lines.push(format!("  - {}", flight.flight_number_and_airline));
            lines.push(format!(
                "    From: {} To: {}",
                flight.departure_airport, flight.arrival_airport
            ));
            lines.push(format!(
                "    Timings: {} ({})",
                flight.timings, flight.duration
            ));
            lines.push(format!("    Est. Price: {}", flight.estimated_price));
            if let Some(layovers) = &flight.layovers {
                lines.push(format!("    Layovers: {}", layovers));
            }
        }

        for bus in self.bus_routes.iter().flatten() {
            lines.push(format!("  - {} ({})", bus.operator, bus.bus_type));
            lines.push(format!(
                "    From: {} To: {}",
                bus.departure_point, bus.arrival_point
            ));
            lines.push(format!("    Timings: {} ({})", bus.timings, bus.duration));
            lines.push(format!("    Est. Fare: {}", bus.estimated_fare));
            if let Some(amenities) = bus.amenities.as_ref().filter(|a| !a.is_empty()) {
                lines.push(format!("    Amenities: {}", amenities.join(", ")));
            }
        }

        if let Some(transfer) = &self.transport_to_destination {
            lines.push(String::new());
            lines.push("--- Getting to Your Hotel ---".to_string());
            lines.push(format!(
                "From {} by {} ({}, {})",
                transfer.from_station_or_airport,
                transfer.mode,
                transfer.travel_time,
                transfer.estimated_cost
            ));
            if let Some(scenic) = &transfer.scenic_route_description {
                lines.push(scenic.clone());
            }
        }

        lines.push(String::new());
        lines.push("--- Hotels ---".to_string());
        for hotel in &self.hotel_options {
            let rating = hotel
                .rating
                .as_ref()
                .map(|r| format!(", {}", r))
                .unwrap_or_default();
            lines.push(format!(
                "  - {} ({}/night{})",
                hotel.name, hotel.approx_price_per_night, rating
            ));
            if !hotel.facilities.is_empty() {
                lines.push(format!("    Facilities: {}", hotel.facilities.join(", ")));
            }
        }

        lines.push(String::new());
        lines.push("--- Day by Day ---".to_string());
        for day in &self.day_wise_itinerary {
            lines.push(format!("Day {}: {}", day.day, day.title));
            for activity in &day.activities {
                lines.push(format!("  • {}", activity));
            }
        }

        if let Some(food) = &self.food_guide {
            lines.push(String::new());
            lines.push("--- Food Guide ---".to_string());
            lines.push(format!("Must try: {}", food.must_try_local_dishes.join(", ")));
            for restaurant in &food.recommended_restaurants {
                lines.push(format!("  - {}", restaurant));
            }
        }

        if let Some(weather) = &self.weather_advice {
            lines.push(String::new());
            lines.push("--- Weather ---".to_string());
            lines.push(format!("Expected: {}", weather.expected_temperature));
            lines.push(format!("Pack: {}", weather.packing_suggestions.join(", ")));
        }

        if let Some(emergency) = &self.emergency_info {
            lines.push(String::new());
            lines.push("--- Emergency ---".to_string());
            lines.push(format!("Hospital: {}", emergency.nearest_hospital));
            lines.push(format!("Pharmacies: {}", emergency.pharmacies.join(", ")));
            lines.push(format!(
                "Helplines: {}",
                emergency.local_helpline_numbers.join(", ")
            ));
        }

        if let Some(cost) = &self.cost_summary {
            lines.push(String::new());
            lines.push("--- Cost Summary ---".to_string());
            lines.push(format!(
                "{}: {}",
                cost.primary_transport_description, cost.estimated_primary_transport_cost
            ));
            lines.push(format!("Local transport: {}", cost.estimated_local_transport_cost));
            lines.push(format!("Hotels: {}", cost.estimated_hotel_cost));
            lines.push(format!("Food: {}", cost.estimated_food_cost));
            lines.push(format!("Total: {}", cost.total_approximate_cost));
        }

        lines.join("\n")
    }
}
