//! Builds the generation request for a trip.
//!
//! Everything here is a pure function of the trip and the preferences: no
//! I/O, no clock, no randomness. The caller has already validated the date
//! range.

use serde_json::{json, Value};
use tracing::debug;

use crate::{
    schemas::ResponseSchema,
    types::trip::{Budget, TravelMode, TripRequest, UserPreferences},
};

/// Fixed system-level instructions sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert travel planner. You produce practical, \
budget-aware itineraries. Always answer with a single JSON object that follows the requested \
structure exactly, with no commentary before or after it. Populate only the transport section \
for the requested travel mode and set the other transport sections to null.";

/// A fully prepared request for the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub trip: TripRequest,
    pub preferences: UserPreferences,
    pub system_instruction: String,
    pub prompt: String,
    /// Example JSON structure embedded in the prompt
    pub template: Value,
    pub schema: ResponseSchema,
}

impl GenerationRequest {
    pub fn travel_mode(&self) -> TravelMode {
        self.trip.travel_mode
    }

    pub fn day_count(&self) -> u32 {
        self.schema.day_count()
    }
}

/// Inputs shared by every template section.
struct TripContext<'a> {
    trip: &'a TripRequest,
    preferences: &'a UserPreferences,
    days: u32,
    month: &'static str,
    budget: &'static str,
}

/// Mode-specific pieces of the request, one per travel mode.
struct ModeTemplate {
    focus: String,
    routes: Value,
    cost_estimate: String,
    cost_label: &'static str,
    day_one_title: String,
    day_one_activities: Vec<String>,
}

impl ModeTemplate {
    fn select(ctx: &TripContext<'_>) -> Self {
        let from = ctx.trip.details.start_city.as_str();
        let to = ctx.trip.details.destination.as_str();
        let budget = ctx.budget;
        let month = ctx.month;

        match ctx.trip.travel_mode {
            TravelMode::Train => ModeTemplate {
                focus: format!(
                    "Primary travel mode is TRAIN. Focus on train routes from {from} to a rail hub near {to}."
                ),
                routes: json!([
                    {
                        "trainNameAndNumber": format!("string (Train route 1: a named express from {from} towards {to})"),
                        "travelTime": "string (e.g., 'Approx 24 hours to the break station')",
                        "availabilitySuggestion": format!("string (e.g., 'Book 4-6 weeks ahead; {budget} classes fill quickly in {month}.')"),
                        "breakJourneyStation": "string | null (station where the rail leg ends, if any)",
                        "routeDescription": format!("string (e.g., 'Board the train at {from}, change at the break station, continue to {to}.')")
                    },
                    {
                        "trainNameAndNumber": "string (Train route 2: an alternative connection via a different hub)",
                        "travelTime": "string",
                        "availabilitySuggestion": format!("string (availability notes for this connection in {month})"),
                        "breakJourneyStation": "string | null",
                        "routeDescription": format!("string (alternative break journey point closer to {to})")
                    }
                ]),
                cost_estimate: format!(
                    "string (e.g., 'INR 1500-3000 per person for the train leg, depending on class and the {budget} budget')"
                ),
                cost_label: "Train Cost",
                day_one_title: format!("Arrival at Break Journey Station & Transfer to {to}"),
                day_one_activities: vec![
                    "string (e.g., 'Arrive at the break journey station by the morning train.')".to_string(),
                    format!("string (e.g., 'Take a pre-booked taxi or an AC bus towards {to}.')"),
                    format!("string (e.g., 'Reach {to} by evening and check into the hotel.')"),
                    format!("string (e.g., 'Dinner at a place that fits a {budget} budget.')"),
                ],
            },
            TravelMode::Flight => ModeTemplate {
                focus: format!(
                    "Primary travel mode is FLIGHT. Focus on flights from an airport near {from} to an airport near {to}."
                ),
                routes: json!([
                    {
                        "flightNumberAndAirline": "string (Flight 1: flight number and airline)",
                        "departureAirport": format!("string (nearest major airport to {from})"),
                        "arrivalAirport": format!("string (nearest airport to {to})"),
                        "timings": "string (e.g., 'Dep: 10:00 AM, Arr: 12:30 PM')",
                        "duration": "string (e.g., '2h 30m direct')",
                        "estimatedPrice": format!("string (typical one-way price in {month} for a {budget} budget)"),
                        "layovers": "string | null (null for direct flights)"
                    },
                    {
                        "flightNumberAndAirline": "string (Flight 2: an alternative routing or airport)",
                        "departureAirport": format!("string (airport near {from})"),
                        "arrivalAirport": format!("string (alternative airport within driving distance of {to})"),
                        "timings": "string",
                        "duration": "string (e.g., '3h via a hub')",
                        "estimatedPrice": format!("string (typical one-way price in {month} for a {budget} budget)"),
                        "layovers": "string | null (e.g., '1 stop, 1h 30m')"
                    }
                ]),
                cost_estimate: format!(
                    "string (e.g., 'INR 5000-10000 per person for flights on a {budget} budget, depending on booking time')"
                ),
                cost_label: "Flight Cost",
                day_one_title: format!("Arrival by Flight & Transfer to {to}"),
                day_one_activities: vec![
                    "string (e.g., 'Land at the arrival airport.')".to_string(),
                    format!("string (e.g., 'Collect baggage and take a pre-booked taxi or shuttle to {to}.')"),
                    format!("string (e.g., 'Check into the hotel in {to} by afternoon.')"),
                    format!("string (e.g., 'Short evening walk; dinner fitting a {budget} budget.')"),
                ],
            },
            TravelMode::Bus => ModeTemplate {
                focus: format!(
                    "Primary travel mode is BUS. Focus on bus routes, possibly connecting, from {from} to {to}. \
                     Acknowledge long journeys and likely changeovers at major hubs."
                ),
                routes: json!([
                    {
                        "operator": "string (Bus option 1: operator name)",
                        "busType": format!("string (e.g., 'AC sleeper from a major hub to {to}')"),
                        "departurePoint": "string (bus terminal of departure)",
                        "arrivalPoint": format!("string (e.g., '{to} Bus Stand')"),
                        "timings": "string (e.g., 'Dep: 8:00 PM, Arr: 10:00 AM')",
                        "duration": "string (e.g., 'Approx 12-14 hours')",
                        "estimatedFare": format!("string (fare per person for a {budget} budget)"),
                        "amenities": ["Charging points", "Blankets", "Water bottle"]
                    },
                    {
                        "operator": format!("string (Bus option 2: connecting operator from {from} to the hub)"),
                        "busType": "string (e.g., 'Semi-sleeper or AC seater')",
                        "departurePoint": format!("string (e.g., '{from} Bus Stand')"),
                        "arrivalPoint": "string (connecting hub terminal)",
                        "timings": "string (e.g., 'Multiple departures, often overnight')",
                        "duration": "string",
                        "estimatedFare": format!("string (fare per person for this leg, {budget} budget)"),
                        "amenities": ["Basic amenities, may vary"]
                    }
                ]),
                cost_estimate: format!(
                    "string (e.g., 'INR 1500-3500 per person for the bus journey on a {budget} budget, may involve multiple legs')"
                ),
                cost_label: "Bus Cost",
                day_one_title: format!("Bus Journey & Arrival in {to} (or en-route stop)"),
                day_one_activities: vec![
                    format!("string (e.g., 'Board the bus at {from} or the connecting hub.')"),
                    "string (e.g., 'Overnight journey; keep comfort items handy.')".to_string(),
                    "string (e.g., 'Changeover or rest stop at a major city on long multi-leg trips.')".to_string(),
                    format!("string (e.g., 'Reach {to} and grab a meal that fits a {budget} budget.')"),
                ],
            },
        }
    }
}

struct PriceBands {
    nightly: &'static str,
    hotel_total: &'static str,
    food_per_day: &'static str,
    total: &'static str,
}

fn price_bands(budget: Budget) -> PriceBands {
    match budget {
        Budget::Low => PriceBands {
            nightly: "INR 1000-2500",
            hotel_total: "INR 4000-10000",
            food_per_day: "INR 400-700",
            total: "INR 15000-25000",
        },
        Budget::Medium => PriceBands {
            nightly: "INR 2500-4500",
            hotel_total: "INR 10000-18000",
            food_per_day: "INR 700-1200",
            total: "INR 25000-45000",
        },
        Budget::High => PriceBands {
            nightly: "INR 5000-8000",
            hotel_total: "INR 20000-32000",
            food_per_day: "INR 1200-2000",
            total: "INR 40000-70000",
        },
    }
}

/// Build the generation request for `trip` with the given `preferences`.
pub fn build_request(trip: &TripRequest, preferences: &UserPreferences) -> GenerationRequest {
    let days = trip.details.day_count();
    let ctx = TripContext {
        trip,
        preferences,
        days,
        month: trip.details.travel_month(),
        budget: trip.details.budget.as_str(),
    };
    let mode = ModeTemplate::select(&ctx);
    let template = build_template(&ctx, &mode);
    let prompt = build_prompt(&ctx, &mode, &template);

    debug!(
        target: "tripplanner::request",
        travel_mode = %trip.travel_mode,
        days,
        prompt_len = prompt.len(),
        "built generation request"
    );

    GenerationRequest {
        trip: trip.clone(),
        preferences: *preferences,
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        prompt,
        template,
        schema: ResponseSchema::for_trip(trip.travel_mode, days),
    }
}

fn build_template(ctx: &TripContext<'_>, mode: &ModeTemplate) -> Value {
    let details = &ctx.trip.details;
    let to = details.destination.as_str();
    let budget = ctx.budget;
    let travel_type = details.travel_type.as_str();
    let bands = price_bands(details.budget);
    let location = ctx
        .preferences
        .hotel_location
        .map(|loc| loc.describe())
        .unwrap_or_else(|| "any location".to_string());
    let interests = details.interest_list();
    let first_interest = interests.first().copied().unwrap_or("sightseeing");
    let second_interest = interests.get(1).copied().unwrap_or("sightseeing");
    let nights = ctx.days.saturating_sub(1);

    let mut day_plans = vec![json!({
        "day": 1,
        "title": format!("string (e.g., '{}')", mode.day_one_title),
        "activities": mode.day_one_activities,
    })];
    if ctx.days > 1 {
        day_plans.push(json!({
            "day": 2,
            "title": format!("string (e.g., 'Exploring {to}: {first_interest}')"),
            "activities": [
                format!("string (e.g., 'Morning: visit an attraction for {first_interest} that fits a {budget} budget.')"),
                {
                    "time": "Afternoon",
                    "description": format!("Lunch at a {budget}-friendly place, then an activity around {second_interest}.")
                },
                format!("string (e.g., 'Evening: local market or leisure suited to a {travel_type} trip.')")
            ]
        }));
    }

    let dishes_note = if ctx.preferences.vegetarian_only() {
        "vegetarian dishes only"
    } else {
        "any cuisine"
    };

    let mut template = json!({
        "trainRoutes": Value::Null,
        "flightOptions": Value::Null,
        "busRoutes": Value::Null,
        "travelModeUsed": ctx.trip.travel_mode.as_str(),
        "destinationName": to,
        "transportToDestination": {
            "fromStationOrAirport": format!("string (arrival station/airport of the primary journey if not in {to})"),
            "mode": format!("string ('Taxi', 'Local Bus' or 'Hotel Pickup' from the arrival point to the hotel in {to})"),
            "estimatedCost": format!("string (typical cost of this transfer on a {budget} budget)"),
            "travelTime": "string (e.g., 'Approx 7-9 hours by taxi' or '15-20 mins')",
            "scenicRouteDescription": "string | null"
        },
        "hotelOptions": [
            {
                "name": format!("string (Hotel option 1 in {to}, {budget} budget, {travel_type} trip, {location})"),
                "approxPricePerNight": format!("string (e.g., '{}')", bands.nightly),
                "facilities": ["Wi-Fi", format!("Breakfast (if typical for a {budget} budget)"), "Hot water"],
                "rating": "string or number (e.g., '4.0 stars')",
                "distanceFromMallRoad": format!("string (distance to the main market or to the preferred location: {location})")
            },
            {
                "name": format!("string (Hotel option 2, distinct from option 1, {budget} budget)"),
                "approxPricePerNight": "string (similar range to option 1)",
                "facilities": ["Wi-Fi", "Restaurant", "Parking"],
                "rating": "string or number",
                "distanceFromMallRoad": "string"
            }
        ],
        "dayWiseItinerary": day_plans,
        "foodGuide": {
            "mustTryLocalDishes": [format!("string (local dishes of {to}, {dishes_note})")],
            "recommendedRestaurants": [format!("string (a kind of restaurant in {to} fitting a {budget} budget)")]
        },
        "weatherAdvice": {
            "expectedTemperature": format!("string (typical temperature in {to} during {})", ctx.month),
            "packingSuggestions": ["Comfortable walking shoes", format!("Rain gear if {} is wet", ctx.month), "Personal medication"]
        },
        "emergencyInfo": {
            "nearestHospital": format!("string (main hospital in {to})"),
            "pharmacies": ["string"],
            "localHelplineNumbers": ["Police: 100", "Ambulance: 108"]
        },
        "costSummary": {
            "estimatedPrimaryTransportCost": mode.cost_estimate,
            "primaryTransportDescription": mode.cost_label,
            "estimatedLocalTransportCost": format!("string (local sightseeing and transfers on a {budget} budget)"),
            "estimatedHotelCost": format!("string (e.g., '{} for {nights} nights for a {travel_type} trip')", bands.hotel_total),
            "estimatedFoodCost": format!("string (e.g., '{} per person per day')", bands.food_per_day),
            "totalApproximateCost": format!("string (e.g., '{} per person for {} days'; the sum of the costs above)", bands.total, ctx.days)
        }
    });
    template[ctx.trip.travel_mode.routes_field()] = mode.routes.clone();
    template
}

fn build_prompt(ctx: &TripContext<'_>, mode: &ModeTemplate, template: &Value) -> String {
    let details = &ctx.trip.details;
    let travel_mode = ctx.trip.travel_mode;
    let budget = ctx.budget;
    let mut lines = Vec::new();

    lines.push(
        "Generate a detailed travel itinerary based on the following inputs. Respond with ONLY a valid JSON object."
            .to_string(),
    );
    lines.push(format!(
        "The trip is from {} to {} from {} to {} ({} days) during {}.",
        details.start_city,
        details.destination,
        details.start_date,
        details.end_date,
        ctx.days,
        ctx.month
    ));
    lines.push(format!("The selected travel mode is: {}.", travel_mode));
    lines.push(format!(
        "The budget is {}. Travel type is {}, with interests in {}.",
        budget,
        details.travel_type.as_str(),
        details.interests
    ));
    lines.push(format!(
        "Keep every suggestion, especially hotels, food, activities and overall costs, consistent with the {budget} budget."
    ));

    if let Some(location) = ctx.preferences.hotel_location {
        lines.push(format!(
            "- Preferred Hotel Location: {}. Only suggest hotels in that area.",
            location.describe()
        ));
    }
    if ctx.preferences.vegetarian_only() {
        lines.push(
            "- Food Preference: Vegetarian Only. Suggest only vegetarian dishes and restaurants."
                .to_string(),
        );
    }
    if ctx.preferences.allows_upgrade() {
        lines.push(format!(
            "- Budget Upgrade: the traveller is open to slight upgrades for better experiences, but core suggestions must still fit the {budget} budget."
        ));
    }

    lines.push(String::new());
    lines.push(mode.focus.clone());
    lines.push(String::new());
    lines.push(format!(
        "JSON structure required. Populate only `{}` for '{}'; `{}` must be null:",
        travel_mode.routes_field(),
        travel_mode,
        other_routes(travel_mode).join("` and `")
    ));
    lines.push(format!("{:#}", template));
    lines.push(format!(
        "The 'dayWiseItinerary' must contain exactly {} entries, numbered 1 to {}.",
        ctx.days, ctx.days
    ));
    lines.push(format!(
        "Provide 2-3 hotel options that strictly reflect the {budget} budget, and 1-2 {} options.",
        travel_mode
    ));
    lines.push(
        "'transportToDestination' covers the journey from the main arrival point to the hotel; keep it brief if the primary journey ends in the destination itself."
            .to_string(),
    );

    lines.join("\n")
}

fn other_routes(mode: TravelMode) -> Vec<&'static str> {
    TravelMode::ALL
        .iter()
        .filter(|candidate| **candidate != mode)
        .map(TravelMode::routes_field)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::trip::{FoodPreference, HotelLocation, TravelType, TripDetails};

    fn trip(mode: TravelMode, start: &str, end: &str) -> TripRequest {
        TripRequest::new(
            TripDetails {
                start_city: "Jamshedpur".to_string(),
                destination: "Manali".to_string(),
                start_date: start.parse().unwrap(),
                end_date: end.parse().unwrap(),
                budget: Budget::Medium,
                travel_type: TravelType::Family,
                interests: "Nature, Adventure".to_string(),
            },
            mode,
        )
    }

    #[test]
    fn test_exactly_one_transport_branch() {
        for mode in TravelMode::ALL {
            let request = build_request(
                &trip(mode, "2024-06-01", "2024-06-05"),
                &UserPreferences::default(),
            );
            for other in TravelMode::ALL {
                let branch = &request.template[other.routes_field()];
                if other == mode {
                    assert!(branch.is_array(), "{mode} should populate {}", other.routes_field());
                } else {
                    assert!(branch.is_null(), "{} should be null for {mode}", other.routes_field());
                }
            }
            assert_eq!(request.template["travelModeUsed"], mode.as_str());
        }
    }

    #[test]
    fn test_cost_label_follows_mode() {
        let request = build_request(
            &trip(TravelMode::Flight, "2024-06-01", "2024-06-03"),
            &UserPreferences::default(),
        );
        assert_eq!(
            request.template["costSummary"]["primaryTransportDescription"],
            "Flight Cost"
        );
        assert!(request.template["dayWiseItinerary"][0]["title"]
            .as_str()
            .unwrap()
            .contains("Arrival by Flight"));
    }

    #[test]
    fn test_prompt_carries_trip_length_and_month() {
        let request = build_request(
            &trip(TravelMode::Bus, "2024-06-01", "2024-06-05"),
            &UserPreferences::default(),
        );
        assert_eq!(request.day_count(), 5);
        assert!(request.prompt.contains("(5 days) during June"));
        assert!(request.prompt.contains("exactly 5 entries"));
        assert!(request.prompt.contains("Primary travel mode is BUS"));
        assert!(!request.prompt.contains("Preferred Hotel Location"));
        assert!(!request.prompt.contains("Budget Upgrade"));
    }

    #[test]
    fn test_single_day_trip_has_one_example_day() {
        let request = build_request(
            &trip(TravelMode::Train, "2024-06-01", "2024-06-01"),
            &UserPreferences::default(),
        );
        assert_eq!(request.day_count(), 1);
        assert_eq!(
            request.template["dayWiseItinerary"].as_array().unwrap().len(),
            1
        );
    }

    #[test]
    fn test_preferences_are_injected() {
        let prefs = UserPreferences {
            hotel_location: Some(HotelLocation::ScenicView),
            food_preference: Some(FoodPreference::VegetarianOnly),
            budget_upgrade: Some(true),
        };
        let request = build_request(&trip(TravelMode::Bus, "2024-06-01", "2024-06-05"), &prefs);

        assert!(request.prompt.contains("Preferred Hotel Location: scenic view"));
        assert!(request.prompt.contains("Vegetarian Only"));
        assert!(request.prompt.contains("core suggestions must still fit the Medium budget"));
        assert!(request.template["hotelOptions"][0]["name"]
            .as_str()
            .unwrap()
            .contains("scenic view"));
    }

    #[test]
    fn test_declined_upgrade_adds_nothing() {
        let prefs = UserPreferences {
            budget_upgrade: Some(false),
            food_preference: Some(FoodPreference::Any),
            ..UserPreferences::default()
        };
        let request = build_request(&trip(TravelMode::Bus, "2024-06-01", "2024-06-05"), &prefs);
        assert!(!request.prompt.contains("Budget Upgrade"));
        assert!(!request.prompt.contains("Vegetarian Only"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let t = trip(TravelMode::Train, "2024-12-20", "2024-12-24");
        let prefs = UserPreferences::default();
        assert_eq!(build_request(&t, &prefs), build_request(&t, &prefs));
    }
}
