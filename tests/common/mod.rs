#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use trip_planner_rs::{
    Budget, GenerationRequest, PlannerError, Result, TextGenerator, TravelMode, TravelType,
    TripDetails,
};

/// Jamshedpur to Manali, 2024-06-01 through 2024-06-05.
pub fn manali_trip() -> TripDetails {
    TripDetails {
        start_city: "Jamshedpur".to_string(),
        destination: "Manali".to_string(),
        start_date: "2024-06-01".parse().unwrap(),
        end_date: "2024-06-05".parse().unwrap(),
        budget: Budget::Medium,
        travel_type: TravelType::Friends,
        interests: "trekking, local food".to_string(),
    }
}

pub fn transport_options(mode: TravelMode) -> Value {
    match mode {
        TravelMode::Train => json!([{
            "trainNameAndNumber": "Kalka Mail (12311)",
            "travelTime": "approx. 30 hours",
            "availabilitySuggestion": "Book 2-3 weeks in advance",
            "breakJourneyStation": "Delhi",
            "routeDescription": "Tatanagar to Kalka via Delhi"
        }]),
        TravelMode::Flight => json!([{
            "flightNumberAndAirline": "IndiGo 6E-2134",
            "departureAirport": "Ranchi (IXR)",
            "arrivalAirport": "Bhuntar (KUU)",
            "timings": "06:10 - 13:45",
            "duration": "7h 35m",
            "estimatedPrice": "INR 9000-14000",
            "layovers": "Delhi"
        }]),
        TravelMode::Bus => json!([{
            "operator": "HRTC Himsuta",
            "busType": "Volvo AC Semi-Sleeper",
            "departurePoint": "ISBT Kashmere Gate",
            "arrivalPoint": "Manali Bus Stand",
            "timings": "18:30 - 08:00",
            "duration": "13h 30m",
            "estimatedFare": "INR 1500-1800",
            "amenities": ["Charging point", "Blanket"]
        }]),
    }
}

/// A complete, well-formed response for `mode` spanning `days` days.
pub fn itinerary_json(mode: TravelMode, days: u32) -> Value {
    let plans: Vec<Value> = (1..=days)
        .map(|day| {
            json!({
                "day": day,
                "title": format!("Day {day} in Manali"),
                "activities": [
                    { "time": "Morning", "description": "Walk along the Beas river" },
                    "Lunch at a local dhaba"
                ]
            })
        })
        .collect();

    let mut value = json!({
        "destinationName": "Manali",
        "travelModeUsed": mode.as_str(),
        "trainRoutes": null,
        "flightOptions": null,
        "busRoutes": null,
        "transportToDestination": {
            "fromStationOrAirport": "Manali Bus Stand",
            "mode": "Taxi",
            "estimatedCost": "INR 300",
            "travelTime": "15 minutes",
            "scenicRouteDescription": "Pine forests along the river"
        },
        "hotelOptions": [
            { "name": "Snow Peak Retreat", "approxPricePerNight": "INR 3000", "facilities": ["WiFi"], "rating": 4.3, "distanceFromMallRoad": "1 km" },
            { "name": "River Bend Cottage", "approxPricePerNight": "INR 2600", "facilities": ["Breakfast"], "rating": "Good Reviews", "distanceFromMallRoad": "2 km" }
        ],
        "dayWiseItinerary": plans,
        "foodGuide": { "mustTryLocalDishes": ["Siddu", "Trout"], "recommendedRestaurants": ["Johnson's Cafe"] },
        "weatherAdvice": { "expectedTemperature": "10-25°C", "packingSuggestions": ["Light jacket"] },
        "emergencyInfo": { "nearestHospital": "Mission Hospital", "pharmacies": ["Mall Road Chemist"], "localHelplineNumbers": ["112"] },
        "costSummary": {
            "estimatedPrimaryTransportCost": "INR 3400",
            "primaryTransportDescription": "Bus Cost",
            "estimatedLocalTransportCost": "INR 2000",
            "estimatedHotelCost": "INR 12000",
            "estimatedFoodCost": "INR 4000",
            "totalApproximateCost": "INR 21400"
        }
    });
    value[mode.routes_field()] = transport_options(mode);
    value
}

/// Replays canned outcomes in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedGenerator {
    outcomes: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(outcomes: impl IntoIterator<Item = Result<String>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PlannerError::Service("script exhausted".to_string())))
    }
}

/// Base URL of a server that accepts connections and never answers.
pub async fn silent_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    format!("http://{addr}")
}

/// Chat completion envelope wrapping `content`.
pub fn completion(content: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}
