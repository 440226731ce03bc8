pub mod itinerary;
pub mod trip;

pub use itinerary::{
    Activity, BusRoute, CostSummary, DayPlan, EmergencyInfo, FlightOption, FoodGuide,
    HotelOption, Itinerary, Rating, TrainRoute, TransportToDestination, WeatherAdvice,
};
pub use trip::{
    Budget, FoodPreference, HotelLocation, TravelMode, TravelType, TripDetails, TripRequest,
    UserPreferences,
};
