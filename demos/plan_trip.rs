use std::time::Duration;

use trip_planner_rs::{
    Budget, HotelLocation, PlannerConfig, PlannerSession, TravelMode, TravelType, TripDetails,
    UserPreferences,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::try_init().ok();

    let config = PlannerConfig::from_env()?.with_close_delay(Duration::from_secs(3));
    let mut session = PlannerSession::from_config(&config);

    println!("=== Trip Planner ===\n");

    session.submit_trip(TripDetails {
        start_city: "Jamshedpur".to_string(),
        destination: "Manali".to_string(),
        start_date: "2024-06-01".parse()?,
        end_date: "2024-06-05".parse()?,
        budget: Budget::Medium,
        travel_type: TravelType::Friends,
        interests: "trekking, local food, cafes".to_string(),
    })?;

    let itinerary = session.select_mode(TravelMode::Bus).await?;
    println!("{}", itinerary.summary());

    println!("\n--- Refining: hotels with a scenic view ---");
    session.begin_refinement()?;
    let preferences = UserPreferences {
        hotel_location: Some(HotelLocation::ScenicView),
        ..UserPreferences::default()
    };
    match session.submit_preferences(preferences).await {
        Ok(itinerary) => println!("{}", itinerary.summary()),
        Err(err) => println!("Refinement failed: {}", err.user_message()),
    }

    session.close()?;
    println!("\nThanks for planning with us!");
    session.wait_for_reset().await;
    println!("Planner state: {}", session.state());

    Ok(())
}
