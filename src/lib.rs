//! trip-planner-rs: structured-output trip itinerary planning over an LLM
//!
//! The crate turns a trip description into a validated, multi-section
//! itinerary. A [`PlannerWorkflow`] sequences trip collection, travel mode
//! selection, generation, refinement and closing; the request builder and the
//! response normalizer keep everything that crosses the generation boundary
//! typed and checked.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use trip_planner_rs::{PlannerConfig, PlannerSession, TravelMode, TripDetails, Budget, TravelType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlannerConfig::from_env()?;
//!     let mut session = PlannerSession::from_config(&config);
//!
//!     session.submit_trip(TripDetails {
//!         start_city: "Jamshedpur".into(),
//!         destination: "Manali".into(),
//!         start_date: "2024-06-01".parse()?,
//!         end_date: "2024-06-05".parse()?,
//!         budget: Budget::Medium,
//!         travel_type: TravelType::Friends,
//!         interests: "trekking, cafes".into(),
//!     })?;
//!
//!     let itinerary = session.select_mode(TravelMode::Bus).await?;
//!     println!("{}", itinerary.summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod schemas;
pub mod services;
pub mod types;

pub use config::PlannerConfig;
pub use core::{PlannerSession, PlannerWorkflow, WorkflowState};
pub use error::{PlannerError, Result};
pub use schemas::{schema_violations, ResponseSchema};
pub use services::{
    build_request, GenerationClient, GenerationRequest, ResponseNormalizer, TextGenerator,
};
pub use types::{
    Activity, Budget, DayPlan, FoodPreference, HotelLocation, Itinerary, TravelMode, TravelType,
    TripDetails, TripRequest, UserPreferences,
};

#[cfg(feature = "cli")]
pub mod cli;
