use crate::{
    Budget, FoodPreference, HotelLocation, Itinerary, PlannerConfig, PlannerError, PlannerSession,
    TravelMode, TravelType, TripDetails, UserPreferences, WorkflowState,
};
use anyhow::{anyhow, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::time::Duration;
use tracing::{error, info};

fn command() -> Command {
    Command::new("trip-planner")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Plan a trip itinerary with an LLM and optionally refine it")
        .arg(required_arg("from", "CITY", "Starting city"))
        .arg(required_arg("to", "CITY", "Destination city"))
        .arg(required_arg("start", "YYYY-MM-DD", "First day of the trip"))
        .arg(required_arg("end", "YYYY-MM-DD", "Last day of the trip (inclusive)"))
        .arg(required_arg("mode", "MODE", "Travel mode: train, flight or bus"))
        .arg(
            Arg::new("budget")
                .long("budget")
                .value_name("TIER")
                .help("Budget tier: low, medium or high")
                .default_value("medium"),
        )
        .arg(
            Arg::new("travel-type")
                .long("travel-type")
                .value_name("TYPE")
                .help("Solo, couple, family, friends or business")
                .default_value("solo"),
        )
        .arg(
            Arg::new("interests")
                .long("interests")
                .value_name("LIST")
                .help("Comma-separated interests"),
        )
        .arg(
            Arg::new("hotel-location")
                .long("hotel-location")
                .value_name("AREA")
                .help("Refine with a hotel area: bus_stand, mall_road or scenic_view"),
        )
        .arg(
            Arg::new("vegetarian")
                .long("vegetarian")
                .action(ArgAction::SetTrue)
                .help("Refine with vegetarian-only food suggestions"),
        )
        .arg(
            Arg::new("upgrade")
                .long("upgrade")
                .action(ArgAction::SetTrue)
                .help("Refine allowing modest budget upgrades"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the itinerary as JSON instead of text"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("Model to use (or set TRIP_PLANNER_MODEL)"),
        )
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .help("API key (or set TRIP_PLANNER_API_KEY / OPENAI_API_KEY)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .help("Base URL (or set OPENAI_BASE_URL / OPENROUTER_BASE_URL)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Request timeout in seconds (or set TRIP_PLANNER_TIMEOUT_SECS)"),
        )
}

fn required_arg(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name(value_name)
        .help(help)
        .required(true)
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> anyhow::Result<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing --{name}"))
}

fn config_from(matches: &ArgMatches) -> anyhow::Result<PlannerConfig> {
    let mut config = PlannerConfig::from_env()?;
    if let Some(api_key) = matches.get_one::<String>("api-key") {
        config = config.with_api_key(api_key.clone());
    }
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config = config.with_model(model.clone());
    }
    if let Some(timeout) = matches.get_one::<String>("timeout") {
        let secs: u64 = timeout
            .parse()
            .with_context(|| format!("invalid --timeout `{timeout}`"))?;
        config = config.with_timeout(Duration::from_secs(secs));
    }
    Ok(config)
}

fn trip_from(matches: &ArgMatches) -> anyhow::Result<TripDetails> {
    let start = value(matches, "start")?;
    let end = value(matches, "end")?;
    Ok(TripDetails {
        start_city: value(matches, "from")?.to_string(),
        destination: value(matches, "to")?.to_string(),
        start_date: start
            .parse()
            .with_context(|| format!("invalid --start date `{start}`"))?,
        end_date: end
            .parse()
            .with_context(|| format!("invalid --end date `{end}`"))?,
        budget: value(matches, "budget")?.parse::<Budget>()?,
        travel_type: value(matches, "travel-type")?.parse::<TravelType>()?,
        interests: matches
            .get_one::<String>("interests")
            .cloned()
            .unwrap_or_default(),
    })
}

fn preferences_from(matches: &ArgMatches) -> anyhow::Result<UserPreferences> {
    let hotel_location = matches
        .get_one::<String>("hotel-location")
        .map(|area| area.parse::<HotelLocation>())
        .transpose()?;
    Ok(UserPreferences {
        hotel_location,
        food_preference: matches
            .get_flag("vegetarian")
            .then_some(FoodPreference::VegetarianOnly),
        budget_upgrade: matches.get_flag("upgrade").then_some(true),
    })
}

/// `--json` callers get the structured payload on stdout, everyone else the user message on stderr.
fn failure_text(err: &PlannerError, as_json: bool) -> anyhow::Result<String> {
    if as_json {
        Ok(serde_json::to_string_pretty(&err.to_error_payload())?)
    } else {
        Ok(err.user_message())
    }
}

fn report_failure(err: &PlannerError, as_json: bool) -> anyhow::Result<()> {
    let text = failure_text(err, as_json)?;
    if as_json {
        println!("{text}");
    } else {
        eprintln!("{text}");
    }
    Ok(())
}

fn print_itinerary(itinerary: &Itinerary, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(itinerary)?);
    } else {
        println!("\n{}", itinerary.summary());
    }
    Ok(())
}

/// CLI entry point for the trip-planner tool
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let matches = command().get_matches();
    let config = config_from(&matches)?;
    let trip = trip_from(&matches)?;
    let travel_mode: TravelMode = value(&matches, "mode")?.parse()?;
    let preferences = preferences_from(&matches)?;
    let as_json = matches.get_flag("json");

    info!("Using model: {}", config.model);
    info!("Base URL: {}", config.base_url);

    let mut session = PlannerSession::from_config(&config);
    session.submit_trip(trip)?;

    match session.select_mode(travel_mode).await {
        Ok(itinerary) => print_itinerary(itinerary, as_json)?,
        Err(e) => {
            error!("Itinerary generation failed: {}", e);
            report_failure(&e, as_json)?;
            return Err(anyhow!("itinerary generation failed ({})", e.error_code()));
        }
    }

    if !preferences.is_empty() {
        session.begin_refinement()?;
        info!("Refining itinerary with {:?}", preferences);
        match session.submit_preferences(preferences).await {
            Ok(itinerary) => print_itinerary(itinerary, as_json)?,
            Err(e) => {
                error!("Refinement failed, keeping the previous itinerary: {}", e);
                report_failure(&e, as_json)?;
            }
        }
    }

    if session.state() == WorkflowState::ReviewingItinerary {
        session.plan_new_trip()?;
    }
    Ok(())
}
