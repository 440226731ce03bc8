//! Turns untrusted generation output into a validated [`Itinerary`].
//!
//! Checks run in a fixed order and the first failing check wins. Recoverable
//! shape problems are repaired in place and logged; everything else is a
//! typed [`PlannerError`].

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::request_builder::GenerationRequest;
use crate::{
    error::{PlannerError, Result},
    schemas::{schema_violations, ResponseSchema},
    types::{itinerary::Itinerary, trip::TravelMode},
};

const REQUIRED_FIELDS: [&str; 4] = [
    "destinationName",
    "dayWiseItinerary",
    "hotelOptions",
    "travelModeUsed",
];

/// Validates responses against what a particular request asked for.
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    schema: ResponseSchema,
}

impl ResponseNormalizer {
    pub fn new(travel_mode: TravelMode, day_count: u32) -> Self {
        Self {
            schema: ResponseSchema::for_trip(travel_mode, day_count),
        }
    }

    pub fn for_request(request: &GenerationRequest) -> Self {
        Self {
            schema: request.schema.clone(),
        }
    }

    pub fn travel_mode(&self) -> TravelMode {
        self.schema.travel_mode()
    }

    pub fn day_count(&self) -> u32 {
        self.schema.day_count()
    }

    pub fn normalize(&self, raw: &str) -> Result<Itinerary> {
        let body = strip_fences(raw);

        let mut value: Value = serde_json::from_str(body).map_err(|err| {
            debug!(target: "tripplanner::normalize", error = %err, "response is not valid JSON");
            PlannerError::malformed(body)
        })?;

        let empty = Map::new();
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|field| is_missing(value.as_object().unwrap_or(&empty).get(*field)))
            .collect();
        if !missing.is_empty() {
            return Err(PlannerError::IncompleteItinerary { missing });
        }

        let Some(object) = value.as_object_mut() else {
            return Err(PlannerError::IncompleteItinerary {
                missing: REQUIRED_FIELDS.to_vec(),
            });
        };

        self.check_mode(object)?;
        repair_hotel_options(object);
        self.enforce_mode_exclusivity(object);

        if !object
            .get("dayWiseItinerary")
            .map_or(false, Value::is_array)
        {
            return Err(PlannerError::InvalidItinerary(
                "dayWiseItinerary should be an array".to_string(),
            ));
        }

        self.check_transport_options(object)?;
        self.check_day_count(object)?;

        for violation in schema_violations(&self.schema, &value) {
            warn!(target: "tripplanner::normalize", %violation, "response deviates from the itinerary schema");
        }

        decode(value)
    }

    fn check_mode(&self, object: &Map<String, Value>) -> Result<()> {
        let requested = self.travel_mode();
        let received = match object.get("travelModeUsed") {
            Some(Value::String(mode)) => mode.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };
        if received != requested.as_str() {
            warn!(target: "tripplanner::normalize", %requested, %received, "travel mode mismatch");
            return Err(PlannerError::ModeMismatch {
                requested,
                received,
            });
        }
        Ok(())
    }

    fn enforce_mode_exclusivity(&self, object: &mut Map<String, Value>) {
        for other in TravelMode::ALL
            .into_iter()
            .filter(|mode| *mode != self.travel_mode())
        {
            let field = other.routes_field();
            if object.get(field).map_or(false, |value| !value.is_null()) {
                warn!(
                    target: "tripplanner::normalize",
                    field,
                    requested = %self.travel_mode(),
                    "response populated a transport section for another mode, setting to null"
                );
            }
            object.insert(field.to_string(), Value::Null);
        }
    }

    fn check_transport_options(&self, object: &mut Map<String, Value>) -> Result<()> {
        let field = self.travel_mode().routes_field();
        match object.get_mut(field) {
            None | Some(Value::Null) => Err(PlannerError::IncompleteItinerary {
                missing: vec![field],
            }),
            Some(Value::Array(options)) => {
                if options.is_empty() {
                    warn!(target: "tripplanner::normalize", field, "response contains no transport options for the selected mode");
                }
                Ok(())
            }
            Some(single @ Value::Object(_)) => {
                warn!(target: "tripplanner::normalize", field, "wrapping single transport option in an array");
                let option = single.take();
                *single = Value::Array(vec![option]);
                Ok(())
            }
            Some(_) => Err(PlannerError::InvalidItinerary(format!(
                "{field} should be an array"
            ))),
        }
    }

    fn check_day_count(&self, object: &Map<String, Value>) -> Result<()> {
        let found = object
            .get("dayWiseItinerary")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        let expected = self.day_count() as usize;
        if found != expected {
            return Err(PlannerError::InvalidItinerary(format!(
                "dayWiseItinerary has {found} day plans but the trip spans {expected} days"
            )));
        }
        Ok(())
    }
}

/// Remove a surrounding code fence (with an optional language tag), if any.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };

    let body = match inner.split_once('\n') {
        Some((tag, rest)) if is_language_tag(tag) => rest,
        _ => {
            let inner = inner.trim_start();
            inner.strip_prefix("json").unwrap_or(inner)
        }
    };
    body.trim()
}

fn is_language_tag(tag: &str) -> bool {
    tag.trim().chars().all(|c| c.is_ascii_alphanumeric())
}

/// Absent, null, blank, `false` and zero all count as missing.
fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

fn repair_hotel_options(object: &mut Map<String, Value>) {
    let Some(hotels) = object.get_mut("hotelOptions") else {
        return;
    };
    match hotels {
        Value::Array(_) => {}
        Value::Object(_) => {
            warn!(target: "tripplanner::normalize", "wrapping single hotel option in an array");
            let hotel = hotels.take();
            *hotels = Value::Array(vec![hotel]);
        }
        other => {
            warn!(target: "tripplanner::normalize", received = %other, "hotelOptions is neither an array nor an object, replacing with an empty array");
            *other = Value::Array(Vec::new());
        }
    }
}

fn decode(value: Value) -> Result<Itinerary> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let location = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        PlannerError::InvalidItinerary(format!("at {}: {}", location, err.inner()))
    })
}
