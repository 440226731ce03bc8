use jsonschema::{Draft, JSONSchema};
use schemars::schema_for;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::types::{itinerary::Itinerary, trip::TravelMode};

const SCHEMA_NAME: &str = "Itinerary";
const MIN_HOTEL_OPTIONS: u64 = 2;
const MAX_HOTEL_OPTIONS: u64 = 3;
const MIN_TRANSPORT_OPTIONS: u64 = 1;
const MAX_TRANSPORT_OPTIONS: u64 = 2;

type CompiledSchema = std::result::Result<JSONSchema, String>;

/// JSON schema of the itinerary, specialised for one travel mode and trip length.
///
/// The Draft 7 validator is compiled on first use and shared by every clone.
#[derive(Clone)]
pub struct ResponseSchema {
    travel_mode: TravelMode,
    day_count: u32,
    schema_json: Arc<Value>,
    validator: Arc<OnceLock<CompiledSchema>>,
}

impl ResponseSchema {
    pub fn for_trip(travel_mode: TravelMode, day_count: u32) -> Self {
        let schema_json = specialise(base_schema().clone(), travel_mode, day_count);
        Self {
            travel_mode,
            day_count,
            schema_json: Arc::new(schema_json),
            validator: Arc::new(OnceLock::new()),
        }
    }

    pub fn schema_name(&self) -> &'static str {
        SCHEMA_NAME
    }

    pub fn travel_mode(&self) -> TravelMode {
        self.travel_mode
    }

    pub fn day_count(&self) -> u32 {
        self.day_count
    }

    pub fn schema_json(&self) -> &Value {
        self.schema_json.as_ref()
    }

    /// Compiled validator for `schema_json`, or the reason it could not be compiled.
    pub(crate) fn validator(&self) -> std::result::Result<&JSONSchema, &str> {
        self.validator
            .get_or_init(|| {
                JSONSchema::options()
                    .with_draft(Draft::Draft7)
                    .compile(&self.schema_json)
                    .map_err(|err| err.to_string())
            })
            .as_ref()
            .map_err(String::as_str)
    }

    /// `response_format` body for an OpenAI-compatible chat completion.
    pub fn response_format(&self) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.schema_name(),
                "schema": self.schema_json(),
            }
        })
    }
}

impl fmt::Debug for ResponseSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSchema")
            .field("travel_mode", &self.travel_mode)
            .field("day_count", &self.day_count)
            .field("compiled", &self.validator.get().is_some())
            .finish_non_exhaustive()
    }
}

impl PartialEq for ResponseSchema {
    fn eq(&self, other: &Self) -> bool {
        self.travel_mode == other.travel_mode
            && self.day_count == other.day_count
            && self.schema_json == other.schema_json
    }
}

/// Mode-independent schema derived from the `Itinerary` type, computed once.
fn base_schema() -> &'static Value {
    static BASE: OnceLock<Value> = OnceLock::new();
    BASE.get_or_init(|| {
        let root = schema_for!(Itinerary);
        serde_json::to_value(root).unwrap_or_else(|_| {
            json!({
                "type": "object",
                "properties": {},
                "required": []
            })
        })
    })
}

fn specialise(mut schema: Value, mode: TravelMode, day_count: u32) -> Value {
    let Some(root) = schema.as_object_mut() else {
        return schema;
    };

    let properties = root
        .entry("properties")
        .or_insert_with(|| Value::Object(Map::new()));
    if let Some(properties) = properties.as_object_mut() {
        for candidate in TravelMode::ALL {
            let field = candidate.routes_field();
            let narrowed = if candidate == mode {
                let items = properties
                    .get(field)
                    .and_then(|prop| prop.get("items"))
                    .cloned()
                    .unwrap_or_else(|| json!({ "type": "object" }));
                json!({
                    "type": "array",
                    "minItems": MIN_TRANSPORT_OPTIONS,
                    "maxItems": MAX_TRANSPORT_OPTIONS,
                    "items": items,
                })
            } else {
                json!({ "type": "null" })
            };
            properties.insert(field.to_string(), narrowed);
        }

        properties.insert(
            "travelModeUsed".to_string(),
            json!({ "type": "string", "enum": [mode.as_str()] }),
        );

        bound_array(properties, "hotelOptions", MIN_HOTEL_OPTIONS, MAX_HOTEL_OPTIONS);
        bound_array(
            properties,
            "dayWiseItinerary",
            u64::from(day_count),
            u64::from(day_count),
        );
    }

    let required = root
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Some(required) = required.as_array_mut() {
        let field = Value::String(mode.routes_field().to_string());
        if !required.contains(&field) {
            required.push(field);
        }
    }

    schema
}

fn bound_array(properties: &mut Map<String, Value>, field: &str, min: u64, max: u64) {
    if let Some(prop) = properties.get_mut(field).and_then(Value::as_object_mut) {
        prop.insert("minItems".to_string(), json!(min));
        prop.insert("maxItems".to_string(), json!(max));
    }
}
