use serde_json::Value;

use super::ResponseSchema;

const MAX_SCHEMA_ERRORS: usize = 3;

/// Audit a payload against the response schema.
///
/// Returns at most `MAX_SCHEMA_ERRORS` violation descriptions, followed by a
/// truncation marker when more were found. An empty vector means the payload
/// conforms.
pub fn schema_violations(schema: &ResponseSchema, payload: &Value) -> Vec<String> {
    let validator = match schema.validator() {
        Ok(validator) => validator,
        Err(err) => {
            return vec![format!(
                "failed to prepare `{}` schema for validation: {}",
                schema.schema_name(),
                err
            )]
        }
    };

    let mut details = Vec::new();
    if let Err(errors) = validator.validate(payload) {
        for (idx, error) in errors.enumerate() {
            if idx == MAX_SCHEMA_ERRORS {
                details.push("additional errors truncated".to_string());
                break;
            }
            let mut path = error.instance_path.to_string();
            if path.is_empty() {
                path = "<root>".to_string();
            }
            details.push(format!("{}: {}", path, error));
        }
    }
    details
}
