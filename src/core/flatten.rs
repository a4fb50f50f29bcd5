use crate::domain::model::{raw_fields, FlattenedRecord, PassbackParams, TransformResult};
use crate::utils::error::{EtlError, Result};
use crate::utils::lenient_json::{decode_lenient_object, json_type_name};
use serde_json::{Map, Value};

/// Flattens the API response into rows.
///
/// Anything other than a JSON array is a `ShapeError`. Non-object items are
/// skipped. A bad `passback_params` never drops its record: the three
/// passback columns fall back to empty strings and the failure is counted.
pub fn flatten(data: &Value) -> Result<TransformResult> {
    let items = data.as_array().ok_or_else(|| EtlError::ShapeError {
        found: json_type_name(data).to_string(),
    })?;

    let mut result = TransformResult {
        records: Vec::with_capacity(items.len()),
        ..TransformResult::default()
    };

    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            tracing::warn!(
                "Skipping attempt {}: expected an object, got {}",
                index,
                json_type_name(item)
            );
            result.skipped += 1;
            continue;
        };

        let passback = match passback_params(index, object.get(raw_fields::PASSBACK_PARAMS)) {
            Ok(params) => params,
            Err(e) => {
                tracing::error!("{}", e);
                result.passback_errors += 1;
                PassbackParams::default()
            }
        };

        result.records.push(flatten_record(object, passback));
    }

    tracing::debug!(
        "Flattened {} records ({} skipped, {} passback errors)",
        result.records.len(),
        result.skipped,
        result.passback_errors
    );

    Ok(result)
}

pub fn flatten_record(object: &Map<String, Value>, passback: PassbackParams) -> FlattenedRecord {
    FlattenedRecord {
        user_id: text_field(object, raw_fields::LTI_USER_ID),
        oauth_consumer_key: passback.oauth_consumer_key,
        lis_result_sourcedid: passback.lis_result_sourcedid,
        lis_outcome_service_url: passback.lis_outcome_service_url,
        is_correct: coerce_bool(object.get(raw_fields::IS_CORRECT)),
        attempt_type: text_field(object, raw_fields::ATTEMPT_TYPE),
        created_at: text_field(object, raw_fields::CREATED_AT),
    }
}

/// Decodes the nested params of record `index`. Absent or null means "no
/// params" and is not an error.
pub fn passback_params(index: usize, value: Option<&Value>) -> Result<PassbackParams> {
    match value {
        None | Some(Value::Null) => Ok(PassbackParams::default()),
        Some(Value::String(text)) => decode_lenient_object(text)
            .map(|map| passback_from_map(&map))
            .map_err(|e| EtlError::PassbackDecodeError {
                index,
                reason: format!("{} (raw: {})", e, text),
            }),
        Some(Value::Object(map)) => Ok(passback_from_map(map)),
        Some(other) => Err(EtlError::PassbackDecodeError {
            index,
            reason: format!("expected a string, got {}", json_type_name(other)),
        }),
    }
}

fn passback_from_map(map: &Map<String, Value>) -> PassbackParams {
    PassbackParams {
        oauth_consumer_key: text_field(map, "oauth_consumer_key"),
        lis_result_sourcedid: text_field(map, "lis_result_sourcedid"),
        lis_outcome_service_url: text_field(map, "lis_outcome_service_url"),
    }
}

/// Missing and null become `""`; other non-string values keep their JSON text.
fn text_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Missing/null stays `None`; everything else is coerced to a strict bool.
pub fn coerce_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Null => None,
        Value::Bool(b) => Some(*b),
        Value::Number(n) => Some(n.as_f64().map_or(true, |f| f != 0.0)),
        Value::String(s) => {
            let normalized = s.trim().to_ascii_lowercase();
            match normalized.as_str() {
                "" | "0" | "false" | "f" | "no" => Some(false),
                _ => Some(true),
            }
        }
        Value::Array(items) => Some(!items.is_empty()),
        Value::Object(map) => Some(!map.is_empty()),
    }
}
