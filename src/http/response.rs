//! Maps a transport response onto a request outcome.

use log::{debug, warn};
use serde_json::{Value, json};

use super::request::HttpResponse;
use crate::error::{RequestError, Result, SUCCESS_MESSAGE};
use crate::schema::SchemaValidator;

/// Decodes a JSON body. An empty body decodes to `null`.
pub fn decode_body(body: &str) -> Result<Value> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| RequestError::Decode(e.to_string()))
}

/// Decodes the body and, when a schema is given, checks it.
pub fn decode_and_validate(
    body: &str,
    schema: Option<&Value>,
    validator: &dyn SchemaValidator,
) -> Result<Value> {
    let Some(schema) = schema else {
        return decode_body(body);
    };

    let data = decode_body(body).map_err(|e| {
        warn!("Response body is not JSON, cannot validate: {}", e);
        RequestError::Validation(Vec::new())
    })?;

    validator
        .validate(schema, &data)
        .map(|()| data)
        .map_err(RequestError::Validation)
}

/// Classifies a response by status code.
pub fn classify(
    response: HttpResponse,
    schema: Option<&Value>,
    validator: &dyn SchemaValidator,
) -> Result<Value> {
    debug!("Classifying HTTP {} response", response.status);

    match response.status {
        400 => {
            let body = serde_json::from_str(&response.body)
                .unwrap_or_else(|_| json!({ "message": response.body }));
            Err(RequestError::BadRequest(body))
        }
        204 => Ok(json!({ "message": SUCCESS_MESSAGE })),
        401 => Err(RequestError::SessionExpired),
        _ => decode_and_validate(&response.body, schema, validator),
    }
}
