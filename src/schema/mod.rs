//! Response schema validation.
//!
//! The client only depends on the [`SchemaValidator`] trait. The default
//! implementation, [`JsonSchemaValidator`], checks bodies against JSON Schema
//! documents and keeps every schema it has compiled.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use jsonschema::Validator;
use log::{debug, warn};
use serde_json::Value;

use crate::error::ValidationIssue;

/// Checks decoded response bodies against a schema.
///
/// Validation is synchronous. `Err` with an empty list means the body could
/// not be checked (for example because the schema itself is invalid).
#[cfg_attr(test, mockall::automock)]
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, schema: &Value, data: &Value) -> Result<(), Vec<ValidationIssue>>;
}

/// JSON Schema validator with a cache of compiled schemas.
///
/// The cache is keyed by schema text and never evicts, which assumes the
/// client is used with a fixed set of schemas rather than ones generated
/// per request.
#[derive(Default)]
pub struct JsonSchemaValidator {
    compiled: Mutex<HashMap<String, Arc<Validator>>>,
}

impl JsonSchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `schema`, reusing an earlier compilation of the same document.
    fn compile(&self, schema: &Value) -> Option<Arc<Validator>> {
        let key = schema.to_string();

        if let Some(validator) = self.lock().get(&key) {
            return Some(Arc::clone(validator));
        }

        match jsonschema::validator_for(schema) {
            Ok(validator) => {
                debug!("Compiled response schema ({} bytes)", key.len());
                let validator = Arc::new(validator);
                self.lock().insert(key, Arc::clone(&validator));
                Some(validator)
            }
            Err(e) => {
                warn!("Invalid response schema: {}", e);
                None
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Validator>>> {
        // The map holds no invariants a panicking writer could break.
        self.compiled.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[cfg(test)]
    fn cached(&self) -> usize {
        self.lock().len()
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, schema: &Value, data: &Value) -> Result<(), Vec<ValidationIssue>> {
        let Some(validator) = self.compile(schema) else {
            return Err(Vec::new());
        };

        let issues: Vec<ValidationIssue> = validator
            .iter_errors(data)
            .map(|e| ValidationIssue::new(e.instance_path.to_string(), e.to_string()))
            .collect();

        if issues.is_empty() {
            Ok(())
        } else {
            debug!("Response failed validation with {} issue(s)", issues.len());
            Err(issues)
        }
    }
}
