//! Request parameter parsing
//!
//! Numeric parameters are clamped into range rather than rejected: a request
//! asking for 5000 tokens gets 1000. Only a missing prompt or a wrongly-typed
//! field is an error.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ValidationError;
use crate::residency::SamplingParams;

pub const DEFAULT_LENGTH: usize = 100;
pub const MAX_LENGTH: usize = 1000;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const MIN_PROBABILITY_PARAM: f64 = 0.1;
pub const MAX_PROBABILITY_PARAM: f64 = 1.0;

pub const DEFAULT_NSAMPLES: usize = 1;
pub const MAX_NSAMPLES: usize = 5;

pub const DEFAULT_BATCH_SIZE: usize = 1;
pub const MAX_BATCH_SIZE: usize = 5;

/// Effective parameters for one generation request (post-clamp).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub length: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub nsamples: usize,
    pub batch_size: usize,
    pub run_name: String,
}

impl GenerationRequest {
    /// Parse and clamp a raw JSON request body.
    ///
    /// Absent and `null` fields take their defaults. `default_run_name` is
    /// used when the body does not name a run. Integer fields are floored at
    /// 1, so `length: 0` or `nsamples: 0` become 1 rather than passing
    /// through as zero.
    pub fn from_json(raw: &Value, default_run_name: &str) -> Result<Self, ValidationError> {
        let obj = match raw {
            Value::Object(obj) if !obj.is_empty() => obj,
            _ => return Err(ValidationError::MissingBody),
        };

        let length = int_field(obj, "length", DEFAULT_LENGTH, MAX_LENGTH)?;
        let temperature = probability_field(obj, "temperature", DEFAULT_TEMPERATURE)?;
        let top_p = probability_field(obj, "top_p", DEFAULT_TOP_P)?;
        let nsamples = int_field(obj, "nsamples", DEFAULT_NSAMPLES, MAX_NSAMPLES)?;
        let batch_size = int_field(obj, "batch_size", DEFAULT_BATCH_SIZE, MAX_BATCH_SIZE)?;
        let run_name = string_field(obj, "run_name")?
            .unwrap_or_else(|| default_run_name.to_string());

        let prompt = match string_field(obj, "prompt")? {
            Some(prompt) if !prompt.is_empty() => prompt,
            _ => return Err(ValidationError::MissingPrompt),
        };

        Ok(Self {
            prompt,
            length,
            temperature,
            top_p,
            nsamples,
            batch_size,
            run_name,
        })
    }

    /// Parameters passed down to the execution context
    pub fn sampling(&self) -> SamplingParams {
        SamplingParams {
            prompt: self.prompt.clone(),
            length: self.length,
            temperature: self.temperature,
            top_p: self.top_p,
            nsamples: self.nsamples,
            batch_size: self.batch_size,
        }
    }
}

fn present<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    obj.get(field).filter(|v| !v.is_null())
}

/// Integer field clamped to `[1, max]`.
fn int_field(
    obj: &Map<String, Value>,
    field: &'static str,
    default: usize,
    max: usize,
) -> Result<usize, ValidationError> {
    let Some(value) = present(obj, field) else {
        return Ok(default);
    };

    let invalid = ValidationError::InvalidField {
        field,
        expected: "an integer",
    };

    let n: i128 = if let Some(n) = value.as_i64() {
        n.into()
    } else if let Some(n) = value.as_u64() {
        n.into()
    } else {
        // Accept integral floats such as 100.0
        match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f.is_finite() => f as i128,
            _ => return Err(invalid),
        }
    };

    Ok(n.clamp(1, max as i128) as usize)
}

/// Float field clamped to `[0.1, 1.0]`.
fn probability_field(
    obj: &Map<String, Value>,
    field: &'static str,
    default: f64,
) -> Result<f64, ValidationError> {
    match present(obj, field) {
        None => Ok(default),
        Some(value) => value
            .as_f64()
            .map(|f| f.clamp(MIN_PROBABILITY_PARAM, MAX_PROBABILITY_PARAM))
            .ok_or(ValidationError::InvalidField {
                field,
                expected: "a number",
            }),
    }
}

fn string_field(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationError> {
    match present(obj, field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}
