//! Plain key/value records for persistence layers.
//!
//! Export pipelines store mixing results next to project files as JSON objects. Every
//! result type implements [`Record`], and [`result_to_record`] gives failed operations
//! the same shape: an `error` message plus the payload field set to `null`.
//!
//! ```
//! use mixdown::buffer::AudioTrack;
//! use mixdown::crossfade::{CrossfadeSpec, apply_crossfade};
//! use mixdown::record::result_to_record;
//!
//! let a = AudioTrack::mono(vec![0.0; 441], 44_100);
//! let b = AudioTrack::mono(vec![0.0; 480], 48_000);
//! let record = result_to_record(&apply_crossfade(&a, &b, &CrossfadeSpec::default()))?;
//! assert!(record["crossfaded_samples"].is_null());
//! assert!(record["error"].as_str().is_some());
//! # Ok::<(), mixdown::error::Error>(())
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use crate::automation::ContinuityReport;
use crate::crossfade::{CrossfadeResult, CrossfadeSequenceResult};
use crate::error::{Error, Result};
use crate::gaps::FillResult;
use crate::mixer::MixResult;

/// A result that can be flattened into a JSON object.
pub trait Record: Serialize {
    /// Name of the field carrying the sample payload, if any.
    const PAYLOAD_FIELD: Option<&'static str>;

    fn to_record(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(Error::numeric(format!(
                "record serialized to a non-object: {other}"
            ))),
        }
    }
}

impl Record for MixResult {
    const PAYLOAD_FIELD: Option<&'static str> = Some("mixed_samples");
}

impl Record for CrossfadeResult {
    const PAYLOAD_FIELD: Option<&'static str> = Some("crossfaded_samples");
}

impl Record for CrossfadeSequenceResult {
    const PAYLOAD_FIELD: Option<&'static str> = Some("crossfaded_samples");
}

impl Record for FillResult {
    const PAYLOAD_FIELD: Option<&'static str> = Some("filled_samples");
}

impl Record for ContinuityReport {
    const PAYLOAD_FIELD: Option<&'static str> = None;
}

/// Convert an operation's outcome into one uniform record shape.
///
/// - `Ok` → the result's own fields.
/// - `Err` → `{ "error": <message>, <payload field>: null }`.
pub fn result_to_record<T: Record>(result: &Result<T>) -> Result<Map<String, Value>> {
    match result {
        Ok(value) => value.to_record(),
        Err(err) => Ok(error_record::<T>(err)),
    }
}

fn error_record<T: Record>(err: &Error) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("error".to_owned(), Value::String(err.to_string()));
    if let Some(field) = T::PAYLOAD_FIELD {
        map.insert(field.to_owned(), Value::Null);
    }
    map
}
