//! Request-shape builders for the partner wire formats.
//!
//! Every builder is a pure function of the resolved argument map: the
//! declared parameters (plus the fixed constants below) fully determine the
//! request body. Shapes are independently testable; the dispatcher only
//! selects which one to run.

use crate::catalog::ParamSpec;
use crate::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::str::FromStr;

/// `applicationId` sent in the ATM locator header block.
pub const ATM_APPLICATION_ID: &str = "VISA_MCP";

/// `requestTs` sent in the ATM locator header block. The partner accepts a
/// fixed timestamp here; it is not wall-clock time.
pub const ATM_REQUEST_TS: &str = "2024-01-01T00:00:00Z";

/// Scope of a stop-payment instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopLevel {
    Merchant,
    Mcc,
    Pan,
}

impl StopLevel {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StopLevel::Merchant => "merchant",
            StopLevel::Mcc => "mcc",
            StopLevel::Pan => "pan",
        }
    }
}

impl FromStr for StopLevel {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "merchant" => Ok(StopLevel::Merchant),
            "mcc" => Ok(StopLevel::Mcc),
            "pan" => Ok(StopLevel::Pan),
            other => Err(GatewayError::InvalidArguments(format!(
                "level must be one of merchant, mcc, pan (got '{other}')"
            ))),
        }
    }
}

/// Unit of the ATM search radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Km,
    Mi,
}

impl DistanceUnit {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceUnit::Km => "km",
            DistanceUnit::Mi => "mi",
        }
    }
}

impl FromStr for DistanceUnit {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "km" => Ok(DistanceUnit::Km),
            "mi" => Ok(DistanceUnit::Mi),
            other => Err(GatewayError::InvalidArguments(format!(
                "distance_unit must be km or mi (got '{other}')"
            ))),
        }
    }
}

/// Assemble a flat JSON body from the parameter table: each resolved
/// argument lands under its wire name, stringified when the partner wants
/// a string rendering of a number.
#[must_use]
pub fn flat_body(params: &[ParamSpec], arguments: &Map<String, Value>) -> Value {
    let mut body = Map::new();
    for param in params {
        if let Some(value) = arguments.get(param.name) {
            let value = if param.stringify {
                stringify(value)
            } else {
                value.clone()
            };
            body.insert(param.wire.to_string(), value);
        }
    }
    Value::Object(body)
}

fn stringify(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

/// ATM locator envelope: fixed header block, caller geocodes, range from
/// the (default-filled) distance parameters, and the fixed ascending
/// distance sort.
///
/// # Errors
///
/// Returns an invalid-arguments error if a required field is absent or
/// `distance_unit` is not `km`/`mi`.
pub fn atm_locator_body(arguments: &Map<String, Value>) -> Result<Value> {
    let latitude = required_value(arguments, "latitude")?;
    let longitude = required_value(arguments, "longitude")?;
    let distance = required_value(arguments, "distance")?;
    let unit: DistanceUnit = required_str(arguments, "distance_unit")?.parse()?;

    Ok(json!({
        "wsRequestHeaderV2": {
            "requestTs": ATM_REQUEST_TS,
            "applicationId": ATM_APPLICATION_ID,
        },
        "requestData": {
            "location": {
                "geocodes": {
                    "latitude": latitude,
                    "longitude": longitude,
                },
            },
            "options": {
                "range": {
                    "distance": distance,
                    "distanceUnit": unit.as_str(),
                },
                "findFilters": [],
                "sort": {
                    "primary": "distance",
                    "direction": "asc",
                },
            },
        },
    }))
}

/// Add-stop body: always `{pan, level}`; `merchantId` only for
/// level=merchant with an id supplied, `mcc` only for level=mcc with an mcc
/// supplied. No other combination adds fields.
///
/// # Errors
///
/// Returns an invalid-arguments error if `pan`/`level` are absent or
/// `level` is outside the closed enumeration.
pub fn stop_add_body(arguments: &Map<String, Value>) -> Result<Value> {
    let pan = required_str(arguments, "pan")?;
    let level: StopLevel = required_str(arguments, "level")?.parse()?;

    let mut body = Map::new();
    body.insert("pan".to_string(), Value::String(pan.to_string()));
    body.insert(
        "level".to_string(),
        Value::String(level.as_str().to_string()),
    );

    match level {
        StopLevel::Merchant => {
            if let Some(id) = optional_str(arguments, "merchant_id")? {
                body.insert("merchantId".to_string(), Value::String(id.to_string()));
            }
        }
        StopLevel::Mcc => {
            if let Some(mcc) = optional_str(arguments, "mcc")? {
                body.insert("mcc".to_string(), Value::String(mcc.to_string()));
            }
        }
        StopLevel::Pan => {}
    }

    Ok(Value::Object(body))
}

/// Update-stop body: the stop id merged with the caller's update fields.
/// Caller values win on key collision, including a literal `stopId`.
///
/// # Errors
///
/// Returns an invalid-arguments error if `stop_id` is absent or `updates`
/// is not a JSON object.
pub fn stop_update_body(arguments: &Map<String, Value>) -> Result<Value> {
    let stop_id = required_str(arguments, "stop_id")?;
    let updates = required_value(arguments, "updates")?
        .as_object()
        .ok_or_else(|| {
            GatewayError::InvalidArguments("parameter updates must be an object".to_string())
        })?;

    let mut body = Map::new();
    body.insert("stopId".to_string(), Value::String(stop_id.to_string()));
    for (key, value) in updates {
        body.insert(key.clone(), value.clone());
    }
    Ok(Value::Object(body))
}

fn required_value<'a>(arguments: &'a Map<String, Value>, name: &str) -> Result<&'a Value> {
    arguments.get(name).ok_or_else(|| {
        GatewayError::InvalidArguments(format!("missing required parameter: {name}"))
    })
}

fn required_str<'a>(arguments: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    required_value(arguments, name)?.as_str().ok_or_else(|| {
        GatewayError::InvalidArguments(format!("parameter {name} must be a string"))
    })
}

fn optional_str<'a>(arguments: &'a Map<String, Value>, name: &str) -> Result<Option<&'a str>> {
    match arguments.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(GatewayError::InvalidArguments(format!(
            "parameter {name} must be a string"
        ))),
    }
}
