//! The fixed catalog of partner tools.
//!
//! Built once at startup from the static definitions below and never
//! mutated. Each entry declares its parameter contract (types, required vs.
//! optional with defaults), the partner endpoint it maps to, and which
//! request shape turns resolved arguments into a body.

use crate::error::{GatewayError, Result};
use reqwest::Method;
use rmcp::model::{JsonObject, Tool, ToolAnnotations};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;

/// JSON type of a declared parameter. Drives schema generation; the wire
/// call itself does no coercion beyond the `stringify` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Object,
}

impl ParamType {
    fn json_name(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Number => "number",
            ParamType::Integer => "integer",
            ParamType::Object => "object",
        }
    }
}

/// One declared parameter of a tool.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    /// Name the caller uses.
    pub name: &'static str,
    /// Key used in the partner request body (defaults to `name`).
    pub wire: &'static str,
    pub ty: ParamType,
    pub required: bool,
    /// Filled in for missing optional arguments before shape building.
    pub default: Option<Value>,
    pub description: &'static str,
    /// Closed set of accepted values, if the parameter is an enumeration.
    pub allowed: Option<&'static [&'static str]>,
    /// Send the value as its string rendering (partner quirk).
    pub stringify: bool,
}

impl ParamSpec {
    fn new(name: &'static str, ty: ParamType, required: bool, description: &'static str) -> Self {
        Self {
            name,
            wire: name,
            ty,
            required,
            default: None,
            description,
            allowed: None,
            stringify: false,
        }
    }

    pub fn required(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self::new(name, ty, true, description)
    }

    pub fn optional(name: &'static str, ty: ParamType, description: &'static str) -> Self {
        Self::new(name, ty, false, description)
    }

    #[must_use]
    pub fn wire(mut self, wire: &'static str) -> Self {
        self.wire = wire;
        self
    }

    #[must_use]
    pub fn default_value(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn allowed(mut self, values: &'static [&'static str]) -> Self {
        self.allowed = Some(values);
        self
    }

    #[must_use]
    pub fn stringify(mut self) -> Self {
        self.stringify = true;
        self
    }
}

/// How a tool's resolved arguments become a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// No body (the connectivity check).
    Empty,
    /// Flat JSON object assembled from the parameter table's wire names.
    Flat,
    /// ATM locator envelope: fixed header block + sort rule.
    AtmLocator,
    /// `{pan, level}` plus a level-dependent identifier.
    StopAdd,
    /// Stop id merged with caller-supplied update fields.
    StopUpdate,
}

/// One entry in the tool catalog.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub params: Vec<ParamSpec>,
    pub shape: RequestShape,
}

/// The queryable, insertion-ordered tool catalog. Immutable after
/// construction and cheap to clone.
#[derive(Debug, Clone)]
pub struct Catalog {
    tools: Arc<Vec<ToolSpec>>,
}

impl Catalog {
    /// Build the fixed catalog.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if two definitions share a name.
    pub fn new() -> Result<Self> {
        let tools = definitions();
        let mut names: HashSet<&str> = HashSet::new();
        for tool in &tools {
            if !names.insert(tool.name) {
                return Err(GatewayError::Config(format!(
                    "duplicate tool name '{}' in catalog",
                    tool.name
                )));
            }
        }
        Ok(Self {
            tools: Arc::new(tools),
        })
    }

    /// Look a tool up by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// List the MCP `Tool`s exposed by this catalog, with input schemas
    /// generated from the parameter tables.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|t| {
                let schema = build_input_schema(&t.params);
                let schema_obj = schema.as_object().cloned().unwrap_or_else(JsonObject::new);
                let mut tool = Tool::new(t.name, t.description, Arc::new(schema_obj));
                tool.annotations = Some(annotations_for_method(&t.method));
                tool
            })
            .collect()
    }
}

fn build_input_schema(params: &[ParamSpec]) -> Value {
    let mut properties = json!({});
    let mut required: Vec<String> = Vec::new();

    for param in params {
        let mut prop = json!({
            "type": param.ty.json_name(),
            "description": param.description,
        });
        if let Some(values) = param.allowed {
            prop["enum"] = json!(values);
        }
        if let Some(default) = &param.default {
            prop["default"] = default.clone();
        }
        properties[param.name] = prop;

        if param.required && param.default.is_none() {
            required.push(param.name.to_string());
        }
    }

    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

// The catalog only issues GET and POST.
fn annotations_for_method(method: &Method) -> ToolAnnotations {
    if *method == Method::GET {
        return ToolAnnotations {
            title: None,
            read_only_hint: Some(true),
            destructive_hint: Some(false),
            idempotent_hint: Some(true),
            open_world_hint: Some(true),
        };
    }
    ToolAnnotations {
        title: None,
        read_only_hint: Some(false),
        destructive_hint: Some(false),
        idempotent_hint: Some(false),
        open_world_hint: Some(true),
    }
}

#[allow(clippy::too_many_lines)]
fn definitions() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "hello_world",
            description: "Test connectivity to the Visa API. Returns a hello world response to verify authentication is working.",
            method: Method::GET,
            path: "/vdp/helloworld",
            params: Vec::new(),
            shape: RequestShape::Empty,
        },
        ToolSpec {
            name: "get_exchange_rate",
            description: "Get the foreign exchange rate between two currencies. Provide source and destination currency codes (e.g. USD, EUR, GBP) and the amount to convert.",
            method: Method::POST,
            path: "/forexrates/v2/foreignexchangerates",
            params: vec![
                ParamSpec::required(
                    "source_currency",
                    ParamType::String,
                    "Source currency code (e.g. USD)",
                )
                .wire("sourceCurrencyCode"),
                ParamSpec::required(
                    "destination_currency",
                    ParamType::String,
                    "Destination currency code (e.g. EUR)",
                )
                .wire("destinationCurrencyCode"),
                ParamSpec::required(
                    "amount",
                    ParamType::Number,
                    "Amount to convert, in the source currency",
                )
                .wire("sourceAmount")
                .stringify(),
            ],
            shape: RequestShape::Flat,
        },
        ToolSpec {
            name: "find_nearby_atms",
            description: "Find nearby Visa ATMs. Provide latitude, longitude, and optional distance (default 5) and unit (km or mi).",
            method: Method::POST,
            path: "/globalatmlocator/v1/localatms/atmLocator",
            params: vec![
                ParamSpec::required("latitude", ParamType::Number, "Latitude of the search origin"),
                ParamSpec::required(
                    "longitude",
                    ParamType::Number,
                    "Longitude of the search origin",
                ),
                ParamSpec::optional("distance", ParamType::Integer, "Search radius")
                    .default_value(json!(5)),
                ParamSpec::optional("distance_unit", ParamType::String, "Search radius unit")
                    .default_value(json!("km"))
                    .allowed(&["km", "mi"]),
            ],
            shape: RequestShape::AtmLocator,
        },
        ToolSpec {
            name: "vsm_search",
            description: "Search for active subscription stop instructions for a card. Provide the card PAN (Primary Account Number).",
            method: Method::POST,
            path: "/vsm/v1/search",
            params: vec![ParamSpec::required(
                "pan",
                ParamType::String,
                "Card PAN (Primary Account Number)",
            )],
            shape: RequestShape::Flat,
        },
        ToolSpec {
            name: "vsm_merchant_details",
            description: "Get merchant details for a subscription transaction. Provide the transaction ID.",
            method: Method::POST,
            path: "/vsm/v1/merchantdetails",
            params: vec![
                ParamSpec::required("transaction_id", ParamType::String, "Transaction ID")
                    .wire("transactionId"),
            ],
            shape: RequestShape::Flat,
        },
        ToolSpec {
            name: "vsm_add_merchant",
            description: "Add a merchant to stop subscription payments. Provide card PAN, merchant ID, and optional reason.",
            method: Method::POST,
            path: "/vsm/v1/addmerchant",
            params: vec![
                ParamSpec::required(
                    "pan",
                    ParamType::String,
                    "Card PAN (Primary Account Number)",
                ),
                ParamSpec::required("merchant_id", ParamType::String, "Merchant ID to stop")
                    .wire("merchantId"),
                ParamSpec::optional("reason", ParamType::String, "Reason for the stop")
                    .default_value(json!("Subscription cancellation")),
            ],
            shape: RequestShape::Flat,
        },
        ToolSpec {
            name: "vsm_cancel",
            description: "Cancel an existing subscription stop instruction. Provide the stop instruction ID.",
            method: Method::POST,
            path: "/vsm/v1/cancel",
            params: vec![
                ParamSpec::required("stop_id", ParamType::String, "Stop instruction ID")
                    .wire("stopId"),
            ],
            shape: RequestShape::Flat,
        },
        ToolSpec {
            name: "vsps_search_instructions",
            description: "Search for active stop payment instructions for a card. Provide the card PAN.",
            method: Method::POST,
            path: "/vsps/v1/stopinstructions/search",
            params: vec![ParamSpec::required(
                "pan",
                ParamType::String,
                "Card PAN (Primary Account Number)",
            )],
            shape: RequestShape::Flat,
        },
        ToolSpec {
            name: "vsps_search_eligible",
            description: "Search for transactions eligible for stop payment. Provide card PAN and optional days to look back (30-180, default 90).",
            method: Method::POST,
            path: "/vsps/v1/eligibletransactions/search",
            params: vec![
                ParamSpec::required(
                    "pan",
                    ParamType::String,
                    "Card PAN (Primary Account Number)",
                ),
                ParamSpec::optional(
                    "days",
                    ParamType::Integer,
                    "Days to look back; the partner accepts 30-180",
                )
                .wire("searchPeriodDays")
                .default_value(json!(90)),
            ],
            shape: RequestShape::Flat,
        },
        ToolSpec {
            name: "vsps_add_stop",
            description: "Add a stop payment instruction. Provide card PAN, level (merchant/mcc/pan), and merchant_id or mcc based on level.",
            method: Method::POST,
            path: "/vsps/v1/stopinstructions/add",
            params: vec![
                ParamSpec::required(
                    "pan",
                    ParamType::String,
                    "Card PAN (Primary Account Number)",
                ),
                ParamSpec::required("level", ParamType::String, "Stop level")
                    .allowed(&["merchant", "mcc", "pan"]),
                ParamSpec::optional(
                    "merchant_id",
                    ParamType::String,
                    "Merchant ID (used when level is merchant)",
                ),
                ParamSpec::optional(
                    "mcc",
                    ParamType::String,
                    "Merchant category code (used when level is mcc)",
                ),
            ],
            shape: RequestShape::StopAdd,
        },
        ToolSpec {
            name: "vsps_cancel_stop",
            description: "Cancel an existing stop payment instruction. Provide the stop instruction ID.",
            method: Method::POST,
            path: "/vsps/v1/stopinstructions/cancel",
            params: vec![
                ParamSpec::required("stop_id", ParamType::String, "Stop instruction ID")
                    .wire("stopId"),
            ],
            shape: RequestShape::Flat,
        },
        ToolSpec {
            name: "vsps_update_stop",
            description: "Update an existing stop payment instruction. Provide stop ID and updates as key-value pairs.",
            method: Method::POST,
            path: "/vsps/v1/stopinstructions/update",
            params: vec![
                ParamSpec::required("stop_id", ParamType::String, "Stop instruction ID"),
                ParamSpec::required(
                    "updates",
                    ParamType::Object,
                    "Fields to change, as key-value pairs",
                ),
            ],
            shape: RequestShape::StopUpdate,
        },
        ToolSpec {
            name: "vsps_extend_stop",
            description: "Extend the end date of a stop payment instruction. Provide stop ID and new end date (YYYY-MM-DD).",
            method: Method::POST,
            path: "/vsps/v1/stopinstructions/extend",
            params: vec![
                ParamSpec::required("stop_id", ParamType::String, "Stop instruction ID")
                    .wire("stopId"),
                ParamSpec::required("new_end_date", ParamType::String, "New end date (YYYY-MM-DD)")
                    .wire("newEndDate"),
            ],
            shape: RequestShape::Flat,
        },
    ]
}
