//! Tool dispatch: one generic request/response cycle per invocation.
//!
//! The gateway holds no state beyond the immutable catalog and the
//! transport factory; concurrent invocations never interact. The only
//! blocking point is the network call, bounded by the transport timeout,
//! and cancelling an invocation drops the in-flight request with nothing
//! to roll back.

use crate::catalog::{Catalog, RequestShape, ToolSpec};
use crate::error::{GatewayError, Result};
use crate::request;
use crate::transport::TransportFactory;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// The gateway: immutable catalog + transport factory.
///
/// Cheap to clone and safe to share across tasks.
#[derive(Debug, Clone)]
pub struct Gateway {
    catalog: Catalog,
    transport: TransportFactory,
}

impl Gateway {
    /// Build a gateway over a transport factory.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the catalog definitions are
    /// inconsistent (duplicate tool names).
    pub fn new(transport: TransportFactory) -> Result<Self> {
        Ok(Self {
            catalog: Catalog::new()?,
            transport,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Invoke a tool by name with a bag of caller arguments.
    ///
    /// On success the partner's decoded response body is forwarded
    /// verbatim; the gateway performs no semantic reinterpretation.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool name is unknown, a required parameter
    /// is missing or fails its contract, the client cannot be constructed,
    /// the call fails at the transport layer, the partner returns a non-2xx
    /// status, or a success body does not decode as JSON. No retry is
    /// attempted.
    pub async fn invoke(&self, name: &str, arguments: Map<String, Value>) -> Result<Value> {
        let tool = self
            .catalog
            .lookup(name)
            .ok_or_else(|| GatewayError::UnknownTool(name.to_string()))?;

        let resolved = resolve_arguments(tool, arguments)?;
        let body = build_body(tool, &resolved)?;

        debug!(tool = name, method = %tool.method, path = tool.path, "dispatching partner call");

        let client = self.transport.new_client()?;
        let mut req = self
            .transport
            .request(&client, tool.method.clone(), tool.path)?;
        if let Some(body) = &body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.is_success() {
            serde_json::from_slice(&bytes).map_err(|e| {
                GatewayError::Decode(format!("partner response is not valid JSON: {e}"))
            })
        } else {
            warn!(tool = name, status = status.as_u16(), "partner call failed");
            let reason = status.canonical_reason().unwrap_or("Unknown");
            let body_text = String::from_utf8_lossy(&bytes);
            Err(GatewayError::Partner(format!(
                "API returned {} {reason}: {body_text}",
                status.as_u16()
            )))
        }
    }
}

/// Check required parameters and fill declared defaults. Explicit `null`
/// counts as absent; arguments not in the parameter table are ignored.
fn resolve_arguments(tool: &ToolSpec, mut arguments: Map<String, Value>) -> Result<Map<String, Value>> {
    let mut resolved = Map::new();
    for param in &tool.params {
        let value = arguments
            .remove(param.name)
            .filter(|v| !v.is_null())
            .or_else(|| param.default.clone());
        match value {
            Some(v) => {
                resolved.insert(param.name.to_string(), v);
            }
            None if param.required => {
                return Err(GatewayError::InvalidArguments(format!(
                    "missing required parameter: {}",
                    param.name
                )));
            }
            None => {}
        }
    }
    Ok(resolved)
}

fn build_body(tool: &ToolSpec, resolved: &Map<String, Value>) -> Result<Option<Value>> {
    match tool.shape {
        RequestShape::Empty => Ok(None),
        RequestShape::Flat => Ok(Some(request::flat_body(&tool.params, resolved))),
        RequestShape::AtmLocator => request::atm_locator_body(resolved).map(Some),
        RequestShape::StopAdd => request::stop_add_body(resolved).map(Some),
        RequestShape::StopUpdate => request::stop_update_body(resolved).map(Some),
    }
}
