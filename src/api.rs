//! Rackbeat API client for product unit-of-measure lookups.
//!
//! One authenticated GET per product number, strictly sequential. Response
//! bodies are unwrapped leniently: the list of unit records may arrive bare
//! or nested under one of several wrapper keys depending on the API version,
//! and unrecognized shapes degrade to an empty list rather than an error.

use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use reqwest::{StatusCode, blocking::Client, header};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Production endpoint for product resources.
pub const API_BASE: &str = "https://app.rackbeat.com/api/products";

/// Environment variable that overrides [`API_BASE`], e.g. for self-hosted
/// instances or tests.
pub const API_BASE_ENV_VAR: &str = "RACKBEAT_API_BASE";

/// Field set requested from the units endpoint.
pub const UNIT_FIELDS: &str = "unit,name,quantity";

/// One unit-of-measure entry for a product. Missing or non-scalar fields
/// default to empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub unit: String,
    pub name: String,
    pub quantity: String,
}

impl UnitRecord {
    fn from_fields(fields: &serde_json::Map<String, Value>) -> Self {
        Self {
            unit: field_text(fields, "unit"),
            name: field_text(fields, "name"),
            quantity: field_text(fields, "quantity"),
        }
    }
}

fn field_text(fields: &serde_json::Map<String, Value>, key: &str) -> String {
    match fields.get(key) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

/// Recognized shapes of the units endpoint response. Wrapper variants are
/// tried in declaration order, so an object carrying several known keys
/// resolves to the earliest one. Anything else falls through to `Other`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UnitsPayload {
    Bare(Vec<Value>),
    ItemUnits { item_units: Vec<Value> },
    Data { data: Vec<Value> },
    Units { units: Vec<Value> },
    Results { results: Vec<Value> },
    Items { items: Vec<Value> },
    Other(Value),
}

impl UnitsPayload {
    /// Extracts the unit records, dropping list entries that are not JSON
    /// objects. Unrecognized payload shapes yield an empty list.
    pub fn into_units(self) -> Vec<UnitRecord> {
        let entries = match self {
            UnitsPayload::Bare(entries)
            | UnitsPayload::ItemUnits { item_units: entries }
            | UnitsPayload::Data { data: entries }
            | UnitsPayload::Units { units: entries }
            | UnitsPayload::Results { results: entries }
            | UnitsPayload::Items { items: entries } => entries,
            UnitsPayload::Other(_) => Vec::new(),
        };
        entries
            .iter()
            .filter_map(Value::as_object)
            .map(UnitRecord::from_fields)
            .collect()
    }
}

/// A failed lookup for a single product number. These are collected by the
/// driver and do not abort the batch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error for product '{product_number}': {source}")]
    Transport {
        product_number: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} for product '{product_number}' at {url}: {body}")]
    HttpStatus {
        product_number: String,
        status: StatusCode,
        url: String,
        body: String,
    },
    #[error("invalid JSON for product '{product_number}': {source}")]
    InvalidPayload {
        product_number: String,
        #[source]
        source: serde_json::Error,
    },
}

pub struct UnitsClient {
    http: Client,
    base_url: String,
    token: String,
}

impl UnitsClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Building HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Full request URL for a product's units, including the field selection.
    pub fn units_url(&self, product_number: &str) -> String {
        format!(
            "{}/{}/units?fields={}",
            self.base_url, product_number, UNIT_FIELDS
        )
    }

    /// Fetches the unit records for one product number. An empty list is a
    /// valid success: a product without units yields zero output rows.
    pub fn fetch_units(&self, product_number: &str) -> Result<Vec<UnitRecord>, FetchError> {
        let url = self.units_url(product_number);
        debug!("GET {url}");
        let response = self
            .http
            .get(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::ACCEPT, "application/json")
            .send()
            .map_err(|source| FetchError::Transport {
                product_number: product_number.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| FetchError::Transport {
            product_number: product_number.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                product_number: product_number.to_string(),
                status,
                url,
                body,
            });
        }

        let payload: UnitsPayload =
            serde_json::from_str(&body).map_err(|source| FetchError::InvalidPayload {
                product_number: product_number.to_string(),
                source,
            })?;
        Ok(payload.into_units())
    }
}
