//! Location listing and the connection health probe.

use serde::Serialize;

use crate::client::{CrmClient, RequestOptions};
use crate::response::CrmResponse;

const LOCATIONS_SEARCH_ENDPOINT: &str = "locations/search";

/// Parameters for one page of the location listing.
#[derive(Debug, Clone, Default)]
pub struct ListLocationsParams {
    pub limit: u32,
    pub skip: u64,
    pub search: Option<String>,
    /// External agency identifier, when the agency config carries one.
    pub company_id: Option<String>,
}

/// One page of raw location payloads.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationsPage {
    pub locations: Vec<serde_json::Value>,
    /// Total reported by the CRM, when it reports one.
    pub total: Option<u64>,
}

impl LocationsPage {
    /// Read `{ "locations": [...], "total"|"count": n }`.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when `locations` is missing or
    /// is not an array.
    pub fn from_body(body: serde_json::Value) -> Result<Self, String> {
        let total = body
            .get("total")
            .or_else(|| body.get("count"))
            .and_then(serde_json::Value::as_u64);

        let serde_json::Value::Object(mut map) = body else {
            return Err("locations response is not a JSON object".to_string());
        };
        match map.remove("locations") {
            Some(serde_json::Value::Array(locations)) => Ok(Self { locations, total }),
            Some(_) => Err("locations response field 'locations' is not an array".to_string()),
            None => Err("locations response is missing 'locations'".to_string()),
        }
    }
}

/// Result of probing the CRM with the agency credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrmHealth {
    pub ok: bool,
    pub status: u16,
    pub error: Option<String>,
}

impl CrmClient {
    /// Fetch one page of locations under the agency-level credential.
    ///
    /// Does not loop; callers drive pagination.
    pub async fn list_locations(&self, params: &ListLocationsParams) -> CrmResponse<LocationsPage> {
        let mut options = RequestOptions::get()
            .query("limit", params.limit)
            .query("skip", params.skip);
        if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
            options = options.query("search", search);
        }
        if let Some(company_id) = params.company_id.as_deref().filter(|s| !s.is_empty()) {
            options = options.query("companyId", company_id);
        }

        self.request_scoped(self.agency_scope(), None, LOCATIONS_SEARCH_ENDPOINT, options)
            .await
            .and_then(LocationsPage::from_body)
    }

    /// Probe connectivity and credentials with a one-row listing.
    pub async fn health(&self, company_id: Option<&str>) -> CrmHealth {
        let params = ListLocationsParams {
            limit: 1,
            skip: 0,
            search: None,
            company_id: company_id.map(str::to_owned),
        };
        let response = self.list_locations(&params).await;
        CrmHealth {
            ok: response.is_success(),
            status: response.status,
            error: response.error,
        }
    }
}
