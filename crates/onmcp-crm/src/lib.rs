//! Client for the external CRM's REST API.
//!
//! Every call returns a [`CrmResponse`] triple instead of failing: transport
//! problems carry status `0`, rejections carry the HTTP status, and missing
//! credentials short-circuit with status `0` before any request is sent.

pub mod client;
pub mod error;
pub mod locations;
pub mod oauth;
pub mod response;
pub mod scope;

pub use client::{CrmClient, RequestOptions};
pub use error::{ClientBuildError, CredentialError, CrmError};
pub use locations::{CrmHealth, ListLocationsParams, LocationsPage};
pub use oauth::TokenGrant;
pub use response::{CrmResponse, TRANSPORT_FAILURE};
pub use scope::{resolve_token, TokenScope};
