use crate::error::ScoutError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;

/// One search-result card parsed from the rendered results page
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListingRecord {
    pub index: usize,
    pub id: Option<String>,
    pub address: Option<String>,
    pub address_url: Option<String>,
    pub geo: Option<String>,
    pub url: Option<String>,
    pub summary: Option<String>,
    pub label: Option<String>,
    /// One entry per image; `None` when the image carries no URL
    pub images: Vec<Option<String>>,
    pub listing_by: Option<String>,
    pub beds: Option<String>,
    pub bath: Option<String>,
    pub sqft: Option<String>,
    pub price: Option<String>,
    /// Featured event category; serialized as `false` when the card is not featured
    #[serde(serialize_with = "featured_or_false")]
    pub featured: Option<String>,
    pub sponsored: bool,
    pub verified: bool,
}

fn featured_or_false<S: Serializer>(value: &Option<String>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(category) => serializer.serialize_str(category),
        None => serializer.serialize_bool(false),
    }
}

/// One intercepted request together with the side-channel fetch of its URL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkExchange {
    pub success: bool,
    pub request_url: String,
    pub request_headers: Value,
    pub request_post_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_size: Option<String>,
    pub response_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    pub captured_at: DateTime<Utc>,
}

/// The request half of an exchange, as seen by the page observer
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedRequest {
    pub url: String,
    pub headers: Value,
    pub post_data: Option<String>,
}

impl NetworkExchange {
    pub fn succeeded(
        request: ObservedRequest,
        response_headers: BTreeMap<String, String>,
        response_body: String,
    ) -> Self {
        let response_size = response_headers.get("content-length").cloned();
        Self {
            success: true,
            request_url: request.url,
            request_headers: request.headers,
            request_post_data: request.post_data,
            response_headers: Some(response_headers),
            response_size,
            response_body: Some(response_body),
            status_code: None,
            captured_at: Utc::now(),
        }
    }

    pub fn failed(request: ObservedRequest, status_code: Option<u16>, error_body: String) -> Self {
        Self {
            success: false,
            request_url: request.url,
            request_headers: request.headers,
            request_post_data: request.post_data,
            response_headers: None,
            response_size: None,
            response_body: Some(error_body),
            status_code,
            captured_at: Utc::now(),
        }
    }
}

/// Terminal state of one page session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Success(Vec<ListingRecord>),
    NoResults,
    ChallengeDetected,
}

impl SessionOutcome {
    /// Records to report; a challenge becomes an error for the caller
    pub fn into_records(self) -> Result<Vec<ListingRecord>, ScoutError> {
        match self {
            SessionOutcome::Success(records) => Ok(records),
            SessionOutcome::NoResults => Ok(Vec::new()),
            SessionOutcome::ChallengeDetected => Err(ScoutError::ChallengeDetected),
        }
    }
}
