use serde::{Deserialize, Serialize};

/// Envelope for every JSON response the page receives.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct APIResponse<T = ()> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> APIResponse<T> {
    pub fn ok(msg: &str, data: T) -> Self {
        APIResponse {
            status: msg.to_owned(),
            data: Some(data),
            error: None,
        }
    }
}

impl APIResponse<()> {
    pub fn new_from_msg(msg: &str) -> Self {
        APIResponse {
            status: msg.to_owned(),
            data: None,
            error: None,
        }
    }

    pub fn error(msg: &str) -> Self {
        APIResponse {
            status: "error".to_owned(),
            data: None,
            error: Some(msg.to_owned()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub session: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub session: String,
}

#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub isbn: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub donor: String,
}

#[derive(Debug, Deserialize)]
pub struct BorrowRequest {
    pub isbn: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    pub borrower_name: String,
    pub whatsapp: String,
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReturnRequest {
    pub isbn: String,
    #[serde(default)]
    pub session: Option<String>,
}
