//! Client for the spreadsheet-backed lending service.
//!
//! The service is a single web-app URL dispatched on an `action` query
//! parameter. Writes are sent as GET too: the web app only answers simple
//! requests, and its replies are not always JSON.

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::LibraryError;
use crate::isbn::Isbn;
use crate::model::{LibraryBook, LibraryStatus, NewBook, NewLoan, OverdueLoan, lenient_vec};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookRecord {
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    current_borrower: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BooksPayload {
    #[serde(default, deserialize_with = "lenient_vec")]
    books: Vec<LibraryBook>,
}

#[derive(Debug, Deserialize)]
struct OverduePayload {
    #[serde(default, deserialize_with = "lenient_vec")]
    overdue: Vec<OverdueLoan>,
}

#[derive(Debug, PartialEq)]
pub struct WriteReply {
    pub success: bool,
    pub error: Option<String>,
}

/// Loose truthiness, the way the web app's own clients read its flags.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

impl WriteReply {
    /// Interprets a write reply body. Non-JSON bodies count as success when they say so.
    pub fn parse(body: &str) -> WriteReply {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => WriteReply {
                success: value.get("success").is_some_and(is_truthy),
                error: value
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            Err(_) if body.to_lowercase().contains("success") => WriteReply {
                success: true,
                error: None,
            },
            Err(_) => WriteReply {
                success: false,
                error: Some("Unexpected response from server".to_string()),
            },
        }
    }

    fn into_result(self, default_error: &str) -> Result<(), LibraryError> {
        if self.success {
            Ok(())
        } else {
            Err(LibraryError::Rejected(
                self.error
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| default_error.to_string()),
            ))
        }
    }
}

#[derive(Debug, Clone)]
pub struct LibraryClient {
    api_url: String,
    client: Client,
}

impl LibraryClient {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        LibraryClient {
            api_url: api_url.into(),
            client,
        }
    }

    async fn call(&self, params: &[(&str, &str)]) -> Result<String, LibraryError> {
        let action = params
            .iter()
            .find(|(k, _)| *k == "action")
            .map(|(_, v)| *v)
            .unwrap_or("");
        tracing::debug!(action, "calling library service");

        let response = self.client.get(&self.api_url).query(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LibraryError::Status { status, body });
        }
        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(&self, params: &[(&str, &str)]) -> Result<T, LibraryError> {
        let body = self.call(params).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Loan status of one book. Any failure reads as "not in library" so the
    /// desk can still offer to add it.
    pub async fn get_book(&self, isbn: &Isbn) -> LibraryStatus {
        let record: BookRecord = match self
            .fetch(&[("action", "getBook"), ("isbn", isbn.as_str())])
            .await
        {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(isbn = %isbn, error = %e, "library status check failed");
                return LibraryStatus::NotInLibrary;
            }
        };

        if record.error.is_some() {
            return LibraryStatus::NotInLibrary;
        }

        LibraryStatus::from_remote(record.status.as_deref(), record.current_borrower)
    }

    pub async fn get_books(&self) -> Result<Vec<LibraryBook>, LibraryError> {
        let payload: BooksPayload = self.fetch(&[("action", "getBooks")]).await?;
        Ok(payload.books)
    }

    pub async fn get_overdue(&self) -> Result<Vec<OverdueLoan>, LibraryError> {
        let payload: OverduePayload = self.fetch(&[("action", "getOverdue")]).await?;
        Ok(payload.overdue)
    }

    pub async fn add_book(&self, book: &NewBook) -> Result<(), LibraryError> {
        let body = self
            .call(&[
                ("action", "addBook"),
                ("isbn", book.isbn.as_str()),
                ("title", book.title.as_str()),
                ("author", book.author.as_str()),
                ("donor", book.donor.as_str()),
            ])
            .await?;
        WriteReply::parse(&body).into_result("Failed to add book")
    }

    pub async fn borrow(&self, loan: &NewLoan) -> Result<(), LibraryError> {
        let body = self
            .call(&[
                ("action", "borrow"),
                ("isbn", loan.isbn.as_str()),
                ("title", loan.title.as_str()),
                ("author", loan.author.as_str()),
                ("borrowerName", loan.borrower_name.as_str()),
                ("whatsapp", loan.whatsapp.as_str()),
            ])
            .await?;
        WriteReply::parse(&body).into_result("Failed to borrow")
    }

    pub async fn return_book(&self, isbn: &Isbn) -> Result<(), LibraryError> {
        let body = self
            .call(&[("action", "return"), ("isbn", isbn.as_str())])
            .await?;
        WriteReply::parse(&body).into_result("Failed to return")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_reply_json() {
        assert_eq!(
            WriteReply::parse(r#"{"success":true}"#),
            WriteReply { success: true, error: None }
        );
        assert_eq!(
            WriteReply::parse(r#"{"success":false,"error":"Book not found"}"#),
            WriteReply { success: false, error: Some("Book not found".into()) }
        );
    }

    #[test]
    fn test_write_reply_uses_truthiness_on_json() {
        let reply = WriteReply::parse(r#"{"success":false,"error":{"message":"Lock timeout"}}"#);
        assert_eq!(reply, WriteReply { success: false, error: None });

        let reply = WriteReply::parse(r#"{"success":0,"error":"Book not available"}"#);
        assert_eq!(reply, WriteReply { success: false, error: Some("Book not available".into()) });

        assert!(!WriteReply::parse(r#"{"success":""}"#).success);
        assert!(!WriteReply::parse(r#"{"success":null}"#).success);
        assert!(!WriteReply::parse(r#"{"status":"success"}"#).success);
        assert!(!WriteReply::parse(r#""success""#).success);
        assert!(WriteReply::parse(r#"{"success":1}"#).success);
        assert!(WriteReply::parse(r#"{"success":"yes"}"#).success);
    }

    #[test]
    fn test_lists_tolerate_null() {
        let books: BooksPayload = serde_json::from_str(r#"{"books":null}"#).unwrap();
        assert!(books.books.is_empty());

        let books: BooksPayload = serde_json::from_str("{}").unwrap();
        assert!(books.books.is_empty());

        let overdue: OverduePayload = serde_json::from_str(r#"{"overdue":null}"#).unwrap();
        assert!(overdue.overdue.is_empty());
    }

    #[test]
    fn test_write_reply_plain_text() {
        assert!(WriteReply::parse("Operation SUCCESS").success);

        let reply = WriteReply::parse("<html>Moved Temporarily</html>");
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("Unexpected response from server"));
    }

    #[test]
    fn test_rejection_default_message() {
        let err = WriteReply { success: false, error: None }
            .into_result("Failed to borrow")
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to borrow");
    }
}
