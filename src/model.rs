use serde::{Deserialize, Serialize};

use crate::error::HandlerError;
use crate::isbn::Isbn;

/// Which provider answered a metadata lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataSource {
    GoogleBooks,
    OpenLibrary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInfo {
    pub title: String,
    pub author: String,
    pub cover_url: String,
    pub found: bool,
    pub source: Option<MetadataSource>,
}

/// Loan state of a book as the lending service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LibraryStatus {
    NotInLibrary,
    Available,
    Borrowed { borrower: Option<String> },
}

impl LibraryStatus {
    /// Maps the service's free-form status column. A blank cell is `Available`;
    /// anything else but `Available` is on loan.
    pub fn from_remote(status: Option<&str>, borrower: Option<String>) -> Self {
        match status.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("Available") {
            "Available" => LibraryStatus::Available,
            _ => LibraryStatus::Borrowed {
                borrower: borrower.filter(|b| !b.trim().is_empty()),
            },
        }
    }

    pub fn in_library(&self) -> bool {
        !matches!(self, LibraryStatus::NotInLibrary)
    }

    pub fn label(&self) -> String {
        match self {
            LibraryStatus::NotInLibrary => "Not in library".to_string(),
            LibraryStatus::Available => "In library - Available".to_string(),
            LibraryStatus::Borrowed { borrower } => {
                format!("Borrowed by {}", borrower.as_deref().unwrap_or("someone"))
            }
        }
    }

    pub fn next_action(&self) -> LoanAction {
        match self {
            LibraryStatus::NotInLibrary => LoanAction::Add,
            LibraryStatus::Available => LoanAction::Borrow,
            LibraryStatus::Borrowed { .. } => LoanAction::Return,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanAction {
    Add,
    Borrow,
    Return,
}

/// Everything the page needs after a confirmed scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub isbn: Isbn,
    pub book: BookInfo,
    pub status: LibraryStatus,
    pub status_label: String,
    pub action: LoanAction,
}

impl ScanResult {
    pub fn new(isbn: Isbn, book: BookInfo, status: LibraryStatus) -> Self {
        ScanResult {
            status_label: status.label(),
            action: status.next_action(),
            isbn,
            book,
            status,
        }
    }
}

/// A row of the service's inventory sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryBook {
    #[serde(default, deserialize_with = "lenient_string")]
    pub isbn: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub author: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl LibraryBook {
    pub fn is_borrowed(&self) -> bool {
        self.status.as_deref() == Some("Borrowed")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueLoan {
    #[serde(default, deserialize_with = "lenient_string")]
    pub isbn: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub borrower_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub whatsapp: String,
    #[serde(default)]
    pub due_date: Option<String>,
    /// Shown as-is; the sheet may hold a number or text here.
    #[serde(default, deserialize_with = "lenient_string")]
    pub days_overdue: String,
}

/// Spreadsheet cells come back as numbers when they look like numbers (ISBNs, phones).
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

/// A list field the service may send as `null` instead of `[]`.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub donor: String,
}

impl NewBook {
    pub fn validate(isbn: Isbn, title: &str, author: &str, donor: &str) -> Result<Self, HandlerError> {
        let (title, author) = (title.trim(), author.trim());
        if title.is_empty() || author.is_empty() {
            return Err(HandlerError::Validation("Please enter title and author".to_string()));
        }
        Ok(NewBook {
            isbn,
            title: title.to_string(),
            author: author.to_string(),
            donor: donor.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub borrower_name: String,
    pub whatsapp: String,
}

impl NewLoan {
    pub fn validate(
        isbn: Isbn,
        title: &str,
        author: &str,
        borrower_name: &str,
        whatsapp: &str,
    ) -> Result<Self, HandlerError> {
        let (name, phone) = (borrower_name.trim(), whatsapp.trim());
        if name.is_empty() || phone.is_empty() {
            return Err(HandlerError::Validation(
                "Please enter name and phone number".to_string(),
            ));
        }
        Ok(NewLoan {
            isbn,
            title: title.trim().to_string(),
            author: author.trim().to_string(),
            borrower_name: name.to_string(),
            whatsapp: phone.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isbn() -> Isbn {
        Isbn::from_scan("9780306406157").unwrap()
    }

    #[test]
    fn test_status_from_remote() {
        assert_eq!(LibraryStatus::from_remote(None, None), LibraryStatus::Available);
        assert_eq!(
            LibraryStatus::from_remote(Some("Borrowed"), Some("Ama".into())),
            LibraryStatus::Borrowed { borrower: Some("Ama".into()) }
        );
        assert_eq!(
            LibraryStatus::from_remote(Some("Lost"), Some("  ".into())),
            LibraryStatus::Borrowed { borrower: None }
        );
    }

    #[test]
    fn test_blank_status_cell_is_available() {
        assert_eq!(LibraryStatus::from_remote(Some(""), None), LibraryStatus::Available);
        assert_eq!(
            LibraryStatus::from_remote(Some("   "), Some("Ama".into())),
            LibraryStatus::Available
        );
    }

    #[test]
    fn test_labels_and_actions() {
        assert_eq!(LibraryStatus::NotInLibrary.label(), "Not in library");
        assert_eq!(LibraryStatus::NotInLibrary.next_action(), LoanAction::Add);
        assert_eq!(LibraryStatus::Available.label(), "In library - Available");
        assert_eq!(LibraryStatus::Available.next_action(), LoanAction::Borrow);

        let borrowed = LibraryStatus::Borrowed { borrower: None };
        assert_eq!(borrowed.label(), "Borrowed by someone");
        assert_eq!(borrowed.next_action(), LoanAction::Return);
    }

    #[test]
    fn test_new_book_requires_title_and_author() {
        assert!(NewBook::validate(isbn(), "  ", "Author", "").is_err());
        assert!(NewBook::validate(isbn(), "Title", "", "").is_err());

        let book = NewBook::validate(isbn(), " Dune ", " Frank Herbert ", " Kofi ").unwrap();
        assert_eq!(book.title, "Dune");
        assert_eq!(book.author, "Frank Herbert");
        assert_eq!(book.donor, "Kofi");
    }

    #[test]
    fn test_new_loan_requires_name_and_phone() {
        assert!(NewLoan::validate(isbn(), "Dune", "Herbert", "Ama", " ").is_err());
        let loan = NewLoan::validate(isbn(), "Dune", "Herbert", " Ama ", "+1 555").unwrap();
        assert_eq!(loan.borrower_name, "Ama");
    }

    #[test]
    fn test_sheet_rows_tolerate_numeric_cells() {
        let book: LibraryBook =
            serde_json::from_str(r#"{"isbn": 9780306406157, "title": "Dune", "author": null}"#)
                .unwrap();
        assert_eq!(book.isbn, "9780306406157");
        assert_eq!(book.author, "");
        assert!(!book.is_borrowed());

        let loan: OverdueLoan = serde_json::from_str(
            r#"{"isbn":"9780306406157","title":"Dune","borrowerName":"Ama","whatsapp":233201234567,"dueDate":"2025-01-05","daysOverdue":3}"#,
        )
        .unwrap();
        assert_eq!(loan.whatsapp, "233201234567");
        assert_eq!(loan.days_overdue, "3");
    }

    #[test]
    fn test_days_overdue_accepts_text_and_fractions() {
        let loan: OverdueLoan =
            serde_json::from_str(r#"{"title":"Dune","daysOverdue":"3"}"#).unwrap();
        assert_eq!(loan.days_overdue, "3");

        let loan: OverdueLoan =
            serde_json::from_str(r#"{"title":"Dune","daysOverdue":2.5}"#).unwrap();
        assert_eq!(loan.days_overdue, "2.5");

        let loan: OverdueLoan = serde_json::from_str(r#"{"title":"Dune"}"#).unwrap();
        assert_eq!(loan.days_overdue, "");
    }
}
