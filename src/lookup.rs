//! Book metadata lookup.
//!
//! Google Books is asked first; Open Library only when Google has nothing. A
//! lookup never fails: provider errors are logged and the caller gets an empty
//! [`BookInfo`] with a guessed cover so the user can type the details in.

use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

use crate::config::Providers;
use crate::isbn::Isbn;
use crate::model::{BookInfo, MetadataSource};

#[derive(Debug, Deserialize)]
struct GoogleVolumes {
    #[serde(default)]
    items: Vec<GoogleVolume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVolume {
    volume_info: GoogleVolumeInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleVolumeInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Option<Vec<String>>,
    #[serde(default)]
    image_links: Option<GoogleImageLinks>,
}

#[derive(Debug, Deserialize)]
struct GoogleImageLinks {
    #[serde(default)]
    thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryBook {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Option<Vec<OpenLibraryAuthor>>,
    #[serde(default)]
    cover: Option<OpenLibraryCover>,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryAuthor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct OpenLibraryCover {
    #[serde(default)]
    medium: Option<String>,
    #[serde(default)]
    large: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BookLookup {
    client: Client,
    providers: Providers,
}

impl BookLookup {
    pub fn new(client: Client, providers: Providers) -> Self {
        BookLookup { client, providers }
    }

    pub async fn lookup(&self, isbn: &Isbn) -> BookInfo {
        let mut info = match self.google_books(isbn).await {
            Ok(Some(info)) => {
                tracing::info!(isbn = %isbn, title = %info.title, "found in google books");
                Some(info)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(isbn = %isbn, error = %e, "google books lookup failed");
                None
            }
        };

        if info.is_none() {
            info = match self.open_library(isbn).await {
                Ok(Some(info)) => {
                    tracing::info!(isbn = %isbn, title = %info.title, "found in open library");
                    Some(info)
                }
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(isbn = %isbn, error = %e, "open library lookup failed");
                    None
                }
            };
        }

        let mut info = info.unwrap_or_else(|| BookInfo {
            title: String::new(),
            author: String::new(),
            cover_url: String::new(),
            found: false,
            source: None,
        });

        if info.cover_url.is_empty() {
            info.cover_url = cover_url(&self.providers.covers_url, isbn.as_str(), CoverSize::Medium);
        }

        info
    }

    async fn google_books(&self, isbn: &Isbn) -> Result<Option<BookInfo>, reqwest::Error> {
        let url = format!("{}/volumes", self.providers.google_books_url);
        let volumes: GoogleVolumes = self
            .client
            .get(&url)
            .query(&[("q", format!("isbn:{}", isbn))])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(volume) = volumes.items.into_iter().next() else {
            return Ok(None);
        };
        let book = volume.volume_info;

        let cover_url = book
            .image_links
            .and_then(|links| links.thumbnail)
            .map(|thumb| force_https(&thumb))
            .unwrap_or_default();

        Ok(Some(BookInfo {
            title: book.title.unwrap_or_default(),
            author: book.authors.map(|a| a.join(", ")).unwrap_or_default(),
            cover_url,
            found: true,
            source: Some(MetadataSource::GoogleBooks),
        }))
    }

    async fn open_library(&self, isbn: &Isbn) -> Result<Option<BookInfo>, reqwest::Error> {
        let url = format!("{}/api/books", self.providers.open_library_url);
        let key = format!("ISBN:{}", isbn);
        let mut books: HashMap<String, OpenLibraryBook> = self
            .client
            .get(&url)
            .query(&[("bibkeys", key.as_str()), ("format", "json"), ("jscmd", "data")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(book) = books.remove(&key) else {
            return Ok(None);
        };

        let cover_url = book
            .cover
            .and_then(|c| c.medium.or(c.large))
            .unwrap_or_default();

        Ok(Some(BookInfo {
            title: book.title.unwrap_or_default(),
            author: book
                .authors
                .map(|a| a.into_iter().map(|a| a.name).collect::<Vec<_>>().join(", "))
                .unwrap_or_default(),
            cover_url,
            found: true,
            source: Some(MetadataSource::OpenLibrary),
        }))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CoverSize {
    Small,
    Medium,
}

/// Open Library serves a cover for any ISBN it knows, by URL alone.
pub fn cover_url(base: &str, isbn: &str, size: CoverSize) -> String {
    let suffix = match size {
        CoverSize::Small => "S",
        CoverSize::Medium => "M",
    };
    format!("{}/b/isbn/{}-{}.jpg", base, isbn, suffix)
}

fn force_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_force_https() {
        assert_eq!(
            force_https("http://books.google.com/x?id=1"),
            "https://books.google.com/x?id=1"
        );
        assert_eq!(force_https("https://a.test/b"), "https://a.test/b");
    }

    #[test]
    fn test_cover_url() {
        assert_eq!(
            cover_url("https://covers.openlibrary.org", "9780441172719", CoverSize::Medium),
            "https://covers.openlibrary.org/b/isbn/9780441172719-M.jpg"
        );
        assert_eq!(
            cover_url("https://c.test", "9780441172719", CoverSize::Small),
            "https://c.test/b/isbn/9780441172719-S.jpg"
        );
    }

    #[test]
    fn test_google_payload_shape() {
        let raw = r#"{"kind":"books#volumes","totalItems":1,"items":[{"volumeInfo":{"title":"Dune","authors":["Frank Herbert"],"imageLinks":{"thumbnail":"http://x.test/t.jpg"}}}]}"#;
        let parsed: GoogleVolumes = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.items[0].volume_info.title.as_deref(), Some("Dune"));

        let empty: GoogleVolumes = serde_json::from_str(r#"{"totalItems":0}"#).unwrap();
        assert!(empty.items.is_empty());
    }
}
