//! HTML fragments for the library and overdue panels.

use crate::lookup::{CoverSize, cover_url};
use crate::model::{LibraryBook, OverdueLoan};
use crate::reminder::{format_due_date, whatsapp_link};

const NO_COVER_SVG: &str = "data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22 width=%22120%22 height=%22180%22><rect fill=%22%23ddd%22 width=%22120%22 height=%22180%22/><text x=%2260%22 y=%2290%22 text-anchor=%22middle%22 fill=%22%23999%22 font-size=%2212%22>No Cover</text></svg>";

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Case-insensitive match on title and author; ISBN matches on the raw query.
/// The query is used as typed, surrounding whitespace included.
pub fn filter_books<'a>(books: &'a [LibraryBook], query: &str) -> Vec<&'a LibraryBook> {
    if query.is_empty() {
        return books.iter().collect();
    }
    let lowered = query.to_lowercase();
    books
        .iter()
        .filter(|b| {
            b.title.to_lowercase().contains(&lowered)
                || b.author.to_lowercase().contains(&lowered)
                || b.isbn.contains(query)
        })
        .collect()
}

pub fn render_books(books: &[&LibraryBook], covers_base: &str) -> String {
    if books.is_empty() {
        return r#"<div class="empty-state"><p>No books in library yet</p><p>Go to Scan tab to add books</p></div>"#
            .to_string();
    }

    let cards: String = books
        .iter()
        .map(|book| {
            let borrowed = book.is_borrowed();
            let title = escape_html(&book.title);
            format!(
                r#"<div class="book-card{class}"><div class="book-cover"><img src="{cover}" alt="{title}" onerror="this.src='{fallback}'">{badge}</div><div class="book-details"><h3>{title}</h3><p class="author">{author}</p></div></div>"#,
                class = if borrowed { " borrowed" } else { "" },
                cover = escape_html(&cover_url(covers_base, &book.isbn, CoverSize::Medium)),
                fallback = NO_COVER_SVG,
                badge = if borrowed {
                    r#"<span class="borrowed-badge">Borrowed</span>"#
                } else {
                    ""
                },
                title = title,
                author = escape_html(&book.author),
            )
        })
        .collect();

    format!(r#"<div class="books-grid">{}</div>"#, cards)
}

pub fn render_overdue(loans: &[OverdueLoan], covers_base: &str, library_name: &str) -> String {
    if loans.is_empty() {
        return r#"<div class="empty-state"><p>No overdue books!</p></div>"#.to_string();
    }

    loans
        .iter()
        .map(|loan| {
            let link = whatsapp_link(&loan.whatsapp, &loan.title, &loan.days_overdue, library_name);
            format!(
                r#"<div class="overdue-item"><img src="{cover}" alt="" class="overdue-cover" onerror="this.style.display='none'"><div class="overdue-info"><h3>{title}</h3><p>Borrower: {borrower}</p><p>Due: {due}</p><p class="days-overdue">{days} days overdue</p><a class="whatsapp-btn" href="{link}" target="_blank" rel="noopener">Send WhatsApp Reminder</a></div></div>"#,
                cover = escape_html(&cover_url(covers_base, &loan.isbn, CoverSize::Small)),
                title = escape_html(&loan.title),
                borrower = escape_html(&loan.borrower_name),
                due = escape_html(&format_due_date(loan.due_date.as_deref())),
                days = escape_html(&loan.days_overdue),
                link = escape_html(&link),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const COVERS: &str = "https://covers.test";

    fn book(isbn: &str, title: &str, author: &str, status: Option<&str>) -> LibraryBook {
        LibraryBook {
            isbn: isbn.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            status: status.map(str::to_string),
        }
    }

    fn shelf() -> Vec<LibraryBook> {
        vec![
            book("9780441172719", "Dune", "Frank Herbert", Some("Available")),
            book("9780060850524", "Brave New World", "Aldous Huxley", Some("Borrowed")),
            book("9780306406157", "Signals", "Dune Collective", None),
        ]
    }

    #[test]
    fn test_filter_books() {
        let books = shelf();
        assert_eq!(filter_books(&books, "").len(), 3);
        assert!(filter_books(&books, "   ").is_empty());

        let titles: Vec<_> = filter_books(&books, "DUNE").into_iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Signals"]);

        assert_eq!(filter_books(&books, "huxley").len(), 1);
        assert_eq!(filter_books(&books, "0060850").len(), 1);
        assert!(filter_books(&books, "tolkien").is_empty());
    }

    #[test]
    fn test_filter_keeps_trailing_whitespace() {
        let books = shelf();
        let titles: Vec<_> = filter_books(&books, "dune ").into_iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Signals"]);
    }

    #[test]
    fn test_render_books_empty() {
        assert!(render_books(&[], COVERS).contains("No books in library yet"));
    }

    #[test]
    fn test_render_books_marks_borrowed() {
        let books = shelf();
        let refs: Vec<&LibraryBook> = books.iter().collect();
        let html = render_books(&refs, COVERS);

        assert!(html.starts_with(r#"<div class="books-grid">"#));
        assert_eq!(html.matches(r#"class="book-card""#).count(), 2);
        assert_eq!(html.matches(r#"class="book-card borrowed""#).count(), 1);
        assert_eq!(html.matches("borrowed-badge").count(), 1);
        assert!(html.contains("https://covers.test/b/isbn/9780441172719-M.jpg"));
    }

    #[test]
    fn test_render_escapes_text() {
        let books = vec![book("9780441172719", "<script>x</script>", "A & B", None)];
        let refs: Vec<&LibraryBook> = books.iter().collect();
        let html = render_books(&refs, COVERS);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("A &amp; B"));
    }

    #[test]
    fn test_render_overdue() {
        assert!(render_overdue(&[], COVERS, "Lib").contains("No overdue books!"));

        let loans = vec![OverdueLoan {
            isbn: "9780441172719".into(),
            title: "Dune".into(),
            borrower_name: "Ama".into(),
            whatsapp: "+233 20 123".into(),
            due_date: Some("2025-01-05".into()),
            days_overdue: "12".into(),
        }];
        let html = render_overdue(&loans, COVERS, "Lib");
        assert!(html.contains("Borrower: Ama"));
        assert!(html.contains("Due: Jan 5, 2025"));
        assert!(html.contains("12 days overdue"));
        assert!(html.contains("https://wa.me/+23320123?text="));
        assert!(html.contains("-S.jpg"));
    }
}
