//! Domain DTOs for the library API.
//!
//! # Design
//! These mirror the server's JSON schema. The client never keeps an
//! authoritative copy of any of them: lists are re-fetched after every
//! mutation. Passwords only ever travel outward and are redacted from
//! `Debug` output.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Circulation state of a book.
///
/// The server stores whatever status an edit sent, so decoding is lenient:
/// known values match in any case and anything else is kept verbatim in
/// `Other`. Parsing user input with `FromStr` stays strict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookStatus {
    Available,
    Borrowed,
    Other(String),
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookStatus::Available => "AVAILABLE",
            BookStatus::Borrowed => "BORROWED",
            BookStatus::Other(raw) => raw,
        })
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AVAILABLE" => Ok(BookStatus::Available),
            "BORROWED" => Ok(BookStatus::Borrowed),
            other => Err(format!("unknown book status: {other}")),
        }
    }
}

impl Serialize for BookStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl BookStatus {
    /// Lenient parse: a known status in any case, otherwise `Other(raw)`.
    pub fn from_stored(raw: String) -> Self {
        raw.parse().unwrap_or(BookStatus::Other(raw))
    }
}

impl<'de> Deserialize<'de> for BookStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(BookStatus::from_stored)
    }
}

/// Account role. The server stores roles upper-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Librarian,
    Member,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Role::Librarian => "LIBRARIAN",
            Role::Member => "MEMBER",
        })
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LIBRARIAN" => Ok(Role::Librarian),
            "MEMBER" => Ok(Role::Member),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A book as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    #[serde(default)]
    pub borrower_id: Option<i64>,
}

/// Payload for `POST /books`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
}

/// Edit form for `PUT /books/{id}`, carrying every field at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,
}

impl BookUpdate {
    /// Assemble the form from free-text answers. A blank status leaves it
    /// unchanged; anything else is sent as typed.
    pub fn from_answers(title: String, author: String, status: &str) -> Self {
        let status = status.trim();
        Self {
            title,
            author,
            status: (!status.is_empty()).then(|| BookStatus::from_stored(status.to_string())),
        }
    }
}

/// A user account as returned by the API. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Payload for `POST /members`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for NewMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewMember")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Edit form for `PUT /members/{id}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl fmt::Debug for MemberUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberUpdate")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Payload for `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Payload for `POST /auth/signup`.
#[derive(Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// One borrow record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub issue_date: NaiveDateTime,
    #[serde(default)]
    pub return_date: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn book_status_uses_upper_case_on_the_wire() {
        let book: Book = serde_json::from_str(
            r#"{"id":5,"title":"1984","author":"Orwell","status":"BORROWED","borrower_id":2}"#,
        )
        .unwrap();
        assert_eq!(book.status, BookStatus::Borrowed);
        assert_eq!(book.borrower_id, Some(2));
        assert_eq!(serde_json::to_value(BookStatus::Available).unwrap(), "AVAILABLE");
    }

    #[test]
    fn book_status_decoding_keeps_stored_values() {
        let books: Vec<Book> = serde_json::from_str(
            r#"[{"id":1,"title":"Dune","author":"Herbert","status":"borrowed"},
                {"id":2,"title":"Emma","author":"Austen","status":"LOST"}]"#,
        )
        .unwrap();
        assert_eq!(books[0].status, BookStatus::Borrowed);
        assert_eq!(books[1].status, BookStatus::Other("LOST".to_string()));
        assert_eq!(books[1].status.to_string(), "LOST");
        assert_eq!(serde_json::to_value(&books[1].status).unwrap(), "LOST");
        assert!("lost".parse::<BookStatus>().is_err());
    }

    #[test]
    fn book_update_omits_unset_status() {
        let update = BookUpdate {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            status: None,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert!(json.get("status").is_none());
    }

    #[test]
    fn book_form_from_answers() {
        let form = BookUpdate::from_answers("Dune".to_string(), "Herbert".to_string(), " borrowed ");
        assert_eq!(form.status, Some(BookStatus::Borrowed));

        let form = BookUpdate::from_answers("Dune".to_string(), "Herbert".to_string(), "");
        assert_eq!(form.status, None);

        let form = BookUpdate::from_answers("Dune".to_string(), "Herbert".to_string(), "LOST");
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["status"], "LOST");
    }

    #[test]
    fn role_parses_any_case() {
        assert_eq!("librarian".parse::<Role>().unwrap(), Role::Librarian);
        let member: Member =
            serde_json::from_str(r#"{"id":1,"username":"bob","role":"member"}"#).unwrap();
        assert_eq!(member.role, Role::Member);
        assert!(member.is_active);
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn passwords_are_redacted_in_debug() {
        let new_member = NewMember {
            username: "carol".to_string(),
            password: "hunter2".to_string(),
            role: Role::Member,
        };
        let update = MemberUpdate {
            username: "carol".to_string(),
            password: "hunter2".to_string(),
            role: None,
        };
        assert!(!format!("{new_member:?}").contains("hunter2"));
        assert!(!format!("{update:?}").contains("hunter2"));
    }

    #[test]
    fn history_entry_accepts_naive_timestamps() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"id":1,"book_id":2,"member_id":3,"issue_date":"2024-03-01T10:15:30.123456","return_date":null}"#,
        )
        .unwrap();
        assert_eq!(entry.book_id, 2);
        assert!(entry.return_date.is_none());
    }
}
