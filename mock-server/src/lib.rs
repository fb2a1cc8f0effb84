//! In-memory stand-in for the library-management REST API.
//!
//! Follows the real server's rules closely enough for client tests: bearer
//! tokens, LIBRARIAN/MEMBER permissions, soft-deleted members, borrow
//! history, and `{"detail": ...}` error bodies.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const LIBRARIAN: &str = "LIBRARIAN";
pub const MEMBER: &str = "MEMBER";
pub const AVAILABLE: &str = "AVAILABLE";
pub const BORROWED: &str = "BORROWED";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub status: String,
    pub borrower_id: Option<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub is_active: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct History {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub issue_date: NaiveDateTime,
    pub return_date: Option<NaiveDateTime>,
}

#[derive(Clone, Debug)]
struct User {
    id: i64,
    username: String,
    password: String,
    role: String,
    is_active: bool,
}

impl User {
    fn response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            role: self.role.clone(),
            is_active: self.is_active,
        }
    }
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct MemberUpdate {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Deserialize)]
pub struct BookCreate {
    pub title: String,
    pub author: String,
}

#[derive(Deserialize)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

/// Error response: a status plus the `detail` message.
#[derive(Debug)]
pub struct ApiError(StatusCode, String);

impl ApiError {
    fn bad_request(detail: &str) -> Self {
        Self(StatusCode::BAD_REQUEST, detail.to_string())
    }

    fn not_found(detail: &str) -> Self {
        Self(StatusCode::NOT_FOUND, detail.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let ApiError(status, detail) = self;
        let mut response = (status, Json(serde_json::json!({ "detail": detail }))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, header::HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[derive(Debug, Default)]
pub struct Library {
    next_id: i64,
    users: BTreeMap<i64, User>,
    books: BTreeMap<i64, Book>,
    history: Vec<History>,
    tokens: HashMap<String, i64>,
}

impl Library {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn user_by_name(&self, username: &str) -> Option<&User> {
        self.users.values().find(|u| u.username == username)
    }

    fn create_user(&mut self, input: UserCreate) -> Result<UserResponse, ApiError> {
        if self.user_by_name(&input.username).is_some() {
            return Err(ApiError::bad_request("Username already registered"));
        }
        let role = input.role.to_uppercase();
        if role != LIBRARIAN && role != MEMBER {
            return Err(ApiError::bad_request("Role must be LIBRARIAN or MEMBER"));
        }
        let user = User {
            id: self.allocate_id(),
            username: input.username,
            password: input.password,
            role,
            is_active: true,
        };
        let response = user.response();
        self.users.insert(user.id, user);
        Ok(response)
    }

    /// Resolve the bearer token in `headers` to an active user.
    fn authenticate(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        let unauthorized = || ApiError(StatusCode::UNAUTHORIZED, "Could not validate credentials".to_string());
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(unauthorized)?;
        let user = self
            .tokens
            .get(token)
            .and_then(|id| self.users.get(id))
            .ok_or_else(unauthorized)?;
        if !user.is_active {
            return Err(ApiError::bad_request("Inactive user"));
        }
        Ok(user.clone())
    }

    fn authorize(&self, headers: &HeaderMap, role: &str) -> Result<User, ApiError> {
        let user = self.authenticate(headers)?;
        if user.role != role {
            return Err(ApiError(StatusCode::FORBIDDEN, "Not enough permissions".to_string()));
        }
        Ok(user)
    }

    fn member_mut(&mut self, id: i64) -> Result<&mut User, ApiError> {
        self.users
            .get_mut(&id)
            .filter(|u| u.role == MEMBER)
            .ok_or_else(|| ApiError::not_found("Member not found"))
    }

    fn members(&self, active: bool) -> Vec<UserResponse> {
        self.users
            .values()
            .filter(|u| u.role == MEMBER && u.is_active == active)
            .map(User::response)
            .collect()
    }
}

pub type Db = Arc<RwLock<Library>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Library::default()));
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/books", get(list_books).post(create_book))
        .route("/books/available", get(list_available_books))
        .route("/books/borrow/{id}", post(borrow_book))
        .route("/books/return/{id}", post(return_book))
        .route("/books/{id}", put(update_book).delete(delete_book))
        .route("/members", get(list_members).post(create_member))
        .route("/members/deleted", get(list_deleted_members))
        .route("/members/history", get(members_history))
        .route("/members/me", delete(delete_own_account))
        .route("/members/me/history", get(my_history))
        .route("/members/{id}", put(update_member).delete(delete_member))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app().layer(TraceLayer::new_for_http())).await
}

// --- auth ---

async fn signup(
    State(db): State<Db>,
    Json(input): Json<UserCreate>,
) -> Result<Json<UserResponse>, ApiError> {
    db.write().await.create_user(input).map(Json)
}

async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> Result<Json<Token>, ApiError> {
    let mut library = db.write().await;
    let user_id = library
        .user_by_name(&input.username)
        .filter(|u| u.password == input.password)
        .map(|u| u.id)
        .ok_or_else(|| ApiError::bad_request("Incorrect username or password"))?;
    let token = Uuid::new_v4().to_string();
    library.tokens.insert(token.clone(), user_id);
    Ok(Json(Token {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

// --- books ---

async fn list_books(State(db): State<Db>) -> Json<Vec<Book>> {
    Json(db.read().await.books.values().cloned().collect())
}

async fn create_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<BookCreate>,
) -> Result<Json<Book>, ApiError> {
    let mut library = db.write().await;
    library.authorize(&headers, LIBRARIAN)?;
    let book = Book {
        id: library.allocate_id(),
        title: input.title,
        author: input.author,
        status: AVAILABLE.to_string(),
        borrower_id: None,
    };
    library.books.insert(book.id, book.clone());
    Ok(Json(book))
}

async fn update_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<BookUpdate>,
) -> Result<Json<Book>, ApiError> {
    let mut library = db.write().await;
    library.authorize(&headers, LIBRARIAN)?;
    let book = library
        .books
        .get_mut(&id)
        .ok_or_else(|| ApiError::not_found("Book not found"))?;
    book.title = input.title;
    book.author = input.author;
    // stored verbatim, unvalidated
    if let Some(status) = input.status {
        book.status = status;
    }
    Ok(Json(book.clone()))
}

async fn delete_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let mut library = db.write().await;
    library.authorize(&headers, LIBRARIAN)?;
    library
        .books
        .remove(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Book not found"))
}

async fn list_available_books(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<Book>>, ApiError> {
    let library = db.read().await;
    library.authorize(&headers, MEMBER)?;
    Ok(Json(
        library
            .books
            .values()
            .filter(|b| b.status == AVAILABLE)
            .cloned()
            .collect(),
    ))
}

async fn borrow_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let mut library = db.write().await;
    let user = library.authorize(&headers, MEMBER)?;
    let history_id = library.allocate_id();
    let book = library
        .books
        .get_mut(&id)
        .filter(|b| b.status == AVAILABLE)
        .ok_or_else(|| ApiError::bad_request("Book not available for borrowing"))?;
    book.status = BORROWED.to_string();
    book.borrower_id = Some(user.id);
    let book = book.clone();
    library.history.push(History {
        id: history_id,
        book_id: id,
        member_id: user.id,
        issue_date: chrono::Utc::now().naive_utc(),
        return_date: None,
    });
    Ok(Json(book))
}

async fn return_book(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let mut library = db.write().await;
    let user = library.authorize(&headers, MEMBER)?;
    let book = library
        .books
        .get_mut(&id)
        .filter(|b| b.status == BORROWED && b.borrower_id == Some(user.id))
        .ok_or_else(|| ApiError::bad_request("You cannot return a book that is not borrowed by you"))?;
    book.status = AVAILABLE.to_string();
    book.borrower_id = None;
    let book = book.clone();
    if let Some(record) = library
        .history
        .iter_mut()
        .rev()
        .find(|h| h.book_id == id && h.member_id == user.id && h.return_date.is_none())
    {
        record.return_date = Some(chrono::Utc::now().naive_utc());
    }
    Ok(Json(book))
}

// --- members ---

async fn list_members(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let library = db.read().await;
    library.authorize(&headers, LIBRARIAN)?;
    Ok(Json(library.members(true)))
}

async fn list_deleted_members(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let library = db.read().await;
    library.authorize(&headers, LIBRARIAN)?;
    Ok(Json(library.members(false)))
}

async fn create_member(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<UserCreate>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut library = db.write().await;
    library.authorize(&headers, LIBRARIAN)?;
    if input.role.to_uppercase() != MEMBER {
        return Err(ApiError::bad_request("Can only create members"));
    }
    library.create_user(input).map(Json)
}

async fn update_member(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<MemberUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut library = db.write().await;
    library.authorize(&headers, LIBRARIAN)?;
    let member = library.member_mut(id)?;
    member.username = input.username;
    if let Some(password) = input.password.filter(|p| !p.is_empty()) {
        member.password = password;
    }
    if let Some(role) = input.role {
        member.role = role.to_uppercase();
    }
    Ok(Json(member.response()))
}

async fn delete_member(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut library = db.write().await;
    library.authorize(&headers, LIBRARIAN)?;
    let member = library.member_mut(id)?;
    member.is_active = false;
    Ok(Json(member.response()))
}

async fn members_history(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<History>>, ApiError> {
    let library = db.read().await;
    library.authorize(&headers, LIBRARIAN)?;
    Ok(Json(library.history.clone()))
}

async fn my_history(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<History>>, ApiError> {
    let library = db.read().await;
    let user = library.authorize(&headers, MEMBER)?;
    Ok(Json(
        library
            .history
            .iter()
            .filter(|h| h.member_id == user.id)
            .cloned()
            .collect(),
    ))
}

async fn delete_own_account(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let mut library = db.write().await;
    let user = library.authorize(&headers, MEMBER)?;
    let member = library.member_mut(user.id)?;
    member.is_active = false;
    Ok(Json(member.response()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_create(username: &str, role: &str) -> UserCreate {
        UserCreate {
            username: username.to_string(),
            password: "pw".to_string(),
            role: role.to_string(),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        headers
    }

    #[test]
    fn signup_upper_cases_role() {
        let mut library = Library::default();
        let user = library.create_user(user_create("alice", "librarian")).unwrap();
        assert_eq!(user.role, LIBRARIAN);
        assert!(user.is_active);
    }

    #[test]
    fn signup_rejects_duplicates_and_unknown_roles() {
        let mut library = Library::default();
        library.create_user(user_create("alice", "MEMBER")).unwrap();
        let dup = library.create_user(user_create("alice", "MEMBER")).unwrap_err();
        assert_eq!(dup.1, "Username already registered");
        let bad = library.create_user(user_create("bob", "admin")).unwrap_err();
        assert_eq!(bad.1, "Role must be LIBRARIAN or MEMBER");
    }

    #[test]
    fn authenticate_requires_known_bearer_token() {
        let mut library = Library::default();
        let user = library.create_user(user_create("alice", "MEMBER")).unwrap();
        library.tokens.insert("T1".to_string(), user.id);

        assert_eq!(library.authenticate(&bearer("T1")).unwrap().id, user.id);
        let err = library.authenticate(&bearer("nope")).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
        let err = library.authenticate(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn authorize_checks_role() {
        let mut library = Library::default();
        let user = library.create_user(user_create("bob", "MEMBER")).unwrap();
        library.tokens.insert("T".to_string(), user.id);
        let err = library.authorize(&bearer("T"), LIBRARIAN).unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
        assert_eq!(err.1, "Not enough permissions");
    }

    #[test]
    fn inactive_users_are_rejected() {
        let mut library = Library::default();
        let user = library.create_user(user_create("bob", "MEMBER")).unwrap();
        library.tokens.insert("T".to_string(), user.id);
        library.member_mut(user.id).unwrap().is_active = false;
        let err = library.authenticate(&bearer("T")).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1, "Inactive user");
    }

    #[test]
    fn members_lists_only_member_role() {
        let mut library = Library::default();
        library.create_user(user_create("lib", "LIBRARIAN")).unwrap();
        let bob = library.create_user(user_create("bob", "MEMBER")).unwrap();
        assert_eq!(library.members(true), vec![bob.clone()]);
        assert!(library.members(false).is_empty());
        assert!(library.member_mut(bob.id - 1).is_err());
    }
}
