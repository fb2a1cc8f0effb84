//! Request builder and response parser for the library API.
//!
//! # Design
//! `ApiClient` holds the base URL and the token store. Every operation is
//! split into a `build_*` step producing an `HttpRequest` and a parse step
//! consuming an `HttpResponse`; `request` glues the two around a
//! `Transport`. Authenticated builds read the token store and fail with
//! `AuthenticationRequired` before a request exists, so such a call can never
//! reach the network.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::token::TokenStore;
use crate::types::{
    BookUpdate, LoginRequest, MemberUpdate, NewBook, NewMember, Role, SignupRequest,
};

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8001";

/// Whether a request must carry the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    Required,
    None,
}

/// Builds, sends and parses requests against one API base URL.
pub struct ApiClient {
    base_url: String,
    tokens: Box<dyn TokenStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, tokens: impl TokenStore + 'static) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: Box::new(tokens),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tokens(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    /// The stored bearer token. An empty string counts as no token.
    pub fn token(&self) -> Option<String> {
        self.tokens.get().filter(|token| !token.is_empty())
    }

    /// Build a JSON request for `path` relative to the base URL.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if auth == Auth::Required {
            let token = self.token().ok_or(ApiError::AuthenticationRequired)?;
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Serialization(e.to_string()))?;

        Ok(HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body,
        })
    }

    /// Turn a response into `R`, or into an `ApiError` for non-2xx statuses.
    ///
    /// An empty success body parses as JSON `null`, so `()` and `Option<_>`
    /// accept bodiless responses.
    pub fn parse_response<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R, ApiError> {
        if !response.is_success() {
            return Err(ApiError::from_response(response.status, &response.body));
        }
        let body = if response.body.trim().is_empty() {
            "null"
        } else {
            response.body.as_str()
        };
        serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Execute a built request and parse its response.
    pub async fn send<T: Transport, R: DeserializeOwned>(
        &self,
        transport: &T,
        request: HttpRequest,
    ) -> Result<R, ApiError> {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "sending request");
        let response = transport.execute(request).await?;
        tracing::debug!(status = response.status, "received response");
        self.parse_response(response)
    }

    /// Build, send and parse in one step.
    pub async fn request<T: Transport, B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        transport: &T,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
        auth: Auth,
    ) -> Result<R, ApiError> {
        let request = self.build_request(method, path, body, auth)?;
        self.send(transport, request).await
    }

    // -- auth ---------------------------------------------------------------

    pub fn build_login(&self, username: &str, password: &str) -> Result<HttpRequest, ApiError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.build_request(HttpMethod::Post, "/auth/login", Some(&body), Auth::None)
    }

    pub fn build_signup(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<HttpRequest, ApiError> {
        let body = SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
            role,
        };
        self.build_request(HttpMethod::Post, "/auth/signup", Some(&body), Auth::None)
    }

    // -- books --------------------------------------------------------------

    pub fn build_list_books(&self) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Get, "/books", None, Auth::Required)
    }

    pub fn build_create_book(&self, input: &NewBook) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Post, "/books", Some(input), Auth::Required)
    }

    pub fn build_update_book(&self, id: i64, input: &BookUpdate) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Put, &format!("/books/{id}"), Some(input), Auth::Required)
    }

    pub fn build_delete_book(&self, id: i64) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Delete, &format!("/books/{id}"), None, Auth::Required)
    }

    pub fn build_list_available_books(&self) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Get, "/books/available", None, Auth::Required)
    }

    pub fn build_borrow_book(&self, id: i64) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Post, &format!("/books/borrow/{id}"), None, Auth::Required)
    }

    pub fn build_return_book(&self, id: i64) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Post, &format!("/books/return/{id}"), None, Auth::Required)
    }

    // -- members ------------------------------------------------------------

    pub fn build_list_members(&self) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Get, "/members", None, Auth::Required)
    }

    pub fn build_create_member(&self, input: &NewMember) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Post, "/members", Some(input), Auth::Required)
    }

    pub fn build_update_member(&self, id: i64, input: &MemberUpdate) -> Result<HttpRequest, ApiError> {
        self.build_request(HttpMethod::Put, &format!("/members/{id}"), Some(input), Auth::Required)
    }

    pub fn build_delete_member(&self, id: i64) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Delete, &format!("/members/{id}"), None, Auth::Required)
    }

    pub fn build_list_deleted_members(&self) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Get, "/members/deleted", None, Auth::Required)
    }

    pub fn build_members_history(&self) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Get, "/members/history", None, Auth::Required)
    }

    pub fn build_my_history(&self) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Get, "/members/me/history", None, Auth::Required)
    }

    pub fn build_delete_own_account(&self) -> Result<HttpRequest, ApiError> {
        self.build_request::<()>(HttpMethod::Delete, "/members/me", None, Auth::Required)
    }
}
