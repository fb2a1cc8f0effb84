//! Client core for the library-management REST API.
//!
//! # Overview
//! Stores a bearer token, issues authenticated JSON requests, and drives two
//! CRUD lists (books, members) through a render interface. Every user action
//! maps to one request followed, on success, by a full re-fetch of the
//! affected list.
//!
//! # Design
//! - `ApiClient` splits each call into `build_*` (produces an `HttpRequest`)
//!   and `parse_response` (consumes an `HttpResponse`); a `Transport` does
//!   the I/O in between (host-does-IO).
//! - `Session` is an explicit context: client, token store, transport,
//!   presenter and the visible `View`. Nothing is global.
//! - `ListView<E>` talks to a `ListRenderer`; the HTML renderer and the
//!   browser bindings (`web` feature) are just implementations of it.

pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod render;
pub mod session;
pub mod token;
pub mod types;
pub mod views;

#[cfg(all(target_arch = "wasm32", feature = "web"))]
pub mod web;

pub use app::LibraryApp;
pub use client::{ApiClient, Auth, DEFAULT_BASE_URL};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use render::HtmlListRenderer;
pub use session::{Presenter, Session, View};
pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_STORAGE_KEY};
pub use types::{
    Book, BookStatus, BookUpdate, HistoryEntry, LoginResponse, Member, MemberUpdate, NewBook,
    NewMember, Role,
};
pub use views::{BookList, ItemAction, ListRenderer, ListView, MemberList, Resource};
