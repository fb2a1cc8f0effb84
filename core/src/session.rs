//! Login, signup and logout, plus the one piece of UI state the client has:
//! which top-level view is visible.
//!
//! # Design
//! `Session` is an explicit context object. It owns the `ApiClient` (and
//! through it the token store), the transport and the `Presenter`, so two
//! sessions never share a token unless their stores do.

use serde::de::DeserializeOwned;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::types::{LoginResponse, Member, Role};

/// The two mutually exclusive top-level views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Dashboard,
}

/// Presentation layer the session talks to.
pub trait Presenter {
    /// Show a blocking, user-visible notification.
    fn alert(&self, message: &str);

    /// Make `view` the only visible top-level view.
    fn show(&self, view: View);
}

pub struct Session<T> {
    client: ApiClient,
    transport: T,
    presenter: Box<dyn Presenter>,
    view: View,
}

impl<T: Transport> Session<T> {
    /// Create a session showing the login view.
    pub fn new(client: ApiClient, transport: T, presenter: impl Presenter + 'static) -> Self {
        Self {
            client,
            transport,
            presenter: Box::new(presenter),
            view: View::Login,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Whether a token is stored. Says nothing about its validity.
    pub fn is_authenticated(&self) -> bool {
        self.client.token().is_some()
    }

    pub fn show(&mut self, view: View) {
        self.view = view;
        self.presenter.show(view);
    }

    pub fn alert(&self, message: &str) {
        self.presenter.alert(message);
    }

    /// Send a request produced by one of the client's builders.
    pub async fn run<R: DeserializeOwned>(
        &self,
        request: Result<HttpRequest, ApiError>,
    ) -> Result<R, ApiError> {
        self.client.send(&self.transport, request?).await
    }

    /// Surface `error` to the user as `"<context>: <message>"`.
    ///
    /// A 401 means the stored token is no longer accepted: it is dropped and
    /// the login view is shown.
    pub fn report(&mut self, context: &str, error: &ApiError) {
        self.alert(&format!("{context}: {error}"));
        if error.is_unauthorized() && self.is_authenticated() {
            tracing::warn!("server rejected the stored token, signing out");
            self.client.tokens().clear();
            self.show(View::Login);
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        let result = self
            .run::<LoginResponse>(self.client.build_login(username, password))
            .await;
        match result {
            Ok(login) => {
                self.client.tokens().set(&login.access_token);
                tracing::info!(username, "logged in");
                self.alert("Login successful!");
                self.show(View::Dashboard);
                Ok(())
            }
            Err(e) => {
                self.report("Login failed", &e);
                Err(e)
            }
        }
    }

    pub async fn signup(
        &mut self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<Member, ApiError> {
        let result = self
            .run::<Member>(self.client.build_signup(username, password, role))
            .await;
        match result {
            Ok(account) => {
                tracing::info!(username, %role, "signed up");
                self.alert("Signup successful! You can now login.");
                self.show(View::Login);
                Ok(account)
            }
            Err(e) => {
                self.report("Signup failed", &e);
                Err(e)
            }
        }
    }

    /// Forget the token locally. The server is not contacted.
    pub fn logout(&mut self) {
        self.sign_out("Logged out successfully!");
    }

    pub(crate) fn sign_out(&mut self, message: &str) {
        self.client.tokens().clear();
        tracing::info!("logged out");
        self.alert(message);
        self.show(View::Login);
    }
}
