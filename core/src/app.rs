//! The dashboard: a session plus the two list views.

use crate::error::ApiError;
use crate::http::Transport;
use crate::session::{Session, View};
use crate::types::Role;
use crate::views::{BookList, MemberList};

pub struct LibraryApp<T> {
    pub session: Session<T>,
    pub books: BookList,
    pub members: MemberList,
}

impl<T: Transport> LibraryApp<T> {
    pub fn new(session: Session<T>, books: BookList, members: MemberList) -> Self {
        Self {
            session,
            books,
            members,
        }
    }

    /// Initial page load: dashboard if a token is stored, login form otherwise.
    pub async fn load(&mut self) {
        if self.session.is_authenticated() {
            self.load_dashboard().await;
        } else {
            self.session.show(View::Login);
        }
    }

    /// Show the dashboard and populate both lists.
    pub async fn load_dashboard(&mut self) {
        self.session.show(View::Dashboard);
        // Failures are already alerted by the views.
        let _ = self.books.fetch_all(&mut self.session).await;
        if self.session.is_authenticated() {
            let _ = self.members.fetch_all(&mut self.session).await;
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ApiError> {
        self.session.login(username, password).await?;
        self.load_dashboard().await;
        Ok(())
    }

    pub async fn signup(&mut self, username: &str, password: &str, role: Role) -> Result<(), ApiError> {
        self.session.signup(username, password, role).await.map(|_| ())
    }

    pub fn logout(&mut self) {
        self.session.logout();
    }
}
