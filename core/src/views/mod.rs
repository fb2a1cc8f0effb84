//! CRUD list views for books and members.
//!
//! # Design
//! Both lists follow the same cycle: fetch the whole collection, hand it to a
//! `ListRenderer` as a full replacement, and after any successful mutation
//! fetch again. Nothing is merged locally and nothing is rendered after a
//! failure, so the container only ever shows a complete server response.
//!
//! The per-entity differences (paths, labels, payload types) live in the
//! `Resource` trait; `ListView<E>` carries the shared flow.

mod books;
mod members;

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::session::Session;
use crate::types::{Book, Member};

pub type BookList = ListView<Book>;
pub type MemberList = ListView<Member>;

/// An entity type with a CRUD collection on the server.
pub trait Resource: DeserializeOwned {
    /// Payload for creating one item.
    type Create: Serialize;
    /// Structured edit form carrying every editable field.
    type Update: Serialize;

    /// Plural name, used in "Failed to load ..." messages.
    const COLLECTION: &'static str;
    /// Singular, lower-case name.
    const NOUN: &'static str;
    /// CSS class of one rendered item.
    const ITEM_CLASS: &'static str;

    fn id(&self) -> i64;

    /// Labelled values shown for one item, in display order.
    fn display_fields(&self) -> Vec<(&'static str, String)>;

    fn build_list(client: &ApiClient) -> Result<HttpRequest, ApiError>;
    fn build_create(client: &ApiClient, input: &Self::Create) -> Result<HttpRequest, ApiError>;
    fn build_update(client: &ApiClient, id: i64, input: &Self::Update)
        -> Result<HttpRequest, ApiError>;
    fn build_delete(client: &ApiClient, id: i64) -> Result<HttpRequest, ApiError>;
}

/// Presentation of one list container.
pub trait ListRenderer<E> {
    /// Replace everything in the container with `items`.
    fn render_list(&self, items: &[E]);
}

/// Per-item control, bound to the item's identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemAction {
    Edit(i64),
    Delete(i64),
}

impl ItemAction {
    /// Value of the control's `data-action` attribute.
    pub fn name(self) -> &'static str {
        match self {
            ItemAction::Edit(_) => "edit",
            ItemAction::Delete(_) => "delete",
        }
    }

    pub fn id(self) -> i64 {
        match self {
            ItemAction::Edit(id) | ItemAction::Delete(id) => id,
        }
    }

    /// Recover the action from a rendered control's `data-action` and
    /// `data-id` attributes.
    pub fn from_control(action: &str, id: &str) -> Option<Self> {
        let id = id.trim().parse().ok()?;
        match action {
            "edit" => Some(ItemAction::Edit(id)),
            "delete" => Some(ItemAction::Delete(id)),
            _ => None,
        }
    }
}

pub struct ListView<E> {
    renderer: Box<dyn ListRenderer<E>>,
}

impl<E: Resource> ListView<E> {
    pub fn new(renderer: impl ListRenderer<E> + 'static) -> Self {
        Self {
            renderer: Box::new(renderer),
        }
    }

    /// Fetch the collection and re-render it. On failure the container is
    /// left untouched.
    pub async fn fetch_all<T: Transport>(&self, session: &mut Session<T>) -> Result<Vec<E>, ApiError> {
        let request = E::build_list(session.client());
        self.load(session, request, &format!("Failed to load {}", E::COLLECTION))
            .await
    }

    pub async fn add<T: Transport>(
        &self,
        session: &mut Session<T>,
        input: &E::Create,
    ) -> Result<E, ApiError> {
        let request = E::build_create(session.client(), input);
        self.mutate(session, request, "add", "added").await
    }

    pub async fn edit<T: Transport>(
        &self,
        session: &mut Session<T>,
        id: i64,
        input: &E::Update,
    ) -> Result<E, ApiError> {
        let request = E::build_update(session.client(), id, input);
        self.mutate(session, request, "update", "updated").await
    }

    pub async fn delete<T: Transport>(&self, session: &mut Session<T>, id: i64) -> Result<(), ApiError> {
        let request = E::build_delete(session.client(), id);
        self.mutate::<T, IgnoredAny>(session, request, "delete", "deleted")
            .await
            .map(|_| ())
    }

    /// Send a list request and render its result.
    async fn load<T: Transport>(
        &self,
        session: &mut Session<T>,
        request: Result<HttpRequest, ApiError>,
        failure: &str,
    ) -> Result<Vec<E>, ApiError> {
        match session.run::<Vec<E>>(request).await {
            Ok(items) => {
                tracing::debug!(count = items.len(), "rendering {}", E::COLLECTION);
                self.renderer.render_list(&items);
                Ok(items)
            }
            Err(e) => {
                session.report(failure, &e);
                Err(e)
            }
        }
    }

    /// Send a mutation; on success announce it and refresh the list.
    async fn mutate<T: Transport, R: DeserializeOwned>(
        &self,
        session: &mut Session<T>,
        request: Result<HttpRequest, ApiError>,
        verb: &str,
        past: &str,
    ) -> Result<R, ApiError> {
        match session.run::<R>(request).await {
            Ok(value) => {
                session.alert(&format!("{} {past} successfully!", capitalize(E::NOUN)));
                // A failed refresh is reported by fetch_all; the mutation itself stands.
                let _ = self.fetch_all(session).await;
                Ok(value)
            }
            Err(e) => {
                session.report(&format!("Failed to {verb} {}", E::NOUN), &e);
                Err(e)
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_action_from_control_attributes() {
        assert_eq!(ItemAction::from_control("edit", "3"), Some(ItemAction::Edit(3)));
        assert_eq!(ItemAction::from_control("delete", " 12 "), Some(ItemAction::Delete(12)));
        assert_eq!(ItemAction::from_control("borrow", "3"), None);
        assert_eq!(ItemAction::from_control("edit", "x"), None);
    }

    #[test]
    fn item_action_exposes_name_and_id() {
        let action = ItemAction::Delete(9);
        assert_eq!(action.name(), "delete");
        assert_eq!(action.id(), 9);
    }

    #[test]
    fn capitalize_first_letter() {
        assert_eq!(capitalize("book"), "Book");
        assert_eq!(capitalize(""), "");
    }
}
