//! Browser host: `localStorage` token store, `window.alert` presenter,
//! `innerHTML` list rendering, and the entry points the page calls.
//!
//! Only built for `wasm32` with the `web` feature. Every DOM call can fail
//! (no window, storage disabled, missing element); failures are logged and
//! otherwise ignored, which leaves the page as it was.
//!
//! On start the module loads the dashboard or the login form and installs
//! one click listener per list container. Clicks on a rendered control are
//! turned back into an `ItemAction` from its `data-action` / `data-id`
//! attributes. The page's forms call the exported `login`, `signup`,
//! `logout`, `add_book` and `add_member`.

use std::rc::Rc;

use tokio::sync::Mutex;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, Event, HtmlElement, Storage};

use crate::app::LibraryApp;
use crate::client::{ApiClient, DEFAULT_BASE_URL};
use crate::http::ReqwestTransport;
use crate::render::render_items;
use crate::session::{Presenter, Session, View};
use crate::token::{TokenStore, TOKEN_STORAGE_KEY};
use crate::types::{BookUpdate, MemberUpdate, NewBook, NewMember, Role};
use crate::views::{BookList, ItemAction, ListRenderer, MemberList, Resource};

/// Element ids the page provides.
pub const LOGIN_FORM_ID: &str = "login-form";
pub const DASHBOARD_ID: &str = "dashboard";
pub const BOOKS_CONTAINER_ID: &str = "books-container";
pub const MEMBERS_CONTAINER_ID: &str = "members-container";

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn local_storage() -> Option<Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

/// Token store backed by the origin's `localStorage`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorageTokenStore;

impl TokenStore for LocalStorageTokenStore {
    fn get(&self) -> Option<String> {
        local_storage()?.get_item(TOKEN_STORAGE_KEY).ok().flatten()
    }

    fn set(&self, token: &str) {
        match local_storage() {
            Some(storage) => {
                if storage.set_item(TOKEN_STORAGE_KEY, token).is_err() {
                    tracing::warn!("localStorage rejected the token");
                }
            }
            None => tracing::warn!("localStorage is unavailable"),
        }
    }

    fn clear(&self) {
        match local_storage() {
            Some(storage) => {
                if storage.remove_item(TOKEN_STORAGE_KEY).is_err() {
                    tracing::warn!("localStorage refused to remove the token");
                }
            }
            None => tracing::warn!("localStorage is unavailable"),
        }
    }
}

/// Presenter that alerts through `window.alert` and swaps the `display`
/// style of `#login-form` and `#dashboard`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DomPresenter;

fn set_display(id: &str, display: &str) {
    let element = document()
        .and_then(|document| document.get_element_by_id(id))
        .and_then(|element| element.dyn_into::<HtmlElement>().ok());
    match element {
        Some(element) => {
            if element.style().set_property("display", display).is_err() {
                tracing::warn!(id, "failed to set display");
            }
        }
        None => tracing::warn!(id, "view element not found"),
    }
}

impl Presenter for DomPresenter {
    fn alert(&self, message: &str) {
        match web_sys::window() {
            Some(window) => {
                if window.alert_with_message(message).is_err() {
                    tracing::warn!(text = message, "alert failed");
                }
            }
            None => tracing::warn!(text = message, "no window to alert in"),
        }
    }

    fn show(&self, view: View) {
        let (login, dashboard) = match view {
            View::Login => ("block", "none"),
            View::Dashboard => ("none", "block"),
        };
        set_display(LOGIN_FORM_ID, login);
        set_display(DASHBOARD_ID, dashboard);
    }
}

/// Renders a list into the element with the given id, e.g.
/// `books-container`.
#[derive(Clone, Debug)]
pub struct DomListRenderer {
    container_id: String,
}

impl DomListRenderer {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
        }
    }
}

impl<E: Resource> ListRenderer<E> for DomListRenderer {
    fn render_list(&self, items: &[E]) {
        match document().and_then(|document| document.get_element_by_id(&self.container_id)) {
            Some(container) => container.set_inner_html(&render_items(items)),
            None => tracing::warn!(id = %self.container_id, "list container not found"),
        }
    }
}

// --- page wiring ---

type WebApp = LibraryApp<ReqwestTransport>;

thread_local! {
    // Handlers may fire while a request is in flight; the lock queues them.
    static APP: Rc<Mutex<WebApp>> = Rc::new(Mutex::new(build_app()));
}

fn build_app() -> WebApp {
    let client = ApiClient::new(DEFAULT_BASE_URL, LocalStorageTokenStore);
    let session = Session::new(client, ReqwestTransport::new(), DomPresenter);
    LibraryApp::new(
        session,
        BookList::new(DomListRenderer::new(BOOKS_CONTAINER_ID)),
        MemberList::new(DomListRenderer::new(MEMBERS_CONTAINER_ID)),
    )
}

fn app() -> Rc<Mutex<WebApp>> {
    APP.with(Rc::clone)
}

/// Page load: show the dashboard or the login form and bind item controls.
#[wasm_bindgen(start)]
pub fn start() {
    bind_controls(BOOKS_CONTAINER_ID, dispatch_book);
    bind_controls(MEMBERS_CONTAINER_ID, dispatch_member);
    let app = app();
    spawn_local(async move {
        app.lock().await.load().await;
    });
}

// API failures are alerted by the session and views, so the exported
// actions drop their results.

#[wasm_bindgen]
pub fn login(username: String, password: String) {
    let app = app();
    spawn_local(async move {
        let _ = app.lock().await.login(&username, &password).await;
    });
}

#[wasm_bindgen]
pub fn signup(username: String, password: String, role: String) {
    let app = app();
    spawn_local(async move {
        let mut app = app.lock().await;
        match role.parse::<Role>() {
            Ok(role) => {
                let _ = app.signup(&username, &password, role).await;
            }
            Err(e) => app.session.alert(&format!("Signup failed: {e}")),
        }
    });
}

#[wasm_bindgen]
pub fn logout() {
    let app = app();
    spawn_local(async move {
        app.lock().await.logout();
    });
}

#[wasm_bindgen]
pub fn add_book(title: String, author: String) {
    let app = app();
    spawn_local(async move {
        let mut guard = app.lock().await;
        let app = &mut *guard;
        let _ = app.books.add(&mut app.session, &NewBook { title, author }).await;
    });
}

#[wasm_bindgen]
pub fn add_member(username: String, password: String, role: String) {
    let app = app();
    spawn_local(async move {
        let mut guard = app.lock().await;
        let app = &mut *guard;
        match role.parse::<Role>() {
            Ok(role) => {
                let input = NewMember {
                    username,
                    password,
                    role,
                };
                let _ = app.members.add(&mut app.session, &input).await;
            }
            Err(e) => app.session.alert(&format!("Failed to add member: {e}")),
        }
    });
}

/// Install one delegated click listener on a list container.
fn bind_controls(container_id: &'static str, dispatch: fn(ItemAction)) {
    let Some(container) = document().and_then(|document| document.get_element_by_id(container_id))
    else {
        tracing::warn!(id = container_id, "list container not found");
        return;
    };
    let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        if let Some(action) = clicked_action(&event) {
            dispatch(action);
        }
    });
    if container
        .add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())
        .is_err()
    {
        tracing::warn!(id = container_id, "failed to bind item controls");
    }
    // lives as long as the page
    handler.forget();
}

fn clicked_action(event: &Event) -> Option<ItemAction> {
    let target = event.target()?.dyn_into::<Element>().ok()?;
    let control = target.closest("[data-action]").ok().flatten()?;
    let action = control.get_attribute("data-action")?;
    let id = control.get_attribute("data-id")?;
    ItemAction::from_control(&action, &id)
}

/// Ask for one field. `None` when the user cancels.
fn ask(message: &str) -> Option<String> {
    web_sys::window()?.prompt_with_message(message).ok().flatten()
}

fn book_form() -> Option<BookUpdate> {
    let title = ask("Enter new title:")?;
    let author = ask("Enter new author:")?;
    let status = ask("Enter new status (AVAILABLE or BORROWED):")?;
    Some(BookUpdate::from_answers(title, author, &status))
}

fn member_form() -> Option<MemberUpdate> {
    Some(MemberUpdate {
        username: ask("Enter new username:")?,
        password: ask("Enter new password:")?,
        role: None,
    })
}

fn dispatch_book(action: ItemAction) {
    // prompt before queueing behind the lock
    let form = match action {
        ItemAction::Edit(_) => match book_form() {
            Some(form) => Some(form),
            None => return,
        },
        ItemAction::Delete(_) => None,
    };
    let app = app();
    spawn_local(async move {
        let mut guard = app.lock().await;
        let app = &mut *guard;
        let _ = match (action, form) {
            (ItemAction::Edit(id), Some(form)) => {
                app.books.edit(&mut app.session, id, &form).await.map(drop)
            }
            (ItemAction::Delete(id), _) => app.books.delete(&mut app.session, id).await,
            (ItemAction::Edit(_), None) => Ok(()),
        };
    });
}

fn dispatch_member(action: ItemAction) {
    let form = match action {
        ItemAction::Edit(_) => match member_form() {
            Some(form) => Some(form),
            None => return,
        },
        ItemAction::Delete(_) => None,
    };
    let app = app();
    spawn_local(async move {
        let mut guard = app.lock().await;
        let app = &mut *guard;
        let _ = match (action, form) {
            (ItemAction::Edit(id), Some(form)) => {
                app.members.edit(&mut app.session, id, &form).await.map(drop)
            }
            (ItemAction::Delete(id), _) => app.members.delete(&mut app.session, id).await,
            (ItemAction::Edit(_), None) => Ok(()),
        };
    });
}
