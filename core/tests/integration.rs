//! Full client lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `LibraryApp` over
//! real HTTP with `ReqwestTransport`. Lists are rendered with
//! `HtmlListRenderer`, so the assertions read the same markup a browser host
//! would put into the page.

use std::sync::{Arc, Mutex};

use library_client::{
    ApiClient, ApiError, BookList, BookStatus, BookUpdate, HtmlListRenderer, ItemAction,
    LibraryApp, MemberList, MemberUpdate, MemoryTokenStore, NewBook, NewMember, Presenter,
    ReqwestTransport, Role, Session, View,
};

#[derive(Clone, Default)]
struct Alerts(Arc<Mutex<Vec<String>>>);

impl Alerts {
    fn last(&self) -> String {
        self.0.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

impl Presenter for Alerts {
    fn alert(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }

    fn show(&self, _view: View) {}
}

async fn start_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(library_mock::run(listener));
    format!("http://{addr}")
}

struct Client {
    app: LibraryApp<ReqwestTransport>,
    alerts: Alerts,
    books: HtmlListRenderer,
    members: HtmlListRenderer,
}

fn client(base_url: &str) -> Client {
    let alerts = Alerts::default();
    let books = HtmlListRenderer::new();
    let members = HtmlListRenderer::new();
    let session = Session::new(
        ApiClient::new(base_url, MemoryTokenStore::new()),
        ReqwestTransport::new(),
        alerts.clone(),
    );
    Client {
        app: LibraryApp::new(session, BookList::new(books.clone()), MemberList::new(members.clone())),
        alerts,
        books,
        members,
    }
}

#[tokio::test]
async fn librarian_lifecycle() {
    let base_url = start_server().await;
    let mut c = client(&base_url);

    // Step 1: sign up and log in.
    c.app.signup("alice", "pw1", Role::Librarian).await.unwrap();
    assert_eq!(c.app.session.view(), View::Login);
    c.app.login("alice", "pw1").await.unwrap();
    assert_eq!(c.app.session.view(), View::Dashboard);
    assert!(c.books.html().is_empty(), "expected no books yet");

    // Step 2: add a book; the list is re-rendered from the server.
    let input = NewBook {
        title: "1984".to_string(),
        author: "Orwell".to_string(),
    };
    let book = c.app.books.add(&mut c.app.session, &input).await.unwrap();
    assert_eq!(book.status, BookStatus::Available);
    let html = c.books.html();
    assert!(html.contains("<strong>Title:</strong> 1984"));
    assert!(html.contains(&format!(r#"data-action="edit" data-id="{}""#, book.id)));
    assert_eq!(ItemAction::from_control("edit", &book.id.to_string()), Some(ItemAction::Edit(book.id)));

    // Step 3: edit with a full form.
    let form = BookUpdate {
        title: "Animal Farm".to_string(),
        author: "Orwell".to_string(),
        status: Some(BookStatus::Borrowed),
    };
    c.app.books.edit(&mut c.app.session, book.id, &form).await.unwrap();
    let html = c.books.html();
    assert!(html.contains("Animal Farm"));
    assert!(html.contains("BORROWED"));
    assert!(!html.contains("1984"));

    // Step 4: manage a member.
    let member = c
        .app
        .members
        .add(
            &mut c.app.session,
            &NewMember {
                username: "bob".to_string(),
                password: "pw".to_string(),
                role: Role::Member,
            },
        )
        .await
        .unwrap();
    assert!(c.members.html().contains("<strong>Username:</strong> bob"));

    let form = MemberUpdate {
        username: "robert".to_string(),
        password: "pw2".to_string(),
        role: None,
    };
    c.app.members.edit(&mut c.app.session, member.id, &form).await.unwrap();
    assert!(c.members.html().contains("robert"));

    c.app.members.delete(&mut c.app.session, member.id).await.unwrap();
    assert!(c.members.html().is_empty());
    let deleted = c.app.members.fetch_deleted(&mut c.app.session).await.unwrap();
    assert_eq!(deleted.len(), 1);
    assert!(!deleted[0].is_active);

    // Step 5: delete the book, then delete it again.
    c.app.books.delete(&mut c.app.session, book.id).await.unwrap();
    assert!(c.books.html().is_empty());
    let err = c.app.books.delete(&mut c.app.session, book.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Api { status: 404, .. }));
    assert_eq!(c.alerts.last(), "Failed to delete book: Book not found");

    // Step 6: log out; authenticated calls now fail locally.
    c.app.logout();
    let err = c.app.books.fetch_all(&mut c.app.session).await.unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationRequired));
}

#[tokio::test]
async fn member_borrows_and_returns() {
    let base_url = start_server().await;

    let mut librarian = client(&base_url);
    librarian.app.signup("alice", "pw", Role::Librarian).await.unwrap();
    librarian.app.login("alice", "pw").await.unwrap();
    let input = NewBook {
        title: "Dune".to_string(),
        author: "Herbert".to_string(),
    };
    let book = librarian
        .app
        .books
        .add(&mut librarian.app.session, &input)
        .await
        .unwrap();

    let mut member = client(&base_url);
    member.app.signup("bob", "pw", Role::Member).await.unwrap();
    member.app.login("bob", "pw").await.unwrap();
    // members may not list members
    assert_eq!(member.alerts.last(), "Failed to load members: Not enough permissions");

    let available = member.app.books.fetch_available(&mut member.app.session).await.unwrap();
    assert_eq!(available.len(), 1);

    let borrowed = member.app.books.borrow(&mut member.app.session, book.id).await.unwrap();
    assert_eq!(borrowed.status, BookStatus::Borrowed);
    assert!(member.books.html().contains("BORROWED"));

    let err = member
        .app
        .books
        .borrow(&mut member.app.session, book.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Book not available for borrowing");

    member.app.books.return_book(&mut member.app.session, book.id).await.unwrap();
    assert!(member.books.html().contains("AVAILABLE"));

    let mine = member.app.members.my_history(&mut member.app.session).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert!(mine[0].return_date.is_some());

    let all = librarian.app.members.history(&mut librarian.app.session).await.unwrap();
    assert_eq!(all, mine);

    member
        .app
        .members
        .delete_own_account(&mut member.app.session)
        .await
        .unwrap();
    assert!(!member.app.session.is_authenticated());
    // the account is inactive, so logging in again works but requests fail
    member.app.login("bob", "pw").await.unwrap();
    assert_eq!(member.alerts.last(), "Failed to load members: Inactive user");
}
