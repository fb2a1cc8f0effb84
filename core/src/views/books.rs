use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::session::Session;
use crate::types::{Book, BookUpdate, NewBook};

use super::{BookList, Resource};

impl Resource for Book {
    type Create = NewBook;
    type Update = BookUpdate;

    const COLLECTION: &'static str = "books";
    const NOUN: &'static str = "book";
    const ITEM_CLASS: &'static str = "book-item";

    fn id(&self) -> i64 {
        self.id
    }

    fn display_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Title", self.title.clone()),
            ("Author", self.author.clone()),
            ("Status", self.status.to_string()),
        ]
    }

    fn build_list(client: &ApiClient) -> Result<HttpRequest, ApiError> {
        client.build_list_books()
    }

    fn build_create(client: &ApiClient, input: &NewBook) -> Result<HttpRequest, ApiError> {
        client.build_create_book(input)
    }

    fn build_update(client: &ApiClient, id: i64, input: &BookUpdate) -> Result<HttpRequest, ApiError> {
        client.build_update_book(id, input)
    }

    fn build_delete(client: &ApiClient, id: i64) -> Result<HttpRequest, ApiError> {
        client.build_delete_book(id)
    }
}

impl BookList {
    /// Render only the books nobody has borrowed.
    pub async fn fetch_available<T: Transport>(
        &self,
        session: &mut Session<T>,
    ) -> Result<Vec<Book>, ApiError> {
        let request = session.client().build_list_available_books();
        self.load(session, request, "Failed to load available books")
            .await
    }

    /// Borrow a book as the logged-in member, then refresh.
    pub async fn borrow<T: Transport>(&self, session: &mut Session<T>, id: i64) -> Result<Book, ApiError> {
        let request = session.client().build_borrow_book(id);
        self.mutate(session, request, "borrow", "borrowed").await
    }

    /// Give back a book the logged-in member holds, then refresh.
    pub async fn return_book<T: Transport>(
        &self,
        session: &mut Session<T>,
        id: i64,
    ) -> Result<Book, ApiError> {
        let request = session.client().build_return_book(id);
        self.mutate(session, request, "return", "returned").await
    }
}
