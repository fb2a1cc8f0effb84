use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, Transport};
use crate::session::Session;
use crate::types::{HistoryEntry, Member, MemberUpdate, NewMember};

use super::{MemberList, Resource};

impl Resource for Member {
    type Create = NewMember;
    type Update = MemberUpdate;

    const COLLECTION: &'static str = "members";
    const NOUN: &'static str = "member";
    const ITEM_CLASS: &'static str = "member-item";

    fn id(&self) -> i64 {
        self.id
    }

    fn display_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Username", self.username.clone()),
            ("Role", self.role.to_string()),
        ]
    }

    fn build_list(client: &ApiClient) -> Result<HttpRequest, ApiError> {
        client.build_list_members()
    }

    fn build_create(client: &ApiClient, input: &NewMember) -> Result<HttpRequest, ApiError> {
        client.build_create_member(input)
    }

    fn build_update(client: &ApiClient, id: i64, input: &MemberUpdate) -> Result<HttpRequest, ApiError> {
        client.build_update_member(id, input)
    }

    fn build_delete(client: &ApiClient, id: i64) -> Result<HttpRequest, ApiError> {
        client.build_delete_member(id)
    }
}

impl MemberList {
    /// Render the soft-deleted accounts instead of the active ones.
    pub async fn fetch_deleted<T: Transport>(
        &self,
        session: &mut Session<T>,
    ) -> Result<Vec<Member>, ApiError> {
        let request = session.client().build_list_deleted_members();
        self.load(session, request, "Failed to load deleted members")
            .await
    }

    /// Borrow history of every member.
    pub async fn history<T: Transport>(
        &self,
        session: &mut Session<T>,
    ) -> Result<Vec<HistoryEntry>, ApiError> {
        let request = session.client().build_members_history();
        fetch_history(session, request).await
    }

    /// Borrow history of the logged-in member.
    pub async fn my_history<T: Transport>(
        &self,
        session: &mut Session<T>,
    ) -> Result<Vec<HistoryEntry>, ApiError> {
        let request = session.client().build_my_history();
        fetch_history(session, request).await
    }

    /// Deactivate the logged-in account and end the session.
    pub async fn delete_own_account<T: Transport>(
        &self,
        session: &mut Session<T>,
    ) -> Result<Member, ApiError> {
        let request = session.client().build_delete_own_account();
        match session.run::<Member>(request).await {
            Ok(account) => {
                session.sign_out("Account deleted successfully!");
                Ok(account)
            }
            Err(e) => {
                session.report("Failed to delete account", &e);
                Err(e)
            }
        }
    }
}

async fn fetch_history<T: Transport>(
    session: &mut Session<T>,
    request: Result<HttpRequest, ApiError>,
) -> Result<Vec<HistoryEntry>, ApiError> {
    let result = session.run(request).await;
    if let Err(e) = &result {
        session.report("Failed to load history", e);
    }
    result
}
