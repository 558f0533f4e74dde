//! The uniform CRUD contract, parameterized by entity kind.
//!
//! Every kind is served under `/api/{segment}`: `GET` lists (with
//! `?filter=&group=&page=&size=`), `POST` creates, and `GET`/`PUT`/`DELETE`
//! on `/{id}` show, update and delete.

use std::marker::PhantomData;

use dpm_core::EntityKind;
use dpm_core::codes;
use dpm_core::group_context::GroupContext;
use dpm_core::models::{
    Application, ApplicationDraft, Group, GroupDraft, Page, SuperUser, SuperUserDraft, Topic,
    TopicDraft, TopicKind, User, UserDraft,
};
use dpm_core::search::Searchable;
use dpm_core::validation::Validate;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::Client;
use crate::error::{ClientError, ClientResult};

/// An entity kind reachable through the CRUD contract.
pub trait Resource {
    const KIND: EntityKind;
    type Entity: DeserializeOwned + Searchable + Send;
    type Draft: Serialize + Validate + Sync;
}

/// Drafts of kinds that can only be created inside a group.
pub trait GroupScoped: Clone {
    fn set_group(&mut self, group: i64);
}

/// Kinds created without a group. Only these get a bare `create`; the
/// group-scoped kinds go through `create_in`.
///
/// ```compile_fail
/// # async fn bare(client: &dpm_api_client::Client) {
/// let draft = dpm_core::models::TopicDraft::named("Test Topic");
/// let _ = client.topics().create(&draft).await;
/// # }
/// ```
pub trait Ungrouped: Resource {}

pub struct Groups;
pub struct Users;
pub struct SuperUsers;
pub struct Topics;
pub struct Applications;

impl Resource for Groups {
    const KIND: EntityKind = EntityKind::Group;
    type Entity = Group;
    type Draft = GroupDraft;
}

impl Resource for Users {
    const KIND: EntityKind = EntityKind::User;
    type Entity = User;
    type Draft = UserDraft;
}

impl Resource for SuperUsers {
    const KIND: EntityKind = EntityKind::SuperUser;
    type Entity = SuperUser;
    type Draft = SuperUserDraft;
}

impl Resource for Topics {
    const KIND: EntityKind = EntityKind::Topic;
    type Entity = Topic;
    type Draft = TopicDraft;
}

impl Resource for Applications {
    const KIND: EntityKind = EntityKind::Application;
    type Entity = Application;
    type Draft = ApplicationDraft;
}

impl Ungrouped for Groups {}
impl Ungrouped for SuperUsers {}

impl GroupScoped for UserDraft {
    fn set_group(&mut self, group: i64) {
        self.group = group;
    }
}

impl GroupScoped for TopicDraft {
    fn set_group(&mut self, group: i64) {
        self.group = group;
    }
}

impl GroupScoped for ApplicationDraft {
    fn set_group(&mut self, group: i64) {
        self.group = group;
    }
}

/// List query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
}

impl ListParams {
    /// A blank filter is the same as no filter.
    pub fn filtered(filter: Option<&str>) -> Self {
        Self {
            filter: filter
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string),
            ..Self::default()
        }
    }
}

pub struct EntityClient<'a, R: Resource> {
    client: &'a Client,
    _kind: PhantomData<R>,
}

impl<'a, R: Resource> EntityClient<'a, R> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn collection(&self) -> String {
        format!("/api/{}", R::KIND.path_segment())
    }

    fn member(&self, id: i64) -> String {
        format!("/api/{}/{id}", R::KIND.path_segment())
    }

    /// Entities whose display name contains `filter`, ignoring case, in
    /// backend order. `None` or blank returns everything visible.
    pub async fn list(&self, filter: Option<&str>) -> ClientResult<Vec<R::Entity>> {
        self.list_all(ListParams::filtered(filter)).await
    }

    /// Follow the pages until `total_size` rows are in hand.
    async fn list_all(&self, mut params: ListParams) -> ClientResult<Vec<R::Entity>> {
        let mut rows = Vec::new();
        let mut page_number = 0;
        loop {
            params.page = Some(page_number);
            let page = self.list_page(&params).await?;
            let total = page.total_size;
            if page.is_empty() {
                break;
            }
            rows.extend(page.content);
            if rows.len() >= total {
                break;
            }
            page_number += 1;
        }
        Ok(rows)
    }

    pub async fn list_page(&self, params: &ListParams) -> ClientResult<Page<R::Entity>> {
        let rb = self
            .client
            .request(Method::GET, &self.collection())
            .await?
            .query(params);
        self.client.send_json(rb).await
    }

    pub async fn show(&self, id: i64) -> ClientResult<R::Entity> {
        let rb = self.client.request(Method::GET, &self.member(id)).await?;
        self.client.send_json(rb).await
    }

    /// Drafts are checked locally first; nothing is sent when a rule fails.
    async fn send_create(&self, draft: &R::Draft) -> ClientResult<R::Entity> {
        draft.validate()?;
        let rb = self
            .client
            .request(Method::POST, &self.collection())
            .await?
            .json(draft);
        let entity = self.client.send_json(rb).await?;
        info!(kind = %R::KIND, "created");
        Ok(entity)
    }

    pub async fn update(&self, id: i64, draft: &R::Draft) -> ClientResult<R::Entity> {
        draft.validate()?;
        let rb = self
            .client
            .request(Method::PUT, &self.member(id))
            .await?
            .json(draft);
        let entity = self.client.send_json(rb).await?;
        info!(kind = %R::KIND, id, "updated");
        Ok(entity)
    }

    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        let rb = self.client.request(Method::DELETE, &self.member(id)).await?;
        self.client.send_empty(rb).await?;
        info!(kind = %R::KIND, id, "deleted");
        Ok(())
    }
}

impl<R> EntityClient<'_, R>
where
    R: Resource,
    R::Draft: GroupScoped,
{
    /// Create inside the selected group. Refused locally unless the context
    /// is `Selected`.
    pub async fn create_in(
        &self,
        context: &GroupContext,
        draft: &R::Draft,
    ) -> ClientResult<R::Entity> {
        let group = context.selected().ok_or_else(|| {
            ClientError::Validation(vec![codes::GROUP_CONTEXT_REQUIRED.to_string()])
        })?;
        let mut draft = draft.clone();
        draft.set_group(group.id);
        self.send_create(&draft).await
    }

    /// Entities of one group.
    pub async fn list_in(&self, group: i64, filter: Option<&str>) -> ClientResult<Vec<R::Entity>> {
        self.list_all(ListParams {
            group: Some(group),
            ..ListParams::filtered(filter)
        })
        .await
    }
}

impl<R: Ungrouped> EntityClient<'_, R> {
    pub async fn create(&self, draft: &R::Draft) -> ClientResult<R::Entity> {
        self.send_create(draft).await
    }
}

impl EntityClient<'_, Topics> {
    /// `GET /api/topics/kinds`
    pub async fn kinds(&self) -> ClientResult<Vec<TopicKind>> {
        let rb = self.client.request(Method::GET, "/api/topics/kinds").await?;
        self.client.send_json(rb).await
    }
}

impl EntityClient<'_, Applications> {
    /// Issue a new bind token. Each call rotates it; the previous token is no
    /// longer accepted.
    pub async fn generate_bind_token(&self, id: i64) -> ClientResult<String> {
        let path = format!("{}/bind-token", self.member(id));
        let rb = self.client.request(Method::POST, &path).await?;
        let token = self.client.send_text(rb).await?;
        info!(id, "bind token generated");
        Ok(token)
    }

    /// Issue a new application password. Each call rotates it.
    pub async fn generate_password(&self, id: i64) -> ClientResult<String> {
        let path = format!("{}/password", self.member(id));
        let rb = self.client.request(Method::POST, &path).await?;
        let password = self.client.send_text(rb).await?;
        info!(id, "application password generated");
        Ok(password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_filter_is_dropped() {
        assert_eq!(ListParams::filtered(Some("  ")), ListParams::default());
        assert_eq!(
            ListParams::filtered(Some(" two ")).filter.as_deref(),
            Some("two")
        );
    }

    #[test]
    fn group_scoped_drafts_take_the_group() {
        let mut draft = TopicDraft::named("Test Topic");
        draft.set_group(7);
        assert_eq!(draft.group, 7);
    }
}
