//! Application-to-topic permissions.

use dpm_core::models::auth::BIND_TOKEN_HEADER;
use dpm_core::models::{AccessPermissionBody, ApplicationPermission, Page};
use reqwest::Method;
use tracing::info;

use crate::Client;
use crate::error::ClientResult;

pub struct PermissionsClient<'a> {
    client: &'a Client,
}

impl<'a> PermissionsClient<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// `GET /api/application_permissions/topic/{id}`
    pub async fn by_topic(&self, topic: i64) -> ClientResult<Page<ApplicationPermission>> {
        let path = format!("/api/application_permissions/topic/{topic}");
        let rb = self.client.request(Method::GET, &path).await?;
        self.client.send_json(rb).await
    }

    /// `GET /api/application_permissions/application/{id}`
    pub async fn by_application(
        &self,
        application: i64,
    ) -> ClientResult<Page<ApplicationPermission>> {
        let path = format!("/api/application_permissions/application/{application}");
        let rb = self.client.request(Method::GET, &path).await?;
        self.client.send_json(rb).await
    }

    /// Grant the application identified by `bind_token` access to `topic`.
    pub async fn add_application_to_topic(
        &self,
        topic: i64,
        bind_token: &str,
        access: &AccessPermissionBody,
    ) -> ClientResult<ApplicationPermission> {
        let path = format!("/api/application_permissions/{topic}");
        let rb = self
            .client
            .request(Method::POST, &path)
            .await?
            .header(BIND_TOKEN_HEADER, bind_token.trim())
            .json(access);
        let permission: ApplicationPermission = self.client.send_json(rb).await?;
        info!(
            id = permission.id,
            application = permission.application_id,
            topic,
            "application added to topic"
        );
        Ok(permission)
    }

    pub async fn update(
        &self,
        id: i64,
        access: &AccessPermissionBody,
    ) -> ClientResult<ApplicationPermission> {
        let path = format!("/api/application_permissions/{id}");
        let rb = self.client.request(Method::PUT, &path).await?.json(access);
        self.client.send_json(rb).await
    }

    pub async fn remove(&self, id: i64) -> ClientResult<()> {
        let path = format!("/api/application_permissions/{id}");
        let rb = self.client.request(Method::DELETE, &path).await?;
        self.client.send_empty(rb).await
    }
}
