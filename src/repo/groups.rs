//! Group operations. Group mutations are sent once, without the retry budget
//! the user repository applies.

use std::sync::Arc;
use tracing::{info, instrument};
use urlencoding::encode;

use super::base::DirectoryContext;
use crate::core::config::GraphConfig;
use crate::core::models::Group;
use crate::errors::{GraphError, GraphResult};

#[derive(Debug, Clone)]
pub struct GroupsRepo {
    ctx: Arc<DirectoryContext>,
}

impl GroupsRepo {
    /// # Errors
    ///
    /// See [`DirectoryContext::connect`].
    pub async fn new(config: GraphConfig) -> GraphResult<Self> {
        Ok(Self::from_context(Arc::new(
            DirectoryContext::connect(config).await?,
        )))
    }

    #[must_use]
    pub fn from_context(ctx: Arc<DirectoryContext>) -> Self {
        Self { ctx }
    }

    /// Creates a security-enabled, mail-disabled group whose mail nickname is `name`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::Group` naming the group.
    pub async fn create_group(&self, name: &str) -> GraphResult<Group> {
        self.create(Group::security(name, None)).await
    }

    /// Same as [`GroupsRepo::create_group`] with a description.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::Group` naming the group.
    pub async fn create_group_with_description(
        &self,
        name: &str,
        description: &str,
    ) -> GraphResult<Group> {
        self.create(Group::security(name, Some(description))).await
    }

    #[instrument(skip(self, group), fields(name = ?group.display_name))]
    async fn create(&self, group: Group) -> GraphResult<Group> {
        let client = self.ctx.client();
        let created: Group = client
            .post(&client.url("groups"), &group)
            .await
            .map_err(|e| {
                let name = group.display_name.clone().unwrap_or_default();
                GraphError::for_group(format!("Failed to create group {name}"), name, e)
            })?;

        info!(id = ?created.id, "Group created");
        Ok(created)
    }

    /// # Errors
    ///
    /// An unknown id surfaces as `GraphError::Api` with status 404.
    #[instrument(skip(self))]
    pub async fn get_group(&self, group_id: &str) -> GraphResult<Group> {
        let client = self.ctx.client();
        client
            .get(&client.url(&format!("groups/{}", encode(group_id))))
            .await
    }

    /// # Errors
    ///
    /// Returns the remote fault if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_group(&self, group_id: &str) -> GraphResult<()> {
        let client = self.ctx.client();
        client
            .delete(&client.url(&format!("groups/{}", encode(group_id))))
            .await?;
        info!("Group deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the first remote fault while paging.
    #[instrument(skip(self))]
    pub async fn get_all_groups(&self) -> GraphResult<Vec<Group>> {
        self.ctx.list_all("groups").await
    }
}
