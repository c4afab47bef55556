//! User operations.
//!
//! Mutations (create, update, add-to-group) run under the configured retry
//! budget. Reads are sent once and fail immediately.
//!
//! Nothing here guards against duplicates: two callers may both see
//! [`UserRepo::exists`] return `false` and both call [`UserRepo::add_user`]
//! for the same principal name. The directory rejects the second create.

use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use urlencoding::encode;

use super::base::DirectoryContext;
use crate::core::config::GraphConfig;
use crate::core::models::{DirectoryObject, Group, User};
use crate::core::pagination::ODataPage;
use crate::errors::{GraphError, GraphResult};

/// Quotes a value as an OData string literal.
pub(crate) fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn upn_filter(upn: &str) -> String {
    format!("userPrincipalName eq {}", odata_literal(upn))
}

fn other_mails_filter(email: &str) -> String {
    format!("otherMails/any(m:m eq {})", odata_literal(email))
}

#[derive(Debug, Clone)]
pub struct UserRepo {
    ctx: Arc<DirectoryContext>,
}

impl UserRepo {
    /// Connects to the directory described by `config`.
    ///
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

    #[must_use]
    pub fn context(&self) -> &Arc<DirectoryContext> {
        &self.ctx
    }

    /// Creates `user`. The directory requires `display_name`,
    /// `password_profile`, `account_enabled`, `mail_nickname` and
    /// `user_principal_name`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::User` carrying `user` once the retry budget is spent.
    #[instrument(skip(self, user), fields(upn = %user.label()))]
    pub async fn add_user(&self, user: &User) -> GraphResult<User> {
        let client = self.ctx.client();
        let url = client.url("users");

        let created: User = self
            .ctx
            .retry("Create user", || client.post(&url, user))
            .await
            .map_err(|e| {
                GraphError::for_user(format!("Failed to add user {}", user.label()), Some(user), e)
            })?;

        info!(id = ?created.id, "User created");
        Ok(created)
    }

    /// Creates a disabled local account named `first.last@<default domain>`
    /// whose password never expires.
    ///
    /// # Errors
    ///
    /// Same as [`UserRepo::add_user`].
    pub async fn add_user_with_name(
        &self,
        first_name: &str,
        last_name: &str,
        display_name: &str,
        password: &str,
    ) -> GraphResult<User> {
        let user = User::local_account(
            first_name,
            last_name,
            display_name,
            password,
            &self.ctx.default_domain().id,
        );
        self.add_user(&user).await
    }

    /// # Errors
    ///
    /// Returns the remote fault if the lookup fails.
    #[instrument(skip(self))]
    pub async fn exists(&self, upn: &str) -> GraphResult<bool> {
        Ok(!self.filter_users(&upn_filter(upn)).await?.is_empty())
    }

    /// First user listing `email` among their other (secondary) emails.
    ///
    /// # Errors
    ///
    /// Returns the remote fault if the lookup fails.
    #[instrument(skip(self))]
    pub async fn find_user_by_other_mails(&self, email: &str) -> GraphResult<Option<User>> {
        Ok(self
            .filter_users(&other_mails_filter(email))
            .await?
            .into_iter()
            .next())
    }

    /// # Errors
    ///
    /// An unknown id surfaces as `GraphError::Api` with status 404.
    #[instrument(skip(self))]
    pub async fn get_user(&self, user_id: &str) -> GraphResult<User> {
        let client = self.ctx.client();
        client
            .get(&client.url(&format!("users/{}", encode(user_id))))
            .await
    }

    /// # Errors
    ///
    /// Returns the remote fault if the lookup fails.
    #[instrument(skip(self))]
    pub async fn get_user_by_upn(&self, upn: &str) -> GraphResult<Option<User>> {
        Ok(self.filter_users(&upn_filter(upn)).await?.into_iter().next())
    }

    /// Sends the fields set on `user` as a partial update of the user with
    /// `user.id`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::User` if `user.id` is missing or the update still
    /// fails after the retry budget.
    #[instrument(skip(self, user), fields(id = ?user.id))]
    pub async fn update_user(&self, user: &User) -> GraphResult<()> {
        let Some(id) = user.id.as_deref() else {
            return Err(GraphError::for_user(
                "Cannot update a user without an id",
                Some(user),
                GraphError::Config("user id is required".into()),
            ));
        };

        let client = self.ctx.client();
        let url = client.url(&format!("users/{}", encode(id)));
        let changes = User {
            id: None,
            ..user.clone()
        };

        self.ctx
            .retry("Update user", || client.patch(&url, &changes))
            .await
            .map_err(|e| {
                GraphError::for_user(format!("Failed to update user {}", user.label()), Some(user), e)
            })?;

        info!("User updated");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the remote fault if the delete fails.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, user_id: &str) -> GraphResult<()> {
        let client = self.ctx.client();
        client
            .delete(&client.url(&format!("users/{}", encode(user_id))))
            .await?;
        info!("User deleted");
        Ok(())
    }

    /// Whether the user is a direct member of the group. A 404 from the
    /// directory means "not a member".
    ///
    /// # Errors
    ///
    /// Returns any remote fault other than not-found.
    #[instrument(skip(self))]
    pub async fn member_of(&self, user_id: &str, group_id: &str) -> GraphResult<bool> {
        let client = self.ctx.client();
        let url = client.url(&format!(
            "users/{}/memberOf/{}",
            encode(user_id),
            encode(group_id)
        ));

        match client.get::<DirectoryObject>(&url).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Every directory object the user is a direct member of: groups,
    /// directory roles and administrative units.
    ///
    /// # Errors
    ///
    /// Returns the first remote fault while paging.
    #[instrument(skip(self))]
    pub async fn member_of_all(&self, user_id: &str) -> GraphResult<Vec<DirectoryObject>> {
        self.ctx
            .list_all(&format!("users/{}/memberOf", encode(user_id)))
            .await
    }

    /// # Errors
    ///
    /// Returns `GraphError::User` once the retry budget is spent.
    #[instrument(skip(self))]
    pub async fn add_to_group(&self, user_id: &str, group_id: &str) -> GraphResult<()> {
        let client = self.ctx.client();
        let url = client.url(&format!("groups/{}/members/$ref", encode(group_id)));
        let reference = json!({
            "@odata.id": client.url(&format!("directoryObjects/{}", encode(user_id)))
        });

        self.ctx
            .retry("Add user to group", || {
                client.post_no_content(&url, &reference)
            })
            .await
            .map_err(|e| {
                let user = User {
                    id: Some(user_id.to_string()),
                    ..User::default()
                };
                GraphError::for_user(
                    format!("Failed to add user {user_id} to group {group_id}"),
                    Some(&user),
                    e,
                )
            })?;

        info!("User added to group");
        Ok(())
    }

    /// The groups the user belongs to, leaving out directory roles and other
    /// non-group memberships. A membership that cannot be resolved to a group
    /// is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns the remote fault only if listing the memberships fails.
    #[instrument(skip(self))]
    pub async fn get_member_group_list(&self, user_id: &str) -> GraphResult<Vec<Group>> {
        let client = self.ctx.client();
        let memberships = self.member_of_all(user_id).await?;
        let mut groups = Vec::with_capacity(memberships.len());

        for membership in memberships {
            if membership.odata_type.is_some() && !membership.is_group() {
                debug!(
                    "Skipping {} membership {}",
                    membership.odata_type.as_deref().unwrap_or_default(),
                    membership.id
                );
                continue;
            }

            let url = client.url(&format!("groups/{}", encode(&membership.id)));
            match client.get::<Group>(&url).await {
                Ok(group) => groups.push(group),
                Err(e) => warn!("Skipping membership {}: {}", membership.id, e),
            }
        }

        Ok(groups)
    }

    /// # Errors
    ///
    /// Returns the first remote fault while paging.
    #[instrument(skip(self))]
    pub async fn get_all_users(&self) -> GraphResult<Vec<User>> {
        self.ctx.list_all("users").await
    }

    /// First page of users matching an OData filter.
    async fn filter_users(&self, filter: &str) -> GraphResult<Vec<User>> {
        let client = self.ctx.client();
        let url = client.url(&format!("users?$filter={}", encode(filter)));
        let page: ODataPage<User> = client.get(&url).await?;
        Ok(page.value)
    }
}
