use thiserror::Error;

use crate::core::models::User;

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Invalid directory configuration: {0}")]
    Config(String),

    #[error("Failed to authenticate with the identity platform: {0}")]
    Auth(String),

    #[error("Directory returned no registered domains")]
    NoDomains,

    #[error("Graph API error ({code}): {message}")]
    Api {
        status: Option<u16>,
        code: String,
        message: String,
    },

    #[error("Failed to send HTTP request: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode Graph response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid Graph endpoint: {0}")]
    Url(#[from] url::ParseError),

    /// A fault raised while operating on a specific user.
    #[error("{message}")]
    User {
        message: String,
        user: Option<Box<User>>,
        #[source]
        source: Box<GraphError>,
    },

    /// A fault raised while operating on a specific group.
    #[error("{message}")]
    Group {
        message: String,
        group_name: String,
        #[source]
        source: Box<GraphError>,
    },
}

impl GraphError {
    /// Wraps a remote fault with the user that was being operated on.
    pub fn for_user(message: impl Into<String>, user: Option<&User>, source: GraphError) -> Self {
        GraphError::User {
            message: message.into(),
            user: user.cloned().map(Box::new),
            source: Box::new(source),
        }
    }

    pub fn for_group(
        message: impl Into<String>,
        group_name: impl Into<String>,
        source: GraphError,
    ) -> Self {
        GraphError::Group {
            message: message.into(),
            group_name: group_name.into(),
            source: Box::new(source),
        }
    }

    /// HTTP status of the underlying remote fault, looking through entity wrappers.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GraphError::Api { status, .. } => *status,
            GraphError::Http(e) => e.status().map(|s| s.as_u16()),
            GraphError::User { source, .. } | GraphError::Group { source, .. } => {
                source.status_code()
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// The user attached to a user-operation fault, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            GraphError::User { user, .. } => user.as_deref(),
            _ => None,
        }
    }
}
