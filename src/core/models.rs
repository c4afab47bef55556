use serde::{Deserialize, Serialize};

/// Password policy that stops a local account's password from expiring.
pub const DISABLE_PASSWORD_EXPIRATION: &str = "DisablePasswordExpiration";

/// OData type tag carried by group entries in directory object listings.
pub const GROUP_ODATA_TYPE: &str = "#microsoft.graph.group";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    pub id: String,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_change_password_next_sign_in: Option<bool>,
}

/// A directory user as represented on the wire.
///
/// Every field is optional so the same type serves as a create body, a
/// partial-update body and a read result. Absent fields are omitted when
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_mails: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_profile: Option<PasswordProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_policies: Option<String>,
}

impl User {
    /// Builds the create body for a local account named `first.last@domain`.
    ///
    /// The account starts disabled and its password never expires. Names are
    /// concatenated as given.
    #[must_use]
    pub fn local_account(
        first_name: &str,
        last_name: &str,
        display_name: &str,
        password: &str,
        domain: &str,
    ) -> Self {
        let nickname = format!("{first_name}.{last_name}");
        Self {
            given_name: Some(first_name.to_string()),
            surname: Some(last_name.to_string()),
            display_name: Some(display_name.to_string()),
            user_principal_name: Some(format!("{nickname}@{domain}")),
            mail_nickname: Some(nickname),
            account_enabled: Some(false),
            password_profile: Some(PasswordProfile {
                password: Some(password.to_string()),
                force_change_password_next_sign_in: None,
            }),
            password_policies: Some(DISABLE_PASSWORD_EXPIRATION.to_string()),
            ..Self::default()
        }
    }

    /// Principal name for diagnostics, falling back to the id.
    #[must_use]
    pub fn label(&self) -> &str {
        self.user_principal_name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("<unnamed>")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mail_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Group {
    /// Security-enabled, mail-disabled group whose nickname is its name.
    #[must_use]
    pub fn security(name: &str, description: Option<&str>) -> Self {
        Self {
            display_name: Some(name.to_string()),
            mail_nickname: Some(name.to_string()),
            mail_enabled: Some(false),
            security_enabled: Some(true),
            description: description.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Entry of a membership listing. May be a group, a directory role or an
/// administrative unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryObject {
    pub id: String,
    #[serde(rename = "@odata.type", default, skip_serializing_if = "Option::is_none")]
    pub odata_type: Option<String>,
}

impl DirectoryObject {
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.odata_type.as_deref() == Some(GROUP_ODATA_TYPE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_local_account_synthesizes_names() {
        let user = User::local_account(
            "fred",
            "flintstone",
            "fred flintstone",
            "my pretty good password!01",
            "contoso.onmicrosoft.com",
        );

        assert_eq!(
            user.user_principal_name.as_deref(),
            Some("fred.flintstone@contoso.onmicrosoft.com")
        );
        assert_eq!(user.mail_nickname.as_deref(), Some("fred.flintstone"));
        assert_eq!(user.account_enabled, Some(false));
        assert_eq!(
            user.password_policies.as_deref(),
            Some(DISABLE_PASSWORD_EXPIRATION)
        );
        assert!(user.id.is_none());
    }

    #[test]
    fn test_local_account_does_not_normalize() {
        let user = User::local_account("Fred ", "O'Neil", "x", "pw", "Contoso.com");
        assert_eq!(
            user.user_principal_name.as_deref(),
            Some("Fred .O'Neil@Contoso.com")
        );
    }

    #[test]
    fn test_user_serializes_camel_case_without_absent_fields() {
        let user = User {
            id: Some("u-1".to_string()),
            display_name: Some("Wilma".to_string()),
            ..User::default()
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value, json!({"id": "u-1", "displayName": "Wilma"}));
    }

    #[test]
    fn test_user_deserializes_graph_payload() {
        let value = json!({
            "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users/$entity",
            "id": "87d349ed-44d7-43e1-9a83-5f2406dee5bd",
            "displayName": "Barney Rubble",
            "userPrincipalName": "barney.rubble@contoso.onmicrosoft.com",
            "otherMails": ["barney@example.com"],
            "accountEnabled": true,
            "businessPhones": []
        });

        let user: User = serde_json::from_value(value).unwrap();
        assert_eq!(user.id.as_deref(), Some("87d349ed-44d7-43e1-9a83-5f2406dee5bd"));
        assert_eq!(user.other_mails, Some(vec!["barney@example.com".to_string()]));
        assert_eq!(user.account_enabled, Some(true));
        assert_eq!(user.label(), "barney.rubble@contoso.onmicrosoft.com");
    }

    #[test]
    fn test_security_group_body() {
        let group = Group::security("test", Some("integration group"));
        let value = serde_json::to_value(&group).unwrap();
        assert_eq!(
            value,
            json!({
                "displayName": "test",
                "mailNickname": "test",
                "mailEnabled": false,
                "securityEnabled": true,
                "description": "integration group"
            })
        );
    }

    #[test]
    fn test_directory_object_type() {
        let group: DirectoryObject = serde_json::from_value(json!({
            "@odata.type": "#microsoft.graph.group",
            "id": "g-1"
        }))
        .unwrap();
        let role: DirectoryObject = serde_json::from_value(json!({
            "@odata.type": "#microsoft.graph.directoryRole",
            "id": "r-1"
        }))
        .unwrap();

        assert!(group.is_group());
        assert!(!role.is_group());
    }
}
