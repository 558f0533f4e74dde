//! Stable presentation surface: `data-cy` selectors, flag marks and the
//! documented login invocation.

use crate::EntityKind;

pub const GROUP_INPUT: &str = "group-input";
pub const GENERATE_BIND_TOKEN_BUTTON: &str = "generate-bind-token-button";
pub const GENERATE_PASSWORD_BUTTON: &str = "generate-password-button";

/// Per-kind automation selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selectors {
    pub add: String,
    pub edit_icon: String,
    pub delete_icon: String,
    pub save_button: String,
    pub search_table: String,
    pub table: String,
}

impl Selectors {
    pub fn for_kind(kind: EntityKind) -> Self {
        let name = kind.singular();
        Self {
            add: format!("add-{name}"),
            edit_icon: format!("edit-{name}-icon"),
            delete_icon: format!("delete-{name}-icon"),
            save_button: format!("save-{name}-button"),
            search_table: format!("search-{name}-table"),
            table: format!("{name}-table"),
        }
    }
}

/// Table rendering of a boolean flag.
pub fn flag_mark(value: bool) -> &'static str {
    if value { "✓" } else { "-" }
}

/// Shell template for logging in with curl; `${json}` and `${DPM_URL}` are
/// left for the shell to expand.
pub fn login_curl_command() -> &'static str {
    r#"curl -c cookies.txt -H'Content-Type: application/json' -d"${json}" ${DPM_URL}/api/login"#
}

/// Login body for an application: its id as username plus its generated password.
pub fn application_login_json(application_id: i64, password: &str) -> String {
    serde_json::json!({
        "username": application_id.to_string(),
        "password": password,
    })
    .to_string()
}
