use serde::{Deserialize, Serialize};

/// Per-request scope: which spreadsheet and sheet an operation targets, and
/// who is asking. Built from the request and passed down explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub spreadsheet_id: String,
    pub sheet: Option<String>,
    pub username: Option<String>,
}

impl RequestContext {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet: None,
            username: None,
        }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username.filter(|u| !u.trim().is_empty());
        self
    }

    /// Sheet name, defaulting to `fallback` when none was selected.
    pub fn sheet_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.sheet.as_deref().unwrap_or(fallback)
    }
}
