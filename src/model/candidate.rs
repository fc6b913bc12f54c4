use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a mentionable user
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        CandidateId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> Self {
        CandidateId::new(s)
    }
}

/// A mentionable user as presented in the suggestion list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub display_name: String,
    pub email: String,
    pub role_label: String,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        role_label: impl Into<String>,
    ) -> Self {
        Candidate {
            id: CandidateId::new(id),
            display_name: display_name.into(),
            email: email.into(),
            role_label: role_label.into(),
        }
    }

    /// The literal text inserted for this candidate: `@<name>` plus one space.
    pub fn mention_text(&self) -> String {
        format!("@{} ", self.display_name)
    }

    /// Case-insensitive substring match against name or email.
    /// `folded_query` must already be lowercase.
    pub fn matches_query(&self, folded_query: &str) -> bool {
        folded_query.is_empty()
            || self.display_name.to_lowercase().contains(folded_query)
            || self.email.to_lowercase().contains(folded_query)
    }
}

/// Role as returned by the staff endpoint: either a bare label or a role object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RoleField {
    Label(String),
    Object { name: String },
}

/// One record of the staff directory response.
///
/// Backends send the identity as `_id`, `id` or both; `_id` wins when both
/// are present.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct StaffRecord {
    #[serde(default, rename = "_id")]
    pub object_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<RoleField>,
}

impl StaffRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        StaffRecord {
            id: Some(id.into()),
            name: name.into(),
            ..StaffRecord::default()
        }
    }

    /// The record's identity, `_id` first. Blank ids count as missing.
    pub fn record_id(&self) -> Option<&str> {
        [self.object_id.as_deref(), self.id.as_deref()]
            .into_iter()
            .flatten()
            .find(|id| !id.trim().is_empty())
    }

    /// A record needs an id and a non-blank name; blank names could never be
    /// told apart in rendered text.
    pub fn is_usable(&self) -> bool {
        self.record_id().is_some() && !self.name.trim().is_empty()
    }

    /// Convert to a candidate, or None when the record is not usable.
    pub fn into_candidate(self, fallback_role: &str) -> Option<Candidate> {
        if !self.is_usable() {
            return None;
        }
        let id = self.record_id()?.to_string();
        let role_label = match self.role {
            Some(RoleField::Object { name }) if !name.is_empty() => name,
            Some(RoleField::Label(label)) if !label.is_empty() => label,
            _ => fallback_role.to_string(),
        };
        Some(Candidate {
            id: CandidateId(id),
            display_name: self.name,
            email: self.email.unwrap_or_default(),
            role_label,
        })
    }
}
