use serde::Serialize;
use serde_json::{Map, Value};

use super::emptiness::{strip_empty, IsEmpty};

/// Output shape for one spreadsheet row. Fields serialize in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientRecord {
    pub object_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_status: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middlename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub titles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suffixes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_place_country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domicile_codes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nationality_codes: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorporation_country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_incorporation: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periodic_review_start_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub periodic_review_period: Option<String>,

    /// Residency, sanction and source lists, keyed by their column name
    #[serde(flatten)]
    pub code_lists: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub identity_numbers: Vec<IdentityNumber>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<Address>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<Alias>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lists: Vec<ListMembership>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
}

impl ClientRecord {
    pub fn new(object_type: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            ..Self::default()
        }
    }

    /// Serialize, then drop anything that ended up empty
    pub fn to_json(&self) -> serde_json::Result<Value> {
        Ok(strip_empty(serde_json::to_value(self)?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityNumber {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line4: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_box: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
}

impl IsEmpty for Address {
    fn is_empty_value(&self) -> bool {
        [
            &self.line,
            &self.line1,
            &self.line2,
            &self.line3,
            &self.line4,
            &self.po_box,
            &self.city,
            &self.province,
            &self.post_code,
            &self.country,
            &self.country_code,
        ]
        .iter()
        .all(|field| field.is_empty_value())
    }
}

/// Alternate name. Exactly one of `name`/`company_name` and one of
/// `alias_type`/`name_type` is set, depending on entity type and tag policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alias {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub alias_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMembership {
    pub id: String,
    pub name: String,
    pub active: bool,
    pub list_active: bool,
    pub hierarchy: Vec<ListRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or_tags1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or_tags2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or_tags3: Option<String>,
}

impl IsEmpty for Security {
    fn is_empty_value(&self) -> bool {
        [&self.or_tags1, &self.or_tags2, &self.or_tags3]
            .iter()
            .all(|tag| tag.is_empty_value())
    }
}
