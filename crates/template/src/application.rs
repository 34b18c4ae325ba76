//! Application data rendered into templates

use crate::Result;
use mapping::{DataField, FieldCatalog};
use serde::{Deserialize, Serialize};

/// Field ids of [`ApplicationData`] with their display labels, in form order
pub const APPLICATION_FIELDS: &[(&str, &str)] = &[
    ("facilityName", "施設名"),
    ("applicantName", "申込者氏名"),
    ("phone", "電話番号"),
    ("email", "メールアドレス"),
    ("address", "住所"),
    ("childName", "お子さまの氏名"),
    ("childNameKana", "お子さまの氏名（ふりがな）"),
    ("childBirthDate", "お子さまの生年月日"),
    ("desiredDate", "利用希望日"),
    ("desiredTime", "利用希望時間"),
    ("notes", "備考"),
];

/// The record a user fills in for a childcare application
///
/// Every field is optional; absent or empty values are never rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationData {
    pub facility_name: Option<String>,
    pub applicant_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub child_name: Option<String>,
    pub child_name_kana: Option<String>,
    pub child_birth_date: Option<String>,
    pub desired_date: Option<String>,
    pub desired_time: Option<String>,
    pub notes: Option<String>,
}

impl ApplicationData {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether `field_id` names one of the record's fields
    pub fn is_known_field(field_id: &str) -> bool {
        APPLICATION_FIELDS.iter().any(|(id, _)| *id == field_id)
    }

    /// Look up a value by field id
    ///
    /// Returns `None` for unknown ids, absent values and empty strings.
    pub fn get(&self, field_id: &str) -> Option<&str> {
        let value = match field_id {
            "facilityName" => &self.facility_name,
            "applicantName" => &self.applicant_name,
            "phone" => &self.phone,
            "email" => &self.email,
            "address" => &self.address,
            "childName" => &self.child_name,
            "childNameKana" => &self.child_name_kana,
            "childBirthDate" => &self.child_birth_date,
            "desiredDate" => &self.desired_date,
            "desiredTime" => &self.desired_time,
            "notes" => &self.notes,
            _ => return None,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    /// Field catalog for the mapping editor, bound to this record's values
    pub fn catalog(&self) -> FieldCatalog {
        APPLICATION_FIELDS
            .iter()
            .map(|&(id, label)| DataField::new(id, label, self.get(id).unwrap_or_default()))
            .collect()
    }
}
