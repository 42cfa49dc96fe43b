use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use crate::address::Address;

pub type MembershipNumber = u64;
pub type RoleNumber = u64;

// ---------------------------------------------------------------------------
// Personal tab
// ---------------------------------------------------------------------------

/// Personal Details tab. Fields the viewer cannot see are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDetails {
    pub membership_number: MembershipNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_as: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forenames: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub religion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Address::is_empty")]
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_email: Option<String>,
}

// ---------------------------------------------------------------------------
// Roles tab
// ---------------------------------------------------------------------------

/// Lifecycle status of a role. Statuses the portal adds later are kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleStatus {
    Full,
    Provisional,
    PreProvisional,
    Closed,
    Cancelled,
    Other(String),
}

impl RoleStatus {
    pub fn as_str(&self) -> &str {
        match self {
            RoleStatus::Full => "Full",
            RoleStatus::Provisional => "Provisional",
            RoleStatus::PreProvisional => "Pre provisional",
            RoleStatus::Closed => "Closed",
            RoleStatus::Cancelled => "Cancelled",
            RoleStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for RoleStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Full" => RoleStatus::Full,
            "Provisional" => RoleStatus::Provisional,
            "Pre provisional" => RoleStatus::PreProvisional,
            "Closed" => RoleStatus::Closed,
            "Cancelled" => RoleStatus::Cancelled,
            _ => RoleStatus::Other(raw),
        }
    }
}

impl From<&str> for RoleStatus {
    fn from(raw: &str) -> Self {
        RoleStatus::from(raw.to_string())
    }
}

impl From<RoleStatus> for String {
    fn from(status: RoleStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for RoleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the Roles tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRoleCore {
    pub role_number: RoleNumber,
    pub membership_number: MembershipNumber,
    pub role_title: String,
    pub role_class: String,
    /// Only visible with access to the System Admin tab.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_type: Option<String>,
    /// Only present while the role's hierarchy link still exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_end: Option<NaiveDate>,
    pub role_status: RoleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<NaiveDate>,
    pub can_view_details: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRolesCollection {
    pub roles: BTreeMap<RoleNumber, MemberRoleCore>,
    /// Years covered by the member's volunteer roles.
    pub membership_duration: f64,
}

// ---------------------------------------------------------------------------
// Permits, awards, disclosures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberPermit {
    pub membership_number: MembershipNumber,
    pub permit_type: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub restrictions: String,
    /// `None` once the permit is revoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberAward {
    pub membership_number: MembershipNumber,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Withdrawn applications omit country, number, issuer and both dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDisclosure {
    pub membership_number: MembershipNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub provider: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<NaiveDate>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Training tab
// ---------------------------------------------------------------------------

/// Training progress for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberTrainingRole {
    pub role_number: RoleNumber,
    pub role_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_start: Option<NaiveDate>,
    pub role_status: RoleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Raw training adviser cell, `"<number> <name>"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ta_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ta_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ta_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wood_badge_number: Option<String>,
}

/// One module of a personal learning plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberTrainingModule {
    pub pk: u64,
    pub module_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_completed: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_membership_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OngoingLearning {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewal_date: Option<NaiveDate>,
}

/// Mandatory ongoing learning. Every category is present, empty when the
/// page has no record of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMandatoryTraining {
    pub safety: OngoingLearning,
    pub safeguarding: OngoingLearning,
    pub first_aid: OngoingLearning,
    pub gdpr: OngoingLearning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberTrainingTab {
    pub roles: BTreeMap<RoleNumber, MemberTrainingRole>,
    pub plps: BTreeMap<u64, Vec<MemberTrainingModule>>,
    pub mandatory: MemberMandatoryTraining,
}

// ---------------------------------------------------------------------------
// Role detail popup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRoleDetail {
    pub role_number: RoleNumber,
    pub membership_number: MembershipNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organisation_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_status: Option<RoleStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_manager_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_date: Option<NaiveDate>,
    /// Confidential enquiry check; `None` while pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ce_check: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclosure_check: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclosure_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appointment_panel_approval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commissioner_approval: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub committee_approval: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GettingStartedModule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRolePopup {
    /// Organisation level (lowercase) to unit name; unset levels are absent.
    pub hierarchy: BTreeMap<String, String>,
    pub details: MemberRoleDetail,
    pub getting_started: BTreeMap<String, GettingStartedModule>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_status_round_trips_through_strings() {
        assert_eq!(RoleStatus::from("Full"), RoleStatus::Full);
        assert_eq!(RoleStatus::from("Pre provisional"), RoleStatus::PreProvisional);
        assert_eq!(
            RoleStatus::from("Awaiting Approval"),
            RoleStatus::Other("Awaiting Approval".into())
        );
        let json = serde_json::to_string(&RoleStatus::Cancelled).unwrap();
        assert_eq!(json, "\"Cancelled\"");
    }

    #[test]
    fn member_details_omit_absent_fields() {
        let details = MemberDetails {
            membership_number: 12345,
            name: Some("Jo Bloggs".into()),
            known_as: None,
            forenames: None,
            surname: None,
            birth_date: None,
            sex: None,
            nationality: None,
            ethnicity: None,
            religion: None,
            occupation: None,
            join_date: None,
            address: Address::default(),
            main_phone: None,
            main_email: None,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"membership_number": 12345, "name": "Jo Bloggs"})
        );
    }

    #[test]
    fn revoked_permit_omits_expiry_and_status() {
        let permit = MemberPermit {
            membership_number: 1,
            permit_type: "Nights Away".into(),
            category: "Campsite".into(),
            kind: "Full".into(),
            restrictions: String::new(),
            expires: None,
            status: None,
        };
        let json = serde_json::to_value(&permit).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "membership_number": 1,
                "permit_type": "Nights Away",
                "category": "Campsite",
                "type": "Full",
                "restrictions": ""
            })
        );
    }

    #[test]
    fn empty_mandatory_training_keeps_every_category() {
        let json = serde_json::to_value(MemberMandatoryTraining::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"safety": {}, "safeguarding": {}, "first_aid": {}, "gdpr": {}})
        );
    }
}
