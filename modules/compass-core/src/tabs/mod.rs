//! Parsers for the MemberProfile.aspx tabs and the role detail popup.
//!
//! Every parser checks the access-denied sentinel before reading any field.

pub mod awards;
pub mod disclosures;
pub mod permits;
pub mod personal;
pub mod role_detail;
pub mod roles;
pub mod training;

use std::fmt;
use std::str::FromStr;

use crate::error::CompassError;

pub use awards::parse_awards_tab;
pub use disclosures::parse_disclosures_tab;
pub use permits::parse_permits_tab;
pub use personal::parse_personal_tab;
pub use role_detail::parse_role_detail;
pub use roles::{parse_roles_tab, RolesOptions};
pub use training::parse_training_tab;

/// Tabs of MemberProfile.aspx that carry member data.
///
/// The portal also has Children, Youth Badges, Events and Parents tabs, all
/// of which are disabled. Visibility only renders on the viewer's own profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileTab {
    Personal,
    Roles,
    Permits,
    Training,
    Awards,
    Emergency,
    Comms,
    Visibility,
    Disclosures,
}

impl ProfileTab {
    pub const ALL: [ProfileTab; 9] = [
        ProfileTab::Personal,
        ProfileTab::Roles,
        ProfileTab::Permits,
        ProfileTab::Training,
        ProfileTab::Awards,
        ProfileTab::Emergency,
        ProfileTab::Comms,
        ProfileTab::Visibility,
        ProfileTab::Disclosures,
    ];

    /// Value of the `Page` query parameter; the personal tab has none.
    pub fn page_key(&self) -> Option<&'static str> {
        match self {
            ProfileTab::Personal => None,
            ProfileTab::Roles => Some("ROLES"),
            ProfileTab::Permits => Some("PERMITS"),
            ProfileTab::Training => Some("TRAINING"),
            ProfileTab::Awards => Some("AWARDS"),
            ProfileTab::Emergency => Some("EMERGENCY"),
            ProfileTab::Comms => Some("COMMS"),
            ProfileTab::Visibility => Some("VISIBILITY"),
            ProfileTab::Disclosures => Some("DISCLOSURES"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileTab::Personal => "Personal",
            ProfileTab::Roles => "Roles",
            ProfileTab::Permits => "Permits",
            ProfileTab::Training => "Training",
            ProfileTab::Awards => "Awards",
            ProfileTab::Emergency => "Emergency",
            ProfileTab::Comms => "Comms",
            ProfileTab::Visibility => "Visibility",
            ProfileTab::Disclosures => "Disclosures",
        }
    }
}

impl fmt::Display for ProfileTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileTab {
    type Err = CompassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileTab::ALL
            .into_iter()
            .find(|tab| tab.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CompassError::InvalidTab(s.to_string()))
    }
}
