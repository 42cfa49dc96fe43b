//! Member data: fetch profile tabs and popups through a [`PortalClient`]
//! and hand the bytes to the tab parsers.

use std::time::Instant;

use chrono::Local;

use crate::client::PortalClient;
use crate::config::CompassConfig;
use crate::error::Result;
use crate::tabs::{
    parse_awards_tab, parse_disclosures_tab, parse_permits_tab, parse_personal_tab, parse_role_detail,
    parse_roles_tab, parse_training_tab, ProfileTab, RolesOptions,
};
use crate::types::{
    MemberAward, MemberDetails, MemberDisclosure, MemberMandatoryTraining, MemberPermit, MemberRolePopup,
    MemberRolesCollection, MemberTrainingTab, MembershipNumber, RoleNumber,
};

pub struct PeopleScraper<C> {
    client: C,
    config: CompassConfig,
}

impl<C: PortalClient> PeopleScraper<C> {
    pub fn new(client: C, config: CompassConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn profile_url(&self, membership_number: MembershipNumber, tab: ProfileTab) -> String {
        let mut url = self.config.url(&format!("MemberProfile.aspx?CN={membership_number}"));
        if let Some(key) = tab.page_key() {
            url.push_str(&format!("&Page={key}&TAB"));
        }
        url
    }

    pub fn role_detail_url(&self, role_number: RoleNumber) -> String {
        self.config
            .url(&format!("Popups/Profile/AssignNewRole.aspx?VIEW={role_number}"))
    }

    /// Raw bytes of a member profile tab.
    pub async fn get_member_profile_tab(
        &self,
        membership_number: MembershipNumber,
        tab: ProfileTab,
    ) -> Result<Vec<u8>> {
        let url = self.profile_url(membership_number, tab);
        let started = Instant::now();
        let body = self.client.get(&url).await?;
        tracing::debug!(
            membership_number,
            tab = %tab,
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Fetched member profile tab"
        );
        Ok(body)
    }

    pub async fn get_personal_tab(&self, membership_number: MembershipNumber) -> Result<MemberDetails> {
        let body = self.get_member_profile_tab(membership_number, ProfileTab::Personal).await?;
        timed("personal", || parse_personal_tab(&body, membership_number))
    }

    /// Roles and membership duration, with open roles running to today.
    pub async fn get_roles_tab(
        &self,
        membership_number: MembershipNumber,
        options: &RolesOptions,
    ) -> Result<MemberRolesCollection> {
        let body = self.get_member_profile_tab(membership_number, ProfileTab::Roles).await?;
        let today = Local::now().date_naive();
        timed("roles", || parse_roles_tab(&body, membership_number, options, today))
    }

    pub async fn get_permits_tab(&self, membership_number: MembershipNumber) -> Result<Vec<MemberPermit>> {
        let body = self.get_member_profile_tab(membership_number, ProfileTab::Permits).await?;
        timed("permits", || parse_permits_tab(&body, membership_number))
    }

    pub async fn get_training_tab(
        &self,
        membership_number: MembershipNumber,
        ongoing_only: bool,
    ) -> Result<MemberTrainingTab> {
        let body = self.get_member_profile_tab(membership_number, ProfileTab::Training).await?;
        timed("training", || parse_training_tab(&body, membership_number, ongoing_only))
    }

    /// Mandatory ongoing learning only.
    pub async fn get_mandatory_training(
        &self,
        membership_number: MembershipNumber,
    ) -> Result<MemberMandatoryTraining> {
        Ok(self.get_training_tab(membership_number, true).await?.mandatory)
    }

    pub async fn get_awards_tab(&self, membership_number: MembershipNumber) -> Result<Vec<MemberAward>> {
        let body = self.get_member_profile_tab(membership_number, ProfileTab::Awards).await?;
        timed("awards", || parse_awards_tab(&body, membership_number))
    }

    pub async fn get_disclosures_tab(
        &self,
        membership_number: MembershipNumber,
    ) -> Result<Vec<MemberDisclosure>> {
        let body = self
            .get_member_profile_tab(membership_number, ProfileTab::Disclosures)
            .await?;
        timed("disclosures", || parse_disclosures_tab(&body, membership_number))
    }

    /// Role detail popup. A prefetched page is parsed without a request.
    pub async fn get_roles_detail(
        &self,
        role_number: RoleNumber,
        prefetched: Option<&[u8]>,
    ) -> Result<MemberRolePopup> {
        let fetched;
        let body = match prefetched {
            Some(body) => body,
            None => {
                let started = Instant::now();
                fetched = self.client.get(&self.role_detail_url(role_number)).await?;
                tracing::debug!(
                    role_number,
                    bytes = fetched.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Fetched role detail"
                );
                fetched.as_slice()
            }
        };
        timed("role detail", || parse_role_detail(body, role_number))
    }
}

fn timed<T>(what: &str, parse: impl FnOnce() -> Result<T>) -> Result<T> {
    let started = Instant::now();
    let parsed = parse();
    tracing::debug!(
        what,
        ok = parsed.is_ok(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Parsed"
    );
    parsed
}
