use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::Selector;

use crate::coerce::{maybe_id, non_empty, parse_date};
use crate::duration::{membership_duration, DateRange};
use crate::error::{CompassError, Result};
use crate::html::{element_children, selector, Page, RowReader, DENIED_PROFILE_ACTION};
use crate::status::extract_review_status;
use crate::types::{MemberRoleCore, MemberRolesCollection, MembershipNumber, RoleStatus};

static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tbody > tr"));

/// Role titles that do not count as volunteering, lowercased.
const NON_VOLUNTEER_TITLES: &[&str] = &[
    // occasional helpers
    "group occasional helper",
    "group occasional helper.",
    "district occasional helper",
    "county occasional helper",
    "pvg",
    "occasional helper",
    // council
    "county scout council member",
    "county scout council member - nominated representative",
    "county scout council member - nominated youth representative",
    "county scout council member - nominated member (18-24)",
    // staff
    "district staff",
    "county staff",
    // network members
    "network member",
    "scout network member",
    "district scout network",
    "district scout network member",
    "county scout network member",
];

/// Filters applied to the Roles tab.
#[derive(Debug, Clone, Default)]
pub struct RolesOptions {
    /// Keep occasional helper, PVG, network, council and staff roles.
    pub keep_non_volunteer_roles: bool,
    /// Only return roles whose status is in this set.
    pub statuses: Option<HashSet<String>>,
}

impl RolesOptions {
    pub fn keep_non_volunteer_roles(mut self) -> Self {
        self.keep_non_volunteer_roles = true;
        self
    }

    pub fn with_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.statuses = Some(statuses.into_iter().map(Into::into).collect());
        self
    }
}

/// Helper, network, council and staff roles are not volunteer roles.
pub fn is_non_volunteer(role: &MemberRoleCore) -> bool {
    role.role_class.to_lowercase().contains("helper")
        || NON_VOLUNTEER_TITLES.contains(&role.role_title.to_lowercase().as_str())
}

/// Parse the Roles tab.
///
/// Membership duration only counts non-cancelled volunteer roles, with open
/// roles running to `today`. The `statuses` filter narrows the returned roles
/// but not the duration.
pub fn parse_roles_tab(
    html: &[u8],
    membership_number: MembershipNumber,
    options: &RolesOptions,
    today: NaiveDate,
) -> Result<MemberRolesCollection> {
    let page = Page::parse(html);
    page.ensure_access(DENIED_PROFILE_ACTION, membership_number)?;

    let mut roles = BTreeMap::new();
    let mut role_dates: Vec<DateRange> = Vec::new();

    for row in page.document().select(&ROWS) {
        // Rows are independent: a malformed row is logged and skipped so the
        // remaining roles and the duration still come through.
        let role = match parse_role_row(RowReader::new(row), membership_number) {
            Ok(role) => role,
            Err(e) => {
                tracing::warn!(membership_number, error = %e, "Skipping unparseable role row");
                continue;
            }
        };

        if is_non_volunteer(&role) {
            if !options.keep_non_volunteer_roles {
                continue;
            }
        } else if role.role_status != RoleStatus::Cancelled {
            if let Some(start) = role.role_start {
                role_dates.push((start, role.role_end.unwrap_or(today)));
            }
        }

        if let Some(statuses) = &options.statuses {
            if !statuses.contains(role.role_status.as_str()) {
                continue;
            }
        }

        roles.insert(role.role_number, role);
    }

    let membership_duration = membership_duration(&role_dates);
    tracing::debug!(
        membership_number,
        roles = roles.len(),
        membership_duration,
        "Parsed roles tab"
    );

    Ok(MemberRolesCollection {
        roles,
        membership_duration,
    })
}

fn parse_role_row(mut cells: RowReader<'_>, membership_number: MembershipNumber) -> Result<MemberRoleCore> {
    let role_number = cells
        .row_attr("data-pk")
        .and_then(|pk| maybe_id(pk))
        .ok_or_else(|| CompassError::member(membership_number, "role row has no data-pk"))?;

    cells.drop_leading_selector();
    if cells.len() < 7 {
        return Err(CompassError::member(
            membership_number,
            format!("role {role_number} has {} cells, expected 7", cells.len()),
        ));
    }

    let date = |index: usize| {
        parse_date(&cells.text(index)).map_err(|e| CompassError::role(role_number, e.to_string()))
    };

    let (status, review_date) = extract_review_status(&cells.text(5));

    let can_view_details = cells.cell(6).is_some_and(|actions| {
        element_children(actions).any(|el| {
            el.value()
                .attr("class")
                .is_some_and(|class| class.contains("VIEWROLE"))
        })
    });

    Ok(MemberRoleCore {
        role_number,
        membership_number,
        role_title: cells.text(0),
        role_class: cells.text(1),
        role_type: cells
            .cell(0)
            .and_then(|title| element_children(title).find_map(|el| el.value().attr("title")))
            .and_then(non_empty),
        location_id: cells
            .cell_child(2, 0)
            .and_then(|el| el.value().attr("data-ng_id"))
            .and_then(|id| maybe_id(id)),
        location_name: cells.opt_text(2),
        role_start: date(3)?,
        role_end: date(4)?,
        role_status: RoleStatus::from(status),
        review_date,
        can_view_details,
    })
}
