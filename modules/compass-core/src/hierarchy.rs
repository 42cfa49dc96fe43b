//! Organisational hierarchy: child units of a unit, and the members with
//! roles in a unit.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::client::PortalClient;
use crate::coerce::maybe_id;
use crate::config::CompassConfig;
use crate::error::{CompassError, Result};
use crate::html::Page;

const SEARCH_ERROR_ACTION: &str = "./ScoutsPortal.aspx?Invalid=SearchError";
const SEARCH_DATA_FIELD: &str = "ctl00$plInnerPanel_head$txt_h_Data";
const AUTHORISATION_DENIED: &str = "Authorization has been denied for this request.";

/// Member search fields that are dropped from results.
const DROPPED_MEMBER_FIELDS: &[&str] = &["visibility_status", "address", "role"];

/// Hierarchy endpoints, one per kind of child list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyLevel {
    Countries,
    HqSections,
    Regions,
    CountrySections,
    Counties,
    RegionSections,
    Districts,
    CountySections,
    Groups,
    DistrictSections,
    GroupSections,
}

impl HierarchyLevel {
    pub const ALL: [HierarchyLevel; 11] = [
        HierarchyLevel::Countries,
        HierarchyLevel::HqSections,
        HierarchyLevel::Regions,
        HierarchyLevel::CountrySections,
        HierarchyLevel::Counties,
        HierarchyLevel::RegionSections,
        HierarchyLevel::Districts,
        HierarchyLevel::CountySections,
        HierarchyLevel::Groups,
        HierarchyLevel::DistrictSections,
        HierarchyLevel::GroupSections,
    ];

    pub fn endpoint(&self) -> &'static str {
        match self {
            HierarchyLevel::Countries => "/countries",
            HierarchyLevel::HqSections => "/hq/sections",
            HierarchyLevel::Regions => "/regions",
            HierarchyLevel::CountrySections => "/country/sections",
            HierarchyLevel::Counties => "/counties",
            HierarchyLevel::RegionSections => "/region/sections",
            HierarchyLevel::Districts => "/districts",
            HierarchyLevel::CountySections => "/county/sections",
            HierarchyLevel::Groups => "/groups",
            HierarchyLevel::DistrictSections => "/district/sections",
            HierarchyLevel::GroupSections => "/group/sections",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HierarchyLevel::Countries => "countries",
            HierarchyLevel::HqSections => "hq_sections",
            HierarchyLevel::Regions => "regions",
            HierarchyLevel::CountrySections => "country_sections",
            HierarchyLevel::Counties => "counties",
            HierarchyLevel::RegionSections => "region_sections",
            HierarchyLevel::Districts => "districts",
            HierarchyLevel::CountySections => "county_sections",
            HierarchyLevel::Groups => "groups",
            HierarchyLevel::DistrictSections => "district_sections",
            HierarchyLevel::GroupSections => "group_sections",
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HierarchyLevel {
    type Err = CompassError;

    fn from_str(s: &str) -> Result<Self> {
        HierarchyLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| CompassError::Parse(format!("unknown hierarchy level `{s}`")))
    }
}

/// A child unit returned by a hierarchy endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyUnit {
    pub id: u64,
    pub name: String,
    pub parent_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawUnit {
    value: Value,
    description: String,
    #[serde(default)]
    parent: Value,
    #[serde(default)]
    tag: Option<String>,
}

#[derive(Deserialize)]
struct UnitTag {
    #[serde(default)]
    org_status: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(rename = "Members", default)]
    members: Value,
    #[serde(rename = "SectionTypeDesc", default)]
    section_type_desc: Option<String>,
}

fn json_id(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => maybe_id(s.as_str()),
        _ => None,
    }
}

/// Parse a hierarchy endpoint response.
pub fn parse_hierarchy_units(body: &[u8], parent_unit: u64) -> Result<Vec<HierarchyUnit>> {
    let value: Value = serde_json::from_slice(body)?;
    if value.get("Message").and_then(Value::as_str) == Some(AUTHORISATION_DENIED) {
        return Err(CompassError::permission_denied(format!("unit {parent_unit}")));
    }

    let raw: Vec<RawUnit> = serde_json::from_value(value)?;
    raw.into_iter()
        .map(|unit| {
            let id = json_id(&unit.value)
                .ok_or_else(|| CompassError::Parse(format!("unit id `{}` is not a number", unit.value)))?;
            let mut parsed = HierarchyUnit {
                id,
                name: unit.description,
                parent_id: json_id(&unit.parent),
                status: None,
                address: None,
                member_count: None,
                section_type: None,
            };

            let tag = unit.tag.as_deref().map(str::trim).unwrap_or_default();
            if !tag.is_empty() {
                let tags: Vec<UnitTag> = serde_json::from_str(tag)?;
                if let Some(tag) = tags.into_iter().next() {
                    parsed.status = tag.org_status;
                    parsed.address = tag.address;
                    parsed.member_count = json_id(&tag.members);
                    parsed.section_type = tag.section_type_desc;
                }
            }
            Ok(parsed)
        })
        .collect()
}

/// Parse SearchResults.aspx after a hierarchy member search.
pub fn parse_member_search(body: &[u8]) -> Result<Vec<Map<String, Value>>> {
    let page = Page::parse(body);
    if page.form_action() == Some(SEARCH_ERROR_ACTION) {
        return Err(CompassError::InvalidSearch);
    }

    let data = page
        .form_field(SEARCH_DATA_FIELD)
        .filter(|data| !data.trim().is_empty())
        .unwrap_or_else(|| "[]".to_string());
    let mut members: Vec<Map<String, Value>> = serde_json::from_str(&data)?;
    for member in &mut members {
        for field in DROPPED_MEMBER_FIELDS {
            member.remove(*field);
        }
    }
    Ok(members)
}

/// The portal's request body shape: `[{"Key": k, "Value": v}, ...]`.
///
/// Every value is sent as a string; non-string values in their JSON text form.
pub fn compass_restify<I, K>(data: I) -> Value
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Value::Array(
        data.into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                json!({ "Key": key.into(), "Value": value })
            })
            .collect(),
    )
}

pub struct HierarchyScraper<C> {
    client: C,
    config: CompassConfig,
}

impl<C: PortalClient> HierarchyScraper<C> {
    pub fn new(client: C, config: CompassConfig) -> Self {
        Self { client, config }
    }

    /// Children of `parent_unit` at `level`, with live address and member data.
    pub async fn get_units_from_hierarchy(
        &self,
        parent_unit: u64,
        level: HierarchyLevel,
    ) -> Result<Vec<HierarchyUnit>> {
        let url = self.config.url(&format!("hierarchy{}", level.endpoint()));
        let body = json!({ "LiveData": "Y", "ParentID": parent_unit.to_string() });
        let response = self.client.post_json(&url, &body).await?;

        let units = parse_hierarchy_units(&response, parent_unit)?;
        tracing::debug!(parent_unit, level = %level, units = units.len(), "Fetched hierarchy units");
        Ok(units)
    }

    /// Members holding roles in `unit_number`.
    pub async fn get_members_with_roles_in_unit(&self, unit_number: u64) -> Result<Vec<Map<String, Value>>> {
        let now = Local::now();
        let time_uid = format!("{}{}{}", now.hour(), now.minute(), now.nanosecond() / 1_000_000);
        let search = compass_restify([
            ("SearchType", json!("HIERARCHY")),
            ("OrganisationNumber", json!(unit_number)),
            ("UI", json!(time_uid)),
        ]);

        self.client
            .post_json(&self.config.url("Search/Members"), &search)
            .await?;
        let results = self.client.get(&self.config.url("SearchResults.aspx")).await?;

        let members = parse_member_search(&results)?;
        tracing::debug!(unit_number, members = members.len(), "Fetched unit members");
        Ok(members)
    }
}
