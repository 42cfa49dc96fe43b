use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::Selector;

use crate::coerce::{maybe_id, non_empty, parse_date};
use crate::error::{CompassError, Result};
use crate::html::{element_children, selected_option, selector, text_of, Page, RowReader, DENIED_POPUP_ACTION};
use crate::status::extract_disclosure_status;
use crate::types::{GettingStartedModule, MemberRoleDetail, MemberRolePopup, RoleNumber, RoleStatus};

static APPROVAL_ROWS: LazyLock<Selector> = LazyLock::new(|| selector(r#"tr[class="trProp"]"#));
static TRAINING_ROWS: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"tr[class="trTrain trTrainData"]"#));

const FIELD_PREFIX: &str = "ctl00$workarea$";
const LOCATION_FIELD: &str = "ctl00$workarea$cbo_p1_location";

/// Placeholder option texts meaning "no value".
const UNSET_VALUES: &[&str] = &[
    "--- Not Selected ---",
    "--- No Items Available ---",
    "--- No Line Manager ---",
];

const APPOINTMENT_PANEL: &str = "ROLPRP|AACA";
const COMMISSIONER: &str = "ROLPRP|CAPR";
const COMMITTEE: &str = "ROLPRP|CCA";

/// Getting-started module labels and their short codes.
const MODULE_NAMES: &[(&str, &str)] = &[
    ("Essential Information", "M01"),
    ("Trustee Introduction", "TRST"),
    ("Personal Learning Plan", "M02"),
    ("Tools for the Role (Section Leaders)", "M03"),
    ("Tools for the Role (Managers and Supporters)", "M04"),
    ("General Data Protection Regulations", "GDPR"),
    ("Safety Training", "SFTY"),
    ("Safeguarding Training", "SAFE"),
];

/// Portal module codes (`data-ng_value`) to output keys.
const RENAMED_MODULES: &[(&str, &str)] = &[
    ("001", "module_01"),
    ("TRST", "trustee_intro"),
    ("002", "module_02"),
    ("003", "module_03"),
    ("004", "module_04"),
    ("GDPR", "GDPR"),
    ("SFTY", "safety"),
    ("SAFE", "safeguarding"),
];

const REFERENCE_CODES: &[(&str, &str)] = &[
    ("NC", "Not Complete"),
    ("NR", "Not Required"),
    ("RR", "References Requested"),
    ("S", "References Satisfactory"),
    ("U", "References Unsatisfactory"),
];

const RENAMED_LEVELS: &[(&str, &str)] = &[("County / Area / Scottish Region / Overseas Branch", "County")];

fn lookup(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// `None` for empty strings and placeholder options.
fn set_value(value: impl Into<String>) -> Option<String> {
    non_empty(value).filter(|v| !UNSET_VALUES.contains(&v.as_str()))
}

/// Parse the role detail popup (`AssignNewRole.aspx?VIEW=<role>`).
pub fn parse_role_detail(html: &[u8], role_number: RoleNumber) -> Result<MemberRolePopup> {
    let page = Page::parse(html);
    page.ensure_access(DENIED_POPUP_ACTION, format!("role {role_number}"))?;

    let field = |name: &str| page.form_field(&format!("{FIELD_PREFIX}{name}"));
    let date = |name: &str| -> Result<Option<NaiveDate>> {
        parse_date(&field(name).unwrap_or_default())
            .map_err(|e| CompassError::role(role_number, format!("{name}: {e}")))
    };

    let membership_number = field("txt_p1_memberno")
        .and_then(|number| maybe_id(&number))
        .ok_or_else(|| CompassError::role(role_number, "txt_p1_memberno is not a membership number"))?;

    let member_control = page.form_control(&format!("{FIELD_PREFIX}txt_p1_membername"));
    let name = field("txt_p1_membername")
        .and_then(|member| member.split_once(' ').map(|(_, name)| name.to_string()))
        .and_then(non_empty);
    let birth_date = match member_control.and_then(|control| control.value().attr("data-dob")) {
        Some(dob) => parse_date(dob).map_err(|e| CompassError::role(role_number, format!("data-dob: {e}")))?,
        None => None,
    };

    let line_manager = page
        .form_control(&format!("{FIELD_PREFIX}cbo_p2_linemaneger"))
        .and_then(selected_option);
    let line_manager_number = line_manager
        .and_then(|option| option.value().attr("value"))
        .filter(|value| !UNSET_VALUES.contains(value))
        .and_then(|value| maybe_id(value));
    let line_manager = line_manager.map(text_of).and_then(set_value);

    let ce_check = match field("txt_p2_cecheck").as_deref() {
        Some("Pending") | None => None,
        Some(_) => date("txt_p2_cecheck")?,
    };

    let (disclosure_check, disclosure_date) =
        extract_disclosure_status(&field("txt_p2_disclosure").unwrap_or_default());

    let references = field("cbo_p2_referee_status").and_then(|code| {
        let expanded = lookup(REFERENCE_CODES, &code).map(str::to_string).unwrap_or(code);
        set_value(expanded)
    });

    let approvals = approval_values(&page);
    let approval = |code: &str| approvals.get(code).cloned().flatten();

    let details = MemberRoleDetail {
        role_number,
        membership_number,
        organisation_level: field("cbo_p1_level").and_then(set_value),
        birth_date,
        name,
        role_title: field("txt_p1_alt_title").and_then(set_value),
        role_start: date("txt_p1_startdate")?,
        role_status: field("txt_p2_status").and_then(non_empty).map(RoleStatus::from),
        line_manager_number,
        line_manager,
        review_date: date("txt_p2_review")?,
        ce_check,
        disclosure_check,
        disclosure_date,
        references,
        appointment_panel_approval: approval(APPOINTMENT_PANEL),
        commissioner_approval: approval(COMMISSIONER),
        committee_approval: approval(COMMITTEE),
    };

    let getting_started = getting_started_modules(&page, role_number)?;
    let hierarchy = hierarchy_levels(&page);

    tracing::debug!(
        role_number,
        membership_number,
        levels = hierarchy.len(),
        modules = getting_started.len(),
        "Parsed role detail"
    );

    Ok(MemberRolePopup {
        hierarchy,
        details,
        getting_started,
    })
}

/// Approval selects keyed by their `data-app_code`; the current value is
/// in `data-db`.
fn approval_values(page: &Page) -> BTreeMap<String, Option<String>> {
    page.document()
        .select(&APPROVAL_ROWS)
        .filter_map(|row| {
            let select = RowReader::new(row).cell_child(1, 0)?;
            let code = select.value().attr("data-app_code")?;
            let value = select.value().attr("data-db").and_then(set_value);
            Some((code.to_string(), value))
        })
        .collect()
}

fn getting_started_modules(
    page: &Page,
    role_number: RoleNumber,
) -> Result<BTreeMap<String, GettingStartedModule>> {
    let mut modules = BTreeMap::new();

    for row in page.document().select(&TRAINING_ROWS) {
        let cells = RowReader::new(row);
        let label = cells
            .cell_child(0, 0)
            .map(|label| {
                label
                    .children()
                    .filter_map(|node| node.value().as_text().map(|t| t.to_string()))
                    .collect::<String>()
                    .trim()
                    .to_string()
            })
            .unwrap_or_default();
        let Some(short_code) = lookup(MODULE_NAMES, &label) else {
            continue;
        };

        let validated_input = cells.cell_child(2, 0);
        let validated = validated_input
            .and_then(|input| input.value().attr("value"))
            .unwrap_or_default();
        let validated = parse_date(validated)
            .map_err(|e| CompassError::role(role_number, format!("{label}: {e}")))?;
        let validated_by = cells
            .cell_child(1, 1)
            .and_then(|input| input.value().attr("value"))
            .and_then(non_empty);

        let key = validated_input
            .and_then(|input| input.value().attr("data-ng_value"))
            .and_then(|code| lookup(RENAMED_MODULES, code))
            .unwrap_or(short_code);

        modules.insert(
            key.to_string(),
            GettingStartedModule {
                validated,
                validated_by,
            },
        );
    }

    Ok(modules)
}

/// Organisation levels from the location selects, in field-name order.
fn hierarchy_levels(page: &Page) -> BTreeMap<String, String> {
    let mut selects = page.form_controls_containing(LOCATION_FIELD);
    selects.sort_by_key(|select| select.value().attr("name").unwrap_or_default().to_string());

    selects
        .into_iter()
        .filter_map(|select| {
            let title = select.value().attr("title")?;
            let value = element_children(select)
                .find(|child| child.value().name() == "option")
                .map(text_of)
                .and_then(set_value)?;
            let level = lookup(RENAMED_LEVELS, title).unwrap_or(title).to_lowercase();
            Some((level, value))
        })
        .collect()
}
