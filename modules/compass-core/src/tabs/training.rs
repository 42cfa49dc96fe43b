use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Selector};

use crate::coerce::{maybe_id, non_empty, parse_date};
use crate::error::{CompassError, Result};
use crate::html::{element_children, nth_child, selector, table_rows, text_of, Page, RowReader, DENIED_PROFILE_ACTION};
use crate::status::extract_training_status;
use crate::types::{
    MemberMandatoryTraining, MemberTrainingModule, MemberTrainingRole, MemberTrainingTab,
    MembershipNumber, OngoingLearning, RoleStatus,
};

static TRAINING_TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table#tbl_p5_TrainModules"));
static ONGOING_ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tr[data-ng_code]"));
static MODULE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z0-9]+) - (.+)$").expect("valid module title regex"));

const MODULE_ROW_CLASS: &str = "msTR trMTMN";

/// Parse the Training tab.
///
/// With `ongoing_only`, personal learning plans keep only their GDPR
/// modules; other modules are not read at all.
pub fn parse_training_tab(
    html: &[u8],
    membership_number: MembershipNumber,
    ongoing_only: bool,
) -> Result<MemberTrainingTab> {
    let page = Page::parse(html);
    page.ensure_access(DENIED_PROFILE_ACTION, membership_number)?;

    let mut plps = BTreeMap::new();
    let mut roles = BTreeMap::new();

    let rows = page
        .select_first(&TRAINING_TABLE)
        .map(table_rows)
        .unwrap_or_default();

    for row in rows {
        let cells = RowReader::new(row);

        // Rows are independent; a bad plan or role row is logged and skipped.
        if cells.has_class("trPLP") {
            match parse_learning_plan(row, ongoing_only, membership_number) {
                Ok((plp_number, modules)) => {
                    plps.insert(plp_number, modules);
                }
                Err(e) => tracing::warn!(membership_number, error = %e, "Skipping unparseable learning plan"),
            }
        }

        if cells.has_class("msTR") {
            match parse_training_role(&cells, membership_number) {
                Ok(role) => {
                    roles.insert(role.role_number, role);
                }
                Err(e) => tracing::warn!(membership_number, error = %e, "Skipping unparseable training role"),
            }
        }
    }

    let mandatory = compile_ongoing_learning(&page, &plps, membership_number)?;
    tracing::debug!(
        membership_number,
        plps = plps.len(),
        roles = roles.len(),
        ongoing_only,
        "Parsed training tab"
    );

    Ok(MemberTrainingTab {
        roles,
        plps,
        mandatory,
    })
}

/// A PLP row wraps its own table (`td > table[data-pk]`) of module rows.
fn parse_learning_plan(
    row: ElementRef<'_>,
    ongoing_only: bool,
    membership_number: MembershipNumber,
) -> Result<(u64, Vec<MemberTrainingModule>)> {
    let table = nth_child(row, 0)
        .and_then(|cell| nth_child(cell, 0))
        .ok_or_else(|| CompassError::member(membership_number, "learning plan row has no table"))?;
    let plp_number = table
        .value()
        .attr("data-pk")
        .and_then(|pk| maybe_id(pk))
        .ok_or_else(|| CompassError::member(membership_number, "learning plan has no data-pk"))?;

    let mut modules = Vec::new();
    for module_row in table_rows(table) {
        if module_row.value().attr("class") != Some(MODULE_ROW_CLASS) {
            continue;
        }
        if let Some(module) = parse_module(&RowReader::new(module_row), ongoing_only, membership_number)? {
            modules.push(module);
        }
    }
    Ok((plp_number, modules))
}

fn parse_module(
    cells: &RowReader<'_>,
    ongoing_only: bool,
    membership_number: MembershipNumber,
) -> Result<Option<MemberTrainingModule>> {
    let invalid = |what: &str| CompassError::member(membership_number, format!("training module {what}"));

    let pk = cells
        .row_attr("data-pk")
        .and_then(|pk| maybe_id(pk))
        .ok_or_else(|| invalid("has no data-pk"))?;
    let module_id = cells
        .cell_attr(0, "id")
        .and_then(|id| id.get(4..))
        .and_then(|id| maybe_id(id))
        .ok_or_else(|| invalid("has no module id"))?;

    let title = cells.text(0);
    let (code, name) = match MODULE_TITLE.captures(&title) {
        Some(caps) => (Some(caps[1].to_string()), Some(caps[2].to_string())),
        None => (None, None),
    };

    if ongoing_only && !code.as_deref().is_some_and(|c| c.to_lowercase().contains("gdpr")) {
        return Ok(None);
    }

    let required = cells.text(1).to_lowercase();
    let learning_required = if required.is_empty() {
        None
    } else {
        Some(required.contains("yes"))
    };

    let (validated_membership_number, validated_name) = match cells.opt_text(4) {
        Some(validated_by) => {
            let (number, name) = validated_by.split_once(' ').unwrap_or((validated_by.as_str(), ""));
            (maybe_id(number), non_empty(name))
        }
        None => (None, None),
    };

    let date = |index: usize| parse_date(&cells.text(index)).map_err(|e| invalid(&e.to_string()));

    Ok(Some(MemberTrainingModule {
        pk,
        module_id,
        code,
        name,
        learning_required,
        learning_method: cells.opt_text(2),
        learning_completed: date(3)?,
        validated_membership_number,
        validated_name,
        validated_date: date(5)?,
    }))
}

fn parse_training_role(cells: &RowReader<'_>, membership_number: MembershipNumber) -> Result<MemberTrainingRole> {
    let role_number = cells
        .row_attr("data-ng_mrn")
        .and_then(|mrn| maybe_id(mrn))
        .ok_or_else(|| CompassError::member(membership_number, "training role row has no data-ng_mrn"))?;

    let (status, review_date) = extract_training_status(&cells.text(2));

    let ta_data = cells.opt_text(4);
    let (ta_number, ta_name) = match &ta_data {
        Some(ta) => {
            let (number, name) = ta.split_once(' ').unwrap_or((ta.as_str(), ""));
            (maybe_id(number), non_empty(name))
        }
        None => (None, None),
    };

    // "<type>: <date>", e.g. "Wood Badge: 12 Jan 2020"
    let completion = cells.opt_text(5);
    let (completion_type, completion_date) = match &completion {
        Some(text) => match text.split_once(':') {
            Some((kind, date)) => (non_empty(kind.trim()), lenient_date(date, role_number)),
            None => (non_empty(text.trim()), None),
        },
        None => (None, None),
    };

    let wood_badge_number = cells
        .cell_attr(5, "id")
        .map(|id| id.strip_prefix("WB_").unwrap_or(id))
        .and_then(non_empty);

    Ok(MemberTrainingRole {
        role_number,
        role_title: cells.text(0),
        role_start: parse_date(&cells.text(1)).map_err(|e| CompassError::role(role_number, e.to_string()))?,
        role_status: RoleStatus::from(status),
        review_date,
        location: cells.opt_text(3),
        ta_data,
        ta_number,
        ta_name,
        completion,
        completion_type,
        completion_date,
        wood_badge_number,
    })
}

/// Completion dates are informational; an odd value keeps the role row.
fn lenient_date(text: &str, role_number: u64) -> Option<NaiveDate> {
    match parse_date(text) {
        Ok(date) => date,
        Err(e) => {
            tracing::debug!(role_number, error = %e, "Ignoring unparseable completion date");
            None
        }
    }
}

/// Mandatory ongoing learning: GDPR comes from the latest validated GDPR
/// module across all plans; the other categories have dedicated rows.
fn compile_ongoing_learning(
    page: &Page,
    plps: &BTreeMap<u64, Vec<MemberTrainingModule>>,
    membership_number: MembershipNumber,
) -> Result<MemberMandatoryTraining> {
    let mut mandatory = MemberMandatoryTraining::default();

    mandatory.gdpr.completed_date = plps
        .values()
        .flatten()
        .filter(|module| module.code.as_deref() == Some("GDPR"))
        .filter_map(|module| module.validated_date)
        .max();

    for row in page.document().select(&ONGOING_ROWS) {
        let code = row.value().attr("data-ng_code").unwrap_or_default();
        let target = match code {
            "SA" => &mut mandatory.safety,
            "SG" => &mut mandatory.safeguarding,
            "FA" => &mut mandatory.first_aid,
            other => {
                tracing::debug!(membership_number, code = other, "Ignoring unknown ongoing learning code");
                continue;
            }
        };

        let cells: HashMap<&str, String> = element_children(row)
            .map(|cell| {
                let id = cell.value().attr("id").unwrap_or("<None>");
                (id.split('_').next().unwrap_or(id), text_of(cell))
            })
            .collect();
        let date = |key: &str| {
            parse_date(cells.get(key).map(String::as_str).unwrap_or_default())
                .map_err(|e| CompassError::member(membership_number, format!("{code}: {e}")))
        };

        *target = OngoingLearning {
            completed_date: date("tdLastComplete")?,
            renewal_date: date("tdRenewal")?,
        };
    }

    Ok(mandatory)
}
