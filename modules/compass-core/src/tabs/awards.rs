use std::sync::LazyLock;

use scraper::Selector;

use crate::coerce::{non_empty, parse_date};
use crate::error::{CompassError, Result};
use crate::html::{nth_child, selector, table_rows, Page, RowReader, DENIED_PROFILE_ACTION};
use crate::types::{MemberAward, MembershipNumber};

static TABLE: LazyLock<Selector> = LazyLock::new(|| selector(r#"table[class="msAward"]"#));

/// Parse the Awards tab.
///
/// Each award row keeps its properties (type, location, date) in a nested
/// table in the second cell, one property per row.
pub fn parse_awards_tab(html: &[u8], membership_number: MembershipNumber) -> Result<Vec<MemberAward>> {
    let page = Page::parse(html);
    page.ensure_access(DENIED_PROFILE_ACTION, membership_number)?;

    let mut awards = Vec::new();
    for table in page.document().select(&TABLE) {
        for row in table_rows(table) {
            // Log-and-skip per award.
            match parse_award_row(&RowReader::new(row), membership_number) {
                Ok(award) => awards.push(award),
                Err(e) => tracing::warn!(membership_number, error = %e, "Skipping unparseable award row"),
            }
        }
    }
    Ok(awards)
}

fn parse_award_row(cells: &RowReader<'_>, membership_number: MembershipNumber) -> Result<MemberAward> {
    let props = cells
        .cell(1)
        .and_then(|cell| nth_child(cell, 0))
        .ok_or_else(|| CompassError::member(membership_number, "award row has no properties table"))?;
    let props = table_rows(props);
    let prop = |index: usize| {
        props
            .get(index)
            .map(|row| RowReader::new(*row).text(1))
            .unwrap_or_default()
    };

    let kind = prop(0);
    if kind.is_empty() {
        return Err(CompassError::member(membership_number, "award has no type"));
    }

    Ok(MemberAward {
        membership_number,
        kind,
        location: non_empty(prop(1)),
        date: parse_date(&prop(2)).map_err(|e| CompassError::member(membership_number, e.to_string()))?,
    })
}
