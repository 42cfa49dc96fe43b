use std::sync::LazyLock;

use scraper::Selector;

use crate::coerce::parse_date;
use crate::error::{CompassError, Result};
use crate::html::{selector, Page, RowReader, DENIED_PROFILE_ACTION};
use crate::types::{MemberDisclosure, MembershipNumber};

static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("tbody > tr"));

/// Parse the Disclosures tab.
///
/// Country, number, issuer and both dates are blank on withdrawn
/// applications; blank cells become `None` rather than failing the row.
pub fn parse_disclosures_tab(
    html: &[u8],
    membership_number: MembershipNumber,
) -> Result<Vec<MemberDisclosure>> {
    let page = Page::parse(html);
    page.ensure_access(DENIED_PROFILE_ACTION, membership_number)?;

    let mut disclosures = Vec::new();
    for row in page.document().select(&ROWS) {
        let cells = RowReader::new(row);
        if cells.len() < 8 {
            tracing::debug!(membership_number, cells = cells.len(), "Skipping short disclosure row");
            continue;
        }
        // Log-and-skip per disclosure.
        match parse_disclosure_row(&cells, membership_number) {
            Ok(disclosure) => disclosures.push(disclosure),
            Err(e) => tracing::warn!(membership_number, error = %e, "Skipping unparseable disclosure row"),
        }
    }
    Ok(disclosures)
}

fn parse_disclosure_row(
    cells: &RowReader<'_>,
    membership_number: MembershipNumber,
) -> Result<MemberDisclosure> {
    let date = |index: usize| {
        parse_date(&cells.text(index)).map_err(|e| CompassError::member(membership_number, e.to_string()))
    };

    Ok(MemberDisclosure {
        membership_number,
        country: cells.opt_text(0),
        provider: cells.text(1),
        kind: cells.text(2),
        number: cells.opt_text(3),
        issuer: cells.opt_text(4),
        issue_date: date(5)?,
        status: cells.text(6),
        expiry_date: date(7)?,
    })
}
