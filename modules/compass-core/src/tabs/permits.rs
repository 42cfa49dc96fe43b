use std::sync::LazyLock;

use scraper::Selector;

use crate::coerce::{non_empty, parse_date};
use crate::error::{CompassError, Result};
use crate::html::{selector, Page, RowReader, DENIED_PROFILE_ACTION};
use crate::types::{MemberPermit, MembershipNumber};

static ROWS: LazyLock<Selector> =
    LazyLock::new(|| selector(r#"table#tbl_p4_permits tr[class="msTR msTRPERM"]"#));

/// Parse the Permits tab. A revoked permit has no expiry date.
pub fn parse_permits_tab(html: &[u8], membership_number: MembershipNumber) -> Result<Vec<MemberPermit>> {
    let page = Page::parse(html);
    page.ensure_access(DENIED_PROFILE_ACTION, membership_number)?;

    let mut permits = Vec::new();
    for row in page.document().select(&ROWS) {
        // Log-and-skip: one bad permit row does not hide the others.
        match parse_permit_row(&RowReader::new(row), membership_number) {
            Ok(permit) => permits.push(permit),
            Err(e) => tracing::warn!(membership_number, error = %e, "Skipping unparseable permit row"),
        }
    }
    Ok(permits)
}

fn parse_permit_row(cells: &RowReader<'_>, membership_number: MembershipNumber) -> Result<MemberPermit> {
    let expires_text = cells.text(5);
    let expires = if expires_text == "Revoked" {
        None
    } else {
        parse_date(&expires_text).map_err(|e| CompassError::member(membership_number, e.to_string()))?
    };

    Ok(MemberPermit {
        membership_number,
        permit_type: cells.text(1),
        category: cells.text(2),
        kind: cells.text(3),
        restrictions: cells.text(4),
        expires,
        status: cells.cell_attr(5, "class").and_then(non_empty),
    })
}
