use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Selector};

use crate::address::Address;
use crate::coerce::{non_empty, parse_date};
use crate::error::{CompassError, Result};
use crate::html::{label_sibling_text, selector, text_of, Page, DENIED_PROFILE_ACTION};
use crate::types::{MemberDetails, MembershipNumber};

static PROFILE: LazyLock<Selector> = LazyLock::new(|| selector("#divProfile0"));
static FULL_NAME: LazyLock<Selector> =
    LazyLock::new(|| selector("tr:nth-of-type(1) > td:nth-of-type(2) > label"));
static KNOWN_AS: LazyLock<Selector> =
    LazyLock::new(|| selector("tr:nth-of-type(2) > td:nth-of-type(2) > label"));
static JOIN_DATE: LazyLock<Selector> =
    LazyLock::new(|| selector("tr:nth-of-type(4) > td:nth-of-type(2) > label"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("body"));

/// Parse the Personal Details tab.
///
/// Administrative fields (birth date, nationality, ...) are only rendered for
/// privileged viewers and are `None` otherwise.
pub fn parse_personal_tab(html: &[u8], membership_number: MembershipNumber) -> Result<MemberDetails> {
    let page = Page::parse(html);
    page.ensure_access(DENIED_PROFILE_ACTION, membership_number)?;

    // "Scout - <number> <forenames> <surname ...>"
    let title = page.title().unwrap_or_default();
    let mut names = title.split_whitespace().skip(3);
    let forenames = names.next().map(str::to_string);
    let surname = non_empty(names.collect::<Vec<_>>().join(" "));

    let profile = page.select_first(&PROFILE);
    let in_profile = |label: &str| profile.and_then(|scope| label_text(scope, label, 2, 1));
    let positional = |sel: &Selector| {
        profile
            .and_then(|scope| scope.select(sel).next())
            .map(text_of)
            .and_then(non_empty)
    };

    let join_date = match positional(&JOIN_DATE) {
        Some(text) if text == "Unknown" => None,
        Some(text) => date_field(membership_number, "join_date", &text)?,
        None => None,
    };
    let birth_date = match in_profile("Date of Birth:") {
        Some(text) => date_field(membership_number, "birth_date", &text)?,
        None => None,
    };

    let body = page.select_first(&BODY);
    let in_body = |label: &str| body.and_then(|scope| label_text(scope, label, 3, 2));

    let details = MemberDetails {
        membership_number,
        name: positional(&FULL_NAME),
        known_as: positional(&KNOWN_AS),
        forenames,
        surname,
        birth_date,
        sex: in_profile("Gender:"),
        nationality: in_profile("Nationality:"),
        ethnicity: in_profile("Ethnicity:"),
        religion: in_profile("Religion/Faith:"),
        occupation: in_profile("Occupation:"),
        join_date,
        address: Address::parse(&in_body("Address").unwrap_or_default()),
        main_phone: in_body("Phone"),
        main_email: in_body("Email"),
    };

    tracing::debug!(membership_number, "Parsed personal tab");
    Ok(details)
}

fn label_text(scope: ElementRef<'_>, label: &str, levels: usize, cell: usize) -> Option<String> {
    label_sibling_text(scope, label, levels, cell).and_then(non_empty)
}

fn date_field(
    membership_number: MembershipNumber,
    field: &str,
    text: &str,
) -> Result<Option<NaiveDate>> {
    parse_date(text).map_err(|e| CompassError::member(membership_number, format!("{field}: {e}")))
}
