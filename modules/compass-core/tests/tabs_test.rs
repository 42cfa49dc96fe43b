//! Profile tab parsers against saved portal pages.
//!
//! Fixtures live in `tests/fixtures/` and mirror the markup the portal
//! renders for a privileged viewer, trimmed to the parts the parsers read.

use chrono::NaiveDate;
use compass_core::tabs::{
    parse_awards_tab, parse_disclosures_tab, parse_permits_tab, parse_personal_tab, parse_roles_tab,
    parse_training_tab,
};
use compass_core::{CompassError, RoleStatus, RolesOptions, DAYS_PER_YEAR};

const PERSONAL: &[u8] = include_bytes!("fixtures/personal.html");
const PERSONAL_RESTRICTED: &[u8] = include_bytes!("fixtures/personal_restricted.html");
const ROLES: &[u8] = include_bytes!("fixtures/roles.html");
const PERMITS: &[u8] = include_bytes!("fixtures/permits.html");
const AWARDS: &[u8] = include_bytes!("fixtures/awards.html");
const DISCLOSURES: &[u8] = include_bytes!("fixtures/disclosures.html");
const TRAINING: &[u8] = include_bytes!("fixtures/training.html");

const DENIED: &[u8] =
    br#"<html><body><form method="post" action="./ScoutsPortal.aspx?Invalid=AccessCN"></form></body></html>"#;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn today() -> NaiveDate {
    d(2020, 8, 31)
}

// ---------------------------------------------------------------------------
// Access denied
// ---------------------------------------------------------------------------

#[test]
fn every_profile_tab_rejects_the_access_sentinel() {
    let results = [
        parse_personal_tab(DENIED, 12345).err(),
        parse_roles_tab(DENIED, 12345, &RolesOptions::default(), today()).err(),
        parse_permits_tab(DENIED, 12345).err(),
        parse_awards_tab(DENIED, 12345).err(),
        parse_disclosures_tab(DENIED, 12345).err(),
        parse_training_tab(DENIED, 12345, false).err(),
    ];

    for err in results {
        let err = err.expect("denied page must fail");
        assert!(matches!(err, CompassError::PermissionDenied { .. }), "got {err:?}");
        assert_eq!(err.to_string(), "You do not have permission to the details of 12345");
    }
}

// ---------------------------------------------------------------------------
// Personal
// ---------------------------------------------------------------------------

#[test]
fn personal_tab_reads_positional_and_labelled_fields() {
    let details = parse_personal_tab(PERSONAL, 12345).unwrap();

    assert_eq!(details.membership_number, 12345);
    assert_eq!(details.name.as_deref(), Some("Jane Mary Bloggs"));
    assert_eq!(details.known_as.as_deref(), Some("Jane"));
    assert_eq!(details.forenames.as_deref(), Some("Jane"));
    assert_eq!(details.surname.as_deref(), Some("Mary Bloggs"));
    assert_eq!(details.join_date, Some(d(2008, 9, 1)));
    assert_eq!(details.birth_date, Some(d(1990, 3, 12)));
    assert_eq!(details.sex.as_deref(), Some("Female"));
    assert_eq!(details.nationality.as_deref(), Some("British"));
    assert_eq!(details.ethnicity.as_deref(), Some("Prefer not to say"));
    assert_eq!(details.religion.as_deref(), Some("Quaker"));
    assert_eq!(details.occupation.as_deref(), Some("Civil Engineer"));
    assert_eq!(details.main_phone.as_deref(), Some("07700 900123"));
    assert_eq!(details.main_email.as_deref(), Some("jane@example.org"));

    assert_eq!(details.address.street.as_deref(), Some("12 High St"));
    assert_eq!(details.address.town.as_deref(), Some("Anytown"));
    assert_eq!(details.address.county.as_deref(), Some("Anyshire"));
    assert_eq!(details.address.postcode.as_deref(), Some("AB1 2CD"));
    assert_eq!(details.address.country.as_deref(), Some("UK"));
}

#[test]
fn personal_tab_without_admin_fields_leaves_them_empty() {
    let details = parse_personal_tab(PERSONAL_RESTRICTED, 67890).unwrap();

    assert_eq!(details.name.as_deref(), Some("Sam Smith"));
    assert_eq!(details.forenames.as_deref(), Some("Sam"));
    assert_eq!(details.surname.as_deref(), Some("Smith"));
    assert_eq!(details.join_date, None, "Unknown join date is no date");
    assert_eq!(details.birth_date, None);
    assert_eq!(details.sex, None);
    assert_eq!(details.main_email, None);
    assert!(details.address.is_empty());
}

#[test]
fn personal_tab_is_idempotent() {
    assert_eq!(
        parse_personal_tab(PERSONAL, 12345).unwrap(),
        parse_personal_tab(PERSONAL, 12345).unwrap()
    );
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[test]
fn roles_tab_drops_non_volunteer_roles_by_default() {
    let collection = parse_roles_tab(ROLES, 12345, &RolesOptions::default(), today()).unwrap();

    let numbers: Vec<u64> = collection.roles.keys().copied().collect();
    assert_eq!(numbers, vec![1001, 1003, 1005]);

    let leader = &collection.roles[&1001];
    assert_eq!(leader.role_title, "Cub Scout Leader");
    assert_eq!(leader.role_class, "Leader");
    assert_eq!(leader.role_type.as_deref(), Some("Section Leader"));
    assert_eq!(leader.location_id, Some(20001));
    assert_eq!(leader.location_name.as_deref(), Some("1st Anytown"));
    assert_eq!(leader.role_start, Some(d(2008, 9, 1)));
    assert_eq!(leader.role_end, None);
    assert_eq!(leader.role_status, RoleStatus::Full);
    assert_eq!(leader.review_date, Some(d(2025, 9, 1)));
    assert!(leader.can_view_details);

    let explorer = &collection.roles[&1005];
    assert_eq!(explorer.role_type, None);
    assert_eq!(explorer.location_id, None);
    assert_eq!(explorer.location_name.as_deref(), Some("Anytown District"));
    assert!(!explorer.can_view_details);

    assert_eq!(collection.roles[&1003].role_status, RoleStatus::Cancelled);
}

#[test]
fn membership_duration_counts_only_active_volunteer_roles() {
    let collection = parse_roles_tab(ROLES, 12345, &RolesOptions::default(), today()).unwrap();

    // 2008-09-01..=2020-08-31 plus 2006-01-01..=2007-12-31
    let expected = (4383.0 + 730.0) / DAYS_PER_YEAR;
    assert!((collection.membership_duration - expected).abs() < 1e-9);
}

#[test]
fn kept_non_volunteer_roles_do_not_change_duration() {
    let default = parse_roles_tab(ROLES, 12345, &RolesOptions::default(), today()).unwrap();
    let keep = RolesOptions::default().keep_non_volunteer_roles();
    let all = parse_roles_tab(ROLES, 12345, &keep, today()).unwrap();

    let numbers: Vec<u64> = all.roles.keys().copied().collect();
    assert_eq!(numbers, vec![1001, 1002, 1003, 1004, 1005]);
    assert_eq!(all.membership_duration, default.membership_duration);
}

#[test]
fn status_filter_narrows_roles_but_not_duration() {
    let default = parse_roles_tab(ROLES, 12345, &RolesOptions::default(), today()).unwrap();
    let options = RolesOptions::default().with_statuses(["Full"]);
    let full = parse_roles_tab(ROLES, 12345, &options, today()).unwrap();

    assert_eq!(full.roles.keys().copied().collect::<Vec<_>>(), vec![1001]);
    assert_eq!(full.membership_duration, default.membership_duration);
}

#[test]
fn open_roles_run_to_today() {
    let earlier = parse_roles_tab(ROLES, 12345, &RolesOptions::default(), d(2019, 8, 31)).unwrap();
    let later = parse_roles_tab(ROLES, 12345, &RolesOptions::default(), today()).unwrap();

    let year = later.membership_duration - earlier.membership_duration;
    assert!((year - 366.0 / DAYS_PER_YEAR).abs() < 1e-9, "2020 is a leap year, got {year}");
}

#[test]
fn roles_tab_is_idempotent() {
    let options = RolesOptions::default();
    assert_eq!(
        parse_roles_tab(ROLES, 12345, &options, today()).unwrap(),
        parse_roles_tab(ROLES, 12345, &options, today()).unwrap()
    );
}

#[test]
fn roles_tab_with_no_rows_is_empty() {
    let html = br#"<html><body><form action="./MemberProfile.aspx"><table><tbody></tbody></table></form></body></html>"#;
    let collection = parse_roles_tab(html, 12345, &RolesOptions::default(), today()).unwrap();
    assert!(collection.roles.is_empty());
    assert_eq!(collection.membership_duration, 0.0);
}

// ---------------------------------------------------------------------------
// Permits, awards, disclosures
// ---------------------------------------------------------------------------

#[test]
fn permits_tab_reads_expiry_and_revocation() {
    let permits = parse_permits_tab(PERMITS, 12345).unwrap();

    // the third row has an unreadable expiry and is skipped
    assert_eq!(permits.len(), 2);

    assert_eq!(permits[0].permit_type, "Leadership");
    assert_eq!(permits[0].category, "Water");
    assert_eq!(permits[0].kind, "Canoeing");
    assert_eq!(permits[0].restrictions, "Grade 1 water only");
    assert_eq!(permits[0].expires, Some(d(2025, 12, 31)));
    assert_eq!(permits[0].status.as_deref(), Some("Active"));

    assert_eq!(permits[1].kind, "Hill Walking");
    assert_eq!(permits[1].expires, None);
    assert_eq!(permits[1].status.as_deref(), Some("Revoked"));
}

#[test]
fn awards_tab_reads_nested_properties() {
    let awards = parse_awards_tab(AWARDS, 12345).unwrap();

    assert_eq!(awards.len(), 2);
    assert_eq!(awards[0].kind, "Chief Scout's Commendation for Good Service");
    assert_eq!(awards[0].location.as_deref(), Some("Anyshire"));
    assert_eq!(awards[0].date, Some(d(2015, 5, 14)));

    assert_eq!(awards[1].kind, "Award for Merit");
    assert_eq!(awards[1].location, None);
    assert_eq!(awards[1].date, Some(d(2019, 6, 1)));
}

#[test]
fn disclosures_tab_allows_blank_cells() {
    let disclosures = parse_disclosures_tab(DISCLOSURES, 12345).unwrap();

    assert_eq!(disclosures.len(), 2);

    let issued = &disclosures[0];
    assert_eq!(issued.country.as_deref(), Some("England & Wales"));
    assert_eq!(issued.provider, "Disclosure and Barring Service");
    assert_eq!(issued.kind, "Enhanced");
    assert_eq!(issued.number.as_deref(), Some("001234567890"));
    assert_eq!(issued.issuer.as_deref(), Some("Scouts"));
    assert_eq!(issued.issue_date, Some(d(2019, 5, 2)));
    assert_eq!(issued.status, "Disclosure Issued");
    assert_eq!(issued.expiry_date, Some(d(2024, 5, 2)));

    let withdrawn = &disclosures[1];
    assert_eq!(withdrawn.country, None);
    assert_eq!(withdrawn.number, None);
    assert_eq!(withdrawn.issue_date, None);
    assert_eq!(withdrawn.expiry_date, None);
    assert_eq!(withdrawn.status, "Application Withdrawn");
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

#[test]
fn training_tab_reads_roles() {
    let tab = parse_training_tab(TRAINING, 12345, false).unwrap();

    assert_eq!(tab.roles.keys().copied().collect::<Vec<_>>(), vec![1001, 1005]);

    let leader = &tab.roles[&1001];
    assert_eq!(leader.role_title, "Cub Scout Leader");
    assert_eq!(leader.role_start, Some(d(2008, 9, 1)));
    assert_eq!(leader.role_status, RoleStatus::Full);
    assert_eq!(leader.review_date, Some(d(2025, 9, 1)));
    assert_eq!(leader.location.as_deref(), Some("1st Anytown"));
    assert_eq!(leader.ta_number, Some(54321));
    assert_eq!(leader.ta_name.as_deref(), Some("Tom Trainer"));
    assert_eq!(leader.completion_type.as_deref(), Some("Wood Badge"));
    assert_eq!(leader.completion_date, Some(d(2012, 1, 12)));
    assert_eq!(leader.wood_badge_number.as_deref(), Some("1234567"));

    let explorer = &tab.roles[&1005];
    assert_eq!(explorer.role_status, RoleStatus::Provisional);
    assert_eq!(explorer.review_date, None);
    assert_eq!(explorer.ta_data, None);
    assert_eq!(explorer.completion, None);
    assert_eq!(explorer.wood_badge_number, None);
}

#[test]
fn training_tab_reads_learning_plans() {
    let tab = parse_training_tab(TRAINING, 12345, false).unwrap();

    assert_eq!(tab.plps.keys().copied().collect::<Vec<_>>(), vec![5001, 5002]);

    // the hidden module row is not a plain module row
    let first = &tab.plps[&5001];
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].pk, 9001);
    assert_eq!(first[0].module_id, 101);
    assert_eq!(first[0].code.as_deref(), Some("M01"));
    assert_eq!(first[0].name.as_deref(), Some("Essential Information"));
    assert_eq!(first[0].learning_required, Some(true));
    assert_eq!(first[0].learning_method.as_deref(), Some("E-Learning"));
    assert_eq!(first[0].learning_completed, Some(d(2008, 9, 2)));
    assert_eq!(first[0].validated_membership_number, Some(54321));
    assert_eq!(first[0].validated_name.as_deref(), Some("Tom Trainer"));
    assert_eq!(first[0].validated_date, Some(d(2008, 9, 3)));

    let second = &tab.plps[&5002];
    assert_eq!(second[0].learning_required, Some(false));
    assert_eq!(second[1].code.as_deref(), Some("M03"));
    assert_eq!(second[1].validated_date, None);
    assert_eq!(second[1].validated_membership_number, None);
}

#[test]
fn mandatory_training_takes_latest_gdpr_and_dedicated_rows() {
    let tab = parse_training_tab(TRAINING, 12345, false).unwrap();
    let mandatory = &tab.mandatory;

    assert_eq!(mandatory.gdpr.completed_date, Some(d(2021, 3, 10)));
    assert_eq!(mandatory.gdpr.renewal_date, None);
    assert_eq!(mandatory.safety.completed_date, Some(d(2020, 1, 15)));
    assert_eq!(mandatory.safety.renewal_date, Some(d(2023, 1, 15)));
    assert_eq!(mandatory.safeguarding.completed_date, Some(d(2020, 1, 16)));
    assert_eq!(mandatory.safeguarding.renewal_date, Some(d(2023, 1, 16)));
    assert_eq!(mandatory.first_aid.completed_date, Some(d(2019, 6, 20)));
    assert_eq!(mandatory.first_aid.renewal_date, Some(d(2022, 6, 20)));
}

#[test]
fn ongoing_only_keeps_gdpr_modules() {
    let full = parse_training_tab(TRAINING, 12345, false).unwrap();
    let ongoing = parse_training_tab(TRAINING, 12345, true).unwrap();

    for modules in ongoing.plps.values() {
        assert!(modules.iter().all(|module| module.code.as_deref() == Some("GDPR")));
    }
    assert_eq!(ongoing.plps[&5001].len(), 1);
    assert_eq!(ongoing.plps[&5002].len(), 1);
    assert_eq!(ongoing.mandatory, full.mandatory);
}

#[test]
fn training_tab_is_idempotent() {
    assert_eq!(
        parse_training_tab(TRAINING, 12345, false).unwrap(),
        parse_training_tab(TRAINING, 12345, false).unwrap()
    );
}

#[test]
fn training_tab_without_ongoing_rows_has_empty_mandatory() {
    let html = br#"<html><body><form action="./MemberProfile.aspx"><table id="tbl_p5_TrainModules"></table></form></body></html>"#;
    let tab = parse_training_tab(html, 12345, false).unwrap();
    assert!(tab.roles.is_empty());
    assert!(tab.plps.is_empty());
    assert_eq!(tab.mandatory, Default::default());
}
