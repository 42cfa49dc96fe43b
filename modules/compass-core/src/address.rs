use serde::{Deserialize, Serialize};

/// A postal address decomposed from the single string the portal renders,
/// e.g. `12 High St, Anytown, Anyshire. AB1 2CD UK`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub unparsed_address: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
    pub county: Option<String>,
    pub town: Option<String>,
    pub street: Option<String>,
}

impl Address {
    /// Split an address positionally.
    ///
    /// The text after the last `". "` is `"<postcode> <country>"`; the text
    /// before it is street, town and (when there are three comma segments)
    /// county. Malformed input degrades to whichever parts can be found.
    pub fn parse(address: &str) -> Self {
        if address.is_empty() {
            return Self::default();
        }

        let mut parsed = Self {
            unparsed_address: Some(address.to_string()),
            ..Self::default()
        };

        let (body, code) = match address.rsplit_once(". ") {
            Some((body, code)) => (body, Some(code)),
            None => (address, None),
        };

        if let Some(code) = code {
            match code.rsplit_once(' ') {
                Some((postcode, country)) => {
                    parsed.postcode = non_empty(postcode);
                    parsed.country = non_empty(country);
                }
                None => parsed.postcode = non_empty(code),
            }
        }

        let segments: Vec<&str> = body.rsplitn(3, ", ").collect();
        match segments.as_slice() {
            [county, town, street] => {
                parsed.street = non_empty(street);
                parsed.town = non_empty(town);
                parsed.county = non_empty(county);
            }
            [town, street] => {
                parsed.street = non_empty(street);
                parsed.town = non_empty(town);
            }
            [street] => parsed.street = non_empty(street),
            _ => {}
        }

        parsed
    }

    pub fn is_empty(&self) -> bool {
        self.unparsed_address.is_none()
    }
}

fn non_empty(value: &str) -> Option<String> {
    crate::coerce::non_empty(value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_segments_has_county() {
        let address = Address::parse("12 High St, Anytown, Anyshire. AB1 2CD UK");
        assert_eq!(address.street.as_deref(), Some("12 High St"));
        assert_eq!(address.town.as_deref(), Some("Anytown"));
        assert_eq!(address.county.as_deref(), Some("Anyshire"));
        assert_eq!(address.postcode.as_deref(), Some("AB1 2CD"));
        assert_eq!(address.country.as_deref(), Some("UK"));
        assert_eq!(
            address.unparsed_address.as_deref(),
            Some("12 High St, Anytown, Anyshire. AB1 2CD UK")
        );
    }

    #[test]
    fn two_segments_has_no_county() {
        let address = Address::parse("12 High St, Anytown. AB1 2CD UK");
        assert_eq!(address.street.as_deref(), Some("12 High St"));
        assert_eq!(address.town.as_deref(), Some("Anytown"));
        assert_eq!(address.county, None);
        assert_eq!(address.postcode.as_deref(), Some("AB1 2CD"));
    }

    #[test]
    fn long_street_keeps_extra_commas() {
        let address = Address::parse("Flat 2, 12 High St, Anytown, Anyshire. AB1 2CD UK");
        assert_eq!(address.street.as_deref(), Some("Flat 2, 12 High St"));
        assert_eq!(address.county.as_deref(), Some("Anyshire"));
    }

    #[test]
    fn empty_is_all_none() {
        let address = Address::parse("");
        assert!(address.is_empty());
        assert_eq!(address, Address::default());
    }

    #[test]
    fn degenerate_input_keeps_original() {
        let address = Address::parse("Somewhere");
        assert_eq!(address.unparsed_address.as_deref(), Some("Somewhere"));
        assert_eq!(address.street.as_deref(), Some("Somewhere"));
        assert_eq!(address.postcode, None);
    }
}
