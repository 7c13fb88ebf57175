//! Distinguished-name fragment extraction.
//!
//! Directory entries carry structured information in their DN strings, e.g.
//! `CN=Jane Doe,OU=Sales,DC=example,DC=com`. These helpers pull out the
//! fragments the client cares about by scanning the comma-separated
//! `KEY=value` components. They operate purely on the string structure and
//! are deliberately lenient: an input that is not a well-formed DN simply
//! yields nothing. Attribute values the directory hands back (such as a
//! `manager` DN) are not guaranteed to parse strictly.

/// Returns the value of the first `CN=` component in the DN.
///
/// The value runs up to the next comma. Matching is independent of the
/// component's position within the DN and is case-sensitive on the key.
#[must_use]
pub fn common_name(dn: &str) -> Option<&str> {
    components(dn).find_map(|component| component.strip_prefix("CN="))
}

/// Returns every `OU=` value in the DN, in left-to-right order.
///
/// The order matches the outermost-to-innermost organisational-unit chain as
/// written in the DN string.
#[must_use]
pub fn organisation_units(dn: &str) -> Vec<&str> {
    components(dn)
        .filter_map(|component| component.strip_prefix("OU="))
        .collect()
}

fn components(dn: &str) -> impl Iterator<Item = &str> {
    dn.split(',').map(str::trim_start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_name_at_start() {
        let dn = "CN=Some Guy,OU=Operations,OU=MYC Users,DC=myc,DC=mycompany,DC=net";
        assert_eq!(common_name(dn), Some("Some Guy"));
    }

    #[test]
    fn common_name_at_end() {
        let dn = "OU=Operations,OU=MYC Users,DC=myc,DC=mycompany,DC=net,CN=Some Guy";
        assert_eq!(common_name(dn), Some("Some Guy"));
    }

    #[test]
    fn common_name_only_component() {
        assert_eq!(common_name("CN=Some Guy"), Some("Some Guy"));
    }

    #[test]
    fn common_name_absent() {
        let dn = "OU=Operations,OU=MYC Users,DC=myc,DC=mycompany,DC=net";
        assert_eq!(common_name(dn), None);
    }

    #[test]
    fn common_name_takes_first_match() {
        let dn = "CN=First,OU=People,CN=Second";
        assert_eq!(common_name(dn), Some("First"));
    }

    #[test]
    fn common_name_key_is_case_sensitive() {
        assert_eq!(common_name("cn=lowercase,dc=example"), None);
    }

    #[test]
    fn organisation_units_in_order() {
        let dn = "CN=Some Guy,OU=Operations,OU=MYC Users,DC=myc,DC=net";
        assert_eq!(organisation_units(dn), vec!["Operations", "MYC Users"]);
    }

    #[test]
    fn organisation_units_absent() {
        assert_eq!(
            organisation_units("CN=Some Guy,DC=myc,DC=net"),
            Vec::<&str>::new()
        );
    }

    #[test]
    fn organisation_units_tolerate_spacing() {
        let dn = "CN=Some Guy, OU=Operations, OU=Disabled Users";
        assert_eq!(organisation_units(dn), vec!["Operations", "Disabled Users"]);
    }

    #[test]
    fn garbage_input_yields_nothing() {
        assert_eq!(common_name("not a dn at all"), None);
        assert!(organisation_units("not a dn at all").is_empty());
    }
}
