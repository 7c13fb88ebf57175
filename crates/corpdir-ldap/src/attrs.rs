//! Attribute-list normalization.
//!
//! Every query made by the client needs a small mandatory attribute set on
//! top of whatever the caller configured, without requesting anything twice.

/// Attributes requested on every user query regardless of configuration.
///
/// `dn` is the distinguished-name marker understood by the protocol library;
/// the rest back the derived [`Person`](crate::Person) fields.
pub const DEFAULT_ATTRIBUTES: &[&str] = &["dn", "givenName", "sn", "mail", "title"];

/// Merges the requested attribute list with [`DEFAULT_ATTRIBUTES`].
///
/// The original order of `requested` is preserved, missing defaults are
/// appended in their canonical order, and no name appears twice in the
/// result (exact string match). Normalizing an already-normalized list
/// yields the same list.
#[must_use]
pub fn normalize_attributes(requested: &[String]) -> Vec<String> {
    let mut merged = Vec::with_capacity(requested.len() + DEFAULT_ATTRIBUTES.len());
    for name in requested {
        push_unique(&mut merged, name);
    }
    for name in DEFAULT_ATTRIBUTES {
        push_unique(&mut merged, name);
    }
    merged
}

/// Extends a normalized list with extra attribute names, skipping names
/// already present.
#[must_use]
pub(crate) fn with_extra(normalized: &[String], extra: &[&str]) -> Vec<String> {
    let mut merged = normalized.to_vec();
    for name in extra {
        push_unique(&mut merged, name);
    }
    merged
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|existing| existing == name) {
        list.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn appends_missing_defaults_in_canonical_order() {
        let normalized = normalize_attributes(&strings(&["sAMAccountName", "mail"]));
        assert_eq!(
            normalized,
            strings(&["sAMAccountName", "mail", "dn", "givenName", "sn", "title"])
        );
    }

    #[test]
    fn empty_request_yields_defaults() {
        assert_eq!(
            normalize_attributes(&[]),
            strings(&["dn", "givenName", "sn", "mail", "title"])
        );
    }

    #[test]
    fn idempotent() {
        let once = normalize_attributes(&strings(&["description", "title"]));
        let twice = normalize_attributes(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn no_duplicates_even_in_requested() {
        let normalized = normalize_attributes(&strings(&["mail", "mail", "sn"]));
        assert_eq!(normalized, strings(&["mail", "sn", "dn", "givenName", "title"]));
    }

    #[test]
    fn matching_is_exact() {
        // "Mail" is a different name than the default "mail".
        let normalized = normalize_attributes(&strings(&["Mail"]));
        assert!(normalized.contains(&"Mail".to_string()));
        assert!(normalized.contains(&"mail".to_string()));
    }

    #[test]
    fn with_extra_skips_present_names() {
        let normalized = normalize_attributes(&[]);
        let extended = with_extra(&normalized, &["dn", "manager"]);
        assert_eq!(
            extended,
            strings(&["dn", "givenName", "sn", "mail", "title", "manager"])
        );
    }
}
