//! Person snapshot mapped from a directory search result.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::client::LdapEntry;
use crate::dn;

/// Markers in a DN that indicate a deprovisioned or disabled account.
const DEACTIVATION_MARKERS: &[&str] = &["Deprovisioned", "OU=Disabled Users"];

/// Snapshot of one directory entry at query time.
///
/// Constructed once per search-result entry and immutable afterwards; owned
/// solely by the caller that receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Distinguished name of the entry.
    pub dn: String,
    /// False if the DN carries a deprovisioning or disablement marker.
    pub is_active: bool,
    /// Given name (first name), from the `givenName` attribute.
    pub given_name: String,
    /// Surname (last name), from the `sn` attribute.
    pub last_name: String,
    /// Primary email address, from the `mail` attribute.
    pub email: String,
    /// Job title, from the `title` attribute.
    pub title: String,
    /// Common name extracted from the `manager` attribute's DN value.
    pub manager: String,
    /// Organisational-unit chain from the DN, outermost to innermost.
    pub organisation_units: Vec<String>,
    /// First value of every attribute requested for the query, defaults
    /// included; empty string where the entry lacks the attribute.
    pub attributes: HashMap<String, String>,
}

impl Person {
    /// Maps a raw search-result entry into a [`Person`].
    ///
    /// `requested` is the attribute list the query was issued with; every
    /// name in it gets an entry in [`Person::attributes`].
    #[must_use]
    pub fn from_entry(entry: &LdapEntry, requested: &[String]) -> Self {
        let attributes: HashMap<String, String> = requested
            .iter()
            .map(|name| {
                let value = entry.first(name).unwrap_or_default();
                (name.clone(), value.to_string())
            })
            .collect();

        let attr = |name: &str| attributes.get(name).cloned().unwrap_or_default();
        let manager = dn::common_name(&attr("manager"))
            .unwrap_or_default()
            .to_string();
        let organisation_units = dn::organisation_units(&entry.dn)
            .into_iter()
            .map(ToString::to_string)
            .collect();

        Self {
            dn: entry.dn.clone(),
            is_active: !is_deactivated(&entry.dn),
            given_name: attr("givenName"),
            last_name: attr("sn"),
            email: attr("mail"),
            title: attr("title"),
            manager,
            organisation_units,
            attributes,
        }
    }
}

fn is_deactivated(dn: &str) -> bool {
    DEACTIVATION_MARKERS
        .iter()
        .any(|marker| dn.contains(marker))
}
