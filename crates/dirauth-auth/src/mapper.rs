//! Group membership mapping
//!
//! Pure functions turning directory results into group flags. Output depends
//! only on the entries and the catalog: any match wins, enumeration order
//! does not matter.

use dirauth_core::{
    AuthenticationResult, DirectoryEntry, Error, GroupCatalog, GROUP_RDN_PREFIX,
};
use std::collections::BTreeMap;

/// Case-insensitive `cn=<group name>` prefix test.
///
/// Membership values are usually full DNs (`CN=Admins,OU=Groups,DC=x`); only
/// the leading segment has to match.
pub fn matches_group(value: &str, group_name: &str) -> bool {
    let expected = format!("{}{}", GROUP_RDN_PREFIX, group_name).to_lowercase();
    value.to_lowercase().starts_with(&expected)
}

/// Fold one user entry into `result`.
///
/// Every requested attribute present on the entry surfaces its first value,
/// and every value is tested against every catalog group. A match grants the
/// group and marks the result authenticated.
pub fn absorb_domain_entry(
    result: &mut AuthenticationResult,
    entry: &DirectoryEntry,
    requested: &[String],
    catalog: &GroupCatalog,
) -> Result<(), Error> {
    if !entry.has_any(requested) {
        return Err(Error::MissingAttributes(entry.dn.clone()));
    }

    for name in requested {
        let Some(values) = entry.attribute(name) else {
            continue;
        };

        for value in values {
            result.surface_attribute(name, value);

            for (key, group_name) in catalog.iter() {
                if matches_group(value, group_name) {
                    result.grant(key);
                    result.authenticated = true;
                }
            }
        }
    }

    Ok(())
}

/// Map domain-directory user entries to a total result.
///
/// Entries carrying none of the requested attributes are skipped and
/// returned as `MissingAttributes` errors.
pub fn map_domain_entries(
    entries: &[DirectoryEntry],
    requested: &[String],
    catalog: &GroupCatalog,
) -> (AuthenticationResult, Vec<Error>) {
    let mut result = AuthenticationResult::new();
    let mut rejected = Vec::new();

    for entry in entries {
        if let Err(e) = absorb_domain_entry(&mut result, entry, requested, catalog) {
            rejected.push(e);
        }
    }

    result.complete(catalog);
    (result, rejected)
}

/// Whether any group entry lists `username` in its member attribute.
///
/// This is a substring test over the joined attribute values.
pub fn member_listed(entries: &[DirectoryEntry], member_attribute: &str, username: &str) -> bool {
    entries.iter().any(|entry| {
        entry
            .joined_values(member_attribute)
            .is_some_and(|members| members.contains(username))
    })
}

/// Map legacy per-group search results to a total flag mapping.
///
/// `found` holds the search results for each group key whose search
/// succeeded; keys absent from it end up `false`.
pub fn map_legacy_groups(
    found: &BTreeMap<String, Vec<DirectoryEntry>>,
    catalog: &GroupCatalog,
    member_attribute: &str,
    username: &str,
) -> BTreeMap<String, bool> {
    catalog
        .keys()
        .map(|key| {
            let member = found
                .get(key)
                .is_some_and(|entries| member_listed(entries, member_attribute, username));
            (key.to_string(), member)
        })
        .collect()
}
