// crates/repo-law-rules/src/removal.rs
// ============================================================================
// Module: Removal Sets
// Description: Difference between remote entries and declared entries.
// Purpose: Decide which remote environments or secrets a rule deletes.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Reconciliation deletes exactly the remote entries the repository does not
//! declare. Declared entries are never part of the result, whatever their
//! position in either list.

use std::collections::BTreeSet;

/// Returns the remote entries absent from `declared`, in remote order.
#[must_use]
pub fn removal_set<'a, I, D>(remote: I, declared: D) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
    D: IntoIterator<Item = &'a str>,
{
    let declared: BTreeSet<&str> = declared.into_iter().collect();
    remote.into_iter().filter(|name| !declared.contains(name)).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::removal_set;

    #[test]
    fn keeps_only_undeclared_entries_in_remote_order() {
        let remote = ["staging", "prod", "legacy", "preview"];
        let declared = ["prod", "staging"];
        assert_eq!(removal_set(remote, declared), vec!["legacy", "preview"]);
    }

    #[test]
    fn declared_entries_are_never_removed() {
        // Regression: the set must be remote minus declared, not the reverse.
        let remote = ["prod"];
        let declared = ["prod", "qa"];
        assert!(removal_set(remote, declared).is_empty());
    }

    #[test]
    fn nothing_declared_removes_everything() {
        assert_eq!(removal_set(["a", "b"], Vec::<&str>::new()), vec!["a", "b"]);
    }
}
