use crate::report::PageEntry;
use crate::store::{CheckKey, ManualCheckStore, StorageBackend};
use serde::{Deserialize, Serialize};

/// Counts shown in the summary panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Records the report verified automatically
    pub verified: usize,
    /// Records (either list) the user has checked by hand
    pub manual: usize,
    /// Unverified records not yet checked by hand
    pub unverified: usize,
}

impl Summary {
    pub fn compute<S: StorageBackend>(page: &PageEntry, store: &ManualCheckStore<S>) -> Self {
        Self::from_checks(page, |key| store.is_checked(key))
    }

    pub fn from_checks(page: &PageEntry, is_checked: impl Fn(&CheckKey) -> bool) -> Self {
        let key = |r: &crate::report::NumberRecord| CheckKey::new(&page.file, r.line, &r.value);

        let manual_verified = page.verified.iter().filter(|r| is_checked(&key(r))).count();
        let manual_unverified = page
            .unverified
            .iter()
            .filter(|r| is_checked(&key(r)))
            .count();

        Self {
            verified: page.verified.len(),
            manual: manual_verified + manual_unverified,
            unverified: page.unverified.len().saturating_sub(manual_unverified),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::report::NumberRecord;
    use proptest::prelude::*;

    proptest! {
        /// Property: unverified equals total unverified minus checked unverified
        #[test]
        fn unverified_count_invariant(
            verified in 0usize..20,
            checks in prop::collection::vec(any::<bool>(), 0..30)
        ) {
            let mut page = PageEntry::new("p.html");
            for i in 0..verified {
                page.verified.push(NumberRecord::new(i as u32, format!("{}", i), "integer"));
            }
            for (i, _) in checks.iter().enumerate() {
                page.unverified.push(NumberRecord::new(1000 + i as u32, format!("{}", i), "integer"));
            }
            let summary = Summary::from_checks(&page, |k| {
                k.line >= 1000 && checks[(k.line - 1000) as usize]
            });
            let checked = checks.iter().filter(|c| **c).count();
            prop_assert_eq!(summary.unverified, checks.len() - checked);
            prop_assert_eq!(summary.manual, checked);
            prop_assert_eq!(summary.verified, verified);
        }
    }
}
