//! Reflect a preferences record onto the radios, and read one back.

use crate::cookie::codec::{Consent, PreferencesRecord};
use crate::form::binding::{PageBinding, RadioValue};

/// Check the radio matching each stored answer. Categories the record does
/// not answer keep their current (unselected) state.
pub fn apply_preferences(binding: &mut impl PageBinding, record: &PreferencesRecord) {
    for category in binding.categories() {
        match record.get(&category) {
            Consent::Accepted => binding.check(&category, RadioValue::Yes),
            Consent::Rejected => binding.check(&category, RadioValue::No),
            Consent::Unset => {}
        }
    }
}

/// Candidate record from the current radio state. Any checked value other
/// than `yes` counts as a rejection.
pub fn read_selections(binding: &impl PageBinding, version: u32) -> PreferencesRecord {
    let mut record = PreferencesRecord::new(version);
    for category in binding.categories() {
        let consent = binding
            .checked_value(&category)
            .map_or(Consent::Unset, |value| {
                Consent::from(value == RadioValue::Yes.as_str())
            });
        record.set(category, consent);
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::headless::HeadlessPage;

    fn page() -> HeadlessPage {
        HeadlessPage::builder()
            .category("analytics", "Select yes if you want to accept analytics cookies")
            .category("campaigns", "Select yes if you want to accept campaign cookies")
            .build()
    }

    #[test]
    fn apply_checks_matching_radios() {
        let mut page = page();
        let record = PreferencesRecord::new(1)
            .with("analytics", Consent::Rejected)
            .with("campaigns", Consent::Accepted);
        apply_preferences(&mut page, &record);
        assert_eq!(page.checked_value("analytics").as_deref(), Some("no"));
        assert_eq!(page.checked_value("campaigns").as_deref(), Some("yes"));
    }

    #[test]
    fn apply_leaves_absent_categories_unselected() {
        let mut page = page();
        let record = PreferencesRecord::new(1)
            .with("analytics", Consent::Accepted)
            .with("unknown", Consent::Rejected);
        apply_preferences(&mut page, &record);
        assert_eq!(page.checked_value("analytics").as_deref(), Some("yes"));
        assert_eq!(page.checked_value("campaigns"), None);
    }

    #[test]
    fn read_marks_unchecked_groups_unset() {
        let mut page = page();
        page.check("campaigns", RadioValue::No);
        let record = read_selections(&page, 1);
        assert_eq!(record.get("analytics"), Consent::Unset);
        assert!(record.contains("analytics"));
        assert_eq!(record.get("campaigns"), Consent::Rejected);
        assert_eq!(record.len(), 2);
        assert_eq!(record.version(), 1);
    }

    #[test]
    fn apply_then_read_reflects_record() {
        let mut page = page();
        let record = PreferencesRecord::new(1)
            .with("analytics", Consent::Accepted)
            .with("campaigns", Consent::Rejected);
        apply_preferences(&mut page, &record);
        assert_eq!(read_selections(&page, 1), record);
    }
}
