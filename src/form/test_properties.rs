//! Property-based tests for cookies-page invariants.
//!
//! Drives an attached page through arbitrary sequences of radio clicks and
//! save clicks and checks that annotations never duplicate, the visible
//! outcome always matches the model state, and the cookie only changes on a
//! fully answered submit.

use proptest::prelude::*;

use super::binding::{FocusTarget, PageBinding, RadioValue, Region, error_id};
use super::headless::HeadlessPage;
use super::model::FormState;
use super::runtime::{CookiesPage, SubmitOutcome};
use crate::core::config::Config;
use crate::cookie::codec::{self, Consent, PreferencesRecord};
use crate::cookie::jar::{CookieJar, DocumentCookieJar};
use crate::logger::activity::NullSink;

const CATEGORIES: [&str; 3] = ["analytics", "campaigns", "functional"];
const COOKIE: &str = "design_system_cookies_policy";

#[derive(Debug, Clone)]
enum Action {
    Click(usize, RadioValue),
    Save,
    ScrollDown(u32),
}

// ──────────────────── strategies ────────────────────

fn arb_radio() -> impl Strategy<Value = RadioValue> {
    prop_oneof![Just(RadioValue::Yes), Just(RadioValue::No)]
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (0..CATEGORIES.len(), arb_radio()).prop_map(|(i, v)| Action::Click(i, v)),
        2 => Just(Action::Save),
        1 => (1u32..5000).prop_map(Action::ScrollDown),
    ]
}

fn arb_consent() -> impl Strategy<Value = Consent> {
    prop_oneof![
        Just(Consent::Accepted),
        Just(Consent::Rejected),
        Just(Consent::Unset)
    ]
}

fn arb_stored() -> impl Strategy<Value = Option<PreferencesRecord>> {
    proptest::option::of(prop::collection::vec(arb_consent(), CATEGORIES.len()).prop_map(
        |consents| {
            let mut record = PreferencesRecord::new(1);
            for (category, consent) in CATEGORIES.iter().zip(consents) {
                record.set(*category, consent);
            }
            record
        },
    ))
}

// ──────────────────── helpers ────────────────────

fn headless() -> HeadlessPage {
    let mut builder = HeadlessPage::builder();
    for category in CATEGORIES {
        builder = builder.category(category, &format!("Select yes or no for {category} cookies"));
    }
    builder.build()
}

fn attach(jar: DocumentCookieJar) -> CookiesPage<HeadlessPage, DocumentCookieJar> {
    CookiesPage::init(headless(), jar, Config::default(), Box::new(NullSink))
        .attached()
        .expect("complete markup attaches")
}

fn assert_page_invariants(page: &CookiesPage<HeadlessPage, DocumentCookieJar>) {
    let view = page.page();
    for category in CATEGORIES {
        let messages = view.error_messages(category).len();
        assert!(messages <= 1, "{category}: {messages} inline errors");
        let annotated = messages == 1;
        assert_eq!(view.has_group_error(category), annotated, "{category}: group class");
        assert_eq!(
            view.fieldset_described_by_contains(category, &error_id(category)),
            annotated,
            "{category}: aria-describedby"
        );
        assert!(!view.is_hidden(&Region::FormGroup(category.into())));
    }
    assert_eq!(
        view.is_error_summary_visible(),
        page.state() == FormState::ShowingErrors
    );
    assert_eq!(
        view.is_success_visible(),
        page.state() == FormState::ShowingSuccess
    );
    assert!(view.is_save_button_visible());
}

// ──────────────────── properties ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Any interaction sequence keeps annotations and banners consistent.
    #[test]
    fn interactions_preserve_page_invariants(
        actions in prop::collection::vec(arb_action(), 1..40)
    ) {
        let mut page = attach(DocumentCookieJar::new());
        for action in actions {
            match action {
                Action::Click(i, value) => page.page_mut().click_radio(CATEGORIES[i], value),
                Action::Save => {
                    let _ = page.save_preferences();
                }
                Action::ScrollDown(offset) => page.page_mut().scroll_to(offset),
            }
            assert_page_invariants(&page);
        }
    }

    /// A submit with any unanswered group never touches the cookie.
    #[test]
    fn incomplete_submit_never_persists(
        answered in prop::collection::vec(proptest::option::of(arb_radio()), CATEGORIES.len())
            .prop_filter("at least one unanswered", |a| a.iter().any(Option::is_none))
    ) {
        let mut page = attach(DocumentCookieJar::new());
        for (category, value) in CATEGORIES.iter().zip(&answered) {
            if let Some(value) = value {
                page.page_mut().click_radio(category, *value);
            }
        }
        let outcome = page.save_preferences();
        let is_rejected = matches!(outcome, SubmitOutcome::Rejected { .. });
        prop_assert!(is_rejected);
        prop_assert!(page.jar().get(COOKIE).is_none());
        prop_assert_eq!(page.page().focused(), Some(FocusTarget::ErrorSummary));
    }

    /// A fully answered submit stores exactly the chosen booleans.
    #[test]
    fn complete_submit_persists_choices(
        values in prop::collection::vec(arb_radio(), CATEGORIES.len())
    ) {
        let mut page = attach(DocumentCookieJar::new());
        for (category, value) in CATEGORIES.iter().zip(&values) {
            page.page_mut().click_radio(category, *value);
        }
        let outcome = page.save_preferences();
        let is_saved = matches!(outcome, SubmitOutcome::Saved { .. });
        prop_assert!(is_saved);

        let stored = codec::decode(&page.jar().get(COOKIE).unwrap_or_default())
            .expect("cookie decodes");
        prop_assert_eq!(stored.version(), 1);
        for (category, value) in CATEGORIES.iter().zip(&values) {
            prop_assert_eq!(stored.get(category), Consent::from(*value == RadioValue::Yes));
        }
        prop_assert!(!page.page().is_error_summary_visible());
        prop_assert_eq!(page.page().scroll_top(), 0);
    }

    /// Reloading shows exactly what the cookie holds.
    #[test]
    fn init_reflects_stored_consent(stored in arb_stored()) {
        let jar = DocumentCookieJar::new();
        if let Some(record) = &stored {
            jar.assign(&format!("{COOKIE}={}; path=/", codec::encode(record).unwrap()));
        }
        let page = attach(jar);
        for category in CATEGORIES {
            let expected = stored
                .as_ref()
                .map_or(Consent::Unset, |record| record.get(category));
            let checked = page.page().checked_value(category);
            match expected {
                Consent::Accepted => prop_assert_eq!(checked.as_deref(), Some("yes")),
                Consent::Rejected => prop_assert_eq!(checked.as_deref(), Some("no")),
                Consent::Unset => prop_assert_eq!(checked, None),
            }
            prop_assert!(!page.page().has_error_message(category));
        }
        prop_assert_eq!(page.state(), FormState::Clean);
    }
}
