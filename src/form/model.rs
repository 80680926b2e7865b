//! Elm-style state model for the cookies-page form.
//!
//! All presentation state lives in [`FormModel`]. Page events arrive as
//! [`FormMsg`] values; side-effects are described by [`FormCmd`] values that
//! the runtime executes against the page, the cookie jar and the activity log.
//!
//! **Design invariant:** the model is deterministic and testable. No I/O
//! happens here.

#![allow(missing_docs)]

use std::collections::BTreeMap;

use crate::cookie::codec::PreferencesRecord;
use crate::form::binding::{ErrorMessage, FocusTarget, Region};
use crate::form::validator::ValidationResult;

/// Which outcome the page is presenting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FormState {
    /// Error summary and success notification hidden.
    #[default]
    Clean,
    /// Last submit had unanswered categories.
    ShowingErrors,
    /// Last submit was persisted.
    ShowingSuccess,
}

/// Events delivered to [`update`](super::update::update).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMsg {
    /// Page load, with whatever consent the cookie held.
    Load { stored: Option<PreferencesRecord> },
    /// Save clicked; carries the record read from the radios.
    Submit(PreferencesRecord),
}

/// Side-effects requested by the update function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormCmd {
    None,
    ApplyPreferences(PreferencesRecord),
    Reveal(Region),
    Conceal(Region),
    /// Annotate one category; a no-op when an annotation already exists.
    ShowInlineError { category: String },
    HideInlineError { category: String },
    /// Write the consent cookie.
    Persist(PreferencesRecord),
    Focus(FocusTarget),
    ScrollToTop,
    Batch(Vec<FormCmd>),
}

impl FormCmd {
    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

/// Presentation state for one page session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormModel {
    pub state: FormState,
    /// Categories of the form groups, in document order.
    pub categories: Vec<String>,
    /// Error text per category, taken from the error-summary links.
    messages: BTreeMap<String, String>,
    pub last_validation: ValidationResult,
    pub submissions: u64,
    pub saves: u64,
}

impl FormModel {
    /// `groups` pairs each category with its error-summary text.
    #[must_use]
    pub fn new(groups: Vec<(String, String)>) -> Self {
        let categories = groups.iter().map(|(c, _)| c.clone()).collect();
        Self {
            state: FormState::Clean,
            categories,
            messages: groups.into_iter().collect(),
            last_validation: ValidationResult::default(),
            submissions: 0,
            saves: 0,
        }
    }

    /// Inline error annotation for `category`.
    #[must_use]
    pub fn error_message(&self, category: &str) -> ErrorMessage {
        ErrorMessage::for_category(
            category,
            self.messages.get(category).cloned().unwrap_or_default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_model_is_clean() {
        let model = FormModel::new(vec![("analytics".into(), "Select one".into())]);
        assert_eq!(model.state, FormState::Clean);
        assert_eq!(model.categories, vec!["analytics".to_string()]);
        assert_eq!(model.submissions, 0);
        assert!(model.last_validation.is_valid());
    }

    #[test]
    fn error_message_uses_summary_text() {
        let model = FormModel::new(vec![("analytics".into(), "Select one".into())]);
        let msg = model.error_message("analytics");
        assert_eq!(msg.id, "analytics-error");
        assert_eq!(msg.text, "Select one");
    }

    #[test]
    fn flatten_preserves_order_and_drops_none() {
        let cmd = FormCmd::Batch(vec![
            FormCmd::ScrollToTop,
            FormCmd::None,
            FormCmd::Batch(vec![
                FormCmd::Focus(FocusTarget::ErrorSummary),
                FormCmd::Reveal(Region::ErrorSummary),
            ]),
        ]);
        assert_eq!(
            cmd.flatten(),
            vec![
                FormCmd::ScrollToTop,
                FormCmd::Focus(FocusTarget::ErrorSummary),
                FormCmd::Reveal(Region::ErrorSummary),
            ]
        );
    }
}
