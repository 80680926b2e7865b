//! Typed seams between the cookies-page logic and the rendered page.
//!
//! [`PageBinding`] covers every DOM read and mutation the form needs, keyed by
//! category name. [`Viewport`] is the one piece of document-level state the
//! page touches (scroll position). Browser bindings and the in-memory
//! [`HeadlessPage`](super::headless::HeadlessPage) both implement them.

#![allow(missing_docs)]

use std::fmt;

/// Structural elements the page module must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Container marked `data-module="app-cookies-page"`.
    PageModule,
    /// `.js-cookies-page-error-summary`
    ErrorSummary,
    /// `.js-cookies-page-save`
    SaveButton,
    /// `.js-cookies-page-success`
    SuccessNotification,
}

impl Hook {
    /// Every hook the page needs before behaviour can be attached.
    pub const REQUIRED: [Self; 4] = [
        Self::PageModule,
        Self::ErrorSummary,
        Self::SaveButton,
        Self::SuccessNotification,
    ];

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::PageModule => "the cookies page module",
            Self::ErrorSummary => "the error summary",
            Self::SaveButton => "the save button",
            Self::SuccessNotification => "the success notification",
        }
    }
}

/// Elements whose `hidden` attribute the page toggles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Region {
    /// `.js-cookies-page-form-group` for a category.
    FormGroup(String),
    SaveButton,
    ErrorSummary,
    SuccessNotification,
}

/// Elements the page moves focus to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FocusTarget {
    /// First element child of the error summary.
    ErrorSummary,
    /// Notification banner inside the success notification.
    SuccessBanner,
}

/// Value attribute of a category's radio inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RadioValue {
    Yes,
    No,
}

impl RadioValue {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "yes" => Some(Self::Yes),
            "no" => Some(Self::No),
            _ => None,
        }
    }
}

impl fmt::Display for RadioValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inline error annotation inserted before a category's radios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    /// `<category>-error`; referenced from the fieldset's `aria-describedby`.
    pub id: String,
    /// Text taken from the matching error-summary link.
    pub text: String,
}

impl ErrorMessage {
    pub const CLASS: &'static str = "govuk-error-message";
    pub const HIDDEN_PREFIX: &'static str = "Error:";

    #[must_use]
    pub fn for_category(category: &str, text: impl Into<String>) -> Self {
        Self {
            id: error_id(category),
            text: text.into(),
        }
    }

    /// Inner HTML of the message span. The summary text is escaped.
    #[must_use]
    pub fn inner_html(&self) -> String {
        format!(
            "<span class=\"govuk-visually-hidden\">{}</span> {}",
            Self::HIDDEN_PREFIX,
            escape_html(&self.text)
        )
    }

    /// Text a screen reader announces.
    #[must_use]
    pub fn announced_text(&self) -> String {
        format!("{} {}", Self::HIDDEN_PREFIX, self.text)
    }
}

/// Id of the inline error message for `category`.
#[must_use]
pub fn error_id(category: &str) -> String {
    format!("{category}-error")
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// DOM access needed by the cookies page.
///
/// Category-keyed methods address the form group whose radio inputs are named
/// after the category. Calls for unknown categories are no-ops / `None`.
pub trait PageBinding {
    /// Whether the structural element behind `hook` exists.
    fn has_element(&self, hook: Hook) -> bool;

    /// Category of each form group, in document order.
    fn categories(&self) -> Vec<String>;

    /// Text of the error-summary link `a[href="#<category>"]`.
    fn summary_link_text(&self, category: &str) -> Option<String>;

    /// `value` of the checked radio in the category's group.
    fn checked_value(&self, category: &str) -> Option<String>;

    /// Check the radio with `value`, unchecking its sibling.
    fn check(&mut self, category: &str, value: RadioValue);

    fn set_hidden(&mut self, region: &Region, hidden: bool);

    fn is_hidden(&self, region: &Region) -> bool;

    /// Whether an inline `.govuk-error-message` exists in the category's group.
    fn has_error_message(&self, category: &str) -> bool;

    /// Insert `message` immediately before the category's `.govuk-radios`.
    fn insert_error_message(&mut self, category: &str, message: &ErrorMessage);

    fn remove_error_message(&mut self, category: &str);

    /// Toggle `govuk-form-group--error` on the category's `.govuk-form-group`.
    fn set_group_error(&mut self, category: &str, on: bool);

    /// `aria-describedby` of the category's fieldset.
    fn described_by(&self, category: &str) -> Option<String>;

    fn set_described_by(&mut self, category: &str, value: Option<&str>);

    fn tab_index(&self, target: FocusTarget) -> Option<i32>;

    fn set_tab_index(&mut self, target: FocusTarget, index: i32);

    fn focus(&mut self, target: FocusTarget);
}

/// Document-level viewport control.
pub trait Viewport {
    fn scroll_to_top(&mut self);
}
