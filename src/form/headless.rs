//! In-memory cookies page implementing [`PageBinding`] and [`Viewport`].
//!
//! Models exactly the markup the cookies page template renders: one form
//! group per category (hidden until the script runs), an error summary with
//! one `#<category>` link per group, a hidden save button and a hidden success
//! notification. Inline error messages are stored as a list per group so a
//! duplicated annotation is observable rather than silently collapsed.

#![allow(missing_docs)]

use crate::form::binding::{
    ErrorMessage, FocusTarget, Hook, PageBinding, RadioValue, Region, Viewport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLink {
    pub href: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    category: String,
    hidden: bool,
    checked: Option<String>,
    form_group_error: bool,
    error_messages: Vec<ErrorMessage>,
    described_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Summary {
    hidden: bool,
    links: Vec<SummaryLink>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Success {
    hidden: bool,
    banner_tab_index: Option<i32>,
}

/// Headless rendering of the cookies page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessPage {
    module_present: bool,
    groups: Vec<Group>,
    summary: Option<Summary>,
    save_button_hidden: Option<bool>,
    success: Option<Success>,
    focused: Option<FocusTarget>,
    focus_history: Vec<FocusTarget>,
    scroll_top: u32,
}

impl HeadlessPage {
    #[must_use]
    pub fn builder() -> HeadlessPageBuilder {
        HeadlessPageBuilder::default()
    }

    /// The page as rendered for the single `analytics` category.
    #[must_use]
    pub fn design_system() -> Self {
        Self::builder()
            .category(
                "analytics",
                "Select yes if you want to accept analytics cookies",
            )
            .build()
    }

    fn group(&self, category: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.category == category)
    }

    fn group_mut(&mut self, category: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.category == category)
    }

    // ── assertions ──

    #[must_use]
    pub fn is_error_summary_visible(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| !s.hidden)
    }

    #[must_use]
    pub fn is_success_visible(&self) -> bool {
        self.success.as_ref().is_some_and(|s| !s.hidden)
    }

    #[must_use]
    pub fn is_save_button_visible(&self) -> bool {
        self.save_button_hidden == Some(false)
    }

    /// Inline error messages currently inside the category's group.
    #[must_use]
    pub fn error_messages(&self, category: &str) -> &[ErrorMessage] {
        self.group(category)
            .map(|g| g.error_messages.as_slice())
            .unwrap_or_default()
    }

    /// Element lookup by id, as `#analytics-error` would resolve.
    #[must_use]
    pub fn error_message_by_id(&self, id: &str) -> Option<&ErrorMessage> {
        self.groups
            .iter()
            .flat_map(|g| g.error_messages.iter())
            .find(|m| m.id == id)
    }

    #[must_use]
    pub fn has_group_error(&self, category: &str) -> bool {
        self.group(category).is_some_and(|g| g.form_group_error)
    }

    /// Whether `aria-describedby` of the category's fieldset lists `token`.
    #[must_use]
    pub fn fieldset_described_by_contains(&self, category: &str, token: &str) -> bool {
        self.group(category)
            .and_then(|g| g.described_by.as_deref())
            .is_some_and(|v| v.split_ascii_whitespace().any(|t| t == token))
    }

    /// Visible links of the error summary.
    #[must_use]
    pub fn visible_summary_links(&self) -> Vec<SummaryLink> {
        match &self.summary {
            Some(s) if !s.hidden => s.links.clone(),
            _ => Vec::new(),
        }
    }

    #[must_use]
    pub fn focused(&self) -> Option<FocusTarget> {
        self.focused
    }

    #[must_use]
    pub fn focus_history(&self) -> &[FocusTarget] {
        &self.focus_history
    }

    #[must_use]
    pub fn scroll_top(&self) -> u32 {
        self.scroll_top
    }

    /// Simulate the user scrolling down the page.
    pub fn scroll_to(&mut self, offset: u32) {
        self.scroll_top = offset;
    }

    /// Whether the radio `value` of the category is checked and visible.
    #[must_use]
    pub fn is_checked_visible(&self, category: &str, value: RadioValue) -> bool {
        self.group(category)
            .is_some_and(|g| !g.hidden && g.checked.as_deref() == Some(value.as_str()))
    }

    /// Simulate a click on a radio input.
    pub fn click_radio(&mut self, category: &str, value: RadioValue) {
        if self.group(category).is_some_and(|g| !g.hidden) {
            self.check(category, value);
        }
    }
}

impl PageBinding for HeadlessPage {
    fn has_element(&self, hook: Hook) -> bool {
        match hook {
            Hook::PageModule => self.module_present,
            Hook::ErrorSummary => self.summary.is_some(),
            Hook::SaveButton => self.save_button_hidden.is_some(),
            Hook::SuccessNotification => self.success.is_some(),
        }
    }

    fn categories(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.category.clone()).collect()
    }

    fn summary_link_text(&self, category: &str) -> Option<String> {
        let href = format!("#{category}");
        self.summary
            .as_ref()?
            .links
            .iter()
            .find(|l| l.href == href)
            .map(|l| l.text.clone())
    }

    fn checked_value(&self, category: &str) -> Option<String> {
        self.group(category)?.checked.clone()
    }

    fn check(&mut self, category: &str, value: RadioValue) {
        if let Some(g) = self.group_mut(category) {
            g.checked = Some(value.as_str().to_string());
        }
    }

    fn set_hidden(&mut self, region: &Region, hidden: bool) {
        match region {
            Region::FormGroup(category) => {
                if let Some(g) = self.group_mut(category) {
                    g.hidden = hidden;
                }
            }
            Region::SaveButton => {
                if let Some(h) = self.save_button_hidden.as_mut() {
                    *h = hidden;
                }
            }
            Region::ErrorSummary => {
                if let Some(s) = self.summary.as_mut() {
                    s.hidden = hidden;
                }
            }
            Region::SuccessNotification => {
                if let Some(s) = self.success.as_mut() {
                    s.hidden = hidden;
                }
            }
        }
    }

    fn is_hidden(&self, region: &Region) -> bool {
        match region {
            Region::FormGroup(category) => self.group(category).is_none_or(|g| g.hidden),
            Region::SaveButton => self.save_button_hidden.unwrap_or(true),
            Region::ErrorSummary => self.summary.as_ref().is_none_or(|s| s.hidden),
            Region::SuccessNotification => self.success.as_ref().is_none_or(|s| s.hidden),
        }
    }

    fn has_error_message(&self, category: &str) -> bool {
        !self.error_messages(category).is_empty()
    }

    fn insert_error_message(&mut self, category: &str, message: &ErrorMessage) {
        if let Some(g) = self.group_mut(category) {
            g.error_messages.push(message.clone());
        }
    }

    fn remove_error_message(&mut self, category: &str) {
        if let Some(g) = self.group_mut(category) {
            g.error_messages.clear();
        }
    }

    fn set_group_error(&mut self, category: &str, on: bool) {
        if let Some(g) = self.group_mut(category) {
            g.form_group_error = on;
        }
    }

    fn described_by(&self, category: &str) -> Option<String> {
        self.group(category)?.described_by.clone()
    }

    fn set_described_by(&mut self, category: &str, value: Option<&str>) {
        if let Some(g) = self.group_mut(category) {
            g.described_by = value.map(str::to_string);
        }
    }

    fn tab_index(&self, target: FocusTarget) -> Option<i32> {
        match target {
            FocusTarget::ErrorSummary => None,
            FocusTarget::SuccessBanner => self.success.as_ref()?.banner_tab_index,
        }
    }

    fn set_tab_index(&mut self, target: FocusTarget, index: i32) {
        if target == FocusTarget::SuccessBanner
            && let Some(s) = self.success.as_mut()
        {
            s.banner_tab_index = Some(index);
        }
    }

    fn focus(&mut self, target: FocusTarget) {
        let present = match target {
            FocusTarget::ErrorSummary => self.summary.is_some(),
            FocusTarget::SuccessBanner => self.success.is_some(),
        };
        if present {
            self.focused = Some(target);
            self.focus_history.push(target);
        }
    }
}

impl Viewport for HeadlessPage {
    fn scroll_to_top(&mut self) {
        self.scroll_top = 0;
    }
}

// ──────────────────── builder ────────────────────

/// Builds a [`HeadlessPage`] in its server-rendered (pre-script) state.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPageBuilder {
    categories: Vec<(String, Option<String>)>,
    described_by: Vec<(String, String)>,
    missing: Vec<Hook>,
    banner_tab_index: Option<i32>,
}

impl HeadlessPageBuilder {
    /// Form group for `category` plus its error-summary link.
    #[must_use]
    pub fn category(mut self, category: &str, summary_text: &str) -> Self {
        self.categories
            .push((category.to_string(), Some(summary_text.to_string())));
        self
    }

    /// Form group whose error-summary link was left out of the template.
    #[must_use]
    pub fn category_without_summary_link(mut self, category: &str) -> Self {
        self.categories.push((category.to_string(), None));
        self
    }

    /// Initial `aria-describedby` of a category's fieldset (e.g. a hint id).
    #[must_use]
    pub fn described_by(mut self, category: &str, value: &str) -> Self {
        self.described_by
            .push((category.to_string(), value.to_string()));
        self
    }

    /// Omit a structural element.
    #[must_use]
    pub fn without(mut self, hook: Hook) -> Self {
        self.missing.push(hook);
        self
    }

    #[must_use]
    pub fn banner_tab_index(mut self, index: i32) -> Self {
        self.banner_tab_index = Some(index);
        self
    }

    #[must_use]
    pub fn build(self) -> HeadlessPage {
        let has = |hook: Hook| !self.missing.contains(&hook);

        let groups = self
            .categories
            .iter()
            .map(|(category, _)| Group {
                category: category.clone(),
                hidden: true,
                checked: None,
                form_group_error: false,
                error_messages: Vec::new(),
                described_by: self
                    .described_by
                    .iter()
                    .find(|(c, _)| c == category)
                    .map(|(_, v)| v.clone()),
            })
            .collect();

        let links = self
            .categories
            .iter()
            .filter_map(|(category, text)| {
                text.as_ref().map(|text| SummaryLink {
                    href: format!("#{category}"),
                    text: text.clone(),
                })
            })
            .collect();

        HeadlessPage {
            module_present: has(Hook::PageModule),
            groups,
            summary: has(Hook::ErrorSummary).then_some(Summary {
                hidden: true,
                links,
            }),
            save_button_hidden: has(Hook::SaveButton).then_some(true),
            success: has(Hook::SuccessNotification).then_some(Success {
                hidden: true,
                banner_tab_index: self.banner_tab_index,
            }),
            focused: None,
            focus_history: Vec::new(),
            scroll_top: 0,
        }
    }
}
