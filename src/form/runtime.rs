//! Cookies-page runtime: attaches behaviour to a rendered page and executes
//! the commands produced by [`update`].
//!
//! The runtime owns the page binding, the cookie jar, the effective
//! configuration and the activity sink. Everything else is decided by the
//! pure reducer in [`super::update`].

#![allow(missing_docs)]

use crate::core::config::{Config, is_valid_category_name};
use crate::core::errors::{ConsentError, Result};
use crate::cookie::jar::{ConsentStore, CookieJar, StoredConsent};
use crate::form::binding::{FocusTarget, Hook, PageBinding, Viewport, error_id};
use crate::form::model::{FormCmd, FormModel, FormMsg, FormState};
use crate::form::selections::{apply_preferences, read_selections};
use crate::form::update::update;
use crate::logger::activity::{ActivityEvent, ActivitySink};

/// Result of [`CookiesPage::init`].
#[derive(Debug)]
pub enum InitOutcome<P, J> {
    Attached(CookiesPage<P, J>),
    /// Config invalid or markup incomplete; the page and jar are handed back
    /// untouched.
    Disabled { page: P, jar: J, reason: ConsentError },
}

impl<P, J> InitOutcome<P, J> {
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        matches!(self, Self::Attached(_))
    }

    #[must_use]
    pub fn attached(self) -> Option<CookiesPage<P, J>> {
        match self {
            Self::Attached(page) => Some(page),
            Self::Disabled { .. } => None,
        }
    }

    #[must_use]
    pub const fn reason(&self) -> Option<&ConsentError> {
        match self {
            Self::Attached(_) => None,
            Self::Disabled { reason, .. } => Some(reason),
        }
    }
}

/// Result of one click on the save button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Cookie written with `value`.
    Saved { value: String },
    /// Nothing written; these categories have no selection.
    Rejected { missing: Vec<String> },
    /// The cookie could not be written.
    Failed { code: &'static str, message: String },
}

/// A cookies page with behaviour attached.
pub struct CookiesPage<P, J> {
    page: P,
    jar: J,
    config: Config,
    sink: Box<dyn ActivitySink>,
    model: FormModel,
    last_saved: Option<String>,
}

impl<P, J> std::fmt::Debug for CookiesPage<P, J>
where
    P: std::fmt::Debug,
    J: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookiesPage")
            .field("page", &self.page)
            .field("jar", &self.jar)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl<P, J> CookiesPage<P, J>
where
    P: PageBinding + Viewport,
    J: CookieJar,
{
    /// Attach to `page`: restore stored preferences, then reveal the form
    /// groups and the save button. An invalid config or incomplete markup
    /// leaves the page as the server rendered it.
    pub fn init(
        page: P,
        jar: J,
        config: Config,
        mut sink: Box<dyn ActivitySink>,
    ) -> InitOutcome<P, J> {
        let groups = match config.validate().and_then(|()| check_markup(&page)) {
            Ok(groups) => groups,
            Err(reason) => {
                sink.record(ActivityEvent::PageDisabled {
                    code: reason.code().to_string(),
                    reason: reason.to_string(),
                });
                return InitOutcome::Disabled { page, jar, reason };
            }
        };

        let stored = {
            let store = ConsentStore::new(&config);
            match store.read(&jar) {
                StoredConsent::Missing => None,
                StoredConsent::Malformed { details, .. } => {
                    sink.record(ActivityEvent::StoredPreferencesIgnored {
                        cookie: store.cookie_name().to_string(),
                        details,
                    });
                    None
                }
                StoredConsent::Found(record) => {
                    sink.record(ActivityEvent::PreferencesRestored {
                        value: crate::cookie::codec::encode(&record).unwrap_or_default(),
                        version: record.version(),
                        current: store.is_current(&record),
                    });
                    Some(record)
                }
            }
        };

        let categories: Vec<String> = groups.iter().map(|(c, _)| c.clone()).collect();
        let config_hash = config.stable_hash().unwrap_or_default();

        let mut this = Self {
            page,
            jar,
            config,
            sink,
            model: FormModel::new(groups),
            last_saved: None,
        };
        let cmd = update(&mut this.model, FormMsg::Load { stored });
        if let Err(err) = this.execute(cmd) {
            this.sink.record(ActivityEvent::from_error(&err));
        }
        this.sink.record(ActivityEvent::PageInitialised {
            categories,
            config_hash,
        });
        InitOutcome::Attached(this)
    }

    /// Save-button handler.
    pub fn save_preferences(&mut self) -> SubmitOutcome {
        let candidate = read_selections(&self.page, self.config.cookie.version);
        let before = self.model.clone();
        self.last_saved = None;

        let cmd = update(&mut self.model, FormMsg::Submit(candidate));
        if let Err(err) = self.execute(cmd) {
            self.model = before;
            self.sink.record(ActivityEvent::from_error(&err));
            return SubmitOutcome::Failed {
                code: err.code(),
                message: err.to_string(),
            };
        }

        match self.model.state {
            FormState::ShowingErrors => {
                let missing: Vec<String> = self
                    .model
                    .last_validation
                    .missing()
                    .map(str::to_string)
                    .collect();
                self.sink.record(ActivityEvent::ValidationFailed {
                    missing: missing.clone(),
                });
                SubmitOutcome::Rejected { missing }
            }
            FormState::ShowingSuccess | FormState::Clean => SubmitOutcome::Saved {
                value: self.last_saved.take().unwrap_or_default(),
            },
        }
    }

    /// Annotate `category` as unanswered. Does nothing when the group
    /// already carries an error message.
    pub fn show_error_message(&mut self, category: &str) {
        if self.page.has_error_message(category) {
            return;
        }
        let message = self.model.error_message(category);
        self.page.set_group_error(category, true);
        self.page.insert_error_message(category, &message);
        let described_by = add_token(self.page.described_by(category).as_deref(), &message.id);
        self.page.set_described_by(category, Some(&described_by));
    }

    /// Remove the annotation added by [`Self::show_error_message`].
    pub fn hide_error_message(&mut self, category: &str) {
        self.page.remove_error_message(category);
        self.page.set_group_error(category, false);
        if let Some(current) = self.page.described_by(category) {
            let remaining = remove_token(&current, &error_id(category));
            self.page.set_described_by(category, remaining.as_deref());
        }
    }

    fn execute(&mut self, cmd: FormCmd) -> Result<()> {
        match cmd {
            FormCmd::None => {}
            FormCmd::Batch(cmds) => {
                for cmd in cmds {
                    self.execute(cmd)?;
                }
            }
            FormCmd::ApplyPreferences(record) => apply_preferences(&mut self.page, &record),
            FormCmd::Reveal(region) => self.page.set_hidden(&region, false),
            FormCmd::Conceal(region) => self.page.set_hidden(&region, true),
            FormCmd::ShowInlineError { category } => self.show_error_message(&category),
            FormCmd::HideInlineError { category } => self.hide_error_message(&category),
            FormCmd::Persist(record) => {
                let store = ConsentStore::new(&self.config);
                let receipt = store.write(&mut self.jar, &record)?;
                self.sink.record(ActivityEvent::PreferencesSaved {
                    cookie: store.cookie_name().to_string(),
                    value: receipt.value.clone(),
                });
                for (category, cookies) in receipt.cleared {
                    self.sink
                        .record(ActivityEvent::CookiesCleared { category, cookies });
                }
                self.last_saved = Some(receipt.value);
            }
            FormCmd::Focus(target) => {
                // The banner is not focusable by default.
                if target == FocusTarget::SuccessBanner && self.page.tab_index(target).is_none() {
                    self.page.set_tab_index(target, -1);
                }
                self.page.focus(target);
            }
            FormCmd::ScrollToTop => self.page.scroll_to_top(),
        }
        Ok(())
    }

    // ── accessors ──

    #[must_use]
    pub const fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    #[must_use]
    pub const fn jar(&self) -> &J {
        &self.jar
    }

    pub fn jar_mut(&mut self) -> &mut J {
        &mut self.jar
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn state(&self) -> FormState {
        self.model.state
    }

    #[must_use]
    pub const fn model(&self) -> &FormModel {
        &self.model
    }

    /// Hand back the page and jar, e.g. to simulate a reload.
    #[must_use]
    pub fn into_parts(self) -> (P, J) {
        (self.page, self.jar)
    }
}

/// Every hook present, at least one form group, a category usable as a
/// cookie key and a summary link per group. Returns `(category, summary
/// text)` in document order.
fn check_markup(page: &impl PageBinding) -> Result<Vec<(String, String)>> {
    if let Some(hook) = Hook::REQUIRED.into_iter().find(|h| !page.has_element(*h)) {
        return Err(ConsentError::MissingElement {
            element: hook.description(),
        });
    }
    let categories = page.categories();
    if categories.is_empty() {
        return Err(ConsentError::MissingElement {
            element: "a cookie form group",
        });
    }
    categories
        .into_iter()
        .map(|category| {
            if !is_valid_category_name(&category) {
                return Err(ConsentError::InvalidCategory { category });
            }
            match page.summary_link_text(&category) {
                Some(text) => Ok((category, text)),
                None => Err(ConsentError::MissingSummaryLink { category }),
            }
        })
        .collect()
}

fn add_token(existing: Option<&str>, token: &str) -> String {
    match existing {
        Some(current) if current.split_ascii_whitespace().any(|t| t == token) => {
            current.to_string()
        }
        Some(current) if !current.trim().is_empty() => format!("{} {token}", current.trim()),
        _ => token.to_string(),
    }
}

fn remove_token(existing: &str, token: &str) -> Option<String> {
    let remaining: Vec<&str> = existing
        .split_ascii_whitespace()
        .filter(|t| *t != token)
        .collect();
    (!remaining.is_empty()).then(|| remaining.join(" "))
}
