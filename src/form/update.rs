//! Pure update function for the cookies-page form.
//!
//! `update()` takes the current model and a message, mutates the model, and
//! returns a command describing the side-effects the runtime should execute.
//!
//! **Design invariant:** this module performs zero I/O. All effects are
//! described as [`FormCmd`] values.

use super::binding::{FocusTarget, Region};
use super::model::{FormCmd, FormModel, FormMsg, FormState};
use super::validator::validate;

/// Apply a message to the model and return the next command for the runtime.
///
/// Transitions:
///
/// ```text
/// Clean          --submit,invalid--> ShowingErrors
/// Clean          --submit,valid----> ShowingSuccess
/// ShowingErrors  --submit,invalid--> ShowingErrors
/// ShowingErrors  --submit,valid----> ShowingSuccess
/// ShowingSuccess --submit,valid----> ShowingSuccess
/// ShowingSuccess --submit,invalid--> ShowingErrors
/// ```
pub fn update(model: &mut FormModel, msg: FormMsg) -> FormCmd {
    match msg {
        FormMsg::Load { stored } => {
            model.state = FormState::Clean;
            let mut cmds = Vec::with_capacity(model.categories.len() + 5);
            // Persist comes first: a failed write must leave the page untouched.
            if result.is_valid() {
                cmds.push(FormCmd::Persist(candidate));
            }
            cmds.extend(model.categories.iter().map(|category| {
                if result.is_missing(category) {
                    FormCmd::ShowInlineError {
                        category: category.clone(),
                    }
                } else {
                    FormCmd::HideInlineError {
                        category: category.clone(),
                    }
                }
            }));

            if result.is_valid() {
                model.saves = model.saves.wrapping_add(1);
                cmds.extend([
                    FormCmd::Conceal(Region::ErrorSummary),
                    FormCmd::Reveal(Region::SuccessNotification),
                    FormCmd::Focus(FocusTarget::SuccessBanner),
                    FormCmd::ScrollToTop,
                ]);
                model.state = FormState::ShowingSuccess;
            } else {
                if model.state == FormState::ShowingSuccess {
                    cmds.push(FormCmd::Conceal(Region::SuccessNotification));
                }
                cmds.extend([
                    FormCmd::Reveal(Region::ErrorSummary),
                    FormCmd::Focus(FocusTarget::ErrorSummary),
                    FormCmd::ScrollToTop,
                ]);
                model.state = FormState::ShowingErrors;
            }

            model.last_validation = result;
            FormCmd::Batch(cmds)
        }
    }
}
