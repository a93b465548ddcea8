use crate::commands::{ActionRegistry, ActionResult, AppState, CommandDescriptor, Shortcut};
use crate::error::CommandError;
use crate::models::{is_survey_element, Element};

pub const CHANGE_SURVEY: CommandDescriptor = CommandDescriptor {
    id: "changeSurvey",
    label: "Change Survey",
    shortcut: Some(Shortcut::Primary('s')),
    perform: perform_change_survey,
};

// Edits were already committed by the panel; this only asks the host to capture them
fn perform_change_survey(elements: &[Element], state: &AppState) -> ActionResult {
    if state.selected(elements).any(is_survey_element) {
        ActionResult::Capture
    } else {
        ActionResult::NoOp
    }
}

/// Registers the survey commands. Registering twice is an error rather than a
/// silent second entry.
///
/// # Errors
///
/// Returns `Duplicate` if a survey command is already registered.
pub fn register_survey_commands(registry: &mut ActionRegistry) -> Result<(), CommandError> {
    registry.register(CHANGE_SURVEY)
}
