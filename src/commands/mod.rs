pub mod survey;

use crate::error::CommandError;
use crate::models::Element;
use log::{debug, info};
use std::collections::HashSet;

/// Key press as delivered by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Self::default()
        }
    }

    pub fn with_ctrl(self) -> Self {
        Self { ctrl: true, ..self }
    }

    pub fn with_meta(self) -> Self {
        Self { meta: true, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    // Ctrl on most platforms, Cmd on macOS; either one triggers
    Primary(char),
}

impl Shortcut {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        match self {
            Shortcut::Primary(key) => {
                (event.ctrl || event.meta) && event.key.chars().eq(std::iter::once(*key))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub selected_element_ids: HashSet<String>,
}

impl AppState {
    pub fn with_selection<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            selected_element_ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn selected<'a>(&'a self, elements: &'a [Element]) -> impl Iterator<Item = &'a Element> + 'a {
        elements
            .iter()
            .filter(move |element| self.selected_element_ids.contains(&element.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    // State changed: record it as one undoable step right away
    Capture,
    NoOp,
}

#[derive(Debug, Clone, Copy)]
pub struct CommandDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub shortcut: Option<Shortcut>,
    pub perform: fn(&[Element], &AppState) -> ActionResult,
}

/// Commands known to the host, each registered exactly once.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    commands: Vec<CommandDescriptor>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `Duplicate` if a command with the same id is already registered.
    pub fn register(&mut self, command: CommandDescriptor) -> Result<(), CommandError> {
        if self.get(command.id).is_some() {
            return Err(CommandError::Duplicate(command.id.to_string()));
        }
        info!("Registered command {} ({})", command.id, command.label);
        self.commands.push(command);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&CommandDescriptor> {
        self.commands.iter().find(|command| command.id == id)
    }

    pub fn commands(&self) -> &[CommandDescriptor] {
        &self.commands
    }

    /// # Errors
    ///
    /// Returns `Unknown` if no command is registered under `id`.
    pub fn perform(&self, id: &str, elements: &[Element], state: &AppState) -> Result<ActionResult, CommandError> {
        let command = self.get(id).ok_or_else(|| CommandError::Unknown(id.to_string()))?;
        let result = (command.perform)(elements, state);
        debug!("Command {} performed: {:?}", id, result);
        Ok(result)
    }

    /// Runs the first command whose shortcut matches `event`.
    pub fn handle_key(&self, event: &KeyEvent, elements: &[Element], state: &AppState) -> Option<(&'static str, ActionResult)> {
        let command = self
            .commands
            .iter()
            .find(|command| command.shortcut.is_some_and(|s| s.matches(event)))?;
        let result = (command.perform)(elements, state);
        debug!("Shortcut triggered {}: {:?}", command.id, result);
        Some((command.id, result))
    }
}
