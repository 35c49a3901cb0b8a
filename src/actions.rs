// ============================================================================
// Registered actions — the two menu entries a host exposes for navigation
// ============================================================================

use crate::host::Host;
use crate::steps::{self, StepError};

/// A named, parameterless action bound to a host menu entry.
#[derive(Clone, Copy)]
pub struct Action {
    pub id: &'static str,
    pub label: &'static str,
    pub menu_path: &'static str,
    run: fn(&mut dyn Host) -> Result<i64, StepError>,
}

impl Action {
    /// Run against the active document. Returns the new step.
    pub fn run(&self, host: &mut dyn Host) -> Result<i64, StepError> {
        (self.run)(host)
    }
}

fn increase(host: &mut dyn Host) -> Result<i64, StepError> {
    steps::advance(host)
}

fn decrease(host: &mut dyn Host) -> Result<i64, StepError> {
    steps::retreat(host)
}

pub const INCREASE_STEP: &str = "increase-step";
pub const DECREASE_STEP: &str = "decrease-step";

pub static ACTIONS: &[Action] = &[
    Action {
        id: INCREASE_STEP,
        label: "Aufbauschritt vor",
        menu_path: "<Image>/Build-up/Next step",
        run: increase,
    },
    Action {
        id: DECREASE_STEP,
        label: "Aufbauschritt zurueck",
        menu_path: "<Image>/Build-up/Previous step",
        run: decrease,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    Unknown(String),
    Step(StepError),
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::Unknown(id) => write!(f, "Unknown action '{}'", id),
            ActionError::Step(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ActionError {}

impl From<StepError> for ActionError {
    fn from(e: StepError) -> Self {
        ActionError::Step(e)
    }
}

pub fn find_action(id: &str) -> Option<&'static Action> {
    ACTIONS.iter().find(|a| a.id == id)
}

/// Look up an action by id and run it.
pub fn run_action(host: &mut dyn Host, id: &str) -> Result<i64, ActionError> {
    let action = find_action(id).ok_or_else(|| ActionError::Unknown(id.to_string()))?;
    Ok(action.run(host)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::steps::MARKER_NAME;

    fn deck() -> Document {
        let mut doc = Document::new(1, 1);
        for l in [1, 2, 3] {
            doc.add_group(None, &format!("#{}#s", l)).unwrap();
        }
        doc.add_text(None, MARKER_NAME, "2").unwrap();
        doc
    }

    #[test]
    fn both_directions_are_registered() {
        assert_eq!(ACTIONS.len(), 2);
        assert!(find_action(INCREASE_STEP).is_some());
        assert!(find_action(DECREASE_STEP).is_some());
        assert!(find_action("python-fu-increase-step").is_none());
    }

    #[test]
    fn dispatch_runs_the_step() {
        let mut doc = deck();
        assert_eq!(run_action(&mut doc, INCREASE_STEP), Ok(3));
        assert_eq!(run_action(&mut doc, DECREASE_STEP), Ok(2));
        assert_eq!(doc.display_generation, 2);
    }

    #[test]
    fn unknown_action_touches_nothing() {
        let mut doc = deck();
        let before = doc.clone();
        assert_eq!(
            run_action(&mut doc, "sideways"),
            Err(ActionError::Unknown("sideways".into()))
        );
        assert_eq!(doc, before);
    }
}
