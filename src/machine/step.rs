//! Outcome and error types for `init` and `trigger`.

use crate::core::Label;

/// Result of re-deriving a machine's label after `init` or an action.
#[derive(Clone, Debug, PartialEq)]
pub enum Step<L: Label> {
    /// The derived label equals the current one; nothing fired.
    Unchanged,

    /// The label changed.
    Transitioned {
        from: Option<L>,
        to: Option<L>,
        /// Whether an entry callback was registered for `to` and ran.
        entered: bool,
    },
}

impl<L: Label> Step<L> {
    pub fn is_transition(&self) -> bool {
        matches!(self, Self::Transitioned { .. })
    }

    /// Whether an entry callback ran as part of this step.
    pub fn entered(&self) -> bool {
        matches!(self, Self::Transitioned { entered: true, .. })
    }

    /// The label entered, if the step was a transition into a real label.
    pub fn target(&self) -> Option<&L> {
        match self {
            Self::Transitioned { to, .. } => to.as_ref(),
            Self::Unchanged => None,
        }
    }
}

/// Reasons the strict `try_init`/`try_trigger` calls report.
///
/// The chainable `init`/`trigger` absorb all of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlopError {
    #[error("Machine '{machine}' is rejecting events, action '{action}' ignored")]
    Rejected { machine: String, action: String },

    #[error("Machine '{machine}' has no handler bound for action '{action}'")]
    UnknownAction { machine: String, action: String },

    #[error("Derivation for machine '{machine}' panicked: {message}")]
    DerivationPanicked { machine: String, message: String },

    /// Issued from inside one of the machine's own handlers, derivation or
    /// entry callbacks, while the machine was busy with another step.
    #[error("Machine '{machine}' is busy with another step on this thread")]
    Reentrant { machine: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_is_not_a_transition() {
        let step: Step<&'static str> = Step::Unchanged;

        assert!(!step.is_transition());
        assert!(!step.entered());
        assert_eq!(step.target(), None);
    }

    #[test]
    fn transition_reports_target_and_entry() {
        let step = Step::Transitioned {
            from: Some("waiting"),
            to: Some("ready"),
            entered: true,
        };

        assert!(step.is_transition());
        assert!(step.entered());
        assert_eq!(step.target(), Some(&"ready"));
    }

    #[test]
    fn transition_into_sentinel_has_no_target() {
        let step = Step::Transitioned {
            from: Some("ready"),
            to: None::<&'static str>,
            entered: false,
        };

        assert!(step.is_transition());
        assert_eq!(step.target(), None);
    }

    #[test]
    fn errors_name_the_machine() {
        let err = FlopError::UnknownAction {
            machine: "door".to_string(),
            action: "slam".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Machine 'door' has no handler bound for action 'slam'"
        );
    }

    #[test]
    fn reentrant_error_names_the_machine() {
        let err = FlopError::Reentrant {
            machine: "light".to_string(),
        };

        assert_eq!(
            err.to_string(),
            "Machine 'light' is busy with another step on this thread"
        );
    }
}
