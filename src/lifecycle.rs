//! Application lifecycle
//!
//! Linear phase machine plus the command vocabulary shared by the tray,
//! the signal watcher and the status window. Tray callbacks only enqueue
//! an `AppCommand`; the UI thread drains the channel and applies it, so
//! platform callbacks never touch window state directly.

use anyhow::Result;
use tracing::{error, info, warn};

/// Commands dispatched to the UI thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Show the status window and bring it to the front
    ShowWindow,

    /// Open the served root page in the default browser
    OpenRoot,

    /// Open the API index in the default browser
    OpenApi,

    /// Run the shutdown sequence and terminate
    Exit,
}

/// Application phases, strictly forward-moving
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Starting,
    Running,
    ShuttingDown,
    Terminated,
}

pub struct Lifecycle {
    phase: Phase,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Phase::Starting,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to a later phase
    ///
    /// Skipping ahead is allowed (an already-running instance goes straight
    /// from `Starting` to `Terminated`); moving backward or re-entering the
    /// current phase is rejected.
    pub fn advance(&mut self, to: Phase) -> bool {
        if to <= self.phase {
            warn!(from = ?self.phase, to = ?to, "Ignoring non-forward phase transition");
            return false;
        }
        info!(from = ?self.phase, to = ?to, "Phase transition");
        self.phase = to;
        true
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Named teardown step for `run_best_effort`
pub type TeardownStep = (&'static str, Box<dyn FnOnce() -> Result<()>>);

/// Run teardown steps in order, logging failures without stopping
///
/// Returns the number of failed steps.
pub fn run_best_effort(steps: Vec<TeardownStep>) -> usize {
    let mut failures = 0;
    for (name, step) in steps {
        match step() {
            Ok(()) => info!(step = name, "Teardown step complete"),
            Err(err) => {
                failures += 1;
                error!(step = name, error = ?err, "Teardown step failed, continuing");
            }
        }
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_phases_advance_linearly() {
        let mut lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.phase(), Phase::Starting);

        assert!(lifecycle.advance(Phase::Running));
        assert!(lifecycle.advance(Phase::ShuttingDown));
        assert!(lifecycle.advance(Phase::Terminated));
        assert_eq!(lifecycle.phase(), Phase::Terminated);
    }

    #[test]
    fn test_backward_and_repeated_transitions_rejected() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::Running);

        assert!(!lifecycle.advance(Phase::Running));
        assert!(!lifecycle.advance(Phase::Starting));
        assert_eq!(lifecycle.phase(), Phase::Running);
    }

    #[test]
    fn test_already_running_path_skips_running() {
        let mut lifecycle = Lifecycle::new();
        assert!(lifecycle.advance(Phase::Terminated));
        assert_eq!(lifecycle.phase(), Phase::Terminated);

        // Terminal: nothing moves past it
        assert!(!lifecycle.advance(Phase::Terminated));
    }

    #[test]
    fn test_shutdown_only_begins_once() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::Running);

        assert!(lifecycle.advance(Phase::ShuttingDown));
        assert!(!lifecycle.advance(Phase::ShuttingDown));
    }

    #[test]
    fn test_best_effort_runs_all_steps_in_order() {
        let order = Rc::new(RefCell::new(Vec::new()));

        let first = order.clone();
        let second = order.clone();
        let third = order.clone();
        let failures = run_best_effort(vec![
            (
                "first",
                Box::new(move || {
                    first.borrow_mut().push("first");
                    Err(anyhow!("simulated failure"))
                }),
            ),
            (
                "second",
                Box::new(move || {
                    second.borrow_mut().push("second");
                    Ok(())
                }),
            ),
            (
                "third",
                Box::new(move || {
                    third.borrow_mut().push("third");
                    Ok(())
                }),
            ),
        ]);

        assert_eq!(failures, 1);
        assert_eq!(*order.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_best_effort_with_no_steps() {
        assert_eq!(run_best_effort(Vec::new()), 0);
    }
}
