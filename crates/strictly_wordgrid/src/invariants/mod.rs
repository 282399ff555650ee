//! First-class invariants for a game session.
//!
//! Invariants are properties of [`SessionState`] that every operation must
//! preserve. They are checked in debug builds after each transition and can
//! be tested on their own.

use crate::state::SessionState;
use tracing::{instrument, warn};

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of [`Invariant`]s.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();

        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }

        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }

        if !I3::holds(state) {
            violations.push(InvariantViolation::new(I3::description()));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

pub mod staged_cells;
pub mod staging_on_turn;
pub mod tiles_accounted;

pub use staged_cells::StagedCellsHoldGlyphs;
pub use staging_on_turn::StagingOnlyOnTurn;
pub use tiles_accounted::TilesAccountedOnce;

/// All session invariants as a composable set.
pub type SessionInvariants = (StagingOnlyOnTurn, TilesAccountedOnce, StagedCellsHoldGlyphs);

/// Asserts that all session invariants hold (panics on violation in debug builds).
#[instrument(skip(state))]
pub fn assert_invariants(state: &SessionState) {
    if let Err(violations) = SessionInvariants::check_all(state) {
        for violation in &violations {
            warn!(invariant = %violation.description, "Session invariant violated");
        }
        debug_assert!(violations.is_empty(), "Session invariants violated: {violations:?}");
    }
}
