//! Pass state machine (spec §4.3).
use log::error;

/// The command buffer's current pass phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Outside,
    Render,
    Compute,
    Copy,
}

/// Gates calls by phase; illegal calls are logged and return `WrongPhase`
/// (spec §4.3, §7 "InvalidUsage").
#[derive(Debug)]
pub struct PhaseGate {
    phase: Phase,
}

impl Default for PhaseGate {
    fn default() -> Self {
        Self { phase: Phase::Outside }
    }
}

impl PhaseGate {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = Phase::Outside;
    }

    /// Attempts `Outside -> phase`. Logs and returns `false` (caller must
    /// treat this as an invalid-handle result) if not currently `Outside`.
    pub fn begin(&mut self, phase: Phase, call: &str) -> bool {
        if self.phase != Phase::Outside {
            error!("{call} called while in {:?} phase; pass begins require OUTSIDE", self.phase);
            return false;
        }
        self.phase = phase;
        true
    }

    /// Attempts `phase -> Outside`. Logs and no-ops if the current phase
    /// doesn't match (mismatched begin/end, e.g. `end_compute_pass` while
    /// `RENDER`).
    pub fn end(&mut self, phase: Phase, call: &str) {
        if self.phase != phase {
            error!("{call} called while in {:?} phase, expected {:?}", self.phase, phase);
            return;
        }
        self.phase = Phase::Outside;
    }

    /// Checks that a non-bracketing call (draw, dispatch, copy op, push
    /// uniform) is legal in the current phase, logging and returning
    /// `false` (the caller no-ops) otherwise.
    pub fn require(&self, phase: Phase, call: &str) -> bool {
        if self.phase != phase {
            error!("{call} called while in {:?} phase, expected {:?}; ignored", self.phase, phase);
            return false;
        }
        true
    }

    /// Push-uniform is legal in both RENDER and COMPUTE (spec §4.3).
    pub fn require_render_or_compute(&self, call: &str) -> bool {
        match self.phase {
            Phase::Render | Phase::Compute => true,
            _ => {
                error!("{call} called while in {:?} phase, expected RENDER or COMPUTE; ignored", self.phase);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_end_round_trip() {
        let mut gate = PhaseGate::default();
        assert!(gate.begin(Phase::Render, "begin_render_pass"));
        assert_eq!(gate.phase(), Phase::Render);
        assert!(gate.require(Phase::Render, "draw_primitives"));
        gate.end(Phase::Render, "end_render_pass");
        assert_eq!(gate.phase(), Phase::Outside);
    }

    #[test]
    fn nested_begin_is_rejected() {
        let mut gate = PhaseGate::default();
        assert!(gate.begin(Phase::Render, "begin_render_pass"));
        assert!(!gate.begin(Phase::Compute, "begin_compute_pass"));
        assert_eq!(gate.phase(), Phase::Render, "a rejected begin must not change phase");
    }

    #[test]
    fn draw_outside_a_pass_is_rejected() {
        let gate = PhaseGate::default();
        assert!(!gate.require(Phase::Render, "draw_primitives"));
    }

    #[test]
    fn push_uniform_allowed_in_render_and_compute_only() {
        let mut gate = PhaseGate::default();
        assert!(!gate.require_render_or_compute("push_vertex_uniform_data"));
        gate.begin(Phase::Compute, "begin_compute_pass");
        assert!(gate.require_render_or_compute("push_compute_uniform_data"));
    }
}
