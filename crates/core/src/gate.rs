//! Interaction gate - whether player moves are currently accepted
//!
//! The gate is closed while a board is being seeded or a cascade is in
//! flight, and only the engine itself flips it. Collaborators read it
//! through [`BoardEngine::is_accepting_moves`](crate::BoardEngine::is_accepting_moves)
//! and [`BoardEngine::selected`](crate::BoardEngine::selected).

use crate::types::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InteractionGate {
    accepting: bool,
    selected: Option<Position>,
}

impl InteractionGate {
    /// A closed gate with no selection
    pub(crate) fn closed() -> Self {
        Self::default()
    }

    pub fn is_accepting_moves(&self) -> bool {
        self.accepting
    }

    /// The tile a pending tap-tap swap starts from, if any
    pub fn selected(&self) -> Option<Position> {
        self.selected
    }

    pub(crate) fn open(&mut self) {
        self.accepting = true;
    }

    /// Close the gate. A pending selection does not survive a closed gate.
    pub(crate) fn close(&mut self) {
        self.accepting = false;
        self.selected = None;
    }

    pub(crate) fn select(&mut self, pos: Position) {
        self.selected = Some(pos);
    }

    pub(crate) fn clear_selection(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_clears_selection() {
        let mut gate = InteractionGate::closed();
        assert!(!gate.is_accepting_moves());

        gate.open();
        gate.select(Position::new(2, 3));
        assert_eq!(gate.selected(), Some(Position::new(2, 3)));

        gate.close();
        assert!(!gate.is_accepting_moves());
        assert_eq!(gate.selected(), None);
    }
}
