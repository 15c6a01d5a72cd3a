//! Game state for the number-place puzzle.
//!
//! This is the one module the application mounts, under [`KEY`]. It keeps
//! the puzzle clues, the player's board, the selected cell and a running
//! problem index; play happens through its [`Mutation`]s and [`Action`]s.
//! Solving and validation live elsewhere, this module only holds state.

mod grid;

pub use grid::{Cell, Grid, ProblemError, SIZE};

use serde::Serialize;

use crate::store::{ActionContext, Module, ModuleError};

/// Key the module is mounted under. It faces the JSON snapshot, so it is
/// camel-cased like the rest of the state tree.
pub const KEY: &str = "numberPlace";

/// Everything the game screen needs to draw a round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberPlaceState {
    /// The puzzle clues. Fixed for the duration of a round.
    pub givens: Grid,
    /// The board as played, clues included.
    pub entries: Grid,
    /// The cell digits are entered into, if any.
    pub selected: Option<Cell>,
    /// How many problems have been loaded so far; doubles as the index
    /// to request the next problem with.
    pub problem_index: usize,
}

impl NumberPlaceState {
    /// Digit currently on the board at `cell`, `0` when empty.
    pub fn digit(&self, cell: Cell) -> u8 {
        self.entries.digit(cell)
    }

    /// Whether `cell` holds a clue.
    pub fn is_given(&self, cell: Cell) -> bool {
        self.givens.digit(cell) != 0
    }

    /// Cells still empty on the board.
    pub fn remaining(&self) -> usize {
        self.entries.count(0)
    }

    /// Cells the puzzle left open for the player.
    pub fn open_cells(&self) -> usize {
        self.givens.count(0)
    }
}

/// Atomic state changes of a round.
#[derive(Debug)]
pub enum Mutation {
    /// Make a cell the entry target. Clue cells and off-board positions
    /// are refused; the previous selection stays.
    Select(Cell),
    /// Write a digit at the selected cell, `0` clearing it. Dropped when
    /// nothing is selected or the digit is above 9.
    Enter(u8),
    /// Install a new puzzle: clues and board both become the given grid,
    /// the selection clears and the problem index advances.
    LoadProblem(Grid),
    /// Wipe the player's entries, back to the bare clues.
    Restart,
}

/// Higher-level operations, resolved into mutations.
#[derive(Debug)]
pub enum Action {
    /// Start a round on the given puzzle.
    NewGame(Grid),
    /// Start a round from a problem payload in the JSON wire format.
    NewGameFromJson(String),
    /// Select a cell and enter a digit in one step.
    Place { cell: Cell, digit: u8 },
    /// Start the current puzzle over.
    Restart,
}

/// The module itself. Stateless; every bit of game state lives in the
/// store.
#[derive(Debug, Default)]
pub struct NumberPlace;

impl Module for NumberPlace {
    type State = NumberPlaceState;
    type Mutation = Mutation;
    type Action = Action;

    fn initial_state(&self) -> NumberPlaceState {
        NumberPlaceState::default()
    }

    fn mutate(&self, state: &mut NumberPlaceState, mutation: Mutation) {
        match mutation {
            Mutation::Select(cell) => {
                if !cell.in_bounds() {
                    tracing::warn!(?cell, "selection off the board, ignored");
                } else if state.is_given(cell) {
                    tracing::debug!(?cell, "clue cells cannot be selected");
                } else {
                    state.selected = Some(cell);
                }
            }
            Mutation::Enter(digit) => {
                if digit > 9 {
                    tracing::warn!(digit, "digit out of range, ignored");
                } else if let Some(cell) = state.selected {
                    state.entries.set(cell, digit);
                } else {
                    tracing::debug!(digit, "no cell selected, digit dropped");
                }
            }
            Mutation::LoadProblem(grid) => {
                state.givens = grid;
                state.entries = grid;
                state.selected = None;
                state.problem_index += 1;
            }
            Mutation::Restart => {
                state.entries = state.givens;
            }
        }
    }

    fn handle(&self, ctx: &ActionContext<'_, Self>, action: Action) -> Result<(), ModuleError> {
        match action {
            Action::NewGame(grid) => {
                ctx.commit(Mutation::LoadProblem(grid));
                Ok(())
            }
            Action::NewGameFromJson(json) => {
                let grid = Grid::from_json(&json)?;
                ctx.commit(Mutation::LoadProblem(grid));
                Ok(())
            }
            Action::Place { cell, digit } => {
                if !cell.in_bounds() || ctx.read(|state| state.is_given(cell)) {
                    tracing::debug!(?cell, digit, "cannot place here");
                    return Ok(());
                }
                ctx.commit(Mutation::Select(cell));
                ctx.commit(Mutation::Enter(digit));
                Ok(())
            }
            Action::Restart => {
                ctx.commit(Mutation::Restart);
                Ok(())
            }
        }
    }
}
