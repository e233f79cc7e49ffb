//! Pure tic-tac-toe rules: the 3x3 grid, turn tracking and outcome detection.

use std::fmt;

pub const BOARD_SIZE: usize = 3;
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// The two player marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Symbol::X => 'X',
            Symbol::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Symbol::X),
            'O' => Some(Symbol::O),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single grid square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Symbol),
}

impl Cell {
    /// Wire encoding, a space stands for an empty cell
    pub fn as_char(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::Taken(symbol) => symbol.as_char(),
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(Cell::Empty),
            other => Symbol::from_char(other).map(Cell::Taken),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }
}

/// A request to place `symbol` at (`row`, `col`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub symbol: Symbol,
}

impl Move {
    pub fn new(row: usize, col: usize, symbol: Symbol) -> Self {
        Self { row, col, symbol }
    }

    /// Maps a keypad-style cell number (1-9, row-major) onto a move
    pub fn from_cell_index(index: u8, symbol: Symbol) -> Option<Self> {
        if !(1..=CELL_COUNT as u8).contains(&index) {
            return None;
        }
        let zero_based = (index - 1) as usize;
        Some(Self::new(
            zero_based / BOARD_SIZE,
            zero_based % BOARD_SIZE,
            symbol,
        ))
    }

    pub fn in_bounds(&self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    InProgress,
    Win(Symbol),
    Draw,
}

/// Why a move was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    OutOfBounds,
    Occupied,
    WrongTurn { expected: Symbol },
}

impl fmt::Display for MoveRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveRejection::OutOfBounds => write!(f, "cell out of bounds"),
            MoveRejection::Occupied => write!(f, "cell occupied"),
            MoveRejection::WrongTurn { expected } => write!(f, "not your turn, {} to move", expected),
        }
    }
}

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// The game board together with whose turn it is
///
/// The server owns the authoritative instance; clients keep a copy that is
/// overwritten by `STATE` broadcasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
    current_turn: Symbol,
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE],
            current_turn: Symbol::X,
        }
    }

    /// Builds a board from row-major cells
    ///
    /// X always opens, so the side to move follows from the mark counts: O is
    /// to move exactly when X has placed more marks.
    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        let mut board = Self::new();
        for (i, cell) in cells.into_iter().enumerate() {
            board.cells[i / BOARD_SIZE][i % BOARD_SIZE] = cell;
        }
        if board.count(Symbol::X) > board.count(Symbol::O) {
            board.current_turn = Symbol::O;
        }
        board
    }

    fn count(&self, symbol: Symbol) -> usize {
        self.cells().filter(|c| *c == Cell::Taken(symbol)).count()
    }

    pub fn current_turn(&self) -> Symbol {
        self.current_turn
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) -> bool {
        match self.cells.get_mut(row).and_then(|r| r.get_mut(col)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    /// Row-major iteration over all nine cells
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells.iter().flat_map(|row| row.iter().copied())
    }

    pub fn is_empty(&self) -> bool {
        self.cells().all(Cell::is_empty)
    }

    pub fn is_full(&self) -> bool {
        self.cells().all(|c| !c.is_empty())
    }

    /// Places the move if the cell is free and it is the mover's turn.
    /// The turn is left unchanged; see [`Board::advance_turn`].
    pub fn apply_move(&mut self, mv: Move) -> Result<(), MoveRejection> {
        if !mv.in_bounds() {
            return Err(MoveRejection::OutOfBounds);
        }
        if mv.symbol != self.current_turn {
            return Err(MoveRejection::WrongTurn {
                expected: self.current_turn,
            });
        }
        if !self.cells[mv.row][mv.col].is_empty() {
            return Err(MoveRejection::Occupied);
        }

        self.cells[mv.row][mv.col] = Cell::Taken(mv.symbol);
        Ok(())
    }

    /// Checks for a line of the side to move before checking for a full board,
    /// so a filling move that completes a line is a win.
    pub fn evaluate_outcome(&self) -> GameOutcome {
        let mark = Cell::Taken(self.current_turn);
        let has_line = LINES
            .iter()
            .any(|line| line.iter().all(|&(r, c)| self.cells[r][c] == mark));

        if has_line {
            GameOutcome::Win(self.current_turn)
        } else if self.is_full() {
            GameOutcome::Draw
        } else {
            GameOutcome::InProgress
        }
    }

    pub fn advance_turn(&mut self) {
        self.current_turn = self.current_turn.opponent();
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Nine characters, row-major, space for empty
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for cell in self.cells() {
            write!(f, "{}", cell.as_char())?;
        }
        Ok(())
    }
}
