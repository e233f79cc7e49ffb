use log::{debug, info};
use shared::{Board, Frame, GameOutcome, Move, MoveRejection};

/// The authoritative game, wrapping the single server-side [`Board`]
///
/// Every mutating call returns the frames that must be broadcast, in the order
/// they have to reach the clients. Callers hold the game lock until those
/// frames are queued so all sessions see the same sequence.
#[derive(Debug, Clone, Default)]
pub struct Game {
    board: Board,
    games_played: u32,
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full snapshot of the board, sent on connect and after every change
    pub fn snapshot(&self) -> Frame {
        Frame::State(self.board.clone())
    }

    /// Applies a move and produces the resulting broadcasts
    ///
    /// On success the frames are the echoed move, then `WINNER`/`DRAW` if the
    /// game ended, then the new board state. A finished game resets the board
    /// before the state is taken, so clients always end on a playable board.
    pub fn apply_move(&mut self, mv: Move) -> Result<Vec<Frame>, MoveRejection> {
        self.board.apply_move(mv)?;
        debug!("Accepted move {},{} for {}", mv.row, mv.col, mv.symbol);

        let mut frames = vec![Frame::Move(mv)];

        match self.board.evaluate_outcome() {
            GameOutcome::Win(symbol) => {
                info!("Player {} wins", symbol);
                frames.push(Frame::Winner(symbol));
                self.finish_game();
            }
            GameOutcome::Draw => {
                info!("Game ended in a draw");
                frames.push(Frame::Draw);
                self.finish_game();
            }
            GameOutcome::InProgress => {
                self.board.advance_turn();
            }
        }

        frames.push(self.snapshot());
        Ok(frames)
    }

    /// Clears the board regardless of game phase
    pub fn reset(&mut self) -> Frame {
        info!("Resetting game");
        self.board.reset();
        self.snapshot()
    }

    fn finish_game(&mut self) {
        self.games_played += 1;
        info!("Game {} finished, starting a new one", self.games_played);
        self.board.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Cell, Symbol};

    fn play(game: &mut Game, moves: &[(usize, usize, Symbol)]) -> Vec<Frame> {
        let mut last = Vec::new();
        for &(row, col, symbol) in moves {
            last = game.apply_move(Move::new(row, col, symbol)).unwrap();
        }
        last
    }

    #[test]
    fn test_move_in_progress_broadcasts_move_then_state() {
        let mut game = Game::new();
        let frames = game.apply_move(Move::new(0, 0, Symbol::X)).unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], Frame::Move(Move::new(0, 0, Symbol::X)));
        assert_eq!(frames[1].to_string(), "STATE:X        ");
        assert_eq!(game.board.current_turn(), Symbol::O);
    }

    #[test]
    fn test_rejected_move_produces_nothing() {
        let mut game = Game::new();
        assert_eq!(
            game.apply_move(Move::new(0, 0, Symbol::O)),
            Err(MoveRejection::WrongTurn {
                expected: Symbol::X
            })
        );

        game.apply_move(Move::new(0, 0, Symbol::X)).unwrap();
        assert_eq!(
            game.apply_move(Move::new(0, 0, Symbol::O)),
            Err(MoveRejection::Occupied)
        );
        assert_eq!(game.board.cell(0, 0), Some(Cell::Taken(Symbol::X)));
        assert_eq!(game.board.current_turn(), Symbol::O);
    }

    #[test]
    fn test_win_broadcasts_winner_and_resets() {
        let mut game = Game::new();
        let frames = play(
            &mut game,
            &[
                (0, 0, Symbol::X),
                (1, 1, Symbol::O),
                (0, 1, Symbol::X),
                (2, 2, Symbol::O),
                (0, 2, Symbol::X),
            ],
        );

        let text: Vec<String> = frames.iter().map(Frame::to_string).collect();
        assert_eq!(text, vec!["MOVE:0,2,X", "WINNER:X", "STATE:         "]);
        assert_eq!(game.board, Board::new());
        assert_eq!(game.games_played, 1);
    }

    #[test]
    fn test_draw_broadcasts_draw_and_resets() {
        let mut game = Game::new();
        // X O X / X O O / O X X
        let frames = play(
            &mut game,
            &[
                (0, 0, Symbol::X),
                (0, 1, Symbol::O),
                (0, 2, Symbol::X),
                (1, 1, Symbol::O),
                (1, 0, Symbol::X),
                (1, 2, Symbol::O),
                (2, 1, Symbol::X),
                (2, 0, Symbol::O),
                (2, 2, Symbol::X),
            ],
        );

        assert_eq!(frames[1], Frame::Draw);
        assert_eq!(frames[2], Frame::State(Board::new()));
        assert_eq!(game.board.current_turn(), Symbol::X);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut game = Game::new();
        game.apply_move(Move::new(1, 1, Symbol::X)).unwrap();

        let first = game.reset();
        let second = game.reset();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), "STATE:         ");
        assert_eq!(game.games_played, 0);
    }
}
