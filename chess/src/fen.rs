use cozy_chess::Board;

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let fen = fen.trim();
    if fen.split_whitespace().count() == 0 {
        return Err(FenError::InvalidFormat);
    }

    fen.parse().map_err(|_| FenError::InvalidBoardLayout)
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("Invalid board layout")]
    InvalidBoardLayout,
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_start_position_round_trip() {
        let board = parse_fen(START).unwrap();
        assert_eq!(format_fen(&board), START);
    }

    #[test]
    fn test_empty_fen_rejected() {
        assert_eq!(parse_fen("   "), Err(FenError::InvalidFormat));
    }

    #[test]
    fn test_missing_king_rejected() {
        let result = parse_fen("8/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(result, Err(FenError::InvalidBoardLayout));
    }
}
