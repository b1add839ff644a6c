//! Character classification for diagram glyphs.
//!
//! Every predicate takes an `Option<char>`: `None` means the cell is off the
//! grid and never classifies as anything.

/// Travel direction across the grid.
///
/// Only the two eastward diagonals exist: diagonals are always discovered
/// from their westernmost end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    NorthEast,
    SouthEast,
}

impl Direction {
    /// Row and column step for one move in this direction.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::NorthEast => (-1, 1),
            Direction::SouthEast => (1, 1),
        }
    }

    /// Bit used in per-cell visited-direction sets.
    pub fn bit(self) -> u8 {
        match self {
            Direction::Up => 0x01,
            Direction::Down => 0x02,
            Direction::Left => 0x04,
            Direction::Right => 0x08,
            Direction::NorthEast => 0x10,
            Direction::SouthEast => 0x20,
        }
    }

    /// Clockwise quarter turn. Diagonals have no turn and map to themselves.
    pub fn turn_right(self) -> Direction {
        match self {
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
            Direction::Up => Direction::Right,
            diagonal => diagonal,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }
}

/// Any corner: `.`, `'`, `#` or `+`.
pub fn is_corner(c: Option<char>) -> bool {
    matches!(c, Some('.' | '\'' | '#' | '+'))
}

/// Corners that the box wall follower turns at. `+` is excluded here because
/// it is treated as a traversable edge while following walls.
pub fn is_box_corner(c: Option<char>) -> bool {
    matches!(c, Some('.' | '\'' | '#'))
}

/// Curved corners render as Bezier control points.
pub fn is_curve(c: Option<char>) -> bool {
    matches!(c, Some('.' | '\''))
}

/// Line material. Ticks (`o`, `x`) are edges in every direction.
pub fn is_edge(c: Option<char>, dir: Option<Direction>) -> bool {
    if is_tick(c) {
        return true;
    }
    match dir {
        None => matches!(c, Some('-' | '|' | ':' | '=' | '*' | '/' | '\\')),
        Some(Direction::Up | Direction::Down) => matches!(c, Some('|' | ':' | '*')),
        Some(Direction::Left | Direction::Right) => matches!(c, Some('-' | '=' | '*')),
        Some(Direction::NorthEast) => c == Some('/'),
        Some(Direction::SouthEast) => c == Some('\\'),
    }
}

/// Box wall material. Unlike [`is_edge`], `+` is accepted as a straight
/// segment and diagonals never are.
pub fn is_box_edge(c: Option<char>, dir: Option<Direction>) -> bool {
    match dir {
        None => matches!(c, Some('-' | '|' | ':' | '=' | '*' | '+')),
        Some(Direction::Up | Direction::Down) => matches!(c, Some('|' | ':' | '*' | '+')),
        Some(Direction::Left | Direction::Right) => matches!(c, Some('-' | '=' | '*' | '+')),
        Some(Direction::NorthEast | Direction::SouthEast) => false,
    }
}

/// Arrow heads.
pub fn is_marker(c: Option<char>) -> bool {
    matches!(c, Some('v' | '^' | '<' | '>'))
}

/// Inline tick (`x`) or dot (`o`).
pub fn is_tick(c: Option<char>) -> bool {
    matches!(c, Some('o' | 'x'))
}

/// Vertical line glyphs that can begin or continue a line.
pub fn is_v_line(c: Option<char>) -> bool {
    matches!(c, Some('|' | ':'))
}

/// Horizontal line glyphs that can begin or continue a line.
pub fn is_h_line(c: Option<char>) -> bool {
    matches!(c, Some('-' | '='))
}

/// Dashed variants of the straight line glyphs.
pub fn is_dashed(c: Option<char>) -> bool {
    matches!(c, Some(':' | '='))
}

/// Whether a path may turn from the corner `from` onto the neighbor `to`.
///
/// A curve corner cannot turn into another curve corner of the same kind:
/// a run like `.-.` over `.` is two tops, never a top and a side.
pub fn can_turn(from: Option<char>, to: Option<char>) -> bool {
    match from {
        Some('.') => to != Some('.'),
        Some('\'') => to != Some('\''),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corners() {
        for c in ['.', '\'', '#', '+'] {
            assert!(is_corner(Some(c)));
        }
        assert!(!is_box_corner(Some('+')));
        assert!(is_box_corner(Some('#')));
        assert!(!is_corner(None));
        assert!(!is_corner(Some(' ')));
    }

    #[test]
    fn test_edges_by_direction() {
        assert!(is_edge(Some('|'), Some(Direction::Down)));
        assert!(!is_edge(Some('|'), Some(Direction::Left)));
        assert!(is_edge(Some('='), Some(Direction::Right)));
        assert!(is_edge(Some('/'), Some(Direction::NorthEast)));
        assert!(!is_edge(Some('/'), Some(Direction::SouthEast)));
        assert!(is_edge(Some('\\'), Some(Direction::SouthEast)));
        assert!(is_edge(Some('\\'), None));
        // ticks sit on any line
        assert!(is_edge(Some('o'), Some(Direction::Up)));
        assert!(is_edge(Some('x'), Some(Direction::NorthEast)));
        assert!(!is_edge(None, None));
    }

    #[test]
    fn test_box_edges_accept_plus() {
        assert!(is_box_edge(Some('+'), Some(Direction::Right)));
        assert!(is_box_edge(Some('+'), Some(Direction::Up)));
        assert!(!is_edge(Some('+'), Some(Direction::Up)));
        assert!(!is_box_edge(Some('/'), None));
        assert!(!is_box_edge(Some('|'), Some(Direction::Left)));
    }

    #[test]
    fn test_markers_and_ticks() {
        for c in ['v', '^', '<', '>'] {
            assert!(is_marker(Some(c)));
        }
        assert!(!is_marker(Some('V')));
        assert!(is_tick(Some('o')));
        assert!(is_tick(Some('x')));
        assert!(!is_tick(Some('*')));
    }

    #[test]
    fn test_can_turn() {
        assert!(!can_turn(Some('.'), Some('.')));
        assert!(can_turn(Some('.'), Some('\'')));
        assert!(!can_turn(Some('\''), Some('\'')));
        assert!(can_turn(Some('+'), Some('+')));
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::NorthEast.delta(), (-1, 1));
        assert_eq!(Direction::Left.delta(), (0, -1));
        assert_eq!(Direction::Up.bit() & Direction::Down.bit(), 0);
    }

    #[test]
    fn test_turn_right_cycles() {
        let mut dir = Direction::Right;
        for expected in [Direction::Down, Direction::Left, Direction::Up, Direction::Right] {
            dir = dir.turn_right();
            assert_eq!(dir, expected);
        }
        assert_eq!(Direction::NorthEast.turn_right(), Direction::NorthEast);
    }
}
