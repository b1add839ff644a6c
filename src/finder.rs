//! Box and line finding.
//!
//! Boxes are found first by following walls clockwise from every corner, then
//! erased. Lines are found on what is left, scanning column by column so that
//! vertical runs are met at their top end.

use std::collections::HashMap;

use log::{debug, trace};

use crate::chars::*;
use crate::commands::{resolve_reference, Commands};
use crate::grid::Grid;
use crate::group::{Groups, BOXES, LINES};
use crate::path::{AddPoint, Path, PointFlags};

const DROP_SHADOW: &str = "url(#dsFilter)";
const DROP_SHADOW_NO_BLUR: &str = "url(#dsFilterNoBlur)";
const DASHED: &str = "5 5";

fn set_stroke_defaults(groups: &mut Groups) {
    groups.set_option("stroke", "black");
    groups.set_option("stroke-width", "2");
    groups.set_option("fill", "none");
}

fn neighbor(grid: &Grid, row: i32, col: i32, dir: Direction) -> Option<char> {
    let (dr, dc) = dir.delta();
    grid.get(row + dr, col + dc)
}

// ============================================================================
// Boxes
// ============================================================================

/// Find every closed polygon, add it to the `boxes` group and erase it.
///
/// Corners are left on the grid (deferred) since lines may still start from
/// them.
pub fn find_boxes(grid: &mut Grid, groups: &mut Groups, commands: &Commands, blur: bool) {
    groups.push_group(BOXES);
    set_stroke_defaults(groups);

    let mut boxes: Vec<Path> = Vec::new();
    for row in 0..grid.height() as i32 {
        for col in 0..grid.row_len(row) as i32 {
            if !is_corner(grid.get(row, col)) {
                continue;
            }

            let Some(mut path) = WallFollower::trace(grid, row, col) else {
                continue;
            };
            path.normalize();

            if boxes.iter().any(|b| b.same_shape(&path)) {
                trace!("box from {row},{col} was already found");
                continue;
            }

            path.set_option("filter", if blur { DROP_SHADOW } else { DROP_SHADOW_NO_BLUR });
            if let Some(name) = resolve_reference(grid, &mut path, commands) {
                trace!("box from {row},{col} references [{name}]");
            }
            debug!("found box with {} points from {row},{col}", path.len());
            boxes.push(path);
        }
    }

    for b in &boxes {
        grid.erase(b);
    }
    for b in boxes {
        groups.add_object(b);
    }

    groups.pop_group();
}

/// Clockwise wall follower for a single start corner.
///
/// `visits` holds the directions already taken out of each corner on the
/// current branch. A frame removes its own entry on return, so sibling
/// branches never see each other's choices.
struct WallFollower<'g> {
    grid: &'g Grid,
    origin: (i32, i32),
    path: Path,
    visits: HashMap<(i32, i32), u8>,
}

impl<'g> WallFollower<'g> {
    /// Try to close a polygon starting at the corner at (row, col).
    fn trace(grid: &'g Grid, row: i32, col: i32) -> Option<Path> {
        let mut path = Path::new();
        path.add_point(row, col, PointFlags::for_corner(grid.get(row, col)));

        let mut follower = WallFollower {
            grid,
            origin: (row, col),
            path,
            visits: HashMap::new(),
        };
        follower.follow(row, col + 1, Direction::Right, 0);

        follower.path.is_closed().then_some(follower.path)
    }

    /// Whether a `+` in the middle of a run acts as a corner.
    ///
    /// It does when the run cannot go on past it, or when a wall leaves it on
    /// the right-hand side. The start corner also stops a vertical run, which
    /// is how the left wall closes the polygon.
    fn stops_at(&self, row: i32, col: i32, dir: Direction) -> bool {
        if self.grid.get(row, col) != Some('+') {
            return false;
        }
        if (row, col) == self.origin && dir.is_vertical() {
            return true;
        }

        let next = neighbor(self.grid, row, col, dir);
        if !(is_box_edge(next, Some(dir)) || is_box_corner(next)) {
            return true;
        }

        let side = dir.turn_right();
        let right = neighbor(self.grid, row, col, side);
        is_box_edge(right, Some(side)) || is_box_corner(right)
    }

    fn follow(&mut self, mut row: i32, mut col: i32, dir: Direction, depth: u32) {
        let depth = depth + 1;
        let (dr, dc) = dir.delta();

        let mut cur = self.grid.get(row, col);
        while is_box_edge(cur, Some(dir)) && !self.stops_at(row, col, dir) {
            row += dr;
            col += dc;
            cur = self.grid.get(row, col);
        }

        let key = (row, col);
        if self.visits.contains_key(&key) {
            return;
        }
        if !(is_box_corner(cur) || cur == Some('+')) {
            return;
        }

        self.visits.insert(key, 0);
        self.turn(row, col, cur, dir, depth);
        self.visits.remove(&key);
    }

    fn tried(&self, key: (i32, i32), dir: Direction) -> bool {
        self.visits.get(&key).is_some_and(|bits| bits & dir.bit() != 0)
    }

    /// Whether the wall may leave the corner `cur` heading `dir`.
    fn can_leave(&self, row: i32, col: i32, cur: Option<char>, dir: Direction) -> bool {
        if self.tried((row, col), dir) {
            return false;
        }
        let target = neighbor(self.grid, row, col, dir);
        if !(is_box_edge(target, Some(dir)) || is_box_corner(target)) {
            return false;
        }
        !dir.is_vertical() || can_turn(cur, target)
    }

    /// Leave the corner at (row, col) heading `dir`. Returns true once the
    /// polygon is closed.
    fn branch(&mut self, row: i32, col: i32, dir: Direction, depth: u32) -> bool {
        if let Some(bits) = self.visits.get_mut(&(row, col)) {
            *bits |= dir.bit();
        }
        let (dr, dc) = dir.delta();
        trace!("wall {row},{col} -> {dir:?}");
        self.follow(row + dr, col + dc, dir, depth);
        self.path.is_closed()
    }

    fn turn(&mut self, row: i32, col: i32, cur: Option<char>, dir: Direction, depth: u32) {
        if self.path.add_point(row, col, PointFlags::for_corner(cur)) != AddPoint::Added {
            return;
        }

        // A `.` directly over another `.` on the first corner cannot be the
        // top-right corner; keep scanning along the top edge.
        if depth == 1 && cur == Some('.') && self.grid.get(row + 1, col) == Some('.') {
            self.follow(row, col + 1, dir, 0);
            return;
        }

        let right = dir.turn_right();
        if self.can_leave(row, col, cur, right) {
            if self.branch(row, col, right, depth) {
                return;
            }
        } else if dir == Direction::Right && depth == 1 {
            let s = neighbor(self.grid, row, col, Direction::Down);
            let blocked = self.tried((row, col), Direction::Down)
                || !(is_box_edge(s, Some(Direction::Down)) || is_box_corner(s));
            if blocked {
                // no way down from the first corner: not a top-left start
                return;
            }
        }

        let fallbacks = [
            (Direction::Left, Direction::Right),
            (Direction::Right, Direction::Left),
            (Direction::Up, Direction::Down),
            (Direction::Down, Direction::Up),
        ];
        for (next, opposite) in fallbacks {
            if dir != opposite
                && self.can_leave(row, col, cur, next)
                && self.branch(row, col, next, depth)
            {
                return;
            }
        }

        self.path.pop_point();
    }
}

// ============================================================================
// Lines
// ============================================================================

/// Find every line left on the grid, add it to the `lines` group and erase
/// it as soon as it is found.
pub fn find_lines(grid: &mut Grid, groups: &mut Groups) {
    groups.push_group(LINES);
    set_stroke_defaults(groups);

    let height = grid.height() as i32;
    for col in 0..grid.width() as i32 {
        let mut row = 0;
        while row < height {
            if col >= grid.row_len(row) as i32 {
                row += 1;
                continue;
            }

            let c = grid.get(row, col);
            let Some(dir) = line_start(grid, row, col) else {
                row += 1;
                continue;
            };

            let mut line = Path::new();
            if is_dashed(c) {
                line.set_option("stroke-dasharray", DASHED);
            }
            if is_marker(c) {
                line.add_marker(row, col, PointFlags::incoming_marker());
            } else {
                line.add_point(row, col, PointFlags::vertex());
            }

            let (dr, dc) = dir.delta();
            walk(grid, &mut line, row + dr, col + dc, dir);
            grid.erase(&line);
            debug!("found line with {} points from {row},{col} heading {dir:?}", line.len());
            groups.add_object(line);

            // another line may leave the same corner
            if !is_corner(c) {
                row += 1;
            }
        }
    }

    groups.pop_group();
}

/// Heading of the line starting at (row, col), if one starts there.
fn line_start(grid: &Grid, row: i32, col: i32) -> Option<Direction> {
    use Direction::*;

    let at = |dr: i32, dc: i32| grid.get(row + dr, col + dc);
    let c = at(0, 0);
    let (n, s, e, w) = (at(-1, 0), at(1, 0), at(0, 1), at(0, -1));
    let (ne, se) = (at(-1, 1), at(1, 1));

    match c? {
        '<' => {
            if is_edge(e, Some(Right)) || is_corner(e) {
                Some(Right)
            } else if se == Some('\\') {
                Some(SouthEast)
            } else if ne == Some('/') {
                Some(NorthEast)
            } else {
                None
            }
        }
        '^' => {
            if is_edge(s, Some(Down)) || is_corner(s) {
                Some(Down)
            } else if se == Some('\\') {
                Some(SouthEast)
            } else {
                None
            }
        }
        '>' => (is_edge(w, Some(Left)) || is_corner(w)).then_some(Left),
        'v' => {
            if is_edge(n, Some(Up)) || is_corner(n) {
                Some(Up)
            } else if ne == Some('/') {
                Some(NorthEast)
            } else {
                None
            }
        }
        '|' | ':' => {
            if (is_v_line(s) || is_corner(s)) && !is_v_line(n) && !is_corner(n) && n != Some('^') {
                Some(Down)
            } else if (is_v_line(n) || is_corner(n))
                && !is_v_line(s)
                && !is_corner(s)
                && s != Some('v')
            {
                Some(Up)
            } else {
                None
            }
        }
        '-' | '=' => {
            if (is_h_line(w) || is_corner(w)) && !is_h_line(e) && !is_corner(e) && e != Some('>') {
                Some(Left)
            } else if (is_h_line(e) || is_corner(e))
                && !is_h_line(w)
                && !is_corner(w)
                && w != Some('<')
            {
                Some(Right)
            } else {
                None
            }
        }
        '/' => matches!(ne, Some('/' | '^' | '>')).then_some(NorthEast),
        '\\' => matches!(se, Some('\\' | 'v' | '>')).then_some(SouthEast),
        '+' | '#' => {
            if matches!(ne, Some('/' | '^' | '>')) {
                Some(NorthEast)
            } else if matches!(se, Some('\\' | 'v' | '>')) {
                Some(SouthEast)
            } else {
                corner_start(c, n, s, e, w)
            }
        }
        '.' | '\'' => corner_start(c, n, s, e, w),
        _ => None,
    }
}

/// A corner starts a line when exactly one axis neighbor carries line
/// material away from it.
fn corner_start(
    c: Option<char>,
    n: Option<char>,
    s: Option<char>,
    e: Option<char>,
    w: Option<char>,
) -> Option<Direction> {
    let across = |a, b| !is_v_line(a) && !is_v_line(b);
    let along = |a, b| !is_h_line(a) && !is_h_line(b);

    if is_h_line(w) && !is_h_line(e) && across(n, s) {
        Some(Direction::Left)
    } else if is_h_line(e) && !is_h_line(w) && across(n, s) {
        Some(Direction::Right)
    } else if is_v_line(s) && !is_v_line(n) && along(w, e) && can_turn(c, s) {
        Some(Direction::Down)
    } else if is_v_line(n) && !is_v_line(s) && along(w, e) && can_turn(c, n) {
        Some(Direction::Up)
    } else {
        None
    }
}

/// Walk a line from (row, col), preferring to keep the current heading.
fn walk(grid: &Grid, path: &mut Path, mut row: i32, mut col: i32, mut dir: Direction) {
    loop {
        let (dr, dc) = dir.delta();

        let mut cur = grid.get(row, col);
        while is_edge(cur, Some(dir)) {
            if is_dashed(cur) {
                path.set_option("stroke-dasharray", DASHED);
            }
            if is_tick(cur) {
                let flags = if cur == Some('o') {
                    PointFlags::dot()
                } else {
                    PointFlags::tick()
                };
                path.add_tick(row, col, flags);
                path.add_point(row, col, PointFlags::vertex());
            }
            row += dr;
            col += dc;
            cur = grid.get(row, col);
        }

        if is_corner(cur) {
            if path.add_point(row, col, PointFlags::for_corner(cur)) != AddPoint::Added {
                return;
            }
            let Some(next) = next_heading(grid, row, col, cur, dir) else {
                return;
            };
            trace!("line {row},{col} -> {next:?}");
            let (nr, nc) = next.delta();
            row += nr;
            col += nc;
            dir = next;
        } else if is_marker(cur) {
            path.add_marker(row, col, PointFlags::end_marker());
            return;
        } else {
            path.add_point(row - dr, col - dc, PointFlags::vertex());
            return;
        }
    }
}

/// Heading out of the corner `cur` at (row, col) when arriving with `dir`.
fn next_heading(
    grid: &Grid,
    row: i32,
    col: i32,
    cur: Option<char>,
    dir: Direction,
) -> Option<Direction> {
    use Direction::*;

    let at = |d: Direction| neighbor(grid, row, col, d);
    let continues = |d: Direction| {
        let x = at(d);
        is_corner(x) || is_edge(x, Some(d))
    };

    if continues(dir) {
        return Some(dir);
    }
    if dir != Down && continues(Up) {
        return can_turn(cur, at(Up)).then_some(Up);
    }
    if dir != Up && continues(Down) {
        return can_turn(cur, at(Down)).then_some(Down);
    }
    if dir != Left && continues(Right) {
        return Some(Right);
    }
    if dir != Right && continues(Left) {
        return Some(Left);
    }
    if dir == SouthEast && continues(NorthEast) {
        return Some(NorthEast);
    }
    if dir == NorthEast && continues(SouthEast) {
        return Some(SouthEast);
    }
    None
}
