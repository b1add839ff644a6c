//! Path representation for boxes and lines.
//!
//! A path is an ordered list of grid points. Points carry flags that tell the
//! renderer how to draw them: control points become rounded corners, marker
//! points become arrow heads, and ticks are drawn as overlays on the line.

use serde_json::{Map, Value};

use crate::text::TextRun;

/// Style options attached to paths, text and groups.
///
/// Insertion order is preserved so rendered attributes are stable.
pub type Options = Map<String, Value>;

/// Prefix of option keys that carry directives rather than SVG attributes.
pub const DIRECTIVE_PREFIX: &str = "a2s:";

/// Pixel size of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    pub const DEFAULT_X: f64 = 9.0;
    pub const DEFAULT_Y: f64 = 16.0;

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rendered position of the center of a (possibly fractional) grid cell.
    pub fn to_pixels(&self, row: f64, col: f64) -> (f64, f64) {
        (
            col * self.x + self.x / 2.0,
            row * self.y + self.y / 2.0,
        )
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::new(Self::DEFAULT_X, Self::DEFAULT_Y)
    }
}

/// Point flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointFlags {
    /// Rounded corner
    pub control: bool,
    /// Arrow head at the far end of a walk, pointing away from the line
    pub end_marker: bool,
    /// Arrow head where the walk began, pointing back at the line's start
    pub incoming_marker: bool,
    /// Cross-hatch tick (`x`)
    pub tick: bool,
    /// Filled dot (`o`)
    pub dot: bool,
}

impl PointFlags {
    pub fn vertex() -> Self {
        Self::default()
    }

    pub fn control() -> Self {
        Self {
            control: true,
            ..Self::default()
        }
    }

    pub fn end_marker() -> Self {
        Self {
            end_marker: true,
            ..Self::default()
        }
    }

    pub fn incoming_marker() -> Self {
        Self {
            incoming_marker: true,
            ..Self::default()
        }
    }

    pub fn tick() -> Self {
        Self {
            tick: true,
            ..Self::default()
        }
    }

    pub fn dot() -> Self {
        Self {
            dot: true,
            ..Self::default()
        }
    }

    /// Flags for a corner glyph: curves become control points.
    pub fn for_corner(c: Option<char>) -> Self {
        if crate::chars::is_curve(c) {
            Self::control()
        } else {
            Self::vertex()
        }
    }

    pub fn is_marker(&self) -> bool {
        self.end_marker || self.incoming_marker
    }
}

/// A point on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub row: i32,
    pub col: i32,
    pub flags: PointFlags,
}

impl Point {
    pub fn new(row: i32, col: i32, flags: PointFlags) -> Self {
        Self { row, col, flags }
    }

    /// Same grid cell, ignoring flags
    pub fn same_cell(&self, other: &Point) -> bool {
        self.row == other.row && self.col == other.col
    }

    /// Rendered coordinates for this point
    pub fn pixels(&self, scale: &Scale) -> (f64, f64) {
        scale.to_pixels(self.row as f64, self.col as f64)
    }

    /// Command table key: `"row,col"`
    pub fn key(&self) -> String {
        format!("{},{}", self.row, self.col)
    }
}

/// Result of adding a point to a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPoint {
    Added,
    /// The point was the path's origin; the path is now closed.
    Closed,
    /// The point is already on the path.
    Exists,
}

/// An open line or closed polygon
#[derive(Debug, Clone, Default)]
pub struct Path {
    points: Vec<Point>,
    ticks: Vec<Point>,
    text: Vec<TextRun>,
    options: Options,
    closed: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point.
    ///
    /// Landing on the first point closes the path; landing on any other point
    /// already on the path does nothing. Either way nothing is stored twice.
    pub fn add_point(&mut self, row: i32, col: i32, flags: PointFlags) -> AddPoint {
        let p = Point::new(row, col, flags);
        if let Some(first) = self.points.first() {
            if first.same_cell(&p) {
                self.closed = true;
                return AddPoint::Closed;
            }
            if self.points.iter().any(|q| q.same_cell(&p)) {
                return AddPoint::Exists;
            }
        }
        self.points.push(p);
        AddPoint::Added
    }

    /// Append a marker point unconditionally.
    pub fn add_marker(&mut self, row: i32, col: i32, flags: PointFlags) {
        self.points.push(Point::new(row, col, flags));
    }

    /// Record a tick or dot overlay.
    pub fn add_tick(&mut self, row: i32, col: i32, flags: PointFlags) {
        self.ticks.push(Point::new(row, col, flags));
    }

    /// Drop the most recent point, used when backing out of a branch.
    pub fn pop_point(&mut self) -> Option<Point> {
        self.points.pop()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn ticks(&self) -> &[Point] {
        &self.ticks
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rotate a closed polygon so that its top-left point comes first.
    ///
    /// Top-left is the minimum by row, then by column. Winding is preserved.
    pub fn order_points(&mut self) {
        let min = self
            .points
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| (p.row, p.col))
            .map(|(i, _)| i);
        if let Some(i) = min {
            self.points.rotate_left(i);
        }
    }

    /// Canonical form for a traced box: no collinear vertices, clockwise on
    /// screen, top-left point first.
    pub fn normalize(&mut self) {
        self.drop_collinear();
        if !self.is_clockwise() {
            self.points.reverse();
        }
        self.order_points();
    }

    /// Remove plain vertices that sit in the middle of a straight run.
    ///
    /// Rounded corners are kept even when collinear.
    fn drop_collinear(&mut self) {
        while self.points.len() > 3 {
            let n = self.points.len();
            let found = (0..n).find(|&i| {
                let prev = self.points[(i + n - 1) % n];
                let next = self.points[(i + 1) % n];
                let p = self.points[i];
                !p.flags.control
                    && ((prev.row == p.row && p.row == next.row)
                        || (prev.col == p.col && p.col == next.col))
            });
            match found {
                Some(i) => {
                    self.points.remove(i);
                }
                None => break,
            }
        }
    }

    /// Whether the polygon winds clockwise on screen (rows grow downwards).
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() > 0
    }

    /// Twice the shoelace area with `x` as the column and `y` as the row.
    fn signed_area(&self) -> i64 {
        let n = self.points.len();
        (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                a.col as i64 * b.row as i64 - b.col as i64 * a.row as i64
            })
            .sum()
    }

    /// Whether two polygons are made of the same points, in any order.
    pub fn same_shape(&self, other: &Path) -> bool {
        self.points.len() == other.points.len()
            && self
                .points
                .iter()
                .all(|p| other.points.iter().any(|q| q.same_cell(p)))
    }

    /// Even-odd point-in-polygon test in grid units (`x` is the column).
    ///
    /// Open paths contain nothing.
    pub fn has_point(&self, x: f64, y: f64) -> bool {
        if !self.closed || self.points.is_empty() {
            return false;
        }

        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let (xi, yi) = (self.points[i].col as f64, self.points[i].row as f64);
            let (xj, yj) = (self.points[j].col as f64, self.points[j].row as f64);
            if ((yi < y && yj >= y) || (yj < y && yi >= y))
                && (xi <= x || xj <= x)
                && xi + (y - yi) / (yj - yi) * (xj - xi) < x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    pub fn add_text(&mut self, text: TextRun) {
        self.text.push(text);
    }

    pub fn text(&self) -> &[TextRun] {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut [TextRun] {
        &mut self.text
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// String value of an option, if it is one.
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    pub fn set_option(&mut self, key: &str, value: impl Into<Value>) {
        self.options.insert(key.to_string(), value.into());
    }

    /// Merge options; incoming keys win.
    pub fn set_options(&mut self, options: &Options) {
        for (k, v) in options {
            self.options.insert(k.clone(), v.clone());
        }
    }
}

/// Format a coordinate for SVG output:
/// - Use 5 decimal places max
/// - Strip trailing zeros and decimal point
pub fn format_coord(x: f64) -> String {
    let s = format!("{:.5}", x);
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        &s
    };
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Render an option value as an attribute value.
pub fn option_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
