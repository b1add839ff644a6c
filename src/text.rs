//! Text placement.
//!
//! Whatever is left on the grid once boxes and lines are erased is text. Each
//! run is attached to the innermost box containing it, and its fill is picked
//! to contrast with that box's fill.

use std::str::FromStr;

use color::{DynamicColor, Srgb};
use log::trace;
use serde_json::Value;

use crate::grid::Grid;
use crate::group::{Groups, BOXES, TEXT};
use crate::path::{Options, Path};

/// Offset from a run's first cell to its anchor, in grid units.
const ANCHOR_COL_OFFSET: f64 = -0.6;
const ANCHOR_ROW_OFFSET: f64 = 0.3;

/// A run of text anchored at a grid cell
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub row: i32,
    pub col: i32,
    pub text: String,
    options: Options,
}

impl TextRun {
    pub fn new(row: i32, col: i32, text: impl Into<String>) -> Self {
        Self {
            row,
            col,
            text: text.into(),
            options: Options::new(),
        }
    }

    /// Anchor in fractional grid units as `(row, col)`.
    pub fn anchor(&self) -> (f64, f64) {
        (
            self.row as f64 + ANCHOR_ROW_OFFSET,
            self.col as f64 + ANCHOR_COL_OFFSET,
        )
    }

    /// Command table key of the run's first cell
    pub fn key(&self) -> String {
        format!("{},{}", self.row, self.col)
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    pub fn set_option(&mut self, key: &str, value: impl Into<Value>) {
        self.options.insert(key.to_string(), value.into());
    }

    pub fn set_options(&mut self, options: &Options) {
        for (k, v) in options {
            self.options.insert(k.clone(), v.clone());
        }
    }
}

/// Parse a fill into RGB, `None` for `none` or anything unparsable.
pub fn parse_fill(fill: &str) -> Option<[u8; 3]> {
    if fill.trim().eq_ignore_ascii_case("none") {
        return None;
    }
    let color = DynamicColor::from_str(fill.trim()).ok()?;
    let rgba = color.to_alpha_color::<Srgb>().to_rgba8();
    Some([rgba.r, rgba.g, rgba.b])
}

/// Text color readable on top of `rgb`.
///
/// Black text needs a brightness difference of at least 125 and a color
/// difference of at least 500 against the background; otherwise use white.
pub fn contrast_fill(rgb: [u8; 3]) -> &'static str {
    let [r, g, b] = rgb.map(f64::from);
    let brightness = (r * 299.0 + g * 587.0 + b * 114.0) / 1000.0;
    let difference = r + g + b;
    if brightness < 125.0 || difference < 500.0 {
        "#fff"
    } else {
        "#000"
    }
}

/// Indices of the boxes containing `(row, col)`, outermost first.
///
/// A box counts as more specific when its top-left point lies strictly below
/// and to the right of the previous candidate's.
pub fn containing_boxes<'a>(
    boxes: impl IntoIterator<Item = &'a Path>,
    row: f64,
    col: f64,
) -> Vec<usize> {
    let mut max = (-1, -1);
    let mut queue = Vec::new();
    for (i, b) in boxes.into_iter().enumerate() {
        if !b.has_point(col, row) {
            continue;
        }
        if let Some(tl) = b.first() {
            if tl.row > max.0 && tl.col > max.1 {
                max = (tl.row, tl.col);
                queue.push(i);
            }
        }
    }
    queue
}

/// Read one run starting at `start`: non-space characters, allowing a single
/// space between words. Returns the run, without the separator that ends it,
/// and the column after it.
fn read_run(grid: &Grid, row: i32, start: i32) -> (String, i32) {
    let len = grid.row_len(row) as i32;
    let mut text = String::new();
    let mut col = start;
    if let Some(c) = grid.get(row, col) {
        text.push(c);
    }
    col += 1;
    while col < len && grid.get(row, col) != Some(' ') {
        if let Some(c) = grid.get(row, col) {
            text.push(c);
        }
        col += 1;
        if grid.get(row, col) == Some(' ') {
            text.push(' ');
            col += 1;
        }
    }
    if text.ends_with(' ') {
        text.pop();
    }
    (text, col)
}

/// Find all text left on the grid and place it.
///
/// Runs inside a box are attached to the box; the rest go to the `text`
/// group, which is created here with the given font style.
pub fn place_text(grid: &Grid, groups: &mut Groups, font_style: &str) {
    groups.push_group(TEXT);
    groups.set_option("fill", "black");
    groups.set_option("style", font_style);

    for row in 0..grid.height() as i32 {
        let len = grid.row_len(row) as i32;
        let mut col = 0;
        while col < len {
            if grid.get(row, col) == Some(' ') {
                col += 1;
                continue;
            }

            let (text, next) = read_run(grid, row, col);
            let mut run = TextRun::new(row, col, text);
            col = next;

            let (ay, ax) = run.anchor();
            let (queue, fill) = match groups.group(BOXES) {
                Some(boxes) => {
                    let paths: Vec<&Path> = boxes.paths().collect();
                    let queue = containing_boxes(paths.iter().copied(), ay, ax);
                    let fill = queue
                        .iter()
                        .rev()
                        .find_map(|&i| paths[i].option_str("fill").and_then(parse_fill))
                        .map_or("#000", contrast_fill);
                    (queue, fill)
                }
                None => (Vec::new(), "#000"),
            };
            run.set_option("fill", fill);

            match queue.last() {
                Some(&innermost) => {
                    run.set_option("stroke", "none");
                    run.set_option("style", font_style);
                    trace!("text {:?} inside box {innermost}", run.text);
                    if let Some(b) = groups
                        .group_mut(BOXES)
                        .and_then(|g| g.paths_mut().nth(innermost))
                    {
                        b.add_text(run);
                    }
                }
                None => groups.add_object(run),
            }
        }
    }

    groups.pop_group();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PointFlags;

    fn rect(top: i32, left: i32, bottom: i32, right: i32) -> Path {
        let mut p = Path::new();
        p.add_point(top, left, PointFlags::vertex());
        p.add_point(top, right, PointFlags::vertex());
        p.add_point(bottom, right, PointFlags::vertex());
        p.add_point(bottom, left, PointFlags::vertex());
        p.add_point(top, left, PointFlags::vertex());
        p
    }

    #[test]
    fn test_contrast_fill() {
        assert_eq!(contrast_fill([0, 0, 0]), "#fff");
        assert_eq!(contrast_fill([255, 255, 255]), "#000");
        assert_eq!(contrast_fill([0x88, 0x88, 0xdd]), "#fff");
        assert_eq!(contrast_fill([0xff, 0xff, 0x00]), "#000");
    }

    #[test]
    fn test_parse_fill() {
        assert_eq!(parse_fill("#fff"), Some([255, 255, 255]));
        assert_eq!(parse_fill("#102030"), Some([0x10, 0x20, 0x30]));
        assert_eq!(parse_fill("black"), Some([0, 0, 0]));
        assert_eq!(parse_fill("none"), None);
        assert_eq!(parse_fill("not a color"), None);
    }

    #[test]
    fn test_read_run_allows_single_spaces() {
        let grid = Grid::new("ab cd  ef g");
        assert_eq!(read_run(&grid, 0, 0), ("ab cd".to_string(), 6));
        assert_eq!(read_run(&grid, 0, 7), ("ef g".to_string(), 11));
        assert_eq!(read_run(&grid, 0, 10), ("g".to_string(), 11));
    }

    #[test]
    fn test_containing_boxes_nested() {
        let outer = rect(0, 0, 10, 20);
        let inner = rect(2, 2, 6, 10);
        let boxes = [outer, inner];
        assert_eq!(containing_boxes(&boxes, 4.3, 4.4), vec![0, 1]);
        assert_eq!(containing_boxes(&boxes, 8.3, 4.4), vec![0]);
        assert!(containing_boxes(&boxes, 12.3, 4.4).is_empty());
    }

    #[test]
    fn test_place_text_uses_innermost_fill() {
        let grid = Grid::new("\n\n  hi   yo\n\n");
        let mut groups = Groups::new();
        groups.push_group(BOXES);
        let mut outer = rect(0, 0, 4, 11);
        outer.set_option("fill", "#000");
        let mut inner = rect(1, 5, 3, 10);
        inner.set_option("fill", "none");
        groups.add_object(outer);
        groups.add_object(inner);
        groups.pop_group();

        place_text(&grid, &mut groups, "font-size:15px");

        let boxes: Vec<&Path> = groups.group(BOXES).unwrap().paths().collect();
        assert_eq!(boxes[0].text().len(), 1);
        assert_eq!(boxes[0].text()[0].text, "hi");
        assert_eq!(boxes[0].text()[0].option_str("fill"), Some("#fff"));
        // inner box has no resolvable fill, so the outer one decides
        assert_eq!(boxes[1].text()[0].text, "yo");
        assert_eq!(boxes[1].text()[0].option_str("fill"), Some("#fff"));
        assert_eq!(boxes[1].text()[0].option_str("stroke"), Some("none"));
        assert!(groups.group(TEXT).unwrap().is_empty());
    }

    #[test]
    fn test_place_text_outside_boxes() {
        let grid = Grid::new("A  B");
        let mut groups = Groups::new();
        place_text(&grid, &mut groups, "");
        let texts: Vec<_> = groups.group(TEXT).unwrap().texts().collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].text, "A");
        assert_eq!(texts[1].key(), "0,3");
        assert_eq!(texts[1].option_str("fill"), Some("#000"));
    }
}
