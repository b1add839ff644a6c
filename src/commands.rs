//! Command references.
//!
//! A diagram may end with definitions such as `[logo]: {"fill": "#88d"}`.
//! Boxes pick a definition up through a `[logo]` label in their top-left
//! interior cell, and any box, line or text run can be targeted directly by
//! naming its anchor cell, as in `[3,5]: {"stroke": "red"}`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use log::{trace, warn};
use regex::Regex;
use serde_json::Value;

use crate::grid::Grid;
use crate::group::{Element, Groups, BOXES, LINES, TEXT};
use crate::path::{option_value, Options, Path};

/// Replace the `[name]` label with this text.
pub const LABEL: &str = "a2s:label";
/// Blank the whole `[name]` label instead of just its brackets.
pub const DELREF: &str = "a2s:delref";

fn definition_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?ims)^\[([^\]]+)\]:?\s+(\{[^}]+?\})")
            .expect("reference definition regex must compile")
    })
}

/// Reference name to style options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Commands {
    table: BTreeMap<String, Options>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split raw input into the diagram body and its reference definitions.
    ///
    /// Everything from the first definition to the end of the input is
    /// removed from the body. Definitions whose JSON does not parse to an
    /// object are skipped with a warning.
    pub fn extract(input: &str) -> (String, Commands) {
        let mut commands = Commands::new();
        let mut body_end = input.len();

        for caps in definition_regex().captures_iter(input) {
            let (Some(whole), Some(name), Some(json)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                continue;
            };
            body_end = body_end.min(whole.start());

            match serde_json::from_str::<Value>(json.as_str()) {
                Ok(Value::Object(options)) => {
                    trace!("reference [{}] with {} options", name.as_str(), options.len());
                    commands.insert(name.as_str(), options);
                }
                Ok(other) => warn!("ignoring reference [{}]: {other} is not an object", name.as_str()),
                Err(e) => warn!("ignoring reference [{}]: {e}", name.as_str()),
            }
        }

        (input[..body_end].to_string(), commands)
    }

    pub fn insert(&mut self, name: &str, options: Options) {
        self.table.insert(name.to_string(), options);
    }

    pub fn get(&self, name: &str) -> Option<&Options> {
        self.table.get(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// Apply a box's `[name]` label.
///
/// The label must start in the cell diagonally inside the box's top-left
/// corner. Its brackets are always blanked. A defined name also merges its
/// options into the box and may rewrite the label cells. Returns the name
/// applied.
pub fn resolve_reference(grid: &mut Grid, path: &mut Path, commands: &Commands) -> Option<String> {
    let (row, col) = path.first().map(|p| (p.row + 1, p.col + 1))?;
    if grid.get(row, col) != Some('[') {
        return None;
    }

    let mut name = String::new();
    let mut c = col + 1;
    loop {
        match grid.get(row, c)? {
            ']' => break,
            ch => name.push(ch),
        }
        c += 1;
    }

    let width = name.chars().count() as i32 + 2;
    let Some(options) = commands.get(&name) else {
        trace!("no definition for [{name}] at {row},{col}");
        grid.set(row, col, ' ');
        grid.set(row, col + width - 1, ' ');
        return None;
    };

    if options.contains_key(DELREF) || options.contains_key(LABEL) {
        let label: Vec<char> = options
            .get(LABEL)
            .map(option_value)
            .unwrap_or_default()
            .chars()
            .collect();
        for i in 0..width {
            let ch = label.get(i as usize).copied().unwrap_or(' ');
            grid.set(row, col + i, ch);
        }
    } else {
        grid.set(row, col, ' ');
        grid.set(row, col + width - 1, ' ');
    }

    path.set_options(options);
    Some(name)
}

/// Merge `"row,col"` keyed definitions into the objects anchored there.
///
/// Boxes and lines are keyed by their first point, text runs by their first
/// cell.
pub fn inject_commands(groups: &mut Groups, commands: &Commands) {
    if commands.is_empty() {
        return;
    }

    for name in [BOXES, LINES] {
        let Some(group) = groups.group_mut(name) else {
            continue;
        };
        for path in group.paths_mut() {
            if let Some(options) = path.first().and_then(|p| commands.get(&p.key())) {
                path.set_options(options);
            }
            for text in path.text_mut() {
                if let Some(options) = commands.get(&text.key()) {
                    text.set_options(options);
                }
            }
        }
    }

    if let Some(group) = groups.group_mut(TEXT) {
        for element in group.elements_mut() {
            if let Element::Text(text) = element {
                if let Some(options) = commands.get(&text.key()) {
                    text.set_options(options);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PointFlags;
    use crate::text::TextRun;
    use pretty_assertions::assert_eq;

    fn boxed(top: i32, left: i32, bottom: i32, right: i32) -> Path {
        let mut p = Path::new();
        p.add_point(top, left, PointFlags::vertex());
        p.add_point(top, right, PointFlags::vertex());
        p.add_point(bottom, right, PointFlags::vertex());
        p.add_point(bottom, left, PointFlags::vertex());
        p.add_point(top, left, PointFlags::vertex());
        p
    }

    #[test]
    fn test_extract_strips_definitions() {
        let input = "+--+\n|  |\n+--+\n\n[a]: {\"fill\":\"#f00\"}\n[B] {\"stroke\":\"blue\"}\n";
        let (body, commands) = Commands::extract(input);
        assert_eq!(body, "+--+\n|  |\n+--+\n\n");
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands.get("a").and_then(|o| o.get("fill")),
            Some(&Value::from("#f00"))
        );
        assert!(commands.get("B").is_some());
    }

    #[test]
    fn test_extract_skips_bad_json() {
        let (body, commands) = Commands::extract("x\n[bad]: {fill: red}\n[ok]: {\"a\":1}");
        assert_eq!(body, "x\n");
        assert_eq!(commands.len(), 1);
        assert!(commands.get("bad").is_none());
    }

    #[test]
    fn test_extract_without_definitions() {
        let (body, commands) = Commands::extract("|[x] inside|");
        assert_eq!(body, "|[x] inside|");
        assert!(commands.is_empty());
    }

    #[test]
    fn test_reference_blanks_brackets() {
        let mut grid = Grid::new("+-----+\n|[ab] |\n+-----+");
        let mut path = boxed(0, 0, 2, 6);
        let (_, commands) = Commands::extract("[ab]: {\"fill\":\"#000\"}");

        assert_eq!(resolve_reference(&mut grid, &mut path, &commands).as_deref(), Some("ab"));
        assert_eq!(grid.to_string(), "+-----+\n| ab  |\n+-----+");
        assert_eq!(path.option_str("fill"), Some("#000"));
    }

    #[test]
    fn test_reference_label_replaces_name() {
        let mut grid = Grid::new("+------+\n|[logo]|\n+------+");
        let mut path = boxed(0, 0, 2, 7);
        let (_, commands) = Commands::extract("[logo]: {\"a2s:label\":\"Hi\"}");
        resolve_reference(&mut grid, &mut path, &commands);
        assert_eq!(grid.to_string(), "+------+\n|Hi    |\n+------+");
    }

    #[test]
    fn test_reference_delref_blanks_everything() {
        let mut grid = Grid::new("+----+\n|[x] |\n+----+");
        let mut path = boxed(0, 0, 2, 5);
        let (_, commands) = Commands::extract("[x]: {\"a2s:delref\":true}");
        resolve_reference(&mut grid, &mut path, &commands);
        assert_eq!(grid.to_string(), "+----+\n|    |\n+----+");
    }

    #[test]
    fn test_undefined_reference_drops_brackets() {
        let mut grid = Grid::new("+-----+\n|[zz] |\n+-----+");
        let mut path = boxed(0, 0, 2, 6);
        assert_eq!(resolve_reference(&mut grid, &mut path, &Commands::new()), None);
        assert_eq!(grid.to_string(), "+-----+\n| zz  |\n+-----+");
        assert!(path.options().is_empty());
    }

    #[test]
    fn test_inject_by_anchor() {
        let mut groups = Groups::new();
        groups.push_group(BOXES);
        let mut b = boxed(0, 0, 2, 5);
        b.add_text(TextRun::new(1, 1, "in"));
        groups.add_object(b);
        groups.pop_group();
        groups.push_group(TEXT);
        groups.add_object(TextRun::new(4, 2, "out"));
        groups.pop_group();

        let (_, commands) = Commands::extract(
            "[0,0]: {\"fill\":\"red\"}\n[1,1]: {\"fill\":\"blue\"}\n[4,2]: {\"font-weight\":\"bold\"}",
        );
        inject_commands(&mut groups, &commands);

        let b = groups.group(BOXES).and_then(|g| g.paths().next()).unwrap();
        assert_eq!(b.option_str("fill"), Some("red"));
        assert_eq!(b.text()[0].option_str("fill"), Some("blue"));
        let t = groups.group(TEXT).and_then(|g| g.texts().next()).unwrap();
        assert_eq!(t.option_str("font-weight"), Some("bold"));
    }
}
