//! Convert ASCII art box-and-line diagrams to SVG.
//!
//! ```rust
//! let svg = a2s::render(".---.\n| A |---> B\n'---'");
//! assert!(svg.starts_with("<svg"));
//! ```
//!
//! Boxes, lines and text are found on a character grid in that order, each
//! pass erasing what it found so the next one only sees what is left.
//! Styling is attached through reference definitions at the end of the input:
//!
//! ```text
//! +-------+
//! |[db]   |
//! +-------+
//!
//! [db]: {"fill": "#88d", "a2s:delref": true}
//! ```

pub mod chars;
pub mod commands;
pub mod error;
pub mod finder;
pub mod grid;
pub mod group;
pub mod objects;
pub mod path;
pub mod svg;
pub mod text;

use log::debug;

pub use commands::Commands;
pub use error::{Error, Result};
pub use grid::Grid;
pub use group::{Element, Group, Groups, BOXES, LINES, TEXT};
pub use objects::{ObjectLibrary, PathCommand, SubPath};
pub use path::{Options, Path, Point, PointFlags, Scale};
pub use svg::{RenderOptions, DEFAULT_FONT_FAMILY};
pub use text::TextRun;

/// A parsed diagram, ready to render
#[derive(Debug, Clone)]
pub struct Diagram {
    grid: Grid,
    groups: Groups,
    commands: Commands,
    options: RenderOptions,
}

impl Diagram {
    /// Run every detection pass over `input`.
    pub fn parse(input: &str, options: &RenderOptions) -> Self {
        let (body, commands) = Commands::extract(input);
        let mut grid = Grid::new(&body);
        let mut groups = Groups::new();

        finder::find_boxes(&mut grid, &mut groups, &commands, options.blur);
        finder::find_lines(&mut grid, &mut groups);
        grid.clear_deferred();
        text::place_text(&grid, &mut groups, &options.font_style());
        commands::inject_commands(&mut groups, &commands);

        debug!(
            "parsed {}x{} diagram: {} boxes, {} lines, {} references",
            grid.height(),
            grid.width(),
            groups.group(BOXES).map_or(0, Group::len),
            groups.group(LINES).map_or(0, Group::len),
            commands.len()
        );

        Self {
            grid,
            groups,
            commands,
            options: options.clone(),
        }
    }

    /// Closed polygons, top-left point first
    pub fn boxes(&self) -> impl Iterator<Item = &Path> {
        self.groups.group(BOXES).into_iter().flat_map(Group::paths)
    }

    /// Lines, in discovery order
    pub fn lines(&self) -> impl Iterator<Item = &Path> {
        self.groups.group(LINES).into_iter().flat_map(Group::paths)
    }

    /// Text outside of every box
    pub fn text(&self) -> impl Iterator<Item = &TextRun> {
        self.groups.group(TEXT).into_iter().flat_map(Group::texts)
    }

    pub fn groups(&self) -> &Groups {
        &self.groups
    }

    pub fn commands(&self) -> &Commands {
        &self.commands
    }

    /// The grid after detection: only text and unrecognized glyphs remain.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn to_svg(&self, library: &ObjectLibrary) -> String {
        svg::generate_svg(
            &self.groups,
            self.grid.height(),
            self.grid.width(),
            &self.options,
            library,
        )
    }
}

/// Render an ASCII diagram to SVG with default options.
pub fn render(input: &str) -> String {
    render_with_options(input, &RenderOptions::default(), &ObjectLibrary::new())
}

/// Render an ASCII diagram to SVG.
pub fn render_with_options(input: &str, options: &RenderOptions, library: &ObjectLibrary) -> String {
    Diagram::parse(input, options).to_svg(library)
}
