//! Custom object library.
//!
//! A box whose options carry `"a2s:type": "name"` is drawn as the named
//! object instead of as a polygon. Objects are made of sub-paths, each
//! described in its own `width` x `height` coordinate box and stretched to
//! fit the box it replaces.
//!
//! Object sources hold one sub-path per line:
//!
//! ```text
//! <path width="100" height="100" d="M 0 0 L 100 0 L 100 100 Z" />
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path as FsPath;
use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use winnow::{
    Parser as _,
    ascii::float,
    combinator::{preceded, repeat, terminated},
    error::ModalResult,
    token::{one_of, take_while},
};

use crate::error::{Error, Result};
use crate::path::format_coord;

/// File extension of object sources in a library directory.
pub const OBJECT_EXTENSION: &str = "path";

/// One absolute path-data command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64 },
    HorizontalTo { x: f64 },
    VerticalTo { y: f64 },
    CurveTo { x1: f64, y1: f64, x2: f64, y2: f64, x: f64, y: f64 },
    SmoothCurveTo { x2: f64, y2: f64, x: f64, y: f64 },
    QuadTo { x1: f64, y1: f64, x: f64, y: f64 },
    SmoothQuadTo { x: f64, y: f64 },
    ArcTo {
        rx: f64,
        ry: f64,
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        x: f64,
        y: f64,
    },
    ClosePath,
}

impl PathCommand {
    /// Scale then translate every coordinate. Arc radii are only scaled.
    pub fn transform(self, sx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        let px = |x: f64| x * sx + tx;
        let py = |y: f64| y * sy + ty;
        match self {
            PathCommand::MoveTo { x, y } => PathCommand::MoveTo { x: px(x), y: py(y) },
            PathCommand::LineTo { x, y } => PathCommand::LineTo { x: px(x), y: py(y) },
            PathCommand::HorizontalTo { x } => PathCommand::HorizontalTo { x: px(x) },
            PathCommand::VerticalTo { y } => PathCommand::VerticalTo { y: py(y) },
            PathCommand::CurveTo { x1, y1, x2, y2, x, y } => PathCommand::CurveTo {
                x1: px(x1),
                y1: py(y1),
                x2: px(x2),
                y2: py(y2),
                x: px(x),
                y: py(y),
            },
            PathCommand::SmoothCurveTo { x2, y2, x, y } => PathCommand::SmoothCurveTo {
                x2: px(x2),
                y2: py(y2),
                x: px(x),
                y: py(y),
            },
            PathCommand::QuadTo { x1, y1, x, y } => PathCommand::QuadTo {
                x1: px(x1),
                y1: py(y1),
                x: px(x),
                y: py(y),
            },
            PathCommand::SmoothQuadTo { x, y } => PathCommand::SmoothQuadTo { x: px(x), y: py(y) },
            PathCommand::ArcTo {
                rx,
                ry,
                rotation,
                large_arc,
                sweep,
                x,
                y,
            } => PathCommand::ArcTo {
                rx: rx * sx,
                ry: ry * sy,
                rotation,
                large_arc,
                sweep,
                x: px(x),
                y: py(y),
            },
            PathCommand::ClosePath => PathCommand::ClosePath,
        }
    }

    /// Where the pen ends up after this command.
    fn end_point(&self, current: (f64, f64), start: (f64, f64)) -> (f64, f64) {
        match *self {
            PathCommand::MoveTo { x, y }
            | PathCommand::LineTo { x, y }
            | PathCommand::CurveTo { x, y, .. }
            | PathCommand::SmoothCurveTo { x, y, .. }
            | PathCommand::QuadTo { x, y, .. }
            | PathCommand::SmoothQuadTo { x, y }
            | PathCommand::ArcTo { x, y, .. } => (x, y),
            PathCommand::HorizontalTo { x } => (x, current.1),
            PathCommand::VerticalTo { y } => (current.0, y),
            PathCommand::ClosePath => start,
        }
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = format_coord;
        let flag = |b: bool| if b { 1 } else { 0 };
        match *self {
            PathCommand::MoveTo { x, y } => write!(f, "M {} {}", c(x), c(y)),
            PathCommand::LineTo { x, y } => write!(f, "L {} {}", c(x), c(y)),
            PathCommand::HorizontalTo { x } => write!(f, "H {}", c(x)),
            PathCommand::VerticalTo { y } => write!(f, "V {}", c(y)),
            PathCommand::CurveTo { x1, y1, x2, y2, x, y } => write!(
                f,
                "C {} {} {} {} {} {}",
                c(x1),
                c(y1),
                c(x2),
                c(y2),
                c(x),
                c(y)
            ),
            PathCommand::SmoothCurveTo { x2, y2, x, y } => {
                write!(f, "S {} {} {} {}", c(x2), c(y2), c(x), c(y))
            }
            PathCommand::QuadTo { x1, y1, x, y } => {
                write!(f, "Q {} {} {} {}", c(x1), c(y1), c(x), c(y))
            }
            PathCommand::SmoothQuadTo { x, y } => write!(f, "T {} {}", c(x), c(y)),
            PathCommand::ArcTo {
                rx,
                ry,
                rotation,
                large_arc,
                sweep,
                x,
                y,
            } => write!(
                f,
                "A {} {} {} {} {} {} {}",
                c(rx),
                c(ry),
                c(rotation),
                flag(large_arc),
                flag(sweep),
                c(x),
                c(y)
            ),
            PathCommand::ClosePath => f.write_str("Z"),
        }
    }
}

/// One sub-path of an object, in its own coordinate box
#[derive(Debug, Clone, PartialEq)]
pub struct SubPath {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<PathCommand>,
}

impl SubPath {
    /// Parse `d` path data drawn in a `width` x `height` box.
    pub fn parse(name: &str, width: f64, height: f64, data: &str) -> Result<Self> {
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::ObjectSource {
                name: name.to_string(),
                message: format!("sub-path box {width}x{height} is empty"),
            });
        }
        Ok(Self {
            width,
            height,
            commands: parse_path_data(name, data)?,
        })
    }

    /// Path data stretched into the rectangle at `(x, y)` of size `w` x `h`.
    pub fn fit(&self, x: f64, y: f64, w: f64, h: f64) -> String {
        let (sx, sy) = (w / self.width, h / self.height);
        self.commands
            .iter()
            .map(|cmd| cmd.transform(sx, sy, x, y).to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn separator(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_ascii_whitespace() || c == ',')
        .void()
        .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<f64> {
    preceded(separator, float).parse_next(input)
}

fn segment(input: &mut &str) -> ModalResult<(char, Vec<f64>)> {
    (
        preceded(separator, one_of(|c: char| c.is_ascii_alphabetic())),
        repeat(0.., number),
    )
        .parse_next(input)
}

fn segments(input: &mut &str) -> ModalResult<Vec<(char, Vec<f64>)>> {
    terminated(repeat(0.., segment), separator).parse_next(input)
}

fn arity(command: char) -> Option<usize> {
    match command.to_ascii_uppercase() {
        'M' | 'L' | 'T' => Some(2),
        'H' | 'V' => Some(1),
        'C' => Some(6),
        'S' | 'Q' => Some(4),
        'A' => Some(7),
        'Z' => Some(0),
        _ => None,
    }
}

/// Parse SVG path data into absolute commands.
///
/// Relative commands are resolved against the current point, and extra
/// argument groups repeat their command (`M` repeats as `L`).
pub fn parse_path_data(name: &str, data: &str) -> Result<Vec<PathCommand>> {
    let fail = |message: String| Error::PathData {
        name: name.to_string(),
        message,
    };

    let parsed = segments.parse(data).map_err(|e| fail(e.to_string()))?;

    let mut commands = Vec::new();
    let mut current = (0.0, 0.0);
    let mut start = (0.0, 0.0);

    for (letter, args) in parsed {
        let n = arity(letter).ok_or_else(|| fail(format!("unknown command `{letter}`")))?;
        let relative = letter.is_ascii_lowercase();
        let upper = letter.to_ascii_uppercase();

        if n == 0 {
            if !args.is_empty() {
                return Err(fail(format!("`{letter}` takes no arguments")));
            }
            commands.push(PathCommand::ClosePath);
            current = start;
            continue;
        }
        if args.is_empty() || args.len() % n != 0 {
            return Err(fail(format!(
                "`{letter}` expects a multiple of {n} arguments, got {}",
                args.len()
            )));
        }

        for (i, a) in args.chunks(n).enumerate() {
            let (ox, oy) = if relative { current } else { (0.0, 0.0) };
            let cmd = match upper {
                'M' if i == 0 => PathCommand::MoveTo { x: a[0] + ox, y: a[1] + oy },
                'M' | 'L' => PathCommand::LineTo { x: a[0] + ox, y: a[1] + oy },
                'H' => PathCommand::HorizontalTo { x: a[0] + ox },
                'V' => PathCommand::VerticalTo { y: a[0] + oy },
                'C' => PathCommand::CurveTo {
                    x1: a[0] + ox,
                    y1: a[1] + oy,
                    x2: a[2] + ox,
                    y2: a[3] + oy,
                    x: a[4] + ox,
                    y: a[5] + oy,
                },
                'S' => PathCommand::SmoothCurveTo {
                    x2: a[0] + ox,
                    y2: a[1] + oy,
                    x: a[2] + ox,
                    y: a[3] + oy,
                },
                'Q' => PathCommand::QuadTo {
                    x1: a[0] + ox,
                    y1: a[1] + oy,
                    x: a[2] + ox,
                    y: a[3] + oy,
                },
                'T' => PathCommand::SmoothQuadTo { x: a[0] + ox, y: a[1] + oy },
                _ => PathCommand::ArcTo {
                    rx: a[0],
                    ry: a[1],
                    rotation: a[2],
                    large_arc: a[3] != 0.0,
                    sweep: a[4] != 0.0,
                    x: a[5] + ox,
                    y: a[6] + oy,
                },
            };
            current = cmd.end_point(current, start);
            if let PathCommand::MoveTo { x, y } = cmd {
                start = (x, y);
            }
            commands.push(cmd);
        }
    }

    Ok(commands)
}

fn attribute_regexes() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r#"width="(\d+)"#).expect("width regex must compile"),
            Regex::new(r#"height="(\d+)"#).expect("height regex must compile"),
            Regex::new(r#"d="([^"]+)""#).expect("path data regex must compile"),
        ]
    })
}

/// Named custom objects, read-only once built
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectLibrary {
    objects: BTreeMap<String, Vec<SubPath>>,
}

impl ObjectLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, paths: Vec<SubPath>) {
        self.objects.insert(name.into(), paths);
    }

    /// Add an object from source text, one `<path width height d>` per line.
    pub fn insert_source(&mut self, name: &str, source: &str) -> Result<()> {
        let [width_re, height_re, d_re] = attribute_regexes();
        let mut paths = Vec::new();

        for (n, line) in source.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let capture = |re: &Regex, attr: &str| {
                re.captures(line)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str())
                    .ok_or_else(|| Error::ObjectSource {
                        name: name.to_string(),
                        message: format!("line {}: missing `{attr}`", n + 1),
                    })
            };
            let width = capture(width_re, "width")?;
            let height = capture(height_re, "height")?;
            let data = capture(d_re, "d")?;

            // digits only, so these always parse
            let width = width.parse::<f64>().unwrap_or_default();
            let height = height.parse::<f64>().unwrap_or_default();
            paths.push(SubPath::parse(name, width, height, data)?);
        }

        debug!("loaded object {name} with {} sub-paths", paths.len());
        self.insert(name, paths);
        Ok(())
    }

    /// Load every `*.path` file in `dir`, named by file stem.
    pub fn load_dir(dir: impl AsRef<FsPath>) -> Result<Self> {
        let dir = dir.as_ref();
        let read_err = |path: &FsPath| {
            let path = path.to_path_buf();
            move |source| Error::Read { path, source }
        };

        let mut library = Self::new();
        for entry in fs::read_dir(dir).map_err(read_err(dir))? {
            let path = entry.map_err(read_err(dir))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(OBJECT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let source = fs::read_to_string(&path).map_err(read_err(&path))?;
            library.insert_source(name, &source)?;
        }
        Ok(library)
    }

    pub fn get(&self, name: &str) -> Option<&[SubPath]> {
        self.objects.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
