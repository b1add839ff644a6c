//! SVG generation for detected diagrams.

use std::fmt::Write;

use crate::group::{Element, Group, Groups};
use crate::objects::{ObjectLibrary, SubPath};
use crate::path::{format_coord, option_value, Options, Path, Point, Scale, DIRECTIVE_PREFIX};
use crate::text::TextRun;

/// Fonts tried for text, first match wins
pub const DEFAULT_FONT_FAMILY: &str =
    "Consolas,Monaco,Anonymous Pro,Anonymous,Bitstream Sans Mono,monospace";

/// Replaces a box with a custom object of this name.
pub const TYPE: &str = "a2s:type";
/// Wraps a path and its text in a hyperlink.
pub const LINK: &str = "a2s:link";

/// Distance from a rounded corner to where its curve starts, in pixels.
const CURVE_OFFSET: f64 = 10.0;
/// Half the span of an `x` tick, in pixels.
const TICK_SIZE: f64 = 4.0;

/// Drop shadow filters and arrow heads referenced by rendered paths
const DEFS: &str = r#"  <defs>
    <filter id="dsFilterNoBlur" width="150%" height="150%">
      <feOffset result="offOut" in="SourceGraphic" dx="3" dy="3"/>
      <feColorMatrix result="matrixOut" in="offOut" type="matrix" values="0.2 0 0 0 0 0 0.2 0 0 0 0 0 0.2 0 0 0 0 0 1 0"/>
      <feBlend in="SourceGraphic" in2="matrixOut" mode="normal"/>
    </filter>
    <filter id="dsFilter" width="150%" height="150%">
      <feOffset result="offOut" in="SourceGraphic" dx="3" dy="3"/>
      <feColorMatrix result="matrixOut" in="offOut" type="matrix" values="0.2 0 0 0 0 0 0.2 0 0 0 0 0 0.2 0 0 0 0 0 1 0"/>
      <feGaussianBlur result="blurOut" in="matrixOut" stdDeviation="3"/>
      <feBlend in="SourceGraphic" in2="blurOut" mode="normal"/>
    </filter>
    <marker id="iPointer"
      viewBox="0 0 10 10" refX="5" refY="5"
      markerUnits="strokeWidth"
      markerWidth="8" markerHeight="7"
      fill="black"
      orient="auto">
      <path d="M 10 0 L 10 10 L 0 5 z" />
    </marker>
    <marker id="Pointer"
      viewBox="0 0 10 10" refX="5" refY="5"
      markerUnits="strokeWidth"
      markerWidth="8" markerHeight="7"
      fill="black"
      orient="auto">
      <path d="M 0 0 L 10 5 L 0 10 z" />
    </marker>
  </defs>
"#;

/// Options for rendering ASCII diagrams to SVG.
///
/// # Example
///
/// ```rust
/// use a2s::{render_with_options, ObjectLibrary, RenderOptions, Scale};
///
/// let diagram = "+--+\n|  |\n+--+";
/// let options = RenderOptions::new()
///     .with_scale(Scale::new(10.0, 20.0))
///     .with_blur(false);
/// let svg = render_with_options(diagram, &options, &ObjectLibrary::new());
/// assert!(svg.contains(r#"filter="url(#dsFilterNoBlur)""#));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Pixel size of one character cell.
    pub scale: Scale,
    /// CSS font-family list used for all text.
    pub font_family: String,
    /// Blur the drop shadow under boxes. Some renderers are slow with
    /// Gaussian blur, so the unblurred filter is offered as well.
    pub blur: bool,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self {
            scale: Scale::default(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            blur: true,
        }
    }

    pub fn with_scale(mut self, scale: Scale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }

    pub fn with_blur(mut self, blur: bool) -> Self {
        self.blur = blur;
        self
    }

    /// Inline style shared by every text element.
    pub fn font_style(&self) -> String {
        format!(
            "font-family:{};font-size:{}px",
            self.font_family,
            format_coord(self.scale.y * 0.95)
        )
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a complete SVG document for a `rows` x `cols` grid
pub fn generate_svg(
    groups: &Groups,
    rows: usize,
    cols: usize,
    options: &RenderOptions,
    library: &ObjectLibrary,
) -> String {
    let width = format_coord(cols as f64 * options.scale.x + 10.0);
    let height = format_coord(rows as f64 * options.scale.y);

    let mut renderer = Renderer {
        scale: options.scale,
        library,
        svg: String::new(),
        next_path: 0,
        next_text: 0,
    };

    // SVG header
    let _ = write!(
        renderer.svg,
        r#"<svg width="{w}px" height="{h}px" viewBox="0 0 {w} {h}" version="1.1" xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">
"#,
        w = width,
        h = height
    );
    renderer.svg.push_str(DEFS);

    for group in groups.iter() {
        renderer.group(group);
    }

    renderer.svg.push_str("</svg>\n");
    renderer.svg
}

/// Output buffer plus the per-document id counters
struct Renderer<'a> {
    scale: Scale,
    library: &'a ObjectLibrary,
    svg: String,
    next_path: usize,
    next_text: usize,
}

impl Renderer<'_> {
    fn group(&mut self, group: &Group) {
        let _ = writeln!(
            self.svg,
            r#"<g id="{}"{}>"#,
            escape_xml(group.name()),
            attributes(group.options())
        );
        for element in group.elements() {
            match element {
                Element::Path(path) => self.path(path),
                Element::Text(text) => {
                    let text = self.text(text);
                    self.svg.push_str(&text);
                    self.svg.push('\n');
                }
            }
        }
        self.svg.push_str("</g>\n");
    }

    fn path(&mut self, path: &Path) {
        let (Some(first), Some(last)) = (path.points().first(), path.points().last()) else {
            return;
        };
        let id = self.next_path;
        self.next_path += 1;

        let _ = writeln!(self.svg, r#"<g id="group{id}">"#);

        let library = self.library;
        let object = path
            .option_str(TYPE)
            .and_then(|name| library.get(name))
            .filter(|subpaths| !subpaths.is_empty());
        if let Some(subpaths) = object {
            self.object(id, path, subpaths);
            self.svg.push_str("</g>\n");
            return;
        }

        let mut options = path.options().clone();
        if first.flags.end_marker {
            options.insert("marker-start".into(), "url(#Pointer)".into());
        } else if first.flags.incoming_marker {
            options.insert("marker-start".into(), "url(#iPointer)".into());
        }
        if last.flags.end_marker {
            options.insert("marker-end".into(), "url(#Pointer)".into());
        } else if last.flags.incoming_marker {
            options.insert("marker-end".into(), "url(#iPointer)".into());
        }
        if path.is_closed() && !options.contains_key("fill") {
            options.insert("fill".into(), "#fff".into());
        }

        let link = link_open(&options);
        self.svg.push_str(&link);
        let _ = writeln!(
            self.svg,
            "\t<path id=\"path{id}\"{} d=\"{}\" />",
            attributes(&options),
            path_data(path, &self.scale)
        );
        self.attached_text(path);
        if !link.is_empty() {
            self.svg.push_str("</a>\n");
        }

        for tick in path.ticks() {
            self.tick(tick);
        }
        self.svg.push_str("</g>\n");
    }

    /// Draw a custom object stretched over the path's bounding box.
    fn object(&mut self, id: usize, path: &Path, subpaths: &[SubPath]) {
        let mut options = path.options().clone();
        if !options.contains_key("fill") {
            options.insert("fill".into(), "#fff".into());
        }

        let pixels: Vec<(f64, f64)> = path.points().iter().map(|p| p.pixels(&self.scale)).collect();
        let min_x = pixels.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let max_x = pixels.iter().map(|p| p.0).fold(f64::NEG_INFINITY, f64::max);
        let min_y = pixels.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        let max_y = pixels.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

        let link = link_open(&options);
        self.svg.push_str(&link);
        for (i, sub) in subpaths.iter().enumerate() {
            let d = sub.fit(min_x, min_y, max_x - min_x, max_y - min_y);
            if i == 0 {
                let _ = writeln!(
                    self.svg,
                    "\t<path id=\"path{id}\" d=\"{d}\"{} />",
                    attributes(&options)
                );
            } else {
                let _ = writeln!(self.svg, "\t<path id=\"path{id}-{i}\" d=\"{d}\" />");
            }
        }
        self.attached_text(path);
        if !link.is_empty() {
            self.svg.push_str("</a>\n");
        }
    }

    fn attached_text(&mut self, path: &Path) {
        for text in path.text() {
            let text = self.text(text);
            let _ = writeln!(self.svg, "\t{text}");
        }
    }

    fn text(&mut self, text: &TextRun) -> String {
        let id = self.next_text;
        self.next_text += 1;
        let (row, col) = text.anchor();
        let (x, y) = self.scale.to_pixels(row, col);
        format!(
            r#"<text x="{}" y="{}" id="text{id}"{}>{}</text>"#,
            format_coord(x),
            format_coord(y),
            attributes(text.options()),
            escape_xml(&text.text)
        )
    }

    fn tick(&mut self, tick: &Point) {
        let (x, y) = tick.pixels(&self.scale);
        if tick.flags.dot {
            let _ = write!(
                self.svg,
                r#"<circle cx="{}" cy="{}" r="3" fill="black" />"#,
                format_coord(x),
                format_coord(y)
            );
        } else if tick.flags.tick {
            for (dx1, dx2) in [(-TICK_SIZE, TICK_SIZE), (TICK_SIZE, -TICK_SIZE)] {
                let _ = write!(
                    self.svg,
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke-width="1" />"#,
                    format_coord(x + dx1),
                    format_coord(y - TICK_SIZE),
                    format_coord(x + dx2),
                    format_coord(y + TICK_SIZE)
                );
            }
        }
    }
}

/// Path data for a box or line.
///
/// Control points become quadratic curves that start and end a fixed
/// distance from the corner. The curve direction is decided from the
/// neighboring points, which assumes clockwise polygons.
pub fn path_data(path: &Path, scale: &Scale) -> String {
    let Some((start, rest)) = path.points().split_first() else {
        return String::new();
    };
    let c = format_coord;

    let (x, y) = start.pixels(scale);
    let mut d = if start.flags.control {
        format!(
            "M {} {} Q {} {} {} {}",
            c(x),
            c(y + CURVE_OFFSET),
            c(x),
            c(y),
            c(x + CURVE_OFFSET),
            c(y)
        )
    } else {
        format!("M {} {}", c(x), c(y))
    };

    let mut prev = start;
    for (i, p) in rest.iter().enumerate() {
        let (px, py) = p.pixels(scale);
        let next = rest.get(i + 1).unwrap_or(start);

        let curve = if !p.flags.control {
            None
        } else if prev.col == p.col {
            let sy = if prev.row < p.row { py - CURVE_OFFSET } else { py + CURVE_OFFSET };
            let ex = if next.col < p.col { px - CURVE_OFFSET } else { px + CURVE_OFFSET };
            Some((px, sy, ex, py))
        } else if prev.row == p.row {
            let sx = if prev.col < p.col { px - CURVE_OFFSET } else { px + CURVE_OFFSET };
            let ey = if next.row <= p.row { py - CURVE_OFFSET } else { py + CURVE_OFFSET };
            Some((sx, py, px, ey))
        } else {
            None
        };

        match curve {
            Some((sx, sy, ex, ey)) => {
                let _ = write!(
                    d,
                    " L {} {} Q {} {} {} {}",
                    c(sx),
                    c(sy),
                    c(px),
                    c(py),
                    c(ex),
                    c(ey)
                );
            }
            None => {
                let _ = write!(d, " L {} {}", c(px), c(py));
            }
        }
        prev = p;
    }

    if path.is_closed() {
        d.push_str(" Z");
    }
    d
}

/// ` key="value"` pairs for every option that is not a directive.
fn attributes(options: &Options) -> String {
    let mut out = String::new();
    for (key, value) in options {
        if key.starts_with(DIRECTIVE_PREFIX) {
            continue;
        }
        let _ = write!(
            out,
            r#" {}="{}""#,
            escape_xml(key),
            escape_xml(&option_value(value))
        );
    }
    out
}

fn link_open(options: &Options) -> String {
    options
        .get(LINK)
        .map(|href| format!("\t<a xlink:href=\"{}\">\n", escape_xml(&option_value(href))))
        .unwrap_or_default()
}

/// Escape special XML characters
pub fn escape_xml(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
