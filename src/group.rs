//! Named groups of diagram objects.
//!
//! Objects are added to whichever group is on top of the stack, and group
//! options become attributes of the group's `<g>` element.

use log::warn;
use serde_json::Value;

use crate::path::{Options, Path};
use crate::text::TextRun;

/// Group holding closed polygons
pub const BOXES: &str = "boxes";
/// Group holding open and closed lines
pub const LINES: &str = "lines";
/// Group holding text that is not inside any box
pub const TEXT: &str = "text";

/// Something that can live in a group
#[derive(Debug, Clone)]
pub enum Element {
    Path(Path),
    Text(TextRun),
}

impl From<Path> for Element {
    fn from(path: Path) -> Self {
        Element::Path(path)
    }
}

impl From<TextRun> for Element {
    fn from(text: TextRun) -> Self {
        Element::Text(text)
    }
}

/// A named bucket of elements sharing default options
#[derive(Debug, Clone)]
pub struct Group {
    name: String,
    options: Options,
    elements: Vec<Element>,
}

impl Group {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            options: Options::new(),
            elements: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.elements.iter().filter_map(|e| match e {
            Element::Path(p) => Some(p),
            Element::Text(_) => None,
        })
    }

    pub fn paths_mut(&mut self) -> impl Iterator<Item = &mut Path> {
        self.elements.iter_mut().filter_map(|e| match e {
            Element::Path(p) => Some(p),
            Element::Text(_) => None,
        })
    }

    pub fn texts(&self) -> impl Iterator<Item = &TextRun> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text(t) => Some(t),
            Element::Path(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// All groups in creation order, plus the stack of active groups
#[derive(Debug, Clone, Default)]
pub struct Groups {
    groups: Vec<Group>,
    stack: Vec<usize>,
}

impl Groups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `name` the current group, creating it on first use.
    pub fn push_group(&mut self, name: &str) {
        let idx = match self.groups.iter().position(|g| g.name == name) {
            Some(idx) => idx,
            None => {
                self.groups.push(Group::new(name));
                self.groups.len() - 1
            }
        };
        self.stack.push(idx);
    }

    /// Return to the previously current group.
    pub fn pop_group(&mut self) {
        self.stack.pop();
    }

    /// Name of the current group
    pub fn current(&self) -> Option<&str> {
        self.stack.last().map(|&i| self.groups[i].name.as_str())
    }

    /// Add an element to the current group.
    pub fn add_object(&mut self, element: impl Into<Element>) {
        match self.stack.last() {
            Some(&i) => self.groups[i].elements.push(element.into()),
            None => warn!("dropping object added outside of any group"),
        }
    }

    /// Set a default option on the current group.
    pub fn set_option(&mut self, key: &str, value: impl Into<Value>) {
        match self.stack.last() {
            Some(&i) => {
                self.groups[i].options.insert(key.to_string(), value.into());
            }
            None => warn!("ignoring option {key} set outside of any group"),
        }
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }
}
