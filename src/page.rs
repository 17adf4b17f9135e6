//! Page snapshots.
//!
//! The page script serializes the live document as a tree of elements (tag,
//! id, raw class attribute, children) and rewrites it whenever the board
//! changes. Everything downstream reads this tree instead of a browser DOM, so
//! the snapshot is re-loaded on every cycle and never patched in place.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::AssistError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Raw class attribute; `None` when the element has none at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn has_class(&self, name: &str) -> bool {
        self.class
            .as_deref()
            .map_or(false, |class| class.split_whitespace().any(|token| token == name))
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Tag(tag) => self.tag.eq_ignore_ascii_case(tag),
            Selector::Class(class) => self.has_class(class),
            Selector::Id(id) => self.id.as_deref() == Some(*id),
        }
    }

    /// Pre-order walk over everything below this element, excluding itself.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// First match in document order, this element included.
    pub fn find(&self, selector: &Selector) -> Option<&Element> {
        if self.matches(selector) {
            return Some(self);
        }
        self.descendants().find(|element| element.matches(selector))
    }

    /// All matches strictly below this element, in document order.
    pub fn find_all<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = &'a Element> + 'a {
        self.descendants().filter(move |element| element.matches(selector))
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    Tag(&'static str),
    Class(&'static str),
    Id(&'static str),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Tag(tag) => write!(f, "{}", tag),
            Selector::Class(class) => write!(f, ".{}", class),
            Selector::Id(id) => write!(f, "#{}", id),
        }
    }
}

/// Where the current page comes from.
pub trait PageSource: Send + Sync {
    /// The current page, or `None` while nothing is rendered yet.
    fn load(&self) -> Option<Element>;
}

/// Snapshot file written by the page script.
#[derive(Clone, Debug)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<Element, AssistError> {
        let json = fs::read_to_string(&self.path)
            .map_err(|e| AssistError::Snapshot(format!("{}: {}", self.path.display(), e)))?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl PageSource for SnapshotFile {
    fn load(&self) -> Option<Element> {
        match self.read() {
            Ok(page) => Some(page),
            Err(e) => {
                log::debug!("No page yet: {}", e);
                None
            }
        }
    }
}
