//! Minimal element tree for the EC2 response documents.

use std::fmt;

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq)]
enum Content {
    Empty,
    Void,
    Text(String),
    Children(Vec<Element>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: &'static str,
    attrs: Vec<(&'static str, String)>,
    content: Content,
}

impl Element {
    /// An element rendered as `<name></name>` until content is added.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            attrs: vec![],
            content: Content::Empty,
        }
    }

    /// A self-closing `<name/>` element.
    pub fn void(name: &'static str) -> Self {
        Self {
            content: Content::Void,
            ..Self::new(name)
        }
    }

    /// A leaf with optional text; `None` renders as an empty element.
    pub fn leaf(name: &'static str, text: Option<&str>) -> Self {
        match text {
            Some(text) => Self::new(name).text(text),
            None => Self::new(name),
        }
    }

    pub fn attr(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((key, value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    pub fn child(self, child: Element) -> Self {
        self.children([child])
    }

    pub fn children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        match &mut self.content {
            Content::Children(existing) => existing.extend(children),
            _ => self.content = Content::Children(children.into_iter().collect()),
        }
        self
    }

    fn write(&self, out: &mut impl fmt::Write, depth: usize) -> fmt::Result {
        let indent = INDENT.repeat(depth);
        write!(out, "{indent}<{}", self.name)?;
        for (key, value) in &self.attrs {
            write!(out, " {key}=\"{}\"", escape(value))?;
        }
        match &self.content {
            Content::Void => out.write_str("/>\n"),
            Content::Empty => writeln!(out, "></{}>", self.name),
            Content::Text(text) => writeln!(out, ">{}</{}>", escape(text), self.name),
            Content::Children(children) if children.is_empty() => {
                writeln!(out, "></{}>", self.name)
            }
            Content::Children(children) => {
                out.write_str(">\n")?;
                for child in children {
                    child.write(out, depth + 1)?;
                }
                writeln!(out, "{indent}</{}>", self.name)
            }
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, 0)
    }
}

/// Serialize `root` as a standalone document.
pub fn document(root: &Element) -> String {
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{root}")
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
