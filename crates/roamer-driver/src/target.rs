use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Href prefix of pages bundled inside the application.
const LOCAL_SCHEME: &str = "file://";

/// What kind of element a target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Link,
    Input,
    Other,
}

impl TargetKind {
    /// Markup tag name as recorded in the action log.
    pub fn tag_name(&self) -> &'static str {
        match self {
            TargetKind::Link => "a",
            TargetKind::Input => "input",
            TargetKind::Other => "other",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "a" => TargetKind::Link,
            "input" => TargetKind::Input,
            _ => TargetKind::Other,
        }
    }
}

/// On-screen geometry. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn location(&self) -> String {
        format!("({}, {})", self.x, self.y)
    }

    pub fn dimension(&self) -> String {
        format!("({}, {})", self.width, self.height)
    }
}

/// One interactive element on the current screen, addressed by its
/// position in the enumeration that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub kind: TargetKind,
    /// Empty for anything that is not a link.
    #[serde(default)]
    pub href: String,
    #[serde(default)]
    pub label: String,
    /// Current text of an input at enumeration time.
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub bounds: Bounds,
}

impl Target {
    pub fn link(href: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Link,
            href: href.into(),
            label: label.into(),
            value: String::new(),
            bounds: Bounds::default(),
        }
    }

    pub fn input(label: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Input,
            href: String::new(),
            label: label.into(),
            value: String::new(),
            bounds: Bounds::default(),
        }
    }

    pub fn other(label: impl Into<String>) -> Self {
        Self {
            kind: TargetKind::Other,
            href: String::new(),
            label: label.into(),
            value: String::new(),
            bounds: Bounds::default(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn is_link(&self) -> bool {
        self.kind == TargetKind::Link
    }

    pub fn is_input(&self) -> bool {
        self.kind == TargetKind::Input
    }

    /// A link leaving the bundled pages.
    pub fn is_external_link(&self) -> bool {
        self.is_link() && !self.href.starts_with(LOCAL_SCHEME)
    }
}

/// Content hash of the full screen markup. Equal signatures mean "the same
/// page"; collisions are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageSignature(pub u64);

impl PageSignature {
    pub fn of_markup(markup: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        markup.hash(&mut hasher);
        PageSignature(hasher.finish())
    }
}

impl fmt::Display for PageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
