//! Classification of raw content types into marker kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of object a marker refers to.
///
/// Serializes as its lowercase name; unknown names survive as
/// [`ContentKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Image,
    Video,
    File,
    Table,
    Code,
    Note,
    Link,
    /// A caller-defined kind with no built-in style.
    Custom(String),
}

/// Icon and color classes used to render a marker of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindStyle {
    pub icon: &'static str,
    pub color: &'static str,
}

impl ContentKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::File => "file",
            Self::Table => "table",
            Self::Code => "code",
            Self::Note => "note",
            Self::Link => "link",
            Self::Custom(name) => name,
        }
    }

    /// The static style for this kind; `None` for custom kinds.
    pub fn style(&self) -> Option<KindStyle> {
        let (icon, color) = match self {
            Self::Image => ("ri-image-line", "text-teal-500"),
            Self::Video => ("ri-movie-line", "text-cyan-500"),
            Self::File => ("ri-folder-line", "text-indigo-500"),
            Self::Table => ("ri-table-line", "text-blue-500"),
            Self::Code => ("ri-terminal-box-line", "text-slate-500"),
            Self::Note => ("ri-layout-top-2-line", "text-orange-500"),
            Self::Link => ("ri-link", "text-sky-500"),
            Self::Custom(_) => return None,
        };
        Some(KindStyle { icon, color })
    }
}

impl From<&str> for ContentKind {
    fn from(name: &str) -> Self {
        match name {
            "image" => Self::Image,
            "video" => Self::Video,
            "file" => Self::File,
            "table" => Self::Table,
            "code" => Self::Code,
            "note" => Self::Note,
            "link" => Self::Link,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl From<String> for ContentKind {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a raw MIME-like type to a marker kind.
///
/// `image/*` and `video/*` get their own kinds, any other MIME-shaped string
/// is a `file`, and everything else is taken as a kind name verbatim.
pub fn classify(raw_type: &str) -> ContentKind {
    if raw_type.starts_with("image/") {
        ContentKind::Image
    } else if raw_type.starts_with("video/") {
        ContentKind::Video
    } else if raw_type.contains('/') {
        ContentKind::File
    } else {
        ContentKind::from(raw_type)
    }
}
