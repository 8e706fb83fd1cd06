//! HTML serialization of documents, and the text transforms applied to
//! stored rich content.

use crate::core::document::{Document, NodeId, NodeKind};
use crate::core::marker::REMOVE_CLASS;
use crate::core::selection::CARET_PLACEHOLDER;
use regex::Regex;
use std::sync::OnceLock;

/// Tag used for serialized markers.
pub const MARKER_TAG: &str = "content";

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

static MARKER_REGEX: OnceLock<Regex> = OnceLock::new();
static TAG_REGEX: OnceLock<Regex> = OnceLock::new();

fn marker_regex() -> &'static Regex {
    MARKER_REGEX.get_or_init(|| {
        Regex::new(r#"(?s)<content\b([^>]*?)\s*contenteditable\s*=\s*(?:"false"|'false'|false\b)([^>]*)>.*?</content>"#)
            .expect("marker pattern is valid")
    })
}

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"))
}

impl Document {
    /// Serializes the children of `container` as HTML.
    ///
    /// Markers become `<content contenteditable="false">` elements carrying
    /// their id, raw type and name as `data-*` attributes.
    pub fn to_html(&self, container: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(container) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Element { tag, class } => {
                out.push('<');
                out.push_str(tag);
                if let Some(class) = class {
                    out.push_str(&format!(r#" class="{}""#, escape_attr(class)));
                }
                out.push('>');
                if VOID_TAGS.contains(&tag.as_str()) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str(&format!("</{tag}>"));
            }
            NodeKind::Marker(marker) => {
                out.push_str(&format!(
                    r#"<{MARKER_TAG} contenteditable="false" data-id="{}" data-type="{}" data-name="{}">"#,
                    escape_attr(&marker.id),
                    escape_attr(&marker.content_type),
                    escape_attr(&marker.name),
                ));
                for &child in self.children(id) {
                    self.write_html(child, out);
                }
                out.push_str(&format!("</{MARKER_TAG}>"));
            }
            NodeKind::RemoveButton => {
                out.push_str(&format!(r#"<button class="{REMOVE_CLASS}"></button>"#));
            }
        }
    }
}

/// Empties every non-editable marker element and drops its
/// `contenteditable` flag, so markers are rebuilt fresh when the content is
/// loaded again.
pub fn strip_marker_internals(html: &str) -> String {
    marker_regex()
        .replace_all(html, format!("<{MARKER_TAG}${{1}}${{2}}></{MARKER_TAG}>").as_str())
        .into_owned()
}

/// The text of stored rich content with all markup removed.
///
/// Marker internals are stripped first, so a marker contributes no text.
pub fn plain_text(html: &str) -> String {
    let stripped = strip_marker_internals(html);
    let text = tag_regex().replace_all(&stripped, "");
    decode_entities(&text).replace(CARET_PLACEHOLDER, "")
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
