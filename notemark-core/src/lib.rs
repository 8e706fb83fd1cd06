//! Core library for Notemark, a local note editor whose rich text embeds
//! non-editable content markers.
//!
//! Two halves live here. The editing side keeps a caret stable across tree
//! mutations by saving it as linear offsets ([`capture`] / [`restore`]) and
//! treats every [`Marker`] as a single atomic position. The storage side is
//! [`Storage`], a versioned SQLite store holding files and notes that
//! migrates itself on first use.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    config::{default_store_directory, load_config, save_config, StoreConfig, DEFAULT_STORE_NAME},
    content_type::{classify, ContentKind, KindStyle},
    document::{Document, NodeId, NodeKind, MARKER_WIDTH},
    editor::Editor,
    error::{NotemarkError, Result},
    html::{plain_text, strip_marker_internals},
    marker::{
        create_marker, dispatch_click, escape_marker_if_inside, find_content_index, find_markers,
        is_selection_inside_marker, ClickOutcome, Marker, MarkerListener,
    },
    migration::{MigrationRegistry, MigrationStep, SchemaEdit, SCHEMA_VERSION},
    offset::{content_length, linear_to_node_offset, node_offset_to_linear, Anchor},
    record::{encode_blob, now_millis, Collection, ContentRef, FileRecord, Identified, NoteRecord, Record},
    selection::{capture, place_caret_after, restore, Selection, SelectionHandle, SelectionOffsets},
    storage::{OpenOutcome, Storage},
};
