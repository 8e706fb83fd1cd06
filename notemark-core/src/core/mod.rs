//! Internal domain modules for the Notemark core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod config;
pub mod content_type;
pub mod document;
pub mod editor;
pub mod error;
pub mod html;
pub mod marker;
pub mod migration;
pub mod notes;
pub mod offset;
pub mod record;
pub mod selection;
pub mod storage;

#[doc(inline)]
pub use config::{default_store_directory, load_config, save_config, StoreConfig, DEFAULT_STORE_NAME};
#[doc(inline)]
pub use content_type::{classify, ContentKind, KindStyle};
#[doc(inline)]
pub use document::{Document, NodeId, NodeKind, MARKER_WIDTH};
#[doc(inline)]
pub use editor::Editor;
#[doc(inline)]
pub use error::{NotemarkError, Result};
#[doc(inline)]
pub use html::{plain_text, strip_marker_internals};
#[doc(inline)]
pub use marker::{
    create_marker, dispatch_click, escape_marker_if_inside, find_content_index, find_markers,
    is_selection_inside_marker, ClickOutcome, Marker, MarkerListener,
};
#[doc(inline)]
pub use migration::{MigrationRegistry, MigrationStep, SchemaEdit, SCHEMA_VERSION};
#[doc(inline)]
pub use offset::{content_length, linear_to_node_offset, node_offset_to_linear, Anchor};
#[doc(inline)]
pub use record::{encode_blob, now_millis, Collection, ContentRef, FileRecord, Identified, NoteRecord, Record};
#[doc(inline)]
pub use selection::{capture, place_caret_after, restore, Selection, SelectionHandle, SelectionOffsets};
#[doc(inline)]
pub use storage::{OpenOutcome, Storage};
