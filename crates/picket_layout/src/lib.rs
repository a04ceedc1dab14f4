//! Picket Layout Primitives
//!
//! Headless building blocks for selection widgets:
//!
//! - **Document**: the host element tree, with document order, on-screen
//!   geometry and scroll dispatch
//! - **Registry**: the ordered set of options mounted under one widget
//! - **Mounted entries**: registration tied to an option's lifetime
//! - **Choice controllers**: single and multiple selection views over consumer state
//! - **Overlays**: top-level containers and anchor-tracking floating panels
//!
//! # Example
//!
//! ```rust
//! use picket_layout::prelude::*;
//!
//! let doc = Document::new();
//! let list = doc.create_element("ul");
//! doc.append_child(doc.body(), list).unwrap();
//!
//! let first = doc.create_element("li");
//! let second = doc.create_element("li");
//! doc.append_child(list, first).unwrap();
//! doc.append_child(list, second).unwrap();
//!
//! let registry = RegistryHandle::new(doc.clone());
//! let _b = MountedEntry::mount(&registry, "b", "Bravo", second);
//! let _a = MountedEntry::mount(&registry, "a", "Alpha", first);
//!
//! assert_eq!(registry.values(), vec!["a", "b"]);
//! assert_eq!(registry.after(Some(&"a")), Some("b"));
//! ```

pub mod choice;
pub mod document;
pub mod entry;
pub mod key;
pub mod overlay;
pub mod registry;

pub use choice::{MultipleChoice, SelectCallback, SingleChoice, ToggleCallback};
pub use document::{
    Document, DocumentError, ListenerId, ListenerPhase, NodeId, ScrollCallback, ScrollEvent,
};
pub use entry::MountedEntry;
pub use key::InstanceKey;
pub use overlay::{
    anchors, Anchor, InlineStyle, Overlay, OverlayFrame, OverlayPosition, RelativeOverlay,
    RelativeOverlayBuilder,
};
pub use registry::{ChoiceValue, Entry, EntryToken, NodeOrder, Registry, RegistryHandle};

/// Common imports for widget crates
pub mod prelude {
    pub use crate::choice::{MultipleChoice, SingleChoice};
    pub use crate::document::{Document, NodeId};
    pub use crate::entry::MountedEntry;
    pub use crate::key::InstanceKey;
    pub use crate::overlay::{anchors, InlineStyle, OverlayFrame, RelativeOverlay};
    pub use crate::registry::{ChoiceValue, RegistryHandle};
}
