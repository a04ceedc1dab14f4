//! Composite selection widgets built on picket_layout primitives
//!
//! Each component follows a consistent pattern:
//! - Builder function (e.g., `select(&doc, &value)`)
//! - Builder type collecting a private config (e.g., `SelectBuilder`)
//! - Event methods returning `EventOutcome`, and `view()` for rendering

pub mod autocomplete;
pub mod handlers;
pub mod multiple_select;
pub mod option;
pub mod panel;
pub mod select;

pub use autocomplete::{
    autocomplete, Autocomplete, AutocompleteBuilder, QueryCallback, SerializeFn,
};
pub use handlers::{EventCallback, Handlers, KeyCallback};
pub use multiple_select::{multiple_select, MultipleSelect, MultipleSelectBuilder};
pub use option::{CheckboxOption, SelectOption};
pub use panel::{PanelCell, PanelEvent, PanelState, WidgetView};
pub use select::{select, Select, SelectBuilder};
