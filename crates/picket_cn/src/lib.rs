//! # Picket Components (picket_cn)
//!
//! Headless selection widgets built on `picket_layout` primitives.
//!
//! - **Primitives**: `picket_layout` provides the registry, choice controllers and overlays
//! - **State**: `picket_core` provides the consumer-owned `State` the widgets are controlled from
//! - **Components**: `picket_cn` wires them into Select, MultipleSelect and Autocomplete
//!
//! Widgets own no value. They read and write the `State` they were built
//! over and call the consumer's `on_change` afterwards. The host delivers
//! input events (`on_click`, `on_key_down`, ...) and draws whatever `view()`
//! returns.
//!
//! ## Example
//!
//! ```rust
//! use picket_cn::prelude::*;
//!
//! let ctx = StateContext::new();
//! let doc = Document::new();
//! let size = ctx.use_state(None::<u32>);
//!
//! let mut picker = cn::select(&doc, &size).placeholder("Size").build();
//! let _s = picker.option(1, "Small").unwrap();
//! let _m = picker.option(2, "Medium").unwrap();
//!
//! picker.on_key_down(&KeyboardEvent::pressed(Key::ArrowDown));
//! assert_eq!(size.get(), Some(1));
//! assert_eq!(picker.view().text, "Small");
//! ```

pub mod components;

pub use components::*;

/// Convenience module for accessing components with `cn::` prefix
pub mod cn {
    pub use crate::components::autocomplete::autocomplete;
    pub use crate::components::multiple_select::multiple_select;
    pub use crate::components::select::select;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::cn;
    pub use crate::components::{
        Autocomplete, CheckboxOption, Handlers, MultipleSelect, Select, SelectOption, WidgetView,
    };
    pub use picket_core::{EventOutcome, Key, KeyboardEvent, State, StateContext};
    pub use picket_layout::prelude::*;
}
