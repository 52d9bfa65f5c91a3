mod selection;
mod view;

pub use selection::{FilterSelection, ToggleTarget, Toggled, toggle};
pub use view::{DerivedView, apply_filter, derive_counts};
