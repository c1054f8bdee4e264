//! Debug labeling (spec §3 "Debug Labels").
//!
//! Labels are accepted by every builder but only forwarded to the backend
//! when the owning device was created with `debug: true` (spec §4 "Debug
//! labels are a logging/inspection aid only"); an application must never
//! rely on them for correctness.

/// Implemented by builder types that accept an optional debug label.
pub trait Label {
    fn label(&mut self, label: &str) -> &mut Self;
}

/// Implemented by objects a label can be attached to after construction.
pub trait SetLabel {
    fn set_label(&mut self, label: &str);
}
