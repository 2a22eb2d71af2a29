//! Explicit session state, its rendering, and the scan workflow.

mod render;
mod state;
mod workflow;

pub use render::{render, render_analysis, render_findings, render_list, render_ocr, render_table};
pub use state::{
    Notification, NotificationLevel, RequestKind, SessionEvent, SessionState, ViewMode,
};
pub use workflow::scan_document;
