//! Page controller for the covsum client.
//!
//! The page is plain data (`PageState`) changed only by the reducer in
//! `update`. `PageRuntime` feeds it events, runs the effects it returns
//! against the backend, and talks to the embedding program via `PageHost`.

pub mod common;
pub mod effects;
pub mod events;
pub mod host;
pub mod runtime;
pub mod state;
pub mod update;

pub use effects::PageEffect;
pub use events::{PageEvent, SummaryExport};
pub use host::PageHost;
pub use runtime::PageRuntime;
pub use state::{PageSettings, PageState, SectionId};
