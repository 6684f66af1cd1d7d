// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host side of the tunnel editor.
//!
//! [`EditorSession`] owns a graph and dispatches every edit to the node
//! behaviors from `tunnel_editor_graph`, with a deferred refresh queue for
//! workflow loading, bincode undo history and RON settings.

pub mod history;
pub mod scheduler;
pub mod session;
pub mod settings;

pub use history::{History, HistoryError};
pub use scheduler::PendingRefresh;
pub use session::{EditorSession, SessionError};
pub use settings::EditorSettings;
