//! Session snapshot model.
//!
//! - **Session** (`session.rs`): identity and timing of one browsing context
//! - **State** (`state.rs`): the resumable payload, ordered tabs
//! - **Workspace** (`workspace.rs`): the pane tree of one tab
//! - **Info** (`info.rs`): read-only catalog projection

pub mod info;
pub mod session;
pub mod state;
pub mod workspace;

pub use info::{format_relative_time, SessionInfo};
pub use session::{Session, SessionId};
pub use state::{
    parse_state, parse_state_strict, validate_state, SessionState, StateDecodeError,
    SESSION_STATE_VERSION,
};
pub use workspace::{PaneNodeSnapshot, SplitDirection};
