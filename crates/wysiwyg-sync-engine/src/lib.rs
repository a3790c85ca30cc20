pub mod change;
pub mod dom;
pub mod error;
pub mod events;
pub mod hooks;
pub mod keywords;
pub mod paste;
pub mod scheduler;
pub mod selection;
pub mod session;

// Re-export key types for easier usage
pub use change::{ChangeDetector, Key, KeyClass};
pub use dom::{Document, NodeId};
pub use error::EngineError;
pub use events::EditorEvent;
pub use hooks::{HookPayload, HookRegistry};
pub use keywords::{KeywordDescriptor, KeywordTable};
pub use paste::{ClipboardData, PasteEvent, PasteOutcome, PastePayload};
pub use selection::{Boundary, Position, PositionTracker};
pub use session::{CommandDescriptor, EditingSession};
