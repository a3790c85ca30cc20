//! Notifications raised by a session. The host drains them with
//! [`EditingSession::take_events`](crate::EditingSession::take_events).

use crate::dom::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The caret or selection moved.
    SelectionChanged,
    /// The element containing the selection changed.
    NodeChanged {
        old_node: Option<NodeId>,
        new_node: Option<NodeId>,
    },
    /// The serialized content differs from the last notification.
    ValueChanged { raw_value: String },
    /// A formatting command failed and its descriptor carried a message.
    CommandFailed { message: String },
}
