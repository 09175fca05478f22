//! Viewer presence handlers. Viewers are anonymous, so these take no
//! caller metadata.

mod heartbeat_viewer;
mod join_viewer;
mod leave_viewer;

pub use heartbeat_viewer::{HeartbeatViewerCommand, HeartbeatViewerHandler};
pub use join_viewer::{JoinViewerCommand, JoinViewerHandler};
pub use leave_viewer::{LeaveViewerCommand, LeaveViewerHandler};
