pub mod broadcaster;
pub mod handler;
pub mod messages;

pub use broadcaster::{BroadcasterHandle, LiveBroadcaster};
pub use handler::{handle_connection, StreamState};
pub use messages::{ControlMessage, StreamMessage, TickData};
