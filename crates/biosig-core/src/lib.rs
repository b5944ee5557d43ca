//! biosig-core: Foundation types for the biosignal feature pipeline
//!
//! Recordings, channel selections, windows and the shared error taxonomy.
//! No signal processing lives here.

pub mod channels;
pub mod error;
pub mod recording;
pub mod window;

pub use channels::ChannelSelection;
pub use error::{SigError, SigResult};
pub use recording::Recording;
pub use window::Window;
