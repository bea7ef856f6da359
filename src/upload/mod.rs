//! Photo → reference → menu → upload interaction

pub mod flow;
pub mod gate;
pub mod relay;
pub mod selection;
pub mod texts;

pub use flow::UploadFlow;
pub use gate::{ChannelGate, MembershipCheck};
pub use relay::{PhotoReceived, Relay, SelectionMade};
pub use selection::{MenuAction, MenuSelection};
