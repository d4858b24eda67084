//! # StopLLMs API
//!
//! The background authority: the typed message protocol spoken by content
//! scripts and the popup, the router that authenticates senders and
//! dispatches to the stores, and the composition root that wires every
//! adapter together.

pub mod context;
pub mod logging;
pub mod protocol;
pub mod router;
pub mod sink;

pub use context::{BackgroundConfig, BackgroundContext, LifecycleEvent, TabHost};
pub use protocol::{MessageSender, RouterRequest, RouterResponse};
pub use router::MessageRouter;
pub use sink::RouterDecisionSink;
