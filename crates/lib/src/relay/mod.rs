//! Inbound relay: normalized messages, dispatch, fixed replies, reply envelope.
//!
//! The dispatcher routes each message to media, greeting, query, or empty
//! handling and records exactly one audit entry per message.

mod dispatch;
mod inbound;
pub mod replies;
mod twiml;

pub use dispatch::{Dispatcher, OutboundReply};
pub use inbound::InboundMessage;
pub use twiml::render_reply;
