//! Transport-agnostic domain types: message envelopes and ticket selections.

mod message;
mod selection;

pub use message::{
    new_correlation_id, ConsumeStatus, Headers, InboundMessage, OutboundMessage,
};
pub use selection::{Selection, SelectionAggregator};
