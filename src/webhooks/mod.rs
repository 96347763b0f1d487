//! Webhook handling for GitHub events.
//!
//! This module provides:
//! - Signature verification for webhook payloads (HMAC-SHA256)
//! - Payload parsing into [`CommentEvent`]s
//! - The [`Dispatcher`], which turns deliveries into queued commands

pub mod dispatch;
pub mod events;
pub mod parser;
pub mod signature;

pub use dispatch::{Delivery, DispatchError, Dispatcher};
pub use events::CommentEvent;
pub use parser::{ParseError, parse_webhook};
pub use signature::{
    SIGNATURE_HEADER, SignatureError, compute_signature, format_signature_header,
    verify_signature,
};
