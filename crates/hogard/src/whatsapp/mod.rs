//! WhatsApp Cloud API: inbound webhook payloads and outbound text messages.

mod client;
mod webhook;

pub use client::Messenger;
pub use client::MessengerError;
pub use client::WhatsAppClient;
pub use client::MAX_TEXT_CHARS;
pub use webhook::extract_message;
pub use webhook::InboundMessage;
pub use webhook::SenderAllowlist;
