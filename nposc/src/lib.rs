//! OSC transport for now-playing displays
//!
//! - [`codec`]: OSC 1.0 message encoding and decoding (`i`, `f`, `s`, `T`, `F`)
//! - [`chatbox`]: [`OscChatboxTransport`], a [`nppipeline::Transport`] sending
//!   `/chatbox/input` datagrams over UDP
//! - [`config_ext`]: socket addresses and chatbox options in npconfig

pub mod chatbox;
pub mod codec;
pub mod config_ext;
pub mod error;

pub use chatbox::{CHATBOX_MAX_CHARS, ChatboxOptions, NotificationSound, OscChatboxTransport};
pub use codec::{OscArg, OscMessage};
pub use config_ext::OscConfigExt;
pub use error::{OscError, Result};
