//! Chatbox transport over OSC/UDP
//!
//! Sends `/chatbox/input` messages to the peer (VRChat listens on 9000 by
//! default) from a local socket (9001 by default). Opening the transport sends
//! a `/chatbox/typing` indicator as a handshake.

use crate::codec::{OscArg, OscMessage};
use crate::error::OscError;
use async_trait::async_trait;
use nppipeline::Transport;
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use tokio::net::UdpSocket;
use tracing::{debug, info};

pub const CHATBOX_INPUT: &str = "/chatbox/input";
pub const CHATBOX_TYPING: &str = "/chatbox/typing";

/// Longest text the chatbox displays, in characters
pub const CHATBOX_MAX_CHARS: usize = 144;

pub const DEFAULT_LOCAL_PORT: u16 = 9001;
pub const DEFAULT_REMOTE_PORT: u16 = 9000;

/// Optional third argument of `/chatbox/input`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationSound {
    /// Argument left out, the receiver decides
    #[default]
    Omit,
    On,
    Off,
}

impl NotificationSound {
    fn as_arg(self) -> Option<OscArg> {
        match self {
            NotificationSound::Omit => None,
            NotificationSound::On => Some(OscArg::Bool(true)),
            NotificationSound::Off => Some(OscArg::Bool(false)),
        }
    }
}

impl FromStr for NotificationSound {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "omit" | "" => Ok(NotificationSound::Omit),
            "on" | "true" => Ok(NotificationSound::On),
            "off" | "false" => Ok(NotificationSound::Off),
            other => Err(format!("unknown notification sound '{}'", other)),
        }
    }
}

impl fmt::Display for NotificationSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationSound::Omit => "omit",
            NotificationSound::On => "on",
            NotificationSound::Off => "off",
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChatboxOptions {
    pub local: SocketAddr,
    pub remote: SocketAddr,
    pub send_typing_indicator: bool,
    pub notification_sound: NotificationSound,
}

impl Default for ChatboxOptions {
    fn default() -> Self {
        Self {
            local: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_LOCAL_PORT)),
            remote: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_REMOTE_PORT)),
            send_typing_indicator: true,
            notification_sound: NotificationSound::Omit,
        }
    }
}

pub struct OscChatboxTransport {
    options: ChatboxOptions,
    socket: Option<UdpSocket>,
}

impl OscChatboxTransport {
    pub fn new(options: ChatboxOptions) -> Self {
        Self {
            options,
            socket: None,
        }
    }

    pub fn options(&self) -> &ChatboxOptions {
        &self.options
    }

    /// Address actually bound, once opened
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// `/chatbox/input [s, i 1, (T|F)?]`
    pub fn input_message(&self, text: &str) -> Result<OscMessage, OscError> {
        let message = OscMessage::new(CHATBOX_INPUT)?
            .arg(OscArg::Str(text.to_string()))
            .arg(OscArg::Int(1));
        Ok(match self.options.notification_sound.as_arg() {
            Some(sound) => message.arg(sound),
            None => message,
        })
    }

    async fn send_message(&self, message: &OscMessage) -> io::Result<()> {
        let socket = self.socket.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "OSC socket is not open")
        })?;
        let packet = message.encode();
        socket.send_to(&packet, self.options.remote).await?;
        debug!(address = %message.address, bytes = packet.len(), "OSC message sent");
        Ok(())
    }
}

fn to_io(e: OscError) -> io::Error {
    match e {
        OscError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidInput, other),
    }
}

#[async_trait]
impl Transport for OscChatboxTransport {
    fn describe(&self) -> String {
        format!("osc://{}", self.options.remote)
    }

    async fn open(&mut self) -> io::Result<()> {
        let socket = UdpSocket::bind(self.options.local).await?;
        info!(
            local = %socket.local_addr()?,
            remote = %self.options.remote,
            "OSC socket ready"
        );
        self.socket = Some(socket);
        Ok(())
    }

    async fn handshake(&self) -> io::Result<()> {
        if !self.options.send_typing_indicator {
            return Ok(());
        }
        let typing = OscMessage::new(CHATBOX_TYPING)
            .map_err(to_io)?
            .arg(OscArg::Int(1));
        self.send_message(&typing).await
    }

    async fn send(&self, message: &str) -> io::Result<()> {
        let input = self.input_message(message).map_err(to_io)?;
        self.send_message(&input).await
    }

    fn max_message_len(&self) -> Option<usize> {
        Some(CHATBOX_MAX_CHARS)
    }
}
