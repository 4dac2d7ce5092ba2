//! Extension de npconfig pour le transport OSC
//!
//! ```yaml
//! osc:
//!   local_address: "127.0.0.1"
//!   local_port: 9001
//!   remote_address: "127.0.0.1"
//!   remote_port: 9000
//!   send_typing_indicator: true
//!   notification_sound: omit   # omit | on | off
//! ```

use crate::chatbox::{ChatboxOptions, DEFAULT_LOCAL_PORT, DEFAULT_REMOTE_PORT, NotificationSound};
use anyhow::{Result, anyhow};
use npconfig::Config;
use std::net::{SocketAddr, ToSocketAddrs};
use tracing::warn;

const DEFAULT_ADDRESS: &str = "127.0.0.1";

pub trait OscConfigExt {
    /// Adresse locale du socket UDP (défaut 127.0.0.1:9001)
    fn get_osc_local_addr(&self) -> Result<SocketAddr>;

    /// Adresse du destinataire (défaut 127.0.0.1:9000)
    fn get_osc_remote_addr(&self) -> Result<SocketAddr>;

    fn get_osc_send_typing_indicator(&self) -> Result<bool>;

    fn get_osc_notification_sound(&self) -> Result<NotificationSound>;

    /// Toutes les options du transport chatbox
    fn get_chatbox_options(&self) -> Result<ChatboxOptions> {
        Ok(ChatboxOptions {
            local: self.get_osc_local_addr()?,
            remote: self.get_osc_remote_addr()?,
            send_typing_indicator: self.get_osc_send_typing_indicator()?,
            notification_sound: self.get_osc_notification_sound()?,
        })
    }
}

fn resolve(config: &Config, side: &str, default_port: u16) -> Result<SocketAddr> {
    let address_key = format!("{}_address", side);
    let port_key = format!("{}_port", side);

    let address = config
        .get_string(&["osc", &address_key])
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());
    let port = config.get_port(&["osc", &port_key], default_port);

    (address.as_str(), port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow!("osc.{} '{}' does not resolve", address_key, address))
}

impl OscConfigExt for Config {
    fn get_osc_local_addr(&self) -> Result<SocketAddr> {
        resolve(self, "local", DEFAULT_LOCAL_PORT)
    }

    fn get_osc_remote_addr(&self) -> Result<SocketAddr> {
        resolve(self, "remote", DEFAULT_REMOTE_PORT)
    }

    fn get_osc_send_typing_indicator(&self) -> Result<bool> {
        Ok(self
            .get_bool(&["osc", "send_typing_indicator"])
            .unwrap_or(true))
    }

    fn get_osc_notification_sound(&self) -> Result<NotificationSound> {
        Ok(match self.get_string(&["osc", "notification_sound"]) {
            Some(s) => s.parse().unwrap_or_else(|e| {
                warn!("{}, omitting it", e);
                NotificationSound::Omit
            }),
            None => match self.get_bool(&["osc", "notification_sound"]) {
                Some(true) => NotificationSound::On,
                Some(false) => NotificationSound::Off,
                None => NotificationSound::Omit,
            },
        })
    }
}
