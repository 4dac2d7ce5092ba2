//! Extension de npconfig pour la boucle de polling et l'affichage
//!
//! ```yaml
//! pipeline:
//!   poll_interval_secs: 5
//! display:
//!   style: chatbox      # chatbox | compact
//!   charset: ascii      # ascii | utf8
//!   max_text_len: 115
//! ```

use crate::formatter::{Charset, DEFAULT_MAX_TEXT_LEN, DisplayStyle, Formatter};
use anyhow::Result;
use npconfig::Config;
use serde_yaml::{Number, Value};
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const MIN_POLL_INTERVAL_SECS: u64 = 1;

pub trait PipelineConfigExt {
    /// Intervalle entre deux requêtes "currently playing" (au moins 1 s)
    fn get_poll_interval(&self) -> Result<Duration>;

    fn set_poll_interval_secs(&self, secs: u64) -> Result<()>;

    fn get_display_style(&self) -> Result<DisplayStyle>;

    fn set_display_style(&self, style: DisplayStyle) -> Result<()>;

    fn get_display_charset(&self) -> Result<Charset>;

    /// Longueur maximale de la partie texte du message chatbox
    fn get_display_max_text_len(&self) -> Result<usize>;

    /// Construit le formatter correspondant à la configuration
    ///
    /// `message_limit` vient du transport ([`crate::Transport::max_message_len`]) ;
    /// la partie texte est réduite pour que le message complet y tienne.
    fn get_formatter(&self, message_limit: Option<usize>) -> Result<Box<dyn Formatter>> {
        let style = self.get_display_style()?;
        let charset = self.get_display_charset()?;
        let max_text_len = self.get_display_max_text_len()?;
        Ok(style.formatter(charset, max_text_len, message_limit))
    }
}

impl PipelineConfigExt for Config {
    fn get_poll_interval(&self) -> Result<Duration> {
        let secs = match self.get_u64(&["pipeline", "poll_interval_secs"]) {
            Some(secs) if secs < MIN_POLL_INTERVAL_SECS => {
                warn!(
                    "Poll interval {}s is too short, using {}s",
                    secs, MIN_POLL_INTERVAL_SECS
                );
                MIN_POLL_INTERVAL_SECS
            }
            Some(secs) => secs,
            None => {
                self.set_poll_interval_secs(DEFAULT_POLL_INTERVAL_SECS)?;
                DEFAULT_POLL_INTERVAL_SECS
            }
        };
        Ok(Duration::from_secs(secs))
    }

    fn set_poll_interval_secs(&self, secs: u64) -> Result<()> {
        self.set_value(
            &["pipeline", "poll_interval_secs"],
            Value::Number(Number::from(secs)),
        )
    }

    fn get_display_style(&self) -> Result<DisplayStyle> {
        match self.get_string(&["display", "style"]) {
            Some(s) => Ok(s.parse().unwrap_or_else(|e| {
                warn!("{}, using {}", e, DisplayStyle::default());
                DisplayStyle::default()
            })),
            None => {
                self.set_display_style(DisplayStyle::default())?;
                Ok(DisplayStyle::default())
            }
        }
    }

    fn set_display_style(&self, style: DisplayStyle) -> Result<()> {
        self.set_value(&["display", "style"], Value::String(style.to_string()))
    }

    fn get_display_charset(&self) -> Result<Charset> {
        Ok(match self.get_string(&["display", "charset"]) {
            Some(s) => s.parse().unwrap_or_else(|e| {
                warn!("{}, falling back to ascii", e);
                Charset::Ascii
            }),
            None => Charset::default(),
        })
    }

    fn get_display_max_text_len(&self) -> Result<usize> {
        Ok(self
            .get_u64(&["display", "max_text_len"])
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_MAX_TEXT_LEN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::PlaybackSnapshot;

    fn load_in(dir: &tempfile::TempDir) -> Config {
        Config::load_config(dir.path().to_str().unwrap()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);

        assert_eq!(config.get_poll_interval().unwrap(), Duration::from_secs(5));
        assert_eq!(config.get_display_style().unwrap(), DisplayStyle::Chatbox);
        assert_eq!(config.get_display_charset().unwrap(), Charset::Ascii);
        assert_eq!(config.get_display_max_text_len().unwrap(), 115);
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);

        config.set_poll_interval_secs(0).unwrap();
        assert_eq!(config.get_poll_interval().unwrap(), Duration::from_secs(1));

        config.set_poll_interval_secs(10).unwrap();
        assert_eq!(config.get_poll_interval().unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn test_compact_style_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "display:\n  style: compact\n  charset: utf8\n",
        )
        .unwrap();
        let config = load_in(&dir);

        assert_eq!(config.get_display_style().unwrap(), DisplayStyle::Compact);
        assert_eq!(config.get_display_charset().unwrap(), Charset::Utf8);

        let formatter = config.get_formatter(None).unwrap();
        let snapshot = PlaybackSnapshot::new("Été", vec!["Zaz".into()], true, 0, 1);
        assert_eq!(formatter.format(&snapshot), ">Été-Zaz");
    }

    #[test]
    fn test_oversized_text_len_is_clamped_to_transport_limit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "display:\n  max_text_len: 300\n").unwrap();
        let config = load_in(&dir);
        assert_eq!(config.get_display_max_text_len().unwrap(), 300);

        let formatter = config.get_formatter(Some(144)).unwrap();
        let snapshot = PlaybackSnapshot::new("w".repeat(400), vec!["Artist".into()], true, 0, 1);
        assert!(formatter.format(&snapshot).chars().count() <= 144);
    }

    #[test]
    fn test_unknown_style_falls_back_to_chatbox() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_in(&dir);
        config
            .set_value(&["display", "style"], Value::String("marquee".into()))
            .unwrap();
        assert_eq!(config.get_display_style().unwrap(), DisplayStyle::Chatbox);
    }
}
