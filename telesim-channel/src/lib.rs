//! # 📶 telesim-channel — Canal com Ruído
//!
//! Simula o meio físico entre emissor e receptor: cada bit sofre um ensaio
//! de Bernoulli independente; a taxa de transmissão controla o ritmo.
//!
//! | Perfil | Probabilidade mínima |
//! |:-------|:---------------------|
//! | `Ideal` | 0 (nunca altera) |
//! | `Noisy` | 0.01 |
//! | `Intermittent` | 0.05 |
//! | `Lossy` | 0.10 |
//!
//! ## Exemplo
//!
//! ```
//! use std::sync::Arc;
//! use telesim_channel::Channel;
//! use telesim_core::prelude::*;
//!
//! let channel = Channel::with_seed(ChannelProfile::new(ChannelType::Noisy, 0.0, 1e6), 42);
//! let msg = Arc::new(Message::new("x"));
//! msg.advance_with(MessageState::Encrypted, |f| f.encrypted = Some("01111000".into()))?;
//! channel.transmit(&msg)?;
//! assert_eq!(msg.state(), MessageState::Received);
//! assert_eq!(channel.bits_transmitted(), 8);
//! # Ok::<(), LinkError>(())
//! ```

pub mod channel;

pub use channel::{Channel, ChannelStats, PACING_LIMIT_BPS, PROGRESS_INTERVAL};
pub use telesim_core::config::{ChannelProfile, ChannelSettings, ChannelType};
