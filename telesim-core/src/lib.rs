//! # 📡 Telesim-Core
//!
//! Modelo de dados e infraestrutura de um enlace digital ponto a ponto
//! simulado: a mensagem codificada em binário passa por uma cifra
//! reversível, atravessa um canal ruidoso e é decifrada e decodificada.
//!
//! ## O Pipeline
//!
//! ```text
//! Sender:   texto ─► Encoder ─► Cipher ─► Channel ─┐
//!                                                  │ (bits possivelmente
//! Receiver: texto ◄─ Decoder ◄─ Decipher ◄─────────┘   corrompidos)
//! ```
//!
//! ## Módulos
//!
//! - [`message`]: `Message` e o seu ciclo de vida (`MessageState`)
//! - [`events`]: `EventBus` copy-on-write, `LinkEvent`, filtros
//! - [`error`]: `LinkError`, `PipelineFailure`
//! - [`config`]: `CipherConfig`, `ChannelProfile`, `SimulationConfig` (TOML)
//! - [`pipeline`]: passos do pipeline e `StepInfo`
//! - [`stats`]: `SimulationState`, `SimulationStats`
//! - [`traits`] / [`stage`]: contrato dos estágios e núcleo comum
//! - [`guard`] / [`cancel`]: guarda de reentrada e cancelamento
//! - [`labels`]: textos de exibição
//!
//! ## Quick Start
//!
//! ```
//! use telesim_core::prelude::*;
//! use std::sync::Arc;
//!
//! let bus = EventBus::new(Origin::Encoder);
//! bus.subscribe(|event: &LinkEvent| println!("{}", event.event_type));
//!
//! let msg = Arc::new(Message::new("HI"));
//! msg.advance_with(MessageState::Encoded, |f| {
//!     f.binary = Some("0100100001001001".into());
//! })?;
//! bus.publish(EventKind::MessageEncoded, EventPayload::Message(msg));
//! # Ok::<(), LinkError>(())
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod events;
pub mod guard;
pub mod labels;
pub mod message;
pub mod pipeline;
pub mod prelude;
pub mod stage;
pub mod stats;
pub mod traits;

pub use cancel::CancelToken;
pub use config::{
    ChannelProfile, ChannelSettings, ChannelType, CipherAlgorithm, CipherConfig,
    SimulationConfig,
};
pub use error::{LinkError, LinkResult, PipelineFailure};
pub use events::{
    EventBus, EventFilter, EventKind, EventListener, EventPayload, LinkEvent, ListenerId,
    Origin, Subscription,
};
pub use guard::{GuardToken, ReentrancyGuard};
pub use message::{Message, MessageFields, MessageId, MessageSnapshot, MessageState};
pub use pipeline::{PipelineStep, StepInfo, RECEIVER_STEPS, SENDER_STEPS};
pub use stage::StageCore;
pub use stats::{SimulationState, SimulationStats};
pub use traits::Stage;
