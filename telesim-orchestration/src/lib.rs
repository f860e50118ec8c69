//! # 🎭 telesim-orchestration — Emissor, Receptor e Simulação
//!
//! Compõe os estágios em dois lados do enlace e controla o ciclo de vida
//! da simulação.
//!
//! ## Arquitetura
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     Orchestrator                         │
//! │  Idle → Configuring → Running ⇄ Paused → Completed|Error │
//! │  ┌──────────────────────────┐  ┌──────────────────────┐  │
//! │  │ Sender                   │  │ Receiver             │  │
//! │  │ Encoder → Cipher → Channel ─► Decipher → Decoder    │  │
//! │  └──────────────────────────┘  └──────────────────────┘  │
//! │  ORCHESTRATOR_ ◄── SENDER_ / RECEIVER_ ◄── estágios      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Exemplo
//!
//! ```
//! use telesim_orchestration::Orchestrator;
//! use telesim_core::prelude::*;
//!
//! let mut config = SimulationConfig::default();
//! config.channel.bits_per_second = 1e6;
//! config.cipher = CipherConfig::new(CipherAlgorithm::Xor, "1010");
//!
//! let orchestrator = Orchestrator::with_config(config);
//! let message = orchestrator.run_complete("HI")?.wait()?;
//!
//! assert_eq!(message.decoded().as_deref(), Some("HI"));
//! assert_eq!(orchestrator.state(), SimulationState::Completed);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod handle;
pub mod orchestrator;
pub mod receiver;
mod relay;
pub mod sender;

pub use handle::{Completer, RunHandle, RunResult};
pub use orchestrator::Orchestrator;
pub use receiver::{Receiver, ReceiverStatus};
pub use sender::{Sender, SenderStatus};
