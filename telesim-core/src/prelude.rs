//! # Prelude — Re-exportações Convenientes
//!
//! ```
//! use telesim_core::prelude::*;
//! ```

// Mensagem
pub use crate::message::{Message, MessageFields, MessageId, MessageSnapshot, MessageState};

// Eventos
pub use crate::events::{
    EventBus, EventFilter, EventKind, EventListener, EventPayload, LinkEvent, ListenerId,
    Origin, Subscription,
};

// Erros
pub use crate::error::{LinkError, LinkResult, PipelineFailure};

// Configuração
pub use crate::config::{
    ChannelProfile, ChannelSettings, ChannelType, CipherAlgorithm, CipherConfig,
    SimulationConfig,
};

// Pipeline
pub use crate::pipeline::{PipelineStep, StepInfo, RECEIVER_STEPS, SENDER_STEPS};
pub use crate::stage::StageCore;
pub use crate::traits::Stage;

// Concorrência
pub use crate::cancel::CancelToken;
pub use crate::guard::{GuardToken, ReentrancyGuard};

// Estatísticas
pub use crate::stats::{SimulationState, SimulationStats};
