//! Passos do pipeline de envio e recepção

use std::fmt;
use std::sync::Arc;

use crate::events::Origin;
use crate::message::{Message, MessageState};

/// Macro-passo do pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStep {
    /// Texto → binário
    Encoding = 0,
    /// Binário → conteúdo cifrado
    Encrypting = 1,
    /// Passagem pelo canal
    Transmitting = 2,
    /// Conteúdo cifrado → binário
    Decrypting = 3,
    /// Binário → texto, com verificação de integridade
    Decoding = 4,
}

/// Passos executados pelo emissor, em ordem
pub const SENDER_STEPS: [PipelineStep; 3] = [
    PipelineStep::Encoding,
    PipelineStep::Encrypting,
    PipelineStep::Transmitting,
];

/// Passos executados pelo receptor, em ordem
pub const RECEIVER_STEPS: [PipelineStep; 2] = [PipelineStep::Decrypting, PipelineStep::Decoding];

impl PipelineStep {
    /// Nome usado nos eventos de passo
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStep::Encoding => "ENCODING",
            PipelineStep::Encrypting => "ENCRYPTING",
            PipelineStep::Transmitting => "TRANSMITTING",
            PipelineStep::Decrypting => "DECRYPTING",
            PipelineStep::Decoding => "DECODING",
        }
    }

    /// Próximo passo no mesmo lado do enlace
    pub fn next(&self) -> Option<PipelineStep> {
        match self {
            PipelineStep::Encoding => Some(PipelineStep::Encrypting),
            PipelineStep::Encrypting => Some(PipelineStep::Transmitting),
            PipelineStep::Transmitting => None,
            PipelineStep::Decrypting => Some(PipelineStep::Decoding),
            PipelineStep::Decoding => None,
        }
    }

    /// Componente composto que executa o passo
    pub fn side(&self) -> Origin {
        match self {
            PipelineStep::Encoding | PipelineStep::Encrypting | PipelineStep::Transmitting => {
                Origin::Sender
            }
            PipelineStep::Decrypting | PipelineStep::Decoding => Origin::Receiver,
        }
    }

    /// Estágio que implementa o passo
    pub fn stage(&self) -> Origin {
        match self {
            PipelineStep::Encoding => Origin::Encoder,
            PipelineStep::Encrypting => Origin::Cipher,
            PipelineStep::Transmitting => Origin::Channel,
            PipelineStep::Decrypting => Origin::Decipher,
            PipelineStep::Decoding => Origin::Decoder,
        }
    }

    /// Estado da mensagem após o passo com sucesso
    pub fn resulting_state(&self) -> MessageState {
        match self {
            PipelineStep::Encoding => MessageState::Encoded,
            PipelineStep::Encrypting => MessageState::Encrypted,
            PipelineStep::Transmitting => MessageState::Received,
            PipelineStep::Decrypting => MessageState::Decrypted,
            PipelineStep::Decoding => MessageState::Decoded,
        }
    }
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStep::Encoding => "encoding",
            PipelineStep::Encrypting => "encryption",
            PipelineStep::Transmitting => "transmission",
            PipelineStep::Decrypting => "decryption",
            PipelineStep::Decoding => "decoding",
        };
        f.write_str(name)
    }
}

/// Informação de um passo no modo passo a passo
#[derive(Debug, Clone)]
pub struct StepInfo {
    pub step: PipelineStep,
    pub component: Origin,
    pub message: Arc<Message>,
}

impl StepInfo {
    pub fn new(step: PipelineStep, message: Arc<Message>) -> Self {
        Self {
            step,
            component: step.side(),
            message,
        }
    }
}
