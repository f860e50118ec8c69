//! Erros do enlace simulado

use std::sync::Arc;
use thiserror::Error;

use crate::message::{Message, MessageState};
use crate::pipeline::PipelineStep;

pub type LinkResult<T> = Result<T, LinkError>;

/// Erros de qualquer estágio, componente ou da orquestração
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LinkError {
    /// Texto de entrada vazio
    #[error("message content cannot be empty")]
    EmptyOrNullInput,

    /// Campo exigido pelo estágio está vazio
    #[error("no {field} content to {operation}")]
    EmptyContent {
        field: &'static str,
        operation: &'static str,
    },

    /// Reentrada no mesmo componente
    #[error("{0} is already processing another message")]
    AlreadyProcessing(String),

    /// Reentrada no canal
    #[error("channel is already transmitting another message")]
    AlreadyTransmitting,

    /// Conteúdo não é uma cadeia binária válida
    #[error("malformed binary content: {0}")]
    MalformedBinary(String),

    /// Conteúdo cifrado não pode ser revertido (ex.: Base64 inválido)
    #[error("malformed cipher content: {0}")]
    MalformedContent(String),

    /// Texto decodificado difere do original
    #[error("decoded text does not match the original (expected {expected:?}, got {actual:?})")]
    IntegrityMismatch { expected: String, actual: String },

    /// Algoritmo de cifra desconhecido
    #[error("unsupported cipher algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Emissor sem canal
    #[error("no channel configured for transmission")]
    NoChannelConfigured,

    /// Passo pedido fora do modo passo a passo
    #[error("simulation is not in step mode")]
    NotInStepMode,

    /// Já existe uma simulação ativa
    #[error("a simulation is already in progress")]
    AlreadyInProgress,

    /// Transição de estado que regride no ciclo de vida
    #[error("invalid message transition from {from:?} to {to:?}")]
    InvalidTransition { from: MessageState, to: MessageState },

    /// Execução cancelada por `stop()`
    #[error("operation cancelled")]
    Cancelled,

    /// Falha de um estágio, com o contexto de quem o chamou
    #[error("Error in {stage}: {source}")]
    Stage {
        stage: PipelineStep,
        #[source]
        source: Box<LinkError>,
    },

    /// Configuração inválida
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Thread de trabalho não pôde ser criada
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),

    /// Thread de trabalho terminou sem resultado (pânico)
    #[error("worker thread terminated without a result")]
    WorkerLost,

    /// Lock poison
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl LinkError {
    /// Envolve o erro com o contexto do estágio
    pub fn in_stage(self, stage: PipelineStep) -> Self {
        LinkError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// Erro original, descartando os contextos de estágio
    pub fn root(&self) -> &LinkError {
        match self {
            LinkError::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for LinkError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        LinkError::LockPoisoned(err.to_string())
    }
}

/// Falha de uma execução completa, com a mensagem afetada (se já criada)
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct PipelineFailure {
    pub message: Option<Arc<Message>>,
    #[source]
    pub error: LinkError,
}

impl PipelineFailure {
    pub fn new(message: Option<Arc<Message>>, error: LinkError) -> Self {
        Self { message, error }
    }

    /// Falha antes de existir mensagem
    pub fn bare(error: LinkError) -> Self {
        Self {
            message: None,
            error,
        }
    }
}

impl From<LinkError> for PipelineFailure {
    fn from(error: LinkError) -> Self {
        PipelineFailure::bare(error)
    }
}
