//! Mensagem — unidade de trabalho do pipeline
//!
//! O texto original e o instante de criação são imutáveis. Os campos
//! intermediários são preenchidos pelos estágios, sempre junto com a
//! transição de estado, sob o mesmo lock de escrita.
//!
//! ```text
//! Created → Encoded → Encrypted → Transmitting → Received
//!         → Decrypted → Decoded → Completed
//!
//! qualquer estado não terminal ──► Error (absorvente)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{LinkError, LinkResult};

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Identificador único de mensagem (no processo)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MSG-{:05}", self.0)
    }
}

/// Ciclo de vida da mensagem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageState {
    #[default]
    Created,
    Encoded,
    Encrypted,
    Transmitting,
    Received,
    Decrypted,
    Decoded,
    Completed,
    Error,
}

impl MessageState {
    /// Posição na cadeia; `None` para `Error`
    pub fn rank(&self) -> Option<u8> {
        match self {
            MessageState::Created => Some(0),
            MessageState::Encoded => Some(1),
            MessageState::Encrypted => Some(2),
            MessageState::Transmitting => Some(3),
            MessageState::Received => Some(4),
            MessageState::Decrypted => Some(5),
            MessageState::Decoded => Some(6),
            MessageState::Completed => Some(7),
            MessageState::Error => None,
        }
    }

    /// Avança apenas para frente; `Error` é alcançável de qualquer estado não terminal
    pub fn can_transition_to(&self, to: MessageState) -> bool {
        match (self.rank(), to.rank()) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(from), Some(to)) => to > from,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageState::Completed | MessageState::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageState::Created => "CREATED",
            MessageState::Encoded => "ENCODED",
            MessageState::Encrypted => "ENCRYPTED",
            MessageState::Transmitting => "TRANSMITTING",
            MessageState::Received => "RECEIVED",
            MessageState::Decrypted => "DECRYPTED",
            MessageState::Decoded => "DECODED",
            MessageState::Completed => "COMPLETED",
            MessageState::Error => "ERROR",
        }
    }
}

impl fmt::Display for MessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Campos mutáveis preenchidos pelos estágios
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageFields {
    /// Forma binária produzida pelo codificador
    pub binary: Option<String>,
    /// Entrada da cifra (restaurada pelo decifrador)
    pub encoded: Option<String>,
    /// Saída da cifra; alterada pelo canal
    pub encrypted: Option<String>,
    /// Texto recuperado pelo decodificador
    pub decoded: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    fields: MessageFields,
    state: MessageState,
    failure: Option<String>,
}

/// Mensagem compartilhada entre emissor, canal e receptor (via `Arc`)
#[derive(Debug)]
pub struct Message {
    id: MessageId,
    original: String,
    created_at: SystemTime,
    inner: RwLock<Inner>,
}

impl Message {
    /// Cria nova mensagem no estado `Created`
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: MessageId(NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed)),
            original: content.into(),
            created_at: SystemTime::now(),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Texto original (imutável)
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn state(&self) -> MessageState {
        self.read(|inner| inner.state)
    }

    pub fn binary(&self) -> Option<String> {
        self.read(|inner| inner.fields.binary.clone())
    }

    pub fn encoded(&self) -> Option<String> {
        self.read(|inner| inner.fields.encoded.clone())
    }

    pub fn encrypted(&self) -> Option<String> {
        self.read(|inner| inner.fields.encrypted.clone())
    }

    pub fn decoded(&self) -> Option<String> {
        self.read(|inner| inner.fields.decoded.clone())
    }

    /// Motivo registrado na transição para `Error`
    pub fn failure(&self) -> Option<String> {
        self.read(|inner| inner.failure.clone())
    }

    /// Cópia de todos os campos mutáveis
    pub fn fields(&self) -> MessageFields {
        self.read(|inner| inner.fields.clone())
    }

    /// Tamanho do texto original em bytes (UTF-8)
    pub fn byte_len(&self) -> usize {
        self.original.len()
    }

    /// Tamanho da forma binária em bits
    pub fn bit_len(&self) -> usize {
        self.read(|inner| inner.fields.binary.as_ref().map_or(0, String::len))
    }

    pub fn has_error(&self) -> bool {
        self.state() == MessageState::Error
    }

    pub fn is_complete(&self) -> bool {
        self.state() == MessageState::Completed
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Transição de estado sem alterar campos
    pub fn advance(&self, to: MessageState) -> LinkResult<()> {
        self.advance_with(to, |_| {})
    }

    /// Transição de estado e atualização de campos, atômicas
    ///
    /// A transição é validada antes de `update` rodar; em caso de regressão
    /// nada é alterado.
    pub fn advance_with<F>(&self, to: MessageState, update: F) -> LinkResult<()>
    where
        F: FnOnce(&mut MessageFields),
    {
        let mut inner = self.inner.write()?;
        if !inner.state.can_transition_to(to) {
            return Err(LinkError::InvalidTransition {
                from: inner.state,
                to,
            });
        }
        update(&mut inner.fields);
        inner.state = to;
        Ok(())
    }

    /// Leva a mensagem a `Error`; retorna `false` se já estava em estado terminal
    pub fn fail(&self, reason: impl Into<String>) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.state.is_terminal() {
            return false;
        }
        inner.state = MessageState::Error;
        inner.failure = Some(reason.into());
        true
    }

    /// Fotografia serializável
    pub fn snapshot(&self) -> MessageSnapshot {
        self.read(|inner| MessageSnapshot {
            id: self.id,
            original: self.original.clone(),
            created_at_micros: self
                .created_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_micros() as u64)
                .unwrap_or(0),
            state: inner.state,
            binary: inner.fields.binary.clone(),
            encoded: inner.fields.encoded.clone(),
            encrypted: inner.fields.encrypted.clone(),
            decoded: inner.fields.decoded.clone(),
            failure: inner.failure.clone(),
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Inner) -> T) -> T {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&inner)
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message{{id={}, state={}, size={} bytes}}",
            self.id,
            self.state(),
            self.byte_len()
        )
    }
}

/// Estado de uma mensagem num instante, para a camada de apresentação
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MessageSnapshot {
    pub id: MessageId,
    pub original: String,
    pub created_at_micros: u64,
    pub state: MessageState,
    pub binary: Option<String>,
    pub encoded: Option<String>,
    pub encrypted: Option<String>,
    pub decoded: Option<String>,
    pub failure: Option<String>,
}
