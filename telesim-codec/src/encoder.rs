//! Codificador: texto → cadeia binária

use std::sync::Arc;

use telesim_core::prelude::*;

use crate::binary::text_to_binary;

/// Transformação pura do codificador
pub fn encode(text: &str) -> LinkResult<String> {
    if text.is_empty() {
        return Err(LinkError::EmptyOrNullInput);
    }
    Ok(text_to_binary(text))
}

/// Estágio de codificação
///
/// Preenche `binary` e `encoded` (entrada da cifra) e leva a mensagem a
/// `Encoded`.
#[derive(Debug)]
pub struct Encoder {
    core: StageCore,
}

impl Encoder {
    pub fn new() -> Self {
        Self {
            core: StageCore::new("Encoder", Origin::Encoder),
        }
    }

    /// Codifica a mensagem
    pub fn encode(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.core.run(message, EventKind::MessageEncoded, || {
            let binary = encode(message.original())?;
            message.advance_with(MessageState::Encoded, |fields| {
                fields.encoded = Some(binary.clone());
                fields.binary = Some(binary);
            })
        })
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Encoder {
    fn name(&self) -> &'static str {
        self.core.name()
    }

    fn process(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.encode(message)
    }

    fn is_processing(&self) -> bool {
        self.core.is_processing()
    }

    fn last_error(&self) -> Option<String> {
        self.core.last_error()
    }

    fn clear_error(&self) {
        self.core.clear_error()
    }

    fn events(&self) -> &EventBus {
        self.core.events()
    }
}
