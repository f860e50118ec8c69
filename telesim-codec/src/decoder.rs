//! Decodificador: cadeia binária → texto, com verificação de integridade

use std::sync::Arc;

use telesim_core::prelude::*;

use crate::binary::binary_to_bytes;

/// Transformação pura do decodificador
///
/// Compara os bytes decodificados com o texto original: qualquer diferença
/// (bit corrompido pelo canal, chave errada) é `IntegrityMismatch`.
pub fn decode(binary: &str, original: &str) -> LinkResult<String> {
    let bytes = binary_to_bytes(binary)?;
    if bytes != original.as_bytes() {
        return Err(LinkError::IntegrityMismatch {
            expected: original.to_string(),
            actual: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }
    Ok(original.to_string())
}

/// Estágio de decodificação
#[derive(Debug)]
pub struct Decoder {
    core: StageCore,
}

impl Decoder {
    pub fn new() -> Self {
        Self {
            core: StageCore::new("Decoder", Origin::Decoder),
        }
    }

    /// Decodifica o campo `encoded` (restaurado pelo decifrador)
    pub fn decode(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.core.run(message, EventKind::MessageDecoded, || {
            let encoded = message
                .encoded()
                .filter(|s| !s.is_empty())
                .ok_or(LinkError::EmptyContent {
                    field: "encoded",
                    operation: "decode",
                })?;
            let text = decode(&encoded, message.original())?;
            message.advance_with(MessageState::Decoded, |fields| {
                fields.decoded = Some(text);
            })
        })
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Decoder {
    fn name(&self) -> &'static str {
        self.core.name()
    }

    fn process(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.decode(message)
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
