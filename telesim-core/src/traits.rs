//! Traits dos componentes do enlace
//!
//! | Lado | Estágios |
//! |:-----|:---------|
//! | Emissor | Encoder → Cipher → Channel |
//! | Receptor | Decipher → Decoder |
//!
//! Cada estágio recebe a mensagem por referência compartilhada e, em caso
//! de falha, deixa a mensagem em `Error`, registra o último erro e publica
//! `ERROR_OCCURRED`.

use std::sync::Arc;

use crate::error::LinkResult;
use crate::events::EventBus;
use crate::message::Message;

/// Estágio do pipeline (codificador, cifra, canal, decifrador, decodificador)
pub trait Stage: Send + Sync {
    /// Nome do componente
    fn name(&self) -> &'static str;

    /// Processa a mensagem; rejeita reentrada
    fn process(&self, message: &Arc<Message>) -> LinkResult<()>;

    /// Há uma mensagem em voo neste componente
    fn is_processing(&self) -> bool;

    /// Texto do último erro, se houver
    fn last_error(&self) -> Option<String>;

    fn clear_error(&self);

    /// Bus de eventos do componente
    fn events(&self) -> &EventBus;

    /// Resumo de uma linha
    fn describe(&self) -> String {
        format!(
            "{}{{processing={}, last_error={}}}",
            self.name(),
            self.is_processing(),
            self.last_error().as_deref().unwrap_or("none")
        )
    }
}
