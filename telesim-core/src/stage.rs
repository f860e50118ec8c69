//! Núcleo comum dos estágios: guarda de reentrada, último erro e eventos

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{LinkError, LinkResult};
use crate::events::{EventBus, EventKind, EventPayload, Origin};
use crate::guard::{GuardToken, ReentrancyGuard};
use crate::message::Message;

/// Estado compartilhado por todo estágio
///
/// `run` dispara `PROCESSING_STARTED`, executa o trabalho e publica o evento
/// específico do estágio seguido de `PROCESSING_COMPLETED`, ou então marca a
/// mensagem em `Error` e publica `ERROR_OCCURRED`.
#[derive(Debug)]
pub struct StageCore {
    name: &'static str,
    bus: EventBus,
    guard: ReentrancyGuard,
    last_error: Mutex<Option<String>>,
}

impl StageCore {
    pub fn new(name: &'static str, origin: Origin) -> Self {
        Self::with_bus(name, EventBus::new(origin))
    }

    pub fn with_bus(name: &'static str, bus: EventBus) -> Self {
        Self {
            name,
            bus,
            guard: ReentrancyGuard::new(),
            last_error: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn is_processing(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_error(&self) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Registra o erro e publica `ERROR_OCCURRED`, sem tocar na mensagem
    pub fn report(&self, err: &LinkError) {
        let text = err.to_string();
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.clone());
        tracing::warn!(stage = self.name, error = %text, "stage failed");
        self.bus.publish(EventKind::ErrorOccurred, EventPayload::Error(text));
    }

    /// Falha do estágio: mensagem vai para `Error`
    pub fn fail(&self, message: &Message, err: &LinkError) {
        message.fail(err.to_string());
        self.report(err);
    }

    /// Entra na guarda ou devolve o erro de reentrada do componente
    pub fn enter(&self) -> LinkResult<GuardToken> {
        self.guard.try_enter().ok_or_else(|| {
            let err = match self.bus.owner() {
                Origin::Channel => LinkError::AlreadyTransmitting,
                _ => LinkError::AlreadyProcessing(self.name.to_string()),
            };
            self.report(&err);
            err
        })
    }

    /// Executa o trabalho do estágio sob a guarda
    pub fn run<F>(&self, message: &Arc<Message>, done: EventKind, work: F) -> LinkResult<()>
    where
        F: FnOnce() -> LinkResult<()>,
    {
        let _token = self.enter()?;
        self.clear_error();
        tracing::debug!(stage = self.name, message = %message.id(), "processing started");
        self.bus.publish(
            EventKind::ProcessingStarted,
            EventPayload::Message(Arc::clone(message)),
        );

        match work() {
            Ok(()) => {
                tracing::debug!(stage = self.name, message = %message.id(), state = %message.state(), "processing completed");
                self.bus
                    .publish(done, EventPayload::Message(Arc::clone(message)));
                self.bus.publish(
                    EventKind::ProcessingCompleted,
                    EventPayload::Message(Arc::clone(message)),
                );
                Ok(())
            }
            Err(err) => {
                self.fail(message, &err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageState;

    fn recorder(bus: &EventBus) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(move |e| sink.lock().unwrap().push(e.event_type.clone()));
        seen
    }

    #[test]
    fn test_run_success_event_order() {
        let core = StageCore::new("Encoder", Origin::Encoder);
        let seen = recorder(core.events());
        let msg = Arc::new(Message::new("x"));

        core.run(&msg, EventKind::MessageEncoded, || msg.advance(MessageState::Encoded))
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["PROCESSING_STARTED", "MESSAGE_ENCODED", "PROCESSING_COMPLETED"]
        );
        assert!(!core.is_processing());
    }

    #[test]
    fn test_run_failure_marks_message() {
        let core = StageCore::new("Decoder", Origin::Decoder);
        let seen = recorder(core.events());
        let msg = Arc::new(Message::new("x"));

        let err = core
            .run(&msg, EventKind::MessageDecoded, || {
                Err(LinkError::MalformedBinary("length 3".into()))
            })
            .unwrap_err();

        assert!(matches!(err, LinkError::MalformedBinary(_)));
        assert_eq!(msg.state(), MessageState::Error);
        assert_eq!(
            core.last_error().as_deref(),
            Some("malformed binary content: length 3")
        );
        assert_eq!(
            seen.lock().unwrap().last().map(String::as_str),
            Some("ERROR_OCCURRED")
        );
        core.clear_error();
        assert!(core.last_error().is_none());
    }

    #[test]
    fn test_reentry_rejected_without_touching_message() {
        let core = Arc::new(StageCore::new("Cipher", Origin::Cipher));
        let outer = Arc::new(Message::new("a"));
        let inner = Arc::new(Message::new("b"));

        let nested = Arc::clone(&core);
        let inner_msg = Arc::clone(&inner);
        core.run(&outer, EventKind::MessageEncrypted, || {
            let err = nested
                .run(&inner_msg, EventKind::MessageEncrypted, || Ok(()))
                .unwrap_err();
            assert_eq!(err, LinkError::AlreadyProcessing("Cipher".into()));
            Ok(())
        })
        .unwrap();

        assert_eq!(inner.state(), MessageState::Created);
        assert_eq!(outer.state(), MessageState::Created);
    }

    #[test]
    fn test_channel_reentry_error() {
        let core = StageCore::new("Channel", Origin::Channel);
        let _token = core.enter().unwrap();
        assert_eq!(core.enter().unwrap_err(), LinkError::AlreadyTransmitting);
    }
}
