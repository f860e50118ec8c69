//! Receptor: Decipher → Decoder

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use serde::Serialize;
use telesim_codec::{Decipher, Decoder};
use telesim_core::events::DEFAULT_EVENT_HISTORY;
use telesim_core::prelude::*;
use telesim_core::stats;

use crate::handle::{RunHandle, RunResult};
use crate::relay::relay;

/// Resumo do receptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiverStatus {
    pub id: String,
    pub processing: bool,
    pub last_error: Option<String>,
    pub received: u64,
    pub errored: u64,
    /// Porcentagem
    pub success_rate: f64,
    pub algorithm: CipherAlgorithm,
}

/// Receptor
///
/// Decifra e decodifica a mensagem vinda do canal. Em sucesso a mensagem
/// termina em `Completed`; qualquer falha a deixa em `Error`.
pub struct Receiver {
    id: String,
    decipher: Decipher,
    decoder: Decoder,
    bus: EventBus,
    guard: ReentrancyGuard,
    last_error: Mutex<Option<String>>,
    current: Mutex<Option<Arc<Message>>>,
    history: Mutex<Vec<Arc<Message>>>,
    received: AtomicU64,
    errored: AtomicU64,
}

impl Receiver {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_history(id, DEFAULT_EVENT_HISTORY)
    }

    pub fn with_history(id: impl Into<String>, event_history: usize) -> Self {
        let receiver = Self {
            id: id.into(),
            decipher: Decipher::new(),
            decoder: Decoder::new(),
            bus: EventBus::with_history(Origin::Receiver, event_history),
            guard: ReentrancyGuard::new(),
            last_error: Mutex::new(None),
            current: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            received: AtomicU64::new(0),
            errored: AtomicU64::new(0),
        };
        relay(receiver.decipher.events(), &receiver.bus);
        relay(receiver.decoder.events(), &receiver.bus);
        receiver
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn decipher(&self) -> &Decipher {
        &self.decipher
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn configure_decipher(&self, config: CipherConfig) {
        self.decipher.configure(config);
    }

    /// Recebe numa thread de trabalho
    pub fn receive(self: &Arc<Self>, message: Arc<Message>) -> LinkResult<RunHandle> {
        self.receive_with_cancel(message, CancelToken::new())
    }

    pub fn receive_with_cancel(
        self: &Arc<Self>,
        message: Arc<Message>,
        cancel: CancelToken,
    ) -> LinkResult<RunHandle> {
        let token = self.enter()?;
        let this = Arc::clone(self);
        RunHandle::spawn("telesim-receiver", move || {
            let _token = token;
            this.execute(&message, &cancel, &mut |_| {})
        })
    }

    /// Recebe na thread atual
    pub fn receive_blocking(&self, message: &Arc<Message>, cancel: &CancelToken) -> RunResult {
        let _token = self
            .enter()
            .map_err(|err| PipelineFailure::new(Some(Arc::clone(message)), err))?;
        self.execute(message, cancel, &mut |_| {})
    }

    /// Recepção passo a passo; ver [`Sender::send_stepwise`](crate::Sender::send_stepwise)
    pub fn receive_stepwise<S, C>(
        self: &Arc<Self>,
        message: Arc<Message>,
        cancel: CancelToken,
        mut on_step: S,
        on_complete: C,
    ) -> LinkResult<()>
    where
        S: FnMut(StepInfo) + Send + 'static,
        C: FnOnce(RunResult) + Send + 'static,
    {
        let token = self.enter()?;
        let this = Arc::clone(self);
        thread::Builder::new()
            .name("telesim-receiver-step".to_string())
            .spawn(move || {
                let result = {
                    let _token = token;
                    this.execute(&message, &cancel, &mut on_step)
                };
                on_complete(result);
            })
            .map_err(|e| LinkError::Spawn(e.to_string()))?;
        Ok(())
    }

    /// Leva a mensagem em voo para `Error`
    pub fn abort_current(&self, reason: &str) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|m| m.fail(reason))
    }

    fn enter(&self) -> LinkResult<GuardToken> {
        self.guard.try_enter().ok_or_else(|| {
            let err = LinkError::AlreadyProcessing(self.id.clone());
            self.report(&err);
            err
        })
    }

    fn execute(
        &self,
        message: &Arc<Message>,
        cancel: &CancelToken,
        on_step: &mut dyn FnMut(StepInfo),
    ) -> RunResult {
        self.clear_own_error();
        self.set_current(Some(Arc::clone(message)));
        self.received.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(receiver = %self.id, message = %message.id(), "message received");
        self.bus.publish(
            EventKind::MessageReceived,
            EventPayload::Message(Arc::clone(message)),
        );

        let outcome = self
            .run_steps(message, cancel, on_step)
            .and_then(|()| message.advance(MessageState::Completed));
        self.set_current(None);

        match outcome {
            Ok(()) => {
                self.history
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Arc::clone(message));
                tracing::debug!(receiver = %self.id, message = %message.id(), "message processed");
                self.bus.publish(
                    EventKind::MessageProcessed,
                    EventPayload::Message(Arc::clone(message)),
                );
                self.bus.publish(
                    EventKind::ProcessingCompleted,
                    EventPayload::Message(Arc::clone(message)),
                );
                Ok(Arc::clone(message))
            }
            Err(err) => {
                self.errored.fetch_add(1, Ordering::Relaxed);
                message.fail(err.to_string());
                self.report(&err);
                Err(PipelineFailure::new(Some(Arc::clone(message)), err))
            }
        }
    }

    fn run_steps(
        &self,
        message: &Arc<Message>,
        cancel: &CancelToken,
        on_step: &mut dyn FnMut(StepInfo),
    ) -> LinkResult<()> {
        for step in RECEIVER_STEPS {
            cancel.check()?;
            on_step(StepInfo::new(step, Arc::clone(message)));
            let result = match step {
                PipelineStep::Decrypting => {
                    self.bus.publish(
                        EventKind::DecryptingStart,
                        EventPayload::Message(Arc::clone(message)),
                    );
                    self.decipher.decrypt(message)
                }
                PipelineStep::Decoding => {
                    self.bus.publish(
                        EventKind::DecodingStart,
                        EventPayload::Message(Arc::clone(message)),
                    );
                    self.decoder.decode(message)
                }
                other => Err(LinkError::Config(format!("{other} is not a receiver step"))),
            };
            result.map_err(|err| match err {
                LinkError::Cancelled => err,
                other => other.in_stage(step),
            })?;
        }
        Ok(())
    }

    fn set_current(&self, message: Option<Arc<Message>>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }

    fn report(&self, err: &LinkError) {
        let text = err.to_string();
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.clone());
        tracing::warn!(receiver = %self.id, error = %text, "receive failed");
        self.bus.publish(EventKind::ErrorOccurred, EventPayload::Error(text));
    }

    fn clear_own_error(&self) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
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

    /// Limpa o erro do receptor e dos seus estágios
    pub fn clear_error(&self) {
        self.clear_own_error();
        self.decipher.clear_error();
        self.decoder.clear_error();
    }

    pub fn current_message(&self) -> Option<Arc<Message>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mensagens concluídas
    pub fn history(&self) -> Vec<Arc<Message>> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_message(&self) -> Option<Arc<Message>> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn clear_history(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.bus.publish(EventKind::HistoryCleared, EventPayload::None);
    }

    /// Mensagens que chegaram ao receptor (com ou sem sucesso)
    pub fn received_count(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.errored.load(Ordering::Relaxed)
    }

    /// Porcentagem de mensagens concluídas sobre as recebidas
    pub fn success_rate(&self) -> f64 {
        stats::success_rate(self.received_count(), self.error_count())
    }

    pub fn reset_statistics(&self) {
        self.received.store(0, Ordering::Relaxed);
        self.errored.store(0, Ordering::Relaxed);
    }

    pub fn status(&self) -> ReceiverStatus {
        ReceiverStatus {
            id: self.id.clone(),
            processing: self.is_processing(),
            last_error: self.last_error(),
            received: self.received_count(),
            errored: self.error_count(),
            success_rate: self.success_rate(),
            algorithm: self.decipher.config().algorithm,
        }
    }
}

impl fmt::Debug for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("id", &self.id)
            .field("processing", &self.is_processing())
            .field("received", &self.received_count())
            .field("errored", &self.error_count())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Receiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Receiver{{id={}, processing={}, received={}, errors={}, success={:.1}%}}",
            self.id,
            self.is_processing(),
            self.received_count(),
            self.error_count(),
            self.success_rate()
        )
    }
}
