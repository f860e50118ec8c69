//! Emissor: Encoder → Cipher → Channel

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;

use serde::Serialize;
use telesim_channel::Channel;
use telesim_codec::{Cipher, Encoder};
use telesim_core::events::DEFAULT_EVENT_HISTORY;
use telesim_core::prelude::*;

use crate::handle::{RunHandle, RunResult};
use crate::relay::relay;

/// Canal ligado ao emissor e a assinatura que republica os seus eventos
struct Attached {
    channel: Arc<Channel>,
    listener: ListenerId,
}

/// Resumo do emissor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SenderStatus {
    pub id: String,
    pub processing: bool,
    pub last_error: Option<String>,
    pub sent: u64,
    pub failed: u64,
    pub algorithm: CipherAlgorithm,
    pub channel_configured: bool,
}

/// Emissor
///
/// Cria a mensagem a partir do texto e a conduz pelos três passos do lado
/// emissor. Os eventos dos estágios chegam ao bus do emissor com o prefixo
/// `SENDER_`; os do próprio emissor (`MESSAGE_CREATED`, `MESSAGE_SENT`,
/// `ERROR_OCCURRED`) saem sem prefixo.
pub struct Sender {
    id: String,
    encoder: Encoder,
    cipher: Cipher,
    channel: RwLock<Option<Attached>>,
    bus: EventBus,
    guard: ReentrancyGuard,
    last_error: Mutex<Option<String>>,
    current: Mutex<Option<Arc<Message>>>,
    history: Mutex<Vec<Arc<Message>>>,
    sent: AtomicU64,
    failed: AtomicU64,
}

impl Sender {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_history(id, DEFAULT_EVENT_HISTORY)
    }

    pub fn with_history(id: impl Into<String>, event_history: usize) -> Self {
        let sender = Self {
            id: id.into(),
            encoder: Encoder::new(),
            cipher: Cipher::new(),
            channel: RwLock::new(None),
            bus: EventBus::with_history(Origin::Sender, event_history),
            guard: ReentrancyGuard::new(),
            last_error: Mutex::new(None),
            current: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            sent: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        };
        relay(sender.encoder.events(), &sender.bus);
        relay(sender.cipher.events(), &sender.bus);
        sender
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    pub fn cipher(&self) -> &Cipher {
        &self.cipher
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    // ═══════════════════════════════════════════════════════════════
    // Configuração
    // ═══════════════════════════════════════════════════════════════

    /// Liga o canal de transmissão, substituindo o anterior
    pub fn set_channel(&self, channel: Arc<Channel>) {
        let listener = relay(channel.events(), &self.bus);
        let previous = self
            .channel
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Attached { channel, listener });
        if let Some(old) = previous {
            old.channel.events().unsubscribe(old.listener);
        }
    }

    /// Desliga o canal; envios seguintes falham com `NoChannelConfigured`
    pub fn detach_channel(&self) -> Option<Arc<Channel>> {
        let previous = self
            .channel
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        previous.channel.events().unsubscribe(previous.listener);
        Some(previous.channel)
    }

    pub fn channel(&self) -> Option<Arc<Channel>> {
        self.channel
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|a| Arc::clone(&a.channel))
    }

    pub fn configure_cipher(&self, config: CipherConfig) {
        self.cipher.configure(config);
    }

    // ═══════════════════════════════════════════════════════════════
    // Envio
    // ═══════════════════════════════════════════════════════════════

    /// Envia numa thread de trabalho
    ///
    /// A reentrada é verificada antes de a thread existir.
    pub fn send(self: &Arc<Self>, text: impl Into<String>) -> LinkResult<RunHandle> {
        self.send_with_cancel(text, CancelToken::new())
    }

    pub fn send_with_cancel(
        self: &Arc<Self>,
        text: impl Into<String>,
        cancel: CancelToken,
    ) -> LinkResult<RunHandle> {
        let token = self.enter()?;
        let this = Arc::clone(self);
        let text = text.into();
        RunHandle::spawn("telesim-sender", move || {
            let _token = token;
            this.execute(&text, &cancel, &mut |_| {})
        })
    }

    /// Envia na thread atual
    pub fn send_blocking(&self, text: &str, cancel: &CancelToken) -> RunResult {
        let _token = self.enter()?;
        self.execute(text, cancel, &mut |_| {})
    }

    /// Envio passo a passo
    ///
    /// `on_step` é chamado antes de cada passo e `on_complete` ao final, já
    /// com a guarda liberada.
    pub fn send_stepwise<S, C>(
        self: &Arc<Self>,
        text: impl Into<String>,
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
        let text = text.into();
        thread::Builder::new()
            .name("telesim-sender-step".to_string())
            .spawn(move || {
                let result = {
                    let _token = token;
                    this.execute(&text, &cancel, &mut on_step)
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
        text: &str,
        cancel: &CancelToken,
        on_step: &mut dyn FnMut(StepInfo),
    ) -> RunResult {
        self.clear_own_error();
        let message = Arc::new(Message::new(text));
        self.set_current(Some(Arc::clone(&message)));
        tracing::debug!(sender = %self.id, message = %message.id(), "message created");
        self.bus.publish(
            EventKind::MessageCreated,
            EventPayload::Message(Arc::clone(&message)),
        );

        let outcome = self.run_steps(&message, cancel, on_step);
        self.set_current(None);

        match outcome {
            Ok(()) => {
                self.history
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(Arc::clone(&message));
                self.sent.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(sender = %self.id, message = %message.id(), "message sent");
                self.bus.publish(
                    EventKind::MessageSent,
                    EventPayload::Message(Arc::clone(&message)),
                );
                Ok(message)
            }
            Err(err) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                message.fail(err.to_string());
                self.report(&err);
                Err(PipelineFailure::new(Some(message), err))
            }
        }
    }

    fn run_steps(
        &self,
        message: &Arc<Message>,
        cancel: &CancelToken,
        on_step: &mut dyn FnMut(StepInfo),
    ) -> LinkResult<()> {
        for step in SENDER_STEPS {
            cancel.check()?;
            on_step(StepInfo::new(step, Arc::clone(message)));
            self.run_step(step, message, cancel).map_err(|err| match err {
                LinkError::Cancelled => err,
                other => other.in_stage(step),
            })?;
        }
        Ok(())
    }

    fn run_step(&self, step: PipelineStep, message: &Arc<Message>, cancel: &CancelToken) -> LinkResult<()> {
        match step {
            PipelineStep::Encoding => self.encoder.encode(message),
            PipelineStep::Encrypting => self.cipher.encrypt(message),
            PipelineStep::Transmitting => {
                let channel = self.channel().ok_or(LinkError::NoChannelConfigured)?;
                channel.transmit_with_cancel(message, cancel)
            }
            PipelineStep::Decrypting | PipelineStep::Decoding => {
                Err(LinkError::Config(format!("{step} is not a sender step")))
            }
        }
    }

    fn set_current(&self, message: Option<Arc<Message>>) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = message;
    }

    fn report(&self, err: &LinkError) {
        let text = err.to_string();
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.clone());
        tracing::warn!(sender = %self.id, error = %text, "send failed");
        self.bus.publish(EventKind::ErrorOccurred, EventPayload::Error(text));
    }

    fn clear_own_error(&self) {
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    // ═══════════════════════════════════════════════════════════════
    // Estado
    // ═══════════════════════════════════════════════════════════════

    pub fn is_processing(&self) -> bool {
        self.guard.is_busy()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Limpa o erro do emissor e dos seus estágios
    pub fn clear_error(&self) {
        self.clear_own_error();
        self.encoder.clear_error();
        self.cipher.clear_error();
    }

    pub fn current_message(&self) -> Option<Arc<Message>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mensagens enviadas com sucesso
    pub fn history(&self) -> Vec<Arc<Message>> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_history(&self) {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.bus.publish(EventKind::HistoryCleared, EventPayload::None);
    }

    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn reset_statistics(&self) {
        self.sent.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
    }

    pub fn status(&self) -> SenderStatus {
        SenderStatus {
            id: self.id.clone(),
            processing: self.is_processing(),
            last_error: self.last_error(),
            sent: self.sent_count(),
            failed: self.failed_count(),
            algorithm: self.cipher.config().algorithm,
            channel_configured: self.channel().is_some(),
        }
    }
}

impl fmt::Debug for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("id", &self.id)
            .field("processing", &self.is_processing())
            .field("sent", &self.sent_count())
            .field("failed", &self.failed_count())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sender{{id={}, processing={}, sent={}, failed={}}}",
            self.id,
            self.is_processing(),
            self.sent_count(),
            self.failed_count()
        )
    }
}
