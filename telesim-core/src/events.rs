//! Sistema de eventos do enlace
//!
//! Cada componente possui o seu [`EventBus`]. Componentes compostos
//! (emissor, receptor, orquestrador) assinam o bus dos filhos e
//! republicam os eventos com o seu prefixo:
//!
//! ```text
//! Encoder ── MESSAGE_ENCODED ──► Sender ── SENDER_MESSAGE_ENCODED ──►
//!   Orchestrator ── ORCHESTRATOR_SENDER_MESSAGE_ENCODED ──► UI
//! ```
//!
//! A lista de listeners é copy-on-write: `publish` tira um snapshot do
//! `Arc<Vec<_>>` e itera sem lock, então (des)inscrições concorrentes nunca
//! são observadas pela metade.

use std::collections::VecDeque;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use crossbeam_utils::sync::ShardedLock;

use crate::message::Message;
use crate::pipeline::StepInfo;
use crate::stats::SimulationStats;

/// Tamanho padrão do histórico de eventos
pub const DEFAULT_EVENT_HISTORY: usize = 256;

/// Capacidade padrão da fila de cada assinatura por canal
pub const DEFAULT_SUBSCRIPTION_CAPACITY: usize = 1024;

/// Componente que originou o evento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Origin {
    Encoder,
    Cipher,
    Channel,
    Decipher,
    Decoder,
    Sender,
    Receiver,
    Orchestrator,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Encoder => "Encoder",
            Origin::Cipher => "Cipher",
            Origin::Channel => "Channel",
            Origin::Decipher => "Decipher",
            Origin::Decoder => "Decoder",
            Origin::Sender => "Sender",
            Origin::Receiver => "Receiver",
            Origin::Orchestrator => "Orchestrator",
        }
    }

    /// Prefixo aplicado pelo componente composto ao republicar eventos
    pub fn prefix(&self) -> Option<&'static str> {
        match self {
            Origin::Sender => Some("SENDER_"),
            Origin::Receiver => Some("RECEIVER_"),
            Origin::Orchestrator => Some("ORCHESTRATOR_"),
            _ => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tipos de evento
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    // Estágios
    ProcessingStarted,
    ProcessingCompleted,
    ErrorOccurred,
    MessageEncoded,
    MessageEncrypted,
    MessageTransmitted,
    MessageDecrypted,
    MessageDecoded,
    TransmissionProgress,
    // Emissor / receptor
    MessageCreated,
    MessageSent,
    MessageReceived,
    DecryptingStart,
    DecodingStart,
    MessageProcessed,
    HistoryCleared,
    // Orquestrador
    EncryptionConfigured,
    ChannelConfigured,
    SimulationStarted,
    SimulationStepModeStarted,
    SimulationStep,
    SenderCompleted,
    SimulationCompleted,
    SimulationStopped,
    StatisticsReset,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ProcessingStarted => "PROCESSING_STARTED",
            EventKind::ProcessingCompleted => "PROCESSING_COMPLETED",
            EventKind::ErrorOccurred => "ERROR_OCCURRED",
            EventKind::MessageEncoded => "MESSAGE_ENCODED",
            EventKind::MessageEncrypted => "MESSAGE_ENCRYPTED",
            EventKind::MessageTransmitted => "MESSAGE_TRANSMITTED",
            EventKind::MessageDecrypted => "MESSAGE_DECRYPTED",
            EventKind::MessageDecoded => "MESSAGE_DECODED",
            EventKind::TransmissionProgress => "TRANSMISSION_PROGRESS",
            EventKind::MessageCreated => "MESSAGE_CREATED",
            EventKind::MessageSent => "MESSAGE_SENT",
            EventKind::MessageReceived => "MESSAGE_RECEIVED",
            EventKind::DecryptingStart => "DECRYPTING_START",
            EventKind::DecodingStart => "DECODING_START",
            EventKind::MessageProcessed => "MESSAGE_PROCESSED",
            EventKind::HistoryCleared => "HISTORY_CLEARED",
            EventKind::EncryptionConfigured => "ENCRYPTION_CONFIGURED",
            EventKind::ChannelConfigured => "CHANNEL_CONFIGURED",
            EventKind::SimulationStarted => "SIMULATION_STARTED",
            EventKind::SimulationStepModeStarted => "SIMULATION_STEP_MODE_STARTED",
            EventKind::SimulationStep => "SIMULATION_STEP",
            EventKind::SenderCompleted => "SENDER_COMPLETED",
            EventKind::SimulationCompleted => "SIMULATION_COMPLETED",
            EventKind::SimulationStopped => "SIMULATION_STOPPED",
            EventKind::StatisticsReset => "STATISTICS_RESET",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dados anexados ao evento
#[derive(Debug, Clone, Default)]
pub enum EventPayload {
    #[default]
    None,
    Message(Arc<Message>),
    /// Fração concluída da transmissão, em [0, 1]
    Progress(f64),
    Error(String),
    Step(StepInfo),
    Stats(SimulationStats),
    Text(String),
}

impl EventPayload {
    pub fn message(&self) -> Option<&Arc<Message>> {
        match self {
            EventPayload::Message(msg) => Some(msg),
            EventPayload::Step(info) => Some(&info.message),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            EventPayload::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<f64> {
        match self {
            EventPayload::Progress(p) => Some(*p),
            _ => None,
        }
    }
}

/// Evento publicado no bus
#[derive(Debug, Clone)]
pub struct LinkEvent {
    /// Nome hierárquico (ex.: `SENDER_MESSAGE_ENCODED`)
    pub event_type: String,
    pub kind: EventKind,
    /// Estágio ou componente que publicou primeiro
    pub origin: Origin,
    pub payload: EventPayload,
    /// Microssegundos desde a época Unix
    pub timestamp: u64,
}

impl LinkEvent {
    pub fn new(kind: EventKind, origin: Origin, payload: EventPayload) -> Self {
        Self {
            event_type: kind.as_str().to_string(),
            kind,
            origin,
            payload,
            timestamp: now_micros(),
        }
    }

    /// Cópia do evento com o prefixo do componente que o republica
    pub fn republish(&self, prefix: &str) -> Self {
        Self {
            event_type: format!("{prefix}{}", self.event_type),
            ..self.clone()
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == EventKind::ErrorOccurred
    }
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

/// Filtro de eventos para assinaturas por canal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    /// Todos os eventos
    All,
    /// Eventos de um tipo, com qualquer prefixo
    Kind(EventKind),
    /// Eventos cujo `event_type` começa com o prefixo
    Prefix(String),
    /// Eventos originados num componente
    Origin(Origin),
    /// Apenas `ERROR_OCCURRED`
    Errors,
}

impl EventFilter {
    pub fn matches(&self, event: &LinkEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Kind(kind) => event.kind == *kind,
            EventFilter::Prefix(prefix) => event.event_type.starts_with(prefix.as_str()),
            EventFilter::Origin(origin) => event.origin == *origin,
            EventFilter::Errors => event.is_error(),
        }
    }
}

/// Observador de eventos
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &LinkEvent);
}

impl<F> EventListener for F
where
    F: Fn(&LinkEvent) + Send + Sync,
{
    fn on_event(&self, event: &LinkEvent) {
        self(event)
    }
}

/// Identificador de inscrição, usado para cancelar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registered {
    id: ListenerId,
    listener: Arc<dyn EventListener>,
}

struct FilteredSender {
    id: u64,
    filter: EventFilter,
    sender: Sender<LinkEvent>,
}

struct BusShared {
    owner: Origin,
    listeners: ShardedLock<Arc<Vec<Registered>>>,
    channels: ShardedLock<Vec<FilteredSender>>,
    history: Mutex<VecDeque<LinkEvent>>,
    max_history: usize,
    next_id: AtomicU64,
    published: AtomicU64,
    dropped: AtomicU64,
}

/// Bus de eventos de um componente
#[derive(Clone)]
pub struct EventBus {
    shared: Arc<BusShared>,
}

impl EventBus {
    /// Cria novo bus de eventos
    pub fn new(owner: Origin) -> Self {
        Self::with_history(owner, DEFAULT_EVENT_HISTORY)
    }

    /// Cria com tamanho de histórico customizado (0 desativa)
    pub fn with_history(owner: Origin, max_history: usize) -> Self {
        Self {
            shared: Arc::new(BusShared {
                owner,
                listeners: ShardedLock::new(Arc::new(Vec::new())),
                channels: ShardedLock::new(Vec::new()),
                history: Mutex::new(VecDeque::with_capacity(max_history.min(1024))),
                max_history,
                next_id: AtomicU64::new(1),
                published: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    pub fn owner(&self) -> Origin {
        self.shared.owner
    }

    /// Registra um closure como listener
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&LinkEvent) + Send + Sync + 'static,
    {
        self.subscribe_arc(Arc::new(listener))
    }

    /// Registra um listener compartilhado
    ///
    /// Registrar o mesmo `Arc` duas vezes devolve a inscrição existente.
    pub fn subscribe_arc(&self, listener: Arc<dyn EventListener>) -> ListenerId {
        let mut slot = self
            .shared
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = slot.iter().find(|r| Arc::ptr_eq(&r.listener, &listener)) {
            return existing.id;
        }

        let id = ListenerId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let mut next: Vec<Registered> = slot
            .iter()
            .map(|r| Registered {
                id: r.id,
                listener: Arc::clone(&r.listener),
            })
            .collect();
        next.push(Registered { id, listener });
        *slot = Arc::new(next);
        id
    }

    /// Remove uma inscrição; retorna `false` se não existia
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut slot = self
            .shared
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if !slot.iter().any(|r| r.id == id) {
            return false;
        }

        let next: Vec<Registered> = slot
            .iter()
            .filter(|r| r.id != id)
            .map(|r| Registered {
                id: r.id,
                listener: Arc::clone(&r.listener),
            })
            .collect();
        *slot = Arc::new(next);
        true
    }

    /// Remove todos os listeners
    pub fn clear_listeners(&self) {
        let mut slot = self
            .shared
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::new(Vec::new());
    }

    /// Assinatura por canal (consumidor em outra thread)
    ///
    /// Fila limitada a [`DEFAULT_SUBSCRIPTION_CAPACITY`]; com a fila cheia os
    /// eventos novos são descartados.
    pub fn subscribe_channel(&self, filter: EventFilter) -> Subscription {
        self.subscribe_channel_with_capacity(filter, DEFAULT_SUBSCRIPTION_CAPACITY)
    }

    /// Assinatura por canal com capacidade própria (mínimo 1)
    pub fn subscribe_channel_with_capacity(&self, filter: EventFilter, capacity: usize) -> Subscription {
        let (sender, receiver) = bounded(capacity.max(1));
        self.shared
            .channels
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FilteredSender {
                id: self.shared.next_id.fetch_add(1, Ordering::Relaxed),
                filter: filter.clone(),
                sender,
            });
        Subscription { receiver, filter }
    }

    /// Publica um evento originado pelo dono do bus
    pub fn publish(&self, kind: EventKind, payload: EventPayload) {
        self.forward(LinkEvent::new(kind, self.shared.owner, payload));
    }

    /// Publica um evento já construído (republicação de filhos)
    pub fn forward(&self, event: LinkEvent) {
        self.shared.published.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(owner = %self.shared.owner, event = %event.event_type, "publish");

        if self.shared.max_history > 0 {
            let mut history = self
                .shared
                .history
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            history.push_back(event.clone());
            while history.len() > self.shared.max_history {
                history.pop_front();
            }
        }

        let snapshot = Arc::clone(
            &self
                .shared
                .listeners
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for registered in snapshot.iter() {
            let outcome = catch_unwind(AssertUnwindSafe(|| registered.listener.on_event(&event)));
            if let Err(panic) = outcome {
                tracing::warn!(
                    owner = %self.shared.owner,
                    event = %event.event_type,
                    reason = panic_reason(panic.as_ref()),
                    "event listener panicked"
                );
            }
        }

        self.dispatch_channels(&event);
    }

    fn dispatch_channels(&self, event: &LinkEvent) {
        let mut dead = Vec::new();
        {
            let channels = self
                .shared
                .channels
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for fs in channels.iter().filter(|fs| fs.filter.matches(event)) {
                match fs.sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        self.shared.dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::trace!(
                            owner = %self.shared.owner,
                            event = %event.event_type,
                            "subscription full, event dropped"
                        );
                    }
                    Err(TrySendError::Disconnected(_)) => dead.push(fs.id),
                }
            }
        }

        if !dead.is_empty() {
            self.shared
                .channels
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .retain(|fs| !dead.contains(&fs.id));
        }
    }

    /// Histórico dos últimos eventos publicados
    pub fn history(&self) -> Vec<LinkEvent> {
        self.shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Limpa histórico
    pub fn clear_history(&self) {
        self.shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Número de listeners registrados
    pub fn listener_count(&self) -> usize {
        self.shared
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Número de assinaturas por canal ativas
    pub fn channel_count(&self) -> usize {
        self.shared
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Total de eventos publicados desde a criação
    pub fn published_count(&self) -> u64 {
        self.shared.published.load(Ordering::Relaxed)
    }

    /// Eventos descartados por assinaturas com a fila cheia
    pub fn dropped_count(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }
}

fn panic_reason(panic: &(dyn std::any::Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("owner", &self.shared.owner)
            .field("listeners", &self.listener_count())
            .field("max_history", &self.shared.max_history)
            .finish()
    }
}

/// Assinatura por canal (receiver)
pub struct Subscription {
    receiver: Receiver<LinkEvent>,
    filter: EventFilter,
}

impl Subscription {
    /// Próximo evento sem bloquear
    pub fn try_recv(&self) -> Option<LinkEvent> {
        self.receiver.try_recv().ok()
    }

    /// Próximo evento, bloqueando
    pub fn recv(&self) -> Option<LinkEvent> {
        self.receiver.recv().ok()
    }

    /// Próximo evento com timeout
    pub fn recv_timeout(&self, timeout: Duration) -> Option<LinkEvent> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Eventos pendentes, sem bloquear
    pub fn try_iter(&self) -> impl Iterator<Item = LinkEvent> + '_ {
        self.receiver.try_iter()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn counter_listener(counter: &Arc<AtomicUsize>) -> impl Fn(&LinkEvent) + Send + Sync + 'static {
        let counter = Arc::clone(counter);
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_publish_reaches_listener() {
        let bus = EventBus::new(Origin::Encoder);
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe(counter_listener(&counter));

        bus.publish(EventKind::MessageEncoded, EventPayload::None);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(bus.published_count(), 1);
    }

    #[test]
    fn test_same_listener_registered_once() {
        let bus = EventBus::new(Origin::Encoder);
        let counter = Arc::new(AtomicUsize::new(0));
        let listener: Arc<dyn EventListener> = Arc::new(counter_listener(&counter));

        let a = bus.subscribe_arc(Arc::clone(&listener));
        let b = bus.subscribe_arc(Arc::clone(&listener));
        assert_eq!(a, b);
        assert_eq!(bus.listener_count(), 1);

        bus.publish(EventKind::ProcessingStarted, EventPayload::None);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new(Origin::Cipher);
        let id = bus.subscribe(|_| {});
        assert_eq!(bus.listener_count(), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_during_publish() {
        let bus = EventBus::new(Origin::Channel);
        let counter = Arc::new(AtomicUsize::new(0));
        let id_slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let inner_bus = bus.clone();
        let inner_slot = Arc::clone(&id_slot);
        let id = bus.subscribe(move |_| {
            if let Some(id) = *inner_slot.lock().unwrap() {
                inner_bus.unsubscribe(id);
            }
        });
        *id_slot.lock().unwrap() = Some(id);
        bus.subscribe(counter_listener(&counter));

        bus.publish(EventKind::TransmissionProgress, EventPayload::Progress(0.5));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let bus = EventBus::new(Origin::Decoder);
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe(|_| panic!("listener failure"));
        bus.subscribe(counter_listener(&counter));

        bus.publish(EventKind::MessageDecoded, EventPayload::None);
        bus.publish(EventKind::MessageDecoded, EventPayload::None);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_publish_and_subscribe() {
        let bus = EventBus::with_history(Origin::Sender, 0);
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe(counter_listener(&counter));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bus = bus.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        bus.publish(EventKind::ProcessingStarted, EventPayload::None);
                        let id = bus.subscribe(|_| {});
                        bus.unsubscribe(id);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(counter.load(Ordering::SeqCst), 400);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_history_limit() {
        let bus = EventBus::with_history(Origin::Receiver, 2);
        for _ in 0..5 {
            bus.publish(EventKind::MessageReceived, EventPayload::None);
        }
        assert_eq!(bus.history().len(), 2);
        bus.clear_history();
        assert!(bus.history().is_empty());
    }

    #[test]
    fn test_republish_prefix() {
        let event = LinkEvent::new(EventKind::MessageEncoded, Origin::Encoder, EventPayload::None);
        let up = event.republish("SENDER_").republish("ORCHESTRATOR_");
        assert_eq!(up.event_type, "ORCHESTRATOR_SENDER_MESSAGE_ENCODED");
        assert_eq!(up.kind, EventKind::MessageEncoded);
        assert_eq!(up.origin, Origin::Encoder);
    }

    #[test]
    fn test_channel_subscription_filters() {
        let bus = EventBus::new(Origin::Orchestrator);
        let errors = bus.subscribe_channel(EventFilter::Errors);
        let sender_events = bus.subscribe_channel(EventFilter::Prefix("SENDER_".into()));

        bus.publish(EventKind::SimulationStarted, EventPayload::None);
        bus.publish(EventKind::ErrorOccurred, EventPayload::Error("boom".into()));
        bus.forward(
            LinkEvent::new(EventKind::MessageEncoded, Origin::Encoder, EventPayload::None)
                .republish("SENDER_"),
        );

        let got: Vec<_> = errors.try_iter().collect();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].payload.error(), Some("boom"));
        assert_eq!(sender_events.len(), 1);
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let bus = EventBus::new(Origin::Orchestrator);
        let sub = bus.subscribe_channel(EventFilter::All);
        assert_eq!(bus.channel_count(), 1);
        drop(sub);
        bus.publish(EventKind::SimulationStopped, EventPayload::None);
        assert_eq!(bus.channel_count(), 0);
    }

    #[test]
    fn test_full_subscription_drops_newest() {
        let bus = EventBus::new(Origin::Orchestrator);
        let sub = bus.subscribe_channel_with_capacity(EventFilter::All, 2);
        for _ in 0..5 {
            bus.publish(EventKind::SimulationStep, EventPayload::None);
        }
        assert_eq!(sub.len(), 2);
        assert_eq!(bus.dropped_count(), 3);
        assert_eq!(bus.channel_count(), 1);

        sub.try_recv().unwrap();
        bus.publish(EventKind::SimulationStopped, EventPayload::None);
        let kinds: Vec<_> = sub.try_iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::SimulationStep, EventKind::SimulationStopped]);
    }
}
