//! Orquestrador da simulação

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use telesim_channel::Channel;
use telesim_core::prelude::*;
use telesim_core::stats;

use crate::handle::{RunHandle, RunResult};
use crate::receiver::Receiver;
use crate::relay::relay;
use crate::sender::Sender;

const STOPPED: &str = "simulation stopped";

/// Execução em andamento
#[derive(Debug, Clone)]
struct ActiveRun {
    epoch: u64,
    cancel: CancelToken,
    step_mode: bool,
}

/// Estado de controle, sempre alterado sob um único lock
#[derive(Debug, Default)]
struct Control {
    state: SimulationState,
    active: Option<ActiveRun>,
    /// Mensagem aguardando `advance_step`
    pending: Option<Arc<Message>>,
    last_message: Option<Arc<Message>>,
    last_error: Option<String>,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    next_epoch: u64,
}

impl Control {
    fn is_current(&self, epoch: u64) -> bool {
        self.active.as_ref().is_some_and(|a| a.epoch == epoch)
    }

    fn finish(&mut self, state: SimulationState) {
        self.state = state;
        self.active = None;
        self.pending = None;
        self.finished_at = Some(Instant::now());
    }
}

struct Shared {
    sender: Arc<Sender>,
    receiver: Arc<Receiver>,
    channel: Arc<Channel>,
    bus: EventBus,
    control: Mutex<Control>,
}

/// Libera a execução mesmo que a thread de trabalho entre em pânico
struct RunGuard {
    shared: Arc<Shared>,
    epoch: u64,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut control = self.shared.lock();
        if control.is_current(self.epoch) {
            control.finish(SimulationState::Error);
            control.last_error = Some(LinkError::WorkerLost.to_string());
        }
    }
}

/// Orquestrador: dono do emissor, do receptor e do canal
///
/// Máquina de estados `Idle → Configuring → Running ⇄ Paused → Completed |
/// Error`; `stop()` volta a `Idle` de qualquer estado. Os eventos de emissor e
/// receptor são republicados com o prefixo `ORCHESTRATOR_`.
///
/// Nenhum evento é publicado com o lock de controle tomado.
#[derive(Clone)]
pub struct Orchestrator {
    shared: Arc<Shared>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    pub fn with_config(config: SimulationConfig) -> Self {
        let profile = config.channel_profile();
        let channel = Arc::new(match config.seed {
            Some(seed) => Channel::with_seed(profile, seed),
            None => Channel::with_profile(profile),
        });
        let sender = Arc::new(Sender::with_history(config.sender_id.clone(), config.event_history));
        let receiver = Arc::new(Receiver::with_history(
            config.receiver_id.clone(),
            config.event_history,
        ));
        sender.set_channel(Arc::clone(&channel));
        sender.configure_cipher(config.cipher.clone());
        receiver.configure_decipher(config.cipher.clone());

        let bus = EventBus::with_history(Origin::Orchestrator, config.event_history);
        relay(sender.events(), &bus);
        relay(receiver.events(), &bus);

        tracing::debug!(
            sender = %config.sender_id,
            receiver = %config.receiver_id,
            algorithm = %config.cipher.algorithm,
            channel_type = %profile.channel_type(),
            "orchestrator created"
        );

        Self {
            shared: Arc::new(Shared {
                sender,
                receiver,
                channel,
                bus,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.shared.bus
    }

    pub fn sender(&self) -> &Arc<Sender> {
        &self.shared.sender
    }

    pub fn receiver(&self) -> &Arc<Receiver> {
        &self.shared.receiver
    }

    pub fn channel(&self) -> &Arc<Channel> {
        &self.shared.channel
    }

    // ═══════════════════════════════════════════════════════════════
    // Configuração
    // ═══════════════════════════════════════════════════════════════

    /// Mesma cifra nos dois lados do enlace
    pub fn configure_cipher(&self, config: CipherConfig) {
        let algorithm = config.algorithm;
        self.shared.sender.configure_cipher(config.clone());
        self.shared.receiver.configure_decipher(config);
        self.mark_configuring();
        tracing::info!(%algorithm, "encryption configured");
        self.shared.bus.publish(
            EventKind::EncryptionConfigured,
            EventPayload::Text(algorithm.as_str().to_string()),
        );
    }

    /// Configura pelo nome do algoritmo; nome desconhecido é rejeitado
    pub fn configure_cipher_named(&self, algorithm: &str, key: impl Into<String>) -> LinkResult<()> {
        match algorithm.parse::<CipherAlgorithm>() {
            Ok(algorithm) => {
                self.configure_cipher(CipherConfig::new(algorithm, key));
                Ok(())
            }
            Err(err) => {
                self.record_error(&err);
                Err(err)
            }
        }
    }

    pub fn configure_channel(&self, profile: ChannelProfile) {
        self.shared.channel.configure(profile);
        self.mark_configuring();
        tracing::info!(
            channel_type = %profile.channel_type(),
            error_probability = profile.error_probability(),
            "channel configured"
        );
        self.shared.bus.publish(
            EventKind::ChannelConfigured,
            EventPayload::Text(profile.channel_type().as_str().to_string()),
        );
    }

    /// Aplica cifra, canal e semente de uma configuração
    pub fn apply_config(&self, config: &SimulationConfig) {
        if let Some(seed) = config.seed {
            self.shared.channel.reseed(seed);
        }
        self.configure_cipher(config.cipher.clone());
        self.configure_channel(config.channel_profile());
    }

    fn mark_configuring(&self) {
        let mut control = self.shared.lock();
        if control.active.is_none() {
            control.state = SimulationState::Configuring;
        }
    }

    // ═══════════════════════════════════════════════════════════════
    // Execução
    // ═══════════════════════════════════════════════════════════════

    /// Executa emissor e receptor em sequência numa thread de trabalho
    ///
    /// Rejeita com `AlreadyInProgress` antes de criar a thread.
    pub fn run_complete(&self, text: impl Into<String>) -> LinkResult<RunHandle> {
        let text = text.into();
        let run = self.begin(false)?;
        self.shared.bus.publish(
            EventKind::SimulationStarted,
            EventPayload::Text(text.clone()),
        );

        let shared = Arc::clone(&self.shared);
        let epoch = run.epoch;
        let spawned = RunHandle::spawn("telesim-simulation", move || {
            let _guard = RunGuard {
                shared: Arc::clone(&shared),
                epoch,
            };
            let result = shared
                .sender
                .send_blocking(&text, &run.cancel)
                .and_then(|message| shared.receiver.receive_blocking(&message, &run.cancel));
            shared.finish_run(epoch, &result);
            result
        });
        self.rollback_on_spawn_error(epoch, spawned)
    }

    /// Modo passo a passo
    ///
    /// Cada passo do emissor publica `SIMULATION_STEP` e chama `on_step`. Ao
    /// fim do lado emissor a simulação fica em `Paused`, publica
    /// `SENDER_COMPLETED` e chama `on_sender_complete`; o lado receptor só
    /// roda com [`advance_step`](Self::advance_step).
    pub fn run_stepwise<S, C>(
        &self,
        text: impl Into<String>,
        mut on_step: S,
        on_sender_complete: C,
    ) -> LinkResult<()>
    where
        S: FnMut(StepInfo) + Send + 'static,
        C: FnOnce(RunResult) + Send + 'static,
    {
        let text = text.into();
        let run = self.begin(true)?;
        self.shared.bus.publish(
            EventKind::SimulationStepModeStarted,
            EventPayload::Text(text.clone()),
        );

        let bus = self.shared.bus.clone();
        let shared = Arc::clone(&self.shared);
        let epoch = run.epoch;
        let started = self.shared.sender.send_stepwise(
            text,
            run.cancel,
            move |info: StepInfo| {
                bus.publish(EventKind::SimulationStep, EventPayload::Step(info.clone()));
                on_step(info);
            },
            move |result: RunResult| {
                shared.sender_phase_done(epoch, &result);
                on_sender_complete(result);
            },
        );
        if let Err(err) = started {
            self.shared.abort_run(epoch, &err);
            return Err(err);
        }
        Ok(())
    }

    /// Roda o lado receptor de uma simulação passo a passo pausada
    ///
    /// Só aceita a própria mensagem pendente; qualquer outra falha com
    /// `NotInStepMode` e a pausa continua.
    pub fn advance_step(&self, message: &Arc<Message>) -> LinkResult<RunHandle> {
        let run = {
            let mut control = self.shared.lock();
            let active = control.active.clone();
            let is_pending = control
                .pending
                .as_ref()
                .is_some_and(|pending| pending.id() == message.id());
            match active {
                Some(run) if run.step_mode && control.state == SimulationState::Paused && is_pending => {
                    control.pending = None;
                    control.state = SimulationState::Running;
                    run
                }
                _ => {
                    drop(control);
                    let err = LinkError::NotInStepMode;
                    self.record_error(&err);
                    return Err(err);
                }
            }
        };
        tracing::debug!(message = %message.id(), "advancing to receiver side");

        let (completer, handle) = RunHandle::pair();
        let bus = self.shared.bus.clone();
        let shared = Arc::clone(&self.shared);
        let epoch = run.epoch;
        let started = self.shared.receiver.receive_stepwise(
            Arc::clone(message),
            run.cancel,
            move |info: StepInfo| {
                bus.publish(EventKind::SimulationStep, EventPayload::Step(info));
            },
            move |result: RunResult| {
                shared.finish_run(epoch, &result);
                completer.complete(result);
            },
        );
        if let Err(err) = started {
            message.fail(err.to_string());
            self.shared.abort_run(epoch, &err);
            return Err(err);
        }
        Ok(handle)
    }

    /// Interrompe qualquer execução e volta a `Idle`
    ///
    /// A mensagem em voo termina em `Error`; resultados que cheguem depois
    /// não alteram o estado.
    pub fn stop(&self) {
        let (active, pending) = {
            let mut control = self.shared.lock();
            let active = control.active.take();
            let pending = control.pending.take();
            if active.is_some() {
                control.finished_at = Some(Instant::now());
            }
            control.state = SimulationState::Idle;
            (active, pending)
        };

        if let Some(run) = &active {
            run.cancel.cancel();
        }
        self.shared.sender.abort_current(STOPPED);
        self.shared.receiver.abort_current(STOPPED);
        if let Some(message) = pending {
            message.fail(STOPPED);
        }

        tracing::info!(was_running = active.is_some(), "simulation stopped");
        self.shared
            .bus
            .publish(EventKind::SimulationStopped, EventPayload::None);
    }

    /// Zera contadores do canal, do emissor e do receptor
    pub fn reset_statistics(&self) {
        self.shared.channel.reset_statistics();
        self.shared.sender.reset_statistics();
        self.shared.receiver.reset_statistics();
        self.shared.receiver.clear_history();
        {
            let mut control = self.shared.lock();
            if control.active.is_none() {
                control.started_at = None;
                control.finished_at = None;
            }
        }
        self.shared
            .bus
            .publish(EventKind::StatisticsReset, EventPayload::None);
    }

    fn begin(&self, step_mode: bool) -> LinkResult<ActiveRun> {
        let run = {
            let mut control = self.shared.lock();
            if control.active.is_some() {
                None
            } else {
                control.next_epoch += 1;
                let run = ActiveRun {
                    epoch: control.next_epoch,
                    cancel: CancelToken::new(),
                    step_mode,
                };
                control.active = Some(run.clone());
                control.pending = None;
                control.state = SimulationState::Running;
                control.started_at = Some(Instant::now());
                control.finished_at = None;
                control.last_error = None;
                Some(run)
            }
        };

        match run {
            Some(run) => {
                tracing::info!(epoch = run.epoch, step_mode, "simulation started");
                Ok(run)
            }
            None => {
                let err = LinkError::AlreadyInProgress;
                self.record_error(&err);
                Err(err)
            }
        }
    }

    fn rollback_on_spawn_error(&self, epoch: u64, spawned: LinkResult<RunHandle>) -> LinkResult<RunHandle> {
        if let Err(err) = &spawned {
            self.shared.abort_run(epoch, err);
        }
        spawned
    }

    /// Registra o erro sem mudar o estado
    fn record_error(&self, err: &LinkError) {
        let text = err.to_string();
        self.shared.lock().last_error = Some(text.clone());
        tracing::warn!(error = %text, "simulation request rejected");
        self.shared
            .bus
            .publish(EventKind::ErrorOccurred, EventPayload::Error(text));
    }

    // ═══════════════════════════════════════════════════════════════
    // Estado
    // ═══════════════════════════════════════════════════════════════

    pub fn state(&self) -> SimulationState {
        self.shared.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().active.is_some()
    }

    pub fn is_step_mode(&self) -> bool {
        self.shared
            .lock()
            .active
            .as_ref()
            .is_some_and(|a| a.step_mode)
    }

    /// Mensagem aguardando o lado receptor
    pub fn pending_message(&self) -> Option<Arc<Message>> {
        self.shared.lock().pending.clone()
    }

    /// Última mensagem concluída ou com falha
    pub fn last_message(&self) -> Option<Arc<Message>> {
        self.shared.lock().last_message.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.lock().last_error.clone()
    }

    /// Limpa o erro do orquestrador, do emissor e do receptor
    pub fn clear_error(&self) {
        self.shared.lock().last_error = None;
        self.shared.sender.clear_error();
        self.shared.receiver.clear_error();
    }

    /// Estatísticas calculadas sob demanda
    pub fn statistics(&self) -> SimulationStats {
        self.shared.statistics()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn statistics(&self) -> SimulationStats {
        let (state, elapsed) = {
            let control = self.lock();
            let elapsed = match control.started_at {
                Some(start) => control
                    .finished_at
                    .unwrap_or_else(Instant::now)
                    .saturating_duration_since(start),
                None => Duration::ZERO,
            };
            (control.state, elapsed)
        };
        let channel = self.channel.statistics();
        SimulationStats {
            messages_sent: self.sender.sent_count(),
            messages_received: self.receiver.received_count(),
            bits_transmitted: channel.bits_transmitted,
            bit_errors: channel.bit_errors,
            ber: stats::bit_error_rate(channel.bit_errors, channel.bits_transmitted),
            success_rate: self.receiver.success_rate(),
            elapsed,
            state,
        }
    }

    /// Fim da execução; ignorado se a execução já não é a atual
    fn finish_run(&self, epoch: u64, result: &RunResult) {
        if let Err(PipelineFailure {
            message: Some(message),
            error,
        }) = result
        {
            message.fail(error.to_string());
        }

        let outcome = {
            let mut control = self.lock();
            if !control.is_current(epoch) {
                None
            } else {
                match result {
                    Ok(message) => {
                        control.last_message = Some(Arc::clone(message));
                        control.finish(SimulationState::Completed);
                        Some(Ok(()))
                    }
                    Err(failure) => {
                        let text = failure.error.to_string();
                        control.last_message = failure.message.clone();
                        control.last_error = Some(text.clone());
                        control.finish(SimulationState::Error);
                        Some(Err(text))
                    }
                }
            }
        };

        match outcome {
            Some(Ok(())) => {
                let stats = self.statistics();
                tracing::info!(%stats, "simulation completed");
                self.bus
                    .publish(EventKind::SimulationCompleted, EventPayload::Stats(stats));
            }
            Some(Err(text)) => {
                tracing::warn!(error = %text, "simulation failed");
                self.bus
                    .publish(EventKind::ErrorOccurred, EventPayload::Error(text));
            }
            None => tracing::debug!(epoch, "stale run result ignored"),
        }
    }

    /// Fim do lado emissor no modo passo a passo
    fn sender_phase_done(&self, epoch: u64, result: &RunResult) {
        let message = {
            let mut control = self.lock();
            if !control.is_current(epoch) {
                drop(control);
                if let Ok(message) = result {
                    message.fail(STOPPED);
                }
                tracing::debug!(epoch, "stale sender result ignored");
                return;
            }
            match result {
                Ok(message) => {
                    control.state = SimulationState::Paused;
                    control.pending = Some(Arc::clone(message));
                    control.last_message = Some(Arc::clone(message));
                    Arc::clone(message)
                }
                Err(_) => {
                    drop(control);
                    self.finish_run(epoch, result);
                    return;
                }
            }
        };

        tracing::debug!(message = %message.id(), "sender side completed, paused");
        self.bus
            .publish(EventKind::SenderCompleted, EventPayload::Message(message));
    }

    /// Falha ao iniciar a thread de trabalho
    fn abort_run(&self, epoch: u64, err: &LinkError) {
        let text = err.to_string();
        let aborted = {
            let mut control = self.lock();
            let current = control.is_current(epoch);
            if current {
                control.last_error = Some(text.clone());
                control.finish(SimulationState::Error);
            }
            current
        };
        if aborted {
            tracing::warn!(error = %text, "simulation could not start");
            self.bus
                .publish(EventKind::ErrorOccurred, EventPayload::Error(text));
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state())
            .field("running", &self.is_running())
            .field("step_mode", &self.is_step_mode())
            .finish_non_exhaustive()
    }
}
