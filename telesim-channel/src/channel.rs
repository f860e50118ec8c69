//! Canal de comunicação com injeção de erros por bit
//!
//! ## Modelo
//!
//! Cada símbolo do conteúdo cifrado passa por um ensaio de Bernoulli
//! independente com a probabilidade do perfil (exceto `Ideal`, que nunca
//! altera). Símbolos `0`/`1` são invertidos; outros símbolos ASCII (texto
//! Base64) têm o bit menos significativo do código trocado.
//!
//! ## Pacing
//!
//! Abaixo de [`PACING_LIMIT_BPS`] o canal dorme `1/bps` segundos por bit,
//! para animação. Acima disso transmite sem espera.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread;
use std::time::Duration;

use rand::distributions::Bernoulli;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use telesim_core::prelude::*;
use telesim_core::stats::bit_error_rate;

/// Taxa a partir da qual não há espera entre bits
pub const PACING_LIMIT_BPS: f64 = 10_000.0;

/// Intervalo (em bits) dos eventos de progresso
pub const PROGRESS_INTERVAL: usize = 8;

/// Estatísticas do canal num instante
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelStats {
    pub profile: ChannelProfile,
    pub bits_transmitted: u64,
    pub bit_errors: u64,
    pub transmissions: u64,
    /// Porcentagem
    pub ber: f64,
}

/// Canal ruidoso
#[derive(Debug)]
pub struct Channel {
    core: StageCore,
    profile: RwLock<ChannelProfile>,
    rng: Mutex<StdRng>,
    bits_transmitted: AtomicU64,
    bit_errors: AtomicU64,
    transmissions: AtomicU64,
    forced: Mutex<BTreeSet<usize>>,
}

impl Channel {
    /// Canal ideal com gerador semeado pela entropia do SO
    pub fn new() -> Self {
        Self::build(ChannelProfile::ideal(), StdRng::from_entropy())
    }

    /// Canal com semente fixa (reprodutível)
    pub fn with_seed(profile: ChannelProfile, seed: u64) -> Self {
        Self::build(profile, StdRng::seed_from_u64(seed))
    }

    pub fn with_profile(profile: ChannelProfile) -> Self {
        Self::build(profile, StdRng::from_entropy())
    }

    fn build(profile: ChannelProfile, rng: StdRng) -> Self {
        Self {
            core: StageCore::new("Channel", Origin::Channel),
            profile: RwLock::new(profile),
            rng: Mutex::new(rng),
            bits_transmitted: AtomicU64::new(0),
            bit_errors: AtomicU64::new(0),
            transmissions: AtomicU64::new(0),
            forced: Mutex::new(BTreeSet::new()),
        }
    }

    /// Troca o perfil (já validado)
    pub fn configure(&self, profile: ChannelProfile) {
        tracing::debug!(
            channel_type = %profile.channel_type(),
            error_probability = profile.error_probability(),
            bits_per_second = profile.bits_per_second(),
            "channel configured"
        );
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = profile;
    }

    /// Configura a partir de valores brutos, ajustando-os ao perfil
    pub fn configure_with(&self, channel_type: ChannelType, error_probability: f64, bits_per_second: f64) {
        self.configure(ChannelProfile::new(channel_type, error_probability, bits_per_second));
    }

    pub fn profile(&self) -> ChannelProfile {
        *self.profile.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reinicia o gerador com uma semente
    pub fn reseed(&self, seed: u64) {
        *self.rng.lock().unwrap_or_else(PoisonError::into_inner) = StdRng::seed_from_u64(seed);
    }

    /// Força a inversão das posições dadas na próxima transmissão
    pub fn force_bit_errors(&self, positions: impl IntoIterator<Item = usize>) {
        self.forced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(positions);
    }

    /// Transmite sem possibilidade de cancelamento
    pub fn transmit(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.transmit_with_cancel(message, &CancelToken::new())
    }

    /// Transmite o conteúdo cifrado, símbolo a símbolo
    ///
    /// `encrypted` é sobrescrito com o conteúdo possivelmente corrompido e a
    /// mensagem termina em `Received`.
    pub fn transmit_with_cancel(&self, message: &Arc<Message>, cancel: &CancelToken) -> LinkResult<()> {
        self.core.run(message, EventKind::MessageTransmitted, || {
            let content = message
                .encrypted()
                .filter(|s| !s.is_empty())
                .ok_or(LinkError::EmptyContent {
                    field: "encrypted",
                    operation: "transmit",
                })?;
            message.advance(MessageState::Transmitting)?;

            let profile = self.profile();
            let noise = Bernoulli::new(profile.error_probability())
                .map_err(|e| LinkError::Config(format!("invalid error probability: {e}")))?;
            let noisy = profile.channel_type() != ChannelType::Ideal;
            let forced = std::mem::take(&mut *self.forced.lock()?);
            let delay = (profile.bits_per_second() < PACING_LIMIT_BPS)
                .then(|| Duration::from_secs_f64(1.0 / profile.bits_per_second()));

            let symbols: Vec<char> = content.chars().collect();
            let total = symbols.len();
            let mut received = String::with_capacity(content.len());
            // sorteio feito antes do laço; listeners de progresso podem voltar ao canal
            let mask: Vec<bool> = {
                let mut rng = self.rng.lock()?;
                (0..total).map(|_| noisy && rng.sample(noise)).collect()
            };

            for (i, &symbol) in symbols.iter().enumerate() {
                cancel.check()?;

                let flip = forced.contains(&i) || mask[i];
                let out = if flip { flip_symbol(symbol) } else { symbol };
                received.push(out);

                self.bits_transmitted.fetch_add(1, Ordering::Relaxed);
                if out != symbol {
                    self.bit_errors.fetch_add(1, Ordering::Relaxed);
                }

                if let Some(delay) = delay {
                    thread::sleep(delay);
                }

                if (i + 1) % PROGRESS_INTERVAL == 0 || i + 1 == total {
                    let fraction = (i + 1) as f64 / total as f64;
                    tracing::trace!(message = %message.id(), fraction, "transmission progress");
                    self.core
                        .events()
                        .publish(EventKind::TransmissionProgress, EventPayload::Progress(fraction));
                }
            }

            message.advance_with(MessageState::Received, |fields| {
                fields.encrypted = Some(received);
            })?;
            self.transmissions.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    }

    pub fn bits_transmitted(&self) -> u64 {
        self.bits_transmitted.load(Ordering::Relaxed)
    }

    pub fn bit_errors(&self) -> u64 {
        self.bit_errors.load(Ordering::Relaxed)
    }

    pub fn transmissions(&self) -> u64 {
        self.transmissions.load(Ordering::Relaxed)
    }

    /// BER em porcentagem; 0 antes da primeira transmissão
    pub fn ber(&self) -> f64 {
        bit_error_rate(self.bit_errors(), self.bits_transmitted())
    }

    pub fn statistics(&self) -> ChannelStats {
        let bits_transmitted = self.bits_transmitted();
        let bit_errors = self.bit_errors();
        ChannelStats {
            profile: self.profile(),
            bits_transmitted,
            bit_errors,
            transmissions: self.transmissions(),
            ber: bit_error_rate(bit_errors, bits_transmitted),
        }
    }

    /// Zera contadores (chamado apenas de fora)
    pub fn reset_statistics(&self) {
        self.bits_transmitted.store(0, Ordering::Relaxed);
        self.bit_errors.store(0, Ordering::Relaxed);
        self.transmissions.store(0, Ordering::Relaxed);
        self.forced.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

/// `0↔1`; outros ASCII trocam o bit menos significativo
fn flip_symbol(symbol: char) -> char {
    match symbol {
        '0' => '1',
        '1' => '0',
        c if c.is_ascii() => char::from(c as u8 ^ 1),
        c => c,
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Channel {
    fn name(&self) -> &'static str {
        self.core.name()
    }

    fn process(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.transmit(message)
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

    fn describe(&self) -> String {
        format!(
            "Channel{{type={}, BER={:.2}%, bits={}, errors={}}}",
            self.profile().channel_type(),
            self.ber(),
            self.bits_transmitted(),
            self.bit_errors()
        )
    }
}
