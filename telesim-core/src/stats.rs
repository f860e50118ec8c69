//! Estado e estatísticas da simulação

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Estado global da simulação (pertence ao orquestrador)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationState {
    #[default]
    Idle,
    Configuring,
    Running,
    /// Modo passo a passo, aguardando `advance_step`
    Paused,
    Completed,
    Error,
}

impl SimulationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationState::Idle => "IDLE",
            SimulationState::Configuring => "CONFIGURING",
            SimulationState::Running => "RUNNING",
            SimulationState::Paused => "PAUSED",
            SimulationState::Completed => "COMPLETED",
            SimulationState::Error => "ERROR",
        }
    }
}

impl fmt::Display for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// BER em porcentagem; 0 quando nada foi transmitido
pub fn bit_error_rate(bit_errors: u64, bits_transmitted: u64) -> f64 {
    if bits_transmitted == 0 {
        0.0
    } else {
        bit_errors as f64 / bits_transmitted as f64 * 100.0
    }
}

/// Taxa de sucesso em porcentagem; 0 quando nada foi recebido
pub fn success_rate(received: u64, errored: u64) -> f64 {
    if received == 0 {
        0.0
    } else {
        received.saturating_sub(errored) as f64 / received as f64 * 100.0
    }
}

/// Fotografia das estatísticas, calculada sob demanda
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    pub messages_sent: u64,
    /// Mensagens entregues ao receptor, inclusive as que falharam depois na
    /// decifragem ou decodificação; as bem-sucedidas saem de `success_rate`
    pub messages_received: u64,
    pub bits_transmitted: u64,
    pub bit_errors: u64,
    /// Porcentagem
    pub ber: f64,
    /// Porcentagem
    pub success_rate: f64,
    pub elapsed: Duration,
    pub state: SimulationState,
}

impl fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats{{sent={}, received={}, bits={}, errors={}, BER={:.2}%, success={:.1}%, elapsed={}ms, state={}}}",
            self.messages_sent,
            self.messages_received,
            self.bits_transmitted,
            self.bit_errors,
            self.ber,
            self.success_rate,
            self.elapsed.as_millis(),
            self.state
        )
    }
}
