//! Textos de exibição para a camada de apresentação
//!
//! Mantidos fora dos enums para que a lógica de domínio não carregue texto.

use crate::config::{ChannelType, CipherAlgorithm};
use crate::message::MessageState;
use crate::stats::SimulationState;

/// Tabela (valor, descrição) dos estados de mensagem
pub const MESSAGE_STATE_LABELS: [(MessageState, &str); 9] = [
    (MessageState::Created, "Message created"),
    (MessageState::Encoded, "Message encoded to binary"),
    (MessageState::Encrypted, "Message encrypted"),
    (MessageState::Transmitting, "Message in transmission"),
    (MessageState::Received, "Message received"),
    (MessageState::Decrypted, "Message decrypted"),
    (MessageState::Decoded, "Message decoded"),
    (MessageState::Completed, "Process completed"),
    (MessageState::Error, "Processing error"),
];

pub const CHANNEL_TYPE_LABELS: [(ChannelType, &str); 4] = [
    (ChannelType::Ideal, "Ideal channel - no noise"),
    (ChannelType::Noisy, "Noisy channel"),
    (ChannelType::Intermittent, "Intermittent channel"),
    (ChannelType::Lossy, "Lossy channel"),
];

pub const CIPHER_ALGORITHM_LABELS: [(CipherAlgorithm, &str); 4] = [
    (CipherAlgorithm::None, "No encryption"),
    (CipherAlgorithm::CaesarBitFlip, "Caesar cipher (bit flip)"),
    (CipherAlgorithm::Xor, "XOR cipher"),
    (CipherAlgorithm::Base64, "Base64 encoding"),
];

pub const SIMULATION_STATE_LABELS: [(SimulationState, &str); 6] = [
    (SimulationState::Idle, "Simulation stopped"),
    (SimulationState::Configuring, "Configuring parameters"),
    (SimulationState::Running, "Simulation running"),
    (SimulationState::Paused, "Simulation paused"),
    (SimulationState::Completed, "Simulation completed"),
    (SimulationState::Error, "Simulation error"),
];

fn lookup<K: PartialEq>(table: &[(K, &'static str)], key: &K) -> &'static str {
    table
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, label)| *label)
        .unwrap_or("")
}

pub fn message_state_label(state: MessageState) -> &'static str {
    lookup(&MESSAGE_STATE_LABELS, &state)
}

pub fn channel_type_label(channel_type: ChannelType) -> &'static str {
    lookup(&CHANNEL_TYPE_LABELS, &channel_type)
}

pub fn cipher_algorithm_label(algorithm: CipherAlgorithm) -> &'static str {
    lookup(&CIPHER_ALGORITHM_LABELS, &algorithm)
}

pub fn simulation_state_label(state: SimulationState) -> &'static str {
    lookup(&SIMULATION_STATE_LABELS, &state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_label() {
        assert!(ChannelType::ALL.iter().all(|t| !channel_type_label(*t).is_empty()));
        assert!(CipherAlgorithm::ALL.iter().all(|a| !cipher_algorithm_label(*a).is_empty()));
        assert!(MESSAGE_STATE_LABELS.iter().all(|(_, l)| !l.is_empty()));
    }

    #[test]
    fn test_lookup() {
        assert_eq!(channel_type_label(ChannelType::Ideal), "Ideal channel - no noise");
        assert_eq!(simulation_state_label(SimulationState::Paused), "Simulation paused");
        assert_eq!(message_state_label(MessageState::Completed), "Process completed");
    }
}
