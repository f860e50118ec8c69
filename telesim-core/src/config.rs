//! Configuração da simulação (cifra, canal, identificadores)
//!
//! Valores numéricos fora de faixa são sempre ajustados, nunca rejeitados.
//!
//! ```toml
//! seed = 42
//!
//! [cipher]
//! algorithm = "XOR"
//! key = "1010"
//!
//! [channel]
//! profile = "NOISY"
//! error_probability = 0.02
//! bits_per_second = 1000000.0
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LinkError, LinkResult};
use crate::events::DEFAULT_EVENT_HISTORY;

/// Algoritmo de cifra
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CipherAlgorithm {
    #[default]
    None,
    /// Inverte todos os bits quando a chave é um inteiro ímpar
    CaesarBitFlip,
    /// XOR com a chave repetida
    Xor,
    /// Base64 sobre os bytes da cadeia binária
    Base64,
}

impl CipherAlgorithm {
    pub const ALL: [CipherAlgorithm; 4] = [
        CipherAlgorithm::None,
        CipherAlgorithm::CaesarBitFlip,
        CipherAlgorithm::Xor,
        CipherAlgorithm::Base64,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CipherAlgorithm::None => "NONE",
            CipherAlgorithm::CaesarBitFlip => "CAESAR",
            CipherAlgorithm::Xor => "XOR",
            CipherAlgorithm::Base64 => "BASE64",
        }
    }

    /// A saída continua no alfabeto `{0,1}`
    pub fn preserves_binary(&self) -> bool {
        !matches!(self, CipherAlgorithm::Base64)
    }
}

impl fmt::Display for CipherAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherAlgorithm {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(CipherAlgorithm::None),
            "CAESAR" | "CAESAR_BIT_FLIP" => Ok(CipherAlgorithm::CaesarBitFlip),
            "XOR" => Ok(CipherAlgorithm::Xor),
            "BASE64" => Ok(CipherAlgorithm::Base64),
            _ => Err(LinkError::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

impl TryFrom<String> for CipherAlgorithm {
    type Error = LinkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CipherAlgorithm> for String {
    fn from(value: CipherAlgorithm) -> Self {
        value.as_str().to_string()
    }
}

/// Algoritmo + chave, compartilhados por cifra e decifrador
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherConfig {
    pub algorithm: CipherAlgorithm,
    pub key: String,
}

impl CipherConfig {
    pub fn new(algorithm: CipherAlgorithm, key: impl Into<String>) -> Self {
        Self {
            algorithm,
            key: key.into(),
        }
    }

    /// Sem cifra
    pub fn none() -> Self {
        Self::default()
    }
}

/// Tipo de canal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChannelType {
    #[default]
    Ideal,
    Noisy,
    Intermittent,
    Lossy,
}

impl ChannelType {
    pub const ALL: [ChannelType; 4] = [
        ChannelType::Ideal,
        ChannelType::Noisy,
        ChannelType::Intermittent,
        ChannelType::Lossy,
    ];

    /// Probabilidade mínima de erro imposta pelo perfil
    pub fn probability_floor(&self) -> f64 {
        match self {
            ChannelType::Ideal => 0.0,
            ChannelType::Noisy => 0.01,
            ChannelType::Intermittent => 0.05,
            ChannelType::Lossy => 0.10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Ideal => "IDEAL",
            ChannelType::Noisy => "NOISY",
            ChannelType::Intermittent => "INTERMITTENT",
            ChannelType::Lossy => "LOSSY",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Taxa padrão do canal (bits/s)
pub const DEFAULT_BITS_PER_SECOND: f64 = 1000.0;

/// Parâmetros do canal como vieram da configuração (não validados)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelSettings {
    pub profile: ChannelType,
    pub error_probability: f64,
    pub bits_per_second: f64,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            profile: ChannelType::Ideal,
            error_probability: 0.0,
            bits_per_second: DEFAULT_BITS_PER_SECOND,
        }
    }
}

/// Perfil de canal validado
///
/// Invariantes: `error_probability` em [0, 1] e nunca abaixo do piso do
/// tipo (`Ideal` sempre 0); `bits_per_second >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelProfile {
    channel_type: ChannelType,
    error_probability: f64,
    bits_per_second: f64,
}

impl ChannelProfile {
    /// Ajusta os parâmetros às invariantes do perfil
    pub fn new(channel_type: ChannelType, error_probability: f64, bits_per_second: f64) -> Self {
        let requested = if error_probability.is_nan() {
            0.0
        } else {
            error_probability.clamp(0.0, 1.0)
        };
        let error_probability = match channel_type {
            ChannelType::Ideal => 0.0,
            other => requested.max(other.probability_floor()),
        };
        let bits_per_second = if bits_per_second.is_nan() {
            1.0
        } else {
            bits_per_second.max(1.0)
        };

        Self {
            channel_type,
            error_probability,
            bits_per_second,
        }
    }

    pub fn ideal() -> Self {
        Self::new(ChannelType::Ideal, 0.0, DEFAULT_BITS_PER_SECOND)
    }

    pub fn channel_type(&self) -> ChannelType {
        self.channel_type
    }

    pub fn error_probability(&self) -> f64 {
        self.error_probability
    }

    pub fn bits_per_second(&self) -> f64 {
        self.bits_per_second
    }

    /// Uma cópia com outra taxa
    pub fn with_bits_per_second(self, bits_per_second: f64) -> Self {
        Self::new(self.channel_type, self.error_probability, bits_per_second)
    }
}

impl Default for ChannelProfile {
    fn default() -> Self {
        Self::ideal()
    }
}

impl From<ChannelSettings> for ChannelProfile {
    fn from(s: ChannelSettings) -> Self {
        ChannelProfile::new(s.profile, s.error_probability, s.bits_per_second)
    }
}

impl From<ChannelProfile> for ChannelSettings {
    fn from(p: ChannelProfile) -> Self {
        Self {
            profile: p.channel_type,
            error_probability: p.error_probability,
            bits_per_second: p.bits_per_second,
        }
    }
}

/// Configuração completa da simulação
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Semente do gerador do canal (`None` = entropia do SO)
    pub seed: Option<u64>,
    pub sender_id: String,
    pub receiver_id: String,
    /// Eventos mantidos no histórico de cada bus
    pub event_history: usize,
    pub cipher: CipherConfig,
    pub channel: ChannelSettings,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            sender_id: "SENDER-001".to_string(),
            receiver_id: "RECEIVER-001".to_string(),
            event_history: DEFAULT_EVENT_HISTORY,
            cipher: CipherConfig::default(),
            channel: ChannelSettings::default(),
        }
    }
}

impl SimulationConfig {
    /// Lê de TOML
    pub fn from_toml_str(content: &str) -> LinkResult<Self> {
        toml::from_str(content)
            .map_err(|e| LinkError::Config(format!("failed to parse simulation config: {e}")))
    }

    /// Lê de arquivo TOML
    pub fn from_file(path: impl AsRef<Path>) -> LinkResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LinkError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Serializa para TOML
    pub fn to_toml_string(&self) -> LinkResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| LinkError::Config(format!("failed to serialize simulation config: {e}")))
    }

    /// Perfil de canal validado
    pub fn channel_profile(&self) -> ChannelProfile {
        self.channel.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("xor".parse::<CipherAlgorithm>().unwrap(), CipherAlgorithm::Xor);
        assert_eq!(
            "Caesar_Bit_Flip".parse::<CipherAlgorithm>().unwrap(),
            CipherAlgorithm::CaesarBitFlip
        );
        assert_eq!(
            "ROT13".parse::<CipherAlgorithm>(),
            Err(LinkError::UnsupportedAlgorithm("ROT13".into()))
        );
    }

    #[test]
    fn test_profile_floors() {
        assert_eq!(ChannelProfile::new(ChannelType::Ideal, 0.5, 100.0).error_probability(), 0.0);
        assert_eq!(ChannelProfile::new(ChannelType::Noisy, 0.0, 100.0).error_probability(), 0.01);
        assert_eq!(
            ChannelProfile::new(ChannelType::Intermittent, 0.0, 100.0).error_probability(),
            0.05
        );
        assert_eq!(ChannelProfile::new(ChannelType::Lossy, 0.0, 100.0).error_probability(), 0.10);
        // O piso nunca reduz um valor maior pedido
        assert_eq!(ChannelProfile::new(ChannelType::Noisy, 0.3, 100.0).error_probability(), 0.3);
    }

    #[test]
    fn test_profile_clamping() {
        let p = ChannelProfile::new(ChannelType::Lossy, 7.0, -3.0);
        assert_eq!(p.error_probability(), 1.0);
        assert_eq!(p.bits_per_second(), 1.0);

        let p = ChannelProfile::new(ChannelType::Noisy, f64::NAN, f64::NAN);
        assert_eq!(p.error_probability(), 0.01);
        assert_eq!(p.bits_per_second(), 1.0);
    }

    #[test]
    fn test_config_defaults() {
        let config = SimulationConfig::default();
        assert_eq!(config.cipher.algorithm, CipherAlgorithm::None);
        assert!(config.cipher.key.is_empty());
        assert_eq!(config.channel_profile(), ChannelProfile::ideal());
        assert_eq!(config.sender_id, "SENDER-001");
        assert_eq!(config.event_history, 256);
    }

    #[test]
    fn test_config_from_toml() {
        let config = SimulationConfig::from_toml_str(
            r#"
            seed = 7

            [cipher]
            algorithm = "xor"
            key = "1010"

            [channel]
            profile = "LOSSY"
            error_probability = 0.01
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(7));
        assert_eq!(config.cipher, CipherConfig::new(CipherAlgorithm::Xor, "1010"));
        let profile = config.channel_profile();
        assert_eq!(profile.channel_type(), ChannelType::Lossy);
        assert_eq!(profile.error_probability(), 0.10);
        assert_eq!(profile.bits_per_second(), DEFAULT_BITS_PER_SECOND);
    }

    #[test]
    fn test_config_rejects_unknown_algorithm() {
        let err = SimulationConfig::from_toml_str("[cipher]\nalgorithm = \"ENIGMA\"\n").unwrap_err();
        assert!(matches!(err, LinkError::Config(msg) if msg.contains("ENIGMA")));
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let mut config = SimulationConfig::default();
        config.cipher = CipherConfig::new(CipherAlgorithm::Base64, "");
        config.seed = Some(99);
        let text = config.to_toml_string().unwrap();
        assert_eq!(SimulationConfig::from_toml_str(&text).unwrap(), config);
    }
}
