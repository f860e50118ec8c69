//! Cifras pedagógicas (não seguras) e o estágio de cifragem
//!
//! | Algoritmo | Cifra | Decifra |
//! |:----------|:------|:--------|
//! | `None` | identidade | identidade |
//! | `CaesarBitFlip` | inverte bits se a chave for inteiro ímpar | idem |
//! | `Xor` | XOR com a chave repetida | idem |
//! | `Base64` | Base64 dos bytes da cadeia | decodifica Base64 |
//!
//! `Base64` troca o alfabeto `{0,1}` por texto Base64: cifra e decifrador
//! precisam usar o mesmo algoritmo.

use std::sync::{Arc, PoisonError, RwLock};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use telesim_core::prelude::*;

/// Cifra o conteúdo segundo a configuração
pub fn encrypt(config: &CipherConfig, input: &str) -> LinkResult<String> {
    match config.algorithm {
        CipherAlgorithm::None => Ok(input.to_string()),
        CipherAlgorithm::CaesarBitFlip => Ok(caesar_bit_flip(input, &config.key)),
        CipherAlgorithm::Xor => Ok(xor_with_key(input, &config.key)),
        CipherAlgorithm::Base64 => Ok(STANDARD.encode(input.as_bytes())),
    }
}

/// Inverso exato de [`encrypt`] sob a mesma configuração
pub fn decrypt(config: &CipherConfig, input: &str) -> LinkResult<String> {
    match config.algorithm {
        CipherAlgorithm::None => Ok(input.to_string()),
        CipherAlgorithm::CaesarBitFlip => Ok(caesar_bit_flip(input, &config.key)),
        CipherAlgorithm::Xor => Ok(xor_with_key(input, &config.key)),
        CipherAlgorithm::Base64 => {
            let bytes = STANDARD
                .decode(input.as_bytes())
                .map_err(|e| LinkError::MalformedContent(format!("invalid base64: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|e| LinkError::MalformedContent(format!("base64 payload is not UTF-8: {e}")))
        }
    }
}

/// Chave ímpar inverte `0↔1`; chave par, vazia ou não numérica é identidade
fn caesar_bit_flip(input: &str, key: &str) -> String {
    let odd = key.trim().parse::<i64>().is_ok_and(|k| k % 2 != 0);
    if !odd {
        return input.to_string();
    }
    input.chars().map(flip_binary_char).collect()
}

fn flip_binary_char(c: char) -> char {
    match c {
        '0' => '1',
        '1' => '0',
        other => other,
    }
}

/// Bit da chave = bit menos significativo do code point do caractere
fn xor_with_key(input: &str, key: &str) -> String {
    let key_bits: Vec<u32> = key.chars().map(|c| c as u32 & 1).collect();
    if key_bits.is_empty() {
        return input.to_string();
    }

    input
        .chars()
        .zip(key_bits.iter().cycle())
        .map(|(c, &k)| match c {
            '0' | '1' => {
                let bit = c as u32 & 1;
                if bit == k { '0' } else { '1' }
            }
            other => other,
        })
        .collect()
}

/// Estágio de cifragem: `encoded` → `encrypted`
#[derive(Debug)]
pub struct Cipher {
    core: StageCore,
    config: RwLock<CipherConfig>,
}

impl Cipher {
    pub fn new() -> Self {
        Self::with_config(CipherConfig::default())
    }

    pub fn with_config(config: CipherConfig) -> Self {
        Self {
            core: StageCore::new("Cipher", Origin::Cipher),
            config: RwLock::new(config),
        }
    }

    /// Troca algoritmo e chave
    pub fn configure(&self, config: CipherConfig) {
        tracing::debug!(algorithm = %config.algorithm, "cipher configured");
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

    /// Configura a partir do nome do algoritmo (`"XOR"`, `"base64"`, ...)
    pub fn configure_named(&self, algorithm: &str, key: impl Into<String>) -> LinkResult<()> {
        let algorithm = algorithm.parse::<CipherAlgorithm>().inspect_err(|e| self.core.report(e))?;
        self.configure(CipherConfig::new(algorithm, key));
        Ok(())
    }

    pub fn config(&self) -> CipherConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cifra a mensagem
    pub fn encrypt(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.core.run(message, EventKind::MessageEncrypted, || {
            let encoded = message
                .encoded()
                .filter(|s| !s.is_empty())
                .ok_or(LinkError::EmptyContent {
                    field: "encoded",
                    operation: "encrypt",
                })?;
            let encrypted = encrypt(&self.config(), &encoded)?;
            message.advance_with(MessageState::Encrypted, |fields| {
                fields.encrypted = Some(encrypted);
            })
        })
    }
}

impl Default for Cipher {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Cipher {
    fn name(&self) -> &'static str {
        self.core.name()
    }

    fn process(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.encrypt(message)
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
        let config = self.config();
        format!(
            "Cipher{{algorithm={}, key_len={}, processing={}}}",
            config.algorithm,
            config.key.chars().count(),
            self.is_processing()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HI: &str = "0100100001001001";

    fn cfg(algorithm: CipherAlgorithm, key: &str) -> CipherConfig {
        CipherConfig::new(algorithm, key)
    }

    #[test]
    fn test_xor_concrete() {
        let out = encrypt(&cfg(CipherAlgorithm::Xor, "1010"), HI).unwrap();
        assert_eq!(out, "1110001011100011");
        assert_eq!(decrypt(&cfg(CipherAlgorithm::Xor, "1010"), &out).unwrap(), HI);
    }

    #[test]
    fn test_xor_empty_key_is_identity() {
        assert_eq!(encrypt(&cfg(CipherAlgorithm::Xor, ""), HI).unwrap(), HI);
    }

    #[test]
    fn test_xor_any_key_is_involution() {
        let config = cfg(CipherAlgorithm::Xor, "s3cr3t-ключ");
        let out = encrypt(&config, HI).unwrap();
        assert_eq!(decrypt(&config, &out).unwrap(), HI);
    }

    #[test]
    fn test_caesar_parity() {
        assert_eq!(
            encrypt(&cfg(CipherAlgorithm::CaesarBitFlip, "3"), HI).unwrap(),
            "1011011110110110"
        );
        assert_eq!(encrypt(&cfg(CipherAlgorithm::CaesarBitFlip, "-1"), "01").unwrap(), "10");
        assert_eq!(encrypt(&cfg(CipherAlgorithm::CaesarBitFlip, "4"), HI).unwrap(), HI);
        assert_eq!(encrypt(&cfg(CipherAlgorithm::CaesarBitFlip, ""), HI).unwrap(), HI);
        assert_eq!(encrypt(&cfg(CipherAlgorithm::CaesarBitFlip, "abc"), HI).unwrap(), HI);
    }

    #[test]
    fn test_base64_roundtrip() {
        let config = cfg(CipherAlgorithm::Base64, "");
        let out = encrypt(&config, "01").unwrap();
        assert_eq!(out, "MDE=");
        assert_eq!(decrypt(&config, &out).unwrap(), "01");
    }

    #[test]
    fn test_base64_malformed() {
        let err = decrypt(&cfg(CipherAlgorithm::Base64, ""), "not base64!").unwrap_err();
        assert!(matches!(err, LinkError::MalformedContent(_)));
    }

    #[test]
    fn test_stage_encrypts_encoded_field() {
        let cipher = Cipher::with_config(cfg(CipherAlgorithm::Xor, "1010"));
        let msg = Arc::new(Message::new("HI"));
        msg.advance_with(MessageState::Encoded, |f| f.encoded = Some(HI.into()))
            .unwrap();

        cipher.encrypt(&msg).unwrap();
        assert_eq!(msg.state(), MessageState::Encrypted);
        assert_eq!(msg.encrypted().as_deref(), Some("1110001011100011"));
        assert_eq!(msg.encoded().as_deref(), Some(HI));
    }

    #[test]
    fn test_stage_empty_content() {
        let cipher = Cipher::new();
        let msg = Arc::new(Message::new("HI"));
        assert_eq!(
            cipher.encrypt(&msg).unwrap_err().to_string(),
            "no encoded content to encrypt"
        );
        assert!(msg.has_error());
    }

    #[test]
    fn test_configure_named_unknown() {
        let cipher = Cipher::new();
        let err = cipher.configure_named("VIGENERE", "k").unwrap_err();
        assert_eq!(err, LinkError::UnsupportedAlgorithm("VIGENERE".into()));
        assert!(cipher.last_error().is_some());
        assert_eq!(cipher.config().algorithm, CipherAlgorithm::None);

        cipher.configure_named("caesar", "1").unwrap();
        assert_eq!(cipher.config(), cfg(CipherAlgorithm::CaesarBitFlip, "1"));
    }
}
