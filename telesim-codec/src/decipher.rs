//! Estágio de decifragem: `encrypted` → `encoded` (restaura a entrada da cifra)

use std::sync::{Arc, PoisonError, RwLock};

use telesim_core::prelude::*;

use crate::cipher::decrypt;

#[derive(Debug)]
pub struct Decipher {
    core: StageCore,
    config: RwLock<CipherConfig>,
}

impl Decipher {
    pub fn new() -> Self {
        Self::with_config(CipherConfig::default())
    }

    pub fn with_config(config: CipherConfig) -> Self {
        Self {
            core: StageCore::new("Decipher", Origin::Decipher),
            config: RwLock::new(config),
        }
    }

    pub fn configure(&self, config: CipherConfig) {
        tracing::debug!(algorithm = %config.algorithm, "decipher configured");
        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
    }

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

    /// Decifra o conteúdo recebido do canal
    pub fn decrypt(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.core.run(message, EventKind::MessageDecrypted, || {
            let encrypted = message
                .encrypted()
                .filter(|s| !s.is_empty())
                .ok_or(LinkError::EmptyContent {
                    field: "encrypted",
                    operation: "decrypt",
                })?;
            let restored = decrypt(&self.config(), &encrypted)?;
            message.advance_with(MessageState::Decrypted, |fields| {
                fields.encoded = Some(restored);
            })
        })
    }
}

impl Default for Decipher {
    fn default() -> Self {
        Self::new()
    }
}

impl Stage for Decipher {
    fn name(&self) -> &'static str {
        self.core.name()
    }

    fn process(&self, message: &Arc<Message>) -> LinkResult<()> {
        self.decrypt(message)
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
            "Decipher{{algorithm={}, key_len={}, processing={}}}",
            config.algorithm,
            config.key.chars().count(),
            self.is_processing()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn received(text: &str, encrypted: &str) -> Arc<Message> {
        let msg = Arc::new(Message::new(text));
        msg.advance_with(MessageState::Received, |f| {
            f.encrypted = Some(encrypted.into());
        })
        .unwrap();
        msg
    }

    #[test]
    fn test_restores_encoded_field() {
        let decipher = Decipher::with_config(CipherConfig::new(CipherAlgorithm::Xor, "1010"));
        let msg = received("HI", "1110001011100011");
        decipher.decrypt(&msg).unwrap();
        assert_eq!(msg.state(), MessageState::Decrypted);
        assert_eq!(msg.encoded().as_deref(), Some("0100100001001001"));
    }

    #[test]
    fn test_mismatched_key_is_silent() {
        // Chave errada não é erro aqui; o decodificador é quem detecta
        let decipher = Decipher::with_config(CipherConfig::new(CipherAlgorithm::Xor, "0000"));
        let msg = received("HI", "1110001011100011");
        decipher.decrypt(&msg).unwrap();
        assert_eq!(msg.encoded().as_deref(), Some("1110001011100011"));
    }

    #[test]
    fn test_corrupted_base64() {
        let decipher = Decipher::with_config(CipherConfig::new(CipherAlgorithm::Base64, ""));
        let msg = received("HI", "MDE*");
        let err = decipher.decrypt(&msg).unwrap_err();
        assert!(matches!(err, LinkError::MalformedContent(_)));
        assert!(msg.has_error());
        assert!(decipher.last_error().is_some());
    }

    #[test]
    fn test_empty_encrypted() {
        let decipher = Decipher::new();
        let msg = Arc::new(Message::new("HI"));
        assert_eq!(
            decipher.decrypt(&msg).unwrap_err().to_string(),
            "no encrypted content to decrypt"
        );
    }
}
