//! # 🔐 telesim-codec — Codificação e Cifras
//!
//! Pares reversíveis do pipeline:
//!
//! | Emissor | Receptor | Campo lido → escrito |
//! |:--------|:---------|:---------------------|
//! | [`Encoder`] | [`Decoder`] | texto → `binary`/`encoded` → `decoded` |
//! | [`Cipher`] | [`Decipher`] | `encoded` → `encrypted` → `encoded` |
//!
//! Cada estágio expõe a transformação pura ([`encode`], [`decode`],
//! [`encrypt`], [`decrypt`]) e um componente com guarda de reentrada,
//! último erro e bus de eventos.
//!
//! ## Exemplo
//!
//! ```
//! use std::sync::Arc;
//! use telesim_codec::{Cipher, Encoder};
//! use telesim_core::prelude::*;
//!
//! let encoder = Encoder::new();
//! let cipher = Cipher::with_config(CipherConfig::new(CipherAlgorithm::Xor, "1010"));
//!
//! let msg = Arc::new(Message::new("HI"));
//! encoder.encode(&msg)?;
//! cipher.encrypt(&msg)?;
//! assert_eq!(msg.encrypted().as_deref(), Some("1110001011100011"));
//! # Ok::<(), LinkError>(())
//! ```

pub mod binary;
pub mod cipher;
pub mod decipher;
pub mod decoder;
pub mod encoder;

pub use binary::{binary_to_bytes, format_binary, is_binary_string, text_to_binary};
pub use cipher::{Cipher, decrypt, encrypt};
pub use decipher::Decipher;
pub use decoder::{Decoder, decode};
pub use encoder::{Encoder, encode};
