//! Utilitários de cadeias binárias (`'0'`/`'1'`, MSB primeiro)

use telesim_core::{LinkError, LinkResult};

/// Bits por byte na representação textual
pub const BITS_PER_BYTE: usize = 8;

/// Texto → cadeia binária, 8 caracteres por byte UTF-8
pub fn text_to_binary(text: &str) -> String {
    bytes_to_binary(text.as_bytes())
}

/// Bytes → cadeia binária
pub fn bytes_to_binary(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * BITS_PER_BYTE);
    for byte in bytes {
        for shift in (0..BITS_PER_BYTE).rev() {
            out.push(if (byte >> shift) & 1 == 1 { '1' } else { '0' });
        }
    }
    out
}

/// Cadeia binária → bytes
///
/// Falha com `MalformedBinary` se o tamanho não for múltiplo de 8 ou se
/// houver caractere fora de `{0,1}`.
pub fn binary_to_bytes(binary: &str) -> LinkResult<Vec<u8>> {
    if binary.len() % BITS_PER_BYTE != 0 {
        return Err(LinkError::MalformedBinary(format!(
            "length {} is not a multiple of {BITS_PER_BYTE}",
            binary.len()
        )));
    }
    if let Some((pos, c)) = binary.char_indices().find(|(_, c)| *c != '0' && *c != '1') {
        return Err(LinkError::MalformedBinary(format!(
            "unexpected character {c:?} at position {pos}"
        )));
    }

    Ok(binary
        .as_bytes()
        .chunks(BITS_PER_BYTE)
        .map(|chunk| chunk.iter().fold(0u8, |acc, bit| (acc << 1) | (bit - b'0')))
        .collect())
}

/// Apenas `'0'` e `'1'` (vazio conta como binário)
pub fn is_binary_string(s: &str) -> bool {
    s.bytes().all(|b| b == b'0' || b == b'1')
}

/// Espaço a cada 8 bits, para exibição
pub fn format_binary(binary: &str) -> String {
    let mut out = String::with_capacity(binary.len() + binary.len() / BITS_PER_BYTE);
    for (i, c) in binary.chars().enumerate() {
        if i > 0 && i % BITS_PER_BYTE == 0 {
            out.push(' ');
        }
        out.push(c);
    }
    out
}
