//! Guarda de reentrada — no máximo uma operação em voo por componente
//!
//! Não é fila: uma segunda chamada concorrente falha imediatamente.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Flag de "processando" compartilhável entre threads
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    busy: Arc<AtomicBool>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tenta entrar; `None` se já houver operação em voo
    pub fn try_enter(&self) -> Option<GuardToken> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GuardToken {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Posse da guarda; libera ao ser descartado (inclusive em pânico)
///
/// O token pode ser movido para a thread de trabalho.
#[derive(Debug)]
#[must_use = "a guarda é liberada quando o token é descartado"]
pub struct GuardToken {
    busy: Arc<AtomicBool>,
}

impl Drop for GuardToken {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
