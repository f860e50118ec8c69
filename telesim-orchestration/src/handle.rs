//! Resultado de uma execução em thread de trabalho

use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError, bounded};
use telesim_core::prelude::*;

/// Mensagem concluída ou a falha com a mensagem afetada
pub type RunResult = Result<Arc<Message>, PipelineFailure>;

/// Lado de escrita de um [`RunHandle`]
#[derive(Debug)]
pub struct Completer {
    tx: Sender<RunResult>,
}

impl Completer {
    /// Entrega o resultado; ignorado se o handle já foi descartado
    pub fn complete(self, result: RunResult) {
        let _ = self.tx.send(result);
    }
}

/// Handle para aguardar o fim de uma execução assíncrona
#[derive(Debug)]
pub struct RunHandle {
    rx: Receiver<RunResult>,
    result: OnceLock<RunResult>,
}

impl RunHandle {
    /// Par completer/handle desacoplado de qualquer thread
    pub fn pair() -> (Completer, RunHandle) {
        let (tx, rx) = bounded(1);
        (
            Completer { tx },
            RunHandle {
                rx,
                result: OnceLock::new(),
            },
        )
    }

    /// Executa `work` numa thread nomeada
    pub fn spawn<F>(name: &str, work: F) -> LinkResult<RunHandle>
    where
        F: FnOnce() -> RunResult + Send + 'static,
    {
        let (completer, handle) = Self::pair();
        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || completer.complete(work()))
            .map_err(|e| LinkError::Spawn(e.to_string()))?;
        Ok(handle)
    }

    /// Bloqueia até o resultado
    pub fn wait(self) -> RunResult {
        if let Some(result) = self.result.into_inner() {
            return result;
        }
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(PipelineFailure::bare(LinkError::WorkerLost)))
    }

    /// Espera no máximo `timeout`; `None` se ainda em andamento
    pub fn wait_timeout(&self, timeout: Duration) -> Option<RunResult> {
        if let Some(result) = self.result.get() {
            return Some(result.clone());
        }
        let result = match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => Err(PipelineFailure::bare(LinkError::WorkerLost)),
        };
        Some(self.result.get_or_init(|| result).clone())
    }

    /// Resultado, se já disponível
    pub fn try_result(&self) -> Option<RunResult> {
        if let Some(result) = self.result.get() {
            return Some(result.clone());
        }
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(PipelineFailure::bare(LinkError::WorkerLost)),
        };
        Some(self.result.get_or_init(|| result).clone())
    }

    pub fn is_finished(&self) -> bool {
        self.try_result().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_result_is_delivered() {
        let msg = Arc::new(Message::new("x"));
        let id = msg.id();
        let handle = RunHandle::spawn("test-run", move || Ok(msg)).unwrap();
        assert_eq!(handle.wait().unwrap().id(), id);
    }

    #[test]
    fn test_result_is_cached_after_poll() {
        let (completer, handle) = RunHandle::pair();
        assert!(handle.try_result().is_none());
        completer.complete(Err(PipelineFailure::bare(LinkError::Cancelled)));
        assert!(handle.wait_timeout(Duration::from_secs(1)).is_some());
        assert!(handle.is_finished());
        assert_eq!(handle.wait().unwrap_err().error, LinkError::Cancelled);
    }

    #[test]
    fn test_dropped_completer_reports_lost_worker() {
        let (completer, handle) = RunHandle::pair();
        drop(completer);
        assert_eq!(handle.wait().unwrap_err().error, LinkError::WorkerLost);
    }

    #[test]
    fn test_panicking_worker_reports_lost_worker() {
        let handle = RunHandle::spawn("test-panic", || panic!("boom")).unwrap();
        assert_eq!(handle.wait().unwrap_err().error, LinkError::WorkerLost);
    }
}
