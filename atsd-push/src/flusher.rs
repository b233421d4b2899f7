use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::anyhow;
use atsd_stream::{StreamClient, StreamError, Transport};
use crossbeam_channel::{Receiver, Sender, select};
use log::{debug, error};

/// Фоновый поток, который раз в `interval` сбрасывает буфер клиента.
///
/// Сам клиент по таймеру ничего не отправляет, эта политика живёт здесь.
pub(crate) struct Flusher {
    // никогда не шлём, только дропаем: disconnect = сигнал остановки
    stop_tx: Sender<()>,
    handle: JoinHandle<Result<(), StreamError>>,
}

impl Flusher {
    pub(crate) fn spawn<T: Transport + 'static>(
        client: Arc<StreamClient<T>>,
        interval: Duration,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let ticker = crossbeam_channel::tick(interval);

        let handle = thread::spawn(move || run_flusher(&*client, ticker, stop_rx, &shutdown));

        Self { stop_tx, handle }
    }

    /// Остановить поток и вернуть ошибку flush, если она была
    pub(crate) fn stop(self) -> anyhow::Result<()> {
        drop(self.stop_tx);
        match self.handle.join() {
            Ok(res) => res.map_err(Into::into),
            Err(_) => Err(anyhow!("flusher thread panicked")),
        }
    }
}

fn run_flusher<T: Transport>(
    client: &StreamClient<T>,
    ticker: Receiver<Instant>,
    stop: Receiver<()>,
    shutdown: &AtomicBool,
) -> Result<(), StreamError> {
    loop {
        select! {
            recv(ticker) -> _ => {
                if let Err(e) = client.flush() {
                    error!("periodic flush failed, stopping: {e}");
                    // соединение битое: просим основной цикл остановиться
                    shutdown.store(true, Ordering::Relaxed);
                    return Err(e);
                }
                debug!("flushed");
            }
            recv(stop) -> _ => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atsd_core::SeriesCommand;
    use std::io::{self, Write};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct SharedBuf {
        bytes: Arc<Mutex<Vec<u8>>>,
        broken: Arc<AtomicBool>,
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.broken.load(Ordering::Relaxed) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
            }
            self.bytes.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Transport for SharedBuf {
        fn shutdown(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn buffered_lines_reach_transport_without_explicit_flush() {
        let sink = SharedBuf::default();
        let client = Arc::new(StreamClient::from_transport(sink.clone(), 4096));
        let shutdown = Arc::new(AtomicBool::new(false));

        let flusher = Flusher::spawn(client.clone(), Duration::from_millis(10), shutdown.clone());
        client.series(&SeriesCommand::new("e1", "m1", 1.5)).unwrap();

        assert!(wait_until(|| !sink.bytes.lock().unwrap().is_empty()));
        flusher.stop().unwrap();

        assert_eq!(&*sink.bytes.lock().unwrap(), b"series e:e1 m:m1=1.5\n");
        assert!(!shutdown.load(Ordering::Relaxed));
    }

    #[test]
    fn flush_failure_requests_shutdown_and_is_reported() {
        let sink = SharedBuf::default();
        sink.broken.store(true, Ordering::Relaxed);
        let client = Arc::new(StreamClient::from_transport(sink.clone(), 4096));
        let shutdown = Arc::new(AtomicBool::new(false));

        client.series(&SeriesCommand::new("e1", "m1", 1.0)).unwrap();
        let flusher = Flusher::spawn(client.clone(), Duration::from_millis(10), shutdown.clone());

        assert!(wait_until(|| shutdown.load(Ordering::Relaxed)));
        assert!(flusher.stop().is_err());
    }

    #[test]
    fn stop_returns_promptly_with_long_interval() {
        let client = Arc::new(StreamClient::from_transport(SharedBuf::default(), 16));
        let shutdown = Arc::new(AtomicBool::new(false));

        let flusher = Flusher::spawn(client, Duration::from_secs(3600), shutdown);
        let started = Instant::now();
        flusher.stop().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
