use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use atsd_core::{Command, CommandError, EntityTagCommand, PropertyCommand, SeriesCommand};
use log::{debug, error, warn};

use crate::config::StreamConfig;
use crate::error::{Result, StreamError};
use crate::transport::{self, Connection, Protocol, Transport};
use crate::writer::ChannelWriter;

/// Потоковый клиент ATSD.
///
/// Держит одно соединение и буфер строк под одним мьютексом: все операции
/// (`series`, `property`, `entity_tag`, `send`, `flush`, `close`) выполняются
/// строго по очереди, поэтому строки разных потоков не перемешиваются.
///
/// Запись в сокет происходит только при переполнении буфера или в `flush`,
/// и блокирует остальных вызывающих на время записи. Ни повторов, ни
/// переподключения нет: после ошибки клиента закрывают и создают заново.
pub struct StreamClient<T: Transport = Connection> {
    // None => соединение закрыто
    writer: Mutex<Option<ChannelWriter<T>>>,
}

impl StreamClient<Connection> {
    /// Подключиться к `address` по `protocol` ("tcp", "udp", ...) не дольше `timeout`.
    ///
    /// Буфер записи размером `buffer_size` выделяется только после успешного connect.
    pub fn dial_timeout(
        protocol: &str,
        address: &str,
        timeout: Duration,
        buffer_size: usize,
    ) -> Result<Self> {
        let protocol: Protocol = protocol.parse()?;

        let mut config = StreamConfig::new(address);
        config.protocol = protocol;
        config.dial_timeout = timeout;
        config.buffer_size = buffer_size;

        Self::connect(&config)
    }

    pub fn connect(config: &StreamConfig) -> Result<Self> {
        let conn = transport::dial(config.protocol, &config.address, config.dial_timeout)
            .inspect_err(|e| error!("could not init connection: {e}"))?;

        if let Some(timeout) = config.write_timeout {
            conn.set_write_timeout(Some(timeout))
                .map_err(|source| StreamError::Dial {
                    address: config.address.clone(),
                    source,
                })?;
        }

        debug!(
            "stream client connected: {}://{} buffer={}",
            config.protocol, config.address, config.buffer_size
        );
        Ok(Self::from_transport(conn, config.buffer_size))
    }
}

impl<T: Transport> StreamClient<T> {
    /// Клиент поверх уже открытого транспорта
    pub fn from_transport(transport: T, buffer_size: usize) -> Self {
        Self {
            writer: Mutex::new(Some(ChannelWriter::with_capacity(buffer_size, transport))),
        }
    }

    pub fn series(&self, cmd: &SeriesCommand) -> Result<()> {
        self.write_line(|| {
            cmd.validate()?;
            Ok(cmd.to_string())
        })
    }

    pub fn property(&self, cmd: &PropertyCommand) -> Result<()> {
        self.write_line(|| {
            cmd.validate()?;
            Ok(cmd.to_string())
        })
    }

    pub fn entity_tag(&self, cmd: &EntityTagCommand) -> Result<()> {
        self.write_line(|| {
            cmd.validate()?;
            Ok(cmd.to_string())
        })
    }

    /// Любая команда; то же самое, что вызов метода нужного варианта
    pub fn send(&self, cmd: &Command) -> Result<()> {
        self.write_line(|| {
            cmd.validate()?;
            Ok(cmd.to_string())
        })
    }

    /// Отдать буфер в сокет. Гарантирует только передачу ОС, не приём сервером.
    pub fn flush(&self) -> Result<()> {
        let mut guard = self.lock();
        let writer = guard.as_mut().ok_or_else(not_connected)?;

        writer.flush().map_err(|e| {
            error!("flush failed: {e}");
            StreamError::Io(e)
        })
    }

    /// Закрыть соединение. Повторный вызов ничего не делает.
    ///
    /// Буфер при этом НЕ сбрасывается: всё, что не ушло через `flush`, теряется.
    pub fn close(&self) {
        let mut guard = self.lock();
        let Some(writer) = guard.take() else {
            return;
        };

        let (mut transport, dropped) = writer.into_transport();
        if dropped > 0 {
            warn!("closing connection with {dropped} unflushed bytes discarded");
        }
        if let Err(e) = transport.shutdown() {
            // сокет мог уже умереть, на результат close это не влияет
            debug!("shutdown error: {e}");
        }
        debug!("stream client closed");
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_some()
    }

    // lock -> проверка соединения -> валидация и кодирование -> запись в буфер
    fn write_line(&self, encode: impl FnOnce() -> std::result::Result<String, CommandError>) -> Result<()> {
        let mut guard = self.lock();
        let writer = guard.as_mut().ok_or_else(not_connected)?;

        let line = encode()?;
        writer.append(&line).map_err(|e| {
            error!("write command failed: {e}");
            StreamError::Io(e)
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<ChannelWriter<T>>> {
        match self.writer.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(), // в буфере только целые строки, продолжаем
        }
    }
}

impl<T: Transport> Drop for StreamClient<T> {
    fn drop(&mut self) {
        self.close();
    }
}

fn not_connected() -> StreamError {
    warn!("need to open connection first");
    StreamError::NotConnected
}
