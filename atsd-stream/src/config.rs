use std::time::Duration;

use crate::transport::Protocol;

/// Размер буфера записи по умолчанию
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Таймаут установки соединения по умолчанию
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Параметры подключения потокового клиента.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Транспорт: tcp / udp / unix и их варианты
    pub protocol: Protocol,
    /// `host:port` (или путь к сокету для unix)
    pub address: String,
    /// Сколько ждём connect
    pub dial_timeout: Duration,
    /// Таймаут блокирующей записи в сокет; `None` — ждать сколько угодно
    pub write_timeout: Option<Duration>,
    /// Ёмкость буфера записи в байтах
    pub buffer_size: usize,
}

impl StreamConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            protocol: Protocol::Tcp,
            address: address.into(),
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
            write_timeout: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}
