use std::io;

use atsd_core::CommandError;
use thiserror::Error;

/// Ошибки потокового клиента
#[derive(Debug, Error)]
pub enum StreamError {
    /// Не удалось установить соединение (таймаут, отказ, адрес не резолвится)
    #[error("could not init connection to {address}")]
    Dial {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Неизвестное имя протокола
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// Запись после close (или без соединения)
    #[error("need to open connection first")]
    NotConnected,

    /// Команда не прошла валидацию, в буфер ничего не попало
    #[error("invalid command: {0}")]
    InvalidCommand(#[from] CommandError),

    /// Ошибка записи в сокет
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, StreamError>;
