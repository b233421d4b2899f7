use thiserror::Error;

/// Верхнеуровневый тип ошибок крейта
#[derive(Debug, Error, PartialEq)]
pub enum AtsdCoreError {
    /// Ошибки разбора строки протокола
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Команда не прошла валидацию
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Ошибки разбора строки протокола
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// пустая строка
    #[error("empty command")]
    EmptyCommand,

    /// Неизвестная команда
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Токен не в формате `prefix:value` / `prefix:name=value`
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Префикс не поддерживается этой командой
    #[error("unexpected field {token:?} in {command} command")]
    UnexpectedField {
        /// имя команды
        command: &'static str,
        /// исходный токен
        token: String,
    },

    /// Отсутствует обязательное поле
    #[error("missing required field {field:?} in {command} command")]
    MissingField {
        /// имя команды
        command: &'static str,
        /// префикс поля
        field: &'static str,
    },

    /// `ms:` не является целым числом миллисекунд
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// значение метрики не число
    #[error("invalid metric value: {0}")]
    InvalidMetricValue(String),
}

/// Ошибки валидации команды перед отправкой
#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    /// Пустое имя сущности
    #[error("entity is empty")]
    EmptyEntity,

    /// Пустой тип property
    #[error("property type is empty")]
    EmptyPropertyType,

    /// Пустое имя тега/метрики/части ключа
    #[error("empty {0} name")]
    EmptyName(&'static str),

    /// Перевод строки внутри поля сломал бы построчный фрейминг
    #[error("line break in {field}: {value:?}")]
    LineBreak {
        /// какое поле
        field: &'static str,
        /// исходное значение
        value: String,
    },
}
