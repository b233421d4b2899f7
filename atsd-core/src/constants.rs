/// Имена команд на проводе
pub const SERIES: &str = "series";
pub const PROPERTY: &str = "property";
pub const ENTITY_TAG: &str = "entity-tag";

/// Порт ATSD для потоковых команд по умолчанию
pub const DEFAULT_NETWORK_PORT: u16 = 8081;

/// Терминатор строки команды
pub const LINE_TERMINATOR: char = '\n';
