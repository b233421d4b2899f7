use std::collections::BTreeMap;

use crate::error::CommandError;

/// Команда `series`: значения метрик сущности на момент времени.
///
/// Хотя бы одна метрика есть всегда: её требует конструктор.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesCommand {
    entity: String,
    timestamp_ms: Option<u64>,
    tags: BTreeMap<String, String>,
    metrics: BTreeMap<String, f64>,
}

impl SeriesCommand {
    /// Новая команда с одной метрикой
    pub fn new(entity: impl Into<String>, metric: impl Into<String>, value: f64) -> Self {
        let mut metrics = BTreeMap::new();
        metrics.insert(metric.into(), value);
        Self {
            entity: entity.into(),
            timestamp_ms: None,
            tags: BTreeMap::new(),
            metrics,
        }
    }

    /// Время в миллисекундах (без него время проставит сервер)
    pub fn with_timestamp(mut self, millis: u64) -> Self {
        self.timestamp_ms = Some(millis);
        self
    }

    /// Добавить или перезаписать метрику
    pub fn with_metric(mut self, metric: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(metric.into(), value);
        self
    }

    /// Добавить или перезаписать тег серии
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp_ms
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    pub fn validate(&self) -> Result<(), CommandError> {
        check_entity(&self.entity)?;
        check_pairs("tag", &self.tags)?;
        for name in self.metrics.keys() {
            check_name("metric", name)?;
        }
        Ok(())
    }
}

/// Команда `property`: запись с ключом и атрибутами, привязанная к сущности.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyCommand {
    prop_type: String,
    entity: String,
    timestamp_ms: Option<u64>,
    key: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
}

impl PropertyCommand {
    pub fn new(prop_type: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            prop_type: prop_type.into(),
            entity: entity.into(),
            timestamp_ms: None,
            key: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Заменить ключ целиком
    pub fn with_key(mut self, key: BTreeMap<String, String>) -> Self {
        self.key = key;
        self
    }

    /// Добавить одну часть ключа
    pub fn with_key_part(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.key.insert(name.into(), value.into());
        self
    }

    /// Заменить все теги
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    pub fn with_timestamp(mut self, millis: u64) -> Self {
        self.timestamp_ms = Some(millis);
        self
    }

    pub fn prop_type(&self) -> &str {
        &self.prop_type
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.timestamp_ms
    }

    pub fn key(&self) -> &BTreeMap<String, String> {
        &self.key
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn validate(&self) -> Result<(), CommandError> {
        check_entity(&self.entity)?;
        if self.prop_type.is_empty() {
            return Err(CommandError::EmptyPropertyType);
        }
        check_line("property type", &self.prop_type)?;
        check_pairs("key", &self.key)?;
        check_pairs("tag", &self.tags)
    }
}

/// Команда `entity-tag`: теги самой сущности.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTagCommand {
    entity: String,
    tags: BTreeMap<String, String>,
}

impl EntityTagCommand {
    pub fn new(entity: impl Into<String>, tag: impl Into<String>, value: impl Into<String>) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(tag.into(), value.into());
        Self {
            entity: entity.into(),
            tags,
        }
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn validate(&self) -> Result<(), CommandError> {
        check_entity(&self.entity)?;
        check_pairs("tag", &self.tags)
    }
}

/// Любая команда потокового протокола.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Series(SeriesCommand),
    Property(PropertyCommand),
    EntityTag(EntityTagCommand),
}

impl Command {
    /// Имя команды на проводе
    pub fn name(&self) -> &'static str {
        match self {
            Command::Series(_) => crate::constants::SERIES,
            Command::Property(_) => crate::constants::PROPERTY,
            Command::EntityTag(_) => crate::constants::ENTITY_TAG,
        }
    }

    pub fn entity(&self) -> &str {
        match self {
            Command::Series(c) => c.entity(),
            Command::Property(c) => c.entity(),
            Command::EntityTag(c) => c.entity(),
        }
    }

    /// Проверка перед кодированием.
    ///
    /// Пробелы и `=` внутри имён и значений пропускаются как есть (совместимость
    /// с сервером), а переводы строки отклоняются: они порвали бы поток на
    /// лишние команды.
    pub fn validate(&self) -> Result<(), CommandError> {
        match self {
            Command::Series(c) => c.validate(),
            Command::Property(c) => c.validate(),
            Command::EntityTag(c) => c.validate(),
        }
    }
}

impl From<SeriesCommand> for Command {
    fn from(c: SeriesCommand) -> Self {
        Command::Series(c)
    }
}

impl From<PropertyCommand> for Command {
    fn from(c: PropertyCommand) -> Self {
        Command::Property(c)
    }
}

impl From<EntityTagCommand> for Command {
    fn from(c: EntityTagCommand) -> Self {
        Command::EntityTag(c)
    }
}

fn check_entity(entity: &str) -> Result<(), CommandError> {
    if entity.is_empty() {
        return Err(CommandError::EmptyEntity);
    }
    check_line("entity", entity)
}

fn check_name(field: &'static str, name: &str) -> Result<(), CommandError> {
    if name.is_empty() {
        return Err(CommandError::EmptyName(field));
    }
    check_line(field, name)
}

fn check_pairs(field: &'static str, pairs: &BTreeMap<String, String>) -> Result<(), CommandError> {
    for (name, value) in pairs {
        check_name(field, name)?;
        check_line(field, value)?;
    }
    Ok(())
}

fn check_line(field: &'static str, value: &str) -> Result<(), CommandError> {
    if value.contains(['\n', '\r']) {
        return Err(CommandError::LineBreak {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
