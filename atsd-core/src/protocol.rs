use std::fmt;
use std::str::FromStr;

use crate::command::{Command, EntityTagCommand, PropertyCommand, SeriesCommand};
use crate::constants::{ENTITY_TAG, LINE_TERMINATOR, PROPERTY, SERIES};
use crate::error::{AtsdCoreError, ProtocolError};

impl fmt::Display for SeriesCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SERIES} e:{}", self.entity())?;
        if let Some(ms) = self.timestamp() {
            write!(f, " ms:{ms}")?;
        }
        for (name, value) in self.tags() {
            write!(f, " t:{name}={value}")?;
        }
        for (name, value) in self.metrics() {
            write!(f, " m:{name}={value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PropertyCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PROPERTY} e:{} t:{}", self.entity(), self.prop_type())?;
        if let Some(ms) = self.timestamp() {
            write!(f, " ms:{ms}")?;
        }
        for (name, value) in self.key() {
            write!(f, " k:{name}={value}")?;
        }
        for (name, value) in self.tags() {
            write!(f, " v:{name}={value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for EntityTagCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ENTITY_TAG} e:{}", self.entity())?;
        for (name, value) in self.tags() {
            write!(f, " t:{name}={value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Series(c) => fmt::Display::fmt(c, f),
            Command::Property(c) => fmt::Display::fmt(c, f),
            Command::EntityTag(c) => fmt::Display::fmt(c, f),
        }
    }
}

/// Строка команды вместе с терминатором, готовая к записи в сокет.
pub fn encode_line(cmd: &Command) -> String {
    format!("{cmd}{LINE_TERMINATOR}")
}

/// Парсит строку вида:
/// "series e:host-1 ms:1700000000000 t:dc=eu m:cpu=0.5"
///
/// Проверяет только синтаксис; содержимое проверяет [`Command::validate`].
pub fn parse_command(line: &str) -> Result<Command, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ProtocolError::EmptyCommand);
    }

    let mut parts = line.split_whitespace();
    let name = parts.next().ok_or(ProtocolError::EmptyCommand)?;

    match name {
        SERIES => parse_series(parts),
        PROPERTY => parse_property(parts),
        ENTITY_TAG => parse_entity_tag(parts),
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

impl FromStr for Command {
    type Err = AtsdCoreError;

    /// Разбор + валидация
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cmd = parse_command(s)?;
        cmd.validate()?;
        Ok(cmd)
    }
}

fn parse_series<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Command, ProtocolError> {
    let mut entity = None;
    let mut timestamp = None;
    let mut tags = Vec::new();
    let mut metrics = Vec::new();

    for token in tokens {
        match split_field(token)? {
            ("e", v) => entity = Some(v),
            ("ms", v) => timestamp = Some(parse_timestamp(v)?),
            ("t", v) => tags.push(split_pair(token, v)?),
            ("m", v) => {
                let (name, raw) = split_pair(token, v)?;
                let value: f64 = raw
                    .parse()
                    .map_err(|_| ProtocolError::InvalidMetricValue(raw.to_string()))?;
                metrics.push((name, value));
            }
            _ => return Err(unexpected(SERIES, token)),
        }
    }

    let entity = entity.ok_or(missing(SERIES, "e"))?;
    let mut metrics = metrics.into_iter();
    let (metric, value) = metrics.next().ok_or(missing(SERIES, "m"))?;

    let mut cmd = SeriesCommand::new(entity, metric, value);
    for (name, value) in metrics {
        cmd = cmd.with_metric(name, value);
    }
    for (name, value) in tags {
        cmd = cmd.with_tag(name, value);
    }
    if let Some(ms) = timestamp {
        cmd = cmd.with_timestamp(ms);
    }
    Ok(cmd.into())
}

fn parse_property<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Command, ProtocolError> {
    let mut entity = None;
    let mut prop_type = None;
    let mut timestamp = None;
    let mut key = Vec::new();
    let mut tags = Vec::new();

    for token in tokens {
        match split_field(token)? {
            ("e", v) => entity = Some(v),
            ("t", v) => prop_type = Some(v),
            ("ms", v) => timestamp = Some(parse_timestamp(v)?),
            ("k", v) => key.push(split_pair(token, v)?),
            ("v", v) => tags.push(split_pair(token, v)?),
            _ => return Err(unexpected(PROPERTY, token)),
        }
    }

    let entity = entity.ok_or(missing(PROPERTY, "e"))?;
    let prop_type = prop_type.ok_or(missing(PROPERTY, "t"))?;

    let mut cmd = PropertyCommand::new(prop_type, entity);
    for (name, value) in key {
        cmd = cmd.with_key_part(name, value);
    }
    for (name, value) in tags {
        cmd = cmd.with_tag(name, value);
    }
    if let Some(ms) = timestamp {
        cmd = cmd.with_timestamp(ms);
    }
    Ok(cmd.into())
}

fn parse_entity_tag<'a>(tokens: impl Iterator<Item = &'a str>) -> Result<Command, ProtocolError> {
    let mut entity = None;
    let mut tags = Vec::new();

    for token in tokens {
        match split_field(token)? {
            ("e", v) => entity = Some(v),
            ("t", v) => tags.push(split_pair(token, v)?),
            _ => return Err(unexpected(ENTITY_TAG, token)),
        }
    }

    let entity = entity.ok_or(missing(ENTITY_TAG, "e"))?;
    let mut tags = tags.into_iter();
    let (name, value) = tags.next().ok_or(missing(ENTITY_TAG, "t"))?;

    let mut cmd = EntityTagCommand::new(entity, name, value);
    for (name, value) in tags {
        cmd = cmd.with_tag(name, value);
    }
    Ok(cmd.into())
}

// "t:dc=eu" -> ("t", "dc=eu")
fn split_field(token: &str) -> Result<(&str, &str), ProtocolError> {
    token
        .split_once(':')
        .ok_or_else(|| ProtocolError::MalformedToken(token.to_string()))
}

// "dc=eu" -> ("dc", "eu"); режем по первому '='
fn split_pair<'a>(token: &str, value: &'a str) -> Result<(&'a str, &'a str), ProtocolError> {
    value
        .split_once('=')
        .ok_or_else(|| ProtocolError::MalformedToken(token.to_string()))
}

fn parse_timestamp(raw: &str) -> Result<u64, ProtocolError> {
    raw.parse()
        .map_err(|_| ProtocolError::InvalidTimestamp(raw.to_string()))
}

fn unexpected(command: &'static str, token: &str) -> ProtocolError {
    ProtocolError::UnexpectedField {
        command,
        token: token.to_string(),
    }
}

fn missing(command: &'static str, field: &'static str) -> ProtocolError {
    ProtocolError::MissingField { command, field }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CommandError;

    fn tokens(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn series_with_single_metric_is_exact() {
        let cmd: Command = SeriesCommand::new("e1", "m1", 1.5).into();
        assert_eq!(encode_line(&cmd), "series e:e1 m:m1=1.5\n");
    }

    #[test]
    fn entity_tag_with_single_tag_is_exact() {
        let cmd: Command = EntityTagCommand::new("e1", "t1", "v1").into();
        assert_eq!(cmd.to_string(), "entity-tag e:e1 t:t1=v1");
        assert_eq!(encode_line(&cmd), "entity-tag e:e1 t:t1=v1\n");
    }

    #[test]
    fn property_has_fixed_leading_tokens() {
        let cmd: Command = PropertyCommand::new("disk", "e1")
            .with_key_part("name", "/")
            .with_tag("used_pct", "42")
            .into();

        let line = cmd.to_string();
        let t = tokens(&line);
        assert_eq!(&t[..3], &["property", "e:e1", "t:disk"]);
        assert!(t.contains(&"k:name=/"));
        assert!(t.contains(&"v:used_pct=42"));
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn timestamp_goes_right_after_leading_fields() {
        let cmd: Command = SeriesCommand::new("e1", "m1", 2.0)
            .with_tag("dc", "eu")
            .with_timestamp(1_700_000_000_000)
            .into();
        assert_eq!(
            cmd.to_string(),
            "series e:e1 ms:1700000000000 t:dc=eu m:m1=2"
        );

        let cmd: Command = PropertyCommand::new("disk", "e1")
            .with_timestamp(5)
            .into();
        assert_eq!(cmd.to_string(), "property e:e1 t:disk ms:5");
    }

    #[test]
    fn multi_valued_series_puts_tags_before_metrics() {
        let cmd: Command = SeriesCommand::new("e1", "cpu", 0.5)
            .with_metric("mem", 10.0)
            .with_tag("dc", "eu")
            .with_tag("rack", "r1")
            .into();

        let line = cmd.to_string();
        let t = tokens(&line);
        assert_eq!(&t[..2], &["series", "e:e1"]);

        // порядок внутри групп не фиксируем, только группы
        let (tags, metrics) = t[2..].split_at(2);
        let mut tags = tags.to_vec();
        tags.sort();
        assert_eq!(tags, vec!["t:dc=eu", "t:rack=r1"]);
        let mut metrics = metrics.to_vec();
        metrics.sort();
        assert_eq!(metrics, vec!["m:cpu=0.5", "m:mem=10"]);
    }

    #[test]
    fn encoded_line_has_single_terminator() {
        let cmd: Command = EntityTagCommand::new("e1", "a", "1")
            .with_tag("b", "2")
            .into();
        let line = encode_line(&cmd);
        assert!(line.ends_with('\n'));
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn parse_series_line() {
        let cmd = parse_command("series e:e1 ms:10 t:dc=eu m:cpu=0.5 m:mem=3\n").unwrap();
        let expected: Command = SeriesCommand::new("e1", "cpu", 0.5)
            .with_metric("mem", 3.0)
            .with_tag("dc", "eu")
            .with_timestamp(10)
            .into();
        assert_eq!(cmd, expected);
    }

    #[test]
    fn parse_property_line_gives_back_same_command() {
        let original: Command = PropertyCommand::new("disk", "e1")
            .with_key_part("name", "/")
            .with_tag("used_pct", "42")
            .with_timestamp(1)
            .into();
        let parsed = parse_command(&encode_line(&original)).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn parse_splits_pairs_at_first_equals() {
        let cmd = parse_command("entity-tag e:e1 t:expr=a=b").unwrap();
        match cmd {
            Command::EntityTag(c) => assert_eq!(c.tags()["expr"], "a=b"),
            other => panic!("expected entity-tag, got {other:?}"),
        }
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_command("   "), Err(ProtocolError::EmptyCommand));
        assert_eq!(
            parse_command("metric e:e1"),
            Err(ProtocolError::UnknownCommand("metric".into()))
        );
        assert_eq!(
            parse_command("series e:e1 m:cpu"),
            Err(ProtocolError::MalformedToken("m:cpu".into()))
        );
        assert_eq!(
            parse_command("series e1 m:cpu=1"),
            Err(ProtocolError::MalformedToken("e1".into()))
        );
        assert_eq!(
            parse_command("series e:e1"),
            Err(ProtocolError::MissingField {
                command: "series",
                field: "m"
            })
        );
        assert_eq!(
            parse_command("property e:e1 k:a=b"),
            Err(ProtocolError::MissingField {
                command: "property",
                field: "t"
            })
        );
        assert_eq!(
            parse_command("entity-tag e:e1 m:x=1"),
            Err(ProtocolError::UnexpectedField {
                command: "entity-tag",
                token: "m:x=1".into()
            })
        );
        assert_eq!(
            parse_command("series e:e1 ms:soon m:x=1"),
            Err(ProtocolError::InvalidTimestamp("soon".into()))
        );
        assert_eq!(
            parse_command("series e:e1 m:x=abc"),
            Err(ProtocolError::InvalidMetricValue("abc".into()))
        );
    }

    #[test]
    fn from_str_validates_after_parsing() {
        let cmd: Command = "entity-tag e:e1 t:os=linux".parse().unwrap();
        assert_eq!(cmd.entity(), "e1");

        let err = "series e: m:cpu=1".parse::<Command>().unwrap_err();
        assert_eq!(err, AtsdCoreError::Command(CommandError::EmptyEntity));

        let err = "nope".parse::<Command>().unwrap_err();
        assert!(matches!(err, AtsdCoreError::Protocol(_)));
    }
}
