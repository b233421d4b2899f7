use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use atsd_core::SeriesCommand;
use rand::Rng;

#[derive(Debug, Clone)]
pub(crate) struct GeneratorConfig {
    /// Максимальный относительный шаг значения за тик (пример: 0.05 = 5%)
    pub(crate) max_rel_step: f64,
    /// Границы значения метрики
    pub(crate) min_value: f64,
    pub(crate) max_value: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_rel_step: 0.05,
            min_value: 0.0,
            max_value: 100.0,
        }
    }
}

/// Случайное блуждание значений метрик по сущностям для демо-режима.
pub(crate) struct DemoGenerator {
    cfg: GeneratorConfig,
    metrics: Vec<String>,
    /// entity -> metric -> последнее значение
    states: BTreeMap<String, BTreeMap<String, f64>>,
}

impl DemoGenerator {
    pub(crate) fn new(entities: Vec<String>, metrics: Vec<String>, cfg: GeneratorConfig) -> Self {
        let mut rng = rand::rng();

        let states = entities
            .into_iter()
            .map(|e| {
                let values = metrics
                    .iter()
                    .map(|m| (m.clone(), rng.random_range(cfg.min_value..=cfg.max_value)))
                    .collect();
                (e, values)
            })
            .collect();

        Self {
            cfg,
            metrics,
            states,
        }
    }

    /// сгенерировать series для сущности: все её метрики одной командой
    pub(crate) fn next_command(&mut self, entity: &str) -> Option<SeriesCommand> {
        let values = self.states.get_mut(entity)?;
        let mut rng = rand::rng();

        for value in values.values_mut() {
            let delta = rng.random_range(-self.cfg.max_rel_step..=self.cfg.max_rel_step);
            // от нуля относительный шаг не сдвинет, поэтому шаг от середины диапазона
            let base = value.abs().max((self.cfg.max_value - self.cfg.min_value) / 2.0);
            *value = (*value + delta * base).clamp(self.cfg.min_value, self.cfg.max_value);
        }

        let mut metrics = self.metrics.iter().filter_map(|m| Some((m, *values.get(m)?)));
        let (first, first_value) = metrics.next()?;

        let mut cmd = SeriesCommand::new(entity, first.as_str(), first_value)
            .with_timestamp(now_ms())
            .with_tag("source", "atsd-push");
        for (name, value) in metrics {
            cmd = cmd.with_metric(name.as_str(), value);
        }
        Some(cmd)
    }

    /// сгенерировать series для всех сущностей
    pub(crate) fn next_batch(&mut self) -> Vec<SeriesCommand> {
        let entities: Vec<String> = self.states.keys().cloned().collect();

        entities
            .iter()
            .filter_map(|e| self.next_command(e))
            .collect()
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
