use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use atsd_core::Command;
use atsd_stream::{StreamClient, Transport};
use log::{debug, info};

use crate::generator::DemoGenerator;
use crate::input::InputError;

const TICK_RATE_MS: u64 = 200;

/// Отправляет команды из источника, пока он не кончится или не придёт shutdown.
///
/// Возвращает число отправленных (положенных в буфер) команд.
pub(crate) fn push_commands<T, I>(
    client: &StreamClient<T>,
    commands: I,
    shutdown: &AtomicBool,
) -> anyhow::Result<usize>
where
    T: Transport,
    I: IntoIterator<Item = Result<Command, InputError>>,
{
    let mut sent = 0;

    for cmd in commands {
        if shutdown.load(Ordering::Relaxed) {
            info!("stopping input after {sent} commands");
            break;
        }

        let cmd = cmd?;
        client
            .send(&cmd)
            .with_context(|| format!("send {} for entity {}", cmd.name(), cmd.entity()))?;
        sent += 1;
    }

    Ok(sent)
}

/// Демо-режим: пачка series раз в `interval`, до shutdown.
pub(crate) fn run_demo<T: Transport>(
    client: &StreamClient<T>,
    generator: &mut DemoGenerator,
    interval: Duration,
    shutdown: &AtomicBool,
) -> anyhow::Result<usize> {
    let mut sent = 0;
    let tick = Duration::from_millis(TICK_RATE_MS);

    while !shutdown.load(Ordering::Relaxed) {
        for cmd in generator.next_batch() {
            client
                .series(&cmd)
                .with_context(|| format!("send series for entity {}", cmd.entity()))?;
            debug!("{cmd}");
            sent += 1;
        }

        let mut slept = Duration::ZERO;
        while slept < interval && !shutdown.load(Ordering::Relaxed) {
            let step = (interval - slept).min(tick);
            std::thread::sleep(step);
            slept += step;
        }
    }

    Ok(sent)
}
