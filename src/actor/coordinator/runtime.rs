use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::MissedTickBehavior;

use super::{DevState, Rebuild};
use crate::actor::fs::{Debouncer, WatchEvent};

/// How often the crossbeam shutdown channel is checked.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// The coordinator loop.
///
/// The rebuilder is moved into a blocking task for each build and handed
/// back when it finishes, so two builds can never overlap. Returns after
/// shutdown, or once the event channel closed and all pending work drained.
pub(super) async fn drive<R: Rebuild>(
    mut events: mpsc::Receiver<WatchEvent>,
    wait: Duration,
    rebuild: R,
    shutdown_rx: Option<Receiver<()>>,
) {
    let mut debouncer = Debouncer::new(wait);
    let mut idle = Some(rebuild);
    let mut running: Option<JoinHandle<R>> = None;
    let mut events_open = true;
    let mut state = DevState::Idle;

    let mut shutdown_poll = tokio::time::interval(SHUTDOWN_POLL);
    shutdown_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let next = current_state(running.is_some(), &debouncer);
        if next != state {
            crate::debug!("watch"; "{} -> {}", state, next);
            state = next;
        }

        if !events_open && state == DevState::Idle {
            break;
        }

        tokio::select! {
            biased;

            _ = shutdown_poll.tick(), if shutdown_rx.is_some() => {
                if shutdown_requested(shutdown_rx.as_ref()) {
                    crate::debug!("watch"; "shutdown signal received");
                    break;
                }
            }

            joined = join(&mut running) => {
                running = None;
                match joined {
                    Ok(builder) => idle = Some(builder),
                    Err(e) => {
                        crate::log!("error"; "rebuild task failed: {}", e);
                        break;
                    }
                }
                // Changes seen mid-build get their own full wait
                debouncer.restart();
            }

            event = events.recv(), if events_open => match event {
                Some(event) => debouncer.add(event),
                None => events_open = false,
            },

            _ = tokio::time::sleep(debouncer.sleep_duration()),
                if running.is_none() && debouncer.has_pending() =>
            {
                if let Some(changes) = debouncer.take_if_ready()
                    && let Some(mut builder) = idle.take()
                {
                    running = Some(tokio::task::spawn_blocking(move || {
                        builder.rebuild(&changes);
                        builder
                    }));
                }
            }
        }
    }
}

fn current_state(building: bool, debouncer: &Debouncer) -> DevState {
    if building {
        DevState::Building
    } else if debouncer.has_pending() {
        DevState::Debouncing
    } else {
        DevState::Idle
    }
}

fn shutdown_requested(rx: Option<&Receiver<()>>) -> bool {
    rx.is_some_and(|rx| rx.try_recv().is_ok()) || crate::core::is_shutdown()
}

/// Await the running build, or never resolve when there is none.
async fn join<R>(running: &mut Option<JoinHandle<R>>) -> Result<R, JoinError> {
    match running {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}
