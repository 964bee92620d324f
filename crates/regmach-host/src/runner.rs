//! Timed runs
//!
//! Drives [`ExecutionEngine::tick`] from a tokio interval so that a run can be
//! watched step by step. A stop request is observed before the next tick and
//! never interrupts an instruction.

use std::time::Duration;

use log::info;
use regmach_core::{EngineResult, ExecutionEngine, Program, RunStatus};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::time::{interval, MissedTickBehavior};

/// Sending half of a stop channel
#[derive(Debug, Clone)]
pub struct StopSignal {
    sx: Sender<()>,
}

impl StopSignal {
    /// Request cancellation; repeated requests collapse into one
    pub fn stop(&self) {
        let _ = self.sx.try_send(());
    }
}

/// Receiving half of a stop channel, handed to [`run_timed`]
#[derive(Debug)]
pub struct StopListener {
    rx: Receiver<()>,
}

impl StopListener {
    fn discard_pending(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}

pub fn stop_channel() -> (StopSignal, StopListener) {
    let (sx, rx) = mpsc::channel(1);
    (StopSignal { sx }, StopListener { rx })
}

/// Run `engine` with one instruction per `period` until it halts, exhausts
/// its step budget or is stopped.
///
/// A zero period runs back to back, yielding to the scheduler between steps.
/// Validation errors from `fallback` are returned before anything executes.
/// Stop requests sent while no run was active are discarded.
pub async fn run_timed(
    engine: &mut ExecutionEngine,
    period: Duration,
    fallback: Option<&Program>,
    stop: &mut StopListener,
) -> EngineResult<RunStatus> {
    stop.discard_pending();
    engine.start_run(fallback)?;

    if period.is_zero() {
        loop {
            if stop.rx.try_recv().is_ok() {
                return Ok(cancel(engine));
            }
            let status = engine.tick();
            if status != RunStatus::Continue {
                return Ok(finish(engine, status));
            }
            tokio::task::yield_now().await;
        }
    }

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            Some(()) = stop.rx.recv() => {
                return Ok(cancel(engine));
            }
            _ = ticker.tick() => {
                let status = engine.tick();
                if status != RunStatus::Continue {
                    return Ok(finish(engine, status));
                }
            }
        }
    }
}

fn cancel(engine: &mut ExecutionEngine) -> RunStatus {
    engine.stop();
    finish(engine, RunStatus::Stopped)
}

fn finish(engine: &ExecutionEngine, status: RunStatus) -> RunStatus {
    info!(
        "timed run ended: {} after {} step(s)",
        status,
        engine.steps_executed()
    );
    status
}
