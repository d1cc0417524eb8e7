use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_channel::mpsc;
use panel_protocol::{ControlError, DimCycle, PanelCommand};
use panel_runtime::{actor_debug, Actor, DimmerMessage};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::constants::dim;

struct SweepHandle {
    flag: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// DimmerActor drives the brightness sweep clock
///
/// Responsibilities:
/// - Run one triangular wave over brightness 0..=100 while a sweep is active
/// - Write each level into the shared cell, then ring the dispatch mailbox
/// - Start at most one sweep; repeated starts are ignored
///
/// The actor holds no fixture or preset knowledge. The level cell always
/// holds the newest brightness, so however many wake-ups pile up behind a
/// slow send, the dispatcher only ever transmits the latest level; the
/// dispatcher likewise resolves pulses against the active sweep target, so
/// a pulse racing a stop is dropped there, not here.
pub struct DimmerActor {
    dispatch_tx: mpsc::Sender<PanelCommand>,
    level_tx: Arc<watch::Sender<u8>>,
    sweep: Option<SweepHandle>,
}

impl DimmerActor {
    pub fn new(dispatch_tx: mpsc::Sender<PanelCommand>, level_tx: watch::Sender<u8>) -> Self {
        Self {
            dispatch_tx,
            level_tx: Arc::new(level_tx),
            sweep: None,
        }
    }

    fn start_sweep(&mut self) {
        if self.sweep.is_some() {
            actor_debug!("Sweep already running; start ignored");
            return;
        }

        let flag = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&flag);
        let mut dispatch_tx = self.dispatch_tx.clone();
        let level_tx = Arc::clone(&self.level_tx);
        let task = tokio::spawn(async move {
            let mut cycle = DimCycle::new();
            loop {
                tokio::time::sleep(Duration::from_millis(dim::TICK_MS)).await;
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                cycle = cycle.advance(dim::STEP);
                // The level must be in place before the wake-up that
                // announces it
                let _ = level_tx.send(cycle.brightness);
                // A pulse lost to a full mailbox is replaced by the next tick
                let _ = dispatch_tx.try_send(PanelCommand::DimPulse);
            }
        });
        self.sweep = Some(SweepHandle { flag, task });
        actor_debug!("Sweep started");
    }

    fn stop_sweep(&mut self) {
        if let Some(sweep) = self.sweep.take() {
            // The flag covers a tick already past its sleep when the abort
            // lands
            sweep.flag.store(true, Ordering::SeqCst);
            sweep.task.abort();
            actor_debug!("Sweep stopped");
        }
    }
}

impl Actor for DimmerActor {
    type Message = DimmerMessage;

    fn name(&self) -> &'static str {
        "DimmerActor"
    }

    async fn handle(&mut self, msg: DimmerMessage) -> Result<(), ControlError> {
        match msg {
            DimmerMessage::Start => self.start_sweep(),
            DimmerMessage::Stop => self.stop_sweep(),
        }
        Ok(())
    }

    async fn shutdown(&mut self) {
        self.stop_sweep();
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn create_test_actor() -> (
        DimmerActor,
        mpsc::Receiver<PanelCommand>,
        watch::Receiver<u8>,
    ) {
        let (dispatch_tx, dispatch_rx) = mpsc::channel(100);
        let (level_tx, level_rx) = watch::channel(0);
        (DimmerActor::new(dispatch_tx, level_tx), dispatch_rx, level_rx)
    }

    fn drain_pulses(dispatch_rx: &mut mpsc::Receiver<PanelCommand>) -> usize {
        let mut pulses = 0;
        while let Ok(Some(cmd)) = dispatch_rx.try_next() {
            match cmd {
                PanelCommand::DimPulse => pulses += 1,
                _ => panic!("Wrong command"),
            }
        }
        pulses
    }

    #[tokio::test]
    async fn test_sweep_falls_from_full_brightness() {
        let (mut actor, mut dispatch_rx, level_rx) = create_test_actor();

        actor.handle(DimmerMessage::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        actor.handle(DimmerMessage::Stop).await.unwrap();

        // Each tick steps down 5 and rings once, so the cell must hold
        // exactly the level the last wake-up announced
        let pulses = drain_pulses(&mut dispatch_rx);
        assert!(pulses >= 2, "expected pulses, got {pulses}");
        assert_eq!(*level_rx.borrow(), 100 - 5 * pulses as u8);
    }

    #[tokio::test]
    async fn test_second_start_does_not_stack_sweeps() {
        let (mut actor, mut dispatch_rx, level_rx) = create_test_actor();

        actor.handle(DimmerMessage::Start).await.unwrap();
        actor.handle(DimmerMessage::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;
        actor.handle(DimmerMessage::Stop).await.unwrap();

        // Stacked sweeps would ring twice per step and the count would
        // outrun the single wave's level
        let pulses = drain_pulses(&mut dispatch_rx);
        assert!(pulses >= 2, "expected pulses, got {pulses}");
        assert_eq!(*level_rx.borrow(), 100 - 5 * pulses as u8);
    }

    #[tokio::test]
    async fn test_stop_halts_pulses() {
        let (mut actor, mut dispatch_rx, _level_rx) = create_test_actor();

        actor.handle(DimmerMessage::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        actor.handle(DimmerMessage::Stop).await.unwrap();

        drain_pulses(&mut dispatch_rx);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(drain_pulses(&mut dispatch_rx), 0);
    }

    #[tokio::test]
    async fn test_stop_without_sweep_is_quiet() {
        let (mut actor, mut dispatch_rx, _level_rx) = create_test_actor();

        actor.handle(DimmerMessage::Stop).await.unwrap();

        assert!(actor.sweep.is_none());
        assert_eq!(drain_pulses(&mut dispatch_rx), 0);
    }

    #[tokio::test]
    async fn test_shutdown_stops_sweep() {
        let (mut actor, mut dispatch_rx, _level_rx) = create_test_actor();

        actor.handle(DimmerMessage::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        actor.shutdown().await;

        drain_pulses(&mut dispatch_rx);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(drain_pulses(&mut dispatch_rx), 0);
        assert!(actor.sweep.is_none());
    }
}
