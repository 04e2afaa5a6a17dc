//! The one context allowed to issue game commands.
//!
//! Accepted actions are queued on an unbounded channel and drained by a
//! single worker task in arrival order, so at most one pointer motion or
//! menu command is ever in flight. Shutdown aborts the worker without
//! waiting for a motion to finish.

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use rand::{rngs::StdRng, Rng, SeedableRng};
use telemetry_bridge_core::dispatch::attack_command;
use telemetry_bridge_core::motion::{click_point_in, MotionPath};
use telemetry_bridge_core::{GameHost, InputDriver, NpcView, ScreenPoint, TargetSelector};
use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

use crate::config::SharedConfig;
use crate::types::ActionCommand;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ActionRequest {
    pub(crate) request_id: Uuid,
    pub(crate) command: ActionCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExecutorClosed;

impl fmt::Display for ExecutorClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("command executor is not running")
    }
}

impl std::error::Error for ExecutorClosed {}

/// Cheap, cloneable submission side of the queue.
#[derive(Debug, Clone)]
pub(crate) struct ExecutorHandle {
    tx: mpsc::UnboundedSender<ActionRequest>,
    pending: Arc<AtomicUsize>,
}

impl ExecutorHandle {
    /// Queues `command` and returns its request id without waiting for it to run.
    pub(crate) fn submit(&self, command: ActionCommand) -> Result<Uuid, ExecutorClosed> {
        let request = ActionRequest {
            request_id: Uuid::new_v4(),
            command,
        };
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(request).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(ExecutorClosed);
        }
        Ok(request.request_id)
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// A handle whose worker is already gone.
    #[cfg(test)]
    pub(crate) fn closed() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self {
            tx,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }
}

pub(crate) struct CommandExecutor {
    handle: ExecutorHandle,
    worker: JoinHandle<()>,
}

impl CommandExecutor {
    pub(crate) fn spawn(
        host: Arc<dyn GameHost>,
        input: Option<Arc<dyn InputDriver>>,
        config: SharedConfig,
        rng: StdRng,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker = CommandWorker {
            rx,
            host,
            input,
            config,
            rng,
            pending: Arc::clone(&pending),
        };

        Self {
            handle: ExecutorHandle { tx, pending },
            worker: tokio::spawn(worker.run()),
        }
    }

    pub(crate) fn handle(&self) -> ExecutorHandle {
        self.handle.clone()
    }

    /// Stops the worker immediately; queued and in-flight commands are dropped.
    pub(crate) fn shutdown(&self) {
        self.worker.abort();
    }
}

struct CommandWorker {
    rx: mpsc::UnboundedReceiver<ActionRequest>,
    host: Arc<dyn GameHost>,
    input: Option<Arc<dyn InputDriver>>,
    config: SharedConfig,
    rng: StdRng,
    pending: Arc<AtomicUsize>,
}

impl CommandWorker {
    async fn run(mut self) {
        while let Some(request) = self.rx.recv().await {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            self.execute(request).await;
        }
        tracing::debug!("command queue closed; worker exiting");
    }

    async fn execute(&mut self, request: ActionRequest) {
        let request_id = request.request_id;
        let Some(target) = self.resolve_target(&request) else {
            tracing::debug!(
                request_id = %request_id,
                kind = %request.command.kind,
                target_id = ?request.command.target_id,
                "no qualifying target; action skipped"
            );
            return;
        };

        match self.plan_click(&target) {
            Ok((input, point)) => {
                tracing::debug!(
                    request_id = %request_id,
                    npc_index = target.index,
                    x = point.x,
                    y = point.y,
                    "moving pointer to target"
                );
                self.move_and_click(input, point).await;
            }
            Err(reason) => {
                let command = attack_command(&target);
                tracing::debug!(
                    request_id = %request_id,
                    npc_index = target.index,
                    option = %command.option,
                    "{reason}; dispatching attack directly"
                );
                self.host.menu_action(command);
            }
        }
    }

    fn resolve_target(&mut self, request: &ActionRequest) -> Option<NpcView> {
        if !self.host.is_logged_in() {
            return None;
        }
        let origin = self.host.local_player()?.position?;
        let npcs = self.host.npcs();
        let selector = TargetSelector::new(self.config.snapshot().scan_policy());
        selector
            .select(&origin, &npcs, request.command.target_id, &mut self.rng)
            .cloned()
    }

    /// Screen point to click, or why the pointer path cannot be used.
    fn plan_click(
        &mut self,
        target: &NpcView,
    ) -> Result<(Arc<dyn InputDriver>, ScreenPoint), &'static str> {
        let input = self.input.clone().ok_or("no input driver")?;
        let bounds = self
            .host
            .npc_screen_bounds(target.index)
            .ok_or("target has no screen hull")?;
        let canvas = self
            .host
            .canvas_origin()
            .ok_or("canvas location unavailable")?;
        let point = click_point_in(&bounds, &mut self.rng);
        Ok((input, point.offset(canvas.x, canvas.y)))
    }

    async fn move_and_click(&mut self, input: Arc<dyn InputDriver>, target: ScreenPoint) {
        let Some(start) = input.pointer_position() else {
            tracing::debug!("pointer position unavailable; motion abandoned");
            return;
        };

        let mut path = MotionPath::new(start, target, StdRng::seed_from_u64(self.rng.gen()));
        for step in path.by_ref() {
            input.move_pointer(step.point);
            tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
        }

        let click = path.finish();
        input.move_pointer(click.settle);
        tokio::time::sleep(Duration::from_millis(click.settle_delay_ms)).await;
        input.press_primary();
        tokio::time::sleep(Duration::from_millis(click.hold_ms)).await;
        input.release_primary();
    }
}

#[cfg(test)]
mod tests {
    use telemetry_bridge_core::sim::SimulatedWorld;
    use telemetry_bridge_core::{NpcOption, Position};

    use super::*;
    use crate::config::BridgeConfig;
    use crate::types::ActionKind;

    fn world_with_target() -> (Arc<SimulatedWorld>, u32) {
        let world = Arc::new(SimulatedWorld::new(Position::new(100, 100, 0), 4));
        let index = world.spawn_npc(3024, Some("Scorpion"), Position::new(101, 100, 0), 5);
        (world, index)
    }

    fn spawn(world: &Arc<SimulatedWorld>, with_input: bool) -> CommandExecutor {
        let input = with_input.then(|| world.clone() as Arc<dyn InputDriver>);
        CommandExecutor::spawn(
            world.clone(),
            input,
            SharedConfig::new(BridgeConfig::default()),
            StdRng::seed_from_u64(8),
        )
    }

    fn attack(target_id: Option<i32>) -> ActionCommand {
        ActionCommand {
            kind: ActionKind::Attack,
            target_id,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn pointer_path_clicks_inside_hull() {
        let (world, index) = world_with_target();
        let executor = spawn(&world, true);

        executor.handle().submit(attack(None)).unwrap();
        settle().await;

        assert_eq!(world.presses().len(), 1);
        assert_eq!(world.npc_hp(index), Some(4));
        assert!(world.menu_log().is_empty());
        assert_eq!(executor.handle().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_hull_falls_back_to_menu() {
        let (world, index) = world_with_target();
        world.set_hulls_visible(false);
        let executor = spawn(&world, true);

        executor.handle().submit(attack(None)).unwrap();
        settle().await;

        let log = world.menu_log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].npc_index, index);
        assert_eq!(log[0].option, NpcOption::Second);
        assert!(world.presses().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn no_input_driver_falls_back_to_menu() {
        let (world, _) = world_with_target();
        let executor = spawn(&world, false);

        executor.handle().submit(attack(None)).unwrap();
        settle().await;

        assert_eq!(world.menu_log().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_canvas_falls_back_to_menu() {
        let (world, _) = world_with_target();
        world.set_canvas_origin(None);
        let executor = spawn(&world, true);

        executor.handle().submit(attack(None)).unwrap();
        settle().await;

        assert_eq!(world.menu_log().len(), 1);
        assert!(world.presses().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn logged_out_or_unknown_id_is_a_no_op() {
        let (world, _) = world_with_target();
        let executor = spawn(&world, true);

        executor.handle().submit(attack(Some(1))).unwrap();
        settle().await;
        world.set_logged_in(false);
        executor.handle().submit(attack(None)).unwrap();
        settle().await;

        assert!(world.menu_log().is_empty());
        assert!(world.presses().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn commands_run_in_arrival_order() {
        let world = Arc::new(SimulatedWorld::new(Position::new(0, 0, 0), 4));
        let far = world.spawn_npc(11, Some("Scorpion"), Position::new(0, 40, 0), 5);
        let near = world.spawn_npc(22, Some("Scorpion"), Position::new(1, 0, 0), 5);
        world.set_hulls_visible(false);
        let executor = spawn(&world, true);
        let handle = executor.handle();

        handle.submit(attack(Some(11))).unwrap();
        handle.submit(attack(Some(22))).unwrap();
        handle.submit(attack(Some(11))).unwrap();
        settle().await;

        let order: Vec<u32> = world.menu_log().iter().map(|c| c.npc_index).collect();
        assert_eq!(order, vec![far, near, far]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_abandons_in_flight_motion() {
        let (world, index) = world_with_target();
        let executor = spawn(&world, true);
        let handle = executor.handle();

        handle.submit(attack(None)).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        executor.shutdown();
        settle().await;

        assert!(world.presses().is_empty());
        assert_eq!(world.npc_hp(index), Some(5));
        assert_eq!(handle.submit(attack(None)), Err(ExecutorClosed));
    }
}
