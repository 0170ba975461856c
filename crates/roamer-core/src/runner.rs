//! Supervised exploration loop.
//!
//! One worker thread owns all driver traffic. Control calls only change the
//! shared [`RunState`] and send a wake-up over a channel; the worker reads
//! the state between steps, so pause and stop take effect once the current
//! step completes. While paused the worker blocks on the channel, and the
//! inter-step sleep is a timed receive so control calls cut it short.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use roamer_driver::{Coverage, Driver};
use roamer_explore::{
    BreadthFirst, DepthFirst, Executor, RandomWalk, Replay, StepError, Strategy, StrategyKind,
};
use roamer_log::{ActionLogger, FileLogSink, LogError, LogSink, RunSummary};

use crate::config::{ConfigError, ExplorerConfig};
use crate::status::{RunState, RunStatus};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("cannot {action} while {state}")]
    InvalidState {
        action: &'static str,
        state: RunState,
    },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("action log error: {0}")]
    Log(#[from] LogError),

    #[error("failed to spawn the exploration worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Build the strategy named by `kind` from configuration.
pub fn build_strategy(kind: StrategyKind, config: &ExplorerConfig) -> Result<Strategy, RunnerError> {
    let strategy = match kind {
        StrategyKind::DepthFirst => Strategy::DepthFirst(DepthFirst::new()),
        StrategyKind::BreadthFirst => Strategy::BreadthFirst(BreadthFirst::new()),
        StrategyKind::Random => {
            Strategy::Random(RandomWalk::new(config.seed, config.dictionary.clone()))
        }
        StrategyKind::Replay => {
            let path = config.replay_log.as_ref().ok_or_else(|| {
                ConfigError::Invalid("replay strategy needs replay_log".to_string())
            })?;
            Strategy::Replay(Replay::open(path)?)
        }
    };
    Ok(strategy)
}

/// How one supervised step ended.
#[derive(Debug)]
enum StepOutcome {
    Acted,
    /// The strategy has nothing left to do.
    Exhausted,
    /// The step failed but the app was re-foregrounded.
    Recovered(StepError),
    Failed(StepError),
}

/// Everything the worker touches per step.
struct Engine {
    driver: Box<dyn Driver>,
    log: ActionLogger,
    strategy: Strategy,
    settle: Duration,
    torn_down: bool,
}

impl Engine {
    fn step(&mut self) -> StepOutcome {
        match self.try_step() {
            Ok(true) => StepOutcome::Acted,
            Ok(false) => StepOutcome::Exhausted,
            Err(err) if err.is_recoverable() => match self.driver.foreground() {
                Ok(()) => StepOutcome::Recovered(err),
                Err(fg) if fg.is_fatal() => StepOutcome::Failed(fg.into()),
                Err(fg) => {
                    tracing::warn!(error = %fg, "could not re-foreground the application");
                    StepOutcome::Recovered(err)
                }
            },
            Err(err) => StepOutcome::Failed(err),
        }
    }

    fn try_step(&mut self) -> Result<bool, StepError> {
        let candidates = self.driver.enumerate_candidates()?;
        let mut exec = Executor::new(self.driver.as_mut(), &mut self.log, self.settle);
        exec.begin_step(&candidates)?;
        let acted = self.strategy.test(&mut exec, &candidates);
        exec.end_step()?;
        acted
    }

    /// Append the summary, flush and end the driver session. Runs once.
    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        let coverage = self.driver.coverage();
        let summary = RunSummary {
            strategy: self.strategy.kind().display_name().to_string(),
            pages_visited: coverage.pages_visited,
            links_clicked: coverage.links_clicked,
            links_found: coverage.links_found,
            coverage: coverage.ratio(),
        };
        if let Err(err) = self.log.summary(&summary) {
            tracing::error!(error = %err, "failed to write the run summary");
        }
        self.driver.end_session();
        tracing::info!(
            actions = self.log.actions_logged(),
            coverage = summary.coverage,
            "exploration finished"
        );
    }
}

struct Control {
    state: RunState,
    interval: Duration,
    steps_executed: u64,
    coverage: Coverage,
    last_error: Option<String>,
    strategy: StrategyKind,
}

struct Shared {
    control: Mutex<Control>,
    engine: Mutex<Engine>,
}

impl Shared {
    fn state(&self) -> RunState {
        self.control.lock().unwrap().state
    }

    /// Run one step and fold its outcome into the control state. Returns
    /// whether the run may continue.
    fn supervised_step(&self) -> bool {
        let (outcome, coverage) = {
            let mut engine = self.engine.lock().unwrap();
            let outcome = engine.step();
            (outcome, engine.driver.coverage())
        };

        let mut control = self.control.lock().unwrap();
        control.coverage = coverage;
        match outcome {
            StepOutcome::Acted => {
                control.steps_executed += 1;
                tracing::debug!(step = control.steps_executed, "step complete");
                true
            }
            StepOutcome::Exhausted => {
                tracing::info!(strategy = %control.strategy, "no candidates remain to act on");
                control.state = RunState::Stopped;
                false
            }
            StepOutcome::Recovered(err) => {
                tracing::warn!(error = %err, "step failed, application re-foregrounded");
                control.last_error = Some(err.to_string());
                true
            }
            StepOutcome::Failed(err) => {
                tracing::error!(error = %err, "step failed, stopping");
                control.last_error = Some(err.to_string());
                control.state = RunState::Stopped;
                false
            }
        }
    }

    fn teardown(&self) {
        self.engine.lock().unwrap().teardown();
    }
}

/// Drives one exploration session.
///
/// Control calls may come from any thread holding a reference; `start`,
/// `stop`, `set_strategy` and `wait` need `&mut self` because they manage
/// the worker handle or replace the strategy.
pub struct Runner {
    shared: Arc<Shared>,
    config: ExplorerConfig,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
    worker: Option<JoinHandle<()>>,
}

impl Runner {
    /// The dictionary file, if configured, is loaded here.
    pub fn new(
        driver: Box<dyn Driver>,
        sink: Box<dyn LogSink>,
        mut config: ExplorerConfig,
    ) -> Result<Self, RunnerError> {
        config.resolve()?;
        config.validate()?;
        let strategy = build_strategy(config.strategy, &config)?;
        let engine = Engine {
            driver,
            log: ActionLogger::new(sink),
            strategy,
            settle: config.settle_delay(),
            torn_down: false,
        };
        let control = Control {
            state: RunState::Idle,
            interval: config.step_interval(),
            steps_executed: 0,
            coverage: Coverage::default(),
            last_error: None,
            strategy: config.strategy,
        };
        let (wake_tx, wake_rx) = channel::unbounded();
        Ok(Self {
            shared: Arc::new(Shared {
                control: Mutex::new(control),
                engine: Mutex::new(engine),
            }),
            config,
            wake_tx,
            wake_rx,
            worker: None,
        })
    }

    /// Log to a new numbered file under the configured log directory.
    pub fn with_file_log(driver: Box<dyn Driver>, config: ExplorerConfig) -> Result<Self, RunnerError> {
        let sink = FileLogSink::create(&config.log_dir, &config.log_prefix)?;
        Self::new(driver, Box::new(sink), config)
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn start(&mut self) -> Result<(), RunnerError> {
        self.transition("start", &[RunState::Idle], RunState::Running)?;

        let shared = Arc::clone(&self.shared);
        let wake = self.wake_rx.clone();
        let handle = thread::Builder::new()
            .name("roamer-explorer".to_string())
            .spawn(move || worker_loop(shared, wake));
        match handle {
            Ok(handle) => {
                self.worker = Some(handle);
                tracing::info!(strategy = %self.status().strategy, "exploration started");
                Ok(())
            }
            Err(err) => {
                self.shared.control.lock().unwrap().state = RunState::Idle;
                Err(RunnerError::Spawn(err))
            }
        }
    }

    pub fn pause(&self) -> Result<(), RunnerError> {
        self.transition("pause", &[RunState::Running], RunState::Paused)
    }

    pub fn resume(&self) -> Result<(), RunnerError> {
        self.transition("resume", &[RunState::Paused], RunState::Running)
    }

    /// Stop for good. Returns without waiting for an in-flight step; the
    /// worker tears the session down once that step completes.
    pub fn stop(&mut self) -> Result<(), RunnerError> {
        let previous = {
            let mut control = self.shared.control.lock().unwrap();
            std::mem::replace(&mut control.state, RunState::Stopped)
        };
        self.wake();
        match previous {
            RunState::Stopped => {}
            RunState::Idle => self.shared.teardown(),
            RunState::Running | RunState::Paused => {
                tracing::info!("stop requested");
            }
        }
        Ok(())
    }

    /// Takes effect from the next inter-step pause.
    pub fn set_step_interval(&self, interval: Duration) {
        self.shared.control.lock().unwrap().interval = interval;
        self.wake();
    }

    /// Replace the active strategy. Refused while running.
    pub fn set_strategy(&mut self, kind: StrategyKind) -> Result<(), RunnerError> {
        let state = self.shared.state();
        if state == RunState::Running {
            return Err(RunnerError::InvalidState {
                action: "switch strategy",
                state,
            });
        }
        let strategy = build_strategy(kind, &self.config)?;
        self.shared.engine.lock().unwrap().strategy = strategy;
        self.shared.control.lock().unwrap().strategy = kind;
        self.config.strategy = kind;
        tracing::info!(strategy = %kind, "strategy switched");
        Ok(())
    }

    /// Run one supervised step on the calling thread. Refused while the
    /// worker is running and once stopped.
    pub fn single_step(&self) -> Result<RunStatus, RunnerError> {
        let state = self.shared.state();
        if matches!(state, RunState::Running | RunState::Stopped) {
            return Err(RunnerError::InvalidState {
                action: "single-step",
                state,
            });
        }
        if !self.shared.supervised_step() {
            self.shared.teardown();
            // A paused worker must see the stop and exit.
            self.wake();
        }
        Ok(self.status())
    }

    pub fn status(&self) -> RunStatus {
        let control = self.shared.control.lock().unwrap();
        RunStatus {
            state: control.state,
            steps_executed: control.steps_executed,
            coverage: control.coverage,
            last_error: control.last_error.clone(),
            strategy: control.strategy,
        }
    }

    /// Block until the worker exits, then return the final status.
    pub fn wait(&mut self) -> RunStatus {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("exploration worker panicked");
                self.shared.control.lock().unwrap().state = RunState::Stopped;
            }
        }
        self.status()
    }

    fn transition(
        &self,
        action: &'static str,
        from: &[RunState],
        to: RunState,
    ) -> Result<(), RunnerError> {
        {
            let mut control = self.shared.control.lock().unwrap();
            if !from.contains(&control.state) {
                return Err(RunnerError::InvalidState {
                    action,
                    state: control.state,
                });
            }
            control.state = to;
        }
        tracing::debug!(action, state = %to, "runner state changed");
        self.wake();
        Ok(())
    }

    fn wake(&self) {
        // The runner holds a receiver, so the channel never disconnects.
        let _ = self.wake_tx.send(());
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        if let Some(handle) = self.worker.take() {
            self.shared.control.lock().unwrap().state = RunState::Stopped;
            self.wake();
            let _ = handle.join();
        }
    }
}

fn worker_loop(shared: Arc<Shared>, wake: Receiver<()>) {
    loop {
        while wake.try_recv().is_ok() {}

        let (state, interval) = {
            let control = shared.control.lock().unwrap();
            (control.state, control.interval)
        };
        match state {
            RunState::Running => {}
            RunState::Paused => {
                if wake.recv().is_err() {
                    break;
                }
                continue;
            }
            RunState::Idle | RunState::Stopped => break,
        }

        if !shared.supervised_step() {
            break;
        }

        match wake.recv_timeout(interval) {
            Ok(()) | Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    shared.teardown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use roamer_driver::{ScriptedDriver, ScriptedPage};
    use roamer_log::MemoryLogSink;

    fn quick_config() -> ExplorerConfig {
        ExplorerConfig {
            step_interval_ms: 1,
            settle_delay_ms: 0,
            ..ExplorerConfig::default()
        }
    }

    fn runner() -> Runner {
        let driver = ScriptedDriver::new(
            "home",
            vec![ScriptedPage::new("home").link_to("A", "a"), ScriptedPage::new("a")],
        );
        Runner::new(Box::new(driver), Box::new(MemoryLogSink::new()), quick_config()).unwrap()
    }

    #[test]
    fn test_state_machine_rejects_bad_transitions() {
        let mut runner = runner();
        assert!(matches!(
            runner.pause(),
            Err(RunnerError::InvalidState { state: RunState::Idle, .. })
        ));
        assert!(runner.resume().is_err());
        runner.stop().unwrap();
        assert_eq!(runner.status().state, RunState::Stopped);
        assert!(runner.start().is_err());
        assert!(runner.single_step().is_err());
        // Stopping twice is harmless.
        runner.stop().unwrap();
    }

    #[test]
    fn test_strategy_switch_while_idle() {
        let mut runner = runner();
        runner.set_strategy(StrategyKind::BreadthFirst).unwrap();
        assert_eq!(runner.status().strategy, StrategyKind::BreadthFirst);
        assert!(matches!(
            runner.set_strategy(StrategyKind::Replay),
            Err(RunnerError::Config(_))
        ));
        assert_eq!(runner.status().strategy, StrategyKind::BreadthFirst);
    }

    #[test]
    fn test_single_step_counts_steps() {
        let runner = runner();
        let status = runner.single_step().unwrap();
        assert_eq!(status.state, RunState::Idle);
        assert_eq!(status.steps_executed, 1);
        assert_eq!(status.coverage.links_found, 1);
    }

    #[test]
    fn test_replay_without_log_is_rejected() {
        let config = ExplorerConfig {
            strategy: StrategyKind::Replay,
            ..quick_config()
        };
        let driver = ScriptedDriver::new("home", vec![ScriptedPage::new("home")]);
        assert!(matches!(
            Runner::new(Box::new(driver), Box::new(MemoryLogSink::new()), config),
            Err(RunnerError::Config(_))
        ));
    }
}
