use std::time::Duration;
use crate::clock::{StepClock, WaitOutcome};
use crate::constraint::ConflictChecker;
use crate::core::{Board, Branch, Error, Index};

/// Event surface consumed by the presentation layer (and by the passive
/// statistics). All methods default to no-ops so an observer only implements
/// what it cares about.
///
/// Events arrive in strict program order: a mutation always happens before
/// the event describing it, and the event describing a pending trial is
/// emitted before the pause that lets it display. `on_solution` hands out a
/// borrow of the live board; the board will be mutated further if the search
/// continues, so anyone archiving the solution must clone it then.
pub trait SearchObserver<B: Board> {
    fn on_step(&mut self, at: Index, value: B::Value, step: usize) {
        let _ = (at, value, step);
    }
    fn on_conflict(&mut self, at: Index, value: B::Value, conflicts: &[Index]) {
        let _ = (at, value, conflicts);
    }
    fn on_place(&mut self, at: Index, value: B::Value) {
        let _ = (at, value);
    }
    fn on_backtrack(&mut self, at: Index, value: B::Value, backtracks: usize) {
        let _ = (at, value, backtracks);
    }
    fn on_solution(&mut self, snapshot: &B) {
        let _ = snapshot;
    }
    fn on_exhausted(&mut self) {}
    fn on_cancelled(&mut self) {}
}

/// Fan-out to a boxed list of observers, in list order.
pub struct ObserverList<B: Board> {
    observers: Vec<Box<dyn SearchObserver<B>>>,
}

impl<B: Board> ObserverList<B> {
    pub fn new(observers: Vec<Box<dyn SearchObserver<B>>>) -> Self {
        ObserverList { observers }
    }
}

impl<B: Board> SearchObserver<B> for ObserverList<B> {
    fn on_step(&mut self, at: Index, value: B::Value, step: usize) {
        for o in &mut self.observers {
            o.on_step(at, value, step);
        }
    }
    fn on_conflict(&mut self, at: Index, value: B::Value, conflicts: &[Index]) {
        for o in &mut self.observers {
            o.on_conflict(at, value, conflicts);
        }
    }
    fn on_place(&mut self, at: Index, value: B::Value) {
        for o in &mut self.observers {
            o.on_place(at, value);
        }
    }
    fn on_backtrack(&mut self, at: Index, value: B::Value, backtracks: usize) {
        for o in &mut self.observers {
            o.on_backtrack(at, value, backtracks);
        }
    }
    fn on_solution(&mut self, snapshot: &B) {
        for o in &mut self.observers {
            o.on_solution(snapshot);
        }
    }
    fn on_exhausted(&mut self) {
        for o in &mut self.observers {
            o.on_exhausted();
        }
    }
    fn on_cancelled(&mut self) {
        for o in &mut self.observers {
            o.on_cancelled();
        }
    }
}

/// One decision on the search stack: a branch plus a cursor into its
/// candidates. Frames on the stack are placed; the engine's working frame
/// (the one currently being tried) is not.
#[derive(Debug, Clone)]
pub struct Frame<V> {
    branch: Branch<V>,
    choice: usize,
}

impl<V: Copy> Frame<V> {
    fn new(branch: Branch<V>) -> Self {
        Frame { branch, choice: 0 }
    }

    pub fn chosen(&self) -> Option<(Index, V)> {
        match &self.branch {
            Branch::Complete => None,
            Branch::Cell(i, vs) => vs.get(self.choice).map(|v| (*i, *v)),
            Branch::Value(v, cs) => cs.get(self.choice).map(|c| (*c, *v)),
        }
    }

    pub fn remaining(&self) -> usize {
        self.branch.width().saturating_sub(self.choice + 1)
    }

    fn advance(&mut self) -> bool {
        self.choice += 1;
        self.chosen().is_some()
    }
}

/// What happens while the engine is running: picking and announcing the next
/// candidate, validating it, or undoing placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Trying,
    Deciding,
    Backtracking,
}

/// Engine lifecycle. Solved, Exhausted, and Cancelled are terminal; only an
/// explicit reset returns the engine to Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Running(RunPhase),
    Solved,
    Exhausted,
    Cancelled,
}

/// What a single step did. One step covers exactly one suspension segment:
/// the run loop pauses on the clock between steps, a half pause after a
/// rejection and a full pause otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Tried,
    Placed,
    Rejected,
    Deadend,
    Backtracked,
    Solution,
    Finished,
}

#[derive(Debug, Clone, Copy)]
pub struct RunConfig {
    /// Pause between visualized steps. Zero runs flat out (and is what the
    /// tests use: the step/backtrack trace is identical, just unpaced).
    pub step_delay: Duration,
    /// Keep searching past a solution, treating it as a dead end, until the
    /// whole space is exhausted.
    pub find_all: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            step_delay: Duration::ZERO,
            find_all: false,
        }
    }
}

const ALREADY_RUNNING: Error = Error::new_const("Engine is already running");
const NEEDS_RESET: Error = Error::new_const("Run finished; reset before starting again");
const NOT_STARTED: Error = Error::new_const("Must call start() before stepping");

/// Depth-first backtracking engine over a Board, reporting every trial,
/// conflict, placement, backtrack, and solution to its observer. The engine
/// owns the board mutably for the duration of a run and mutates it in place;
/// callers drive it either with `run` (clock-paced, cancellable) or by hand
/// with `start`/`step` (how the interactive frontend does it).
pub struct BacktrackEngine<'a, B: Board, C: ConflictChecker<B>> {
    board: &'a mut B,
    checker: &'a C,
    observer: &'a mut dyn SearchObserver<B>,
    config: RunConfig,
    state: EngineState,
    stack: Vec<Frame<B::Value>>,
    cursor: Option<Frame<B::Value>>,
    steps: usize,
    backtracks: usize,
    solutions: usize,
    last_action: Option<(Index, B::Value)>,
    last_conflicts: Vec<Index>,
    last_outcome: Option<StepOutcome>,
}

impl<'a, B: Board, C: ConflictChecker<B>> BacktrackEngine<'a, B, C> {
    pub fn new(
        board: &'a mut B,
        checker: &'a C,
        observer: &'a mut dyn SearchObserver<B>,
        config: RunConfig,
    ) -> Self {
        BacktrackEngine {
            board,
            checker,
            observer,
            config,
            state: EngineState::Idle,
            stack: Vec::new(),
            cursor: None,
            steps: 0,
            backtracks: 0,
            solutions: 0,
            last_action: None,
            last_conflicts: Vec::new(),
            last_outcome: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, EngineState::Running(_))
    }

    pub fn is_done(&self) -> bool {
        matches!(
            self.state,
            EngineState::Solved | EngineState::Exhausted | EngineState::Cancelled
        )
    }

    /// Trial attempts so far. Increments on every candidate announcement,
    /// valid or not; monotone within a run.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Undo count so far; monotone within a run.
    pub fn backtracks(&self) -> usize {
        self.backtracks
    }

    pub fn solutions(&self) -> usize {
        self.solutions
    }

    pub fn board(&self) -> &B {
        self.board
    }

    /// The placed decisions, bottom of the search first.
    pub fn stack(&self) -> &[Frame<B::Value>] {
        &self.stack
    }

    pub fn most_recent_action(&self) -> Option<(Index, B::Value)> {
        self.last_action
    }

    /// Conflict set from the most recent validation. Recomputed fresh at
    /// every trial; kept only for display.
    pub fn last_conflicts(&self) -> &[Index] {
        &self.last_conflicts
    }

    pub fn last_outcome(&self) -> Option<StepOutcome> {
        self.last_outcome
    }

    /// Validate the board and enter the running state. Errors synchronously
    /// on a malformed initial configuration, if already running, or if a
    /// finished run has not been reset.
    pub fn start(&mut self) -> Result<(), Error> {
        match self.state {
            EngineState::Idle => {}
            EngineState::Running(_) => return Err(ALREADY_RUNNING),
            _ => return Err(NEEDS_RESET),
        }
        self.board.validate()?;
        log::info!(
            "starting {}x{} search, find_all={}",
            self.board.rows(),
            self.board.cols(),
            self.config.find_all
        );
        self.state = EngineState::Running(RunPhase::Trying);
        Ok(())
    }

    /// Perform one suspension segment. Callers pacing the search pause
    /// between calls; see `run`.
    pub fn step(&mut self) -> Result<StepOutcome, Error> {
        let phase = match self.state {
            EngineState::Idle => return Err(NOT_STARTED),
            EngineState::Running(p) => p,
            _ => return Err(NEEDS_RESET),
        };
        let outcome = match phase {
            RunPhase::Trying => self.try_next()?,
            RunPhase::Deciding => self.decide()?,
            RunPhase::Backtracking => self.unwind()?,
        };
        self.last_outcome = Some(outcome);
        Ok(outcome)
    }

    fn try_next(&mut self) -> Result<StepOutcome, Error> {
        if self.cursor.is_none() {
            match self.board.next_branch() {
                Branch::Complete => {
                    self.solutions += 1;
                    self.observer.on_solution(&*self.board);
                    if self.config.find_all {
                        // Deliberate: a found solution is treated as a dead
                        // end so the search keeps going. Exhaustive
                        // enumeration depends on this.
                        self.state = EngineState::Running(RunPhase::Backtracking);
                    } else {
                        log::debug!(
                            "solved after {} steps, {} backtracks",
                            self.steps,
                            self.backtracks
                        );
                        self.state = EngineState::Solved;
                    }
                    return Ok(StepOutcome::Solution);
                }
                branch => {
                    if branch.width() == 0 {
                        // An open position with nothing to try.
                        self.state = EngineState::Running(RunPhase::Backtracking);
                        return Ok(StepOutcome::Deadend);
                    }
                    self.cursor = Some(Frame::new(branch));
                }
            }
        }
        let (at, value) = self.cursor.as_ref().unwrap().chosen().unwrap();
        self.steps += 1;
        self.last_action = Some((at, value));
        self.observer.on_step(at, value, self.steps);
        self.state = EngineState::Running(RunPhase::Deciding);
        Ok(StepOutcome::Tried)
    }

    fn decide(&mut self) -> Result<StepOutcome, Error> {
        let (at, value) = self.cursor.as_ref().unwrap().chosen().unwrap();
        self.last_conflicts = self.checker.conflicts(self.board, at, value);
        self.observer.on_conflict(at, value, &self.last_conflicts);
        if self.last_conflicts.is_empty() {
            self.board.apply(at, value)?;
            let frame = self.cursor.take().unwrap();
            self.stack.push(frame);
            self.observer.on_place(at, value);
            self.state = EngineState::Running(RunPhase::Trying);
            Ok(StepOutcome::Placed)
        } else {
            if self.cursor.as_mut().unwrap().advance() {
                self.state = EngineState::Running(RunPhase::Trying);
            } else {
                self.cursor = None;
                self.state = EngineState::Running(RunPhase::Backtracking);
            }
            Ok(StepOutcome::Rejected)
        }
    }

    fn unwind(&mut self) -> Result<StepOutcome, Error> {
        let mut frame = match self.stack.pop() {
            None => {
                log::debug!(
                    "exhausted after {} steps, {} backtracks, {} solutions",
                    self.steps,
                    self.backtracks,
                    self.solutions
                );
                self.state = EngineState::Exhausted;
                self.observer.on_exhausted();
                return Ok(StepOutcome::Finished);
            }
            Some(f) => f,
        };
        let (at, value) = frame.chosen().unwrap();
        self.board.undo(at, value)?;
        self.backtracks += 1;
        self.last_action = Some((at, value));
        self.observer.on_backtrack(at, value, self.backtracks);
        if frame.advance() {
            self.cursor = Some(frame);
            self.state = EngineState::Running(RunPhase::Trying);
        }
        Ok(StepOutcome::Backtracked)
    }

    /// Drive the search to a terminal state, pausing on the clock between
    /// segments. Cancellation is checked at the top of every iteration and
    /// again after every wait; once observed, the engine parks in Cancelled,
    /// emits a single on_cancelled, and touches nothing else.
    pub fn run(&mut self, clock: &StepClock) -> Result<EngineState, Error> {
        self.start()?;
        loop {
            if clock.is_cancelled() {
                return Ok(self.park_cancelled());
            }
            let outcome = self.step()?;
            if self.is_done() {
                return Ok(self.state);
            }
            let delay = match outcome {
                StepOutcome::Rejected => self.config.step_delay / 2,
                _ => self.config.step_delay,
            };
            if let WaitOutcome::Cancelled = clock.wait(delay) {
                return Ok(self.park_cancelled());
            }
        }
    }

    fn park_cancelled(&mut self) -> EngineState {
        self.state = EngineState::Cancelled;
        self.observer.on_cancelled();
        self.state
    }

    /// Return to Idle: board back to its givens, counters zeroed, stack
    /// cleared. Resetting the clock (if one was cancelled) is the caller's
    /// job, since the engine does not own it.
    pub fn reset(&mut self) {
        self.board.reset();
        self.stack.clear();
        self.cursor = None;
        self.steps = 0;
        self.backtracks = 0;
        self.solutions = 0;
        self.last_action = None;
        self.last_conflicts.clear();
        self.last_outcome = None;
        self.state = EngineState::Idle;
    }
}

/// Solve to the first solution with no pacing, returning a snapshot of the
/// solved board (or None if the space is exhausted).
pub fn find_first<B: Board, C: ConflictChecker<B>>(
    board: &mut B,
    checker: &C,
    observer: &mut dyn SearchObserver<B>,
) -> Result<Option<B>, Error> {
    let mut engine = BacktrackEngine::new(board, checker, observer, RunConfig::default());
    let clock = StepClock::new();
    match engine.run(&clock)? {
        EngineState::Solved => Ok(Some(engine.board().clone())),
        _ => Ok(None),
    }
}

/// Exhaust the whole space with no pacing; returns (steps, solutions).
/// Solutions themselves are only visible through the observer, since the
/// board is unwound past each one.
pub fn find_all<B: Board, C: ConflictChecker<B>>(
    board: &mut B,
    checker: &C,
    observer: &mut dyn SearchObserver<B>,
) -> Result<(usize, usize), Error> {
    let mut engine = BacktrackEngine::new(
        board,
        checker,
        observer,
        RunConfig {
            step_delay: Duration::ZERO,
            find_all: true,
        },
    );
    let clock = StepClock::new();
    engine.run(&clock)?;
    Ok((engine.steps(), engine.solutions()))
}
