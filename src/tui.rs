use std::{io, sync::Mutex};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use ratatui::{
    layout::{Direction, Layout, Rect},
    style::Stylize,
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Paragraph},
    DefaultTerminal, Frame,
};
use strum::EnumCount;
use crate::constraint::ConflictChecker;
use crate::core::{Board, Index};
use crate::debug::NullObserver;
use crate::engine::{BacktrackEngine, EngineState, RunConfig, StepOutcome};

lazy_static::lazy_static! {
    static ref DEBUG_TEXT: Mutex<Option<String>> = Mutex::new(None);
}

/// Surface a one-line note in the TUI header (next frame onwards).
pub fn tui_debug(s: String) {
    let mut lock = DEBUG_TEXT.lock().unwrap();
    *lock = Some(s);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Err(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pane {
    Grid,
    TextArea,
}

#[derive(Debug, Clone, PartialEq, Eq, IntoPrimitive, TryFromPrimitive, strum_macros::EnumCount)]
#[repr(u8)]
pub enum Mode {
    Readme = 1,
    Conflicts,
    Stack,
    Stats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TuiEvent {
    Ignore,
    PaneSwitch,
    ModeUpdate,
    Step,
    FastForward,
    Reset,
    Exit,
}

const FAST_FORWARD_STEPS: usize = 100;

pub struct TuiState<'a, B: Board, C: ConflictChecker<B>> {
    engine: BacktrackEngine<'a, B, C>,
    grid_pos: Index,
    scroll_pos: usize,
    mode: Mode,
    active: Pane,
    exit: Option<Status>,
}

impl<'a, B: Board, C: ConflictChecker<B>> TuiState<'a, B, C> {
    fn new(engine: BacktrackEngine<'a, B, C>) -> Self {
        Self {
            engine,
            grid_pos: [0, 0],
            scroll_pos: 0,
            mode: Mode::Readme,
            active: Pane::Grid,
            exit: None,
        }
    }

    fn step(&mut self) {
        if self.engine.is_done() {
            return;
        }
        if let Err(e) = self.engine.step() {
            self.exit = Some(Status::Err(format!("{}", e)));
        }
    }

    fn fast_forward(&mut self) {
        for _ in 0..FAST_FORWARD_STEPS {
            if self.engine.is_done() || self.exit.is_some() {
                break;
            }
            self.step();
        }
        tui_debug(format!("fast-forwarded to step {}", self.engine.steps()));
    }

    fn reset(&mut self) {
        self.engine.reset();
        if let Err(e) = self.engine.start() {
            self.exit = Some(Status::Err(format!("{}", e)));
        }
    }
}

/// Drive a board interactively: single-step the engine under keyboard
/// control while the grid, conflict set, stack, and counters render live.
pub fn run_interactive<B: Board, C: ConflictChecker<B>>(
    board: &mut B,
    checker: &C,
    config: RunConfig,
) -> io::Result<()> {
    let mut observer = NullObserver;
    let mut engine = BacktrackEngine::new(board, checker, &mut observer, config);
    engine
        .start()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("{}", e)))?;
    let mut terminal = ratatui::init();
    let mut state = TuiState::new(engine);
    let result = tui_run(&mut state, &mut terminal);
    ratatui::restore();
    result
}

fn tui_run<B: Board, C: ConflictChecker<B>>(
    state: &mut TuiState<'_, B, C>,
    terminal: &mut DefaultTerminal,
) -> io::Result<()> {
    while state.exit.is_none() {
        terminal.draw(|frame| {
            let (grid_area, text_area) = tui_chrome(state, frame);
            draw_grid(state, frame, grid_area);
            draw_text_area(state, frame, text_area);
        })?;
        match tui_handle_events(state)? {
            TuiEvent::Step => state.step(),
            TuiEvent::FastForward => state.fast_forward(),
            TuiEvent::Reset => state.reset(),
            TuiEvent::ModeUpdate => state.scroll_pos = 0,
            _ => {}
        }
    }
    match state.exit.clone().unwrap() {
        Status::Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        Status::Ok => Ok(()),
    }
}

fn state_span(state: EngineState) -> Span<'static> {
    match state {
        EngineState::Idle => "Idle".gray(),
        EngineState::Running(_) => "Running".green(),
        EngineState::Solved => "Solved".blue(),
        EngineState::Exhausted => "Exhausted".magenta(),
        EngineState::Cancelled => "Cancelled".red(),
    }
}

fn tui_chrome<B: Board, C: ConflictChecker<B>>(
    state: &TuiState<'_, B, C>,
    frame: &mut Frame,
) -> (Rect, Rect) {
    let size = frame.area();
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            ratatui::layout::Constraint::Length(4),
            ratatui::layout::Constraint::Min(0),
            ratatui::layout::Constraint::Length(1),
        ])
        .split(size);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            ratatui::layout::Constraint::Min(25),
            ratatui::layout::Constraint::Min(25),
        ])
        .split(vertical[1]);
    let title = Line::from(" Backtracking Debugger ".bold());
    let block = Block::bordered().title(title.centered()).border_set(border::PLAIN);
    let mut first_line = vec![
        "State: ".into(),
        state_span(state.engine.state()),
        " Steps: ".into(),
        state.engine.steps().to_string().yellow(),
        " Backtracks: ".into(),
        state.engine.backtracks().to_string().yellow(),
        " Solutions: ".into(),
        state.engine.solutions().to_string().yellow(),
        " Mode: ".into(),
        format!("{:?}", state.mode).yellow(),
    ];
    {
        let lock = DEBUG_TEXT.lock().unwrap();
        if let Some(dt) = lock.as_ref() {
            first_line.push(" -- ".into());
            first_line.push(dt.clone().magenta());
        }
    }
    let second_line = match state.engine.last_outcome() {
        Some(StepOutcome::Rejected) => Line::from(vec![
            "Rejected: ".red(),
            format!("{:?}", state.engine.most_recent_action()).cyan(),
            format!(" conflicts {:?}", state.engine.last_conflicts()).cyan(),
        ]),
        Some(outcome) => Line::from(vec![
            format!("{:?}: ", outcome).green(),
            format!("{:?}", state.engine.most_recent_action()).cyan(),
        ]),
        None => Line::from(""),
    };
    frame.render_widget(
        Paragraph::new(Text::from(vec![Line::from(first_line), second_line]))
            .centered()
            .block(block),
        vertical[0],
    );
    let instructions = Line::from(vec![
        " Move ".into(),
        "W/A/S/D".blue().bold(),
        " Step ".into(),
        "N".blue().bold(),
        " Fast ".into(),
        "F".blue().bold(),
        " Panes ".into(),
        "Space".blue().bold(),
        " Modes ".into(),
        "Tab".blue().bold(),
        " Reset ".into(),
        "Ctrl+R".blue().bold(),
        " Quit ".into(),
        "Ctrl+C ".blue().bold(),
    ]);
    frame.render_widget(Paragraph::new(instructions).centered(), vertical[2]);
    (horizontal[0], horizontal[1])
}

fn draw_grid<B: Board, C: ConflictChecker<B>>(
    state: &TuiState<'_, B, C>,
    frame: &mut Frame,
    area: Rect,
) {
    let engine = &state.engine;
    let board = engine.board();
    let action_cell = engine.most_recent_action().map(|(i, _)| i);
    let mut lines = Vec::new();
    for r in 0..board.rows() {
        let mut spans: Vec<Span> = Vec::new();
        for c in 0..board.cols() {
            let cell = [r, c];
            let text = match board.get(cell) {
                Some(v) => format!("{} ", v),
                None => ". ".to_string(),
            };
            let mut span: Span = if board.is_given(cell) {
                text.bold()
            } else if engine.last_conflicts().contains(&cell) {
                text.red()
            } else if action_cell == Some(cell) {
                text.yellow()
            } else {
                text.into()
            };
            if state.active == Pane::Grid && state.grid_pos == cell {
                span = span.reversed();
            }
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }
    let block = Block::bordered().border_set(border::PLAIN);
    frame.render_widget(Paragraph::new(Text::from(lines)).block(block), area);
}

fn draw_text_area<B: Board, C: ConflictChecker<B>>(
    state: &TuiState<'_, B, C>,
    frame: &mut Frame,
    area: Rect,
) {
    let engine = &state.engine;
    let lines: Vec<String> = match state.mode {
        Mode::Readme => vec![
            "Single-step a backtracking run.".to_string(),
            String::new(),
            "n steps once; each step is one of:".to_string(),
            "  try / place / reject / backtrack".to_string(),
            "f fast-forwards; Ctrl+R restarts.".to_string(),
            "Tab cycles the views on this pane.".to_string(),
        ],
        Mode::Conflicts => {
            let mut v = vec![format!("last action: {:?}", engine.most_recent_action())];
            if engine.last_conflicts().is_empty() {
                v.push("no conflicts".to_string());
            } else {
                for c in engine.last_conflicts() {
                    v.push(format!("conflicts with {:?}", c));
                }
            }
            v
        }
        Mode::Stack => engine
            .stack()
            .iter()
            .map(|f| {
                let (at, value) = f.chosen().expect("placed frame");
                format!("{:?} = {} ({} untried)", at, value, f.remaining())
            })
            .collect(),
        Mode::Stats => vec![
            format!("steps: {}", engine.steps()),
            format!("backtracks: {}", engine.backtracks()),
            format!("solutions: {}", engine.solutions()),
            format!("depth: {}", engine.stack().len()),
            format!(
                "filled: {}/{}",
                engine.board().filled(),
                engine.board().rows() * engine.board().cols()
            ),
        ],
    };
    let text: Vec<Line> = lines
        .into_iter()
        .skip(state.scroll_pos)
        .map(Line::from)
        .collect();
    let block = Block::bordered().border_set(border::PLAIN);
    frame.render_widget(Paragraph::new(Text::from(text)).block(block), area);
}

fn tui_handle_events<B: Board, C: ConflictChecker<B>>(
    state: &mut TuiState<'_, B, C>,
) -> io::Result<TuiEvent> {
    Ok(match event::read()? {
        Event::Key(key_event) if key_event.kind == KeyEventKind::Press => match key_event.code {
            KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                state.exit = Some(Status::Ok);
                TuiEvent::Exit
            }
            KeyCode::Char('r') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                TuiEvent::Reset
            }
            KeyCode::Tab => {
                let mut m: u8 = state.mode.clone().into();
                m = if m == Mode::COUNT as u8 { 1 } else { m + 1 };
                state.mode = m.try_into().unwrap();
                TuiEvent::ModeUpdate
            }
            KeyCode::BackTab => {
                let mut m: u8 = state.mode.clone().into();
                m = if m == 1 { Mode::COUNT as u8 } else { m - 1 };
                state.mode = m.try_into().unwrap();
                TuiEvent::ModeUpdate
            }
            KeyCode::Char('n') => TuiEvent::Step,
            KeyCode::Char('f') => TuiEvent::FastForward,
            KeyCode::Char(' ') => {
                state.active = match state.active {
                    Pane::Grid => Pane::TextArea,
                    Pane::TextArea => Pane::Grid,
                };
                TuiEvent::PaneSwitch
            }
            code => on_pane_key(state, code, key_event),
        },
        _ => TuiEvent::Ignore,
    })
}

fn on_pane_key<B: Board, C: ConflictChecker<B>>(
    state: &mut TuiState<'_, B, C>,
    code: KeyCode,
    _key_event: KeyEvent,
) -> TuiEvent {
    match state.active {
        Pane::Grid => {
            let rows = state.engine.board().rows();
            let cols = state.engine.board().cols();
            match code {
                KeyCode::Char('w') if state.grid_pos[0] > 0 => state.grid_pos[0] -= 1,
                KeyCode::Char('s') if state.grid_pos[0] + 1 < rows => state.grid_pos[0] += 1,
                KeyCode::Char('a') if state.grid_pos[1] > 0 => state.grid_pos[1] -= 1,
                KeyCode::Char('d') if state.grid_pos[1] + 1 < cols => state.grid_pos[1] += 1,
                _ => return TuiEvent::Ignore,
            }
        }
        Pane::TextArea => match code {
            KeyCode::Char('w') if state.scroll_pos > 0 => state.scroll_pos -= 1,
            KeyCode::Char('s') => state.scroll_pos += 1,
            _ => return TuiEvent::Ignore,
        },
    }
    TuiEvent::Ignore
}
