use std::time::Duration;
use std::{env, fs};
use algoviz_dfs::clock::StepClock;
use algoviz_dfs::engine::{BacktrackEngine, EngineState, RunConfig};
use algoviz_dfs::stats::SearchStats;
use algoviz_dfs::sudoku::{nine_standard_parse, HouseUniquenessChecker};
use algoviz_dfs::tui;

// A well-worn demo puzzle, used when no --puzzle file is given.
const DEFAULT_PUZZLE: &str = "53..7....\n\
                              6..195...\n\
                              .98....6.\n\
                              8...6...3\n\
                              4..8.3..1\n\
                              7...2...6\n\
                              .6....28.\n\
                              ...419..5\n\
                              ....8..79\n";

struct Flags {
    puzzle: Option<String>,
    delay_ms: u64,
    all: bool,
    interactive: bool,
}

fn parse_flags() -> Flags {
    let mut args = vec![];
    for arg in env::args().skip(1) {
        if let Some((x, y)) = arg.split_once("=") {
            args.push(x.to_string());
            args.push(y.to_string());
        } else {
            args.push(arg);
        }
    }
    let mut flags = Flags {
        puzzle: None,
        delay_ms: 0,
        all: false,
        interactive: false,
    };
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--puzzle" => {
                flags.puzzle = Some(iter.next().expect("--puzzle requires a filename"));
            }
            "--delay_ms" => {
                flags.delay_ms = iter
                    .next()
                    .expect("--delay_ms requires a value")
                    .parse::<u64>()
                    .expect("Invalid value for --delay_ms. Must be an unsigned integer.");
            }
            "--all" => flags.all = true,
            "--interactive" => flags.interactive = true,
            _ => panic!("Unknown flag: {}", arg),
        }
    }
    flags
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();
    let flags = parse_flags();
    let text = match &flags.puzzle {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_PUZZLE.to_string(),
    };
    let mut board = nine_standard_parse(&text)?;
    let config = RunConfig {
        step_delay: Duration::from_millis(flags.delay_ms),
        find_all: flags.all,
    };
    if flags.interactive {
        tui::run_interactive(&mut board, &HouseUniquenessChecker, config)?;
        return Ok(());
    }
    let mut stats = SearchStats::new();
    let clock = StepClock::new();
    let outcome = {
        let mut engine = BacktrackEngine::new(&mut board, &HouseUniquenessChecker, &mut stats, config);
        engine.run(&clock)?
    };
    println!(
        "{:?}: {} steps, {} backtracks, {} solutions",
        outcome,
        stats.steps(),
        stats.backtracks(),
        stats.solution_count()
    );
    match outcome {
        EngineState::Solved => print!("{}", board.serialize()),
        EngineState::Exhausted => {
            for (i, s) in stats.solutions().iter().enumerate() {
                println!("solution #{}:\n{}", i + 1, s.serialize());
            }
            if stats.solution_count() == 0 {
                println!("No solution exists for this puzzle.");
            }
        }
        _ => {}
    }
    Ok(())
}
