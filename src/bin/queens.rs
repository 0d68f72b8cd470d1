use std::env;
use std::time::Duration;
use algoviz_dfs::clock::StepClock;
use algoviz_dfs::debug::{DbgObserver, Sample};
use algoviz_dfs::engine::{BacktrackEngine, RunConfig};
use algoviz_dfs::queens::{QueenAttackChecker, QueensBoard, KNOWN_SOLUTION_COUNTS};
use algoviz_dfs::tui;

struct Flags {
    n: usize,
    delay_ms: u64,
    all: bool,
    interactive: bool,
    chart: Option<String>,
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
        n: 8,
        delay_ms: 0,
        all: false,
        interactive: false,
        chart: None,
    };
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--n" => {
                flags.n = iter
                    .next()
                    .expect("--n requires a value")
                    .parse::<usize>()
                    .expect("Invalid value for --n. Must be an unsigned integer.");
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
            "--chart" => {
                flags.chart = Some(iter.next().expect("--chart requires a filename"));
            }
            _ => panic!("Unknown flag: {}", arg),
        }
    }
    flags
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();
    let flags = parse_flags();
    let config = RunConfig {
        step_delay: Duration::from_millis(flags.delay_ms),
        find_all: flags.all,
    };
    let mut board = QueensBoard::new(flags.n);
    if flags.interactive {
        tui::run_interactive(&mut board, &QueenAttackChecker, config)?;
        return Ok(());
    }
    let mut dbg = DbgObserver::new();
    if flags.delay_ms > 0 {
        dbg.sample_print(Sample::every_n(1));
    } else {
        dbg.sample_print(Sample::every_n(10_000));
    }
    if let Some(chart) = &flags.chart {
        dbg.sample_stats(chart.clone(), Sample::at_end());
    }
    let clock = StepClock::new();
    if flags.delay_ms > 0 {
        // A paced run can take a while; let Enter abort it mid-search.
        let token = clock.token();
        std::thread::spawn(move || {
            let mut line = String::new();
            let _ = std::io::stdin().read_line(&mut line);
            token.cancel();
        });
        println!("Press Enter to cancel the run.");
    }
    let outcome = {
        let mut engine = BacktrackEngine::new(&mut board, &QueenAttackChecker, &mut dbg, config);
        let outcome = engine.run(&clock)?;
        println!(
            "{:?}: {} steps, {} backtracks, {} solutions",
            outcome,
            engine.steps(),
            engine.backtracks(),
            engine.solutions()
        );
        outcome
    };
    if flags.all {
        if let Some(expected) = KNOWN_SOLUTION_COUNTS.get(&flags.n) {
            println!("(known total for n={}: {})", flags.n, expected);
        }
    } else if outcome == algoviz_dfs::engine::EngineState::Solved {
        print!("{}", board.serialize());
    }
    Ok(())
}
