use std::env;
use std::time::Duration;
use algoviz_dfs::clock::StepClock;
use algoviz_dfs::searching::{BinaryChop, LinearScan, ProbeObserver, ProbeOutcome, ProbeStats};
use rand::Rng;

struct PrintProbes;

impl ProbeObserver for PrintProbes {
    fn on_probe(&mut self, index: usize, value: i64, step: usize) {
        println!("  probe #{}: [{}] = {}", step, index, value);
    }
    fn on_found(&mut self, index: usize, probes: usize) {
        println!("  found at index {} after {} probes", index, probes);
    }
    fn on_missing(&mut self, probes: usize) {
        println!("  not present ({} probes)", probes);
    }
}

struct Flags {
    len: usize,
    target: Option<i64>,
    delay_ms: u64,
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
        len: 12,
        target: None,
        delay_ms: 250,
    };
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--len" => {
                flags.len = iter
                    .next()
                    .expect("--len requires a value")
                    .parse::<usize>()
                    .expect("Invalid value for --len. Must be an unsigned integer.");
            }
            "--target" => {
                flags.target = Some(
                    iter.next()
                        .expect("--target requires a value")
                        .parse::<i64>()
                        .expect("Invalid value for --target. Must be an integer."),
                );
            }
            "--delay_ms" => {
                flags.delay_ms = iter
                    .next()
                    .expect("--delay_ms requires a value")
                    .parse::<u64>()
                    .expect("Invalid value for --delay_ms. Must be an unsigned integer.");
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
    let delay = Duration::from_millis(flags.delay_ms);
    let mut rng = rand::rng();
    let mut items: Vec<i64> = (0..flags.len).map(|_| rng.random_range(0..100)).collect();
    items.sort();
    items.dedup();
    let target = flags
        .target
        .unwrap_or_else(|| items[rng.random_range(0..items.len())]);
    println!("items: {:?}", items);
    println!("target: {}", target);
    let clock = StepClock::new();

    println!("linear scan:");
    let mut stats = ProbeStats::new();
    LinearScan::new(&items, target).run(&clock, delay, &mut PrintProbes);
    LinearScan::new(&items, target).run(&clock, Duration::ZERO, &mut stats);
    report(stats.outcome());

    println!("binary chop:");
    let chop = BinaryChop::new(&items, target)?;
    let mut stats = ProbeStats::new();
    chop.run(&clock, delay, &mut PrintProbes);
    chop.run(&clock, Duration::ZERO, &mut stats);
    report(stats.outcome());
    Ok(())
}

fn report(outcome: Option<ProbeOutcome>) {
    match outcome {
        Some(ProbeOutcome::Found { index, probes }) => {
            println!("=> found at {} in {} probes", index, probes)
        }
        Some(ProbeOutcome::Missing { probes }) => println!("=> missing after {} probes", probes),
        Some(ProbeOutcome::Cancelled { probes }) => {
            println!("=> cancelled after {} probes", probes)
        }
        None => println!("=> no run"),
    }
}
