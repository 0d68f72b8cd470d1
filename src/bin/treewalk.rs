use std::env;
use std::time::Duration;
use algoviz_dfs::clock::StepClock;
use algoviz_dfs::tree::{Bst, TraversalOrder, VisitObserver};
use rand::Rng;
use strum::IntoEnumIterator;

struct PrintVisits;

impl VisitObserver for PrintVisits {
    fn on_visit(&mut self, key: i64, step: usize) {
        println!("  visit #{}: {}", step, key);
    }
    fn on_done(&mut self, visits: usize) {
        println!("  done after {} visits", visits);
    }
}

struct Flags {
    keys: Option<Vec<i64>>,
    order: Option<TraversalOrder>,
    delay_ms: u64,
}

fn parse_order(s: &str) -> TraversalOrder {
    match s {
        "in" => TraversalOrder::InOrder,
        "pre" => TraversalOrder::PreOrder,
        "post" => TraversalOrder::PostOrder,
        "level" => TraversalOrder::LevelOrder,
        _ => panic!("Unknown order: {} (expected in, pre, post, or level)", s),
    }
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
        keys: None,
        order: None,
        delay_ms: 250,
    };
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--keys" => {
                let csv = iter.next().expect("--keys requires a comma-separated list");
                flags.keys = Some(
                    csv.split(',')
                        .map(|k| k.trim().parse::<i64>().expect("Invalid key"))
                        .collect(),
                );
            }
            "--order" => {
                flags.order = Some(parse_order(&iter.next().expect("--order requires a value")));
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
    let keys = flags.keys.unwrap_or_else(|| {
        let mut rng = rand::rng();
        (0..10).map(|_| rng.random_range(0..100)).collect()
    });
    let tree = Bst::from_keys(&keys);
    println!("keys: {:?} ({} distinct)", keys, tree.len());
    let clock = StepClock::new();
    match flags.order {
        Some(order) => {
            println!("{}:", order);
            tree.walk(order, &clock, delay, &mut PrintVisits);
        }
        None => {
            for order in TraversalOrder::iter() {
                println!("{}:", order);
                tree.walk(order, &clock, delay, &mut PrintVisits);
            }
        }
    }
    Ok(())
}
