use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use plotters::chart::ChartBuilder;
use plotters::coord::Shift;
use plotters::prelude::{
    BitMapBackend, Circle, DrawResult, DrawingArea, DrawingBackend, IntoDrawingArea,
    IntoSegmentedCoord, MultiLineText, Rectangle, SegmentValue,
};
use plotters::style::{Color, IntoFont, BLUE, RED, WHITE};
use rand::distr::{Bernoulli, Distribution};
use rand::rngs::ThreadRng;
use crate::core::{Board, Index};
use crate::engine::SearchObserver;
use crate::searching::ProbeObserver;
use crate::tree::VisitObserver;

/// Observer that ignores everything. Useful when a driver only wants the
/// engine's own accessors.
pub struct NullObserver;

impl<B: Board> SearchObserver<B> for NullObserver {}
impl ProbeObserver for NullObserver {}
impl VisitObserver for NullObserver {}

enum TimerState {
    Init,
    Running(SystemTime),
    Ended(Duration),
}

impl TimerState {
    fn start(&mut self) {
        if let TimerState::Init = self {
            *self = TimerState::Running(SystemTime::now());
        }
    }

    fn end(&mut self) {
        if let TimerState::Running(s) = self {
            *self = TimerState::Ended(
                SystemTime::now()
                    .duration_since(*s)
                    .unwrap_or(Duration::ZERO),
            );
        }
    }

    fn to_duration(&self) -> Duration {
        match self {
            TimerState::Init => Duration::ZERO,
            TimerState::Running(s) => SystemTime::now()
                .duration_since(*s)
                .unwrap_or(Duration::ZERO),
            TimerState::Ended(d) => *d,
        }
    }
}

enum SampleState {
    Never,
    AtEnd,
    EveryN(usize, usize),
    Probability(Bernoulli, ThreadRng),
    Time(Duration, SystemTime),
}

/// When to act on a stream of ticks: never, only at the end of the run,
/// every n-th tick, with a fixed probability per tick, or at most once per
/// time interval.
pub struct Sample {
    state: SampleState,
}

impl Sample {
    pub fn never() -> Self {
        Self {
            state: SampleState::Never,
        }
    }

    pub fn at_end() -> Self {
        Self {
            state: SampleState::AtEnd,
        }
    }

    pub fn every_n(n: usize) -> Self {
        Self {
            state: SampleState::EveryN(n, 0),
        }
    }

    pub fn probability(p: f64) -> Self {
        Self {
            state: SampleState::Probability(Bernoulli::new(p).unwrap(), rand::rng()),
        }
    }

    pub fn time(every: Duration) -> Self {
        Self {
            state: SampleState::Time(every, SystemTime::now()),
        }
    }

    pub fn sample(&mut self, done: bool) -> bool {
        match &mut self.state {
            SampleState::Never => false,
            SampleState::AtEnd => done,
            SampleState::EveryN(n, count) => {
                *count += 1;
                if count >= n || done {
                    *count = 0;
                    true
                } else {
                    false
                }
            }
            SampleState::Probability(d, rng) => d.sample(rng) || done,
            SampleState::Time(duration, last) => {
                let now = SystemTime::now();
                let elapsed = now.duration_since(*last).unwrap_or(Duration::ZERO);
                if elapsed >= *duration || done {
                    *last = now;
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Summary of an observed value distribution, for the stats figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub value_counts: HashMap<usize, usize>,
    pub count: usize,
    pub max: usize,
    pub max_count: usize,
    pub mean: f64,
    pub median: f64,
}

impl Histogram {
    pub fn from_value_counts(value_counts: &HashMap<usize, usize>) -> Self {
        let mut pairs: Vec<(usize, usize)> = value_counts.iter().map(|(v, c)| (*v, *c)).collect();
        pairs.sort();
        let count: usize = pairs.iter().map(|(_, c)| c).sum();
        let total: usize = pairs.iter().map(|(v, c)| v * c).sum();
        let max = pairs.iter().map(|(v, _)| *v).max().unwrap_or(0);
        let max_count = pairs.iter().map(|(_, c)| *c).max().unwrap_or(0);
        let mean = if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        };
        let median = if count == 0 {
            0.0
        } else {
            let lo_rank = (count - 1) / 2;
            let hi_rank = count / 2;
            let mut lo = None;
            let mut hi = None;
            let mut n = 0;
            for (v, c) in &pairs {
                let next = n + c;
                if lo.is_none() && lo_rank < next {
                    lo = Some(*v);
                }
                if hi.is_none() && hi_rank < next {
                    hi = Some(*v);
                }
                n = next;
            }
            (lo.unwrap_or(0) + hi.unwrap_or(0)) as f64 / 2.0
        };
        Histogram {
            value_counts: value_counts.clone(),
            count,
            max,
            max_count,
            mean,
            median,
        }
    }
}

fn bar_chart<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    hist: &Histogram,
    bar_margin: u32,
) -> DrawResult<(), DB> {
    let mut chart_builder = ChartBuilder::on(area);
    chart_builder.margin(5).set_left_and_bottom_label_area_size(20);
    let mut chart = chart_builder.build_cartesian_2d(
        (0..hist.max as i32).into_segmented(),
        0..hist.max_count as i32,
    )?;
    chart.configure_mesh().draw()?;
    chart.draw_series(hist.value_counts.iter().map(|(v, c)| {
        let x0 = SegmentValue::Exact(*v as i32);
        let x1 = SegmentValue::Exact((*v + 1) as i32);
        let mut bar = Rectangle::new([(x0, 0), (x1, *c as i32)], BLUE.filled());
        bar.set_margin(0, 0, bar_margin, bar_margin);
        bar
    }))?;
    Ok(())
}

fn ccdf<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, hist: &Histogram) -> DrawResult<(), DB> {
    let mut pairs: Vec<(usize, usize)> = hist.value_counts.iter().map(|(v, c)| (*v, *c)).collect();
    pairs.sort();
    let mut points = Vec::new();
    let mut cumulative = 0;
    for &(v, c) in pairs.iter().rev() {
        cumulative += c;
        points.push((v, cumulative as f64 / hist.count.max(1) as f64));
    }
    points.reverse();
    let mut chart_builder = ChartBuilder::on(area);
    chart_builder.margin(5).set_left_and_bottom_label_area_size(20);
    let mut chart = chart_builder.build_cartesian_2d(0..hist.max as i32, 0.0..1.0)?;
    chart.configure_mesh().draw()?;
    chart.draw_series(
        points
            .into_iter()
            .map(|(x, y)| Circle::new((x as i32, y), 3, RED.filled())),
    )?;
    Ok(())
}

/// Debugging observer for batch runs: tallies the event stream, prints a
/// sampled progress line, and can render the collected histograms to a PNG.
pub struct DbgObserver {
    timer: TimerState,
    print_sample: Sample,
    stat: Option<(String, Sample)>,
    trials: usize,
    rejects: usize,
    places: usize,
    backtracks: usize,
    solutions: usize,
    done: bool,
    place_streak: usize,
    backtrack_streak: usize,
    place_streak_hist: HashMap<usize, usize>,
    backtrack_streak_hist: HashMap<usize, usize>,
    depth_hist: HashMap<usize, usize>,
    solution_gap_hist: HashMap<usize, usize>,
    last_solution_step: usize,
    depth: usize,
    last: String,
}

impl DbgObserver {
    pub fn new() -> Self {
        DbgObserver {
            timer: TimerState::Init,
            print_sample: Sample::every_n(1),
            stat: None,
            trials: 0,
            rejects: 0,
            places: 0,
            backtracks: 0,
            solutions: 0,
            done: false,
            place_streak: 0,
            backtrack_streak: 0,
            place_streak_hist: HashMap::new(),
            backtrack_streak_hist: HashMap::new(),
            depth_hist: HashMap::new(),
            solution_gap_hist: HashMap::new(),
            last_solution_step: 0,
            depth: 0,
            last: String::new(),
        }
    }

    pub fn sample_print(&mut self, sample: Sample) -> &mut Self {
        self.print_sample = sample;
        self
    }

    pub fn sample_stats<S: Into<String>>(&mut self, filename: S, sample: Sample) -> &mut Self {
        self.stat = Some((filename.into(), sample));
        self
    }

    pub fn trials(&self) -> usize {
        self.trials
    }

    pub fn solutions(&self) -> usize {
        self.solutions
    }

    pub fn elapsed(&self) -> Duration {
        self.timer.to_duration()
    }

    fn print(&self) {
        println!(
            "[{:>8.3}s] trials={} rejects={} places={} backtracks={} solutions={} depth={} :: {}",
            self.timer.to_duration().as_secs_f64(),
            self.trials,
            self.rejects,
            self.places,
            self.backtracks,
            self.solutions,
            self.depth,
            self.last,
        );
    }

    fn tick(&mut self) {
        if self.print_sample.sample(self.done) {
            self.print();
        }
        if let Some((f, s)) = &mut self.stat {
            let filename = f.clone();
            if s.sample(self.done) {
                self.dump_stats(&filename)
                    .unwrap_or_else(|e| eprintln!("Failed to dump stats: {}", e));
            }
        }
    }

    fn close_place_streak(&mut self) {
        if self.place_streak > 0 {
            *self.place_streak_hist.entry(self.place_streak).or_default() += 1;
            self.place_streak = 0;
        }
    }

    fn close_backtrack_streak(&mut self) {
        if self.backtrack_streak > 0 {
            *self
                .backtrack_streak_hist
                .entry(self.backtrack_streak)
                .or_default() += 1;
            self.backtrack_streak = 0;
        }
    }

    fn stats_figure<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> DrawResult<(), DB> {
        area.fill(&WHITE)?;
        let (top, bottom) = area.split_vertically(50);
        let mut caption = MultiLineText::<_, String>::new((15, 15), ("sans-serif", 24).into_font());
        caption.push_line(format!(
            "Trials: {}; Backtracks: {}; Solutions: {}; Seconds: {:.3}",
            self.trials,
            self.backtracks,
            self.solutions,
            self.timer.to_duration().as_secs_f64(),
        ));
        top.draw(&caption)?;
        let areas = bottom.split_evenly((2, 2));
        for (i, title, counts) in [
            (0, "Placement streaks", &self.place_streak_hist),
            (1, "Backtrack streaks", &self.backtrack_streak_hist),
            (2, "Steps at depth", &self.depth_hist),
            (3, "Trials between solutions", &self.solution_gap_hist),
        ] {
            let hist = Histogram::from_value_counts(counts);
            let (upper, lower) = areas[i].split_vertically(areas[i].relative_to_height(0.18));
            let mut sub = MultiLineText::<_, String>::new((5, 5), ("sans-serif", 14).into_font());
            sub.push_line(title);
            sub.push_line(format!(
                "mean = {:.3}, med = {:.1}, max = {}",
                hist.mean, hist.median, hist.max,
            ));
            upper.draw(&sub)?;
            let (left, right) = lower.split_horizontally(lower.relative_to_width(0.5));
            bar_chart(&left, &hist, 1)?;
            ccdf(&right, &hist)?;
        }
        Ok(())
    }

    /// Render the histogram figure to a PNG file.
    pub fn dump_stats(&self, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
        let area = BitMapBackend::new(filename, (800, 700)).into_drawing_area();
        self.stats_figure(&area)
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
    }
}

impl Default for DbgObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Board> SearchObserver<B> for DbgObserver {
    fn on_step(&mut self, at: Index, value: B::Value, step: usize) {
        self.timer.start();
        self.trials = step;
        *self.depth_hist.entry(self.depth).or_default() += 1;
        self.last = format!("try {} at {:?}", value, at);
        self.tick();
    }

    fn on_conflict(&mut self, _at: Index, _value: B::Value, conflicts: &[Index]) {
        if !conflicts.is_empty() {
            self.rejects += 1;
        }
    }

    fn on_place(&mut self, at: Index, value: B::Value) {
        self.places += 1;
        self.depth += 1;
        self.place_streak += 1;
        self.close_backtrack_streak();
        self.last = format!("place {} at {:?}", value, at);
    }

    fn on_backtrack(&mut self, at: Index, value: B::Value, backtracks: usize) {
        self.backtracks = backtracks;
        self.depth = self.depth.saturating_sub(1);
        self.backtrack_streak += 1;
        self.close_place_streak();
        self.last = format!("undo {} at {:?}", value, at);
    }

    fn on_solution(&mut self, snapshot: &B) {
        self.solutions += 1;
        *self
            .solution_gap_hist
            .entry(self.trials - self.last_solution_step)
            .or_default() += 1;
        self.last_solution_step = self.trials;
        self.last = format!("solution #{}\n{:?}", self.solutions, snapshot);
    }

    fn on_exhausted(&mut self) {
        self.timer.end();
        self.done = true;
        self.last = "exhausted".to_string();
        self.tick();
    }

    fn on_cancelled(&mut self) {
        self.timer.end();
        self.done = true;
        self.last = "cancelled".to_string();
        self.tick();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn to_counter(vals: Vec<usize>) -> HashMap<usize, usize> {
        let mut counter = HashMap::new();
        for v in vals {
            *counter.entry(v).or_default() += 1;
        }
        counter
    }

    #[test]
    fn test_histogram_stats() {
        let hist = Histogram::from_value_counts(&to_counter(vec![2, 2, 3, 4, 4]));
        assert_eq!(hist.count, 5);
        assert_eq!(hist.max, 4);
        assert_eq!(hist.max_count, 2);
        assert_eq!(hist.mean, 3.0);
        assert_eq!(hist.median, 3.0);
        let hist = Histogram::from_value_counts(&to_counter(vec![2, 3, 3, 4, 4, 4]));
        assert_eq!(hist.median, 3.5);
        let hist = Histogram::from_value_counts(&HashMap::new());
        assert_eq!(hist.count, 0);
        assert_eq!(hist.mean, 0.0);
    }

    #[test]
    fn test_sample_every_n() {
        let mut s = Sample::every_n(3);
        let fired: Vec<bool> = (0..6).map(|_| s.sample(false)).collect();
        assert_eq!(fired, vec![false, false, true, false, false, true]);
        assert!(s.sample(true), "always fires at the end");
    }

    #[test]
    fn test_sample_never_and_at_end() {
        let mut never = Sample::never();
        assert!(!never.sample(false));
        assert!(!never.sample(true));
        let mut at_end = Sample::at_end();
        assert!(!at_end.sample(false));
        assert!(at_end.sample(true));
    }

    #[test]
    fn test_dbg_observer_tallies() {
        use crate::core::test_util::OneDim;
        let mut dbg = DbgObserver::new();
        dbg.sample_print(Sample::never());
        let o: &mut dyn SearchObserver<OneDim<3, 3>> = &mut dbg;
        o.on_step([0, 0], 1, 1);
        o.on_conflict([0, 0], 1, &[]);
        o.on_place([0, 0], 1);
        o.on_step([0, 1], 1, 2);
        o.on_conflict([0, 1], 1, &[[0, 0]]);
        o.on_backtrack([0, 0], 1, 1);
        o.on_exhausted();
        assert_eq!(dbg.trials(), 2);
        assert_eq!(dbg.rejects, 1);
        assert_eq!(dbg.places, 1);
        assert_eq!(dbg.backtracks, 1);
        assert!(dbg.done);
    }
}
