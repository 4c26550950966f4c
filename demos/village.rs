//! Electrification demo on a generated village map.
//!
//! Two depots on the west side power houses scattered east of a river.
//! Prints the resulting route network as ASCII and a per-house summary.
//!
//! Run: cargo run --bin village [link|exclusive|count] [seed]

use rand::{RngExt, SeedableRng};
use wayfield_core::{Field, Point};
use wayfield_seek::{PathPolicy, SeekConfig, SeekResult, WeightFill, seek};

const WIDTH: i32 = 40;
const HEIGHT: i32 = 16;
const HOUSES: usize = 6;

fn main() {
    let mut args = std::env::args().skip(1);
    let policy: PathPolicy = match args.next() {
        Some(s) => match s.parse() {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => PathPolicy::Link,
    };
    let seed: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(42);

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    // Terrain: open ground, marsh patches, one road, one river. The river
    // is unsurveyed (NaN) except where the road bridges it.
    let mut weights = Field::new(WIDTH, HEIGHT, 1.0);
    for _ in 0..80 {
        let p = Point::new(rng.random_range(0..WIDTH), rng.random_range(0..HEIGHT));
        weights.set(p, 3.0);
    }
    let road_y = HEIGHT / 2;
    for x in 0..WIDTH {
        weights.set(Point::new(x, road_y), 0.5);
    }
    let river_x = WIDTH / 3;
    for y in 0..HEIGHT {
        if y != road_y {
            weights.set(Point::new(river_x, y), f64::NAN);
        }
    }

    let mut origins = Field::new(WIDTH, HEIGHT, 0.0);
    origins.set(Point::new(1, 2), 1.0);
    origins.set(Point::new(2, HEIGHT - 3), 1.0);

    // Houses east of the river, never in the water.
    let mut targets = Field::new(WIDTH, HEIGHT, 0.0);
    let mut placed = 0;
    while placed < HOUSES {
        let p = Point::new(
            rng.random_range(river_x + 1..WIDTH),
            rng.random_range(0..HEIGHT),
        );
        if targets.at(p) == Some(0.0) && weights.at(p).is_some_and(|w| !w.is_nan()) {
            targets.set(p, 1.0);
            placed += 1;
        }
    }

    let config = SeekConfig {
        path_handling: policy,
        fill: WeightFill::Impassable,
        film: true,
        film_every: 8,
        ..SeekConfig::default()
    };

    let result = match seek(&origins, &targets, &weights, &config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    render(&origins, &targets, &weights, &result, policy);
    println!();
    render_distance(&result.distance);
    summarize(policy, &result);
}

/// Draw the map: depots `O`, houses `X` (`?` if unreached), routes `+`
/// or their label digit, river `~`, marsh `"`, road `=`.
fn render(
    origins: &Field<f64>,
    targets: &Field<f64>,
    weights: &Field<f64>,
    result: &SeekResult,
    policy: PathPolicy,
) {
    for y in 0..HEIGHT {
        let mut line = String::with_capacity(WIDTH as usize);
        for x in 0..WIDTH {
            let p = Point::new(x, y);
            let w = weights.at(p).unwrap_or(f64::NAN);
            let marked = result.paths.at(p).unwrap_or(0);
            let ch = if origins.at(p) != Some(0.0) {
                'O'
            } else if targets.at(p) != Some(0.0) {
                if result.unreached.contains(&p) { '?' } else { 'X' }
            } else if marked > 0 {
                match policy {
                    PathPolicy::Link => '+',
                    _ => char::from_digit(marked.min(9), 10).unwrap_or('#'),
                }
            } else if w.is_nan() {
                '~'
            } else if w >= 3.0 {
                '"'
            } else if w <= 0.5 {
                '='
            } else {
                '.'
            };
            line.push(ch);
        }
        println!("{line}");
    }
}

/// Draw the distance field bucketed into digits 0-9, `~` where no route
/// from a depot exists.
fn render_distance(distance: &Field<f64>) {
    let max = distance
        .values()
        .iter()
        .copied()
        .filter(|d| d.is_finite())
        .fold(0.0_f64, f64::max);
    for y in 0..HEIGHT {
        let mut line = String::with_capacity(WIDTH as usize);
        for x in 0..WIDTH {
            let d = distance.at(Point::new(x, y)).unwrap_or(f64::INFINITY);
            let ch = if !d.is_finite() {
                '~'
            } else if max == 0.0 {
                '0'
            } else {
                char::from_digit(((d / max) * 9.0).round() as u32, 10).unwrap_or('9')
            };
            line.push(ch);
        }
        println!("{line}");
    }
}

fn summarize(policy: PathPolicy, result: &SeekResult) {
    println!();
    println!("policy: {policy}");
    for route in &result.routes {
        println!(
            "house {} <- depot {}: cost {:.1}, {} cells",
            route.target,
            route.origin,
            route.cost,
            route.cells.len()
        );
    }
    for &t in &result.unreached {
        println!("house {t}: unreachable");
    }
    if let Some(trace) = &result.trace {
        let mut bytes = Vec::new();
        if trace.write_to(&mut bytes).is_ok() {
            println!(
                "film: {} frames, {} events, {} bytes",
                trace.frames.len(),
                trace.event_count(),
                bytes.len()
            );
        }
    }
}
