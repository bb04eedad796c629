#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a park scenario headless and reports how
//! guests got on with its rides.

mod driver;
mod scenario;
mod share_code;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use park_sim_core::Event;
use park_sim_world::{query, World};

use crate::{driver::Driver, scenario::Scenario};

#[derive(Parser, Debug)]
#[command(name = "park-sim")]
#[command(about = "Simulate guests queuing for, riding and leaving park rides")]
struct CliArgs {
    /// Scenario file (TOML) describing the park
    #[arg(short, long, required_unless_present = "share_code")]
    scenario: Option<PathBuf>,

    /// Load the park from a share code instead of a file
    #[arg(long, conflicts_with = "scenario")]
    share_code: Option<String>,

    /// Number of ticks to simulate
    #[arg(short, long, default_value = "5000")]
    ticks: u64,

    /// Seed for every random decision in the run
    #[arg(long, default_value = "7")]
    seed: u64,

    /// Most verbose log level to show (RUST_LOG refines it)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Print the scenario's share code and exit
    #[arg(long)]
    export_share_code: bool,
}

/// Entry point for the park simulator command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .parse_default_env()
        .init();

    let scenario = load(&args)?;
    if args.export_share_code {
        println!("{}", share_code::encode(&scenario)?);
        return Ok(());
    }

    let mut world = scenario.build(args.seed)?;
    let rejected = run(&mut world, args.ticks);
    print_report(&world, rejected);
    Ok(())
}

fn load(args: &CliArgs) -> Result<Scenario> {
    if let Some(code) = &args.share_code {
        let scenario = share_code::decode(code).context("could not read share code")?;
        scenario.validate()?;
        return Ok(scenario);
    }
    let path = args
        .scenario
        .as_deref()
        .context("either --scenario or --share-code is required")?;
    Scenario::load(path)
}

/// Runs the world for `ticks` ticks and returns how many commands it refused.
fn run(world: &mut World, ticks: u64) -> usize {
    let mut driver = Driver::new(world);
    let mut events = Vec::new();
    let mut rejected = 0;
    for _ in 0..ticks {
        driver.step(world, &mut events);
        for event in events.drain(..) {
            match event {
                Event::CommandRejected { error } => {
                    rejected += 1;
                    log::debug!("rejected: {error}");
                }
                Event::News { kind, guest, ride } => {
                    log::info!("news: {kind:?} at {ride:?} ({guest:?})");
                }
                Event::RideDeleted { ride } => log::info!("{ride:?} deleted"),
                other => log::trace!("{other:?}"),
            }
        }
    }
    log::info!("ran {ticks} ticks, {rejected} commands refused");
    rejected
}

fn print_report(world: &World, rejected: usize) {
    println!("{}", query::welcome_banner(world));
    println!("after {} ticks:", query::tick(world));
    println!();
    println!(
        "{:<24} {:>9} {:>10} {:>12} {:>7} {:>10} {:>9}",
        "ride", "customers", "popularity", "satisfaction", "queued", "queue time", "income"
    );
    for ride in query::ride_view(world).iter() {
        let queued: u16 = ride.queue_lengths.iter().sum();
        let queue_time = ride.queue_times.iter().copied().max().unwrap_or(0);
        println!(
            "{:<24} {:>9} {:>10} {:>12} {:>7} {:>10} {:>9}",
            ride.name,
            ride.total_customers,
            percent(ride.popularity),
            percent(ride.satisfaction),
            queued,
            queue_time,
            ride.income.to_string(),
        );
    }

    let guests = query::guest_view(world).into_vec();
    println!();
    println!(
        "{:>6} {:>6} {:>9} {:>8}  {}",
        "guest", "rides", "happiness", "cash", "doing"
    );
    for guest in &guests {
        println!(
            "{:>6} {:>6} {:>9} {:>8}  {:?}",
            guest.id.get(),
            guest.rides_ridden,
            guest.happiness,
            guest.cash.to_string(),
            guest.state,
        );
    }

    let count = guests.len().max(1);
    let rides: usize = guests.iter().map(|guest| usize::from(guest.rides_ridden)).sum();
    println!();
    println!(
        "{} guests, {:.1} rides each",
        guests.len(),
        rides as f64 / count as f64
    );
    if rejected > 0 {
        println!("{rejected} commands were refused (see --log-level debug)");
    }
}

fn percent(value: Option<u8>) -> String {
    value.map_or_else(|| "-".to_owned(), |value| format!("{value}%"))
}
