#![deny(warnings)]

//! Headless CLI for playing Wasteland Traders against a save file.

use anyhow::{anyhow, bail, Context, Result};
use sim_core::{CityId, Good, GoodCounts, SimConfig};
use sim_runtime::{Arrival, GameEngine, TravelStart};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    save: Option<PathBuf>,
    config: Option<PathBuf>,
    seed: Option<u64>,
    command: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--save" => args.save = it.next().map(PathBuf::from),
            "--config" => args.config = it.next().map(PathBuf::from),
            "--seed" => {
                let raw = it.next().ok_or_else(|| anyhow!("--seed needs a value"))?;
                args.seed = Some(raw.parse().with_context(|| format!("bad seed {raw:?}"))?);
            }
            _ => args.command.push(arg),
        }
    }
    Ok(args)
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: SimConfig = serde_yaml::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Parse `scrap:3,water:1` into counts.
fn parse_goods(spec: &str) -> Result<GoodCounts> {
    let mut counts = GoodCounts::new();
    for part in spec.split(',').filter(|p| !p.trim().is_empty()) {
        let (name, n) = part
            .split_once(':')
            .ok_or_else(|| anyhow!("expected good:count, got {part:?}"))?;
        let good: Good = name.parse()?;
        let n: u32 = n.trim().parse().with_context(|| format!("bad count in {part:?}"))?;
        counts.add(good, n);
    }
    Ok(counts)
}

fn parse_trade(args: &[String]) -> Result<(GoodCounts, GoodCounts)> {
    let mut give = GoodCounts::new();
    let mut take = GoodCounts::new();
    for a in args {
        if let Some(rest) = a.strip_prefix("give=") {
            give = parse_goods(rest)?;
        } else if let Some(rest) = a.strip_prefix("take=") {
            take = parse_goods(rest)?;
        } else {
            bail!("unexpected trade argument {a:?}");
        }
    }
    Ok((give, take))
}

fn price_line(prices: impl Iterator<Item = (Good, u32)>) -> String {
    let cells: Vec<String> = prices.map(|(g, p)| format!("{} {p}", g.label())).collect();
    cells.join(" | ")
}

fn print_status(engine: &GameEngine) -> Result<()> {
    let world = engine.world();
    let player = engine.player();
    let prices = engine.current_prices()?;
    let here = world
        .city(&player.city_id)
        .map(|c| c.name.as_str())
        .unwrap_or("?");
    println!("Day {} | seed {} | in {} ({})", world.tick, world.seed, here, player.city_id);
    println!("Inventory: {}", player.inventory);
    println!("Prices: {}", price_line(prices.iter()));
    let roads: Vec<String> = world
        .neighbors_of(&player.city_id)
        .iter()
        .map(|c| c.id.to_string())
        .collect();
    println!("Roads to: {}", roads.join(", "));
    if engine.is_bankrupt() {
        println!("BANKRUPT: start a new game with `new`");
    }
    Ok(())
}

fn print_arrival(arrival: &Arrival) {
    if !arrival.paid.is_empty() {
        println!("Paid guards: {}", arrival.paid);
    }
    if !arrival.stolen.is_empty() {
        println!("You were ambushed. Lost: {}", arrival.stolen);
    }
    println!(
        "Arrived at {} on day {} (used 1 {})",
        arrival.destination, arrival.tick, arrival.upkeep
    );
}

fn destination(rest: &[String]) -> Result<CityId> {
    rest.first()
        .map(|s| CityId::from(s.as_str()))
        .ok_or_else(|| anyhow!("missing destination city"))
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::DEBUG)
        .init();

    let args = parse_args()?;
    let save = args
        .save
        .clone()
        .unwrap_or_else(|| PathBuf::from(persistence::default_save_path()));
    let config = load_config(args.config.as_deref())?;
    let (cmd, rest) = match args.command.split_first() {
        Some((c, r)) => (c.as_str(), r),
        None => ("status", &[][..]),
    };
    info!(command = cmd, save = %save.display(), "starting CLI");

    if cmd == "new" {
        let engine = GameEngine::new_game(args.seed, config)?;
        persistence::save_json(&save, &engine.snapshot())?;
        return print_status(&engine);
    }

    let snapshot = persistence::load_json(&save)
        .with_context(|| format!("no game at {} (run `new` first)", save.display()))?;
    let mut engine = GameEngine::from_snapshot(snapshot, config)?;

    match cmd {
        "status" => return print_status(&engine),
        "tick" => {
            let report = engine.do_tick()?;
            println!("Day {} passed (used 1 {})", report.tick, report.upkeep);
        }
        "trade" => {
            let (give, take) = parse_trade(rest)?;
            let quote = engine.execute_trade(&give, &take)?;
            println!(
                "Traded {} (worth {}) for {} (worth {})",
                give, quote.give_value, take, quote.take_value
            );
        }
        "quote" => {
            let quote = engine.guard_quote(&destination(rest)?)?;
            println!(
                "Guards ask {} (fee {}, payment worth {})",
                quote.payment, quote.fee, quote.payment_value
            );
            return Ok(());
        }
        "guards" => {
            let to = destination(rest)?;
            let quote = engine.guard_quote(&to)?;
            let arrival = engine.travel_with_guards(&to, &quote.payment)?;
            print_arrival(&arrival);
        }
        "travel" => {
            let to = destination(rest)?;
            let arrival = match engine.begin_travel(&to)? {
                TravelStart::Arrived(arrival) => arrival,
                TravelStart::Ambushed { .. } => engine.complete_travel()?,
            };
            print_arrival(&arrival);
        }
        other => bail!("unknown command {other:?} (new|status|tick|trade|quote|guards|travel)"),
    }

    persistence::save_json(&save, &engine.snapshot())?;
    print_status(&engine)
}
