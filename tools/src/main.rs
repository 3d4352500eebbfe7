//! world-runner: headless driver for the space-strategy world state.
//!
//! Usage:
//!   world-runner --seed 12345 --ticks 120 --step 5 --db world.db
//!   world-runner --seed 12345 --ipc-mode

use alloy_primitives::U256;
use anyhow::{Context, Result};
use spacestate_core::{
    clock::{ManualClock, TimeSource},
    config::WorldConfig,
    rng::ScenarioRng,
    tables::{Amount, Health, MinerInfo, MinerInfoRecord, WarpPath, WarpPathRecord},
    types::{entity_id, static_tag, Coord, EntityId, Timestamp},
    world::World,
};
use std::env;
use std::io::{self, BufRead, Write};

const GENESIS: Timestamp = 1_700_000_000;

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Advance { secs: Timestamp },
    Quit,
}

/// Entities spawned by the scenario.
struct Scenario {
    base:     EntityId,
    asteroid: EntityId,
    miner:    EntityId,
    builder:  EntityId,
    outpost:  EntityId,
    ship:     EntityId,
}

#[derive(serde::Serialize)]
struct WorldState {
    now:            Timestamp,
    ship_position:  Option<Coord>,
    ship_arrived:   bool,
    miner_amount:   U256,
    builder_amount: U256,
    outpost_health: u32,
    spice_supply:   U256,
    base_spice:     U256,
    events:         usize,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ticks = parse_arg(&args, "--ticks", 120u64);
    let step = parse_arg(&args, "--step", 5u64);
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = args
        .windows(2)
        .find(|w| w[0] == "--db")
        .map(|w| w[1].as_str())
        .unwrap_or(":memory:");
    let data_dir = args
        .windows(2)
        .find(|w| w[0] == "--data-dir")
        .map(|w| w[1].as_str())
        .unwrap_or("./data");

    if !ipc_mode {
        println!("world-runner");
        println!("  seed:      {seed}");
        println!("  ticks:     {ticks}");
        println!("  step:      {step}s");
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        println!();
    }

    let config = WorldConfig::load(data_dir)?;
    let world = if db == ":memory:" {
        World::in_memory(config)?
    } else {
        World::open(db, config)?
    };

    let clock = ManualClock::new(GENESIS);
    let scenario = seed_world(&world, seed, clock.now(), ticks.saturating_mul(step))
        .context("seeding scenario")?;

    if ipc_mode {
        run_ipc_loop(&world, &scenario, &clock)?;
    } else {
        run_ticks(&world, &scenario, &clock, ticks, step)?;
        print_summary(&world, &scenario, clock.now(), ticks)?;
    }

    Ok(())
}

fn seed_world(world: &World, seed: u64, now: Timestamp, horizon: Timestamp) -> Result<Scenario> {
    let mut rng = ScenarioRng::new(seed, 0);

    let scenario = Scenario {
        base:     entity_id(&format!("base-{seed}")),
        asteroid: entity_id(&format!("asteroid-{seed}")),
        miner:    entity_id(&format!("miner-{seed}")),
        builder:  entity_id(&format!("builder-{seed}")),
        outpost:  entity_id(&format!("outpost-{seed}")),
        ship:     entity_id(&format!("ship-{seed}")),
    };
    let hangar = coord(&mut rng);
    let field = coord(&mut rng);

    world.spawn(scenario.base, static_tag("base"), None, Some(hangar), now)?;
    world.spawn(scenario.asteroid, static_tag("spice"), None, Some(field), now)?;
    world.spawn(scenario.miner, static_tag("miner"), Some(scenario.base), Some(field), now)?;
    world.spawn(scenario.builder, static_tag("builder"), Some(scenario.base), Some(hangar), now)?;
    world.spawn(scenario.outpost, static_tag("outpost"), None, Some(coord(&mut rng)), now)?;
    world.spawn(scenario.ship, static_tag("ship"), Some(scenario.base), None, now)?;

    let store = world.store();
    store.set::<MinerInfo>(&scenario.miner, &MinerInfoRecord {
        celestial:    scenario.asteroid,
        last_updated: now,
    })?;
    // Outposts start damaged so their regeneration is visible.
    store.set::<Health>(&scenario.outpost, &(rng.between(50, 250) as u32))?;
    store.set::<WarpPath>(&scenario.ship, &WarpPathRecord {
        from_x:       hangar.x,
        from_y:       hangar.y,
        to_x:         field.x,
        to_y:         field.y,
        to_entity:    scenario.asteroid,
        last_updated: now,
        duration:     (horizon / 2).max(1),
    })?;

    world.ledger().mint(static_tag("spice"), scenario.base, U256::from(500u64))?;
    world.ledger().mint(static_tag("crystal"), scenario.base, U256::from(40u64))?;

    log::info!("seeded world: hangar ({}, {}), field ({}, {})", hangar.x, hangar.y, field.x, field.y);
    Ok(scenario)
}

fn coord(rng: &mut ScenarioRng) -> Coord {
    Coord::new(rng.between(0, 1_000) as u32, rng.between(0, 1_000) as u32)
}

fn run_ticks(
    world:    &World,
    scenario: &Scenario,
    clock:    &ManualClock,
    ticks:    u64,
    step:     u64,
) -> Result<()> {
    for tick in 1..=ticks {
        let now = clock.advance(step)?;
        advance_all(world, scenario, now)?;

        // Halfway through the asteroid is mined out and the ship turns home.
        if tick == ticks / 2 {
            unload_miner(world, scenario)?;
            world.despawn(scenario.asteroid)?;
            log::info!("t={now}: asteroid depleted, ship returning to hangar");
        }

        if log::log_enabled!(log::Level::Debug) {
            let pos = world.movement().position_at(scenario.ship, now)?;
            log::debug!("tick {tick}: ship at {pos:?}");
        }
    }

    let laser = static_tag("laser");
    let cost = world.specs().make_cost(&laser)?.clone();
    match world.ledger().pay(scenario.base, &cost) {
        Ok(()) => log::info!("base paid for one laser"),
        Err(e) => log::warn!("could not pay for laser: {e}"),
    }
    Ok(())
}

fn advance_all(world: &World, scenario: &Scenario, now: Timestamp) -> Result<()> {
    let production = world.production();
    // The miner goes idle once its asteroid is gone.
    if world.store().contains::<MinerInfo>(&scenario.miner)? {
        production.advance(scenario.miner, now)?;
    }
    production.advance(scenario.builder, now)?;
    production.advance(scenario.outpost, now)?;
    Ok(())
}

/// Move everything the miner holds into the base's spice balance.
fn unload_miner(world: &World, scenario: &Scenario) -> Result<()> {
    let store = world.store();
    store.atomic(|| {
        let mined = store.get_or_default::<Amount>(&scenario.miner)?;
        world.ledger().mint(static_tag("spice"), scenario.base, mined)?;
        store.set::<Amount>(&scenario.miner, &U256::ZERO)?;
        store.delete::<MinerInfo>(&scenario.miner)?;
        Ok(())
    })?;
    Ok(())
}

fn run_ipc_loop(world: &World, scenario: &Scenario, clock: &ManualClock) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Advance { secs } => {
                let now = clock.advance(secs)?;
                advance_all(world, scenario, now)?;
                let state = build_state(world, scenario, now)?;
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
            IpcCommand::GetState => {
                let state = build_state(world, scenario, clock.now())?;
                writeln!(stdout, "{}", serde_json::to_string(&state)?)?;
            }
        }
        stdout.flush()?;
    }
    Ok(())
}

fn build_state(world: &World, scenario: &Scenario, now: Timestamp) -> Result<WorldState> {
    let store = world.store();
    let movement = world.movement();
    let ledger = world.ledger();
    let spice = static_tag("spice");

    Ok(WorldState {
        now,
        ship_position:  movement.position_at(scenario.ship, now)?,
        ship_arrived:   movement.has_arrived(scenario.ship, now)?,
        miner_amount:   store.get_or_default::<Amount>(&scenario.miner)?,
        builder_amount: store.get_or_default::<Amount>(&scenario.builder)?,
        outpost_health: store.get_or_default::<Health>(&scenario.outpost)?,
        spice_supply:   ledger.total_supply(spice)?,
        base_spice:     ledger.balance_of(spice, scenario.base)?,
        events:         store.events()?.len(),
    })
}

fn print_summary(world: &World, scenario: &Scenario, now: Timestamp, ticks: u64) -> Result<()> {
    let state = build_state(world, scenario, now)?;
    let store = world.store();

    println!("=== RUN SUMMARY ===");
    println!("  ticks run:      {ticks}");
    println!("  final time:     {now} (+{}s)", now - GENESIS);
    match state.ship_position {
        Some(p) => println!("  ship position:  ({}, {})", p.x, p.y),
        None => println!("  ship position:  (unknown)"),
    }
    println!("  ship arrived:   {}", state.ship_arrived);
    println!("  builder queue:  {}", state.builder_amount);
    println!("  outpost health: {}", state.outpost_health);
    println!("  spice supply:   {}", state.spice_supply);
    println!("  base spice:     {}", state.base_spice);

    println!();
    println!("=== EVENTS ===");
    for kind in ["minted", "burned", "transferred", "accrued"] {
        println!("  {kind:<12} {}", store.event_count(kind)?);
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
