//! vmvec CLI: smoke-test the container and inspect its growth.

use clap::{Parser, Subcommand};
use vmvec_core::config::{ReservationSize, VecConfig};
use vmvec_mem::{CloneErase, VmVec};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const GIB: usize = 1024 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "vmvec")]
#[command(about = "Reserve-then-commit growable array: smoke tests and growth inspection", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the smoke scenarios (integers, strings with freeze, clone-only type)
    Smoke {
        /// How many times to repeat the whole routine
        #[arg(short, long, default_value_t = 3)]
        rounds: usize,
    },

    /// Append elements and print every commit the container makes
    Growth {
        /// Number of elements to append
        #[arg(short, long)]
        count: usize,

        /// Element size in bytes (1, 2, 4, 8 or 16)
        #[arg(long, default_value_t = 8)]
        elem_size: usize,

        /// Reservation ceiling in bytes (overrides config)
        #[arg(long)]
        reserve_bytes: Option<usize>,

        /// Reservation as an element count (overrides config and --reserve-bytes)
        #[arg(long)]
        reserve_elements: Option<usize>,

        /// Growth ratio numerator (overrides config)
        #[arg(long)]
        growth_num: Option<usize>,

        /// Growth ratio denominator (overrides config)
        #[arg(long)]
        growth_den: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Smoke { rounds } => {
            if let Err(e) = smoke(rounds) {
                eprintln!("Smoke test failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ {} smoke round(s) passed", rounds);
        }
        Commands::Growth {
            count,
            elem_size,
            reserve_bytes,
            reserve_elements,
            growth_num,
            growth_den,
        } => {
            let mut config = VecConfig::from_env();
            apply_overrides(
                &mut config,
                reserve_bytes,
                reserve_elements,
                growth_num,
                growth_den,
            );
            if let Err(e) = growth(&config, elem_size, count) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn apply_overrides(
    cfg: &mut VecConfig,
    reserve_bytes: Option<usize>,
    reserve_elements: Option<usize>,
    growth_num: Option<usize>,
    growth_den: Option<usize>,
) {
    if let Some(bytes) = reserve_bytes {
        cfg.reservation = ReservationSize::Bytes(bytes);
    }
    if let Some(count) = reserve_elements {
        cfg.reservation = ReservationSize::Elements(count);
    }
    if let Some(num) = growth_num {
        cfg.growth.numerator = num;
    }
    if let Some(den) = growth_den {
        cfg.growth.denominator = den;
    }
}

fn ensure(cond: bool, what: &str) -> CliResult<()> {
    if cond {
        Ok(())
    } else {
        Err(format!("check failed: {}", what).into())
    }
}

fn smoke(rounds: usize) -> CliResult<()> {
    for round in 1..=rounds {
        println!("round {}", round);
        smoke_integers()?;
        smoke_strings()?;
        smoke_clone_only()?;
    }
    Ok(())
}

fn smoke_integers() -> CliResult<()> {
    let mut v = VmVec::<u64>::with_bytes(GIB)?;
    ensure(v.is_empty(), "new vector is empty")?;
    ensure(v.capacity() > 0, "first page is committed")?;

    for i in 0..3u64 {
        v.push(i)?;
        ensure(v.len() == i as usize + 1, "len follows pushes")?;
    }
    ensure(v.as_slice() == [0, 1, 2], "first three values")?;
    println!("  u64 capacity: {}", v.capacity());

    for i in 0..1000u64 {
        v.push(1000 + i)?;
    }
    for i in 0..1000usize {
        ensure(v[i + 3] == 1000 + i as u64, "appended values in order")?;
    }
    println!("  u64 capacity: {}", v.capacity());

    for batch in [10_000u64, 100_000, 1_000_000, 10_000_000] {
        for i in 0..batch {
            v.push(1000 + i)?;
        }
        println!("  u64 capacity: {}", v.capacity());
    }
    ensure(v.len() == 11_111_003, "total length")?;

    v.clear();
    ensure(v.is_empty(), "clear empties")?;
    Ok(())
}

fn smoke_strings() -> CliResult<()> {
    let mut strings = VmVec::<String>::with_bytes(GIB)?;
    let first = format!("foo bar baz foo bar baz foo bar baz {}", 1);
    strings.push(first.clone())?;
    ensure(strings[0] == first, "string round trip")?;

    for i in 0..10_000 {
        strings.push(format!("foo bar baz foo bar baz foo bar baz {}", i))?;
    }

    strings.freeze()?;
    ensure(strings[0] == first, "frozen contents stay readable")?;
    strings.unfreeze()?;
    strings[0] = "foo".to_string();
    ensure(strings[0] == "foo", "write after unfreeze")?;

    strings.clear();
    Ok(())
}

/// Element type exercised through the clone-assignment erase path.
#[derive(Clone, Default)]
struct Dummy {
    generation: u32,
}

fn smoke_clone_only() -> CliResult<()> {
    let config = VecConfig::with_elements(1024 * 1024);
    let mut dummies = VmVec::<Dummy, CloneErase>::with_policy(&config)?;
    for _ in 0..1000 {
        dummies.emplace_back(Dummy::default)?;
    }
    ensure(dummies.len() == 1000, "emplaced count")?;
    dummies.erase(0, 10)?;
    ensure(dummies.len() == 990, "erase shrinks len")?;
    ensure(
        dummies.iter().all(|d| d.generation == 0),
        "cloned tail is intact",
    )?;
    dummies.freeze()?;
    dummies.clear();
    Ok(())
}

fn growth(config: &VecConfig, elem_size: usize, count: usize) -> CliResult<()> {
    let report = match elem_size {
        1 => growth_report::<u8>(config, count),
        2 => growth_report::<u16>(config, count),
        4 => growth_report::<u32>(config, count),
        8 => growth_report::<u64>(config, count),
        16 => growth_report::<u128>(config, count),
        other => return Err(format!("unsupported element size {}", other).into()),
    }?;

    println!("Growth Report");
    println!("=============");
    println!(
        "Reservation: {} bytes ({} elements max)",
        report.mapping_size, report.max_capacity
    );
    println!(
        "Ratio: {}/{}",
        config.growth.numerator, config.growth.denominator
    );
    println!();
    for (i, cap) in report.capacities.iter().enumerate() {
        println!("  {}. capacity {} ({} bytes)", i + 1, cap, cap * elem_size);
    }
    println!();
    println!("Appended: {} of {}", report.len, count);
    if let Some(err) = report.stopped_by {
        println!("Stopped: {}", err);
    }
    Ok(())
}

struct GrowthReport {
    mapping_size: usize,
    max_capacity: usize,
    /// Capacity after each commit, starting with the initial page.
    capacities: Vec<usize>,
    len: usize,
    stopped_by: Option<vmvec_core::Error>,
}

fn growth_report<T: Default>(config: &VecConfig, count: usize) -> vmvec_core::Result<GrowthReport> {
    let mut v = VmVec::<T>::with_config(config)?;
    let mut capacities = vec![v.capacity()];
    let mut stopped_by = None;

    for _ in 0..count {
        if let Err(e) = v.push(T::default()) {
            stopped_by = Some(e);
            break;
        }
        if v.capacity() != capacities[capacities.len() - 1] {
            capacities.push(v.capacity());
        }
    }

    Ok(GrowthReport {
        mapping_size: v.mapping_size(),
        max_capacity: v.max_capacity(),
        capacities,
        len: v.len(),
        stopped_by,
    })
}
