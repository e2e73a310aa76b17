use clap::{Parser, Subcommand};
use nec_context::{
    AngleGrid, Context, ErrorKind, ExecuteMode, GainComponent, NecError, PatternMode,
    PatternSettings, RadiationPattern,
};
use nec_core::timing::{enable_timing, solver_timing};
use nec_core::{Cplx, vec3};
use nec_deck::{CardDef, DeckError};
use nec_environment::{Excitation, FrequencySweep, Ground, SegmentRef};
use nec_geometry::{GroundPlaneMode, WireSpec};
use nec_results::ResultsError;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nec-cli")]
#[command(about = "Antenna simulation from YAML card decks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate deck syntax and card order
    Validate {
        /// Path to the deck YAML file
        deck_path: PathBuf,
    },
    /// Apply a deck and report every frequency step
    Run {
        /// Path to the deck YAML file
        deck_path: PathBuf,
        /// Write all result sets as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Report matrix fill, factorization and pattern timing
        #[arg(long)]
        timing: bool,
    },
    /// Center-fed vertical dipole over perfect ground at 30 MHz
    Demo {
        /// Write all result sets as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Deck(#[from] DeckError),

    #[error(transparent)]
    Nec(#[from] NecError),

    #[error(transparent)]
    Results(#[from] ResultsError),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { deck_path } => cmd_validate(&deck_path),
        Commands::Run {
            deck_path,
            json,
            timing,
        } => cmd_run(&deck_path, json.as_deref(), timing),
        Commands::Demo { json } => cmd_demo(json.as_deref()),
    }
}

fn cmd_validate(deck_path: &Path) -> CliResult<()> {
    println!("Validating deck: {}", deck_path.display());
    let deck = nec_deck::load_yaml(deck_path)?;
    println!("✓ Deck is valid ({} cards)", deck.cards.len());
    Ok(())
}

fn cmd_run(deck_path: &Path, json: Option<&Path>, timing: bool) -> CliResult<()> {
    if timing {
        enable_timing();
    }
    let deck = nec_deck::load_yaml(deck_path)?;
    println!("Running deck: {}", deck.name);

    let mut ctx = Context::new();
    nec_deck::apply_deck(&deck, &mut ctx)?;
    if !deck
        .cards
        .iter()
        .any(|c| matches!(c, CardDef::Execute { .. }))
    {
        ctx.execute(ExecuteMode::SolveOnly)?;
    }

    report(&mut ctx)?;
    if timing {
        print_timing_summary();
    }
    save(&ctx, json)
}

fn cmd_demo(json: Option<&Path>) -> CliResult<()> {
    println!("Vertical dipole, 9 segments, z = 2..7 m, over perfect ground at 30 MHz");

    let mut ctx = Context::new();
    ctx.wire(WireSpec::new(
        1,
        9,
        vec3(0.0, 0.0, 2.0),
        vec3(0.0, 0.0, 7.0),
        0.1,
    ))?;
    ctx.geometry_complete(GroundPlaneMode::CurrentExpansionModified)?;
    ctx.ground(Ground::Perfect)?;
    ctx.frequency(FrequencySweep::single(30.0).map_err(NecError::from)?)?;
    ctx.excitation(Excitation::AppliedVoltage {
        segment: SegmentRef::new(1, 5),
        voltage: Cplx::new(1.0, 0.0),
    })?;
    ctx.radiation_pattern(RadiationPattern::new(
        PatternMode::SpaceWave,
        AngleGrid::theta_cut(90, 0.0, 1.0, 0.0),
        PatternSettings::default(),
    ))?;

    report(&mut ctx)?;
    save(&ctx, json)
}

fn report(ctx: &mut Context) -> CliResult<()> {
    for step in 0..ctx.step_count() {
        let summary = ctx.summary(step)?;
        println!("\nStep {} at {:.4} MHz", step + 1, summary.frequency_mhz);
        match summary.impedance {
            Some(z) => println!("  Impedance:   {:.3} {:+.3}j ohm", z.re, z.im),
            None => println!("  Impedance:   (no voltage source)"),
        }
        println!("  Input power: {:.4e} W", summary.input_power);
        if let Some(eff) = summary.efficiency() {
            println!("  Efficiency:  {:.2}%", 100.0 * eff);
        }

        match ctx.gain_stats(step, GainComponent::Total) {
            Ok(stats) => {
                println!(
                    "  Gain (dB):   max {:.2}  min {:.2}  mean {:.2}  sd {:.2}",
                    stats.max, stats.min, stats.mean, stats.sd
                );
                if let Some(avg) = ctx.pattern_for(step)?.average_gain {
                    println!("  Average power gain: {:.4}", avg);
                }
            }
            Err(e) if e.kind() == ErrorKind::NoPatternRequested => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn save(ctx: &Context, json: Option<&Path>) -> CliResult<()> {
    if let Some(path) = json {
        ctx.results().save_json(path)?;
        tracing::debug!(results = ctx.results().len(), "results exported");
        println!("\n✓ Results written to {}", path.display());
    }
    Ok(())
}

fn print_timing_summary() {
    let phases = [
        ("Matrix fill", &solver_timing::MATRIX_FILL),
        ("Factor", &solver_timing::FACTOR),
        ("Pattern", &solver_timing::PATTERN),
    ];
    println!("\nTiming summary:");
    for (name, acc) in phases {
        if acc.count() > 0 {
            println!(
                "  {:<12} {:.3}s over {} calls ({:.3}s avg)",
                name,
                acc.total_seconds(),
                acc.count(),
                acc.average_seconds()
            );
        }
    }
}
