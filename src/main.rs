use anyhow::{bail, Context};
use astrokit::config::Scenario;
use astrokit::physics::eclipse::EclipseMethod;
use astrokit::physics::orbital::OrbitalMechanics;
use astrokit::time::calendar_from_epoch;
use astrokit::{EphemerisProvider, Propagator, TerminationStatus};
use clap::{Parser, ValueEnum};
use env_logger::{Builder, Env};
use log::info;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Propagate a spacecraft trajectory described by a TOML scenario")]
struct Cli {
    /// Scenario file
    scenario: PathBuf,

    /// Trajectory CSV destination
    #[arg(short, long, default_value = "output/trajectory.csv")]
    output: PathBuf,

    /// Report shadow intervals cast by the central body (needs `[ephemeris]` with the sun)
    #[arg(long, value_enum)]
    eclipses: Option<ShadowKind>,
}

#[derive(Copy, Clone, ValueEnum, Debug)]
enum ShadowKind {
    Umbra,
    Penumbra,
    Either,
}

impl From<ShadowKind> for EclipseMethod {
    fn from(kind: ShadowKind) -> Self {
        match kind {
            ShadowKind::Umbra => EclipseMethod::Umbra,
            ShadowKind::Penumbra => EclipseMethod::Penumbra,
            ShadowKind::Either => EclipseMethod::Either,
        }
    }
}

fn main() -> anyhow::Result<()> {
    Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let scenario = Scenario::load(&cli.scenario)
        .with_context(|| format!("loading scenario {}", cli.scenario.display()))?;
    let config = scenario.to_config().context("resolving scenario")?;
    let ephemeris = scenario.ephemeris().context("building ephemeris")?;
    let provider = ephemeris.as_ref().map(|e| e as &dyn EphemerisProvider);

    let mu = config.central_body.mu;
    let propagator = Propagator::new(config, provider)?;
    let propagation = propagator.run()?;
    let trajectory = &propagation.trajectory;

    match &propagation.status {
        TerminationStatus::TimeSpanExhausted => info!("Time span exhausted"),
        TerminationStatus::StopConditionMet(record) => info!(
            "Stopped by {} at {}",
            record.name,
            calendar_from_epoch(record.epoch)?
        ),
    }
    for event in &propagation.events {
        info!("Crossed {} at {}", event.name, calendar_from_epoch(event.epoch)?);
    }

    if let Some((epoch, state)) = trajectory.last() {
        let (apoapsis, periapsis) = OrbitalMechanics::apsides(state, mu)?;
        info!(
            "Final state at {}: |r| = {:.3} km, apoapsis {:.3} km, periapsis {:.3} km",
            calendar_from_epoch(epoch)?,
            state.position.magnitude(),
            apoapsis,
            periapsis
        );
    }

    if let Some(kind) = cli.eclipses {
        let Some(provider) = provider else {
            bail!("eclipse detection needs an [ephemeris] table in the scenario");
        };
        trajectory.eclipses(provider, kind.into())?.log_summary();
    }

    trajectory
        .write_csv(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!("Wrote {} samples to {}", trajectory.len(), cli.output.display());

    Ok(())
}
