//! Run configuration.
//!
//! A JSON document is deserialised into raw structs mirroring the file layout
//! and then resolved into [`Parameters`]: boundary names become
//! [`BoundaryKind`]s, species names in reactions become indices, relative
//! paths are anchored at the configuration file and the geometry is loaded.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::boundary::bc2d::{BoundaryConditions2D, BoundaryKind, SquareBoundary, WallCondition};
use crate::domain::flags::ObstacleMask;
use crate::domain::grid2d::{CellSize2D, GridDimensions2D};
use crate::error::ConfigError;
use crate::io::pgm::read_pgm;
use crate::numerical::FlowConstants;
use crate::poisson::SorSettings;
use crate::reaction::{ArrheniusRate, Participant, Reaction, ReactionSystem};

fn default_one() -> f64 {
    1.0
}

fn default_t_inf() -> f64 {
    273.15
}

fn default_prefix() -> String {
    "data".to_string()
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    problem: RawProblem,
    time: RawTime,
    sor: RawSor,
    constants: RawConstants,
    #[serde(default)]
    pressure: RawPressure,
    velocity: RawVelocity,
    temperature: RawTemperature,
    #[serde(default)]
    substances: Vec<RawSubstance>,
    #[serde(default)]
    reactions: Vec<RawReaction>,
    output: RawOutput,
}

#[derive(Debug, Deserialize)]
struct RawProblem {
    name: String,
    dimensions: RawXY,
    geometry_file: Option<PathBuf>,
    imax: Option<usize>,
    jmax: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RawXY {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct RawTime {
    #[serde(default)]
    step: f64,
    max: f64,
    tau: f64,
}

#[derive(Debug, Deserialize)]
struct RawSor {
    itermax: usize,
    eps: f64,
    omega: f64,
    alpha: f64,
}

#[derive(Debug, Deserialize)]
struct RawConstants {
    #[serde(alias = "Reynolds")]
    reynolds: f64,
    #[serde(alias = "Prandtl")]
    prandtl: f64,
    #[serde(default = "default_one")]
    vol_cp: f64,
    beta: f64,
    gamma: Option<f64>,
    gravitation: RawXY,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPressure {
    init: f64,
    boundary: RawWalls<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawWalls<T> {
    left: T,
    right: T,
    top: T,
    bottom: T,
}

#[derive(Debug, Deserialize)]
struct RawVelocity {
    #[serde(default)]
    init: RawUV,
    #[serde(default = "default_one")]
    inflow: f64,
    boundary: RawWalls<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUV {
    u: f64,
    v: f64,
}

/// A number, or a PGM picture scaled by `coeff`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawInitial {
    Value(f64),
    File {
        file: PathBuf,
        #[serde(default = "default_one")]
        coeff: f64,
    },
}

#[derive(Debug, Deserialize)]
struct RawTemperature {
    init: RawInitial,
    #[serde(default = "default_t_inf")]
    t_inf: f64,
    boundary: RawTemperatureBoundary,
}

#[derive(Debug, Deserialize)]
struct RawTemperatureBoundary {
    left: RawWallCondition,
    right: RawWallCondition,
    top: RawWallCondition,
    bottom: RawWallCondition,
    inner: RawWallCondition,
}

#[derive(Debug, Deserialize)]
struct RawWallCondition {
    #[serde(rename = "type")]
    kind: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct RawSubstance {
    name: String,
    lambda: f64,
    #[serde(default, alias = "H_formation")]
    h_formation: f64,
    init: RawInitial,
}

#[derive(Debug, Deserialize)]
struct RawReaction {
    activation_energy: RawForthBack,
    freq_factor: RawForthBack,
    reagents: Vec<RawParticipant>,
    products: Vec<RawParticipant>,
}

#[derive(Debug, Deserialize)]
struct RawForthBack {
    forth: f64,
    back: f64,
}

#[derive(Debug, Deserialize)]
struct RawParticipant {
    name: String,
    stoichiometric_coeff: f64,
    exponent: f64,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    #[serde(default = "default_prefix")]
    prefix: String,
    directory: Option<PathBuf>,
    dt_value: f64,
    #[serde(default)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Vtk,
    Json,
}

/// Initial value of a cell-centred field.
#[derive(Debug, Clone, PartialEq)]
pub enum InitialField {
    Constant(f64),
    /// Grey values of a PGM picture times `coeff`.
    Image { path: PathBuf, coeff: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitialConditions {
    pub u: f64,
    pub v: f64,
    pub pressure: f64,
    pub temperature: InitialField,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeControl {
    pub t_end: f64,
    /// Step used when adaptive control is off.
    pub fixed_dt: f64,
    /// Safety factor of the adaptive step; `<= 0` disables it.
    pub tau: f64,
}

impl TimeControl {
    pub fn is_adaptive(&self) -> bool {
        self.tau > 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesParameters {
    pub name: String,
    /// Diffusivity.
    pub lambda: f64,
    pub formation_enthalpy: f64,
    pub initial: InitialField,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub prefix: String,
    pub directory: PathBuf,
    /// Simulated time between snapshots.
    pub interval: f64,
    pub format: OutputFormat,
}

/// Validated, immutable description of one run.
#[derive(Debug, Clone)]
pub struct Parameters {
    pub problem: String,
    pub xlength: f64,
    pub ylength: f64,
    pub mask: ObstacleMask,
    pub time: TimeControl,
    pub sor: SorSettings,
    pub flow: FlowConstants,
    pub prandtl: f64,
    /// Upwind blend of the scalar convection terms.
    pub gamma: f64,
    pub vol_cp: f64,
    pub t_inf: f64,
    pub initial: InitialConditions,
    pub boundaries: BoundaryConditions2D,
    /// Peak velocity of the inflow profile, if the problem has one.
    pub inflow_peak: f64,
    pub species: Vec<SpeciesParameters>,
    pub reactions: Vec<Reaction>,
    pub output: OutputSettings,
}

impl Parameters {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        info!("Loading configuration from {}", path.display());
        Self::from_json_str(&text, base_dir)
    }

    /// Parses a configuration, resolving relative paths against `base_dir`.
    pub fn from_json_str(text: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(text)?;
        let params = resolve(raw, base_dir)?;
        params.validate()?;
        debug!(
            "Resolved '{}' on {:?} cells with {} species and {} reactions",
            params.problem,
            params.dimensions(),
            params.species.len(),
            params.reactions.len()
        );
        Ok(params)
    }

    /// An all-fluid closed box at rest with no species, for quick setups.
    pub fn closed_box(dimensions: GridDimensions2D, xlength: f64, ylength: f64) -> Self {
        Self {
            problem: "box".to_string(),
            xlength,
            ylength,
            mask: ObstacleMask::all_fluid(dimensions),
            time: TimeControl { t_end: 1.0, fixed_dt: 0.01, tau: 0.5 },
            sor: SorSettings { omega: 1.7, eps: 1e-3, itermax: 100 },
            flow: FlowConstants { reynolds: 100.0, alpha: 0.9, beta: 0.0, gravity: (0.0, 0.0) },
            prandtl: 1.0,
            gamma: 0.9,
            vol_cp: 1.0,
            t_inf: default_t_inf(),
            initial: InitialConditions { u: 0.0, v: 0.0, pressure: 0.0, temperature: InitialField::Constant(0.0) },
            boundaries: BoundaryConditions2D::closed_box(),
            inflow_peak: 1.0,
            species: Vec::new(),
            reactions: Vec::new(),
            output: OutputSettings {
                prefix: default_prefix(),
                directory: PathBuf::from("."),
                interval: 0.5,
                format: OutputFormat::Json,
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn ensure(ok: bool, message: String) -> Result<(), ConfigError> {
            if ok { Ok(()) } else { Err(ConfigError::InvalidParameter(message)) }
        }
        let GridDimensions2D(imax, jmax) = self.dimensions();
        ensure(imax > 0 && jmax > 0, format!("grid must have at least one cell, got {}x{}", imax, jmax))?;
        ensure(
            self.xlength > 0.0 && self.ylength > 0.0,
            format!("domain lengths must be positive, got {} x {}", self.xlength, self.ylength),
        )?;
        ensure(self.flow.reynolds > 0.0, format!("Reynolds number must be positive, got {}", self.flow.reynolds))?;
        ensure(self.prandtl > 0.0, format!("Prandtl number must be positive, got {}", self.prandtl))?;
        ensure(self.vol_cp > 0.0, format!("vol_cp must be positive, got {}", self.vol_cp))?;
        ensure(self.sor.eps > 0.0, format!("SOR tolerance must be positive, got {}", self.sor.eps))?;
        ensure(self.sor.itermax > 0, "SOR itermax must be positive".to_string())?;
        ensure(
            self.sor.omega > 0.0 && self.sor.omega < 2.0,
            format!("omega must lie in (0, 2), got {}", self.sor.omega),
        )?;
        ensure(
            (0.0..=1.0).contains(&self.flow.alpha),
            format!("alpha must lie in [0, 1], got {}", self.flow.alpha),
        )?;
        ensure((0.0..=1.0).contains(&self.gamma), format!("gamma must lie in [0, 1], got {}", self.gamma))?;
        ensure(
            self.time.t_end >= 0.0,
            format!("end time must not be negative, got {}", self.time.t_end),
        )?;
        ensure(
            self.time.is_adaptive() || self.time.fixed_dt > 0.0,
            format!("a positive time step is required when tau <= 0, got {}", self.time.fixed_dt),
        )?;
        ensure(
            self.output.interval > 0.0,
            format!("output interval must be positive, got {}", self.output.interval),
        )?;

        let mut names = HashSet::new();
        for species in &self.species {
            if !names.insert(species.name.as_str()) {
                return Err(ConfigError::DuplicateSpecies(species.name.clone()));
            }
            ensure(
                species.lambda > 0.0,
                format!("diffusivity of '{}' must be positive, got {}", species.name, species.lambda),
            )?;
        }
        for reaction in &self.reactions {
            for p in reaction.reagents.iter().chain(&reaction.products) {
                ensure(
                    p.species < self.species.len(),
                    format!("reaction refers to species index {}", p.species),
                )?;
            }
        }
        Ok(())
    }

    pub fn dimensions(&self) -> GridDimensions2D {
        self.mask.dimensions()
    }

    pub fn cell_size(&self) -> CellSize2D {
        CellSize2D::from_lengths(self.xlength, self.ylength, self.dimensions())
    }

    pub fn species_names(&self) -> Vec<String> {
        self.species.iter().map(|s| s.name.clone()).collect()
    }

    pub fn reaction_system(&self) -> ReactionSystem {
        ReactionSystem {
            reactions: self.reactions.clone(),
            formation_enthalpy: self.species.iter().map(|s| s.formation_enthalpy).collect(),
            vol_cp: self.vol_cp,
            t_inf: self.t_inf,
        }
    }

    /// Largest species diffusivity, `None` without species.
    pub fn max_lambda(&self) -> Option<f64> {
        self.species.iter().map(|s| s.lambda).reduce(f64::max)
    }
}

fn resolve_path(base_dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() { path } else { base_dir.join(path) }
}

fn resolve_initial(raw: RawInitial, base_dir: &Path) -> InitialField {
    match raw {
        RawInitial::Value(value) => InitialField::Constant(value),
        RawInitial::File { file, coeff } => InitialField::Image { path: resolve_path(base_dir, file), coeff },
    }
}

fn parse_kind(name: &str, what: &str) -> Result<BoundaryKind, ConfigError> {
    name.parse::<BoundaryKind>()
        .map_err(|e| ConfigError::InvalidBoundary(format!("{}: {}", what, e)))
}

fn resolve_wall(raw: &RawWallCondition, what: &str) -> Result<WallCondition, ConfigError> {
    Ok(WallCondition { kind: parse_kind(&raw.kind, what)?, value: raw.value })
}

fn resolve_mask(problem: &RawProblem, base_dir: &Path) -> Result<ObstacleMask, ConfigError> {
    match &problem.geometry_file {
        Some(file) => {
            let path = resolve_path(base_dir, file.clone());
            let mask = read_pgm(&path)?.to_mask()?;
            let GridDimensions2D(imax, jmax) = mask.dimensions();
            let expected = (problem.imax.unwrap_or(imax), problem.jmax.unwrap_or(jmax));
            if expected != (imax, jmax) {
                return Err(ConfigError::DimensionMismatch {
                    what: path.display().to_string(),
                    found: (imax, jmax),
                    expected,
                });
            }
            Ok(mask)
        }
        None => match (problem.imax, problem.jmax) {
            (Some(imax), Some(jmax)) if imax > 0 && jmax > 0 => {
                Ok(ObstacleMask::all_fluid(GridDimensions2D(imax, jmax)))
            }
            _ => Err(ConfigError::InvalidParameter(
                "either problem.geometry_file or positive problem.imax and problem.jmax are required".to_string(),
            )),
        },
    }
}

fn resolve_participants(
    raw: &[RawParticipant],
    species: &[SpeciesParameters],
    role: &'static str,
) -> Result<Vec<Participant>, ConfigError> {
    raw.iter()
        .map(|p| {
            let index = species
                .iter()
                .position(|s| s.name == p.name)
                .ok_or_else(|| ConfigError::UnknownSpecies { role, name: p.name.clone() })?;
            Ok(Participant { species: index, stoichiometric_coeff: p.stoichiometric_coeff, exponent: p.exponent })
        })
        .collect()
}

fn resolve(raw: RawConfig, base_dir: &Path) -> Result<Parameters, ConfigError> {
    let mask = resolve_mask(&raw.problem, base_dir)?;

    let walls = &raw.velocity.boundary;
    let velocity = SquareBoundary::new(
        parse_kind(&walls.left, "velocity at left wall")?,
        parse_kind(&walls.right, "velocity at right wall")?,
        parse_kind(&walls.bottom, "velocity at bottom wall")?,
        parse_kind(&walls.top, "velocity at top wall")?,
    );
    let p = &raw.pressure.boundary;
    let pressure = SquareBoundary::new(p.left, p.right, p.bottom, p.top);
    let t = &raw.temperature.boundary;
    let temperature = SquareBoundary::new(
        resolve_wall(&t.left, "temperature at left wall")?,
        resolve_wall(&t.right, "temperature at right wall")?,
        resolve_wall(&t.bottom, "temperature at bottom wall")?,
        resolve_wall(&t.top, "temperature at top wall")?,
    );
    let obstacle = resolve_wall(&t.inner, "temperature at obstacles")?;
    let boundaries = BoundaryConditions2D::new(velocity, pressure, temperature, obstacle)
        .map_err(|e| ConfigError::InvalidBoundary(e.to_string()))?;

    let species: Vec<SpeciesParameters> = raw
        .substances
        .into_iter()
        .map(|s| SpeciesParameters {
            name: s.name,
            lambda: s.lambda,
            formation_enthalpy: s.h_formation,
            initial: resolve_initial(s.init, base_dir),
        })
        .collect();
    let mut names = HashSet::new();
    if let Some(dup) = species.iter().find(|s| !names.insert(s.name.as_str())) {
        return Err(ConfigError::DuplicateSpecies(dup.name.clone()));
    }

    let reactions = raw
        .reactions
        .iter()
        .map(|r| {
            Ok(Reaction {
                forward: ArrheniusRate {
                    activation_energy: r.activation_energy.forth,
                    frequency_factor: r.freq_factor.forth,
                },
                backward: ArrheniusRate {
                    activation_energy: r.activation_energy.back,
                    frequency_factor: r.freq_factor.back,
                },
                reagents: resolve_participants(&r.reagents, &species, "reagent")?,
                products: resolve_participants(&r.products, &species, "product")?,
            })
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    let output_dir = match raw.output.directory {
        Some(dir) => resolve_path(base_dir, dir),
        None => base_dir.to_path_buf(),
    };

    Ok(Parameters {
        problem: raw.problem.name,
        xlength: raw.problem.dimensions.x,
        ylength: raw.problem.dimensions.y,
        mask,
        time: TimeControl { t_end: raw.time.max, fixed_dt: raw.time.step, tau: raw.time.tau },
        sor: SorSettings { omega: raw.sor.omega, eps: raw.sor.eps, itermax: raw.sor.itermax },
        flow: FlowConstants {
            reynolds: raw.constants.reynolds,
            alpha: raw.sor.alpha,
            beta: raw.constants.beta,
            gravity: (raw.constants.gravitation.x, raw.constants.gravitation.y),
        },
        prandtl: raw.constants.prandtl,
        gamma: raw.constants.gamma.unwrap_or(raw.sor.alpha),
        vol_cp: raw.constants.vol_cp,
        t_inf: raw.temperature.t_inf,
        initial: InitialConditions {
            u: raw.velocity.init.u,
            v: raw.velocity.init.v,
            pressure: raw.pressure.init,
            temperature: resolve_initial(raw.temperature.init, base_dir),
        },
        boundaries,
        inflow_peak: raw.velocity.inflow,
        species,
        reactions,
        output: OutputSettings {
            prefix: raw.output.prefix,
            directory: output_dir,
            interval: raw.output.dt_value,
            format: raw.output.format,
        },
    })
}
