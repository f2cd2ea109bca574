pub mod timestep;

use std::time::Instant;

use tracing::{debug, debug_span, info, info_span, warn};

use crate::boundary::bc2d::{
    apply_concentration_boundaries, apply_temperature_boundaries, apply_velocity_boundaries,
};
use crate::boundary::inflow::{inflow_for_problem, InflowProfile};
use crate::boundary::obstacle::apply_obstacle_boundaries;
use crate::config::Parameters;
use crate::domain::flags::FlagField;
use crate::domain::grid2d::{Field2D, Grid2D};
use crate::error::SolverError;
use crate::io::{load_initial_field, Snapshot, SnapshotSink};
use crate::numerical::{calculate_fg, calculate_rs, calculate_uv, normalize_pressure};
use crate::poisson::{apply_pressure_edges, sor_sweep, SorSettings};
use crate::reaction::ReactionSystem;
use crate::transport::{advance_scalar, ScalarTransport};
use timestep::{adaptive_timestep, max_velocities, TimestepBounds, TimestepLimit};

/// Outcome of the SOR loop of one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureSolveReport {
    pub iterations: usize,
    pub residual: f64,
    pub converged: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Number of completed steps, this one included.
    pub step: usize,
    /// Simulated time after the step.
    pub time: f64,
    pub dt: f64,
    pub limit: TimestepLimit,
    /// Individual stability bounds; `None` with a fixed step.
    pub bounds: Option<TimestepBounds>,
    pub pressure: PressureSolveReport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    pub time: f64,
    pub snapshots: usize,
    /// Steps whose pressure iteration hit `itermax` before reaching `eps`.
    pub unconverged_steps: usize,
}

/// Owns every field of a run and advances them in time.
#[derive(Debug)]
pub struct Simulation {
    params: Parameters,
    pub grid: Grid2D,
    pub flags: FlagField,
    /// One field per species, in configuration order.
    pub concentrations: Vec<Field2D>,
    scratch: Field2D,
    species_names: Vec<String>,
    inflow: Box<dyn InflowProfile>,
    reactions: ReactionSystem,
    time: f64,
    steps: usize,
}

impl Simulation {
    pub fn new(params: Parameters) -> Result<Self, SolverError> {
        params.validate()?;
        let dims = params.dimensions();
        let mut grid = Grid2D::new(dims, params.cell_size())?;
        grid.init_uvp(params.initial.u, params.initial.v, params.initial.pressure);
        grid.temperature = load_initial_field(&params.initial.temperature, dims)?;

        let flags = FlagField::from_mask(&params.mask)?;
        let concentrations = params
            .species
            .iter()
            .map(|s| load_initial_field(&s.initial, dims))
            .collect::<Result<Vec<_>, _>>()?;

        let inflow = inflow_for_problem(&params.problem, params.inflow_peak);
        inflow.validate(concentrations.len())?;

        info!(
            "Initialised '{}': {}x{} cells ({} fluid), {} species, {} reactions, inflow {}",
            params.problem,
            dims.0,
            dims.1,
            flags.fluid_cell_count(),
            concentrations.len(),
            params.reactions.len(),
            inflow.name()
        );

        Ok(Self {
            scratch: grid.cell_field(),
            species_names: params.species_names(),
            reactions: params.reaction_system(),
            grid,
            flags,
            concentrations,
            inflow,
            params,
            time: 0.0,
            steps: 0,
        })
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            step: self.steps,
            time: self.time,
            grid: &self.grid,
            concentrations: &self.concentrations,
            species: &self.species_names,
        }
    }

    /// Performs one time step.
    pub fn step(&mut self) -> Result<StepReport, SolverError> {
        let _step_span = debug_span!("time_step", step = self.steps + 1).entered();
        let dims = self.grid.dimensions;
        let cell = self.grid.cell_size;
        let bcs = self.params.boundaries;

        // --- Boundary values ---
        apply_velocity_boundaries(&mut self.grid.u, &mut self.grid.v, &bcs.velocity, dims);
        apply_temperature_boundaries(&mut self.grid.temperature, &bcs.temperature, dims, cell);
        for c in self.concentrations.iter_mut() {
            apply_concentration_boundaries(c, dims);
        }
        apply_obstacle_boundaries(&mut self.grid, &self.flags);
        self.inflow.apply(&mut self.grid, &mut self.concentrations)?;

        // --- Step size ---
        let (dt, limit, bounds) = if self.params.time.is_adaptive() {
            let reaction =
                self.reactions
                    .reaction_max_dt(&mut self.concentrations, &self.grid.temperature, &self.flags)?;
            let bounds = TimestepBounds::new(
                cell,
                self.params.flow.reynolds,
                self.params.prandtl,
                self.params.max_lambda(),
                max_velocities(&self.grid.u, &self.grid.v),
                reaction,
            );
            let (dt, limit) = adaptive_timestep(self.params.time.tau, &bounds);
            (dt, limit, Some(bounds))
        } else {
            (self.params.time.fixed_dt, TimestepLimit::Fixed, None)
        };

        // --- Chemistry and scalar transport ---
        self.reactions
            .compute_reaction(&mut self.concentrations, &mut self.grid.temperature, &self.flags, dt);

        let gamma = self.params.gamma;
        for (c, species) in self.concentrations.iter_mut().zip(&self.params.species) {
            let transport = ScalarTransport::species(species.lambda, gamma);
            advance_scalar(c, &mut self.scratch, &self.grid.u, &self.grid.v, &self.flags, cell, &transport, dt);
        }
        let heat = ScalarTransport {
            coeff: self.params.flow.reynolds * self.params.prandtl,
            gamma,
            obstacle: bcs.obstacle,
        };
        advance_scalar(
            &mut self.grid.temperature,
            &mut self.scratch,
            &self.grid.u,
            &self.grid.v,
            &self.flags,
            cell,
            &heat,
            dt,
        );

        // --- Momentum and pressure ---
        calculate_fg(&mut self.grid, &self.flags, &self.params.flow, dt);
        calculate_rs(&mut self.grid, &self.flags, dt);
        let pressure = self.solve_pressure()?;
        if !bcs.pressure_is_anchored() {
            normalize_pressure(&mut self.grid.pressure, &self.flags)?;
        }
        calculate_uv(&mut self.grid, &self.flags, dt);

        self.time += dt;
        self.steps += 1;
        debug!(
            "Step {}: t={:.4}, dt={:.3e} ({}), SOR iterations={}, res={:.3e}",
            self.steps, self.time, dt, limit, pressure.iterations, pressure.residual
        );

        Ok(StepReport { step: self.steps, time: self.time, dt, limit, bounds, pressure })
    }

    fn solve_pressure(&mut self) -> Result<PressureSolveReport, SolverError> {
        let SorSettings { omega, eps, itermax } = self.params.sor;
        let bcs = &self.params.boundaries;
        apply_pressure_edges(&mut self.grid.pressure, &bcs.velocity, &bcs.pressure, self.grid.dimensions);
        let mut iterations = 0;
        let mut residual = f64::MAX;
        while iterations < itermax && residual > eps {
            residual = sor_sweep(
                &mut self.grid.pressure,
                &self.grid.rs,
                &self.flags,
                self.grid.cell_size,
                omega,
                &bcs.velocity,
                &bcs.pressure,
            )?;
            iterations += 1;
        }
        let converged = residual <= eps;
        if !converged {
            warn!(iterations, residual, "Pressure iteration did not converge");
        }
        Ok(PressureSolveReport { iterations, residual, converged })
    }

    /// Advances until the configured end time, handing a snapshot to `sink`
    /// every output interval and once more at the end.
    pub fn run(&mut self, sink: &mut dyn SnapshotSink) -> Result<RunSummary, SolverError> {
        let _run_span = info_span!("simulation_run", problem = %self.params.problem).entered();
        let t_end = self.params.time.t_end;
        let interval = self.params.output.interval;
        info!("Starting simulation until t={} with output every {}", t_end, interval);

        let start_time = Instant::now();
        let first_step = self.steps;
        let mut next_output = self.time;
        let mut snapshots = 0;
        let mut unconverged_steps = 0;

        while self.time < t_end {
            if self.time >= next_output {
                info!("Writing snapshot at t={:.4} (step {})", self.time, self.steps);
                sink.write_snapshot(&self.snapshot())?;
                snapshots += 1;
                next_output += interval;
            }
            let report = self.step()?;
            if !report.pressure.converged {
                unconverged_steps += 1;
            }
        }

        sink.write_snapshot(&self.snapshot())?;
        snapshots += 1;
        sink.finish()?;

        let summary = RunSummary {
            steps: self.steps - first_step,
            time: self.time,
            snapshots,
            unconverged_steps,
        };
        info!(
            "Simulation finished in {:.2}s: {} steps, {} snapshots",
            start_time.elapsed().as_secs_f64(),
            summary.steps,
            summary.snapshots
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::bc2d::{BoundaryKind, SquareBoundary, WallCondition};
    use crate::config::{InitialField, SpeciesParameters};
    use crate::domain::grid2d::{CellSize2D, GridDimensions2D};
    use crate::error::OutputError;
    use crate::reaction::{ArrheniusRate, Participant, Reaction};
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Recorder {
        taken: Vec<(usize, f64)>,
        finished: bool,
    }

    impl SnapshotSink for Recorder {
        fn write_snapshot(&mut self, snapshot: &Snapshot<'_>) -> Result<(), OutputError> {
            self.taken.push((snapshot.step, snapshot.time));
            Ok(())
        }

        fn finish(&mut self) -> Result<(), OutputError> {
            self.finished = true;
            Ok(())
        }
    }

    fn heated_box() -> Parameters {
        let mut params = Parameters::closed_box(GridDimensions2D(4, 4), 1.0, 1.0);
        params.time.tau = 0.0;
        params.boundaries.temperature = SquareBoundary::uniform(WallCondition::dirichlet(1.0));
        params
    }

    #[test]
    fn test_first_step_heats_wall_cells() {
        let params = heated_box();
        let mut sim = Simulation::new(params).unwrap();
        let report = sim.step().unwrap();

        let CellSize2D(dx, dy) = sim.grid.cell_size;
        let dt = 0.01;
        let re_pr = 100.0;
        assert_eq!(report.limit, TimestepLimit::Fixed);
        assert!(report.bounds.is_none());
        assert_relative_eq!(report.dt, dt);
        assert!(report.pressure.converged);
        assert_eq!(report.pressure.iterations, 1);

        // corner: two wall ghosts at 2, edge: one, centre: none
        assert_relative_eq!(sim.grid.temperature[(1, 1)], dt * (2.0 / (dx * dx) + 2.0 / (dy * dy)) / re_pr, epsilon = 1e-12);
        assert_relative_eq!(sim.grid.temperature[(2, 1)], dt * (2.0 / (dy * dy)) / re_pr, epsilon = 1e-12);
        assert_relative_eq!(sim.grid.temperature[(2, 2)], 0.0);
        assert_eq!(sim.grid.u.max_abs(), 0.0);
        assert_eq!(sim.grid.v.max_abs(), 0.0);
        assert_eq!(sim.steps(), 1);
        assert_relative_eq!(sim.time(), dt);
    }

    #[test]
    fn test_run_snapshot_cadence() {
        let mut params = heated_box();
        params.time.fixed_dt = 0.125;
        params.time.t_end = 1.0;
        params.output.interval = 0.25;
        let mut sim = Simulation::new(params).unwrap();
        let mut recorder = Recorder::default();

        let summary = sim.run(&mut recorder).unwrap();
        println!("{:?}", summary);
        assert_eq!(summary.steps, 8);
        assert_relative_eq!(summary.time, 1.0);
        assert_eq!(summary.snapshots, 5);
        assert_eq!(summary.unconverged_steps, 0);
        assert!(recorder.finished);
        let steps: Vec<usize> = recorder.taken.iter().map(|(s, _)| *s).collect();
        assert_eq!(steps, vec![0, 2, 4, 6, 8]);

        for i in 1..=4 {
            for j in 1..=4 {
                let t = sim.grid.temperature[(i, j)];
                assert!(t > 0.0 && t < 1.0, "T[{}][{}] = {}", i, j, t);
            }
        }
    }

    #[test]
    fn test_reaction_limits_adaptive_step() {
        let mut params = Parameters::closed_box(GridDimensions2D(4, 4), 1.0, 1.0);
        params.species = vec![
            SpeciesParameters {
                name: "A".to_string(),
                lambda: 0.01,
                formation_enthalpy: 0.0,
                initial: InitialField::Constant(1.0),
            },
            SpeciesParameters {
                name: "B".to_string(),
                lambda: 0.01,
                formation_enthalpy: 0.0,
                initial: InitialField::Constant(0.0),
            },
        ];
        params.reactions = vec![Reaction {
            forward: ArrheniusRate { activation_energy: 0.0, frequency_factor: 1.0 },
            backward: ArrheniusRate { activation_energy: 0.0, frequency_factor: 0.0 },
            reagents: vec![Participant { species: 0, stoichiometric_coeff: 1.0, exponent: 1.0 }],
            products: vec![Participant { species: 1, stoichiometric_coeff: 1.0, exponent: 1.0 }],
        }];
        let mut sim = Simulation::new(params).unwrap();
        let report = sim.step().unwrap();

        assert_eq!(report.limit, TimestepLimit::Reaction);
        let bounds = report.bounds.unwrap();
        assert_relative_eq!(bounds.reaction, 1.0);
        assert_relative_eq!(bounds.species, 1.0 / (2.0 * 0.01 * 32.0));
        assert_relative_eq!(report.dt, 0.5);
        for i in 2..=3 {
            for j in 2..=3 {
                assert_relative_eq!(sim.concentrations[0][(i, j)], 0.5, epsilon = 1e-12);
                assert_relative_eq!(sim.concentrations[1][(i, j)], 0.5, epsilon = 1e-12);
            }
        }
        // wall ghosts still hold the values from before the reaction
        assert_relative_eq!(sim.concentrations[0][(1, 1)], 0.58, epsilon = 1e-12);
        assert_relative_eq!(sim.concentrations[1][(1, 1)], 0.42, epsilon = 1e-12);
        let snapshot = sim.snapshot();
        assert_eq!(snapshot.species, &["A".to_string(), "B".to_string()]);
    }

    fn pressure_channel() -> Parameters {
        let mut params = Parameters::closed_box(GridDimensions2D(6, 4), 6.0, 4.0);
        params.time.tau = 0.0;
        params.boundaries.velocity = SquareBoundary::new(
            BoundaryKind::Pressure,
            BoundaryKind::Pressure,
            BoundaryKind::NoSlip,
            BoundaryKind::NoSlip,
        );
        params.boundaries.pressure = SquareBoundary::new(1.0, 0.0, 0.0, 0.0);
        params
    }

    #[test]
    fn test_wall_pressure_drives_first_solve() {
        let mut params = pressure_channel();
        params.sor = SorSettings { omega: 1.5, eps: 1e-10, itermax: 5000 };
        let mut sim = Simulation::new(params).unwrap();
        let report = sim.step().unwrap();
        println!("{:?}", report.pressure);

        assert!(report.pressure.converged);
        assert!(report.pressure.iterations > 1);
        for i in 1..=6 {
            let expected = 1.0 - (i as f64 - 0.5) / 6.0;
            assert_relative_eq!(sim.grid.pressure[(i, 2)], expected, epsilon = 1e-6);
        }
        // the pressure drop accelerates the fluid towards the right wall
        assert!(sim.grid.u[(3, 2)] > 0.0);
    }

    #[test]
    fn test_unconverged_pressure_is_reported() {
        let mut params = pressure_channel();
        params.sor = SorSettings { omega: 1.5, eps: 1e-12, itermax: 1 };
        params.time.fixed_dt = 0.125;
        params.time.t_end = 0.25;
        let mut sim = Simulation::new(params.clone()).unwrap();
        let report = sim.step().unwrap();
        assert!(!report.pressure.converged);
        assert_eq!(report.pressure.iterations, 1);
        assert!(report.pressure.residual > 1e-12);

        let mut sim = Simulation::new(params).unwrap();
        let mut recorder = Recorder::default();
        let summary = sim.run(&mut recorder).unwrap();
        assert_eq!(summary.steps, 2);
        assert_eq!(summary.unconverged_steps, 2);
        assert!(recorder.finished);
    }

    #[test]
    fn test_mixing_requires_four_species() {
        let mut params = Parameters::closed_box(GridDimensions2D(4, 4), 1.0, 1.0);
        params.problem = "Mixing".to_string();
        assert!(matches!(Simulation::new(params), Err(SolverError::Boundary(_))));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut params = Parameters::closed_box(GridDimensions2D(4, 4), 1.0, 1.0);
        params.sor.omega = 0.0;
        assert!(matches!(Simulation::new(params), Err(SolverError::Config(_))));
    }
}
