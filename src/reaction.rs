//! Arrhenius kinetics of the dissolved species.
//!
//! Reactions are integrated with explicit Euler inside fluid cells. The heat
//! of reaction feeds back into the temperature field.

use crate::domain::flags::FlagField;
use crate::domain::grid2d::{Field2D, GridDimensions2D};
use crate::error::SolverError;

/// `k(T) = A · exp(−E / T)` with `T` on the absolute scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrheniusRate {
    /// Activation energy divided by the gas constant.
    pub activation_energy: f64,
    pub frequency_factor: f64,
}

impl ArrheniusRate {
    pub fn constant(&self, absolute_temperature: f64) -> f64 {
        self.frequency_factor * (-self.activation_energy / absolute_temperature).exp()
    }
}

/// A species taking part in a reaction, referenced by its index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Participant {
    pub species: usize,
    pub stoichiometric_coeff: f64,
    pub exponent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub forward: ArrheniusRate,
    pub backward: ArrheniusRate,
    pub reagents: Vec<Participant>,
    pub products: Vec<Participant>,
}

impl Reaction {
    /// Net forward rate at one point, given the concentration of each species.
    pub fn rate<C>(&self, concentration: C, absolute_temperature: f64) -> f64
    where
        C: Fn(usize) -> f64,
    {
        let mass_action = |participants: &[Participant]| {
            participants
                .iter()
                .map(|p| concentration(p.species).powf(p.exponent))
                .product::<f64>()
        };
        self.forward.constant(absolute_temperature) * mass_action(&self.reagents)
            - self.backward.constant(absolute_temperature) * mass_action(&self.products)
    }
}

/// All reactions of a run together with the thermal data they need.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionSystem {
    pub reactions: Vec<Reaction>,
    /// Formation enthalpy per species, indexed like the concentration fields.
    pub formation_enthalpy: Vec<f64>,
    /// Density times heat capacity.
    pub vol_cp: f64,
    /// Offset from the temperature field to the absolute scale.
    pub t_inf: f64,
}

impl ReactionSystem {
    pub fn species_count(&self) -> usize {
        self.formation_enthalpy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// Fills `rates` with the net production rate of every species at `(i, j)`.
    pub fn rate_vector(
        &self,
        concentrations: &[Field2D],
        temperature: &Field2D,
        i: usize,
        j: usize,
        rates: &mut [f64],
    ) {
        rates.iter_mut().for_each(|r| *r = 0.0);
        let absolute = temperature[(i, j)] + self.t_inf;
        for reaction in &self.reactions {
            let rate = reaction.rate(|s| concentrations[s][(i, j)], absolute);
            for p in &reaction.reagents {
                rates[p.species] -= rate * p.stoichiometric_coeff;
            }
            for p in &reaction.products {
                rates[p.species] += rate * p.stoichiometric_coeff;
            }
        }
    }

    /// One explicit Euler step of the kinetics in every fluid cell, including
    /// the temperature change from the released heat.
    ///
    /// The heat term is the instantaneous production divided by `vol_cp` and
    /// is not scaled by `dt`.
    pub fn compute_reaction(
        &self,
        concentrations: &mut [Field2D],
        temperature: &mut Field2D,
        flags: &FlagField,
        dt: f64,
    ) {
        if self.is_empty() {
            return;
        }
        let GridDimensions2D(imax, jmax) = flags.dimensions();
        let mut rates = vec![0.0; self.species_count()];

        for i in 1..=imax {
            for j in 1..=jmax {
                if !flags.is_fluid(i, j) {
                    continue;
                }
                self.rate_vector(concentrations, temperature, i, j, &mut rates);
                let mut heat_production = 0.0;
                for (s, rate) in rates.iter().enumerate() {
                    concentrations[s][(i, j)] += dt * rate;
                    heat_production -= self.formation_enthalpy[s] * rate;
                }
                temperature[(i, j)] += heat_production / self.vol_cp;
            }
        }
    }

    /// Largest step that keeps every consumed species non-negative.
    ///
    /// Negative concentrations are clamped to zero first. Returns `f64::MAX`
    /// when nothing is being consumed anywhere.
    pub fn reaction_max_dt(
        &self,
        concentrations: &mut [Field2D],
        temperature: &Field2D,
        flags: &FlagField,
    ) -> Result<f64, SolverError> {
        if self.is_empty() {
            return Ok(f64::MAX);
        }
        let GridDimensions2D(imax, jmax) = flags.dimensions();
        let mut rates = vec![0.0; self.species_count()];
        let mut max_dt = f64::MAX;

        for i in 1..=imax {
            for j in 1..=jmax {
                if !flags.is_fluid(i, j) {
                    continue;
                }
                for c in concentrations.iter_mut() {
                    c[(i, j)] = 0.5 * (c[(i, j)] + c[(i, j)].abs());
                }
                self.rate_vector(concentrations, temperature, i, j, &mut rates);
                for (s, &rate) in rates.iter().enumerate() {
                    if rate < 0.0 {
                        max_dt = max_dt.min(concentrations[s][(i, j)] / -rate);
                    }
                }
            }
        }

        if max_dt > 0.0 {
            Ok(max_dt)
        } else {
            Err(SolverError::NonPositiveReactionTimestep(max_dt))
        }
    }
}
