//! Vitality Engine
//!
//! Per-note "aliveness" score in [0,1], built on an ACT-R inspired
//! base-level activation term and adjusted for metabolic role, structure,
//! access saturation, recent revivals, and bridge status.
//!
//! The adjustment steps run in a fixed order; each operates on the running
//! value produced by the previous step.

use crate::vault::{MetabolicRole, VitalityConfig};

/// Amplitude of the revival bonus
const REVIVAL_BONUS: f64 = 0.2;

/// Structural boost ceiling
const STRUCTURAL_BOOST_MAX: f64 = 2.0;

// ============================================================================
// INPUTS
// ============================================================================

/// Everything the vitality model needs to know about one note
#[derive(Debug, Clone, Copy, Default)]
pub struct VitalityInputs {
    /// Recorded access count
    pub access_count: u32,
    /// Whole days since creation
    pub lifetime_days: f64,
    /// Distinct notes linking here
    pub in_degree: usize,
    /// Decay regime
    pub role: MetabolicRole,
    /// Member of the graph bridge set
    pub is_bridge: bool,
    /// Days since the most recent new incoming link, when one exists
    pub days_since_new_connection: Option<f64>,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Computes vitality scores from access history, age, connectivity, and role
#[derive(Debug, Clone)]
pub struct VitalityEngine {
    config: VitalityConfig,
    bridge_floor: f64,
}

impl VitalityEngine {
    /// Create an engine from the vitality config and the bridge floor
    pub fn new(config: VitalityConfig, bridge_floor: f64) -> Self {
        Self {
            config,
            bridge_floor,
        }
    }

    /// Score one note into [0,1]
    pub fn score(&self, inputs: &VitalityInputs) -> f64 {
        let mut vitality = self.base_activation(inputs);

        // Structural boost from incoming links
        let counted = inputs
            .in_degree
            .min(self.config.structural_boost_cap as usize) as f64;
        let boost = 1.0 + self.config.structural_boost_per_link * counted;
        vitality *= boost.min(STRUCTURAL_BOOST_MAX);

        // Access saturation blend
        let n = inputs.access_count as f64;
        vitality *= 0.5 + 0.5 * (1.0 - (-n / self.config.access_saturation_k).exp());

        // Revival bonus for a new incoming link inside the window
        if let Some(days) = inputs.days_since_new_connection {
            if days <= self.config.revival_window_days as f64 {
                vitality += REVIVAL_BONUS * (-self.config.revival_decay_rate * days).exp();
            }
        }

        // Bridge notes never fall below the floor
        if inputs.is_bridge {
            vitality = vitality.max(self.bridge_floor);
        }

        vitality.clamp(0.0, 1.0)
    }

    /// ACT-R base-level activation, sigmoid-normalized into [0,1]
    ///
    /// `B = ln(n/(1-d)) - d*ln(L)` with the effective decay `d` scaled by
    /// the note's metabolic rate and clamped into (0.01, 0.99).
    fn base_activation(&self, inputs: &VitalityInputs) -> f64 {
        if inputs.lifetime_days == 0.0 {
            return 1.0;
        }
        if inputs.access_count == 0 {
            return 0.5;
        }

        let rate = match inputs.role {
            MetabolicRole::Identity => self.config.metabolic_rates.identity,
            MetabolicRole::Notes => self.config.metabolic_rates.notes,
            MetabolicRole::Ops => self.config.metabolic_rates.ops,
        };
        let decay = (self.config.actr_decay * rate).clamp(0.01, 0.99);

        let n = inputs.access_count as f64;
        let activation = (n / (1.0 - decay)).ln() - decay * inputs.lifetime_days.ln();
        sigmoid(activation)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

// ============================================================================
// TESTS
// ============================================================================
