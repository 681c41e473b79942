use crate::domain::{ConfigurationError, ExpanderConfig, ScenarioDefinition, VariationParameters};
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Turns one scenario definition plus a variation index into a concrete
/// parameter set. Seeded once at construction; every `(scenario, index)`
/// expansion is derived from that seed alone, so a single variation is
/// reproducible without replaying earlier calls.
#[derive(Debug)]
pub struct VariationExpander {
    config: ExpanderConfig,
    base_seed: u64,
}

impl VariationExpander {
    /// Seeds from entropy; use [`VariationExpander::with_seed`] when runs must
    /// be reproducible.
    pub fn new(config: ExpanderConfig) -> Result<Self, ConfigurationError> {
        let seed = rand::random::<u64>();
        Self::with_seed(config, seed)
    }

    pub fn with_seed(config: ExpanderConfig, seed: u64) -> Result<Self, ConfigurationError> {
        if config.agent_names.is_empty() {
            return Err(ConfigurationError::EmptyNamePool { pool: "agent" });
        }
        if config.customer_names.is_empty() {
            return Err(ConfigurationError::EmptyNamePool { pool: "customer" });
        }
        let (amount_min, amount_max) = config.amount_range;
        if amount_min > amount_max || amount_min < 0.0 {
            return Err(ConfigurationError::InvalidAmountRange {
                min: amount_min,
                max: amount_max,
            });
        }
        let (days_min, days_max) = config.due_days_past;
        if days_min > days_max || days_min < 0 {
            return Err(ConfigurationError::InvalidDateRange {
                min: days_min,
                max: days_max,
            });
        }
        Ok(Self {
            config,
            base_seed: seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.base_seed
    }

    /// Expands variation `index` (1-based) of `scenario`.
    ///
    /// Customer and agent names are drawn without replacement within one
    /// scenario's variations: both pools are shuffled once per scenario (a
    /// deterministic function of the seed and scenario id) and indexed by the
    /// variation number, so two variations of the same scenario only share a
    /// name when the pool is smaller than the variation count.
    pub fn expand(
        &self,
        scenario: &ScenarioDefinition,
        index: u32,
    ) -> Result<VariationParameters, ConfigurationError> {
        scenario.ensure_valid()?;
        if index == 0 {
            return Err(ConfigurationError::InvalidVariationIndex(index));
        }

        let slot = (index - 1) as usize;
        let customer_name = self.draw_name(&self.config.customer_names, &scenario.id, 0x43, slot);
        let agent_name = self.draw_name(&self.config.agent_names, &scenario.id, 0x41, slot);

        let mut rng = self.derived_rng(&scenario.id, u64::from(index));
        let (amount_min, amount_max) = self.config.amount_range;
        let debt_amount = if amount_min == amount_max {
            amount_min
        } else {
            rng.gen_range(amount_min..=amount_max).round()
        };

        let (days_min, days_max) = self.config.due_days_past;
        let days_ago = if days_min == days_max {
            days_min
        } else {
            rng.gen_range(days_min..=days_max)
        };
        let reference = self
            .config
            .reference_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let due_date = reference - Duration::days(days_ago);

        Ok(VariationParameters {
            variation_index: index,
            customer_name,
            agent_name,
            debt_amount,
            due_date,
        })
    }

    fn draw_name(&self, pool: &[String], scenario_id: &str, salt: u64, slot: usize) -> String {
        let mut order: Vec<usize> = (0..pool.len()).collect();
        let mut rng = self.derived_rng(scenario_id, salt);
        order.shuffle(&mut rng);
        pool[order[slot % pool.len()]].clone()
    }

    fn derived_rng(&self, scenario_id: &str, salt: u64) -> StdRng {
        let mut hasher = DefaultHasher::new();
        self.base_seed.hash(&mut hasher);
        scenario_id.hash(&mut hasher);
        salt.hash(&mut hasher);
        StdRng::seed_from_u64(hasher.finish())
    }
}
