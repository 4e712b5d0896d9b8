use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Conditions a simulation runs under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Share of cooperative-leaning agents when a population is seeded from the environment.
    pub cooperation_probability: f64,
    /// Fraction of the population sampled for mutation each generation.
    pub mutation_rate: f64,
}

impl Environment {
    pub fn validate(&self) -> Result<()> {
        for (what, value) in [
            ("cooperation probability", self.cooperation_probability),
            ("mutation rate", self.mutation_rate),
        ] {
            if !(value.is_finite() && (0.0..=1.0).contains(&value)) {
                return Err(SimError::invalid(format!(
                    "environment {} {} must be within [0, 1], got {}",
                    self.id, what, value
                )));
            }
        }
        Ok(())
    }
}

/// Source of environments by id.
pub trait EnvironmentLookup: Send + Sync {
    fn environment(&self, id: &str) -> Result<Environment>;

    fn environments(&self) -> Vec<Environment>;
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentCatalog {
    environments: Vec<Environment>,
}

impl EnvironmentCatalog {
    pub fn new(environments: Vec<Environment>) -> Self {
        Self { environments }
    }

    pub fn with_defaults() -> Self {
        Self::new(default_environments())
    }

    /// Add or replace by id.
    pub fn insert(&mut self, environment: Environment) -> Result<()> {
        environment.validate()?;
        match self.environments.iter_mut().find(|e| e.id == environment.id) {
            Some(existing) => *existing = environment,
            None => self.environments.push(environment),
        }
        Ok(())
    }
}

impl EnvironmentLookup for EnvironmentCatalog {
    fn environment(&self, id: &str) -> Result<Environment> {
        self.environments
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| SimError::EnvironmentNotFound(id.to_string()))
    }

    fn environments(&self) -> Vec<Environment> {
        self.environments.clone()
    }
}

pub fn default_environments() -> Vec<Environment> {
    vec![
        Environment {
            id: "balanced".to_string(),
            name: "Balanced World".to_string(),
            description: "50% cooperative, 50% defecting".to_string(),
            cooperation_probability: 0.5,
            mutation_rate: 0.1,
        },
        Environment {
            id: "hostile".to_string(),
            name: "Hostile World".to_string(),
            description: "80% defecting".to_string(),
            cooperation_probability: 0.2,
            mutation_rate: 0.2,
        },
        Environment {
            id: "friendly".to_string(),
            name: "Friendly World".to_string(),
            description: "80% cooperative".to_string(),
            cooperation_probability: 0.8,
            mutation_rate: 0.05,
        },
    ]
}
