//! Agent Fixtures

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::bookings::{Agent, AgentStatus};

use super::{FixtureError, catalog::parse_rate};

/// Wrapper for agents in YAML
#[derive(Debug, Deserialize)]
pub struct AgentsFixture {
    /// Map of agent code -> agent fixture
    pub agents: FxHashMap<String, AgentFixture>,
}

/// Agent Fixture
#[derive(Debug, Deserialize)]
pub struct AgentFixture {
    /// Company name
    pub company_name: String,

    /// Commission rate (e.g., "10%")
    pub commission_rate: String,

    /// Account state, active when omitted
    #[serde(default)]
    pub status: AgentStatus,
}

impl AgentFixture {
    /// Decode into an agent with the given code.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::InvalidPercentage`] if the commission rate is malformed.
    pub fn into_agent(self, code: String) -> Result<Agent, FixtureError> {
        let mut agent = Agent::new(code, self.company_name, parse_rate(&self.commission_rate)?);

        agent.status = self.status;

        Ok(agent)
    }
}
