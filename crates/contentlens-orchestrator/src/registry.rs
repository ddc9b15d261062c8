use contentlens_core::{Capability, CapabilityAgent};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Dispatch table from capability to the agent implementing it.
pub struct AgentRegistry {
    agents: HashMap<Capability, Arc<dyn CapabilityAgent>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: HashMap::new(),
        }
    }

    /// Register an agent under the capability it reports. Replaces any
    /// previous agent for that capability.
    pub fn register(&mut self, agent: Arc<dyn CapabilityAgent>) {
        let capability = agent.capability();
        info!(capability = %capability, "Registered capability agent");
        self.agents.insert(capability, agent);
    }

    pub fn with_agents(agents: impl IntoIterator<Item = Arc<dyn CapabilityAgent>>) -> Self {
        let mut registry = Self::new();
        for agent in agents {
            registry.register(agent);
        }
        registry
    }

    pub fn get(&self, capability: Capability) -> Option<&Arc<dyn CapabilityAgent>> {
        self.agents.get(&capability)
    }

    /// Capabilities without a registered agent, in canonical order.
    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.agents.contains_key(c))
            .collect()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}
