//! Serves recorded interactions back in order.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

/// Replays a cassette, one queue per port/method pair.
#[derive(Debug, Clone)]
pub struct CassetteReplayer {
    queues: HashMap<(String, String), Vec<Interaction>>,
    cursors: HashMap<(String, String), usize>,
}

impl CassetteReplayer {
    /// Indexes the interactions of `cassette`.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<(String, String), Vec<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            queues
                .entry((interaction.port.clone(), interaction.method.clone()))
                .or_default()
                .push(interaction.clone());
        }
        Self {
            queues,
            cursors: HashMap::new(),
        }
    }

    /// Returns the next unconsumed interaction for `port` and `method`.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error if the cassette has no (more)
    /// interactions for that pair.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Result<&Interaction, String> {
        let key = (port.to_string(), method.to_string());
        let Some(queue) = self.queues.get(&key) else {
            let mut available: Vec<String> =
                self.queues.keys().map(|(p, m)| format!("{p}::{m}")).collect();
            available.sort();
            return Err(format!(
                "Cassette exhausted: no interactions recorded for {port}::{method}. \
                 Available: [{}]",
                available.join(", ")
            ));
        };

        let cursor = self.cursors.entry(key).or_insert(0);
        let Some(interaction) = queue.get(*cursor) else {
            return Err(format!(
                "Cassette exhausted: all {} interactions for {port}::{method} have been consumed",
                queue.len()
            ));
        };
        *cursor += 1;
        Ok(interaction)
    }
}
