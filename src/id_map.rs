/// Bidirectional mapping between read / taxon names and dense integer ids.
/// Ids are handed out in first-seen order starting from 0, so they can index vectors directly.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct IdMap {
    name2id: AHashMap<String, u32>,
    names: Vec<String>,
}

impl IdMap {

    pub fn new() -> Self {
        Self::default()
    }

    /// Get the id of a name, assigning the next free id the first time the name is seen
    pub fn get_or_insert(&mut self, name: &str) -> u32 {
        if let Some(&id) = self.name2id.get(name) {
            return id;
        }
        let id = self.names.len() as u32;
        self.name2id.insert(name.to_owned(), id);
        self.names.push(name.to_owned());
        id
    }

    /// Look up an id without registering the name
    pub fn get(&self, name: &str) -> Option<u32> {
        self.name2id.get(name).copied()
    }

    /// Original name for an id
    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
