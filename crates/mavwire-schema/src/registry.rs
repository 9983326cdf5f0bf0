use std::collections::HashMap;
use std::sync::Arc;

use crate::definition::MessageDefinition;

/// Registry of message definitions keyed by numeric id and by name.
///
/// Built once and then shared read-only; definitions are handed out as
/// `Arc`s so messages can outlive a borrow of the schema.
#[derive(Debug, Clone)]
pub struct Schema {
    by_id: [Option<Arc<MessageDefinition>>; 256],
    by_name: HashMap<String, Arc<MessageDefinition>>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self {
            by_id: std::array::from_fn(|_| None),
            by_name: HashMap::new(),
        }
    }

    /// Build a schema from definitions, in registration order.
    pub fn from_definitions(definitions: impl IntoIterator<Item = MessageDefinition>) -> Self {
        let mut schema = Self::new();
        for definition in definitions {
            schema.register(definition);
        }
        schema
    }

    /// Register a definition, replacing any occupant of its id slot.
    pub fn register(&mut self, definition: MessageDefinition) {
        let definition = Arc::new(definition);
        let slot = &mut self.by_id[usize::from(definition.id())];

        if let Some(previous) = slot.replace(Arc::clone(&definition)) {
            tracing::warn!(
                id = previous.id(),
                previous = previous.name(),
                replacement = definition.name(),
                "replacing message definition"
            );
            let stale = self
                .by_name
                .get(previous.name())
                .is_some_and(|named| Arc::ptr_eq(named, &previous));
            if stale {
                self.by_name.remove(previous.name());
            }
        }

        self.by_name
            .insert(definition.name().to_string(), definition);
    }

    pub fn by_id(&self, id: u8) -> Option<&Arc<MessageDefinition>> {
        self.by_id[usize::from(id)].as_ref()
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<MessageDefinition>> {
        self.by_name.get(name)
    }

    /// Registered definitions in ascending id order.
    pub fn definitions(&self) -> impl Iterator<Item = &Arc<MessageDefinition>> {
        self.by_id.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.definitions().count()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.iter().all(Option::is_none)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
