//! Cascading Invalidation
//!
//! Resolves an entity against the dependency table, clears the derived keys
//! from every instance, then signals the external revalidation hook.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::cache::CacheRegistry;
use crate::invalidation::dependencies::{Dependency, DependencyTable};
use crate::invalidation::revalidate::Revalidator;

// == Entity Ref ==
/// An entity whose cached derivatives must be invalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub entity_type: String,
    pub id: String,
    pub owner_id: Option<String>,
}

impl EntityRef {
    pub fn new(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            id: id.into(),
            owner_id: None,
        }
    }

    pub fn owned_by(mut self, owner_id: impl Into<String>) -> Self {
        self.owner_id = Some(owner_id.into());
        self
    }
}

// == Invalidation Report ==
/// What one invalidation call removed and signalled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InvalidationReport {
    /// Entries actually removed, summed over all instances
    pub keys_removed: usize,
    /// Tags sent to the revalidation hook
    pub tags: Vec<String>,
    /// Paths sent to the revalidation hook
    pub paths: Vec<String>,
}

// == Invalidator ==
#[derive(Clone)]
pub struct Invalidator {
    registry: CacheRegistry,
    table: Arc<DependencyTable>,
    revalidator: Arc<dyn Revalidator>,
}

impl Invalidator {
    pub fn new(
        registry: CacheRegistry,
        table: DependencyTable,
        revalidator: Arc<dyn Revalidator>,
    ) -> Self {
        Self {
            registry,
            table: Arc::new(table),
            revalidator,
        }
    }

    pub fn table(&self) -> &DependencyTable {
        &self.table
    }

    // == Cascade ==
    /// Clears every key derived from `(entity_type, id)` in every instance and
    /// fires the entity's tags and paths once each.
    ///
    /// Unknown entity types and keys that are not cached are no-ops.
    pub fn cascade_invalidation(
        &self,
        entity_type: &str,
        id: &str,
        owner_id: Option<&str>,
    ) -> InvalidationReport {
        let Some(dependency) = self.table.get(entity_type) else {
            debug!(entity_type = %entity_type, id = %id, "No dependencies declared, nothing to invalidate");
            return InvalidationReport::default();
        };

        let keys_removed = self.clear_memory(dependency, id, owner_id);

        let mut tags = Vec::new();
        let mut paths = Vec::new();
        push_unique(&mut tags, &mut HashSet::new(), dependency.resolve_tags(id, owner_id));
        push_unique(&mut paths, &mut HashSet::new(), dependency.resolve_paths(id, owner_id));
        self.fire(&tags, &paths);

        info!(
            entity_type = %entity_type,
            id = %id,
            owner = ?owner_id,
            keys_removed,
            tags = tags.len(),
            "Cascaded invalidation"
        );

        InvalidationReport {
            keys_removed,
            tags,
            paths,
        }
    }

    // == Batch ==
    /// Invalidates several entities, firing each distinct tag and path once
    /// across the whole batch before clearing memory per entity.
    pub fn batch_invalidation(&self, entities: &[EntityRef]) -> InvalidationReport {
        let mut tags = Vec::new();
        let mut paths = Vec::new();
        let mut seen_tags = HashSet::new();
        let mut seen_paths = HashSet::new();

        let resolved: Vec<(&EntityRef, &Dependency)> = entities
            .iter()
            .filter_map(|entity| {
                let dependency = self.table.get(&entity.entity_type);
                if dependency.is_none() {
                    debug!(entity_type = %entity.entity_type, id = %entity.id, "Skipping entity without dependencies");
                }
                dependency.map(|dependency| (entity, dependency))
            })
            .collect();

        for (entity, dependency) in &resolved {
            let owner = entity.owner_id.as_deref();
            push_unique(&mut tags, &mut seen_tags, dependency.resolve_tags(&entity.id, owner));
            push_unique(&mut paths, &mut seen_paths, dependency.resolve_paths(&entity.id, owner));
        }
        self.fire(&tags, &paths);

        let keys_removed: usize = resolved
            .iter()
            .map(|(entity, dependency)| {
                self.clear_memory(dependency, &entity.id, entity.owner_id.as_deref())
            })
            .sum();

        info!(
            entities = entities.len(),
            keys_removed,
            tags = tags.len(),
            paths = paths.len(),
            "Batch invalidation complete"
        );

        InvalidationReport {
            keys_removed,
            tags,
            paths,
        }
    }

    // == Prefix ==
    /// Removes every key starting with `prefix` from every instance. Memory only.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut removed = 0;
        for cache in self.registry.all() {
            for key in cache.keys().into_iter().filter(|key| key.starts_with(prefix)) {
                if cache.delete(&key) {
                    removed += 1;
                }
            }
        }
        debug!(prefix = %prefix, removed, "Prefix invalidation");
        removed
    }

    // == All ==
    /// Clears every instance and revalidates the site root.
    pub fn invalidate_all(&self) {
        self.registry.clear_all();
        self.revalidator.revalidate_path("/");
        info!("Invalidated all cache instances");
    }

    fn clear_memory(&self, dependency: &Dependency, id: &str, owner_id: Option<&str>) -> usize {
        dependency
            .resolve_keys(id, owner_id)
            .iter()
            .map(|key| self.registry.delete_everywhere(key))
            .sum()
    }

    fn fire(&self, tags: &[String], paths: &[String]) {
        for tag in tags {
            self.revalidator.revalidate_tag(tag);
        }
        for path in paths {
            self.revalidator.revalidate_path(path);
        }
    }
}

fn push_unique(target: &mut Vec<String>, seen: &mut HashSet<String>, items: Vec<String>) {
    for item in items {
        if seen.insert(item.clone()) {
            target.push(item);
        }
    }
}
