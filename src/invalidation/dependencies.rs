//! Dependency Table Module
//!
//! Declarative mapping from an entity type to the cache keys, external tags
//! and route paths derived from it. Templates may reference `{id}` (the
//! entity) and `{owner}` (the owning user); a template naming `{owner}` is
//! skipped when no owner is known.

use std::collections::HashMap;

// == Dependency ==
/// Everything derived from one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependency {
    /// Cache key templates, cleared from every instance
    pub keys: Vec<String>,
    /// External revalidation tag templates
    pub tags: Vec<String>,
    /// External revalidation path templates
    pub paths: Vec<String>,
}

impl Dependency {
    pub fn new<K, T, P>(keys: K, tags: T, paths: P) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            tags: tags.into_iter().map(Into::into).collect(),
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Concrete keys for one entity.
    pub fn resolve_keys(&self, id: &str, owner: Option<&str>) -> Vec<String> {
        resolve_all(&self.keys, id, owner)
    }

    /// Concrete tags for one entity.
    pub fn resolve_tags(&self, id: &str, owner: Option<&str>) -> Vec<String> {
        resolve_all(&self.tags, id, owner)
    }

    /// Concrete paths for one entity.
    pub fn resolve_paths(&self, id: &str, owner: Option<&str>) -> Vec<String> {
        resolve_all(&self.paths, id, owner)
    }
}

// == Dependency Table ==
/// Entity type to [`Dependency`] lookup.
#[derive(Debug, Clone, Default)]
pub struct DependencyTable {
    entries: HashMap<String, Dependency>,
}

impl DependencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the dependency for `entity_type`.
    pub fn with(mut self, entity_type: impl Into<String>, dependency: Dependency) -> Self {
        self.entries.insert(entity_type.into(), dependency);
        self
    }

    pub fn get(&self, entity_type: &str) -> Option<&Dependency> {
        self.entries.get(entity_type)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// The application's table: users own projects, dashboards aggregate both.
pub fn default_table() -> DependencyTable {
    DependencyTable::new()
        .with(
            "user",
            Dependency::new(
                [
                    "user:{id}:profile",
                    "user:{id}:projects",
                    "user:{id}:stats",
                    "dashboard:{id}",
                ],
                ["user:{id}", "users"],
                ["/dashboard", "/profile"],
            ),
        )
        .with(
            "project",
            Dependency::new(
                [
                    "project:{id}:details",
                    "project:{id}:progress",
                    "user:{owner}:projects",
                    "user:{owner}:stats",
                    "dashboard:{owner}",
                ],
                ["project:{id}", "projects", "user:{owner}"],
                ["/projects", "/projects/{id}", "/dashboard"],
            ),
        )
}

// == Template Resolution ==
/// Substitutes `{id}` and `{owner}` in one template.
///
/// Returns None when the template needs an owner and none was given.
pub fn resolve(template: &str, id: &str, owner: Option<&str>) -> Option<String> {
    let resolved = template.replace("{id}", id);
    if resolved.contains("{owner}") {
        owner.map(|owner| resolved.replace("{owner}", owner))
    } else {
        Some(resolved)
    }
}

fn resolve_all(templates: &[String], id: &str, owner: Option<&str>) -> Vec<String> {
    templates
        .iter()
        .filter_map(|template| resolve(template, id, owner))
        .collect()
}
