//! Preloading
//!
//! Populates the caches for known access patterns. The fetches of one
//! pattern run concurrently; the pattern either succeeds as a whole or
//! stores nothing.

use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::cache::CacheRegistry;
use crate::error::Result;
use crate::keys;
use crate::warming::source::DataSources;

// == Preload Target ==
/// A known access pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadTarget {
    /// Profile, project list and project statistics of one user
    UserDashboard(String),
    /// Project list of one owner
    UserProjects(String),
    /// Details of one project (plus the owner's list when an owner is given)
    Project(String),
    /// A route path, resolved to one of the other targets
    Route(String),
}

impl PreloadTarget {
    /// Maps a route path to its data target.
    ///
    /// `/dashboard` and `/projects` need an owner; `/projects/{id}` does not.
    pub fn from_route(path: &str, owner_id: Option<&str>) -> Option<Self> {
        let segments: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match segments.as_slice() {
            ["dashboard"] => owner_id.map(|owner| Self::UserDashboard(owner.to_string())),
            ["projects"] => owner_id.map(|owner| Self::UserProjects(owner.to_string())),
            ["projects", id] => Some(Self::Project((*id).to_string())),
            _ => None,
        }
    }
}

// == Preloader ==
#[derive(Clone)]
pub struct Preloader {
    registry: CacheRegistry,
    sources: DataSources,
    ttl: Duration,
}

impl Preloader {
    /// `ttl` is applied to every entry a preload stores.
    pub fn new(registry: CacheRegistry, sources: DataSources, ttl: Duration) -> Self {
        Self {
            registry,
            sources,
            ttl,
        }
    }

    // == Preload ==
    /// Runs the fetches of `target`, caches each result under its canonical key
    /// and returns the combined value.
    ///
    /// Returns `None` when any fetch fails, when the root entity does not exist,
    /// or when a route maps to no target. Nothing is cached in those cases.
    pub async fn preload(&self, target: &PreloadTarget, owner_id: Option<&str>) -> Option<Value> {
        let resolved = match target {
            PreloadTarget::Route(path) => match PreloadTarget::from_route(path, owner_id) {
                Some(resolved) => resolved,
                None => {
                    debug!(path = %path, owner = ?owner_id, "Route has no preload target");
                    return None;
                }
            },
            other => other.clone(),
        };

        let result = match &resolved {
            PreloadTarget::UserDashboard(user_id) => self.preload_dashboard(user_id).await,
            PreloadTarget::UserProjects(owner) => self.preload_user_projects(owner).await,
            PreloadTarget::Project(project_id) => self.preload_project(project_id, owner_id).await,
            PreloadTarget::Route(_) => Ok(None),
        };

        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(preload = ?resolved, owner = ?owner_id, error = %err, "Preload failed, nothing cached");
                None
            }
        }
    }

    async fn preload_dashboard(&self, user_id: &str) -> Result<Option<Value>> {
        let (profile, projects, stats) = tokio::try_join!(
            self.sources.users.fetch(user_id),
            self.sources.user_projects.fetch(user_id),
            self.sources.user_stats.fetch(user_id),
        )?;

        let Some(profile) = profile else {
            debug!(user = %user_id, "User not found, dashboard not preloaded");
            return Ok(None);
        };
        let projects = projects.unwrap_or_else(|| json!([]));
        let stats = stats.unwrap_or_else(|| {
            json!({ "projectCount": projects.as_array().map_or(0, Vec::len) })
        });

        let user_cache = self.registry.user();
        user_cache.set(keys::user_profile(user_id), profile.clone(), Some(self.ttl));
        user_cache.set(keys::user_projects(user_id), projects.clone(), Some(self.ttl));
        user_cache.set(keys::user_stats(user_id), stats.clone(), Some(self.ttl));

        let dashboard = json!({
            "profile": profile,
            "projects": projects,
            "stats": stats,
        });
        self.registry
            .global()
            .set(keys::dashboard(user_id), dashboard.clone(), Some(self.ttl));

        debug!(user = %user_id, "Preloaded dashboard");
        Ok(Some(dashboard))
    }

    async fn preload_user_projects(&self, owner: &str) -> Result<Option<Value>> {
        let projects = self
            .sources
            .user_projects
            .fetch(owner)
            .await?
            .unwrap_or_else(|| json!([]));

        self.registry
            .user()
            .set(keys::user_projects(owner), projects.clone(), Some(self.ttl));
        Ok(Some(projects))
    }

    async fn preload_project(&self, project_id: &str, owner_id: Option<&str>) -> Result<Option<Value>> {
        let (details, owner_projects) = match owner_id {
            Some(owner) => {
                let (details, projects) = tokio::try_join!(
                    self.sources.projects.fetch(project_id),
                    self.sources.user_projects.fetch(owner),
                )?;
                (details, Some((owner, projects.unwrap_or_else(|| json!([])))))
            }
            None => (self.sources.projects.fetch(project_id).await?, None),
        };

        let Some(details) = details else {
            debug!(project = %project_id, "Project not found, not preloaded");
            return Ok(None);
        };

        self.registry
            .project()
            .set(keys::project_details(project_id), details.clone(), Some(self.ttl));

        let owner_list = match owner_projects {
            Some((owner, projects)) => {
                self.registry
                    .user()
                    .set(keys::user_projects(owner), projects.clone(), Some(self.ttl));
                projects
            }
            None => Value::Null,
        };

        Ok(Some(json!({
            "project": details,
            "ownerProjects": owner_list,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::warming::source::MemorySource;
    use std::sync::Arc;

    struct Fixture {
        registry: CacheRegistry,
        users: Arc<MemorySource>,
        user_projects: Arc<MemorySource>,
        user_stats: Arc<MemorySource>,
        projects: Arc<MemorySource>,
        preloader: Preloader,
    }

    fn fixture() -> Fixture {
        let registry = CacheRegistry::from_config(&Config::default());
        let users = Arc::new(MemorySource::new("users").with("U1", json!({"id": "U1"})));
        let user_projects =
            Arc::new(MemorySource::new("user_projects").with("U1", json!([{"id": "P1"}])));
        let user_stats = Arc::new(MemorySource::new("user_stats"));
        let projects = Arc::new(MemorySource::new("projects").with("P1", json!({"id": "P1"})));
        let sources = DataSources {
            users: users.clone(),
            user_projects: user_projects.clone(),
            user_stats: user_stats.clone(),
            projects: projects.clone(),
        };
        let preloader = Preloader::new(registry.clone(), sources, Duration::from_secs(60));

        Fixture {
            registry,
            users,
            user_projects,
            user_stats,
            projects,
            preloader,
        }
    }

    #[test]
    fn test_route_mapping() {
        assert_eq!(
            PreloadTarget::from_route("/dashboard", Some("U1")),
            Some(PreloadTarget::UserDashboard("U1".to_string()))
        );
        assert_eq!(PreloadTarget::from_route("/dashboard", None), None);
        assert_eq!(
            PreloadTarget::from_route("/projects/", Some("U1")),
            Some(PreloadTarget::UserProjects("U1".to_string()))
        );
        assert_eq!(
            PreloadTarget::from_route("/projects/P9", None),
            Some(PreloadTarget::Project("P9".to_string()))
        );
        assert_eq!(PreloadTarget::from_route("/settings", Some("U1")), None);
    }

    #[tokio::test]
    async fn test_dashboard_preload_populates_all_keys() {
        let f = fixture();

        let dashboard = f
            .preloader
            .preload(&PreloadTarget::UserDashboard("U1".to_string()), None)
            .await
            .unwrap();

        assert_eq!(dashboard["profile"], json!({"id": "U1"}));
        assert_eq!(dashboard["stats"], json!({"projectCount": 1}));
        assert!(f.registry.user().has("user:U1:profile"));
        assert!(f.registry.user().has("user:U1:projects"));
        assert!(f.registry.user().has("user:U1:stats"));
        assert_eq!(f.registry.global().get("dashboard:U1"), Some(dashboard));
        assert_eq!(f.user_stats.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_preload_failure_caches_nothing() {
        let f = fixture();
        f.user_projects.fail_on("U1");

        let result = f
            .preloader
            .preload(&PreloadTarget::UserDashboard("U1".to_string()), None)
            .await;

        assert_eq!(result, None);
        assert!(f.registry.all().iter().all(|cache| cache.is_empty()));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_cached() {
        let f = fixture();
        f.users.remove("U1");

        let result = f
            .preloader
            .preload(&PreloadTarget::UserDashboard("U1".to_string()), None)
            .await;

        assert_eq!(result, None);
        assert!(f.registry.user().is_empty());
    }

    #[tokio::test]
    async fn test_project_preload_with_owner() {
        let f = fixture();

        let result = f
            .preloader
            .preload(&PreloadTarget::Route("/projects/P1".to_string()), Some("U1"))
            .await
            .unwrap();

        assert_eq!(result["project"], json!({"id": "P1"}));
        assert_eq!(result["ownerProjects"], json!([{"id": "P1"}]));
        assert!(f.registry.project().has("project:P1:details"));
        assert!(f.registry.user().has("user:U1:projects"));
    }

    #[tokio::test]
    async fn test_project_preload_failure() {
        let f = fixture();
        f.projects.fail_on("P1");

        let result = f
            .preloader
            .preload(&PreloadTarget::Project("P1".to_string()), Some("U1"))
            .await;

        assert_eq!(result, None);
        assert!(f.registry.project().is_empty());
        assert!(f.registry.user().is_empty(), "owner list not cached either");
    }

    #[tokio::test]
    async fn test_unknown_route_returns_none() {
        let f = fixture();
        let result = f
            .preloader
            .preload(&PreloadTarget::Route("/settings".to_string()), Some("U1"))
            .await;
        assert_eq!(result, None);
        assert_eq!(f.users.fetch_count(), 0);
    }
}
