//! Canonical cache keys.
//!
//! Must stay in step with the templates in
//! [`default_table`](crate::invalidation::default_table).

pub fn user_profile(user_id: &str) -> String {
    format!("user:{user_id}:profile")
}

pub fn user_projects(user_id: &str) -> String {
    format!("user:{user_id}:projects")
}

pub fn user_stats(user_id: &str) -> String {
    format!("user:{user_id}:stats")
}

pub fn dashboard(user_id: &str) -> String {
    format!("dashboard:{user_id}")
}

pub fn project_details(project_id: &str) -> String {
    format!("project:{project_id}:details")
}

pub fn project_progress(project_id: &str) -> String {
    format!("project:{project_id}:progress")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invalidation::default_table;

    #[test]
    fn test_keys_match_dependency_templates() {
        let table = default_table();

        let user_keys = table.get("user").unwrap().resolve_keys("U1", None);
        for key in [user_profile("U1"), user_projects("U1"), user_stats("U1"), dashboard("U1")] {
            assert!(user_keys.contains(&key), "{key} missing from user dependencies");
        }

        let project_keys = table.get("project").unwrap().resolve_keys("P1", Some("U1"));
        for key in [
            project_details("P1"),
            project_progress("P1"),
            user_projects("U1"),
            dashboard("U1"),
        ] {
            assert!(project_keys.contains(&key), "{key} missing from project dependencies");
        }
    }
}
