use std::fmt;

use serde::{Deserialize, Serialize};

/// Delivery roles work items are generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Frontend,
    Backend,
    Fullstack,
    Tester,
    Devops,
}

impl Role {
    /// All roles in grouping order.
    pub const ALL: [Role; 5] = [
        Role::Frontend,
        Role::Backend,
        Role::Fullstack,
        Role::Tester,
        Role::Devops,
    ];

    /// Parse a role name, accepting common aliases.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "frontend" | "front-end" | "front end" | "ui" => Some(Self::Frontend),
            "backend" | "back-end" | "back end" | "api" => Some(Self::Backend),
            "fullstack" | "full-stack" | "full stack" => Some(Self::Fullstack),
            "tester" | "qa" | "test" | "quality assurance" => Some(Self::Tester),
            "devops" | "ops" | "sre" => Some(Self::Devops),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Fullstack => "fullstack",
            Self::Tester => "tester",
            Self::Devops => "devops",
        }
    }

    /// Activity label attached to this role's tasks.
    pub fn activity(&self) -> &'static str {
        match self {
            Self::Tester => "Testing",
            Self::Devops => "Deployment",
            Self::Frontend | Self::Backend | Self::Fullstack => "Development",
        }
    }

    /// Focus bullets injected into the task prompt.
    pub fn guidance(&self) -> &'static [&'static str] {
        match self {
            Self::Frontend => &[
                "Screens, layouts and navigation for every user-facing flow",
                "Forms with client-side validation and clear error states",
                "Responsive behaviour and accessibility (keyboard, screen readers)",
                "Integration with backend APIs, loading and empty states",
            ],
            Self::Backend => &[
                "Data model, migrations and persistence",
                "API endpoints with input validation and error handling",
                "Authentication, authorisation and audit trails",
                "Background jobs, notifications and third-party integrations",
            ],
            Self::Fullstack => &[
                "End-to-end vertical slices from UI to database",
                "Shared validation between client and server",
                "Wiring features together and resolving integration gaps",
                "Performance of the critical user journeys",
            ],
            Self::Tester => &[
                "Test plans derived from the user stories",
                "Automated regression tests for the critical flows",
                "Edge cases, negative paths and permission checks",
                "Exploratory and acceptance testing before release",
            ],
            Self::Devops => &[
                "CI/CD pipelines with automated checks",
                "Environment provisioning and configuration management",
                "Monitoring, logging and alerting",
                "Backups, disaster recovery and release procedures",
            ],
        }
    }

    /// Guidance rendered as a markdown bullet list.
    pub fn guidance_block(&self) -> String {
        self.guidance()
            .iter()
            .map(|g| format!("- {}", g))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(Role::parse("QA"), Some(Role::Tester));
        assert_eq!(Role::parse("sre"), Some(Role::Devops));
        assert_eq!(Role::parse("ops"), Some(Role::Devops));
        assert_eq!(Role::parse("Full-Stack"), Some(Role::Fullstack));
        assert_eq!(Role::parse("ui"), Some(Role::Frontend));
        assert_eq!(Role::parse("api"), Some(Role::Backend));
        assert_eq!(Role::parse("designer"), None);
    }

    #[test]
    fn test_activity() {
        assert_eq!(Role::Tester.activity(), "Testing");
        assert_eq!(Role::Devops.activity(), "Deployment");
        assert_eq!(Role::Frontend.activity(), "Development");
        assert_eq!(Role::Backend.activity(), "Development");
        assert_eq!(Role::Fullstack.activity(), "Development");
    }

    #[test]
    fn test_guidance_is_distinct_per_role() {
        let blocks: Vec<String> = Role::ALL.iter().map(|r| r.guidance_block()).collect();
        for (i, a) in blocks.iter().enumerate() {
            assert!(a.starts_with("- "));
            for b in &blocks[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_round_trip_names() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
            assert_eq!(role.to_string(), role.as_str());
        }
    }
}
