//! Static task drafts used when generation fails.

use super::bounds::Complexity;
use super::{Role, TaskDraft};

type Row = (&'static str, &'static str, Complexity, u32);

const FRONTEND: [Row; 5] = [
    ("Build application shell and navigation", "Create the layout, routing and navigation used by every screen.", Complexity::Medium, 10),
    ("Implement authentication screens", "Sign-in, sign-out and password reset screens wired to the auth API.", Complexity::Simple, 5),
    ("Build core data entry forms", "Forms for the main records with validation and error states.", Complexity::Medium, 12),
    ("Create role dashboards", "Dashboards summarising the items each role needs to act on.", Complexity::Complex, 20),
    ("Accessibility and responsive pass", "Keyboard support, screen reader labels and mobile layouts.", Complexity::Simple, 4),
];

const BACKEND: [Row; 5] = [
    ("Design data model and migrations", "Define entities, relations and the initial schema migrations.", Complexity::Medium, 12),
    ("Implement authentication and roles", "Token-based sign-in with role-based authorisation checks.", Complexity::Complex, 24),
    ("Build CRUD APIs for core records", "Validated REST endpoints for the main entities.", Complexity::Medium, 14),
    ("Add notification service", "Queue and send email and in-app notifications.", Complexity::Medium, 10),
    ("Implement reporting queries", "Aggregations and export endpoints for reports.", Complexity::Simple, 6),
];

const FULLSTACK: [Row; 5] = [
    ("Deliver sign-in vertical slice", "UI, API and persistence for signing in end to end.", Complexity::Medium, 12),
    ("Deliver core record management slice", "Create, list, edit and delete the main records end to end.", Complexity::Complex, 28),
    ("Integrate notifications end to end", "Trigger, deliver and display notifications.", Complexity::Medium, 14),
    ("Build reporting and export", "Report screens backed by export endpoints.", Complexity::Medium, 16),
    ("Performance tune critical journeys", "Profile and optimise the slowest user flows.", Complexity::Simple, 6),
];

const TESTER: [Row; 5] = [
    ("Write test plan from user stories", "Map each user story to acceptance criteria and test cases.", Complexity::Simple, 3),
    ("Automate sign-in regression tests", "Automated checks for authentication and permissions.", Complexity::Medium, 6),
    ("Automate core workflow tests", "End-to-end tests for the main record workflows.", Complexity::Complex, 12),
    ("Test edge cases and error handling", "Negative paths, invalid input and boundary values.", Complexity::Medium, 6),
    ("Run acceptance testing", "Exploratory and acceptance sessions before release.", Complexity::Simple, 3),
];

const DEVOPS: [Row; 5] = [
    ("Set up CI pipeline", "Build, lint and test on every change.", Complexity::Simple, 4),
    ("Provision environments", "Staging and production environments with configuration management.", Complexity::Medium, 10),
    ("Configure monitoring and alerting", "Metrics, logs and alerts for the running services.", Complexity::Medium, 8),
    ("Automate deployments", "Repeatable deployments with rollback.", Complexity::Complex, 16),
    ("Set up backups and recovery", "Scheduled backups with a tested restore procedure.", Complexity::Simple, 3),
];

fn rows(role: Role) -> &'static [Row; 5] {
    match role {
        Role::Frontend => &FRONTEND,
        Role::Backend => &BACKEND,
        Role::Fullstack => &FULLSTACK,
        Role::Tester => &TESTER,
        Role::Devops => &DEVOPS,
    }
}

/// The five fallback drafts for `role`.
pub fn fallback_tasks(role: Role) -> Vec<TaskDraft> {
    rows(role)
        .iter()
        .map(|(title, description, complexity, hours)| TaskDraft {
            title: title.to_string(),
            description: description.to_string(),
            complexity: Some(complexity.as_str().to_string()),
            estimated_hours: Some(f64::from(*hours)),
        })
        .collect()
}
