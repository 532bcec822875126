//! Static content used when source material yields nothing usable.
//!
//! These lists are illustrative placeholders, not business rules.

/// Sentence that opens every consolidated overview.
pub const OVERVIEW_FRAMING: &str =
    "This document consolidates the product requirements identified across the supplied source material.";

/// Second sentence used when no chunk produced a usable overview.
pub const OVERVIEW_GENERIC: &str =
    "It summarises the objectives, key features and user stories the delivery team should plan around.";

/// Closing clause for user stories with no recognisable benefit.
pub const GENERIC_CLOSING: &str = "I can complete my work more effectively";

/// Role used for stories that do not follow the "As a ..." form.
pub const GENERIC_ROLE: &str = "a system user";

pub const DEFAULT_OBJECTIVES: &[&str] = &[
    "Deliver a reliable platform that supports the core workflows described in the requirements",
    "Reduce manual administrative effort through automation",
    "Give every user role clear access to the information it needs",
    "Provide actionable reporting on usage and outcomes",
    "Ensure the solution is secure, accessible and maintainable",
];

/// Default key features as (title, description).
pub const DEFAULT_FEATURES: &[(&str, &str)] = &[
    (
        "User Accounts And Roles",
        "Sign-in, profile management and role-based permissions for every type of user.",
    ),
    (
        "Dashboard",
        "A personalised landing page summarising the items that need each user's attention.",
    ),
    (
        "Content Management",
        "Create, organise and publish the records and documents the platform revolves around.",
    ),
    (
        "Notifications",
        "Timely email and in-app alerts when something relevant changes.",
    ),
    (
        "Reporting",
        "Exportable reports that track activity, progress and outcomes over time.",
    ),
];

/// Default user stories as (as, want, so).
pub const DEFAULT_STORIES: &[(&str, &str, &str)] = &[
    (
        "a student",
        "to see my upcoming work in one place",
        "I never miss a deadline",
    ),
    (
        "a teacher",
        "to publish material and track submissions",
        "I can focus on teaching instead of paperwork",
    ),
    (
        "an administrator",
        "to manage users and permissions centrally",
        "the platform stays secure and organised",
    ),
];

/// Prefixes stripped from feature titles (matched case-insensitively).
pub const BOILERPLATE_PREFIXES: &[&str] = &[
    "the system shall provide ",
    "the system shall ",
    "the system should ",
    "the system must ",
    "the system will ",
    "the platform shall ",
    "the platform should ",
    "the platform will ",
    "users should be able to ",
    "users can ",
    "allow users to ",
    "ability to ",
    "support for ",
    "provide ",
    "feature: ",
    "feature - ",
];

/// Keyword (substring of the lowered feature) to description.
pub const FEATURE_DESCRIPTIONS: &[(&str, &str)] = &[
    ("login", "Secure sign-in so each user reaches only the data their role allows."),
    ("authentication", "Secure sign-in so each user reaches only the data their role allows."),
    ("dashboard", "An at-a-glance view of the metrics and tasks that matter most to each user."),
    ("report", "Configurable reports that turn raw activity into decisions."),
    ("notification", "Timely alerts that keep users informed without checking in manually."),
    ("search", "Fast, filterable search across the platform's records."),
    ("upload", "Reliable file upload with validation and progress feedback."),
    ("grade", "Structured grading with clear feedback and history."),
    ("assessment", "Create, deliver and score assessments in one workflow."),
    ("calendar", "Shared scheduling that keeps deadlines and events visible."),
    ("schedule", "Shared scheduling that keeps deadlines and events visible."),
    ("message", "Direct messaging between users with a searchable history."),
    ("payment", "Secure payment processing with receipts and reconciliation."),
    ("profile", "Self-service profile management for every user."),
    ("analytics", "Trend analysis that highlights where attention is needed."),
    ("export", "One-click export of data in common formats."),
    ("mobile", "A responsive experience that works on phones and tablets."),
];
