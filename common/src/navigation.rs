// common/src/navigation.rs
//! Sidebar entries per role.
//!
//! This is presentation filtering only. Routes never consult it, so a hidden
//! entry is still reachable by typing its path.

use crate::models::Role;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Dashboard,
    Students,
    Courses,
    Attendance,
    Grades,
    Documents,
    Announcements,
}

impl Section {
    /// Sidebar order
    pub const ALL: [Section; 7] = [
        Section::Dashboard,
        Section::Students,
        Section::Courses,
        Section::Attendance,
        Section::Grades,
        Section::Documents,
        Section::Announcements,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Students => "Students",
            Section::Courses => "Courses",
            Section::Attendance => "Attendance",
            Section::Grades => "Grades",
            Section::Documents => "Documents",
            Section::Announcements => "Announcements",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Section::Dashboard => "/",
            Section::Students => "/students",
            Section::Courses => "/courses",
            Section::Attendance => "/attendance",
            Section::Grades => "/grades",
            Section::Documents => "/documents",
            Section::Announcements => "/announcements",
        }
    }
}

/// Whether `role` sees the sidebar entry for `section`
pub fn can_view(role: Role, section: Section) -> bool {
    !matches!((role, section), (Role::Student, Section::Students))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub section: Section,
    pub label: &'static str,
    pub path: &'static str,
    pub active: bool,
}

/// Sidebar for `role`, marking the entry that matches `current_path`.
pub fn nav_items(role: Role, current_path: &str) -> Vec<NavItem> {
    Section::ALL
        .into_iter()
        .filter(|section| can_view(role, *section))
        .map(|section| NavItem {
            section,
            label: section.label(),
            path: section.path(),
            active: is_active(section.path(), current_path),
        })
        .collect()
}

fn is_active(item_path: &str, current_path: &str) -> bool {
    if item_path == "/" {
        return current_path == "/";
    }
    current_path == item_path
        || current_path
            .strip_prefix(item_path)
            .is_some_and(|rest| rest.starts_with('/'))
}
