//! The closed set of platform roles and their precedence.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A role a user can hold. The derived ordering is the precedence order:
/// `Student < Mentor < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Mentor,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Student, Role::Mentor, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Mentor => "mentor",
            Role::Admin => "admin",
        }
    }

    /// Landing path of the area this role owns.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Student => "/app",
            Role::Mentor => "/mentor",
            Role::Admin => "/admin",
        }
    }

    /// pt-BR label shown in the user administration screen.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Student => "Aluna",
            Role::Mentor => "Mentor",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "mentor" => Ok(Role::Mentor),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Roles held by one user. Stored as a bitset so it is `Copy` and cheap to cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const fn empty() -> Self {
        RoleSet(0)
    }

    fn bit(role: Role) -> u8 {
        match role {
            Role::Student => 0b001,
            Role::Mentor => 0b010,
            Role::Admin => 0b100,
        }
    }

    pub fn insert(&mut self, role: Role) {
        self.0 |= Self::bit(role);
    }

    pub fn has(&self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_student(&self) -> bool {
        self.has(Role::Student)
    }

    pub fn is_mentor(&self) -> bool {
        self.has(Role::Mentor)
    }

    pub fn is_admin(&self) -> bool {
        self.has(Role::Admin)
    }

    /// True when at least one held role is in `allowed`.
    pub fn intersects(&self, allowed: &[Role]) -> bool {
        allowed.iter().any(|role| self.has(*role))
    }

    /// Highest-precedence held role.
    pub fn primary(&self) -> Option<Role> {
        self.iter().max()
    }

    /// Where a user holding these roles lands by default: the primary role's area, or `/`.
    pub fn home_path(&self) -> &'static str {
        self.primary().map(|r| r.home_path()).unwrap_or("/")
    }

    /// Held roles in ascending precedence.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.has(*r))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        let mut set = RoleSet::empty();
        for role in iter {
            set.insert(role);
        }
        set
    }
}

impl Serialize for RoleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
