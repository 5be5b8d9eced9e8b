// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Caller roles derived from the connecting peer's uid.

use std::collections::BTreeSet;

use jw_daemon::protocol::{ErrorKind, Request, Response};

use crate::settings::AuthSettings;

/// What a connected caller may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// May start and stop jobs and shut the daemon down
    Admin,
    /// May only query status and read output
    Viewer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Viewer => "viewer",
        }
    }
}

/// Maps peer uids to roles.
#[derive(Debug, Clone, Default)]
pub struct AuthPolicy {
    admins: BTreeSet<u32>,
}

impl AuthPolicy {
    /// Only the listed uids are admins.
    pub fn with_admins(admins: impl IntoIterator<Item = u32>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    /// The daemon's own uid, root, and any configured uids are admins.
    pub fn from_settings(daemon_uid: u32, settings: &AuthSettings) -> Self {
        let mut admins: BTreeSet<u32> = settings.admin_uids.iter().copied().collect();
        admins.insert(daemon_uid);
        admins.insert(0);
        Self { admins }
    }

    /// Role for a peer. Unknown peers are viewers.
    pub fn role_for(&self, uid: Option<u32>) -> Role {
        match uid {
            Some(uid) if self.admins.contains(&uid) => Role::Admin,
            _ => Role::Viewer,
        }
    }

    /// `Some(error response)` if `role` may not make `request`.
    pub fn check(&self, role: Role, request: &Request) -> Option<Response> {
        if request.is_mutation() && role != Role::Admin {
            return Some(Response::error(
                ErrorKind::Forbidden,
                "this request requires the admin role",
            ));
        }
        None
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
