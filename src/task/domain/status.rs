//! Task status state machine.
//!
//! ```text
//! Pending ──▶ On Progress ──▶ Done ──▶ Approved
//!    │           ▲   │
//!    │           │   ▼
//!    └──────▶  On Hold
//! ```

use super::ParseTaskStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created, work has not started.
    Pending,
    /// The assignee is working on the task.
    OnProgress,
    /// Work is paused.
    OnHold,
    /// The assignee reports the task complete.
    Done,
    /// An admin accepted the completed work.
    Approved,
}

/// Who may perform a particular transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionAuthority {
    /// The task's assignee. Admins may act on the assignee's behalf.
    Assignee,
    /// Admins only.
    Admin,
}

impl TaskStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::OnProgress,
        Self::OnHold,
        Self::Done,
        Self::Approved,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::OnProgress => "on_progress",
            Self::OnHold => "on_hold",
            Self::Done => "done",
            Self::Approved => "approved",
        }
    }

    /// Returns the human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::OnProgress => "On Progress",
            Self::OnHold => "On Hold",
            Self::Done => "Done",
            Self::Approved => "Approved",
        }
    }

    /// Returns the authority needed to move from `self` to `target`, or
    /// `None` when `target` is not a legal successor.
    #[must_use]
    pub const fn authority_for(self, target: Self) -> Option<TransitionAuthority> {
        match (self, target) {
            (Self::Pending | Self::OnHold, Self::OnProgress)
            | (Self::OnProgress, Self::Done | Self::OnHold) => Some(TransitionAuthority::Assignee),
            (Self::Pending, Self::OnHold) | (Self::Done, Self::Approved) => {
                Some(TransitionAuthority::Admin)
            }
            _ => None,
        }
    }

    /// Returns `true` when `target` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        self.authority_for(target).is_some()
    }

    /// Returns `true` when no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Returns `true` when the assignee can no longer move the task.
    #[must_use]
    pub const fn is_terminal_for_assignee(self) -> bool {
        matches!(self, Self::Done | Self::Approved)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    /// Accepts both the storage form (`on_progress`) and the label form
    /// (`On Progress`).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized: String = value
            .trim()
            .chars()
            .map(|ch| match ch {
                ' ' | '-' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "on_progress" | "in_progress" => Ok(Self::OnProgress),
            "on_hold" => Ok(Self::OnHold),
            "done" => Ok(Self::Done),
            "approved" => Ok(Self::Approved),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}
