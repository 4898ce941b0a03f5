//! Lifecycle status machines for applications and payment proofs.
//!
//! Transitions are administrator-directed: the workflow imposes no enforced
//! ordering beyond terminal-state immutability. Every accepted membership
//! transition is recorded as a status-history row by the persistence layer.

use crate::error::CoreError;

/// Lifecycle status of a membership application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Active,
    Expired,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 6] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
        ApplicationStatus::Active,
        ApplicationStatus::Expired,
    ];

    /// Parse a wire-format status string.
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(Self::Pending),
            "under_review" => Ok(Self::UnderReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "active" => Ok(Self::Active),
            "expired" => Ok(Self::Expired),
            other => Err(CoreError::Validation(format!(
                "Unknown application status: {other}"
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Active => "active",
            Self::Expired => "expired",
        }
    }

    /// Terminal states accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Expired)
    }

    /// Check that a transition from `self` to `to` is allowed.
    pub fn check_transition(self, to: Self) -> Result<(), CoreError> {
        if self.is_terminal() {
            return Err(CoreError::Validation(format!(
                "Cannot change status of a {} application",
                self.as_str()
            )));
        }
        if self == to {
            return Err(CoreError::Validation(format!(
                "Application is already {}",
                to.as_str()
            )));
        }
        Ok(())
    }
}

/// Verification status of a payment proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Verified,
    Rejected,
}

impl PaymentStatus {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(Self::Pending),
            "verified" => Ok(Self::Verified),
            "rejected" => Ok(Self::Rejected),
            other => Err(CoreError::Validation(format!(
                "Unknown payment status: {other}"
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
        }
    }

    /// Verify and reject are only valid from the pending state.
    pub fn check_decision(self) -> Result<(), CoreError> {
        match self {
            Self::Pending => Ok(()),
            Self::Verified => Err(CoreError::Validation(
                "Payment proof is already verified".to_string(),
            )),
            Self::Rejected => Err(CoreError::Validation(
                "Payment proof is already rejected".to_string(),
            )),
        }
    }
}

/// Review status of an agent onboarding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl AgentStatus {
    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value {
            "pending" => Ok(Self::Pending),
            "under_review" => Ok(Self::UnderReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(CoreError::Validation(format!(
                "Unknown agent status: {other}"
            ))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected)
    }

    pub fn check_transition(self, to: Self) -> Result<(), CoreError> {
        if self.is_terminal() {
            return Err(CoreError::Validation(
                "Cannot change status of a rejected agent application".to_string(),
            ));
        }
        if self == to {
            return Err(CoreError::Validation(format!(
                "Agent application is already {}",
                to.as_str()
            )));
        }
        Ok(())
    }
}
