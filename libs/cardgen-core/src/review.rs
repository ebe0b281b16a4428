//! Per-proposal review state: accept, reject, and edit transitions.
//!
//! A proposal's position in the generation's list is its identity. Statuses
//! move `Pending -> {Accepted | Edited | Rejected}`; `Edited` and `Accepted`
//! convert into each other as edits diverge from or return to the original
//! text, while `Rejected` is terminal.

use serde::{Deserialize, Serialize};

use crate::types::Proposal;
use crate::validation::{validate_proposal_field, CardField};

/// Review status of a generated proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Edited,
    Rejected,
}

impl Default for ProposalStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Field-level validation errors for a proposal under edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub back: Option<String>,
}

impl FieldErrors {
    /// True when neither field carries an error.
    pub fn is_clear(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }
}

/// A generated proposal as the user reviews it.
///
/// The original text is an immutable snapshot of the server output; the
/// current text is what the user edits and what gets saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalViewModel {
    pub original_front: String,
    pub original_back: String,
    pub current_front: String,
    pub current_back: String,
    pub status: ProposalStatus,
    pub is_edited: bool,
    pub errors: FieldErrors,
}

impl ProposalViewModel {
    /// Seed a view model from a freshly generated proposal.
    pub fn from_proposal(proposal: &Proposal) -> Self {
        Self {
            original_front: proposal.front.clone(),
            original_back: proposal.back.clone(),
            current_front: proposal.front.clone(),
            current_back: proposal.back.clone(),
            status: ProposalStatus::Pending,
            is_edited: false,
            errors: FieldErrors::default(),
        }
    }

    /// Whether the current text differs from the original after trimming.
    ///
    /// Whitespace-only changes do not count as a modification.
    pub fn is_modified(&self) -> bool {
        self.current_front.trim() != self.original_front.trim()
            || self.current_back.trim() != self.original_back.trim()
    }

    /// Accept the proposal as-is. Only effective from `Pending`.
    pub fn accept(&mut self) {
        if self.status == ProposalStatus::Pending {
            self.status = ProposalStatus::Accepted;
        }
    }

    /// Reject the proposal. Terminal: no later call changes the status back.
    pub fn reject(&mut self) {
        self.status = ProposalStatus::Rejected;
    }

    /// Update one field and recompute validation and edit state.
    ///
    /// Both fields are revalidated on every edit. A modified pair moves the
    /// status to `Edited`; reverting to the original lands on `Accepted`,
    /// never back on `Pending`. A rejected proposal keeps its status.
    pub fn edit_field(&mut self, field: CardField, value: String) {
        match field {
            CardField::Front => self.current_front = value,
            CardField::Back => self.current_back = value,
        }

        self.errors = FieldErrors {
            front: validate_proposal_field(&self.current_front, CardField::Front),
            back: validate_proposal_field(&self.current_back, CardField::Back),
        };
        self.is_edited = self.is_modified();

        if self.status != ProposalStatus::Rejected {
            self.status = if self.is_edited {
                ProposalStatus::Edited
            } else {
                ProposalStatus::Accepted
            };
        }
    }

    /// Whether this proposal is eligible for batch save.
    pub fn is_saveable(&self) -> bool {
        matches!(self.status, ProposalStatus::Accepted | ProposalStatus::Edited)
            && self.errors.is_clear()
    }
}

/// Per-status counts across a proposal list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub accepted: usize,
    pub edited: usize,
    pub rejected: usize,
    pub saveable: usize,
}

impl StatusCounts {
    /// Tally statuses in a single pass.
    pub fn tally(proposals: &[ProposalViewModel]) -> Self {
        let mut counts = Self::default();
        for proposal in proposals {
            match proposal.status {
                ProposalStatus::Pending => counts.pending += 1,
                ProposalStatus::Accepted => counts.accepted += 1,
                ProposalStatus::Edited => counts.edited += 1,
                ProposalStatus::Rejected => counts.rejected += 1,
            }
            if proposal.is_saveable() {
                counts.saveable += 1;
            }
        }
        counts
    }
}

/// Indices of saveable proposals, in list order.
pub fn saveable_indices(proposals: &[ProposalViewModel]) -> Vec<usize> {
    proposals
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_saveable())
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn proposal(front: &str, back: &str) -> Proposal {
        Proposal {
            front: front.to_string(),
            back: back.to_string(),
        }
    }

    #[test]
    fn fresh_view_model_is_pending_and_unedited() {
        let vm = ProposalViewModel::from_proposal(&proposal("Q", "A"));
        assert_eq!(vm.status, ProposalStatus::Pending);
        assert!(!vm.is_edited);
        assert!(vm.errors.is_clear());
        assert!(!vm.is_saveable());
    }

    #[test]
    fn accept_only_from_pending() {
        let mut vm = ProposalViewModel::from_proposal(&proposal("Q", "A"));
        vm.accept();
        assert_eq!(vm.status, ProposalStatus::Accepted);

        vm.edit_field(CardField::Front, "Q2".to_string());
        assert_eq!(vm.status, ProposalStatus::Edited);
        vm.accept();
        assert_eq!(vm.status, ProposalStatus::Edited);
    }

    #[test]
    fn edit_then_revert_lands_on_accepted_not_pending() {
        let mut vm = ProposalViewModel::from_proposal(&proposal("Q", "A"));
        vm.edit_field(CardField::Front, "Q changed".to_string());
        assert_eq!(vm.status, ProposalStatus::Edited);
        assert!(vm.is_edited);

        vm.edit_field(CardField::Front, "Q".to_string());
        assert_eq!(vm.status, ProposalStatus::Accepted);
        assert!(!vm.is_edited);
    }

    #[test]
    fn whitespace_only_edit_is_not_a_modification() {
        let mut vm = ProposalViewModel::from_proposal(&proposal("Q", "A"));
        vm.edit_field(CardField::Back, "  A  ".to_string());
        assert!(!vm.is_edited);
        assert_eq!(vm.status, ProposalStatus::Accepted);
    }

    #[test]
    fn reject_is_terminal_and_idempotent() {
        let mut vm = ProposalViewModel::from_proposal(&proposal("Q", "A"));
        vm.reject();
        assert_eq!(vm.status, ProposalStatus::Rejected);

        vm.accept();
        assert_eq!(vm.status, ProposalStatus::Rejected);

        vm.edit_field(CardField::Front, "New front".to_string());
        assert_eq!(vm.status, ProposalStatus::Rejected);
        assert!(vm.is_edited);

        vm.reject();
        assert_eq!(vm.status, ProposalStatus::Rejected);
    }

    #[test]
    fn invalid_edit_blocks_saveability() {
        let mut vm = ProposalViewModel::from_proposal(&proposal("Q", "A"));
        vm.edit_field(CardField::Front, "".to_string());
        assert_eq!(vm.status, ProposalStatus::Edited);
        assert!(vm.errors.front.is_some());
        assert!(!vm.is_saveable());
    }

    #[test]
    fn tally_counts_and_saveable() {
        let mut proposals: Vec<ProposalViewModel> = (0..5)
            .map(|i| ProposalViewModel::from_proposal(&proposal(&format!("Q{}", i), "A")))
            .collect();

        proposals[0].accept();
        proposals[1].accept();
        proposals[2].edit_field(CardField::Back, "A changed".to_string());
        proposals[3].reject();
        proposals[4].reject();

        let counts = StatusCounts::tally(&proposals);
        assert_eq!(
            counts,
            StatusCounts {
                pending: 0,
                accepted: 2,
                edited: 1,
                rejected: 2,
                saveable: 3,
            }
        );
    }

    #[test]
    fn fresh_batch_has_zero_saveable() {
        let proposals: Vec<ProposalViewModel> = (0..5)
            .map(|_| ProposalViewModel::from_proposal(&proposal("Q", "A")))
            .collect();
        let counts = StatusCounts::tally(&proposals);
        assert_eq!(counts.pending, 5);
        assert_eq!(counts.saveable, 0);
        assert!(saveable_indices(&proposals).is_empty());
    }

    #[test]
    fn saveable_indices_preserve_order() {
        let mut proposals: Vec<ProposalViewModel> = (0..4)
            .map(|i| ProposalViewModel::from_proposal(&proposal(&format!("Q{}", i), "A")))
            .collect();
        proposals[1].accept();
        proposals[3].accept();
        assert_eq!(saveable_indices(&proposals), vec![1, 3]);
    }
}
