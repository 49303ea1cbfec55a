//! Weighted tallying

use group_store::{GroupStore, QueryWindow};
use group_types::{GroupId, GroupResult, Proposal, ProposalStatus, TallyResult};
use tracing::debug;

/// Tally a proposal's votes using each voter's *current* weight in the group.
///
/// Votes from addresses that are no longer members count for nothing. Once
/// a proposal has left the `Submitted` state its stored final tally is
/// returned unchanged.
pub fn tally_proposal<S: GroupStore + ?Sized>(
    store: &S,
    proposal: &Proposal,
    group_id: GroupId,
) -> GroupResult<TallyResult> {
    if proposal.status != ProposalStatus::Submitted {
        return Ok(proposal.final_tally_result.clone());
    }

    let mut tally = TallyResult::zero();
    for vote in store.votes_by_proposal(proposal.id, QueryWindow::all())? {
        match store.get_member(group_id, &vote.voter)? {
            Some(member) => tally.add(vote.option, member.weight())?,
            None => debug!(
                proposal_id = %proposal.id,
                voter = %vote.voter,
                "Skipping vote from former member"
            ),
        }
    }
    Ok(tally)
}
