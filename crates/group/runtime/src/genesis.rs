//! Genesis export and import

use crate::context::BlockContext;
use crate::keeper::GroupKeeper;
use crate::router::ActionRouter;
use group_store::{GroupStore, QueryWindow, Sequences};
use group_types::{GroupError, GroupGenesis, GroupResult};
use tracing::info;

impl<S, R> GroupKeeper<S, R>
where
    S: GroupStore + Clone,
    R: ActionRouter,
{
    /// Snapshot the whole committed state.
    ///
    /// Records come out in primary key order, proposals and votes ordered
    /// by proposal id.
    pub fn export_genesis(&self) -> GroupResult<GroupGenesis> {
        let sequences = self.store.sequences()?;
        let mut genesis = GroupGenesis {
            group_seq: sequences.group,
            group_policy_seq: sequences.policy,
            proposal_seq: sequences.proposal,
            ..GroupGenesis::default()
        };

        genesis.groups = self.store.list_groups(QueryWindow::all())?;
        for group in &genesis.groups {
            genesis
                .group_members
                .extend(self.store.members_by_group(group.id, QueryWindow::all())?);
            genesis
                .group_policies
                .extend(self.store.policies_by_group(group.id, QueryWindow::all())?);
        }
        for policy in &genesis.group_policies {
            genesis
                .proposals
                .extend(self.store.proposals_by_policy(&policy.address, QueryWindow::all())?);
        }
        genesis.proposals.sort_by_key(|p| p.id);
        for proposal in &genesis.proposals {
            genesis
                .votes
                .extend(self.store.votes_by_proposal(proposal.id, QueryWindow::all())?);
        }

        info!(
            groups = genesis.groups.len(),
            policies = genesis.group_policies.len(),
            proposals = genesis.proposals.len(),
            votes = genesis.votes.len(),
            "Genesis exported"
        );
        Ok(genesis)
    }

    /// Load a validated snapshot into an empty store. Emits no events.
    pub fn import_genesis(&mut self, ctx: &BlockContext, genesis: GroupGenesis) -> GroupResult<()> {
        genesis.validate()?;
        self.transact(ctx, "import_genesis", |tx| {
            if tx.store.sequences()? != Sequences::default()
                || !tx.store.list_groups(QueryWindow::page(0, 1))?.is_empty()
            {
                return Err(GroupError::InvalidState(
                    "genesis can only be imported into an empty store".into(),
                ));
            }

            let counts = (
                genesis.groups.len(),
                genesis.group_policies.len(),
                genesis.proposals.len(),
                genesis.votes.len(),
            );
            for group in genesis.groups {
                tx.store.create_group(group)?;
            }
            for member in genesis.group_members {
                tx.store.create_member(member)?;
            }
            for policy in genesis.group_policies {
                tx.store.create_policy(policy)?;
            }
            for proposal in genesis.proposals {
                tx.store.create_proposal(proposal)?;
            }
            for vote in genesis.votes {
                tx.store.create_vote(vote)?;
            }
            tx.store.set_sequences(Sequences {
                group: genesis.group_seq,
                policy: genesis.group_policy_seq,
                proposal: genesis.proposal_seq,
            })?;

            info!(
                groups = counts.0,
                policies = counts.1,
                proposals = counts.2,
                votes = counts.3,
                "Genesis imported"
            );
            Ok(())
        })
    }
}
