//! # Governed Fund
//!
//! A fund engine and its governor behind one lock. Every mutating call
//! takes the write lock for its whole duration, so at most one mutation is
//! in flight per fund and readers never observe a half-applied deposit or
//! proposal execution. The handle is `Send + Sync` when the executor is,
//! and is meant to be shared through an `Arc`.

use basket_protocol::clock::Clock;
use basket_protocol::config::FundConfig;
use basket_protocol::vault::{
    AdminAction, Amount, DepositReceipt, FundOverview, FundState, Role, SwapExecutor, Transfer,
    UserInfo, VaultEngine, VaultError, WithdrawReceipt,
};
use parking_lot::RwLock;

use crate::governor::{GovernanceError, Governor};
use crate::proposal::{Proposal, ProposalStatus, Support, Tally};

/// Everything that must change together.
#[derive(Debug)]
pub struct FundCell<S> {
    pub engine: VaultEngine<S>,
    pub governor: Governor,
}

#[derive(Debug)]
pub struct GovernedFund<S, C> {
    cell: RwLock<FundCell<S>>,
    clock: C,
}

impl<S: SwapExecutor, C: Clock> GovernedFund<S, C> {
    /// Deploys a fund and its governor. The deployer is admin until
    /// [`install_governance`](Self::install_governance) is called.
    pub fn deploy(
        config: &FundConfig,
        deployer: &str,
        executor: S,
        clock: C,
    ) -> Result<Self, GovernanceError> {
        let engine = VaultEngine::new(config, deployer, executor)?;
        let governor = Governor::new(
            &Governor::address_for(&config.governor.name),
            config.governor.clone(),
        );
        Ok(Self::from_parts(engine, governor, clock))
    }

    pub fn from_parts(engine: VaultEngine<S>, governor: Governor, clock: C) -> Self {
        Self {
            cell: RwLock::new(FundCell { engine, governor }),
            clock,
        }
    }

    pub fn into_parts(self) -> (VaultEngine<S>, Governor, C) {
        let cell = self.cell.into_inner();
        (cell.engine, cell.governor, self.clock)
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn governor_address(&self) -> String {
        self.cell.read().governor.address().to_string()
    }

    /// Runs `f` against a consistent view of fund and governor.
    pub fn inspect<R>(&self, f: impl FnOnce(&FundState, &Governor) -> R) -> R {
        let cell = self.cell.read();
        f(cell.engine.state(), &cell.governor)
    }

    // -- Fund operations ----------------------------------------------------

    pub fn deposit(&self, depositor: &str, amount: Amount) -> Result<DepositReceipt, VaultError> {
        self.cell.write().engine.deposit(depositor, amount)
    }

    pub fn deposit_with_instructions(
        &self,
        depositor: &str,
        amount: Amount,
        instructions: &[Vec<u8>],
    ) -> Result<DepositReceipt, VaultError> {
        self.cell
            .write()
            .engine
            .deposit_with_instructions(depositor, amount, instructions)
    }

    pub fn withdraw(&self, holder: &str, shares: Amount) -> Result<WithdrawReceipt, VaultError> {
        self.cell.write().engine.withdraw(holder, shares)
    }

    pub fn withdraw_token(
        &self,
        caller: &str,
        token: &str,
        amount: Amount,
        recipient: &str,
    ) -> Result<Transfer, VaultError> {
        self.cell
            .write()
            .engine
            .withdraw_token(caller, token, amount, recipient)
    }

    pub fn credit_untracked(&self, token: &str, amount: Amount) -> Result<(), VaultError> {
        self.cell.write().engine.credit_untracked(token, amount)
    }

    /// Direct admin call. Only works for whoever currently holds the role,
    /// which after the handoff is nobody but the governor.
    pub fn apply_admin(&self, caller: &str, action: &AdminAction) -> Result<Vec<Transfer>, VaultError> {
        self.cell.write().engine.apply_admin(caller, action)
    }

    pub fn grant_role(&self, caller: &str, role: Role, account: &str) -> Result<(), VaultError> {
        self.cell.write().engine.grant_role(caller, role, account)
    }

    /// Hands the admin role to this fund's governor.
    pub fn install_governance(&self, caller: &str) -> Result<(), VaultError> {
        let mut cell = self.cell.write();
        let governor = cell.governor.address().to_string();
        cell.engine.transfer_admin_role(caller, &governor)
    }

    pub fn has_role(&self, role: Role, account: &str) -> bool {
        self.cell.read().engine.has_role(role, account)
    }

    pub fn overview(&self) -> FundOverview {
        self.cell.read().engine.overview()
    }

    pub fn user_info(&self, holder: &str) -> Result<UserInfo, VaultError> {
        self.cell.read().engine.user_info(holder)
    }

    // -- Governance ---------------------------------------------------------

    pub fn propose(
        &self,
        proposer: &str,
        action: AdminAction,
        description: &str,
    ) -> Result<String, GovernanceError> {
        let now = self.clock.now();
        let mut cell = self.cell.write();
        let FundCell { engine, governor } = &mut *cell;
        governor.propose(proposer, action, description, engine.state().ledger(), now)
    }

    pub fn vote(&self, id: &str, voter: &str, support: Support) -> Result<Amount, GovernanceError> {
        let now = self.clock.now();
        self.cell.write().governor.vote(id, voter, support, now)
    }

    pub fn execute(&self, id: &str) -> Result<Vec<Transfer>, GovernanceError> {
        let now = self.clock.now();
        let mut cell = self.cell.write();
        let FundCell { engine, governor } = &mut *cell;
        governor.execute(id, engine, now)
    }

    pub fn cancel(&self, id: &str, caller: &str) -> Result<(), GovernanceError> {
        let now = self.clock.now();
        self.cell.write().governor.cancel(id, caller, now)
    }

    pub fn proposal_state(&self, id: &str) -> Result<ProposalStatus, GovernanceError> {
        let now = self.clock.now();
        self.cell.read().governor.state(id, now)
    }

    pub fn tally(&self, id: &str) -> Result<Tally, GovernanceError> {
        self.cell.read().governor.tally(id)
    }

    /// Every proposal with its status as of now.
    pub fn proposals(&self) -> Vec<(Proposal, ProposalStatus)> {
        let now = self.clock.now();
        self.cell
            .read()
            .governor
            .proposals()
            .iter()
            .map(|p| (p.clone(), p.status(now)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basket_protocol::clock::ManualClock;
    use basket_protocol::vault::FixedRateExecutor;
    use std::sync::Arc;

    #[test]
    fn handle_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GovernedFund<FixedRateExecutor, ManualClock>>();
    }

    #[test]
    fn concurrent_deposits_keep_share_sum() {
        let config = FundConfig::preset("polygon4").unwrap();
        let fund = Arc::new(
            GovernedFund::deploy(
                &config,
                "deployer",
                FixedRateExecutor::new(),
                ManualClock::at_secs(0),
            )
            .unwrap(),
        );

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let fund = Arc::clone(&fund);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        fund.deposit(&format!("holder-{}", i), 1_000).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        fund.inspect(|state, _| {
            let sum: Amount = state.ledger().holders().map(|(_, b)| *b).sum();
            assert_eq!(sum, state.ledger().total_shares());
            assert_eq!(state.ledger().holder_count(), 8);
        });
        assert_eq!(fund.overview().total_value, 8 * 25 * 1_000);
    }
}
