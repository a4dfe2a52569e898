//! The attempt loop.
//!
//! # State machine
//! ```text
//! Preparing ──▶ Submitting ──▶ AwaitingInclusion ──▶ Included
//!     ▲                               │
//!     └──────── Escalating ◀──────────┘ (block passed / nonce consumed)
//!
//! any phase ──▶ Aborted (insufficient funds, relay rejection, fatal error)
//! ```
//!
//! Transient failures re-enter the failing phase after a backoff delay, at the
//! same fees. A [`StopCondition`] is consulted before every Preparing phase.

use alloy::primitives::U256;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::time::{sleep_until, Instant};

use crate::blockchain::Wallet;
use crate::config::{Credentials, RescueConfig};
use crate::observability::metrics;
use crate::relay::{InclusionStatus, RelayError, SubmissionHandle};
use crate::resilience::{RetryPolicy, TransientTracker};
use crate::rescue::amounts::{FeeBreakdown, GasBudget};
use crate::rescue::bundle::{Bundle, BundleBuilder};
use crate::rescue::fees::{FeeController, FeeParameters};
use crate::rescue::plan::RescuePlan;
use crate::rescue::ports::{ChainClient, RelayClient};
use crate::rescue::snapshot::AttemptSnapshot;
use crate::rescue::{RescueError, RescueOutcome};

/// Why the loop ended without inclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    MaxAttempts(u32),
    FeeCeiling { ceiling: U256, next: U256 },
    Cancelled,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::MaxAttempts(n) => write!(f, "reached the limit of {} attempts", n),
            StopReason::FeeCeiling { ceiling, next } => {
                write!(f, "next maxFeePerGas {} wei exceeds the ceiling of {} wei", next, ceiling)
            }
            StopReason::Cancelled => write!(f, "cancelled by operator"),
        }
    }
}

/// Loop state visible to a [`StopCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Attempts that ended without inclusion.
    pub completed_attempts: u32,
    /// Fees the next attempt would use.
    pub next_fees: FeeParameters,
}

/// Decides whether the loop should stop before the next attempt.
pub trait StopCondition: Send + Sync {
    fn should_stop(&self, progress: &Progress) -> Option<StopReason>;
}

impl<F> StopCondition for F
where
    F: Fn(&Progress) -> Option<StopReason> + Send + Sync,
{
    fn should_stop(&self, progress: &Progress) -> Option<StopReason> {
        self(progress)
    }
}

/// Attempt and fee limits. Both unset means the loop runs until inclusion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    pub max_attempts: Option<u32>,
    pub max_fee_per_gas: Option<U256>,
}

impl StopCondition for Limits {
    fn should_stop(&self, progress: &Progress) -> Option<StopReason> {
        if let Some(max) = self.max_attempts {
            if progress.completed_attempts >= max {
                return Some(StopReason::MaxAttempts(max));
            }
        }
        if let Some(ceiling) = self.max_fee_per_gas {
            if progress.next_fees.max_fee_per_gas > ceiling {
                return Some(StopReason::FeeCeiling {
                    ceiling,
                    next: progress.next_fees.max_fee_per_gas,
                });
            }
        }
        None
    }
}

/// Result of one Preparing phase.
#[derive(Debug, Clone)]
pub struct PreparedAttempt {
    pub snapshot: AttemptSnapshot,
    pub fees: FeeParameters,
    pub breakdown: FeeBreakdown,
    pub bundle: Bundle,
}

enum Phase {
    Preparing,
    Submitting(Bundle),
    AwaitingInclusion(SubmissionHandle),
    Escalating,
    Done(RescueOutcome),
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::Preparing => "preparing",
            Phase::Submitting(_) => "submitting",
            Phase::AwaitingInclusion(_) => "awaiting_inclusion",
            Phase::Escalating => "escalating",
            Phase::Done(_) => "done",
        }
    }
}

/// Drives rescue attempts until inclusion, a fatal error, or a stop condition.
pub struct Orchestrator<C, R> {
    chain: C,
    relay: R,
    plan: RescuePlan,
    funding: Wallet,
    at_risk: Wallet,
    builder: BundleBuilder,
    fees: FeeController,
    policy: RetryPolicy,
    transient: TransientTracker,
    stop: Box<dyn StopCondition>,
    shutdown: Option<broadcast::Receiver<()>>,
    attempt: u32,
}

impl<C: ChainClient, R: RelayClient> Orchestrator<C, R> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: C,
        relay: R,
        plan: RescuePlan,
        funding: Wallet,
        at_risk: Wallet,
        builder: BundleBuilder,
        fees: FeeController,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            chain,
            relay,
            plan,
            funding,
            at_risk,
            builder,
            fees,
            policy,
            transient: TransientTracker::new(policy),
            stop: Box::new(Limits::default()),
            shutdown: None,
            attempt: 1,
        }
    }

    /// Wire everything from validated inputs.
    pub fn from_config(chain: C, relay: R, config: &RescueConfig, credentials: &Credentials, plan: RescuePlan) -> Self {
        let builder = BundleBuilder::new(
            GasBudget::from(&config.gas),
            credentials.claim_contract,
            credentials.token_contract,
        )
        .include_claim_amount(config.sweep.include_claim_amount);
        let fees = FeeController::new(FeeParameters::from(&config.fees), config.fees.escalation_percent);
        let limits = Limits {
            max_attempts: config.retry.max_attempts,
            max_fee_per_gas: config.retry.max_fee_per_gas_wei.map(U256::from),
        };

        Self::new(
            chain,
            relay,
            plan,
            credentials.funding.clone(),
            credentials.at_risk.clone(),
            builder,
            fees,
            RetryPolicy::from(&config.retry),
        )
        .with_stop_condition(limits)
    }

    pub fn with_stop_condition(mut self, stop: impl StopCondition + 'static) -> Self {
        self.stop = Box::new(stop);
        self
    }

    /// Observe operator cancellation between attempts and during waits.
    pub fn with_shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn fees(&self) -> &FeeController {
        &self.fees
    }

    /// Run attempts until the bundle lands or the loop must stop.
    pub async fn run(&mut self) -> Result<RescueOutcome, RescueError> {
        tracing::info!(
            funding = %self.funding.address(),
            at_risk = %self.at_risk.address(),
            claim_index = %self.plan.index,
            claim_amount = %self.plan.amount,
            escalation_percent = self.fees.escalation_percent(),
            "Starting rescue"
        );

        let mut phase = Phase::Preparing;
        loop {
            tracing::debug!(attempt = self.attempt, phase = phase.name(), "Entering phase");
            phase = match phase {
                Phase::Preparing => self.on_preparing().await?,
                Phase::Submitting(bundle) => self.on_submitting(bundle).await?,
                Phase::AwaitingInclusion(handle) => self.on_awaiting(handle).await?,
                Phase::Escalating => self.on_escalating().await,
                Phase::Done(outcome) => return Ok(outcome),
            };
        }
    }

    /// Perform a single Preparing phase without submitting anything.
    pub async fn dry_run(&self) -> Result<PreparedAttempt, RescueError> {
        self.prepare().await
    }

    /// Fetch fresh state, print the ledger, apply the guard, build and sign.
    pub async fn prepare(&self) -> Result<PreparedAttempt, RescueError> {
        let snapshot = AttemptSnapshot::fetch(
            &self.chain,
            self.funding.address(),
            self.at_risk.address(),
            self.builder.token_contract(),
        )
        .await?;
        let fees = self.fees.current();
        let breakdown = FeeBreakdown::compute(snapshot.funding.balance, &fees, self.builder.gas());

        tracing::info!(attempt = self.attempt, "\n{}", breakdown);
        breakdown.ensure_sufficient()?;

        let unsigned = self
            .builder
            .build_unsigned(&snapshot, &fees, &self.plan, breakdown.amount_to_send)?;
        let bundle = self
            .builder
            .sign(&self.chain, unsigned, &self.funding, &self.at_risk)
            .await?;

        Ok(PreparedAttempt {
            snapshot,
            fees,
            breakdown,
            bundle,
        })
    }

    async fn on_preparing(&mut self) -> Result<Phase, RescueError> {
        if let Some(reason) = self.stop_reason() {
            tracing::warn!(attempts = self.completed_attempts(), reason = %reason, "Stopping rescue");
            return Ok(Phase::Done(RescueOutcome::Stopped {
                reason,
                attempts: self.completed_attempts(),
            }));
        }

        match self.prepare().await {
            Ok(prepared) => {
                metrics::record_attempt(prepared.fees.max_fee_per_gas);
                tracing::info!(
                    attempt = self.attempt,
                    funding_nonce = prepared.snapshot.funding.nonce,
                    claim_nonce = prepared.snapshot.at_risk.nonce,
                    sweep_amount = %self.builder.sweep_amount(&prepared.snapshot, &self.plan),
                    "Bundle prepared"
                );
                Ok(Phase::Submitting(prepared.bundle))
            }
            Err(e) => self.recover(e, "preparing", Phase::Preparing).await,
        }
    }

    async fn on_submitting(&mut self, bundle: Bundle) -> Result<Phase, RescueError> {
        let submitted = async {
            let head = self.chain.block_number().await?;
            let target_block = head + 1;
            let handle = self.relay.submit_bundle(bundle.as_slice(), target_block).await?;
            Ok::<_, RescueError>(handle)
        }
        .await;

        match submitted {
            Ok(handle) => {
                self.transient.reset();
                metrics::record_bundle_submitted();
                tracing::info!(
                    attempt = self.attempt,
                    target_block = handle.target_block,
                    "Bundle submitted"
                );
                Ok(Phase::AwaitingInclusion(handle))
            }
            Err(RescueError::Relay(RelayError::Rejected(reason))) => {
                tracing::error!(attempt = self.attempt, reason = %reason, "Relay rejected bundle");
                Err(RescueError::RelayRejected {
                    reason,
                    attempt: self.attempt,
                    fees: self.fees.current(),
                })
            }
            // Rebuild from fresh state rather than resubmitting possibly stale nonces.
            Err(e) => self.recover(e, "submitting", Phase::Preparing).await,
        }
    }

    async fn on_awaiting(&mut self, handle: SubmissionHandle) -> Result<Phase, RescueError> {
        match self.relay.await_inclusion(&handle).await {
            Ok(status) => {
                self.transient.reset();
                metrics::record_inclusion(status);
                match status {
                    InclusionStatus::Included => {
                        tracing::info!(
                            attempt = self.attempt,
                            target_block = handle.target_block,
                            "Bundle included"
                        );
                        Ok(Phase::Done(RescueOutcome::Included {
                            attempts: self.attempt,
                            target_block: handle.target_block,
                        }))
                    }
                    InclusionStatus::BlockPassedWithoutInclusion | InclusionStatus::AccountNonceTooHigh => {
                        tracing::info!(
                            attempt = self.attempt,
                            target_block = handle.target_block,
                            status = ?status,
                            "Bundle not included"
                        );
                        Ok(Phase::Escalating)
                    }
                }
            }
            Err(e) => {
                let error = RescueError::from(e);
                self.recover(error, "awaiting_inclusion", Phase::AwaitingInclusion(handle))
                    .await
            }
        }
    }

    async fn on_escalating(&mut self) -> Phase {
        let fees = self.fees.escalate();
        self.attempt += 1;
        tracing::info!(
            next_attempt = self.attempt,
            max_fee_per_gas = %fees.max_fee_per_gas,
            max_priority_fee_per_gas = %fees.max_priority_fee_per_gas,
            delay = ?self.policy.block_interval,
            "Retrying in the next block window"
        );

        if self.pause(self.policy.block_interval).await {
            return self.cancelled();
        }
        Phase::Preparing
    }

    /// Retry `retry` after a backoff if `error` is transient, else abort.
    async fn recover(&mut self, error: RescueError, stage: &'static str, retry: Phase) -> Result<Phase, RescueError> {
        if !error.is_transient() {
            tracing::error!(attempt = self.attempt, stage, error = %error, "Rescue aborted");
            return Err(error);
        }

        metrics::record_transient_failure(stage);
        let Some(delay) = self.transient.record_failure() else {
            return Err(RescueError::TransientExhausted {
                failures: self.transient.consecutive(),
                last: error.to_string(),
            });
        };

        tracing::warn!(
            attempt = self.attempt,
            stage,
            consecutive = self.transient.consecutive(),
            delay = ?delay,
            error = %error,
            "Transient failure, retrying"
        );

        if self.pause(delay).await {
            return Ok(self.cancelled());
        }
        Ok(retry)
    }

    fn completed_attempts(&self) -> u32 {
        self.attempt - 1
    }

    fn stop_reason(&mut self) -> Option<StopReason> {
        if self.cancel_requested() {
            return Some(StopReason::Cancelled);
        }
        self.stop.should_stop(&Progress {
            completed_attempts: self.completed_attempts(),
            next_fees: self.fees.current(),
        })
    }

    fn cancelled(&self) -> Phase {
        let attempts = self.completed_attempts();
        tracing::warn!(attempts, "Rescue cancelled");
        Phase::Done(RescueOutcome::Stopped {
            reason: StopReason::Cancelled,
            attempts,
        })
    }

    fn cancel_requested(&mut self) -> bool {
        let Some(rx) = self.shutdown.as_mut() else {
            return false;
        };
        match rx.try_recv() {
            Ok(()) | Err(TryRecvError::Lagged(_)) => true,
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Closed) => {
                self.shutdown = None;
                false
            }
        }
    }

    /// Sleep for `delay`; returns `true` if cancellation arrived first.
    async fn pause(&mut self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        let signal = match self.shutdown.as_mut() {
            Some(rx) => tokio::select! {
                _ = sleep_until(deadline) => None,
                received = rx.recv() => Some(received),
            },
            None => {
                sleep_until(deadline).await;
                None
            }
        };

        match signal {
            Some(Ok(())) | Some(Err(RecvError::Lagged(_))) => true,
            Some(Err(RecvError::Closed)) => {
                self.shutdown = None;
                sleep_until(deadline).await;
                false
            }
            None => false,
        }
    }
}
