//! The judge operations.
//!
//! Every mutating operation runs inside a transaction: reads go through an
//! [`Overlay`] on the store, writes and events are buffered, and only a fully
//! successful operation is committed with one [`KvStore::apply`]. A failed
//! operation drops its overlay and leaves the store exactly as it was.
//!
//! Judging the previous bucket during a submission is its own operation with
//! its own commit; its result does not affect the submission.

use serde::{Deserialize, Serialize};
use verity_store::{KvStore, Overlay, StoreError, WriteBatch};
use verity_types::events::Event;
use verity_types::{AccountId, Amount, BucketTs, GameTypeId, PredictionValue};

use crate::events::EventSink;
use crate::instance::{self, InstanceHeader};
use crate::registry::{self, GameTypeRecord};
use crate::{ledger, JudgeConfig, JudgeError, Result, TimeKeeper, WindowPosition};

/// Who is calling and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Identity already authenticated by the host.
    pub caller: AccountId,
    /// Current time in Unix seconds.
    pub now: u64,
}

/// A prediction submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub oracle: AccountId,
    pub game_type: GameTypeId,
    pub ts: BucketTs,
    pub value: PredictionValue,
    /// Either 0 (stake from available balance) or exactly the collateral
    /// requirement (deposit attached to this call).
    #[serde(default)]
    pub stake_amount: Amount,
}

/// Result of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Registration slot given to the oracle.
    pub slot: u32,
    /// Instance leader after this vote.
    pub leader_value: PredictionValue,
    /// Votes for the leader after this vote.
    pub leader_count: u64,
}

/// How a judged instance's stake was distributed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub leader: PredictionValue,
    pub n_correct: u64,
    /// Everything seized from oracles that disagreed with the leader.
    pub total_bounty: Amount,
    pub per_correct: Amount,
    /// Credited to the system account.
    pub remainder: Amount,
}

/// Outcome of judging an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Judgement {
    /// At least one oracle agreed with the leader.
    Settled(Settlement),
    /// The instance had no registrations. Nothing is written and the
    /// instance stays open.
    NothingCorrect,
}

/// The consensus judge over a store `S`, reporting to sink `E`.
pub struct Engine<S: KvStore, E: EventSink> {
    store: S,
    config: JudgeConfig,
    timekeeper: TimeKeeper,
    sink: E,
}

impl<S: KvStore, E: EventSink> Engine<S, E> {
    /// Create an engine.
    ///
    /// # Errors
    ///
    /// - [`JudgeError::InvalidConfig`] if `config` fails validation
    pub fn new(store: S, config: JudgeConfig, sink: E) -> Result<Self> {
        config.validate()?;
        let timekeeper = TimeKeeper::from_config(&config);
        Ok(Self {
            store,
            config,
            timekeeper,
            sink,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    fn begin(&self) -> Tx<'_> {
        Tx {
            overlay: Overlay::new(&self.store),
            config: &self.config,
            timekeeper: self.timekeeper,
            events: Vec::new(),
        }
    }

    fn commit(&mut self, batch: WriteBatch, events: Vec<Event>) -> Result<()> {
        if !batch.is_empty() {
            self.store.apply(batch)?;
        }
        for event in events {
            self.sink.emit(event);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Mutating operations
    // ------------------------------------------------------------------

    /// Register a new game type.
    ///
    /// # Errors
    ///
    /// - [`JudgeError::Unauthorized`] if the caller is not `creator`
    /// - [`JudgeError::AlreadyLive`] if the game type exists
    pub fn create_game_type(
        &mut self,
        ctx: &CallContext,
        creator: &AccountId,
        game: &GameTypeId,
    ) -> Result<GameTypeRecord> {
        authorize(ctx, creator)?;
        let (record, batch, events) = {
            let mut tx = self.begin();
            let record = tx.create_game_type(creator, game, ctx.now)?;
            let (batch, events) = tx.finish();
            (record, batch, events)
        };
        self.commit(batch, events)?;
        Ok(record)
    }

    /// Register an oracle for an instance, stake its collateral and count
    /// its vote.
    ///
    /// Checks run in order and stop at the first failure: caller identity,
    /// bucket alignment, game type (when gated), instance not judged, then
    /// the previous bucket is judged if due, then registration, window and
    /// stake.
    ///
    /// # Errors
    ///
    /// - [`JudgeError::Unauthorized`] if the caller is not the oracle
    /// - [`JudgeError::InvalidBucket`] if `ts` is misaligned
    /// - [`JudgeError::UnknownGameType`] if gated and the game type is unknown
    /// - [`JudgeError::AlreadyJudged`] if the instance is closed
    /// - [`JudgeError::AlreadyRegistered`] on a second submission
    /// - [`JudgeError::OutOfWindow`] if `now` is outside the bucket window
    /// - [`JudgeError::InvalidStakeAmount`] if the stake is neither 0 nor the collateral
    /// - [`JudgeError::InsufficientBalance`] if staking from balance and it is too low
    pub fn submit_prediction(
        &mut self,
        ctx: &CallContext,
        submission: &Submission,
    ) -> Result<SubmitReceipt> {
        let game = &submission.game_type;
        let ts = submission.ts;

        authorize(ctx, &submission.oracle)?;
        self.timekeeper.validate_bucket(ts)?;
        if self.config.require_live_game_type && !registry::is_live(&self.store, game)? {
            return Err(JudgeError::UnknownGameType {
                game_type: game.clone(),
            });
        }
        if instance::header(&self.store, game, ts)?.judged {
            return Err(JudgeError::AlreadyJudged {
                game_type: game.clone(),
                ts,
            });
        }

        if let Some(prev) = self.timekeeper.previous_bucket(ts) {
            self.try_judge(game, prev, ctx.now);
        }

        let (receipt, batch, events) = {
            let mut tx = self.begin();
            let receipt = tx.submit(submission, ctx.now)?;
            let (batch, events) = tx.finish();
            (receipt, batch, events)
        };
        self.commit(batch, events)?;
        Ok(receipt)
    }

    /// Close an instance and distribute its stake.
    ///
    /// # Errors
    ///
    /// - [`JudgeError::InvalidBucket`] if `ts` is misaligned
    /// - [`JudgeError::AlreadyJudged`] if the instance is closed
    /// - [`JudgeError::NotYetDue`] if the bucket window has not ended
    pub fn judge_instance(
        &mut self,
        game: &GameTypeId,
        ts: BucketTs,
        now: u64,
    ) -> Result<Judgement> {
        let (judgement, batch, events) = {
            let mut tx = self.begin();
            let judgement = tx.judge(game, ts, now)?;
            let (batch, events) = tx.finish();
            (judgement, batch, events)
        };
        self.commit(batch, events)?;
        Ok(judgement)
    }

    /// Judge if possible; the outcome is only logged.
    fn try_judge(&mut self, game: &GameTypeId, ts: BucketTs, now: u64) {
        match self.judge_instance(game, ts, now) {
            Ok(judgement) => {
                tracing::debug!(game_type = %game, ts, ?judgement, "implicit judgement");
            }
            Err(err @ JudgeError::Store(_)) => {
                tracing::warn!(game_type = %game, ts, "implicit judgement failed: {err}");
            }
            Err(err) => {
                tracing::debug!(game_type = %game, ts, "implicit judgement skipped: {err}");
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Accepted value of an instance, judging it first if due. Reads 0 for
    /// an instance that is not judged.
    pub fn get_prediction(
        &mut self,
        game: &GameTypeId,
        ts: BucketTs,
        now: u64,
    ) -> Result<PredictionValue> {
        self.try_judge(game, ts, now);
        let header = instance::header(&self.store, game, ts)?;
        Ok(if header.judged { header.leader_value } else { 0 })
    }

    /// Number of oracles that agreed with the accepted value, judging first
    /// if due. Reads 0 for an instance that is not judged.
    pub fn get_correct_oracle_count(
        &mut self,
        game: &GameTypeId,
        ts: BucketTs,
        now: u64,
    ) -> Result<u64> {
        self.try_judge(game, ts, now);
        let header = instance::header(&self.store, game, ts)?;
        Ok(if header.judged { header.correct_count } else { 0 })
    }

    pub fn get_available_balance(&self, account: &AccountId) -> Result<Amount> {
        ledger::available(&self.store, account)
    }

    pub fn get_locked_balance(&self, account: &AccountId) -> Result<Amount> {
        ledger::locked(&self.store, account)
    }

    pub fn get_game_type(&self, game: &GameTypeId) -> Result<Option<GameTypeRecord>> {
        registry::get(&self.store, game)
    }

    /// Instance header without triggering judgement.
    pub fn get_instance(&self, game: &GameTypeId, ts: BucketTs) -> Result<InstanceHeader> {
        instance::header(&self.store, game, ts)
    }

    pub fn get_vote_count(
        &self,
        game: &GameTypeId,
        ts: BucketTs,
        value: PredictionValue,
    ) -> Result<u64> {
        instance::vote_count(&self.store, game, ts, value)
    }

    pub fn get_oracle_prediction(
        &self,
        game: &GameTypeId,
        ts: BucketTs,
        oracle: &AccountId,
    ) -> Result<Option<PredictionValue>> {
        instance::prediction(&self.store, game, ts, oracle)
    }

    /// Raw stored bytes under `key`.
    pub fn debug_get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.store.get(key).map_err(JudgeError::from)
    }
}

fn authorize(ctx: &CallContext, account: &AccountId) -> Result<()> {
    if ctx.caller != *account {
        return Err(JudgeError::Unauthorized {
            caller: ctx.caller,
            account: *account,
        });
    }
    Ok(())
}

/// One operation's pending writes and events.
struct Tx<'a> {
    overlay: Overlay<'a>,
    config: &'a JudgeConfig,
    timekeeper: TimeKeeper,
    events: Vec<Event>,
}

impl Tx<'_> {
    fn finish(self) -> (WriteBatch, Vec<Event>) {
        (self.overlay.into_batch(), self.events)
    }

    fn create_game_type(
        &mut self,
        creator: &AccountId,
        game: &GameTypeId,
        now: u64,
    ) -> Result<GameTypeRecord> {
        if registry::is_live(&self.overlay, game)? {
            return Err(JudgeError::AlreadyLive {
                game_type: game.clone(),
            });
        }
        let record = GameTypeRecord {
            creator: *creator,
            created_at: now,
        };
        registry::insert(&mut self.overlay, game, &record)?;
        tracing::info!(game_type = %game, creator = %creator, "game type created");
        self.events.push(Event::GameTypeCreated {
            game_type: game.clone(),
            creator: *creator,
            created_at: now,
        });
        Ok(record)
    }

    fn submit(&mut self, submission: &Submission, now: u64) -> Result<SubmitReceipt> {
        let Submission {
            oracle,
            game_type: game,
            ts,
            value,
            stake_amount,
        } = submission;
        let (ts, value, stake_amount) = (*ts, *value, *stake_amount);
        let collateral = self.config.collateral_requirement;

        if instance::is_member(&self.overlay, game, ts, oracle)? {
            return Err(JudgeError::AlreadyRegistered {
                oracle: *oracle,
                game_type: game.clone(),
                ts,
            });
        }

        let position = self.timekeeper.classify(ts, now);
        if position != WindowPosition::InWindow {
            return Err(JudgeError::OutOfWindow { ts, now, position });
        }

        if stake_amount == collateral {
            ledger::credit(&mut self.overlay, oracle, stake_amount)?;
        } else if stake_amount != 0 {
            return Err(JudgeError::InvalidStakeAmount {
                amount: stake_amount,
                required: collateral,
            });
        }
        ledger::stake(&mut self.overlay, oracle, collateral)?;

        let mut header = instance::header(&self.overlay, game, ts)?;
        let slot = instance::register(&mut self.overlay, game, ts, oracle, &mut header)?;
        instance::record_prediction(&mut self.overlay, game, ts, oracle, value)?;
        let count = instance::tally(&mut self.overlay, game, ts, value, &mut header)?;
        instance::save_header(&mut self.overlay, game, ts, &header)?;

        tracing::debug!(
            game_type = %game,
            ts,
            oracle = %oracle,
            slot,
            value,
            votes = count,
            leader = header.leader_value,
            "prediction accepted"
        );
        self.events.push(Event::PredictionAccepted {
            game_type: game.clone(),
            bucket_ts: ts,
            oracle: *oracle,
            slot,
            leader_value: header.leader_value,
            leader_count: header.leader_count,
        });

        Ok(SubmitReceipt {
            slot,
            leader_value: header.leader_value,
            leader_count: header.leader_count,
        })
    }

    fn judge(&mut self, game: &GameTypeId, ts: BucketTs, now: u64) -> Result<Judgement> {
        self.timekeeper.validate_bucket(ts)?;
        let mut header = instance::header(&self.overlay, game, ts)?;
        if header.judged {
            return Err(JudgeError::AlreadyJudged {
                game_type: game.clone(),
                ts,
            });
        }
        if !self.timekeeper.is_due(ts, now) {
            return Err(JudgeError::NotYetDue {
                ts,
                deadline: self.timekeeper.deadline(ts),
                now,
            });
        }

        // Nobody registered, so no stake moved. The header stays absent and
        // reads back as a fresh instance.
        if header.oracle_count == 0 {
            tracing::debug!(game_type = %game, ts, "no registrations to judge");
            return Ok(Judgement::NothingCorrect);
        }

        let leader = header.leader_value;
        let collateral = self.config.collateral_requirement;
        let system = self.config.system_account;

        let mut correct = Vec::new();
        let mut total_bounty: Amount = 0;
        for oracle in instance::oracles(&self.overlay, game, ts, &header)? {
            if instance::prediction(&self.overlay, game, ts, &oracle)? == Some(leader) {
                ledger::release(&mut self.overlay, &oracle, collateral)?;
                correct.push(oracle);
            } else {
                let seized = ledger::seize(&mut self.overlay, &oracle)?;
                total_bounty = total_bounty
                    .checked_add(seized)
                    .ok_or(JudgeError::Overflow("total bounty"))?;
            }
        }

        // The leader holds at least one vote, so some registered oracle
        // predicted it.
        if correct.is_empty() {
            return Err(StoreError::Corrupt(format!(
                "instance {game}@{ts} has no prediction matching leader {leader}"
            ))
            .into());
        }

        let n_correct = correct.len() as u64;
        let per_correct = total_bounty / n_correct;
        let remainder = total_bounty % n_correct;
        ledger::credit(&mut self.overlay, &system, remainder)?;
        for oracle in &correct {
            ledger::credit(&mut self.overlay, oracle, per_correct)?;
        }

        header.judged = true;
        header.correct_count = n_correct;
        instance::save_header(&mut self.overlay, game, ts, &header)?;

        tracing::info!(
            game_type = %game,
            ts,
            leader,
            n_correct,
            total_bounty,
            per_correct,
            remainder,
            "instance judged"
        );
        self.events.push(Event::JudgingComplete {
            game_type: game.clone(),
            bucket_ts: ts,
            n_correct,
            leader,
            total_bounty,
        });

        Ok(Judgement::Settled(Settlement {
            leader,
            n_correct,
            total_bounty,
            per_correct,
            remainder,
        }))
    }
}

#[cfg(test)]
mod tests {
    use verity_store::MemoryStore;

    use super::*;
    use crate::RecordingSink;

    const GAME: &str = "NEO-USD";
    const SYSTEM: AccountId = AccountId([0xee; 20]);

    fn config() -> JudgeConfig {
        JudgeConfig {
            collateral_requirement: 5,
            bucket_width: 480,
            starting_epoch: 1000,
            system_account: SYSTEM,
            require_live_game_type: false,
        }
    }

    fn oracle(b: u8) -> AccountId {
        AccountId([b; 20])
    }

    fn game() -> GameTypeId {
        GameTypeId::from(GAME)
    }

    fn engine_with(store: MemoryStore, config: JudgeConfig) -> Engine<MemoryStore, RecordingSink> {
        Engine::new(store, config, RecordingSink::new()).expect("engine")
    }

    fn engine() -> Engine<MemoryStore, RecordingSink> {
        engine_with(MemoryStore::new(), config())
    }

    /// Store with pre-existing available balances.
    fn funded(accounts: &[(AccountId, Amount)]) -> MemoryStore {
        let mut store = MemoryStore::new();
        let batch = {
            let mut overlay = Overlay::new(&store);
            for (account, amount) in accounts {
                ledger::credit(&mut overlay, account, *amount).expect("credit");
            }
            overlay.into_batch()
        };
        store.apply(batch).expect("apply");
        store
    }

    fn submit(
        engine: &mut Engine<MemoryStore, RecordingSink>,
        who: AccountId,
        ts: BucketTs,
        value: PredictionValue,
        stake_amount: Amount,
        now: u64,
    ) -> Result<SubmitReceipt> {
        engine.submit_prediction(
            &CallContext { caller: who, now },
            &Submission {
                oracle: who,
                game_type: game(),
                ts,
                value,
                stake_amount,
            },
        )
    }

    fn total_balance(engine: &Engine<MemoryStore, RecordingSink>, accounts: &[AccountId]) -> Amount {
        accounts
            .iter()
            .map(|a| {
                engine.get_available_balance(a).expect("available")
                    + engine.get_locked_balance(a).expect("locked")
            })
            .sum()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Engine::new(
            MemoryStore::new(),
            JudgeConfig {
                bucket_width: 0,
                ..config()
            },
            RecordingSink::new(),
        );
        assert!(matches!(result, Err(JudgeError::InvalidConfig(_))));
    }

    #[test]
    fn test_end_to_end_settlement() {
        let mut engine = engine();
        let (o1, o2, o3) = (oracle(1), oracle(2), oracle(3));

        submit(&mut engine, o1, 1480, 100, 5, 1500).expect("o1");
        submit(&mut engine, o2, 1480, 200, 5, 1510).expect("o2");
        let receipt = submit(&mut engine, o3, 1480, 100, 5, 1520).expect("o3");
        assert_eq!(receipt.slot, 2);
        assert_eq!((receipt.leader_value, receipt.leader_count), (100, 2));

        for o in [o1, o2, o3] {
            assert_eq!(engine.get_locked_balance(&o).expect("locked"), 5);
            assert_eq!(engine.get_available_balance(&o).expect("available"), 0);
        }

        let judgement = engine.judge_instance(&game(), 1480, 1960).expect("judge");
        assert_eq!(
            judgement,
            Judgement::Settled(Settlement {
                leader: 100,
                n_correct: 2,
                total_bounty: 5,
                per_correct: 2,
                remainder: 1,
            })
        );

        assert_eq!(engine.get_available_balance(&o1).expect("available"), 7);
        assert_eq!(engine.get_available_balance(&o3).expect("available"), 7);
        assert_eq!(engine.get_available_balance(&o2).expect("available"), 0);
        assert_eq!(engine.get_available_balance(&SYSTEM).expect("available"), 1);
        for o in [o1, o2, o3] {
            assert_eq!(engine.get_locked_balance(&o).expect("locked"), 0);
        }
        assert_eq!(total_balance(&engine, &[o1, o2, o3, SYSTEM]), 15);

        assert_eq!(engine.get_prediction(&game(), 1480, 2000).expect("prediction"), 100);
        assert_eq!(
            engine
                .get_correct_oracle_count(&game(), 1480, 2000)
                .expect("count"),
            2
        );
    }

    #[test]
    fn test_leader_sequence() {
        let mut engine = engine();
        let (a, b) = (100, 200);
        for (i, value) in [a, b, a, a, b].into_iter().enumerate() {
            submit(&mut engine, oracle(i as u8 + 1), 1480, value, 5, 1500).expect("submit");
        }
        assert_eq!(engine.get_vote_count(&game(), 1480, a).expect("votes"), 3);
        assert_eq!(engine.get_vote_count(&game(), 1480, b).expect("votes"), 2);
        let header = engine.get_instance(&game(), 1480).expect("instance");
        assert_eq!((header.leader_value, header.leader_count), (a, 3));
        assert_eq!(header.oracle_count, 5);
        assert!(!header.judged);
    }

    #[test]
    fn test_tie_does_not_overwrite_leader() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1480, 7, 5, 1500).expect("submit");
        let receipt = submit(&mut engine, oracle(2), 1480, 9, 5, 1500).expect("submit");
        assert_eq!((receipt.leader_value, receipt.leader_count), (7, 1));
    }

    #[test]
    fn test_window_enforcement() {
        let mut engine = engine();
        let o = oracle(1);

        let err = submit(&mut engine, o, 1037, 1, 5, 1040).expect_err("misaligned");
        assert!(matches!(err, JudgeError::InvalidBucket { ts: 1037 }));

        let err = submit(&mut engine, o, 1480, 1, 5, 1479).expect_err("early");
        assert!(matches!(
            err,
            JudgeError::OutOfWindow {
                position: WindowPosition::TooEarly,
                ..
            }
        ));

        let err = submit(&mut engine, o, 1480, 1, 5, 1960).expect_err("late");
        assert!(matches!(
            err,
            JudgeError::OutOfWindow {
                position: WindowPosition::Expired,
                ..
            }
        ));
        assert_eq!(engine.get_available_balance(&o).expect("available"), 0);
        assert_eq!(engine.get_locked_balance(&o).expect("locked"), 0);
    }

    #[test]
    fn test_failed_submission_leaves_store_untouched() {
        // Bucket 1000 is the epoch, so no previous bucket gets judged.
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1000, 1, 5, 1010).expect("submit");
        let before = engine.store().clone();
        let events_before = engine.sink().events().len();

        let failures = [
            submit(&mut engine, oracle(1), 1000, 2, 5, 1020),
            submit(&mut engine, oracle(2), 1000, 2, 5, 999),
            submit(&mut engine, oracle(2), 1000, 2, 5, 1480),
            submit(&mut engine, oracle(2), 1000, 2, 3, 1020),
            submit(&mut engine, oracle(2), 1000, 2, 0, 1020),
            submit(&mut engine, oracle(2), 1001, 2, 5, 1020),
        ];
        for result in failures {
            assert!(result.is_err());
        }

        assert_eq!(engine.store(), &before);
        assert_eq!(engine.sink().events().len(), events_before);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut engine = engine();
        let o = oracle(1);
        submit(&mut engine, o, 1480, 100, 5, 1500).expect("first");
        let err = submit(&mut engine, o, 1480, 200, 5, 1510).expect_err("duplicate");
        assert!(matches!(err, JudgeError::AlreadyRegistered { .. }));
        assert_eq!(engine.get_locked_balance(&o).expect("locked"), 5);
        assert_eq!(engine.get_available_balance(&o).expect("available"), 0);
        assert_eq!(
            engine
                .get_oracle_prediction(&game(), 1480, &o)
                .expect("prediction"),
            Some(100)
        );
        assert_eq!(engine.get_vote_count(&game(), 1480, 200).expect("votes"), 0);
    }

    #[test]
    fn test_unauthorized_caller() {
        let mut engine = engine();
        let err = engine
            .submit_prediction(
                &CallContext {
                    caller: oracle(9),
                    now: 1500,
                },
                &Submission {
                    oracle: oracle(1),
                    game_type: game(),
                    ts: 1480,
                    value: 1,
                    stake_amount: 5,
                },
            )
            .expect_err("wrong caller");
        assert!(matches!(err, JudgeError::Unauthorized { .. }));
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_stake_paths() {
        let o = oracle(1);
        let mut engine = engine_with(funded(&[(o, 12)]), config());

        let err = submit(&mut engine, o, 1480, 1, 4, 1500).expect_err("bad amount");
        assert!(matches!(
            err,
            JudgeError::InvalidStakeAmount {
                amount: 4,
                required: 5
            }
        ));

        // Stake from existing balance.
        submit(&mut engine, o, 1480, 1, 0, 1500).expect("from balance");
        assert_eq!(engine.get_available_balance(&o).expect("available"), 7);
        assert_eq!(engine.get_locked_balance(&o).expect("locked"), 5);

        let poor = oracle(2);
        let err = submit(&mut engine, poor, 1480, 1, 0, 1500).expect_err("no balance");
        assert!(matches!(
            err,
            JudgeError::InsufficientBalance {
                required: 5,
                available: 0
            }
        ));
    }

    #[test]
    fn test_judge_idempotent() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1480, 1, 5, 1500).expect("submit");
        submit(&mut engine, oracle(2), 1480, 2, 5, 1500).expect("submit");
        engine.judge_instance(&game(), 1480, 1960).expect("judge");
        let snapshot = engine.store().clone();

        let err = engine
            .judge_instance(&game(), 1480, 3000)
            .expect_err("second judge");
        assert!(matches!(err, JudgeError::AlreadyJudged { .. }));
        assert_eq!(engine.store(), &snapshot);
    }

    #[test]
    fn test_judge_not_yet_due() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1480, 1, 5, 1500).expect("submit");
        let err = engine
            .judge_instance(&game(), 1480, 1959)
            .expect_err("too early");
        assert!(matches!(
            err,
            JudgeError::NotYetDue {
                ts: 1480,
                deadline: 1960,
                now: 1959
            }
        ));
        assert!(!engine.get_instance(&game(), 1480).expect("instance").judged);

        // Queries before the deadline do not judge.
        assert_eq!(engine.get_prediction(&game(), 1480, 1900).expect("prediction"), 0);
        assert!(!engine.get_instance(&game(), 1480).expect("instance").judged);
    }

    #[test]
    fn test_judge_misaligned_bucket() {
        let mut engine = engine();
        let err = engine.judge_instance(&game(), 1037, 5000).expect_err("misaligned");
        assert!(matches!(err, JudgeError::InvalidBucket { .. }));
    }

    #[test]
    fn test_empty_instance_nothing_correct() {
        let mut engine = engine();
        let judgement = engine.judge_instance(&game(), 1480, 1960).expect("judge");
        assert_eq!(judgement, Judgement::NothingCorrect);
        assert_eq!(
            engine.get_instance(&game(), 1480).expect("instance"),
            InstanceHeader::default()
        );
        assert!(engine.store().is_empty());
        assert!(engine.sink().events().is_empty());

        // Still open, so judging again gives the same answer.
        let again = engine.judge_instance(&game(), 1480, 1960).expect("judge again");
        assert_eq!(again, Judgement::NothingCorrect);
    }

    #[test]
    fn test_queries_on_empty_instances_write_nothing() {
        let mut engine = engine();
        for i in 0..100u64 {
            let game = GameTypeId::from(format!("unknown-{i}").as_str());
            let ts = 1000 + i * 480;
            assert_eq!(engine.get_prediction(&game, ts, 1_000_000).expect("prediction"), 0);
            assert_eq!(
                engine
                    .get_correct_oracle_count(&game, ts, 1_000_000)
                    .expect("count"),
                0
            );
        }
        assert!(engine.store().is_empty());
        assert!(engine.sink().events().is_empty());
    }

    #[test]
    fn test_first_submission_of_series_emits_only_its_own_event() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1480, 1, 5, 1500).expect("submit");
        let names: Vec<_> = engine.sink().events().iter().map(Event::name).collect();
        assert_eq!(names, vec!["prediction_accepted"]);
        assert!(!engine.get_instance(&game(), 1000).expect("instance").judged);
    }

    #[test]
    fn test_submit_to_judged_instance() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1480, 1, 5, 1500).expect("submit");
        engine.judge_instance(&game(), 1480, 1960).expect("judge");
        let err = submit(&mut engine, oracle(2), 1480, 1, 5, 1500).expect_err("judged");
        assert!(matches!(err, JudgeError::AlreadyJudged { ts: 1480, .. }));
    }

    #[test]
    fn test_next_bucket_submission_judges_previous() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1480, 100, 5, 1500).expect("submit");
        submit(&mut engine, oracle(2), 1480, 200, 5, 1500).expect("submit");

        submit(&mut engine, oracle(3), 1960, 100, 5, 1970).expect("next bucket");

        let header = engine.get_instance(&game(), 1480).expect("instance");
        assert!(header.judged);
        assert_eq!(header.correct_count, 1);
        assert_eq!(engine.get_available_balance(&oracle(1)).expect("available"), 10);
        assert_eq!(engine.get_available_balance(&oracle(2)).expect("available"), 0);
        assert!(!engine.get_instance(&game(), 1960).expect("instance").judged);
    }

    #[test]
    fn test_previous_judgement_commits_even_if_submission_fails() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1480, 100, 5, 1500).expect("submit");

        // Invalid stake amount, but the previous bucket is still closed.
        let err = submit(&mut engine, oracle(2), 1960, 100, 3, 1970)
            .expect_err("bad stake");
        assert!(matches!(err, JudgeError::InvalidStakeAmount { .. }));
        assert!(engine.get_instance(&game(), 1480).expect("instance").judged);
        assert_eq!(
            engine
                .get_oracle_prediction(&game(), 1960, &oracle(2))
                .expect("read"),
            None
        );
    }

    #[test]
    fn test_query_judges_when_due() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1480, 42, 5, 1500).expect("submit");
        assert_eq!(engine.get_prediction(&game(), 1480, 1960).expect("prediction"), 42);
        assert!(engine.get_instance(&game(), 1480).expect("instance").judged);
        assert_eq!(
            engine
                .get_correct_oracle_count(&game(), 1480, 1960)
                .expect("count"),
            1
        );
    }

    #[test]
    fn test_query_unknown_instance_reads_zero() {
        let mut engine = engine();
        assert_eq!(engine.get_prediction(&game(), 1037, 9999).expect("prediction"), 0);
        assert_eq!(
            engine
                .get_correct_oracle_count(&game(), 1037, 9999)
                .expect("count"),
            0
        );
    }

    #[test]
    fn test_release_capped_after_cross_instance_seize() {
        let mut engine = engine();
        let (x, w, v) = (oracle(1), oracle(2), oracle(3));
        let other = GameTypeId::from("GAS-USD");

        submit(&mut engine, x, 1480, 1, 5, 1500).expect("x neo");
        submit(&mut engine, w, 1480, 2, 5, 1500).expect("w neo");
        submit(&mut engine, v, 1480, 2, 5, 1500).expect("v neo");
        engine
            .submit_prediction(
                &CallContext { caller: x, now: 1500 },
                &Submission {
                    oracle: x,
                    game_type: other.clone(),
                    ts: 1480,
                    value: 9,
                    stake_amount: 5,
                },
            )
            .expect("x gas");
        assert_eq!(engine.get_locked_balance(&x).expect("locked"), 10);

        // x loses NEO-USD and forfeits everything, including the GAS-USD lock.
        let neo = engine.judge_instance(&game(), 1480, 1960).expect("judge neo");
        assert!(matches!(neo, Judgement::Settled(s) if s.total_bounty == 10));

        // x wins GAS-USD, but its collateral is gone.
        let gas = engine.judge_instance(&other, 1480, 1960).expect("judge gas");
        assert!(matches!(gas, Judgement::Settled(s) if s.n_correct == 1 && s.total_bounty == 0));
        assert_eq!(engine.get_available_balance(&x).expect("available"), 0);
        assert_eq!(engine.get_locked_balance(&x).expect("locked"), 0);

        assert_eq!(total_balance(&engine, &[x, w, v, SYSTEM]), 20);
    }

    #[test]
    fn test_create_game_type() {
        let mut engine = engine();
        let creator = oracle(1);
        let ctx = CallContext {
            caller: creator,
            now: 1500,
        };

        let record = engine
            .create_game_type(&ctx, &creator, &game())
            .expect("create");
        assert_eq!(record.created_at, 1500);
        assert_eq!(engine.get_game_type(&game()).expect("get"), Some(record));

        let err = engine
            .create_game_type(&ctx, &creator, &game())
            .expect_err("duplicate");
        assert!(matches!(err, JudgeError::AlreadyLive { .. }));

        let err = engine
            .create_game_type(&ctx, &oracle(2), &GameTypeId::from("GAS-USD"))
            .expect_err("impersonation");
        assert!(matches!(err, JudgeError::Unauthorized { .. }));

        let events = engine.sink().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name(), "game_type_created");
    }

    #[test]
    fn test_live_game_type_gate() {
        let mut engine = engine_with(
            MemoryStore::new(),
            JudgeConfig {
                require_live_game_type: true,
                ..config()
            },
        );
        let err = submit(&mut engine, oracle(1), 1480, 1, 5, 1500).expect_err("unknown");
        assert!(matches!(err, JudgeError::UnknownGameType { .. }));

        let ctx = CallContext {
            caller: oracle(1),
            now: 1500,
        };
        engine
            .create_game_type(&ctx, &oracle(1), &game())
            .expect("create");
        submit(&mut engine, oracle(1), 1480, 1, 5, 1500).expect("gated submit");
    }

    #[test]
    fn test_events_follow_commits() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1000, 100, 5, 1010).expect("submit");
        submit(&mut engine, oracle(2), 1000, 100, 5, 1010).expect("submit");
        engine.judge_instance(&game(), 1000, 1480).expect("judge");

        let names: Vec<_> = engine.sink().events().iter().map(Event::name).collect();
        assert_eq!(
            names,
            vec!["prediction_accepted", "prediction_accepted", "judging_complete"]
        );
        assert!(matches!(
            engine.sink().events()[2],
            Event::JudgingComplete {
                n_correct: 2,
                leader: 100,
                total_bounty: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_debug_get_raw() {
        let mut engine = engine();
        submit(&mut engine, oracle(1), 1480, 1, 5, 1500).expect("submit");
        let key = verity_store::StoreKey::Locked(&oracle(1)).encode();
        assert_eq!(
            engine.debug_get_raw(&key).expect("raw"),
            Some(5u64.to_be_bytes().to_vec())
        );
        assert_eq!(engine.debug_get_raw(b"nope").expect("raw"), None);
    }
}
