//! Phase Transitions
//!
//! One call to [`Room::advance`] is one tick of the table clock:
//!
//! ```text
//! betting (20) ──settle──▶ spinning (5) ──▶ result (5) ──clear bets──▶ betting
//! ```
//!
//! Settlement happens exactly once per round, on the betting→spinning
//! edge. Bets stay on the table through `result` so clients can
//! highlight winners, and are dropped on the way back to betting.

use std::collections::BTreeMap;

use tracing::{error, info};
#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::rng::{OutcomeError, OutcomeSource};
use crate::game::events::RoomEvent;
use crate::game::room::Room;
use crate::game::rules;
use crate::game::state::{Phase, SpinResult};

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TickResult {
    /// Phase change this tick, if any: (from, to).
    pub transition: Option<(Phase, Phase)>,
    /// Settlement outcome, on the betting→spinning edge.
    pub spin: Option<SpinResult>,
}

impl Room {
    /// Advance the table clock by one tick.
    ///
    /// Fails only when the wheel cannot produce an outcome. In that case
    /// no balance changes, the room stays in betting with one tick left,
    /// and the next call retries the settlement.
    pub fn advance<W>(&mut self, wheel: &mut W) -> Result<TickResult, OutcomeError>
    where
        W: OutcomeSource + ?Sized,
    {
        self.countdown = self.countdown.saturating_sub(1);

        #[cfg(feature = "debug-tracing")]
        trace!(phase = %self.phase, countdown = self.countdown, "Tick");

        let mut result = TickResult::default();

        match self.phase {
            Phase::Betting => {
                if self.countdown > 0 {
                    self.emit(RoomEvent::Countdown { seconds: self.countdown });
                    return Ok(result);
                }
                let spin = match self.settle(wheel) {
                    Ok(spin) => spin,
                    Err(e) => {
                        self.countdown = 1;
                        error!(round = self.round, error = %e, "Settlement aborted");
                        return Err(e);
                    }
                };
                result.transition = Some((Phase::Betting, Phase::Spinning));
                result.spin = Some(spin);
            }
            Phase::Spinning => {
                if self.countdown == 0 {
                    self.show_result();
                    result.transition = Some((Phase::Spinning, Phase::Result));
                }
            }
            Phase::Result => {
                if self.countdown == 0 {
                    self.start_betting();
                    result.transition = Some((Phase::Result, Phase::Betting));
                }
            }
        }

        Ok(result)
    }

    /// Draw the outcome and credit every winning bet.
    fn settle<W>(&mut self, wheel: &mut W) -> Result<SpinResult, OutcomeError>
    where
        W: OutcomeSource + ?Sized,
    {
        // Draw before touching anything so a failure leaves no trace.
        let winning_number = wheel.spin()?;

        self.phase = Phase::Spinning;
        self.countdown = self.config.spinning_ticks;
        self.result = Some(winning_number);

        let mut payouts = BTreeMap::new();
        for (player_id, player) in self.players.iter_mut() {
            let won: u64 = player
                .bets
                .iter()
                .filter(|bet| rules::wins(&bet.numbers, winning_number))
                .map(|bet| rules::payout(bet.bet_type, bet.amount))
                .sum();
            if won > 0 {
                player.balance += won;
                payouts.insert(*player_id, won);
            }
        }

        self.history.push_front(winning_number);
        self.history.truncate(self.config.history_len);

        let spin = SpinResult { winning_number, payouts };
        info!(
            round = self.round,
            winning_number,
            winners = spin.payouts.len(),
            paid = spin.total_paid(),
            "Round settled"
        );

        self.emit(RoomEvent::Spin(spin.clone()));
        self.emit_state();
        Ok(spin)
    }

    fn show_result(&mut self) {
        self.phase = Phase::Result;
        self.countdown = self.config.result_ticks;
        self.emit_state();
    }

    fn start_betting(&mut self) {
        for player in self.players.values_mut() {
            player.bets.clear();
        }
        self.phase = Phase::Betting;
        self.countdown = self.config.betting_ticks;
        self.result = None;
        self.round += 1;

        info!(round = self.round, "Betting open");
        self.emit(RoomEvent::NewRound);
        self.emit_state();
    }
}
