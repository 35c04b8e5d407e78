//! Whole-table scenarios driven through the public API.

use std::time::Duration;

use tokio::sync::broadcast;

use roulette_table::core::wheel::RED_NUMBERS;
use roulette_table::game::state::Phase;
use roulette_table::network::{spawn_table, TableSettings};
use roulette_table::{
    BetError, BetProposal, BetType, CommandReply, PlayerId, Room, RoomCommand, RoomEvent,
    ScriptedWheel, TableConfig,
};

/// Advance until the current betting phase settles.
fn settle(room: &mut Room, wheel: &mut ScriptedWheel) {
    assert_eq!(room.phase(), Phase::Betting);
    while room.phase() == Phase::Betting {
        room.advance(wheel).unwrap();
    }
}

/// Advance from spinning/result back into betting.
fn finish_round(room: &mut Room, wheel: &mut ScriptedWheel) {
    while room.phase() != Phase::Betting {
        room.advance(wheel).unwrap();
    }
}

#[test]
fn two_players_one_winner() {
    let mut room = Room::new(TableConfig::default());
    let mut wheel = ScriptedWheel::new([17]);
    let a = PlayerId::new([0xA; 16]);
    let b = PlayerId::new([0xB; 16]);
    room.add_player(a);
    room.add_player(b);

    let pre_bet = room.player(&a).unwrap().balance;
    room.place_bet(&a, &BetProposal::new(BetType::Straight, &[17], 50)).unwrap();
    assert_eq!(room.player(&a).unwrap().balance, pre_bet - 50);

    room.drain_events();
    settle(&mut room, &mut wheel);

    let spin = room
        .drain_events()
        .into_iter()
        .find_map(|e| match e {
            RoomEvent::Spin(result) => Some(result),
            _ => None,
        })
        .unwrap();

    assert_eq!(spin.winning_number, 17);
    assert_eq!(spin.payouts.len(), 1);
    assert_eq!(spin.payouts.get(&a), Some(&1800));
    assert!(!spin.payouts.contains_key(&b));

    assert_eq!(room.player(&a).unwrap().balance, pre_bet - 50 + 1800);
    assert_eq!(room.player(&b).unwrap().balance, 1000);
    assert_eq!(room.history(), vec![17]);
}

#[test]
fn straight_and_red_on_a_red_winner() {
    let mut room = Room::default();
    let mut wheel = ScriptedWheel::new([3]);
    let id = PlayerId::new([1; 16]);
    room.add_player(id);

    room.place_bet(&id, &BetProposal::new(BetType::Straight, &[3], 10)).unwrap();
    room.place_bet(&id, &BetProposal::new(BetType::Red, &RED_NUMBERS, 10)).unwrap();
    room.place_bet(&id, &BetProposal::new(BetType::Dozen, &(13..=24).collect::<Vec<_>>(), 10))
        .unwrap();
    settle(&mut room, &mut wheel);

    // Straight returns 360, red returns 20, the dozen misses.
    assert_eq!(room.player(&id).unwrap().balance, 1000 - 30 + 380);
}

#[test]
fn leaving_during_betting_refunds_stakes() {
    let mut room = Room::default();
    let leaver = PlayerId::new([1; 16]);
    let stayer = PlayerId::new([2; 16]);
    room.add_player(leaver);
    room.add_player(stayer);

    room.place_bet(&leaver, &BetProposal::new(BetType::Straight, &[0], 15)).unwrap();
    room.place_bet(&leaver, &BetProposal::new(BetType::Split, &[1, 2], 25)).unwrap();
    assert_eq!(room.chips_in_play(), 2000);

    let removed = room.remove_player(&leaver).unwrap();
    assert_eq!(removed.balance, 1000);
    assert!(removed.bets.is_empty());
    assert!(room.player(&leaver).is_none());
    assert_eq!(room.chips_in_play(), 1000);
}

#[test]
fn history_keeps_the_last_ten_spins() {
    let mut room = Room::default();
    let mut wheel = ScriptedWheel::new((0..15).map(|n| n * 2));

    for _ in 0..15 {
        settle(&mut room, &mut wheel);
        finish_round(&mut room, &mut wheel);
    }

    let history = room.history();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0], 28);
    assert_eq!(room.round(), 16);
}

#[test]
fn bets_are_refused_outside_betting() {
    let mut room = Room::default();
    let mut wheel = ScriptedWheel::new([8]);
    let id = PlayerId::new([1; 16]);
    room.add_player(id);
    let bet = room.place_bet(&id, &BetProposal::new(BetType::Black, &[], 10));
    assert!(bet.is_err(), "even-money bets must list their numbers");

    let bet = room
        .place_bet(&id, &BetProposal::new(BetType::Even, &roulette_table::core::wheel::even(), 10))
        .unwrap();
    settle(&mut room, &mut wheel);

    let proposal = BetProposal::new(BetType::Straight, &[8], 10);
    assert_eq!(room.place_bet(&id, &proposal), Err(BetError::BettingClosed));
    assert_eq!(room.remove_bet(&id, &bet.id), Err(BetError::BettingClosed));
    assert!(room.clear_bets(&id).is_empty());

    finish_round(&mut room, &mut wheel);
    assert!(room.place_bet(&id, &proposal).is_ok());
}

#[tokio::test(start_paused = true)]
async fn table_actor_runs_rounds_on_the_clock() {
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let settings = TableSettings {
        table: TableConfig {
            betting_ticks: 3,
            spinning_ticks: 1,
            result_ticks: 1,
            ..TableConfig::default()
        },
        tick_interval: Duration::from_millis(500),
        ..TableSettings::default()
    };
    let (table, task) = spawn_table(settings, ScriptedWheel::new([17, 4]), shutdown_rx);
    let mut events = table.subscribe();

    let id = PlayerId::new([7; 16]);
    table.send(RoomCommand::Join { player_id: id }).await.unwrap();
    let reply = table
        .send(RoomCommand::PlaceBet {
            player_id: id,
            proposal: BetProposal::new(BetType::Straight, &[17], 10),
        })
        .await
        .unwrap();
    assert!(matches!(reply, CommandReply::BetPlaced(_)));

    let mut spins = Vec::new();
    let mut new_rounds = 0;
    while spins.len() < 2 {
        match events.recv().await.unwrap() {
            RoomEvent::Spin(result) => spins.push(result.winning_number),
            RoomEvent::NewRound => new_rounds += 1,
            _ => {}
        }
    }
    assert_eq!(spins, vec![17, 4]);
    assert_eq!(new_rounds, 1);

    let snapshot = table.snapshot().await.unwrap();
    assert_eq!(snapshot.history, vec![4, 17]);
    assert_eq!(snapshot.players[0].balance, 990 + 360);

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
}
