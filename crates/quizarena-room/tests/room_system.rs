//! Integration tests for the room system: real room actors driven through
//! the registry, with time paused.

use std::sync::Arc;
use std::time::Duration;

use quizarena_protocol::{
    BotDifficulty, GameMode, Outcome, PlayerId, RoomId, RoomOptions, ServerEvent,
};
use quizarena_room::{
    MatchQueue, MemoryLeaderboard, Phase, ProviderError, QueueStatus, Question,
    QuestionProvider, QueuedPlayer, RoomError, RoomRegistry,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

// =========================================================================
// Fixtures
// =========================================================================

/// Serves the same questions to every room.
struct FixedQuestions(Vec<Question>);

impl QuestionProvider for FixedQuestions {
    async fn fetch(
        &self,
        _categories: &[String],
        count: usize,
    ) -> Result<Vec<Question>, ProviderError> {
        Ok(self.0.iter().take(count).cloned().collect())
    }
}

/// Takes `delay` to answer every fetch.
struct SlowQuestions {
    delay: Duration,
    questions: Vec<Question>,
}

impl QuestionProvider for SlowQuestions {
    async fn fetch(
        &self,
        _categories: &[String],
        count: usize,
    ) -> Result<Vec<Question>, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.questions.iter().take(count).cloned().collect())
    }
}

fn question(n: u64) -> Question {
    Question {
        id: n,
        prompt: format!("What is {n} + {n}?"),
        correct_answer: (n * 2).to_string(),
        incorrect_answers: [
            (n * 2 + 1).to_string(),
            (n * 2 + 2).to_string(),
            (n * 2 + 3).to_string(),
        ],
        category: "math".into(),
    }
}

fn registry(count: u64) -> RoomRegistry<FixedQuestions> {
    RoomRegistry::new(Arc::new(FixedQuestions((1..=count).map(question).collect())))
}

type Inbox = mpsc::UnboundedReceiver<ServerEvent>;

fn inbox() -> (mpsc::UnboundedSender<ServerEvent>, Inbox) {
    mpsc::unbounded_channel()
}

fn pid(id: u64) -> PlayerId {
    PlayerId(id)
}

/// Receives until `pick` accepts an event, skipping the rest.
async fn next_matching<T>(rx: &mut Inbox, mut pick: impl FnMut(ServerEvent) -> Option<T>) -> T {
    loop {
        let event = rx.recv().await.expect("room hung up");
        if let Some(found) = pick(event) {
            return found;
        }
    }
}

fn options(mode: GameMode) -> RoomOptions {
    RoomOptions {
        mode: Some(mode),
        total_questions: Some(5),
        ..RoomOptions::default()
    }
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_create_room_greets_host_with_code_in_range() {
    let reg = registry(5);
    let (tx, mut rx) = inbox();

    let room_id = reg
        .create_room(pid(1), "ana", &RoomOptions::default(), tx)
        .unwrap();

    assert!((RoomId::MIN..=RoomId::MAX).contains(&room_id.0));
    assert_eq!(reg.player_room(pid(1)), Some(room_id));
    match rx.recv().await.unwrap() {
        ServerEvent::RoomCreated {
            room_id: created,
            host_id,
            participants,
            ..
        } => {
            assert_eq!(created, room_id);
            assert_eq!(host_id, pid(1));
            assert_eq!(participants.len(), 1);
        }
        other => panic!("expected room_created, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_create_room_twice_rejected() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx.clone()).unwrap();

    let result = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx);
    assert!(matches!(result, Err(RoomError::AlreadyInRoom(_, rid)) if rid == room_id));
    assert_eq!(reg.room_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_join_room_notifies_existing_members() {
    let reg = registry(5);
    let (host_tx, mut host_rx) = inbox();
    let (bob_tx, mut bob_rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &RoomOptions::default(), host_tx).unwrap();

    reg.join_room(room_id, pid(2), "bob", bob_tx).await.unwrap();

    let joined = next_matching(&mut host_rx, |e| match e {
        ServerEvent::ParticipantJoined { participant } => Some(participant),
        _ => None,
    })
    .await;
    assert_eq!(joined.player_id, pid(2));
    assert_eq!(joined.name, "bob");
    assert!(matches!(bob_rx.recv().await.unwrap(), ServerEvent::RoomJoined { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_join_room_not_found() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let result = reg.join_room(RoomId(123_456), pid(1), "ana", tx).await;
    assert!(matches!(result, Err(RoomError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_join_room_one_room_at_a_time() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let first = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx.clone()).unwrap();
    let second = reg.create_room(pid(2), "bob", &RoomOptions::default(), tx.clone()).unwrap();

    let result = reg.join_room(second, pid(1), "ana", tx).await;
    assert!(matches!(result, Err(RoomError::AlreadyInRoom(_, rid)) if rid == first));
}

#[tokio::test(start_paused = true)]
async fn test_join_room_full() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let room_id = reg
        .create_room(pid(1), "ana", &options(GameMode::HeadToHead), tx.clone())
        .unwrap();
    reg.join_room(room_id, pid(2), "bob", tx.clone()).await.unwrap();

    let result = reg.join_room(room_id, pid(3), "cy", tx).await;
    assert!(matches!(result, Err(RoomError::RoomFull(_))));
    assert_eq!(reg.player_room(pid(3)), None);
}

#[tokio::test(start_paused = true)]
async fn test_host_leaving_lobby_hands_over_and_frees_seat() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let (bob_tx, mut bob_rx) = inbox();
    let room_id = reg
        .create_room(
            pid(1),
            "ana",
            &RoomOptions {
                max_participants: Some(3),
                ..RoomOptions::default()
            },
            tx.clone(),
        )
        .unwrap();
    reg.join_room(room_id, pid(2), "bob", bob_tx).await.unwrap();
    reg.join_room(room_id, pid(3), "cy", tx.clone()).await.unwrap();

    assert_eq!(reg.leave_room(pid(1)).await.unwrap(), room_id);

    let new_host = next_matching(&mut bob_rx, |e| match e {
        ServerEvent::HostChanged { host_id } => Some(host_id),
        _ => None,
    })
    .await;
    assert_eq!(new_host, pid(2));
    reg.join_room(room_id, pid(4), "dee", tx).await.unwrap();

    let info = reg.handle_for(pid(2), room_id).unwrap().get_info().await.unwrap();
    assert_eq!(info.host_id, pid(2));
    assert_eq!(info.participant_count, 3);
}

#[tokio::test(start_paused = true)]
async fn test_last_player_leaving_destroys_room() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx).unwrap();

    reg.leave_room(pid(1)).await.unwrap();

    assert_eq!(reg.room_count(), 0);
    assert!(matches!(reg.handle_for(pid(1), room_id), Err(RoomError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_leave_room_not_in_any_room() {
    let reg = registry(5);
    assert!(matches!(
        reg.leave_room(pid(9)).await,
        Err(RoomError::InvalidState(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_handle_for_requires_membership() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx).unwrap();

    assert!(reg.handle_for(pid(1), room_id).is_ok());
    assert!(matches!(
        reg.handle_for(pid(2), room_id),
        Err(RoomError::NotInRoom(_, _))
    ));
}

#[tokio::test(start_paused = true)]
async fn test_configure_by_guest_rejected() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx.clone()).unwrap();
    reg.join_room(room_id, pid(2), "bob", tx).await.unwrap();

    let handle = reg.handle_for(pid(2), room_id).unwrap();
    let result = handle.configure(pid(2), options(GameMode::Solo)).await;
    assert!(matches!(result, Err(RoomError::NotHost(_))));
}

#[tokio::test(start_paused = true)]
async fn test_list_rooms_skips_started_rooms() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let open = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx.clone()).unwrap();
    let solo = reg.create_room(pid(2), "bob", &options(GameMode::Solo), tx).unwrap();
    reg.handle_for(pid(2), solo).unwrap().start(pid(2)).await.unwrap();

    let rooms = reg.list_rooms().await;
    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].room_id, open);
    assert_eq!(rooms[0].host_name, "ana");
    assert_eq!(rooms[0].participant_count, 1);
}

// =========================================================================
// Starting
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_without_questions_keeps_room_waiting() {
    let reg = registry(0);
    let (tx, _rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &options(GameMode::Solo), tx).unwrap();
    let handle = reg.handle_for(pid(1), room_id).unwrap();

    assert!(matches!(handle.start(pid(1)).await, Err(RoomError::NoQuestions)));
    assert_eq!(handle.get_info().await.unwrap().phase, Phase::Waiting);
}

#[tokio::test(start_paused = true)]
async fn test_start_alone_in_multiplayer_rejected() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx).unwrap();
    let handle = reg.handle_for(pid(1), room_id).unwrap();

    assert!(matches!(handle.start(pid(1)).await, Err(RoomError::InvalidState(_))));
}

#[tokio::test(start_paused = true)]
async fn test_cannot_join_after_game_started() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx.clone()).unwrap();
    reg.join_room(room_id, pid(2), "bob", tx.clone()).await.unwrap();
    reg.handle_for(pid(1), room_id).unwrap().start(pid(1)).await.unwrap();

    let result = reg.join_room(room_id, pid(3), "cy", tx).await;
    assert!(matches!(result, Err(RoomError::AlreadyStarted(_))));
}

// =========================================================================
// Playing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_unanswered_question_revealed_at_deadline() {
    let reg = registry(5);
    let (host_tx, _host_rx) = inbox();
    let (bob_tx, mut bob_rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &options(GameMode::Multiplayer), host_tx).unwrap();
    reg.join_room(room_id, pid(2), "bob", bob_tx).await.unwrap();
    let handle = reg.handle_for(pid(2), room_id).unwrap();

    let started = Instant::now();
    handle.start(pid(1)).await.unwrap();
    let view = next_matching(&mut bob_rx, |e| match e {
        ServerEvent::NewQuestion(view) => Some(view),
        _ => None,
    })
    .await;
    assert_eq!(view.question_index, 0);
    assert_eq!(view.duration_secs, 15);

    tokio::time::sleep(Duration::from_secs(3)).await;
    handle.submit(pid(2), Some(0), "2".into()).await.unwrap();

    let (correct, points) = next_matching(&mut bob_rx, |e| match e {
        ServerEvent::AnswerResult { correct, points, .. } => Some((correct, points)),
        _ => None,
    })
    .await;
    let waited = started.elapsed();
    assert!(correct);
    assert_eq!(points, 82);
    assert!(waited >= Duration::from_secs(15), "revealed early at {waited:?}");
    assert!(waited < Duration::from_millis(15_100), "revealed late at {waited:?}");

    let results = next_matching(&mut bob_rx, |e| match e {
        ServerEvent::QuestionResult { results, next_in_secs, .. } => {
            assert_eq!(next_in_secs, 5);
            Some(results)
        }
        _ => None,
    })
    .await;
    let host = results.iter().find(|r| r.player_id == pid(1)).unwrap();
    assert_eq!(host.answer, None);
    assert_eq!(host.points, 0);
}

#[tokio::test(start_paused = true)]
async fn test_solo_answer_reveals_immediately() {
    let reg = registry(5);
    let (tx, mut rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &options(GameMode::Solo), tx).unwrap();
    let handle = reg.handle_for(pid(1), room_id).unwrap();
    handle.start(pid(1)).await.unwrap();

    let started = Instant::now();
    handle.submit(pid(1), Some(0), "3".into()).await.unwrap();

    let correct = next_matching(&mut rx, |e| match e {
        ServerEvent::AnswerResult { correct, .. } => Some(correct),
        _ => None,
    })
    .await;
    assert!(!correct);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_bot_game_plays_to_game_over_and_records_human() {
    let leaderboard = Arc::new(MemoryLeaderboard::default());
    let reg = registry(5).with_recorder(leaderboard.clone());
    let (tx, mut rx) = inbox();
    let room_id = reg
        .create_room(
            pid(1),
            "ana",
            &RoomOptions {
                bot_count: Some(1),
                bot_difficulty: Some(BotDifficulty::Hard),
                ..options(GameMode::HeadToHead)
            },
            tx,
        )
        .unwrap();
    reg.handle_for(pid(1), room_id).unwrap().start(pid(1)).await.unwrap();

    let (standings, outcome) = next_matching(&mut rx, |e| match e {
        ServerEvent::GameOver { standings, outcome } => Some((standings, outcome)),
        _ => None,
    })
    .await;

    assert_eq!(standings.len(), 2);
    assert!(standings.iter().any(|s| s.is_bot));
    let human = standings.iter().find(|s| s.player_id == pid(1)).unwrap();
    assert_eq!(human.score, 0);
    assert!(!matches!(outcome, Outcome::NoParticipants));

    let records = leaderboard.top(10);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "ana");
    assert_eq!(records[0].mode, GameMode::HeadToHead);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_mid_game_ends_head_to_head() {
    let reg = registry(5);
    let (host_tx, mut host_rx) = inbox();
    let (bob_tx, _bob_rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &options(GameMode::HeadToHead), host_tx).unwrap();
    reg.join_room(room_id, pid(2), "bob", bob_tx).await.unwrap();
    reg.handle_for(pid(1), room_id).unwrap().start(pid(1)).await.unwrap();

    assert_eq!(reg.disconnect(pid(2)).await, Some(room_id));

    let outcome = next_matching(&mut host_rx, |e| match e {
        ServerEvent::GameOver { outcome, .. } => Some(outcome),
        _ => None,
    })
    .await;
    assert!(matches!(outcome, Outcome::CompleteDraw { score: 0 }));
    assert_eq!(reg.player_room(pid(2)), None);
    assert_eq!(reg.room_count(), 1);
}

// =========================================================================
// Housekeeping
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_reap_finished_removes_rooms_after_retention() {
    let reg = registry(5);
    let (host_tx, mut host_rx) = inbox();
    let (bob_tx, _bob_rx) = inbox();
    let (idle_tx, _idle_rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &options(GameMode::HeadToHead), host_tx).unwrap();
    reg.join_room(room_id, pid(2), "bob", bob_tx).await.unwrap();
    let lobby = reg.create_room(pid(3), "cy", &RoomOptions::default(), idle_tx).unwrap();
    reg.handle_for(pid(1), room_id).unwrap().start(pid(1)).await.unwrap();
    reg.leave_room(pid(2)).await.unwrap();
    next_matching(&mut host_rx, |e| matches!(e, ServerEvent::GameOver { .. }).then_some(())).await;

    assert_eq!(reg.reap_finished(Duration::from_secs(60)).await, 0);

    tokio::time::advance(Duration::from_secs(61)).await;
    assert_eq!(reg.reap_finished(Duration::from_secs(60)).await, 1);
    assert_eq!(reg.room_ids(), vec![lobby]);
    assert_eq!(reg.player_room(pid(1)), None);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_room_clears_players() {
    let reg = registry(5);
    let (tx, _rx) = inbox();
    let room_id = reg.create_room(pid(1), "ana", &RoomOptions::default(), tx.clone()).unwrap();
    reg.join_room(room_id, pid(2), "bob", tx).await.unwrap();

    reg.destroy_room(room_id).await.unwrap();

    assert_eq!(reg.room_count(), 0);
    assert_eq!(reg.player_room(pid(1)), None);
    assert_eq!(reg.player_room(pid(2)), None);
    assert!(matches!(reg.destroy_room(room_id).await, Err(RoomError::NotFound(_))));
}

#[tokio::test(start_paused = true)]
async fn test_slow_question_fetch_does_not_block_other_rooms() {
    let reg = RoomRegistry::new(Arc::new(SlowQuestions {
        delay: Duration::from_secs(30),
        questions: (1..=5).map(question).collect(),
    }));
    let (ana_tx, mut ana_rx) = inbox();
    let slow_room = reg.create_room(pid(1), "ana", &options(GameMode::Solo), ana_tx).unwrap();
    let slow = reg.handle_for(pid(1), slow_room).unwrap();
    let starting = tokio::spawn(async move { slow.start(pid(1)).await });
    // Lets the slow room get stuck in its fetch.
    tokio::time::sleep(Duration::from_secs(1)).await;

    let began = Instant::now();
    let (listed, other_room) = tokio::join!(reg.list_rooms(), async {
        let (cy_tx, _cy_rx) = inbox();
        let (dee_tx, _dee_rx) = inbox();
        let room_id = reg
            .create_room(pid(3), "cy", &options(GameMode::Multiplayer), cy_tx)
            .unwrap();
        reg.join_room(room_id, pid(4), "dee", dee_tx).await.unwrap();
        (room_id, began.elapsed())
    });
    let (other_room, other_took) = other_room;

    assert!(other_took < Duration::from_secs(1), "other room waited {other_took:?}");
    assert!(began.elapsed() <= Duration::from_secs(2), "listing waited {:?}", began.elapsed());
    assert!(listed.iter().all(|r| r.room_id != slow_room));

    // Busy is not dead: the reaper keeps both rooms.
    assert_eq!(reg.reap_finished(Duration::from_secs(60)).await, 0);
    assert_eq!(reg.room_count(), 2);
    assert_eq!(reg.player_room(pid(4)), Some(other_room));

    starting.await.unwrap().unwrap();
    next_matching(&mut ana_rx, |e| matches!(e, ServerEvent::NewQuestion(_)).then_some(())).await;
}

// =========================================================================
// Matchmaking
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_matched_pair_gets_head_to_head_room() {
    let reg = registry(5);
    let queue = MatchQueue::new();
    let (ana_tx, mut ana_rx) = inbox();
    let (bob_tx, mut bob_rx) = inbox();

    assert!(matches!(
        queue.enqueue(QueuedPlayer {
            player_id: pid(1),
            name: "ana".into(),
            sender: ana_tx,
        }),
        QueueStatus::Queued { position: 1 }
    ));
    let QueueStatus::Matched(first, second) = queue.enqueue(QueuedPlayer {
        player_id: pid(2),
        name: "bob".into(),
        sender: bob_tx,
    }) else {
        panic!("expected a match");
    };

    let room_id = reg.create_match(first, second).await.unwrap();

    let settings = next_matching(&mut ana_rx, |e| match e {
        ServerEvent::RoomCreated { settings, .. } => Some(settings),
        _ => None,
    })
    .await;
    assert_eq!(settings.mode, GameMode::HeadToHead);
    assert!(matches!(bob_rx.recv().await.unwrap(), ServerEvent::RoomJoined { .. }));
    assert_eq!(reg.player_room(pid(1)), Some(room_id));
    assert_eq!(reg.player_room(pid(2)), Some(room_id));
    assert!(queue.is_empty());
}
