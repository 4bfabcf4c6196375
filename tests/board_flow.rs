use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, SystemTime},
};

use bingo_back::{
    config::AppConfig,
    dao::{
        board_store::{BoardStore, memory::MemoryBoardStore},
        models::UserEntity,
    },
    dto::{auth::AuthRequest, live::BoardEvent},
    error::ServiceError,
    services::{auth_service, board_service, maintenance_service, provisioner},
    state::{AppState, SharedState},
};
use tokio::{sync::oneshot, time::timeout};
use uuid::Uuid;

async fn setup_with(config: AppConfig) -> (SharedState, MemoryBoardStore) {
    let state = AppState::new(config.clone());
    let store = MemoryBoardStore::new();
    provisioner::seed_phrase_pool(&store, config.phrases())
        .await
        .unwrap();
    state.install_board_store(Arc::new(store.clone())).await;
    (state, store)
}

async fn setup() -> (SharedState, MemoryBoardStore) {
    setup_with(AppConfig::in_memory()).await
}

async fn add_user(store: &MemoryBoardStore, username: &str) {
    store
        .create_user(UserEntity {
            username: username.into(),
            password_hash: "unused".into(),
            created_at: SystemTime::now(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn alice_plays_a_row_then_resets() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;

    let board = provisioner::provision(&state, "alice").await.unwrap();
    assert_eq!(board.cells.len(), 25);
    assert!(!board.has_bingo().unwrap());
    let positions = board.cells.iter().map(|cell| cell.position).collect::<Vec<_>>();
    assert_eq!(positions, (0..25).collect::<Vec<u8>>());

    let pool = state.config().phrases().to_vec();
    assert!(board.cells.iter().all(|cell| pool.contains(&cell.phrase)));

    let row = board.cells[0..5].iter().map(|cell| cell.id).collect::<Vec<_>>();
    for (index, id) in row.iter().enumerate() {
        let outcome = board_service::toggle(&state, "alice", *id).await.unwrap();
        assert_eq!(outcome.has_bingo, index == 4, "after toggling {} cells", index + 1);
    }

    let fresh = board_service::reset_board(&state, "alice").await.unwrap();
    assert!(!fresh.has_bingo);
    assert!(fresh.bingo_items.iter().all(|cell| !cell.checked));
    assert!(fresh.bingo_items.iter().all(|cell| !row.contains(&cell.id)));
}

#[tokio::test]
async fn ensure_keeps_an_existing_board() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;

    let first = provisioner::ensure(&state, "alice").await.unwrap();
    assert_eq!(first.cells.len(), 25);
    let second = provisioner::ensure(&state, "alice").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn provision_discards_the_previous_board() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;

    let first = provisioner::provision(&state, "alice").await.unwrap();
    let second = provisioner::provision(&state, "alice").await.unwrap();

    let old_ids = first.cells.iter().map(|cell| cell.id).collect::<HashSet<_>>();
    assert!(second.cells.iter().all(|cell| !old_ids.contains(&cell.id)));
    assert_eq!(store.list_cells("alice".into()).await.unwrap().len(), 25);

    let err = board_service::toggle(&state, "alice", first.cells[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn toggling_twice_restores_the_cell() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;
    let board = provisioner::provision(&state, "alice").await.unwrap();
    let target = board.cells[12].clone();

    let once = board_service::toggle(&state, "alice", target.id).await.unwrap();
    let flipped = once.board.cell(target.id).unwrap();
    assert!(flipped.checked);
    assert_eq!(flipped.phrase, target.phrase);
    assert_eq!(flipped.position, target.position);
    let others_unchanged = once
        .board
        .cells
        .iter()
        .filter(|cell| cell.id != target.id)
        .all(|cell| !cell.checked);
    assert!(others_unchanged);

    let twice = board_service::toggle(&state, "alice", target.id).await.unwrap();
    assert_eq!(twice.board, board);
}

#[tokio::test]
async fn toggling_someone_elses_cell_is_forbidden() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;
    add_user(&store, "bob").await;
    let bobs = provisioner::provision(&state, "bob").await.unwrap();
    provisioner::provision(&state, "alice").await.unwrap();

    let err = board_service::toggle(&state, "alice", bobs.cells[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert!(!store.find_cell(bobs.cells[0].id).await.unwrap().unwrap().checked);

    let err = board_service::toggle(&state, "alice", Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_toggles_end_in_the_parity_state() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;
    let board = provisioner::provision(&state, "alice").await.unwrap();
    let id = board.cells[7].id;

    for toggles in [8usize, 9] {
        let before = store.find_cell(id).await.unwrap().unwrap().checked;
        let tasks = (0..toggles)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move { board_service::toggle(&state, "alice", id).await })
            })
            .collect::<Vec<_>>();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let after = store.find_cell(id).await.unwrap().unwrap().checked;
        assert_eq!(after, before ^ (toggles % 2 == 1));
    }
}

#[tokio::test]
async fn viewers_receive_toggle_updates() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;
    let board = provisioner::provision(&state, "alice").await.unwrap();
    let mut viewer = state.hub().subscribe();

    let view = board_service::toggle_and_broadcast(&state, "alice", board.cells[3].id)
        .await
        .unwrap();

    match viewer.recv().await.unwrap() {
        BoardEvent::Updated(update) => {
            assert_eq!(update, view);
            assert_eq!(update.username, "alice");
            assert_eq!(update.bingo_items.len(), 25);
            assert!(update.bingo_items[3].checked);
            assert!(!update.has_bingo);
        }
        BoardEvent::Cleared => panic!("expected a board update"),
    }
}

#[tokio::test]
async fn plain_toggle_leaves_publishing_to_the_caller() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;
    let board = provisioner::provision(&state, "alice").await.unwrap();
    let mut viewer = state.hub().subscribe();

    let outcome = board_service::toggle(&state, "alice", board.cells[0].id)
        .await
        .unwrap();
    assert!(outcome.board.cells[0].checked);
    assert!(viewer.try_recv().is_err());

    board_service::toggle_and_broadcast(&state, "alice", board.cells[0].id)
        .await
        .unwrap();
    match viewer.try_recv().unwrap() {
        BoardEvent::Updated(update) => assert!(!update.bingo_items[0].checked),
        BoardEvent::Cleared => panic!("expected a board update"),
    }
}

#[tokio::test]
async fn failed_toggle_publishes_nothing() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;
    provisioner::provision(&state, "alice").await.unwrap();
    let mut viewer = state.hub().subscribe();

    assert!(
        board_service::toggle_and_broadcast(&state, "alice", Uuid::new_v4())
            .await
            .is_err()
    );
    assert!(viewer.try_recv().is_err());
}

#[tokio::test]
async fn list_boards_follows_signup_order() {
    let (state, store) = setup().await;
    for name in ["carol", "alice", "bob"] {
        add_user(&store, name).await;
        provisioner::provision(&state, name).await.unwrap();
    }

    let boards = board_service::list_boards(&state).await.unwrap();
    let names = boards.iter().map(|b| b.username.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["carol", "alice", "bob"]);
    for board in &boards {
        let positions = board.bingo_items.iter().map(|c| c.position).collect::<Vec<_>>();
        assert_eq!(positions, (0..25).collect::<Vec<u8>>());
    }
}

#[tokio::test]
async fn storage_outage_is_reported_as_unavailable() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;
    store.set_online(false);

    let err = provisioner::provision(&state, "alice").await.unwrap_err();
    assert!(matches!(err, ServiceError::Unavailable(_)));
}

#[tokio::test]
async fn missing_store_is_degraded() {
    let state = AppState::new(AppConfig::in_memory());
    let err = board_service::list_boards(&state).await.unwrap_err();
    assert!(matches!(err, ServiceError::Degraded));
}

#[tokio::test]
async fn small_pool_cannot_provision() {
    let config = AppConfig::in_memory().with_phrases((0..10).map(|i| format!("phrase {i}")));
    let (state, store) = setup_with(config).await;
    add_user(&store, "alice").await;

    let err = provisioner::provision(&state, "alice").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::PoolExhausted {
            available: 10,
            required: 25
        }
    ));
    assert!(store.list_cells("alice".into()).await.unwrap().is_empty());
}

#[tokio::test]
async fn signup_login_and_wrong_password() {
    let (state, _store) = setup().await;
    let credentials = |password: &str| AuthRequest {
        username: "alice".into(),
        password: password.into(),
    };

    let signup = auth_service::authenticate(&state, credentials("secret"))
        .await
        .unwrap();
    assert!(signup.created);
    let board = board_service::get_board(&state, "alice").await.unwrap();

    let login = auth_service::authenticate(&state, credentials("secret"))
        .await
        .unwrap();
    assert!(!login.created);
    assert_ne!(login.session.token, signup.session.token);
    assert_eq!(board_service::get_board(&state, "alice").await.unwrap(), board);

    let err = auth_service::authenticate(&state, credentials("nope"))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn maintenance_reset_clears_everything() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;
    provisioner::provision(&state, "alice").await.unwrap();
    let session = state.sessions().issue("alice");
    let mut viewer = state.hub().subscribe();

    let summary = maintenance_service::reset_all(&state).await.unwrap();
    assert_eq!(summary.sessions_revoked, 1);
    assert_eq!(summary.phrases, 30);

    assert!(state.sessions().resolve(&session.token).is_none());
    assert!(store.find_user("alice".into()).await.unwrap().is_none());
    assert!(board_service::list_boards(&state).await.unwrap().is_empty());
    assert_eq!(store.list_phrases().await.unwrap().len(), 30);
    assert!(matches!(viewer.recv().await.unwrap(), BoardEvent::Cleared));
}

#[tokio::test]
async fn maintenance_reset_keeps_board_gates_serializing() {
    let (state, store) = setup().await;
    add_user(&store, "alice").await;
    provisioner::provision(&state, "alice").await.unwrap();

    let (held_tx, held_rx) = oneshot::channel::<()>();
    let (release_tx, release_rx) = oneshot::channel::<()>();
    let holder = {
        let state = state.clone();
        tokio::spawn(async move {
            state
                .with_board_gate("alice", move || async move {
                    held_tx.send(()).unwrap();
                    release_rx.await.unwrap();
                })
                .await
        })
    };
    held_rx.await.unwrap();

    maintenance_service::reset_all(&state).await.unwrap();

    let mut follower = {
        let state = state.clone();
        tokio::spawn(async move { state.with_board_gate("alice", || async {}).await })
    };
    assert!(
        timeout(Duration::from_millis(50), &mut follower)
            .await
            .is_err(),
        "a mutation got past a gate held across the reset"
    );

    release_tx.send(()).unwrap();
    holder.await.unwrap();
    timeout(Duration::from_secs(1), follower)
        .await
        .unwrap()
        .unwrap();
}
