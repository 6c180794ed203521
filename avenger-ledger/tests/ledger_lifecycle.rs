use avenger_ledger::{LedgerStore, PointsLedger, UserId, rank_of, top_n};

#[tokio::test]
async fn add_then_rank_reflects_new_balance() {
    let dir = tempfile::tempdir().unwrap();
    let store = LedgerStore::open(dir.path().join("points.json"));
    let user = UserId::from("123456789012345678");

    for amount in [1, 15, 250] {
        let before = store.read(|l| rank_of(l, &user)).await.balance;
        store.add(&user, amount).await;
        let after = store.read(|l| rank_of(l, &user)).await.balance;
        assert_eq!(after, before + amount);
    }
}

#[tokio::test]
async fn removal_never_goes_negative() {
    let store = LedgerStore::with_ledger("unused.json", PointsLedger::new());
    let user = UserId::from("U1");
    store.add(&user, 20).await;

    for amount in [5, 10, 30, 1] {
        let previous = store.balance(&user).await;
        let next = store.remove(&user, amount).await;
        assert_eq!(next, (previous - amount).max(0));
        assert!(next >= 0);
    }
}

#[tokio::test]
async fn flush_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.json");

    let store = LedgerStore::open(&path);
    store.add(&UserId::from("111"), 50).await;
    store.add(&UserId::from("222"), 50).await;
    store.add(&UserId::from("333"), 10).await;
    store.remove(&UserId::from("444"), 10).await;
    store.flush().await.unwrap();

    let reloaded = LedgerStore::load(&path);
    assert_eq!(reloaded, store.snapshot().await);
    assert_eq!(reloaded.len(), 4);
}

#[tokio::test]
async fn restart_preserves_rankings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.json");

    {
        let store = LedgerStore::open(&path);
        store.add(&UserId::from("A"), 50).await;
        store.add(&UserId::from("B"), 50).await;
        store.add(&UserId::from("C"), 10).await;
        store.flush().await.unwrap();
    }

    let store = LedgerStore::open(&path);
    let top = store.read(|l| top_n(l, 2)).await;
    let ids: Vec<&str> = top.iter().map(|e| e.user_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
    assert_eq!(store.read(|l| rank_of(l, &UserId::from("C"))).await.position, 3);
}

#[tokio::test]
async fn unflushed_changes_are_not_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.json");

    let store = LedgerStore::open(&path);
    store.add(&UserId::from("A"), 1).await;
    store.flush().await.unwrap();
    store.add(&UserId::from("A"), 1).await;

    assert_eq!(LedgerStore::load(&path).balance(&UserId::from("A")), 1);
}

#[tokio::test]
async fn concurrent_mutations_and_flushes_are_consistent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("points.json");
    let store = std::sync::Arc::new(LedgerStore::open(&path));
    let user = UserId::from("U1");

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = std::sync::Arc::clone(&store);
        let user = user.clone();
        handles.push(tokio::spawn(async move {
            store.add(&user, 1).await;
            if i % 5 == 0 {
                let _ = store.flush().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    store.flush().await.unwrap();

    assert_eq!(store.balance(&user).await, 20);
    assert_eq!(LedgerStore::load(&path).balance(&user), 20);
}
