#![cfg(test)]
use crate::testing::*;
use crate::*;
use futures::future::join_all;
use std::{sync::Arc, time::Duration};
use tokio::sync::Notify;

const KEYWORDS: &[&str] = &["SELECT", "FROM", "WHERE"];
const SHOP: &[&str] = &["orders", "order_items"];

/// An engine whose keyword vocabulary is exactly what the source advertises.
fn engine<S: MetadataSource>() -> CompletionEngine<S> {
    common_init();
    CompletionEngine::new(EngineOptions {
        standard_keywords: false,
        ..EngineOptions::default()
    })
}

async fn connected(source: ScriptedSource) -> CompletionEngine<ScriptedSource> {
    let engine = engine();
    engine.on_connect(source).await.expect("initial build");
    engine
}

async fn refreshed(engine: &CompletionEngine<impl MetadataSource>) -> RefreshOutcome {
    engine
        .notify_schema_may_have_changed()
        .expect("connected engine refreshes")
        .await
        .expect("refresh task")
}

mod before_connect {
    use super::*;

    #[test]
    fn completion_is_not_ready() {
        let engine = engine::<ScriptedSource>();
        assert_eq!(engine.state(), RefreshState::Stale);
        assert!(!engine.is_connected());
        assert!(matches!(engine.complete("SEL", 3), Err(Error::NotReady)));
        assert!(engine.completion("SEL", 3).is_empty());
        assert!(engine.candidates().is_none());
    }

    #[test]
    fn invalid_cursor_is_reported_before_readiness() {
        let engine = engine::<ScriptedSource>();
        assert!(matches!(
            engine.complete("SEL", 4),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn refresh_request_is_ignored() {
        let engine = engine::<ScriptedSource>();
        assert!(engine.notify_schema_may_have_changed().is_none());
    }
}

mod connect {
    use super::*;

    #[rstest]
    #[case("SELECT * FROM ord", 17, &["order_items", "orders"])]
    #[case("SEL", 3, &["SELECT"])]
    #[case("sel", 3, &["SELECT"])]
    #[case("  ", 2, &["FROM", "order_items", "orders", "SELECT", "WHERE"])]
    #[case("SELECT * FROM orders WHERE x", 28, &[])]
    #[tokio::test]
    async fn serves_keywords_and_schema_names(
        #[case] buffer: &str,
        #[case] cursor: usize,
        #[case] expected: &[&str],
    ) {
        let source = ScriptedSource::new().with_keywords(KEYWORDS).then_names(SHOP);
        let engine = connected(source).await;
        assert_eq!(engine.state(), RefreshState::Fresh);
        assert_eq!(engine.complete(buffer, cursor).expect("ready"), expected);
    }

    #[tokio::test]
    async fn standard_vocabulary_is_included_by_default() {
        common_init();
        let engine = CompletionEngine::default();
        engine
            .on_connect(ScriptedSource::new().then_names(SHOP))
            .await
            .expect("initial build");

        let completions = engine.complete("SELECT group_c", 14).expect("ready");
        assert!(completions.contains(&"GROUP_CONCAT".to_string()));
        assert!(engine.complete("SEL", 3).expect("ready").contains(&"SELECT".to_string()));
    }

    #[tokio::test]
    async fn initial_failure_leaves_engine_stale() {
        let engine = engine();
        let source = ScriptedSource::new().then_fail().then_names(SHOP);

        let result = engine.on_connect(source).await;
        assert!(
            matches!(result, Err(Error::Metadata(MetadataError::Closed))),
            "{result:?}"
        );
        assert_eq!(engine.state(), RefreshState::Stale);
        assert!(engine.is_connected());
        assert!(matches!(engine.complete("ord", 3), Err(Error::NotReady)));
        assert!(engine.completion("ord", 3).is_empty());

        // A later successful refresh on the same connection recovers.
        assert_eq!(refreshed(&engine).await, RefreshOutcome::Published);
        assert_eq!(engine.state(), RefreshState::Fresh);
        assert_eq!(engine.complete("ord", 3).expect("ready"), ["order_items", "orders"]);
    }

    #[tokio::test]
    async fn slow_fetch_times_out() {
        common_init();
        let engine = CompletionEngine::new(EngineOptions {
            fetch_timeout: Duration::from_millis(20),
            standard_keywords: false,
            ..EngineOptions::default()
        });

        let result = engine.on_connect(ScriptedSource::new().then_hang()).await;
        assert!(
            matches!(result, Err(Error::Metadata(MetadataError::Timeout(_)))),
            "{result:?}"
        );
        assert_eq!(engine.state(), RefreshState::Stale);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    #[tokio::test]
    async fn unanswered_keyword_query_does_not_block_connect(#[case] standard_keywords: bool) {
        common_init();
        let engine = CompletionEngine::new(EngineOptions {
            fetch_timeout: Duration::from_millis(20),
            standard_keywords,
            ..EngineOptions::default()
        });
        let source = ScriptedSource::new()
            .with_keywords(KEYWORDS)
            .with_hanging_keywords()
            .then_names(SHOP);

        tokio::time::timeout(Duration::from_secs(2), engine.on_connect(source))
            .await
            .expect("connect is bounded by the fetch timeout")
            .expect("schema names still load");
        assert_eq!(engine.state(), RefreshState::Fresh);
        assert_eq!(engine.complete("order_", 6).expect("ready"), ["order_items"]);
        assert_eq!(
            engine.complete("SEL", 3).expect("ready").is_empty(),
            !standard_keywords
        );
    }

    #[tokio::test]
    async fn invalid_cursor_degrades_to_no_completions() {
        let engine = connected(ScriptedSource::new().then_names(SHOP)).await;
        assert!(matches!(
            engine.complete("SEL", 9),
            Err(Error::InvalidArgument(_))
        ));
        assert!(engine.completion("SEL", 9).is_empty());
        // "ö" spans bytes 2..4
        assert!(matches!(
            engine.complete("größe", 3),
            Err(Error::InvalidArgument(_))
        ));
    }
}

mod refresh {
    use super::*;

    #[tokio::test]
    async fn new_table_becomes_completable() {
        let mut db = Database::new("shop");
        db.insert_table("public", Table::new_with("orders", ["id"]));
        let source = Arc::new(InMemorySource::new(db));
        let engine = engine();
        engine
            .on_connect(Arc::clone(&source))
            .await
            .expect("initial build");
        assert!(engine.complete("cust", 4).expect("ready").is_empty());

        source
            .insert_table("public", Table::new_with("customers", ["customer_name"]))
            .await;
        assert_eq!(refreshed(&engine).await, RefreshOutcome::Published);

        assert_eq!(
            engine.complete("cust", 4).expect("ready"),
            ["customer_name", "customers"]
        );
    }

    #[tokio::test]
    async fn dropped_table_disappears() {
        let source = ScriptedSource::new()
            .then_names(SHOP)
            .then_names(&["order_items"]);
        let engine = connected(source).await;

        assert_eq!(refreshed(&engine).await, RefreshOutcome::Published);
        assert_eq!(engine.complete("ord", 3).expect("ready"), ["order_items"]);
    }

    #[tokio::test]
    async fn failure_keeps_previous_candidates() {
        let source = ScriptedSource::new()
            .with_keywords(KEYWORDS)
            .then_names(SHOP)
            .then_fail();
        let engine = connected(source).await;
        let before = engine.candidates().expect("published");

        assert_eq!(refreshed(&engine).await, RefreshOutcome::Failed);
        assert_eq!(engine.state(), RefreshState::Fresh);
        let after = engine.candidates().expect("still published");
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(engine.complete("ord", 3).expect("ready"), ["order_items", "orders"]);
    }

    #[tokio::test]
    async fn keywords_are_shared_across_refreshes() {
        let source = ScriptedSource::new()
            .with_keywords(KEYWORDS)
            .then_names(SHOP)
            .then_names(&["customers"]);
        let engine = connected(source).await;
        let before = engine.candidates().expect("published");

        assert_eq!(refreshed(&engine).await, RefreshOutcome::Published);
        let after = engine.candidates().expect("published");
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(std::ptr::eq(before.keywords(), after.keywords()));
        // The old snapshot is untouched by the swap.
        assert_eq!(before.schema_only().collect::<Vec<_>>(), ["order_items", "orders"]);
        assert_eq!(after.schema_only().collect::<Vec<_>>(), ["customers"]);
    }

    #[tokio::test]
    async fn older_fetch_finishing_last_is_discarded() {
        let slow = Arc::new(Notify::new());
        let source = ScriptedSource::new()
            .then_names(SHOP)
            .then_gated(Arc::clone(&slow), &["stale_table"])
            .then_names(&["fresh_table"]);
        let engine = connected(source.clone()).await;

        let older = engine
            .notify_schema_may_have_changed()
            .expect("connected");
        source.started(2).await;
        let newer = engine
            .notify_schema_may_have_changed()
            .expect("connected");
        assert_eq!(newer.await.expect("refresh task"), RefreshOutcome::Published);

        slow.notify_one();
        assert_eq!(older.await.expect("refresh task"), RefreshOutcome::Superseded);
        assert_eq!(engine.complete("", 0).expect("ready"), ["fresh_table"]);
    }

    #[tokio::test]
    async fn older_fetch_still_publishes_when_newer_one_failed() {
        let slow = Arc::new(Notify::new());
        let source = ScriptedSource::new()
            .then_names(SHOP)
            .then_gated(Arc::clone(&slow), &["late_table"])
            .then_fail();
        let engine = connected(source.clone()).await;

        let older = engine
            .notify_schema_may_have_changed()
            .expect("connected");
        source.started(2).await;
        assert_eq!(refreshed(&engine).await, RefreshOutcome::Failed);

        slow.notify_one();
        assert_eq!(older.await.expect("refresh task"), RefreshOutcome::Published);
        assert_eq!(engine.complete("", 0).expect("ready"), ["late_table"]);
    }

    #[test]
    fn refresh_outside_runtime_is_skipped() {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        let engine = engine();
        runtime
            .block_on(engine.on_connect(ScriptedSource::new().then_names(SHOP)))
            .expect("initial build");

        assert!(engine.notify_schema_may_have_changed().is_none());
        assert_eq!(engine.complete("ord", 3).expect("ready"), ["order_items", "orders"]);
    }
}

mod disconnect {
    use super::*;

    #[tokio::test]
    async fn discards_candidates() {
        let engine = connected(ScriptedSource::new().then_names(SHOP)).await;
        engine.on_disconnect();

        assert_eq!(engine.state(), RefreshState::Stale);
        assert!(!engine.is_connected());
        assert!(matches!(engine.complete("ord", 3), Err(Error::NotReady)));
        assert!(engine.notify_schema_may_have_changed().is_none());
    }

    #[tokio::test]
    async fn in_flight_refresh_is_not_published() {
        let slow = Arc::new(Notify::new());
        let source = ScriptedSource::new()
            .then_names(SHOP)
            .then_gated(Arc::clone(&slow), &["ghost_table"]);
        let engine = connected(source.clone()).await;

        let refresh = engine
            .notify_schema_may_have_changed()
            .expect("connected");
        source.started(2).await;
        engine.on_disconnect();
        slow.notify_one();

        assert_eq!(refresh.await.expect("refresh task"), RefreshOutcome::Superseded);
        assert!(matches!(engine.complete("", 0), Err(Error::NotReady)));
    }

    #[tokio::test]
    async fn reconnect_discards_refresh_of_previous_connection() {
        let slow = Arc::new(Notify::new());
        let first = ScriptedSource::new()
            .then_names(SHOP)
            .then_gated(Arc::clone(&slow), &["old_table"]);
        let engine = connected(first.clone()).await;

        let refresh = engine
            .notify_schema_may_have_changed()
            .expect("connected");
        first.started(2).await;
        engine
            .on_connect(ScriptedSource::new().then_names(&["new_table"]))
            .await
            .expect("second connection");
        slow.notify_one();

        assert_eq!(refresh.await.expect("refresh task"), RefreshOutcome::Superseded);
        assert_eq!(engine.complete("", 0).expect("ready"), ["new_table"]);
    }
}

mod concurrency {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn refresh_racing_disconnect_never_revives_candidates() {
        let mut db = Database::new("shop");
        db.insert_table("public", Table::new_with("orders", ["id"]));
        let source = Arc::new(InMemorySource::new(db));
        let engine = engine();
        let runtime = tokio::runtime::Handle::current();

        for _ in 0..200 {
            engine
                .on_connect(Arc::clone(&source))
                .await
                .expect("initial build");

            let refresh = std::thread::scope(|scope| {
                let notifier = scope.spawn(|| {
                    let _entered = runtime.enter();
                    engine.notify_schema_may_have_changed()
                });
                scope.spawn(|| engine.on_disconnect());
                notifier.join().expect("notifier thread")
            });
            if let Some(refresh) = refresh {
                refresh.await.expect("refresh task");
            }

            assert!(!engine.is_connected());
            assert_eq!(engine.state(), RefreshState::Stale);
            assert!(matches!(engine.complete("ord", 3), Err(Error::NotReady)));
        }
    }

    const WIDER: &[&str] = &["orders", "order_items", "ordinals"];

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn readers_never_observe_a_partial_set() {
        let mut source = ScriptedSource::new().then_names(SHOP);
        for i in 0..20 {
            source = source.then_names(if i % 2 == 0 { WIDER } else { SHOP });
        }
        let engine = Arc::new(connected(source).await);

        let readers = (0..8).map(|_| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                for _ in 0..500 {
                    let completions = engine.complete("ord", 3).expect("ready");
                    assert!(
                        completions == ["order_items", "orders"]
                            || completions == ["order_items", "orders", "ordinals"],
                        "partial snapshot {completions:?}"
                    );
                    tokio::task::yield_now().await;
                }
            })
        });
        let readers: Vec<_> = readers.collect();

        for _ in 0..20 {
            assert_eq!(refreshed(&engine).await, RefreshOutcome::Published);
        }
        for reader in join_all(readers).await {
            reader.expect("reader task");
        }
    }

    #[tokio::test]
    async fn completion_is_idempotent_without_refresh() {
        let engine = connected(ScriptedSource::new().with_keywords(KEYWORDS).then_names(SHOP)).await;
        let engine = &engine;
        let requests = (0..16).map(|_| async move { engine.complete("o", 1) });
        let results = join_all(requests).await;
        let first = results[0].as_ref().expect("ready");
        assert!(results.iter().all(|r| r.as_ref().expect("ready") == first));
    }
}
