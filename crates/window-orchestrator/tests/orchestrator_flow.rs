use std::sync::Arc;
use std::time::Duration;

use data_extractor::ExtractionResult;
use extensions_bridge::{
    BridgeConfig, OrchestratorReply, OrchestratorRequest, TabBridge, WindowOptions,
};
use pagepilot_core_types::{TabId, TaskId};
use serde_json::json;
use tokio::time::Instant;
use window_orchestrator::{
    InMemoryBrowser, OrchestratorConfig, OrchestratorError, StaticPages, WindowOrchestrator,
};

const SERP: &str = "https://www.google.com/search?q=rust";
const PRICES: &str = "https://shop.test/prices";

fn pages() -> StaticPages {
    let results: String = (1..=3)
        .map(|i| {
            format!(
                r#"<div class="g"><a href="https://site{i}.test/"><h3>Result {i}</h3></a><span>Snippet {i}</span></div>"#
            )
        })
        .collect();
    StaticPages::new()
        .with_page(SERP, format!("<html><body>{results}</body></html>"))
        .with_page(
            PRICES,
            "<html><body><table><tr><th>Plan</th><th>Price</th></tr>\
             <tr><td>Basic</td><td>$5</td></tr><tr><td>Pro</td><td>$20</td></tr></table></body></html>",
        )
}

fn setup(config: OrchestratorConfig) -> (Arc<InMemoryBrowser>, Arc<WindowOrchestrator>) {
    let bridge = TabBridge::new(BridgeConfig::default());
    let browser = Arc::new(InMemoryBrowser::new(Arc::new(pages()), bridge));
    let orchestrator = Arc::new(WindowOrchestrator::new(browser.clone(), config));
    (browser, orchestrator)
}

#[tokio::test(start_paused = true)]
async fn ensure_window_reuses_until_closed_externally() {
    let (browser, orchestrator) = setup(OrchestratorConfig::default());
    let task = TaskId::from("task-a");
    let options = WindowOptions::default();

    let first = orchestrator.ensure_window(&task, None, &options).await.unwrap();
    assert!(!first.reused);
    assert_eq!(browser.is_focused(first.window_id), Some(false));
    assert_eq!(browser.is_minimized(first.window_id), Some(true));

    let second = orchestrator.ensure_window(&task, None, &options).await.unwrap();
    assert!(second.reused);
    assert_eq!(second.window_id, first.window_id);

    assert!(browser.close_externally(first.window_id));
    let third = orchestrator.ensure_window(&task, None, &options).await.unwrap();
    assert!(!third.reused);
    assert_ne!(third.window_id, first.window_id);

    let metrics = orchestrator.metrics();
    assert_eq!(metrics.windows_created, 2);
    assert_eq!(metrics.windows_reused, 1);
    assert_eq!(metrics.stale_evicted, 1);
}

#[tokio::test(start_paused = true)]
async fn minimize_failures_do_not_fail_window_creation() {
    let (browser, orchestrator) = setup(OrchestratorConfig::default());
    browser.refuse_minimize(true);
    let ensured = orchestrator
        .ensure_window(&TaskId::from("task-b"), None, &WindowOptions::default())
        .await
        .unwrap();
    assert_eq!(browser.is_minimized(ensured.window_id), Some(false));
}

#[tokio::test(start_paused = true)]
async fn extraction_waits_for_load_and_settles_once() {
    let (_browser, orchestrator) = setup(OrchestratorConfig::default());
    let task = TaskId::from("task-c");
    let ensured = orchestrator.navigate_in_window(&task, PRICES).await.unwrap();

    let started = Instant::now();
    let data = orchestrator
        .extract_from_tab(ensured.tab_id, Some("table"))
        .await
        .unwrap();
    // one 100ms poll to see the load, then the first-attempt settle
    assert_eq!(started.elapsed(), Duration::from_millis(1100));
    match data {
        ExtractionResult::Table(table) => {
            assert_eq!(table.tables[0].headers, ["Plan", "Price"]);
            assert_eq!(table.tables[0].rows.len(), 2);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(orchestrator.metrics().relay_attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn stalled_tab_exhausts_three_attempts_with_linear_backoff() {
    let (browser, orchestrator) = setup(OrchestratorConfig::default());
    browser.stall_loads(true);
    let ensured = orchestrator
        .navigate_in_window(&TaskId::from("task-d"), "https://slow.test/")
        .await
        .unwrap();

    let started = Instant::now();
    let reply = orchestrator
        .handle(OrchestratorRequest::ExtractFromTab {
            tab_id: ensured.tab_id,
            data_type: None,
        })
        .await;
    // 15s load wait + 1s settle, 1s backoff, 15s, 2s backoff, 15s
    assert_eq!(started.elapsed(), Duration::from_millis(49_000));
    match reply {
        OrchestratorReply::Failure {
            success, attempts, ..
        } => {
            assert!(!success);
            assert_eq!(attempts, Some(3));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(orchestrator.metrics().relays_exhausted, 1);
}

#[tokio::test(start_paused = true)]
async fn detached_script_is_retried_then_reported() {
    let (browser, orchestrator) = setup(OrchestratorConfig::default());
    let ensured = orchestrator
        .navigate_in_window(&TaskId::from("task-e"), SERP)
        .await
        .unwrap();
    let load = orchestrator
        .wait_for_load(ensured.tab_id, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(load.settled);
    assert_eq!(load.url, SERP);

    let found = orchestrator
        .extract_search_results_from_tab(ensured.tab_id)
        .await
        .unwrap();
    assert_eq!(found.results.len(), 3);

    assert!(browser.detach_script(ensured.tab_id));
    let started = Instant::now();
    let err = orchestrator
        .extract_search_results_from_tab(ensured.tab_id)
        .await
        .unwrap_err();
    assert_eq!(started.elapsed(), Duration::from_millis(4_000));
    match err {
        OrchestratorError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(last.contains("no receiver"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn open_tab_extends_the_ordered_tab_set() {
    let (browser, orchestrator) = setup(OrchestratorConfig::default());
    let task = TaskId::from("task-f");
    let ensured = orchestrator.navigate_in_window(&task, SERP).await.unwrap();
    let extra = orchestrator.open_tab(&task, PRICES).await.unwrap();

    let window = orchestrator.window(&task).unwrap();
    assert_eq!(window.tab_ids, [ensured.tab_id, extra]);
    assert_eq!(window.origin_tab_id, ensured.tab_id);
    assert_eq!(browser.tabs_of(ensured.window_id), [ensured.tab_id, extra]);

    assert!(orchestrator.close_window(&task).await);
    assert!(!browser.window_exists(ensured.window_id));
    assert!(!orchestrator.close_window(&task).await);
}

#[tokio::test(start_paused = true)]
async fn json_entry_point_rejects_unknown_types() {
    let (_browser, orchestrator) = setup(OrchestratorConfig::default());

    let reply = orchestrator
        .handle_json(json!({ "type": "OPEN_SESAME", "taskId": "x" }))
        .await;
    assert_eq!(reply["success"], json!(false));
    assert!(reply["error"].as_str().unwrap().contains("OPEN_SESAME"));

    let created = orchestrator
        .handle_json(json!({
            "type": "CREATE_AUTOMATION_WINDOW",
            "taskId": "task-g",
            "url": PRICES,
            "options": { "focused": false }
        }))
        .await;
    assert_eq!(created["success"], json!(true));
    assert_eq!(created["reused"], json!(false));
    let tab_id = created["tabId"].clone();

    let loaded = orchestrator
        .handle_json(json!({ "type": "WAIT_FOR_PAGE_LOAD", "tabId": tab_id, "timeout": 500 }))
        .await;
    assert_eq!(loaded["success"], json!(true));
    assert_eq!(loaded["url"], json!(PRICES));
    assert!(loaded.get("timeout").is_none());

    let missing = orchestrator
        .handle_json(json!({ "type": "WAIT_FOR_PAGE_LOAD", "tabId": 999 }))
        .await;
    assert_eq!(missing["success"], json!(false));
}

#[tokio::test(start_paused = true)]
async fn page_load_wait_reports_timeout() {
    let (browser, orchestrator) = setup(OrchestratorConfig::default());
    browser.stall_loads(true);
    let ensured = orchestrator
        .navigate_in_window(&TaskId::from("task-h"), SERP)
        .await
        .unwrap();
    let started = Instant::now();
    let reply = orchestrator
        .handle(OrchestratorRequest::WaitForPageLoad {
            tab_id: ensured.tab_id,
            timeout: Some(500),
        })
        .await;
    assert_eq!(started.elapsed(), Duration::from_millis(500));
    assert_eq!(
        reply,
        OrchestratorReply::PageLoad {
            success: true,
            tab_id: ensured.tab_id,
            url: SERP.to_string(),
            timeout: Some(true),
        }
    );
}

#[tokio::test(start_paused = true)]
async fn sweeper_closes_windows_older_than_an_hour() {
    let (browser, orchestrator) = setup(OrchestratorConfig::default());
    let task = TaskId::from("task-i");
    let ensured = orchestrator
        .ensure_window(&task, None, &WindowOptions::default())
        .await
        .unwrap();

    assert_eq!(orchestrator.sweep_stale().await, 0);
    let sweeper = orchestrator.spawn_sweeper();
    tokio::time::sleep(Duration::from_secs(25 * 60 * 60)).await;

    assert_eq!(orchestrator.window_count(), 0);
    assert!(!browser.window_exists(ensured.window_id));
    assert_eq!(orchestrator.metrics().windows_swept, 1);
    drop(sweeper);
}

#[tokio::test(start_paused = true)]
async fn invalid_urls_are_rejected_before_any_window_exists() {
    let (_browser, orchestrator) = setup(OrchestratorConfig::default());
    let err = orchestrator
        .navigate_in_window(&TaskId::from("task-j"), "not a url")
        .await
        .unwrap_err();
    assert_eq!(err, OrchestratorError::InvalidUrl("not a url".into()));
    assert_eq!(orchestrator.window_count(), 0);
    assert_eq!(
        orchestrator
            .wait_for_load(TabId(42), Duration::from_secs(1))
            .await
            .unwrap_err(),
        OrchestratorError::TabNotFound(TabId(42))
    );
}
