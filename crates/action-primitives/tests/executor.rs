use std::sync::Arc;
use std::time::Duration;

use action_primitives::{
    ActionError, ActionExecutor, ActionPrimitives, ExecutorOptions, FillMethod, FormField,
    ScrollDirection, WaitTarget,
};
use async_trait::async_trait;
use data_extractor::{SearchDebug, SearchResult};
use extensions_bridge::{OrchestratorPort, OrchestratorReply, OrchestratorRequest};
use pagepilot_core_types::{TabId, TaskId, WindowId};
use parking_lot::Mutex;
use perceiver_structural::{DomStateEngine, EventKind, LiveDocument};
use tokio::time::Instant;
use tokio_test::assert_ok;

fn executor(html: &str) -> ActionExecutor {
    let document = LiveDocument::parse("https://app.test/form", html).into_shared();
    ActionExecutor::new(
        Arc::new(DomStateEngine::new(document)),
        ExecutorOptions::default(),
    )
}

const FORM: &str = r#"<html><body>
  <input id="email" placeholder="Email address">
  <input id="name" placeholder="Full name">
  <input id="locked" placeholder="Locked" disabled>
  <input id="code" placeholder="Promo code" readonly>
  <select id="country" aria-label="Country">
    <option value="de">Germany</option><option value="fr">France</option>
  </select>
  <input id="news" type="checkbox" aria-label="Subscribe">
  <button id="go">Submit</button>
  <button id="delete" disabled>Delete</button>
</body></html>"#;

#[tokio::test(start_paused = true)]
async fn typing_dispatches_one_input_per_character_then_one_change() {
    let executor = executor(FORM);
    let typed = executor.type_text("Email address", "abc").await.unwrap();
    assert_eq!(typed.selector, "#email");

    let engine = executor.engine();
    let doc = engine.document().read();
    assert_eq!(doc.value(typed.node), Some("abc"));
    let kinds: Vec<EventKind> = doc.events_for(typed.node).map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [
            EventKind::Focus,
            EventKind::Input,
            EventKind::Input,
            EventKind::Input,
            EventKind::Change
        ]
    );
    let data: Vec<Option<&str>> = doc
        .events_for(typed.node)
        .filter(|e| e.kind == EventKind::Input)
        .map(|e| e.data.as_deref())
        .collect();
    assert_eq!(data, [Some("a"), Some("b"), Some("c")]);
    drop(doc);

    let history = executor.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "type");
    assert!(history[0].success);
    assert_eq!(history[0].document_url, "https://app.test/form");
}

#[tokio::test(start_paused = true)]
async fn retyping_replaces_the_previous_value() {
    let executor = executor(FORM);
    executor.type_text("Full name", "Ada Lovelace").await.unwrap();
    let typed = executor.type_text("Full name", "Ada").await.unwrap();
    let engine = executor.engine();
    assert_eq!(engine.document().read().value(typed.node), Some("Ada"));
}

#[tokio::test(start_paused = true)]
async fn preconditions_name_what_is_unmet() {
    let executor = executor(FORM);

    match executor.click("Delete").await.unwrap_err() {
        ActionError::Precondition { unmet, reason, .. } => {
            assert!(unmet.contains(&"disabled".to_string()));
            assert!(reason.starts_with("not_clickable"));
        }
        other => panic!("unexpected {other:?}"),
    }
    match executor.type_text("Promo code", "SAVE").await.unwrap_err() {
        ActionError::Precondition { unmet, .. } => assert_eq!(unmet, ["readonly"]),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        executor.click("Launch rockets").await.unwrap_err(),
        ActionError::NotFound("Launch rockets".into())
    );

    let history = executor.history();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|record| !record.success));
    assert!(history[2].error.as_deref().unwrap().contains("Launch rockets"));
}

#[tokio::test(start_paused = true)]
async fn click_delivers_a_click_event() {
    let executor = executor(FORM);
    let clicked = executor.click("Submit").await.unwrap();
    let engine = executor.engine();
    let doc = engine.document().read();
    assert_eq!(
        doc.events_for(clicked.node).map(|e| e.kind).collect::<Vec<_>>(),
        [EventKind::Click]
    );
}

#[tokio::test(start_paused = true)]
async fn offscreen_targets_are_scrolled_into_view_and_settled() {
    let filler: String = (0..60).map(|i| format!("<p>row {i}</p>")).collect();
    let executor = executor(&format!(
        "<html><body>{filler}<button>Load more</button><p>tail</p></body></html>"
    ));
    let before = executor.engine().list_interactive_elements(None);
    assert!(!before[0].state.is_in_viewport);

    let started = Instant::now();
    let clicked = executor.click("Load more").await.unwrap();
    assert_eq!(started.elapsed(), Duration::from_millis(300));
    assert!(clicked.state.is_in_viewport);
    assert!(executor.engine().document().read().viewport().scroll_y > 0.0);
}

#[tokio::test(start_paused = true)]
async fn covered_targets_fail_as_obscured() {
    let executor = executor(
        r#"<html><body><button>Buy</button>
        <div style="position:fixed; left:0px; top:0px; width:1280px; height:720px; z-index:10">Cookie wall</div>
        </body></html>"#,
    );
    match executor.click("Buy").await.unwrap_err() {
        ActionError::Precondition { unmet, .. } => assert_eq!(unmet, ["obscured"]),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn history_is_capped_at_one_hundred() {
    let executor = executor(FORM);
    for _ in 0..150 {
        let _ = executor.scroll(ScrollDirection::Down, Some(10.0)).await;
    }
    assert_eq!(executor.history_len(), 100);
    assert_eq!(executor.history().len(), 100);
}

#[tokio::test(start_paused = true)]
async fn wait_polls_predicates_every_hundred_millis() {
    let executor = executor(FORM);
    let engine = executor.engine();
    let node = engine.document().read().query_selector("#name").unwrap().unwrap();

    let document = engine.document().clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(350)).await;
        document.write().set_value(node, "ready");
    });

    let outcome = executor
        .wait(WaitTarget::predicate(move |doc| doc.value(node) == Some("ready")))
        .await
        .unwrap();
    assert_eq!(outcome.waited_ms, 400);

    let fixed = executor
        .wait(WaitTarget::Duration(Duration::from_millis(250)))
        .await
        .unwrap();
    assert_eq!(fixed.waited_ms, 250);

    assert_ok!(executor.wait(WaitTarget::Element("Submit".into())).await);
}

#[tokio::test(start_paused = true)]
async fn waiting_for_a_missing_element_times_out_after_ten_seconds() {
    let executor = executor(FORM);
    let started = Instant::now();
    let err = executor
        .wait(WaitTarget::Element("Checkout".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Timeout { after_ms: 10_000, .. }));
    assert_eq!(started.elapsed(), Duration::from_secs(10));
    assert!(!executor.history()[0].success);
}

#[tokio::test(start_paused = true)]
async fn fill_form_applies_every_field_kind() {
    let executor = executor(FORM);
    let filled = executor
        .fill_form(&[
            FormField::new("Full name", "Ada"),
            FormField::new("Country", "France"),
            FormField::new("Subscribe", "yes"),
        ])
        .await
        .unwrap();
    let methods: Vec<&FillMethod> = filled.iter().map(|f| &f.method).collect();
    assert_eq!(
        methods,
        [&FillMethod::Typed, &FillMethod::Selected, &FillMethod::Checked]
    );
    assert_eq!(filled[1].value, "fr");

    let engine = executor.engine();
    let doc = engine.document().read();
    let country = doc.query_selector("#country").unwrap().unwrap();
    let news = doc.query_selector("#news").unwrap().unwrap();
    assert_eq!(doc.value(country), Some("fr"));
    assert!(doc.is_checked(news));
}

#[tokio::test(start_paused = true)]
async fn fill_form_attempts_all_fields_and_lists_failures() {
    let executor = executor(FORM);
    let err = executor
        .fill_form(&[
            FormField::new("Full name", "Bob"),
            FormField::new("Locked", "x"),
            FormField::new("Country", "Atlantis"),
        ])
        .await
        .unwrap_err();
    match err {
        ActionError::PartialFill { failed } => {
            assert_eq!(failed.len(), 2);
            assert!(failed[0].starts_with("Locked"));
            assert!(failed[1].starts_with("Country"));
        }
        other => panic!("unexpected {other:?}"),
    }
    let engine = executor.engine();
    let doc = engine.document().read();
    let name = doc.query_selector("#name").unwrap().unwrap();
    assert_eq!(doc.value(name), Some("Bob"));
    drop(doc);
    assert_eq!(executor.history().len(), 1);
}

#[derive(Default)]
struct ScriptedOrchestrator {
    seen: Mutex<Vec<OrchestratorRequest>>,
}

#[async_trait]
impl OrchestratorPort for ScriptedOrchestrator {
    async fn request(&self, request: OrchestratorRequest) -> OrchestratorReply {
        self.seen.lock().push(request.clone());
        match request {
            OrchestratorRequest::NavigateAutomationWindow { .. } => OrchestratorReply::Navigated {
                success: true,
                tab_id: TabId(7),
                window_id: WindowId(2),
            },
            OrchestratorRequest::WaitForPageLoad { tab_id, .. } => OrchestratorReply::PageLoad {
                success: true,
                tab_id,
                url: "https://search.test/?q=rust+lang".into(),
                timeout: None,
            },
            OrchestratorRequest::ExtractSearchResultsFromTab { .. } => {
                OrchestratorReply::SearchResults {
                    success: true,
                    results: vec![SearchResult {
                        rank: 1,
                        title: "Rust".into(),
                        url: "https://www.rust-lang.org/".into(),
                        snippet: String::new(),
                    }],
                    debug: SearchDebug::default(),
                }
            }
            other => OrchestratorReply::failure(format!("unsupported {}", other.kind())),
        }
    }
}

#[tokio::test]
async fn search_routes_through_the_orchestrator() {
    let port = Arc::new(ScriptedOrchestrator::default());
    let options = ExecutorOptions {
        search_url_template: "https://search.test/?q={query}".into(),
        ..ExecutorOptions::default()
    };
    let document = LiveDocument::blank().into_shared();
    let executor = ActionExecutor::new(Arc::new(DomStateEngine::new(document)), options)
        .with_orchestrator(TaskId::from("task-1"), port.clone());

    let found = executor.search("rust lang").await.unwrap();
    assert_eq!(found.results.len(), 1);
    assert_eq!(executor.tab(), Some(TabId(7)));

    let seen = port.seen.lock().clone();
    let kinds: Vec<&str> = seen.iter().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        [
            "NAVIGATE_AUTOMATION_WINDOW",
            "WAIT_FOR_PAGE_LOAD",
            "EXTRACT_SEARCH_RESULTS_FROM_TAB"
        ]
    );
    match &seen[0] {
        OrchestratorRequest::NavigateAutomationWindow { task_id, url } => {
            assert_eq!(task_id.as_str(), "task-1");
            assert_eq!(url, "https://search.test/?q=rust+lang");
        }
        other => panic!("unexpected {other:?}"),
    }
    let history = executor.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action, "search");
}

#[tokio::test]
async fn navigation_without_an_orchestrator_is_context_unavailable() {
    let executor = executor(FORM);
    let err = executor.navigate("https://example.test/").await.unwrap_err();
    assert!(matches!(err, ActionError::ContextUnavailable(_)));
    assert!(matches!(
        executor.navigate("not a url").await.unwrap_err(),
        ActionError::InvalidArgument(_)
    ));
    assert_eq!(executor.history().len(), 2);
}
