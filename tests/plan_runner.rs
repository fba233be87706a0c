use std::sync::Arc;

use pagepilot::{Config, Plan, PlanRunner};
use serde_json::json;
use tokio_test::assert_ok;
use window_orchestrator::StaticPages;

const SIGNUP: &str = "https://app.test/signup";

fn pages() -> StaticPages {
    StaticPages::new()
        .with_page(
            SIGNUP,
            r#"<html><head><title>Sign up</title></head><body>
              <h1>Create your account</h1>
              <input id="name" placeholder="Full name">
              <input id="email" type="email" placeholder="Email address">
              <select id="plan" aria-label="Plan">
                <option value="free">Free</option><option value="pro">Pro</option>
              </select>
              <input id="terms" type="checkbox" aria-label="Accept terms">
              <button id="submit">Create account</button>
            </body></html>"#,
        )
        .with_page(
            "https://search.test/?q=rust+lang",
            r#"<html><body>
              <div class="g"><a href="https://www.rust-lang.org/"><h3>Rust Programming Language</h3></a></div>
              <div class="g"><a href="https://doc.rust-lang.org/book/"><h3>The Rust Book</h3></a></div>
            </body></html>"#,
        )
}

fn runner() -> PlanRunner {
    let mut config = Config::default();
    config.actions.search_template = "https://search.test/?q={query}".to_string();
    PlanRunner::new(Arc::new(pages()), &config)
}

#[tokio::test(start_paused = true)]
async fn signup_plan_runs_every_step_and_closes_the_window() {
    let plan = Plan::from_yaml(
        r#"
task_id: signup
steps:
  - action: navigate
    url: https://app.test/signup
  - action: fill
    fields:
      - field: Full name
        value: Ada Lovelace
      - field: Plan
        value: Pro
      - field: Accept terms
        value: "yes"
  - action: type
    target: Email address
    text: ada@example.test
  - action: click
    target: Create account
  - action: extract
    data_type: headings
"#,
    )
    .unwrap();

    let runner = runner();
    let report = runner.run(&plan).await;

    assert!(report.completed, "{report:?}");
    assert_eq!(report.task_id.as_str(), "signup");
    assert_eq!(report.steps.len(), 5);
    assert!(report.steps.iter().all(|step| step.success));

    let filled = report.steps[1].output.as_ref().unwrap();
    assert_eq!(filled[1]["value"], json!("pro"));
    assert_eq!(filled[2]["method"], json!("checked"));
    assert_eq!(
        report.steps[3].output.as_ref().unwrap()["selector"],
        json!("#submit")
    );
    let extracted = report.steps[4].output.as_ref().unwrap();
    assert_eq!(extracted["type"], json!("headings"));
    assert_eq!(extracted["headings"][0]["text"], json!("Create your account"));

    let actions: Vec<&str> = report.history.iter().map(|r| r.action.as_str()).collect();
    assert_eq!(actions, ["navigate", "fill_form", "type", "click"]);
    assert_eq!(runner.orchestrator().window_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn a_failed_step_stops_the_plan() {
    let plan = Plan::from_yaml(
        r#"
steps:
  - action: navigate
    url: https://app.test/signup
  - action: click
    target: Delete account
  - action: scroll
    direction: down
"#,
    )
    .unwrap();

    let runner = runner();
    let report = runner.run(&plan).await;

    assert!(!report.completed);
    assert_eq!(report.steps.len(), 2);
    assert!(!report.steps[1].success);
    assert!(report.steps[1]
        .error
        .as_deref()
        .unwrap()
        .contains("Delete account"));
    assert_eq!(report.history.len(), 2);
    assert!(!report.history[1].success);
    assert_eq!(runner.orchestrator().window_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn search_step_reads_results_from_the_automation_tab() {
    let plan = Plan::from_yaml(
        r#"
task_id: research
steps:
  - action: search
    query: rust lang
  - action: click
    target: The Rust Book
"#,
    )
    .unwrap();

    let report = runner().run(&plan).await;

    assert!(report.completed, "{report:?}");
    let found = report.steps[0].output.as_ref().unwrap();
    assert_eq!(found["results"].as_array().unwrap().len(), 2);
    assert_eq!(found["results"][1]["url"], json!("https://doc.rust-lang.org/book/"));
}

#[tokio::test(start_paused = true)]
async fn extract_before_navigation_is_a_plan_error() {
    let plan = assert_ok!(Plan::from_yaml("steps:\n  - action: extract\n"));
    let report = runner().run(&plan).await;
    assert!(!report.completed);
    assert!(report.steps[0]
        .error
        .as_deref()
        .unwrap()
        .contains("navigate first"));
    assert!(report.history.is_empty());
}
