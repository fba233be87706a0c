use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use perceiver_structural::{
    DomStateEngine, LiveDocument, MatchStrategy, PerceiverError, SharedDocument, TextModelPort,
};

const FORM_PAGE: &str = r#"<html><head><title>Signup</title></head><body>
  <h1>Create account</h1>
  <input id="email" type="email" placeholder="Email address">
  <a href="/terms" aria-label="Read the terms of service">Terms</a>
  <button class="btn primary">Submit</button>
  <button style="display:none">Submit hidden</button>
  <div style="cursor:pointer">Show more options</div>
</body></html>"#;

fn shared(html: &str) -> SharedDocument {
    LiveDocument::parse("https://example.test/signup", html).into_shared()
}

struct ScriptedModel {
    reply: String,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedModel {
    fn new(reply: &str) -> Arc<Self> {
        Self::delayed(reply, Duration::ZERO)
    }

    fn delayed(reply: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            delay,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextModelPort for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, PerceiverError> {
        assert!(prompt.contains("\"selector\""));
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.reply.clone())
    }
}

struct BrokenModel;

#[async_trait]
impl TextModelPort for BrokenModel {
    async fn complete(&self, _prompt: &str) -> Result<String, PerceiverError> {
        Err(PerceiverError::ModelUnavailable("quota exhausted".into()))
    }
}

#[tokio::test]
async fn exact_match_requeries_to_the_same_node() {
    let document = shared(FORM_PAGE);
    let engine = DomStateEngine::new(document.clone());

    let resolved = engine.resolve("Submit").await.expect("submit resolves");
    assert_eq!(resolved.tag_name, "button");
    assert_eq!(resolved.text, "Submit");

    let requeried = document
        .read()
        .query_selector(&resolved.selector)
        .expect("selector parses");
    assert_eq!(requeried, Some(resolved.node));
}

#[tokio::test]
async fn cascade_exhaustion_returns_none() {
    let engine = DomStateEngine::new(shared(FORM_PAGE));
    assert!(engine.resolve("sbmt").await.is_none());
}

#[tokio::test]
async fn cascade_order_is_exact_then_substring_then_tokens() {
    let engine = DomStateEngine::new(shared(FORM_PAGE));

    let exact = engine.resolve_detailed("submit").await.expect("exact");
    assert_eq!(exact.strategy, MatchStrategy::Exact);

    let aria = engine.resolve_detailed("terms of service").await.expect("aria");
    assert_eq!(aria.strategy, MatchStrategy::Substring);
    assert_eq!(aria.descriptor.tag_name, "a");

    let tokens = engine
        .resolve_detailed("more show")
        .await
        .expect("token set");
    assert_eq!(tokens.strategy, MatchStrategy::TokenSet);
    assert_eq!(tokens.descriptor.text, "Show more options");
}

#[tokio::test]
async fn hidden_elements_are_not_candidates() {
    let engine = DomStateEngine::new(shared(FORM_PAGE));
    assert!(engine
        .candidates()
        .iter()
        .all(|candidate| candidate.state.is_visible && candidate.state.is_clickable));
    let resolved = engine.resolve("Submit hidden").await;
    assert!(resolved.is_none());
}

#[tokio::test]
async fn model_selector_is_trusted_when_it_names_a_candidate() {
    let model = ScriptedModel::new("#email");
    let engine = DomStateEngine::new(shared(FORM_PAGE)).with_model(model.clone());
    let resolution = engine
        .resolve_detailed("where do I put my mail")
        .await
        .expect("model match");
    assert_eq!(resolution.strategy, MatchStrategy::Model);
    assert_eq!(resolution.descriptor.selector, "#email");
    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn model_sentinel_and_unknown_selectors_fall_through() {
    let no_match = DomStateEngine::new(shared(FORM_PAGE)).with_model(ScriptedModel::new("NO_MATCH"));
    let resolution = no_match.resolve_detailed("Submit").await.expect("cascade");
    assert_eq!(resolution.strategy, MatchStrategy::Exact);

    let invented = DomStateEngine::new(shared(FORM_PAGE))
        .with_model(ScriptedModel::new("button#does-not-exist"));
    assert_eq!(
        invented.resolve_detailed("Submit").await.map(|r| r.strategy),
        Some(MatchStrategy::Exact)
    );

    let broken = DomStateEngine::new(shared(FORM_PAGE)).with_model(Arc::new(BrokenModel));
    assert!(broken.resolve("Submit").await.is_some());
    assert_eq!(broken.metrics().model_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn slow_model_is_bounded_by_timeout() {
    let model = ScriptedModel::delayed("#email", Duration::from_secs(60));
    let engine = DomStateEngine::new(shared(FORM_PAGE)).with_model(model);
    let started = tokio::time::Instant::now();
    let resolution = engine.resolve_detailed("Submit").await.expect("cascade");
    assert_eq!(resolution.strategy, MatchStrategy::Exact);
    assert_eq!(started.elapsed(), Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn listing_is_cached_until_ttl_or_navigation() {
    let document = shared(FORM_PAGE);
    let engine = DomStateEngine::new(document.clone());

    let first = engine.list_interactive_elements(None);
    let second = engine.list_interactive_elements(None);
    assert_eq!(first, second);
    assert_eq!(engine.metrics().listing_cache.hits, 1);

    tokio::time::advance(Duration::from_secs(6)).await;
    engine.list_interactive_elements(None);
    assert_eq!(engine.metrics().listing_cache.misses, 2);

    document
        .write()
        .load("https://example.test/signup", "<button>Other</button>");
    let after = engine.list_interactive_elements(None);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].text, "Other");
}

#[tokio::test]
async fn handles_are_stable_then_reset_on_navigation() {
    let document = shared(FORM_PAGE);
    let engine = DomStateEngine::new(document.clone());
    let first = engine.resolve("Submit").await.expect("resolves");
    engine.invalidate();
    let again = engine.resolve("Submit").await.expect("resolves");
    assert_eq!(first.handle, again.handle);

    document
        .write()
        .load("https://example.test/next", "<button>Submit</button>");
    let fresh = engine.resolve("Submit").await.expect("resolves");
    assert!(fresh.handle.0 > first.handle.0);
    assert!(matches!(
        engine.refresh(&first),
        Err(PerceiverError::StaleElement { .. })
    ));
}

#[tokio::test]
async fn xpath_is_computed_on_demand() {
    let engine = DomStateEngine::new(shared(FORM_PAGE));
    let submit = engine.resolve("Submit").await.expect("resolves");
    assert_eq!(engine.xpath(&submit).expect("xpath"), "/html[1]/body[1]/button[1]");
}

#[tokio::test]
async fn listing_can_be_scoped_to_a_subtree() {
    let document = shared(
        r#"<body><form id="login"><input name="user"><button>Log in</button></form><a href="/help">Help</a></body>"#,
    );
    let engine = DomStateEngine::new(document.clone());
    let form = document
        .read()
        .query_selector("#login")
        .expect("parses")
        .expect("form");
    let scoped = engine.list_interactive_elements(Some(form));
    let tags: Vec<&str> = scoped.iter().map(|d| d.tag_name.as_str()).collect();
    assert_eq!(tags, vec!["input", "button"]);
    assert_eq!(engine.list_interactive_elements(None).len(), 3);
}
