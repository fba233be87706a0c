//! Login-wall detection for the current page.

use once_cell::sync::Lazy;
use perceiver_structural::judges;
use perceiver_structural::resolver::generate;
use perceiver_structural::{LiveDocument, NodeId, SelectorList};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::extractors::fixed;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoginSignal {
    LoginUrl,
    PasswordField,
    LoginForm,
    SignInWall,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginCheck {
    pub login_required: bool,
    pub reason: Option<LoginSignal>,
    pub current_url: String,
    /// Selector of the element that triggered detection, if any.
    pub element: Option<String>,
}

static LOGIN_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(^|[/.])(login|log-in|signin|sign-in|sign_in|sso|oauth2?|auth|authenticate)([/?#.]|$)|/session/new|/accounts?/login|/servicelogin",
    )
    .expect("valid login url regex")
});

static LOGIN_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(log ?in|sign ?in|signin|login|authenticate|auth)\b")
        .expect("valid login words regex")
});

static WALL_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(sign|log) ?in to (continue|view|see|read|access)|please (sign|log) ?in|(login|sign[- ]?in) required|you must be (logged|signed) in|create an account to continue",
    )
    .expect("valid sign-in wall regex")
});

static PASSWORD: Lazy<SelectorList> = Lazy::new(|| fixed(r#"input[type="password" i]"#));
static FORM: Lazy<SelectorList> = Lazy::new(|| fixed("form"));
static IDENTITY_INPUT: Lazy<SelectorList> = Lazy::new(|| {
    fixed(
        r#"input[type="email" i], input[autocomplete="username"], input[name*="user" i], input[name*="email" i], input[name*="login" i]"#,
    )
});
static SUBMIT: Lazy<SelectorList> =
    Lazy::new(|| fixed(r#"button, input[type="submit" i], [role=button]"#));
static OVERLAY: Lazy<SelectorList> = Lazy::new(|| {
    fixed(r#"[role=dialog], [aria-modal="true"], .modal, .overlay, .paywall, .login-wall"#)
});

/// Checks, in order: the URL itself, a visible password field, a login form,
/// then a sign-in wall (an overlay or the page body asking the user to log in).
pub fn detect_login_required(doc: &LiveDocument) -> LoginCheck {
    let current_url = doc.url().to_string();
    let detected = |reason, element: Option<NodeId>| LoginCheck {
        login_required: true,
        reason: Some(reason),
        current_url: current_url.clone(),
        element: element.map(|node| generate::selector_for(doc, node, 5)),
    };

    if login_url(doc.url()) {
        return detected(LoginSignal::LoginUrl, None);
    }

    let root = doc.arena().root();
    if let Some(field) = doc
        .select_within(root, &PASSWORD)
        .into_iter()
        .find(|node| judges::element_state(doc, *node).is_visible)
    {
        return detected(LoginSignal::PasswordField, Some(field));
    }

    if let Some(form) = doc
        .select_within(root, &FORM)
        .into_iter()
        .find(|form| is_login_form(doc, *form))
    {
        return detected(LoginSignal::LoginForm, Some(form));
    }

    if let Some(overlay) = doc.select_within(root, &OVERLAY).into_iter().find(|node| {
        judges::element_state(doc, *node).is_visible && WALL_TEXT.is_match(&doc.text(*node))
    }) {
        return detected(LoginSignal::SignInWall, Some(overlay));
    }
    if WALL_TEXT.is_match(&doc.text(doc.body())) {
        return detected(LoginSignal::SignInWall, None);
    }

    LoginCheck {
        login_required: false,
        reason: None,
        current_url,
        element: None,
    }
}

fn login_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            host.starts_with("login.")
                || host.starts_with("accounts.")
                || host.starts_with("auth.")
                || LOGIN_URL.is_match(parsed.path())
        }
        Err(_) => false,
    }
}

/// A form whose own attributes name a login, or one with an identity field
/// and a submit control labelled as a sign-in.
fn is_login_form(doc: &LiveDocument, form: NodeId) -> bool {
    let named = ["action", "id", "name", "class"]
        .iter()
        .filter_map(|attr| doc.attr(form, attr))
        .any(|value| LOGIN_WORDS.is_match(value) || LOGIN_URL.is_match(value));
    if named {
        return true;
    }
    let has_identity = doc.select_first_within(form, &IDENTITY_INPUT).is_some();
    has_identity
        && doc.select_within(form, &SUBMIT).into_iter().any(|submit| {
            let label = doc
                .attr(submit, "value")
                .map(str::to_string)
                .unwrap_or_else(|| doc.text(submit));
            LOGIN_WORDS.is_match(&label)
        })
}
