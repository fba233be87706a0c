//! Fill-form verb

use perceiver_structural::{DomStateEngine, ElementDescriptor, EventKind};
use tracing::{info, warn};

use crate::errors::ActionError;
use crate::locator::{self, Intent};
use crate::primitives::{type_text, ActionExecutor};
use crate::types::{FillMethod, FilledField, FormField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Text,
    Select,
    Toggle,
}

/// Apply every field in order. A failing field does not stop the others;
/// the verb fails afterwards with one entry per failed field.
pub async fn execute_fill_form(
    executor: &ActionExecutor,
    fields: &[FormField],
) -> Result<Vec<FilledField>, ActionError> {
    if fields.is_empty() {
        return Err(ActionError::InvalidArgument("no form fields given".into()));
    }
    info!(fields = fields.len(), "executing fill_form");
    let mut filled = Vec::with_capacity(fields.len());
    let mut failed = Vec::new();
    for field in fields {
        match fill_one(executor, field).await {
            Ok(done) => filled.push(done),
            Err(err) => {
                warn!(field = %field.field, error = %err, "form field failed");
                failed.push(format!("{}: {}", field.field, err));
            }
        }
    }
    if failed.is_empty() {
        Ok(filled)
    } else {
        Err(ActionError::PartialFill { failed })
    }
}

async fn fill_one(executor: &ActionExecutor, field: &FormField) -> Result<FilledField, ActionError> {
    let engine = executor.engine();
    let target = locator::locate(&engine, &field.field).await?;
    let control = control_of(&engine, &target);
    let intent = match control {
        Control::Text => Intent::Edit,
        Control::Select | Control::Toggle => Intent::Click,
    };
    locator::verify(&field.field, &target, intent)?;
    let target = locator::bring_into_view(
        &engine,
        &field.field,
        target,
        intent,
        executor.options().settle_delay,
    )
    .await?;

    let (method, value) = match control {
        Control::Text => {
            type_text::type_into(executor, target.node, &field.value)?;
            (FillMethod::Typed, field.value.clone())
        }
        Control::Select => (FillMethod::Selected, select(&engine, &target, &field.value)?),
        Control::Toggle => (FillMethod::Checked, toggle(&engine, &target, &field.value)?),
    };
    Ok(FilledField {
        field: field.field.clone(),
        selector: target.selector,
        method,
        value,
    })
}

fn control_of(engine: &DomStateEngine, target: &ElementDescriptor) -> Control {
    let doc = engine.document().read();
    match doc.tag(target.node) {
        Some("select") => Control::Select,
        Some("input") => match doc.attr(target.node, "type").map(str::to_ascii_lowercase) {
            Some(kind) if kind == "checkbox" || kind == "radio" => Control::Toggle,
            _ => Control::Text,
        },
        _ => Control::Text,
    }
}

fn select(
    engine: &DomStateEngine,
    target: &ElementDescriptor,
    wanted: &str,
) -> Result<String, ActionError> {
    let chosen = {
        let mut doc = engine.document().write();
        let chosen = doc.select_option(target.node, wanted).ok_or_else(|| {
            ActionError::InvalidArgument(format!(
                "no option with value or label `{wanted}` in {}",
                target.selector
            ))
        })?;
        doc.dispatch(target.node, EventKind::Change, Some(chosen.clone()));
        chosen
    };
    engine.invalidate();
    Ok(chosen)
}

pub(crate) fn parse_toggle(value: &str) -> Result<bool, ActionError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" | "checked" => Ok(true),
        "false" | "off" | "no" | "0" | "unchecked" => Ok(false),
        other => Err(ActionError::InvalidArgument(format!(
            "`{other}` is not a checkbox state"
        ))),
    }
}

fn toggle(
    engine: &DomStateEngine,
    target: &ElementDescriptor,
    value: &str,
) -> Result<String, ActionError> {
    let wanted = parse_toggle(value)?;
    {
        let mut doc = engine.document().write();
        if doc.is_checked(target.node) != wanted {
            let radio = doc
                .attr(target.node, "type")
                .is_some_and(|kind| kind.eq_ignore_ascii_case("radio"));
            if wanted || !radio {
                doc.click(target.node);
            } else {
                doc.set_checked(target.node, false);
                doc.dispatch(target.node, EventKind::Change, Some("false".into()));
            }
        }
        if doc.is_checked(target.node) != wanted {
            return Err(ActionError::Unconfirmed(format!(
                "{} is still {}",
                target.selector,
                if wanted { "unchecked" } else { "checked" }
            )));
        }
    }
    engine.invalidate();
    Ok(wanted.to_string())
}
