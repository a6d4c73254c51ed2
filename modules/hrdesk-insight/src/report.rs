//! Plain-text rendering of resolver state for the command line.

use std::fmt::Write;

use hrdesk_client::ViewPayload;
use hrdesk_resolver::{OptionSource, Resolver, ResolverState, Selection};

/// One line per stage, then what is needed next or what went wrong.
pub fn chain_summary<S: OptionSource>(resolver: &Resolver<S>) -> String {
    let mut out = String::new();
    for (stage, selection) in resolver.stages().iter().zip(resolver.selections().values()) {
        let _ = writeln!(out, "{}: {}", stage.name, stage.label(selection));
    }

    match resolver.state() {
        ResolverState::Idle => {
            let pending = resolver
                .selections()
                .values()
                .iter()
                .position(|s| *s == Selection::Unselected);
            if let Some(index) = pending {
                let options = resolver.options(index);
                if options.is_empty() {
                    let _ = writeln!(out, "no {} options available", resolver.stages()[index].name);
                } else {
                    let _ = writeln!(
                        out,
                        "choose a {}: {}",
                        resolver.stages()[index].name,
                        options.join(", ")
                    );
                }
            }
        }
        ResolverState::Failed(_) => {
            if let Some(err) = resolver.last_error() {
                let _ = writeln!(out, "error: {err}");
            }
        }
        _ => {}
    }
    out
}

/// Chart presence, total rows, then tab labels or table columns.
pub fn view_summary(payload: &ViewPayload) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "chart: {}", if payload.has_chart() { "yes" } else { "none" });
    let _ = writeln!(out, "rows: {}", payload.row_count());

    let tabs = payload.tab_labels();
    if !tabs.is_empty() {
        let _ = writeln!(out, "tabs: {}", tabs.join(", "));
    }
    if let ViewPayload::Single { df_columns, .. } = payload {
        if !df_columns.is_empty() {
            let _ = writeln!(out, "columns: {}", df_columns.join(", "));
        }
    }
    out
}
