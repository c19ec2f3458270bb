//! Commit Status Banner
//!
//! Shows a pending commit and the error of a rolled back one.

use leptos::prelude::*;
use sibling_order::{CommitStatus, ReorderError};

use crate::components::use_board;

fn failure_hint(error: &ReorderError) -> &'static str {
    match error {
        ReorderError::Transport(_) => "The order was not saved. Check the connection and try again.",
        ReorderError::TransactionRejected(_) => "The modules changed elsewhere. Reload and try again.",
        ReorderError::Validation(_) => "That move is not possible.",
    }
}

#[component]
pub fn CommitStatusBanner(status: ReadSignal<CommitStatus>) -> impl IntoView {
    let board = use_board();

    view! {
        {move || match status.get() {
            CommitStatus::Idle => None,
            CommitStatus::Pending => Some(view! {
                <div class="commit-status pending" aria-live="polite">"Saving order…"</div>
            }.into_any()),
            CommitStatus::Failed(error) => Some(view! {
                <div class="commit-status failed" role="alert">
                    <span class="commit-error">{error.to_string()}</span>
                    <span class="commit-hint">{failure_hint(&error)}</span>
                    <button
                        class="dismiss-btn"
                        on:click=move |_| {
                            if let Some(controller) = board.controller() {
                                controller.dismiss_error();
                            }
                        }
                    >
                        "×"
                    </button>
                </div>
            }.into_any()),
        }}
    }
}
