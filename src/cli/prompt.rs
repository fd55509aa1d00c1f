use std::io::BufRead;

use async_trait::async_trait;
use dialoguer::Confirm as ConfirmPrompt;
use reqwest::Url;
use tracing::warn;

use crm_cloud_sync::controller::{CompletionSender, Confirm, ConfirmAction, NoticeLevel, Notifier};

/// Prints notices to stderr so stdout stays machine-readable.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        let tag = match level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        eprintln!("[{tag}] {message}");
    }

    fn local_data_replaced(&self) {
        eprintln!("[info] Local data was replaced; reopen the CRM to see it");
    }
}

/// Asks on the terminal. Declines when no terminal is attached.
pub struct TerminalConfirm;

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, action: &ConfirmAction) -> bool {
        let prompt = action.prompt();
        let answer = tokio::task::spawn_blocking(move || {
            ConfirmPrompt::new()
                .with_prompt(prompt)
                .default(false)
                .interact()
        })
        .await;

        match answer {
            Ok(Ok(answer)) => answer,
            Ok(Err(err)) => {
                warn!(error = %err, "Confirmation prompt failed, declining");
                false
            }
            Err(err) => {
                warn!(error = %err, "Confirmation prompt aborted, declining");
                false
            }
        }
    }
}

/// Turn pasted input into `(code, state)`. Accepts a full redirect URL or a
/// bare code; a bare code is taken to answer the request we opened.
pub fn completion_from_input(
    input: &str,
    expected_state: Option<String>,
) -> Option<(String, Option<String>)> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(input) {
        let mut code = None;
        let mut state = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }
        return code.filter(|c| !c.is_empty()).map(|c| (c, state));
    }

    Some((input.to_string(), expected_state))
}

/// Read one line from stdin on a detached thread and deliver it as the
/// completion signal. EOF or unusable input drops the sender.
pub fn spawn_code_reader(sender: CompletionSender, expected_state: Option<String>) {
    std::thread::spawn(move || {
        let mut line = String::new();
        let stdin = std::io::stdin();
        if stdin.lock().read_line(&mut line).is_err() {
            return;
        }
        if let Some((code, state)) = completion_from_input(&line, expected_state) {
            sender.deliver(code, state);
        }
    });
}
