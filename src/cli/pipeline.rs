//! Shared flow for commands that send diffs to the model: reduce the diffs
//! to a bounded context, build the final prompt and request a completion.

use anyhow::Result;
use tracing::debug;

use crate::ai::prompts::generate_prompt;
use crate::ai::{create_default_ai_client, AiError, PromptType};
use crate::config::{AppConfig, API_KEY};
use crate::context::{ContextBuilder, ContextCache, ContextReport, Summarizer};
use crate::git::ChangedFile;
use crate::utils::prompt_and_save_api_key;

/// Runs [`generate`] against the on-disk cache, asking for a new API key on
/// stdin and retrying once when the service rejects the current one.
pub(crate) async fn generate_with_auth_retry(
    config: &mut AppConfig,
    files: &[ChangedFile],
    prompt_type: PromptType,
) -> Result<String> {
    generate_with_key_refresh(
        config,
        files,
        prompt_type,
        ContextCache::disk,
        prompt_and_save_api_key,
    )
    .await
}

/// Runs [`generate`]; on an authentication failure calls `refresh_key` once
/// for a replacement key and retries with it.
pub(crate) async fn generate_with_key_refresh(
    config: &mut AppConfig,
    files: &[ChangedFile],
    prompt_type: PromptType,
    make_cache: impl Fn() -> ContextCache,
    refresh_key: impl FnOnce(&str) -> Result<String>,
) -> Result<String> {
    match generate(config, files, prompt_type, make_cache()).await {
        Err(e) if AiError::is_authentication_failure(&e) => {
            eprintln!("🔒 Authentication failed: {e}");
            config.api_key = Some(refresh_key(API_KEY)?);
            println!("💾 API key saved; retrying...");
            generate(config, files, prompt_type, make_cache()).await
        }
        other => other,
    }
}

/// Reduces `files`, renders the prompt and returns the model's answer.
pub(crate) async fn generate(
    config: &AppConfig,
    files: &[ChangedFile],
    prompt_type: PromptType,
    cache: ContextCache,
) -> Result<String> {
    let client = create_default_ai_client(config)?;
    let builder = ContextBuilder::new(Summarizer::new(client, config.language), cache)
        .with_budget(config.budget_calculator()?)
        .with_options(config.context_options());

    let (context, report) = builder
        .build_context_with_report(files, prompt_type)
        .await?;
    print_report(&report);

    let prompt = generate_prompt(&context, prompt_type, config.language);
    debug!(prompt_len = prompt.len(), %prompt_type, "Sending final request");

    println!("🤖 Waiting for {}...", config.model);
    builder.summarizer().client().send_request("", &prompt).await
}

fn print_report(report: &ContextReport) {
    if report.summarized > 0 || report.cache_hits > 0 {
        println!(
            "📦 Context: {} summarized, {} from cache, {} verbatim",
            report.summarized, report.cache_hits, report.passed_through
        );
    }
    if report.fallbacks > 0 {
        eprintln!(
            "warning: {} file(s) could not be summarized and were sent in full",
            report.fallbacks
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::ai::prompts::SUMMARY_INSTRUCTION;
    use crate::git::FileStatus;

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    fn config_for(server: &MockServer, api_key: &str) -> AppConfig {
        AppConfig {
            api_key: Some(api_key.to_string()),
            base_url: Some(server.uri()),
            ..AppConfig::default()
        }
    }

    fn small_file() -> ChangedFile {
        ChangedFile::new("src/lib.rs", "+pub fn answer() -> u32 { 42 }", FileStatus::Modified)
    }

    #[tokio::test]
    async fn rejected_key_is_refreshed_and_request_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-old"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-new"))
            .respond_with(completion("Looks good"))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config_for(&server, "sk-old");
        let refreshes = Cell::new(0);
        let answer = generate_with_key_refresh(
            &mut config,
            &[small_file()],
            PromptType::Analyze,
            ContextCache::in_memory,
            |key| {
                assert_eq!(key, API_KEY);
                refreshes.set(refreshes.get() + 1);
                Ok("sk-new".to_string())
            },
        )
        .await
        .unwrap();

        assert_eq!(answer, "Looks good");
        assert_eq!(refreshes.get(), 1);
        assert_eq!(config.api_key.as_deref(), Some("sk-new"));
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn second_rejection_is_returned_without_another_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .expect(2)
            .mount(&server)
            .await;

        let mut config = config_for(&server, "sk-old");
        let refreshes = Cell::new(0);
        let err = generate_with_key_refresh(
            &mut config,
            &[small_file()],
            PromptType::Create,
            ContextCache::in_memory,
            |_| {
                refreshes.set(refreshes.get() + 1);
                Ok("sk-still-bad".to_string())
            },
        )
        .await
        .unwrap_err();

        assert!(AiError::is_authentication_failure(&err));
        assert_eq!(refreshes.get(), 1);
    }

    #[tokio::test]
    async fn rejected_summarization_falls_back_without_prompting() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains(SUMMARY_INSTRUCTION))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(completion("Review of the raw diff"))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = config_for(&server, "sk-old");
        config.max_chunk_chars = Some(10);
        let diff = "+let numbers = vec![1, 2, 3, 4, 5];";
        let file = ChangedFile::new("src/main.rs", diff, FileStatus::Added);

        let answer = generate_with_key_refresh(
            &mut config,
            &[file],
            PromptType::Analyze,
            ContextCache::in_memory,
            |_| panic!("summarization failures must not ask for a new key"),
        )
        .await
        .unwrap();

        assert_eq!(answer, "Review of the raw diff");
        assert_eq!(config.api_key.as_deref(), Some("sk-old"));

        let requests = server.received_requests().await.unwrap();
        let final_request = requests
            .iter()
            .map(|r| String::from_utf8_lossy(&r.body).to_string())
            .find(|body| !body.contains(SUMMARY_INSTRUCTION))
            .unwrap();
        // The file went out verbatim after its summary was rejected
        assert!(final_request.contains("let numbers = vec![1, 2, 3, 4, 5];"));
    }
}
