pub mod demo;
pub mod mock;
pub mod ollama;
pub mod openai_compat;

pub use demo::DemoProvider;
pub use mock::{MockProvider, MockReply};
pub use ollama::OllamaProvider;
pub use openai_compat::OpenAiCompatProvider;

#[cfg(test)]
mod tests {
    use super::*;
    use tripforge_core::{LlmPolicy, LlmProvider};

    #[tokio::test]
    async fn test_mock_replays_script_then_fixed_response() {
        let provider = MockProvider::new("mock").with_response("fallback");
        provider.push_text("first");
        provider.push_failure("boom");

        let req = LlmPolicy::default().request("sys", "hi");
        assert_eq!(provider.complete(&req).await.unwrap().content, "first");
        let err = provider.complete(&req).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert_eq!(provider.complete(&req).await.unwrap().content, "fallback");

        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.requests()[0].system_prompt, "sys");
    }
}
