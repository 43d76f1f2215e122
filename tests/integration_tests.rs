//! Integration tests for the stratus-tutor library.
//! These tests require an API key in the environment to run.

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use stratus_tutor::chat::{Outcome, PlainTextRenderer, Session};
    use stratus_tutor::{
        Content, Error, GenerateContentRequest, GenerationConfig, Gemini, Model, TextGeneration,
        TutorService,
    };

    const TEST_MODEL: &str = "gemini-2.5-flash";

    fn client() -> Option<Gemini> {
        // This test requires GEMINI_API_KEY to be set
        let api_key = std::env::var("GEMINI_API_KEY").ok();
        if api_key.is_none() {
            eprintln!("Skipping test: GEMINI_API_KEY not set");
            return None;
        }
        Some(Gemini::new(api_key).expect("Failed to create client"))
    }

    fn short_request(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest::new(vec![Content::user(prompt)]).with_generation_config(Some(
            GenerationConfig {
                max_output_tokens: Some(64),
                ..GenerationConfig::default()
            },
        ))
    }

    #[tokio::test]
    async fn test_simple_generate_request() {
        let Some(client) = client() else {
            return;
        };

        let response = client
            .generate(&Model::new(TEST_MODEL), &short_request("Say 'test passed'"))
            .await;
        assert!(
            response.is_ok(),
            "Request should succeed with valid API key"
        );
    }

    #[tokio::test]
    async fn test_streaming_response() {
        let Some(client) = client() else {
            return;
        };

        let stream = client
            .stream(&Model::new(TEST_MODEL), &short_request("Count to 3"))
            .await;
        assert!(stream.is_ok(), "Stream request should succeed");

        let mut stream = stream.unwrap();
        let mut text = String::new();
        while let Some(event) = stream.next().await {
            text.push_str(&event.expect("event should parse").text());
        }
        assert!(!text.is_empty(), "Stream should carry text");
    }

    #[tokio::test]
    async fn test_unknown_model_is_not_found() {
        let Some(client) = client() else {
            return;
        };

        let result = client
            .generate(
                &Model::new("no-such-model-for-stratus"),
                &short_request("hello"),
            )
            .await;
        let err = result.expect_err("unknown model should fail");
        assert!(
            matches!(err, Error::NotFound { .. }),
            "unexpected error: {err}"
        );
    }

    #[tokio::test]
    async fn test_tutor_session_round_trip() {
        let Some(client) = client() else {
            return;
        };

        let service = TutorService::new(client, Model::new(TEST_MODEL));
        let greeting = service.start().await.expect("greeting should arrive");
        assert!(!greeting.is_empty());

        let mut session = Session::new(service);
        let mut renderer = PlainTextRenderer::with_writer(Vec::new(), false);
        let settled = session
            .start_with("In one sentence, what is object storage?", &mut renderer)
            .await
            .expect("reply should stream")
            .expect("send should not be ignored");
        assert_eq!(settled.outcome, Outcome::Success);
        assert!(!session.message(settled.message).unwrap().text().is_empty());
    }
}
