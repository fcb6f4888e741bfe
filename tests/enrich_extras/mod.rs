use llm::{
    chat::{ChatMessage, ChatProvider, ChatResponse, Tool},
    error::LLMError,
};

#[macro_export]
macro_rules! assert_enrichments {
    (
        $(
            $test_name:ident : response => $response:expr, tags => $tags:expr, summary => $summary:expr
        ),+ $(,)?
    ) => {
        $(
            #[tokio::test]
            async fn $test_name() {
                let context = linkmark::enrich::EnrichContext {
                    model: &StubChatProvider::new($response.to_owned()),
                    prompt_template: None,
                };
                let row = linkmark::storage::EnrichRow {
                    url: String::new(),
                    title: None,
                    text: String::new(),
                };
                let result = linkmark::enrich::enrich_article(&row, &context)
                    .await
                    .expect("Expected successful processing.");

                assert_that(&result.tags).is_equal_to($tags.map(str::to_owned));
                assert_that(&result.summary).is_equal_to($summary.to_owned());
            }
        )+
    }
}

pub(crate) struct StubChatProvider {
    response_content: String,
}

impl StubChatProvider {
    pub fn new(response_content: String) -> Self {
        StubChatProvider { response_content }
    }
}

impl ChatProvider for StubChatProvider {
    fn chat<'life0, 'life1, 'async_trait>(
        &'life0 self,
        _messages: &'life1 [ChatMessage],
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Box<dyn ChatResponse>, LLMError>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            #[derive(Debug)]
            struct CannedResponse(String);

            impl ChatResponse for CannedResponse {
                fn text(&self) -> Option<String> {
                    Some(self.0.clone())
                }

                fn tool_calls(&self) -> Option<Vec<llm::ToolCall>> {
                    panic!()
                }

                fn thinking(&self) -> Option<String> {
                    None
                }

                fn usage(&self) -> Option<llm::chat::Usage> {
                    None
                }
            }

            impl std::fmt::Display for CannedResponse {
                fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(formatter, "{}", self.0)
                }
            }

            Ok(Box::new(CannedResponse(self.response_content.clone())) as Box<dyn ChatResponse>)
        })
    }

    fn chat_with_tools<'life0, 'life1, 'life2, 'async_trait>(
        &'life0 self,
        _messages: &'life1 [ChatMessage],
        _tools: Option<&'life2 [Tool]>,
    ) -> ::core::pin::Pin<
        Box<
            dyn ::core::future::Future<Output = Result<Box<dyn ChatResponse>, LLMError>>
                + ::core::marker::Send
                + 'async_trait,
        >,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        'life2: 'async_trait,
        Self: 'async_trait,
    {
        panic!()
    }
}
