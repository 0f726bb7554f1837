//! The public surface of the crate root.

#[test]
fn public_names_are_exported() {
    #[allow(unused_imports)]
    use rowprompt_llm::{
        openai_compatible::{ChatCompletionRequest, ChatCompletionResponse, OpenAiError},
        AzureChatClient, AzureChatClientBuilder, Llm, LlmRequest, LlmResponse, LsParams, Message,
        Role, API_KEY_ENV, API_VERSION_ENV, ENDPOINT_ENV, OPENAI_API_BASE_ENV,
    };

    assert_eq!(API_KEY_ENV, "AZURE_OPENAI_API_KEY");
    assert_eq!(ENDPOINT_ENV, "AZURE_OPENAI_ENDPOINT");
    assert_eq!(API_VERSION_ENV, "OPENAI_API_VERSION");
    assert_eq!(OPENAI_API_BASE_ENV, "OPENAI_API_BASE");
}

#[test]
fn azure_client_is_an_llm() {
    fn assert_llm<T: rowprompt_llm::Llm>() {}
    assert_llm::<rowprompt_llm::AzureChatClient>();
}
