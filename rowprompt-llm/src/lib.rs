mod azure;
mod types;

pub mod openai_compatible;

pub use azure::{
    AzureChatClient, AzureChatClientBuilder, LsParams, API_KEY_ENV, API_VERSION_ENV, ENDPOINT_ENV,
    OPENAI_API_BASE_ENV,
};
pub use types::{LlmRequest, LlmResponse, Message, Role};

use rowprompt_core::Runnable;

pub trait Llm: Runnable<LlmRequest, LlmResponse> {}

impl<T> Llm for T where T: Runnable<LlmRequest, LlmResponse> {}
