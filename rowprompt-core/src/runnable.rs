use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::RowpromptError;

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    ContentChunk(String),
    FinalAnswer(String),
}

#[async_trait]
pub trait Runnable<Input: Send + 'static, Output: Send + 'static> {
    async fn invoke(&self, input: Input) -> Result<Output, RowpromptError>;

    fn stream(&self, input: Input) -> BoxStream<'_, Result<StreamEvent, RowpromptError>>;
}
