use std::marker::PhantomData;

use futures::stream::{self, BoxStream, StreamExt};

use crate::{RowpromptError, Runnable, StreamEvent};

/// Two runnables run back to back: the output of `first` is the input of `second`.
pub struct Chain<First, Second, Mid> {
    first: First,
    second: Second,
    _mid: PhantomData<fn() -> Mid>,
}

impl<First, Second, Mid> Chain<First, Second, Mid> {
    pub fn new(first: First, second: Second) -> Self {
        Self {
            first,
            second,
            _mid: PhantomData,
        }
    }

    pub fn first(&self) -> &First {
        &self.first
    }

    pub fn second(&self) -> &Second {
        &self.second
    }
}

#[async_trait::async_trait]
impl<Input, Mid, Output, First, Second> Runnable<Input, Output> for Chain<First, Second, Mid>
where
    Input: Send + 'static,
    Mid: Send + 'static,
    Output: Send + 'static,
    First: Runnable<Input, Mid> + Send + Sync,
    Second: Runnable<Mid, Output> + Send + Sync,
{
    async fn invoke(&self, input: Input) -> Result<Output, RowpromptError> {
        let mid = self.first.invoke(input).await?;
        self.second.invoke(mid).await
    }

    // The first stage is always invoked to completion; only the second stage streams.
    fn stream(&self, input: Input) -> BoxStream<'_, Result<StreamEvent, RowpromptError>> {
        stream::once(self.first.invoke(input))
            .map(move |result| match result {
                Ok(mid) => self.second.stream(mid),
                Err(err) => stream::iter(std::iter::once(Err(err))).boxed(),
            })
            .flatten()
            .boxed()
    }
}

pub trait RunnableExt<Input: Send + 'static, Output: Send + 'static>:
    Runnable<Input, Output> + Sized
{
    fn then<NextOutput, Next>(self, next: Next) -> Chain<Self, Next, Output>
    where
        Next: Runnable<Output, NextOutput> + Send + Sync,
        NextOutput: Send + 'static,
    {
        Chain::new(self, next)
    }
}

impl<Input: Send + 'static, Output: Send + 'static, T> RunnableExt<Input, Output> for T where
    T: Runnable<Input, Output> + Sized
{
}
