mod chain;
mod error;
mod row_store;
mod runnable;
pub mod session;
mod value;

pub use chain::{Chain, RunnableExt};
pub use error::{RowpromptError, StoreError};
pub use row_store::{Row, RowKey, RowStore};
pub use runnable::{Runnable, StreamEvent};
pub use session::{clear_default_session, default_session, init_default_session, Session};
pub use value::Value;
