pub mod chat_handlers;
pub mod session_handlers;
pub mod system_handlers;
pub mod trend_handlers;

pub use chat_handlers::*;
pub use session_handlers::*;
pub use system_handlers::*;
pub use trend_handlers::*;
