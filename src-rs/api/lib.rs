pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::{AppError, ErrorBody};
pub use server::{build_router, TaskServer};
pub use state::AppState;
