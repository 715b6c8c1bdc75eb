// Library surface for the binary, headless runs and integration tests.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod error;
pub mod history;
pub mod logging;
pub mod runtime;
pub mod session;
pub mod text;
pub mod time_series;

pub use controller::SessionController;
pub use session::TypingSession;
