mod debug_env;
mod health_check;
mod notify;

pub use debug_env::*;
pub use health_check::*;
pub use notify::*;
