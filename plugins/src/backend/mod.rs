pub mod echo;
pub mod executor;
pub mod process;
pub mod template;

pub use echo::EchoTaskExecutor;
pub use executor::CommandTaskExecutor;
