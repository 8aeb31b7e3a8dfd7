pub mod config;
pub mod crawler;
pub mod dispatcher;
pub mod handler;
pub mod linkedin;
pub mod session;
pub mod sink;

mod error;
mod utils;

pub use config::Settings;
pub use crawler::{Crawler, CrawlerContext, CrawlerType, Params};
pub use dispatcher::Dispatcher;
pub use error::{CrawlerError, DispatchError, RegistryError};
pub use handler::{handle, Event, Response};
