mod composer;
mod published;

pub use composer::{Application, Composer};
pub use published::PublishedApp;
