pub mod resolver;
pub mod store;

pub use resolver::{substitute, TemplateResolver, TITLE_TOKEN};
pub use store::{FsTemplateStore, TemplateStore, TEMPLATE_EXTENSION};
