pub mod buffer;
pub mod frontmatter;
pub mod note;

pub use buffer::{Position, TextBuffer, TextSink};
pub use frontmatter::FrontMatter;
pub use note::{DocumentContext, Note};
