pub mod client;
pub mod error;
pub mod openai_client;
pub mod prompt;
pub mod response;

pub use client::{response_fragments, FragmentStream, ModelClient};
pub use error::ModelError;
pub use openai_client::OpenAiClient;
pub use prompt::{ModelRequest, Prompt};
pub use response::{ResponseParser, StreamEvent};
