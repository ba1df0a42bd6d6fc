pub mod raw_document;
pub mod parsing_utils;
pub mod slug;
pub mod normalizer;
pub mod body_renderer;
