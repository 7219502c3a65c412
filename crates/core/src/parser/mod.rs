//! Tokenizing and parsing: the lexical layer (§4.2), the object syntax
//! parser (§4.3), and the content-stream tokenizer (§4.9).

pub mod content_lexer;
pub mod lexer;
pub mod object_parser;

pub use content_lexer::{tokenize_content, ContentOp};
pub use lexer::{next_token, Token};
pub use object_parser::{LengthResolver, NoLengthResolver, ObjectParser};
