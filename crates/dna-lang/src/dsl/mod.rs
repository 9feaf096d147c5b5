//! DNA-Lang source language
//!
//! Lexing and parsing of organism descriptions into the typed document
//! model consumed by the evolution engine.

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::*;
pub use lexer::{tokenize, Lexer, Token};
pub use parser::{parse, parse_with, ParseOptions, Parser};
