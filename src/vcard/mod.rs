//! vCard reading (RFC 6350, with the vCard 2.1/3.0 habits real exporters
//! still produce).
//!
//! ```
//! use contact_book::vcard;
//!
//! let cards = vcard::parse("BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Jane Doe\r\nEND:VCARD\r\n");
//! assert_eq!(cards.len(), 1);
//! assert!(cards[0].has_property("fn"));
//! ```
//!
//! Each property value is stored in the card's [`ValueGraph`] as a
//! [`PropertyValue::Wrapped`] node around the interpreted value.

mod card;
mod error;
mod lexer;
mod parser;
mod value;
mod values;

pub use card::{Card, Parameter, Property};
pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, unfold, ContentLine};
pub use parser::parse;
pub use value::{NodeId, PropertyValue, ValueGraph};
pub use values::{data_uri_payload, decode_base64, parse_date, unescape_text};
