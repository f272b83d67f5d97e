//! Protocol Module
//!
//! Defines the wire protocol shared by client connections and the
//! append-only log.
//!
//! ## Value Types
//! | Marker | Meaning       | Body                                         |
//! |--------|---------------|----------------------------------------------|
//! | `+`    | simple string | text line                                    |
//! | `-`    | error         | text line                                    |
//! | `:`    | integer       | decimal text line                            |
//! | `$`    | bulk string   | length line, raw bytes, CRLF; `-1` = null    |
//! | `*`    | array         | count line, then `count` encoded values      |

mod value;
mod codec;

pub use value::Value;
pub use codec::{
    encode, marshal, read_value, write_value, Decoder, MAX_BULK_LEN, MAX_DEPTH, MAX_LINE_LEN,
};
