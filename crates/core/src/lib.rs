//! Typed access to DynamoDB items.
//!
//! ```
//! use aws_sdk_dynamodb::types::AttributeValue;
//! use dynakit_core::{Item, ItemExt};
//!
//! let mut item = Item::new();
//! item.insert("age".to_string(), AttributeValue::N("37".to_string()));
//!
//! assert_eq!(item.n_as_i32("age").unwrap(), 37);
//! assert!(item.s_as_string("name").is_err());
//! ```

mod error;
mod item;

pub use error::{AttributeKind, ItemError, Result};
pub use item::{Item, ItemExt, TimeLayout};
