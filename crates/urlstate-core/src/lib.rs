//! # Slots, Codecs, and Stores
//!
//! `urlstate-core` keeps typed application state in a flat, string-keyed
//! store such as a query string. There are four main pieces:
//!
//! - `Codec<T>`: a `(parse, stringify)` pair between stored text and `T`.
//! - `Fallback<T>`: what a read yields when the key is missing or the text
//!   does not decode (the default, whole).
//! - `BoundSlot<T>`: one key, one codec, one default.
//! - `ModeSwitch<T>`: a slot whose codec is picked from a `CodecRegistry`
//!   at runtime.
//!
//! ## Slots
//!
//! ```rust
//! use urlstate_core::*;
//!
//! let store = QueryStore::new();
//! let count = store.bind("count", FromStrCodec::<i64>::new(), SlotOptions::new(0));
//!
//! assert_eq!(count.get(), 0);
//! count.update(|c| *c += 2);
//! assert_eq!(store.to_query_string(), "count=2");
//!
//! // Text the codec cannot parse reads as the default.
//! store.write_raw("count", "two");
//! assert_eq!(count.get(), 0);
//! ```
//!
//! Writing the default removes the key unless the slot was built with
//! `DefaultWrite::Keep`.
//!
//! ## Switching codecs
//!
//! ```rust
//! use urlstate_core::*;
//!
//! let store = QueryStore::new();
//! let registry = CodecRegistry::new()
//!     .with("text", TextCodec)
//!     .with("upper", FnCodec::new(
//!         |raw: &str| Ok(raw.to_lowercase()),
//!         |v: &String| v.to_uppercase(),
//!     ));
//! let mode = ModeSwitch::new(
//!     store.handle(),
//!     "q",
//!     SlotOptions::new(String::new()),
//!     registry,
//!     "text",
//! )
//! .unwrap();
//!
//! mode.set("rust".to_string());
//! mode.switch_to("upper").unwrap();
//! assert_eq!(mode.get(), "rust");
//! assert!(mode.switch_to("yaml").is_err());
//! assert_eq!(mode.active(), "upper");
//! ```
//!
//! ## Batching
//!
//! `QueryStore::run_batched` holds notifications back until the outermost
//! batch returns, so several `set` calls show up to observers (and to
//! history) as one update.

pub mod codec;
pub mod context;
pub mod error;
pub mod fallback;
pub mod mode;
pub mod prelude;
pub mod query;
pub mod slot;
pub mod store;
pub mod subscription;

pub use codec::*;
pub use context::*;
pub use error::*;
pub use fallback::*;
pub use mode::*;
pub use slot::*;
pub use store::*;
pub use subscription::*;
