#[cfg(feature = "json")]
pub use crate::codec::JsonCodec;
pub use crate::codec::{
    Codec, DelimitedCodec, DelimitedRecord, FnCodec, FromStrCodec, SharedCodec, TextCodec,
    decode_flag, encode_flag, required,
};
pub use crate::context::SlotContext;
pub use crate::error::{DecodeError, QueryError, UnknownCodecError};
pub use crate::fallback::{DecodeAttempt, Fallback};
pub use crate::mode::{CodecRegistry, ModeSwitch};
pub use crate::slot::{BoundSlot, DefaultWrite, SlotOptions};
pub use crate::store::{
    QueryStore, RawStore, StoreChange, StoreHandle, SubscriptionId, WeakQueryStore,
};
pub use crate::subscription::Subscription;
