//! # Block Encoders
//!
//! Client-specific byte layouts of the extended info blocks.
//!
//! Each client type gets its own [`BlockEncoder`]. A new protocol revision
//! or client build that shuffles field order or byte transforms is a new
//! encoder implementation registered for that client type, never a branch
//! inside an existing one.
//!
//! ## Revision 228 Desktop Layouts
//!
//! | Block       | Fields                                                   |
//! |-------------|----------------------------------------------------------|
//! | Move speed  | `p1_alt2` value                                          |
//! | Sequence    | `p2` id, `p1_alt1` delay                                 |
//! | Tinting     | `p2` start, `p2_alt1` end, `p1` hue, `p1_alt3` saturation, `p1` lightness, `p1_alt2` weight |
//! | Name change | text codec                                               |

use std::sync::Arc;

use meridian_core::ByteBuf;
use meridian_shared::{ClientType, ClientTypeMap, ClientTypeSet};

use super::blocks::BlockPayload;
use super::ExtendedInfoKind;

/// Encodes strings for name change blocks.
pub trait TextCodec: Send + Sync {
    /// Appends `text` to `out`.
    fn encode(&self, text: &str, out: &mut ByteBuf);
}

/// Latin-1 bytes followed by a zero terminator.
///
/// Characters outside Latin-1 (and NUL) are written as `?`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextCodec;

impl TextCodec for PlainTextCodec {
    fn encode(&self, text: &str, out: &mut ByteBuf) {
        for ch in text.chars() {
            let byte = u8::try_from(u32::from(ch)).unwrap_or(b'?');
            out.p1(if byte == 0 { b'?' } else { byte });
        }
        out.p1(0);
    }
}

/// Byte layout of every block kind for one client type.
pub trait BlockEncoder: Send + Sync {
    /// Appends the encoded payload to `out`.
    fn encode(&self, payload: &BlockPayload, text: &dyn TextCodec, out: &mut ByteBuf);

    /// Expected encoded size, used to size pooled buffers.
    fn size_hint(&self, kind: ExtendedInfoKind) -> usize {
        match kind {
            ExtendedInfoKind::MoveSpeed => 1,
            ExtendedInfoKind::Sequence => 3,
            ExtendedInfoKind::Tinting => 8,
            ExtendedInfoKind::NameChange => 16,
        }
    }
}

/// Desktop client layouts.
#[derive(Clone, Copy, Debug, Default)]
pub struct DesktopBlockEncoder;

impl BlockEncoder for DesktopBlockEncoder {
    fn encode(&self, payload: &BlockPayload, text: &dyn TextCodec, out: &mut ByteBuf) {
        match payload {
            BlockPayload::MoveSpeed(speed) => out.p1_alt2(speed.value),
            BlockPayload::Sequence(sequence) => {
                out.p2(sequence.id);
                out.p1_alt1(sequence.delay);
            }
            BlockPayload::Tinting(tint) => {
                out.p2(tint.start);
                out.p2_alt1(tint.end);
                out.p1(tint.hue);
                out.p1_alt3(tint.saturation);
                out.p1(tint.lightness);
                out.p1_alt2(tint.weight);
            }
            BlockPayload::NameChange(change) => {
                text.encode(change.name.as_deref().unwrap_or_default(), out);
            }
        }
    }
}

/// The registered block encoders, one per supported client type.
#[derive(Clone)]
pub struct ExtendedInfoEncoders {
    encoders: ClientTypeMap<Arc<dyn BlockEncoder>>,
    text: Arc<dyn TextCodec>,
}

impl ExtendedInfoEncoders {
    /// Creates a registry with no client types.
    #[must_use]
    pub fn new(text: Arc<dyn TextCodec>) -> Self {
        Self {
            encoders: ClientTypeMap::new(),
            text,
        }
    }

    /// Registers `encoder` for `client`.
    #[must_use]
    pub fn with_encoder(mut self, client: ClientType, encoder: Arc<dyn BlockEncoder>) -> Self {
        self.encoders.insert(client, encoder);
        self
    }

    /// The encoder for `client`.
    #[inline]
    #[must_use]
    pub fn get(&self, client: ClientType) -> Option<&dyn BlockEncoder> {
        self.encoders.get(client).map(|encoder| &**encoder)
    }

    /// Returns true if `client` has an encoder.
    #[must_use]
    pub fn supports(&self, client: ClientType) -> bool {
        self.encoders.contains(client)
    }

    /// Every client type with an encoder.
    #[must_use]
    pub fn clients(&self) -> ClientTypeSet {
        let mut set = ClientTypeSet::EMPTY;
        for (client, _) in self.encoders.iter() {
            set.insert(client);
        }
        set
    }

    /// The text codec used for string fields.
    #[must_use]
    pub fn text(&self) -> &dyn TextCodec {
        self.text.as_ref()
    }
}

impl Default for ExtendedInfoEncoders {
    /// Desktop clients only, with [`PlainTextCodec`].
    fn default() -> Self {
        Self::new(Arc::new(PlainTextCodec))
            .with_encoder(ClientType::Desktop, Arc::new(DesktopBlockEncoder))
    }
}

impl std::fmt::Debug for ExtendedInfoEncoders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtendedInfoEncoders")
            .field("clients", &self.clients())
            .finish_non_exhaustive()
    }
}
