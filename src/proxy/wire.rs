//! Recipe wire format: length-prefixed binary datagrams (spec §6).
//!
//! ```text
//! msgType : u8            (1 = RECIPE_REQ, 2 = RECIPE_REP)
//! keyLen  : u16 big-endian
//! key     : keyLen bytes, UTF-8
//! cachedBlocks : u16 big-endian  (only present when msgType = RECIPE_REP)
//! ```
//!
//! A hand-rolled codec rather than a generic serializer: the spec
//! fixes this exact byte layout, which a length-prefixed manual
//! parser expresses more directly than a derive-based format would.

const MSG_TYPE_RECIPE_REQ: u8 = 1;
const MSG_TYPE_RECIPE_REP: u8 = 2;

/// Maximum key length accepted; guards against a malformed `keyLen`
/// causing an unbounded read. Comfortably larger than any realistic
/// object key.
const MAX_KEY_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    RecipeReq { key: String },
    RecipeRep { key: String, cached_blocks: u16 },
}

impl Message {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::RecipeReq { key } => {
                let key_bytes = key.as_bytes();
                let mut buf = Vec::with_capacity(3 + key_bytes.len());
                buf.push(MSG_TYPE_RECIPE_REQ);
                buf.extend_from_slice(&(key_bytes.len() as u16).to_be_bytes());
                buf.extend_from_slice(key_bytes);
                buf
            }
            Message::RecipeRep { key, cached_blocks } => {
                let key_bytes = key.as_bytes();
                let mut buf = Vec::with_capacity(5 + key_bytes.len());
                buf.push(MSG_TYPE_RECIPE_REP);
                buf.extend_from_slice(&(key_bytes.len() as u16).to_be_bytes());
                buf.extend_from_slice(key_bytes);
                buf.extend_from_slice(&cached_blocks.to_be_bytes());
                buf
            }
        }
    }

    /// Parse a datagram. Returns `None` on any malformed input
    /// (unknown `msgType`, truncated buffer, non-UTF-8 key, or a
    /// `keyLen` exceeding [`MAX_KEY_LEN`]) — spec §4.2: "malformed
    /// request... result in silent drop".
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let (&msg_type, rest) = buf.split_first()?;
        let (len_bytes, rest) = rest.split_at_checked(2)?;
        let key_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if key_len > MAX_KEY_LEN {
            return None;
        }
        let (key_bytes, rest) = rest.split_at_checked(key_len)?;
        let key = std::str::from_utf8(key_bytes).ok()?.to_string();

        match msg_type {
            MSG_TYPE_RECIPE_REQ => Some(Message::RecipeReq { key }),
            MSG_TYPE_RECIPE_REP => {
                let cached_bytes = rest.get(0..2)?;
                let cached_blocks = u16::from_be_bytes([cached_bytes[0], cached_bytes[1]]);
                Some(Message::RecipeRep { key, cached_blocks })
            }
            _ => None,
        }
    }
}
