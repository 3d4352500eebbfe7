//! Fixed-width key encoding.
//!
//! Composite keys are the plain concatenation of their parts, so a
//! prefix of the encoding selects every row sharing the leading parts.

use alloy_primitives::FixedBytes;

pub trait TableKey: Sized {
    /// Encoded length in bytes.
    const WIDTH: usize;

    fn encode(&self) -> Vec<u8>;

    /// `None` when `bytes` is not exactly `WIDTH` long.
    fn decode(bytes: &[u8]) -> Option<Self>;
}

impl<const N: usize> TableKey for FixedBytes<N> {
    const WIDTH: usize = N;

    fn encode(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        let array: [u8; N] = bytes.try_into().ok()?;
        Some(FixedBytes(array))
    }
}

impl<A: TableKey, B: TableKey> TableKey for (A, B) {
    const WIDTH: usize = A::WIDTH + B::WIDTH;

    fn encode(&self) -> Vec<u8> {
        let mut out = self.0.encode();
        out.extend(self.1.encode());
        out
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::WIDTH {
            return None;
        }
        let (a, b) = bytes.split_at(A::WIDTH);
        Some((A::decode(a)?, B::decode(b)?))
    }
}

impl<A: TableKey, B: TableKey, C: TableKey> TableKey for (A, B, C) {
    const WIDTH: usize = A::WIDTH + B::WIDTH + C::WIDTH;

    fn encode(&self) -> Vec<u8> {
        let mut out = self.0.encode();
        out.extend(self.1.encode());
        out.extend(self.2.encode());
        out
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::WIDTH {
            return None;
        }
        let (a, rest) = bytes.split_at(A::WIDTH);
        let (b, c) = rest.split_at(B::WIDTH);
        Some((A::decode(a)?, B::decode(b)?, C::decode(c)?))
    }
}
