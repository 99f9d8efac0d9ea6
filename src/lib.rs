//! # Overview
//!
//! `umply` is a Universal MIDI Packet (UMP) codec: it frames raw 32-bit words
//! into packets, gives typed views into MIDI 2.0 stream messages, reassembles
//! multi-packet system exclusive and text payloads, and builds the packets
//! and replies an endpoint sends back during discovery.
//!
//! Usage is as simple as:
//!
//! ```rust
//! use umply::{packets, Sysex7Collector};
//!
//! // Two words straight off the wire: one complete SysEx7 message
//! let words = [0x3004_4101, 0x0203_0000];
//!
//! let mut collector = Sysex7Collector::new();
//! for packet in packets(&words) {
//!     collector.feed(&packet.unwrap(), |msg| {
//!         println!("sysex from {:?}: {} data bytes", msg.manufacturer, msg.data.len());
//!     });
//! }
//! ```
//!
//! The [`Packet`](struct.Packet.html) struct is the central type in the
//! crate: everything else either produces packets or consumes them.
//!
//! # Sending multi-packet messages
//!
//! Outgoing messages that span several packets are chunked through a closure,
//! one packet at a time, so they can be written straight to the wire without
//! gathering them first:
//!
//! ```rust
//! use umply::num::{u14, u28, u4, u7};
//! use umply::{send_sysex7, IdentityReply, Manufacturer};
//!
//! let reply = IdentityReply::new(
//!     Manufacturer::from_byte(u7::new(0x41)),
//!     u14::new(0x0102),
//!     u14::new(0x0304),
//!     u28::new(0x0000_0001),
//!     u7::new(0),
//! );
//!
//! let mut sent = Vec::new();
//! send_sysex7(&reply.as_sysex7(), u4::new(0), |packet| sent.push(packet));
//! assert_eq!(sent.len(), 3);
//! ```
//!
//! The same pattern covers endpoint names, product instance IDs and function
//! block names through the senders in the [`stream`](stream/index.html)
//! module, and the collectors in [`collector`](collector/index.html) undo the
//! chunking on the receiving side.
//!
//! # About features
//!
//! The mode in which the crate works is configurable through the use of cargo
//! features. The `std` and `alloc` features are enabled by default.
//!
//! - The `std` feature
//!
//!   This feature implements `std::error::Error` for the crate error type.
//!
//!   Disabling this feature with `default-features = false` will make the
//!   crate `no_std + alloc`.
//!
//! - The `alloc` feature
//!
//!   This feature lets the collectors grow their default buffers on demand,
//!   and implements the buffer trait for `Vec<u8>`. Without it the default
//!   buffer is a fixed 1KB stack buffer, and larger buffers can be defined
//!   with the [`stack_buffer!`](macro.stack_buffer.html) macro.
//!
//! - The `strict` feature
//!
//!   By default packet framing plows through words with a reserved packet
//!   type, passing them along with their defaulted lengths. By enabling the
//!   `strict` feature the framer will instead reject them with errors of the
//!   kind `ErrorKind::Malformed`.
//!
//! - The `defmt` feature
//!
//!   This feature derives `defmt::Format` for packets and the other value
//!   types in the crate, so they can be logged from embedded targets.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

macro_rules! bail {
    ($err:expr) => {{
        return Err($err.into());
    }};
}
macro_rules! ensure {
    ($cond:expr, $err:expr) => {{
        if !$cond {
            bail!($err)
        }
    }};
}

/// All of the errors this crate produces.
#[macro_use]
mod error;

mod prelude {
    pub(crate) use crate::{
        error::{ErrorKind, Result, StdResult},
        primitive::{u14, u2, u28, u4, u7},
    };
    #[cfg(feature = "alloc")]
    pub(crate) use alloc::vec::Vec;
    pub(crate) use core::{fmt, ops};

    pub(crate) fn bit_range<T>(val: T, range: ops::Range<u32>) -> T
    where
        T: From<u8>
            + ops::Shr<u32, Output = T>
            + ops::Shl<u32, Output = T>
            + ops::Not<Output = T>
            + ops::BitAnd<Output = T>,
    {
        let mask = !((!T::from(0)) << (range.end - range.start));
        (val >> range.start) & mask
    }
}

pub mod collector;
mod data;
mod packet;
mod primitive;
pub mod stream;
mod sysex;

pub use crate::{
    collector::{StreamText, StreamTextCollector, Sysex7Collector, Sysex8Collector},
    data::{
        is_sysex7, is_sysex8, make_sysex7_packet, make_sysex8_packet, Sysex7View, Sysex8View,
        SYSEX7_PACKET_CAPACITY, SYSEX8_PACKET_CAPACITY,
    },
    error::{Error, ErrorKind, Result},
    packet::{packets, Packet, PacketFormat, PacketIter, PacketType},
    sysex::{send_sysex7, send_sysex8, IdentityReply, Manufacturer, Sysex7, Sysex8},
};

/// Exotically-sized integers used by the Universal MIDI Packet format.
pub mod num {
    pub use crate::primitive::{u14, u2, u28, u4, u7};
}

#[cfg(test)]
mod test;
