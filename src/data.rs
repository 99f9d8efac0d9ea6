//! Data messages: the 64-bit and 128-bit packets that carry system exclusive
//! payloads, 6 or 13 bytes at a time.
//!
//! A system exclusive message of arbitrary length travels over UMP as a run
//! of data packets, each tagged with a [`PacketFormat`] that marks its place
//! in the run. These packets carry neither the `F0`/`F7` framing bytes nor
//! the manufacturer ID prefix conventions of the MIDI 1.0 byte stream; both
//! are reconstructed by the collectors in the [`collector`](crate::collector)
//! module.

use crate::{
    packet::{Packet, PacketFormat, PacketType},
    prelude::*,
};

/// The maximum number of payload bytes in a single SysEx7 packet.
pub const SYSEX7_PACKET_CAPACITY: usize = 6;

/// The maximum number of payload bytes in a single SysEx8 packet.
pub const SYSEX8_PACKET_CAPACITY: usize = 13;

/// Check whether a packet is a well-formed SysEx7 payload packet.
///
/// Data packets with a reserved status or an oversized payload count are not
/// considered SysEx7.
#[inline]
pub fn is_sysex7(packet: &Packet) -> bool {
    packet.kind() == PacketType::Data
        && packet.status() & 0xF0 <= 0x30
        && packet.status() & 0x0F <= SYSEX7_PACKET_CAPACITY as u8
}

/// Check whether a packet is a well-formed SysEx8 payload packet.
///
/// The payload byte count of a SysEx8 packet includes the stream ID byte, so
/// a zero count is malformed. Counts above 14 and the mixed data set statuses
/// are rejected as well.
#[inline]
pub fn is_sysex8(packet: &Packet) -> bool {
    let size = packet.status() & 0x0F;
    packet.kind() == PacketType::ExtendedData
        && packet.status() & 0xF0 <= 0x30
        && size >= 1
        && size <= (SYSEX8_PACKET_CAPACITY + 1) as u8
}

/// A read-only view over a SysEx7 payload packet.
#[derive(Copy, Clone, Debug)]
pub struct Sysex7View<'a> {
    packet: &'a Packet,
}
impl<'a> Sysex7View<'a> {
    /// View a packet as a SysEx7 payload packet, if it is one.
    #[inline]
    pub fn new(packet: &Packet) -> Option<Sysex7View> {
        if is_sysex7(packet) {
            Some(Sysex7View { packet })
        } else {
            None
        }
    }

    /// The group this packet is addressed to.
    #[inline]
    pub fn group(&self) -> u4 {
        self.packet.group()
    }

    /// The place of this packet within its message.
    #[inline]
    pub fn format(&self) -> PacketFormat {
        PacketFormat::from_code(u2::from_int_lossy(self.packet.status() >> 4))
    }

    /// The number of payload bytes in this packet, in the `0..=6` range.
    #[inline]
    pub fn payload_size(&self) -> usize {
        (self.packet.status() & 0x0F) as usize
    }

    /// Get one of the payload bytes of this packet.
    #[inline]
    pub fn payload_byte(&self, index: usize) -> u7 {
        self.packet.byte_7bit(2 + index)
    }
}

/// A read-only view over a SysEx8 payload packet.
#[derive(Copy, Clone, Debug)]
pub struct Sysex8View<'a> {
    packet: &'a Packet,
}
impl<'a> Sysex8View<'a> {
    /// View a packet as a SysEx8 payload packet, if it is one.
    #[inline]
    pub fn new(packet: &Packet) -> Option<Sysex8View> {
        if is_sysex8(packet) {
            Some(Sysex8View { packet })
        } else {
            None
        }
    }

    /// The group this packet is addressed to.
    #[inline]
    pub fn group(&self) -> u4 {
        self.packet.group()
    }

    /// The place of this packet within its message.
    #[inline]
    pub fn format(&self) -> PacketFormat {
        PacketFormat::from_code(u2::from_int_lossy(self.packet.status() >> 4))
    }

    /// The stream this packet belongs to.
    ///
    /// Stream IDs allow several SysEx8 messages to be in flight over the same
    /// group at once, with their packets interleaved.
    #[inline]
    pub fn stream_id(&self) -> u8 {
        self.packet.byte(2)
    }

    /// The number of payload bytes in this packet, in the `0..=13` range.
    ///
    /// The on-wire byte count also covers the stream ID byte; this method
    /// already discounts it.
    #[inline]
    pub fn payload_size(&self) -> usize {
        ((self.packet.status() & 0x0F) - 1) as usize
    }

    /// Get one of the payload bytes of this packet.
    #[inline]
    pub fn payload_byte(&self, index: usize) -> u8 {
        self.packet.byte(3 + index)
    }
}

/// Create a SysEx7 payload packet carrying up to 6 bytes of payload.
///
/// # Panics
///
/// Panics if the payload does not fit in a single packet.
pub fn make_sysex7_packet(format: PacketFormat, group: u4, payload: &[u7]) -> Packet {
    assert!(
        payload.len() <= SYSEX7_PACKET_CAPACITY,
        "sysex7 packets carry at most 6 payload bytes"
    );
    let status = (format.as_code().as_int() << 4) | payload.len() as u8;
    let mut packet = Packet::from_word0(
        0x3000_0000 | ((group.as_int() as u32) << 24) | ((status as u32) << 16),
    );
    for (i, &byte) in payload.iter().enumerate() {
        packet.set_byte_7bit(2 + i, byte);
    }
    packet
}

/// Create a SysEx8 payload packet carrying up to 13 bytes of payload on the
/// given stream.
///
/// # Panics
///
/// Panics if the payload does not fit in a single packet.
pub fn make_sysex8_packet(format: PacketFormat, group: u4, stream_id: u8, payload: &[u8]) -> Packet {
    assert!(
        payload.len() <= SYSEX8_PACKET_CAPACITY,
        "sysex8 packets carry at most 13 payload bytes"
    );
    //The on-wire byte count includes the stream ID byte
    let status = (format.as_code().as_int() << 4) | (payload.len() + 1) as u8;
    let mut packet = Packet::from_word0(
        0x5000_0000 | ((group.as_int() as u32) << 24) | ((status as u32) << 16),
    );
    packet.set_byte(2, stream_id);
    for (i, &byte) in payload.iter().enumerate() {
        packet.set_byte(3 + i, byte);
    }
    packet
}
