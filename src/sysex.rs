//! Complete system exclusive messages, as carried over runs of data packets,
//! plus the universal identity reply that answers device discovery.
//!
//! The structs here borrow their payload from a collector's buffer or from
//! caller-owned data; nothing in this module allocates.

use crate::{
    data::{make_sysex7_packet, make_sysex8_packet, SYSEX7_PACKET_CAPACITY, SYSEX8_PACKET_CAPACITY},
    packet::{Packet, PacketFormat},
    prelude::*,
    stream::DeviceIdentity,
};

/// Sub-IDs used by universal system exclusive messages.
pub mod universal_sysex {
    /// The general information category of universal non-realtime messages.
    pub const GENERAL_INFORMATION: u8 = 0x06;
    /// Asks a device to identify itself.
    pub const IDENTITY_REQUEST: u8 = 0x01;
    /// The answer to an identity request.
    pub const IDENTITY_REPLY: u8 = 0x02;
}

/// A system exclusive manufacturer ID.
///
/// The MIDI association hands out two kinds of IDs: classic single-byte IDs,
/// stored here as `id << 16`, and extended three-byte IDs, sent on the wire
/// as a zero byte followed by two 7-bit bytes and stored here as the two
/// bytes packed into the low half. The value zero stands for no ID at all,
/// which SysEx8 messages are allowed to omit.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Manufacturer(u32);
impl Manufacturer {
    /// The ID reserved for messages defined by the standard itself, outside
    /// of realtime contexts. Identity requests and replies live under it.
    pub const UNIVERSAL_NON_REALTIME: Manufacturer = Manufacturer(0x7E0000);
    /// The ID reserved for standard-defined realtime messages.
    pub const UNIVERSAL_REALTIME: Manufacturer = Manufacturer(0x7F0000);
    /// The ID reserved for development and educational use.
    pub const DEVELOPMENT: Manufacturer = Manufacturer(0x7D0000);

    /// Create a manufacturer ID from its packed integer form, masking off
    /// the top bit of each byte.
    #[inline]
    pub const fn new(raw: u32) -> Manufacturer {
        Manufacturer(raw & 0x007F_7F7F)
    }

    /// The ID of a manufacturer with a classic single-byte ID.
    #[inline]
    pub fn from_byte(id: u7) -> Manufacturer {
        Manufacturer((id.as_int() as u32) << 16)
    }

    /// The ID of a manufacturer with an extended three-byte ID, taking the
    /// two bytes that follow the zero byte on the wire.
    #[inline]
    pub fn from_bytes(hi: u7, lo: u7) -> Manufacturer {
        Manufacturer(((hi.as_int() as u32) << 8) | lo.as_int() as u32)
    }

    /// Get the packed integer form of the ID.
    #[inline]
    pub fn as_int(self) -> u32 {
        self.0
    }

    /// Whether this is a classic single-byte ID.
    #[inline]
    pub fn is_single_byte(self) -> bool {
        self.0 >= 0x10000
    }

    /// Whether this is an extended three-byte ID. The empty ID counts as
    /// three-byte, matching how it would be sent.
    #[inline]
    pub fn is_three_byte(self) -> bool {
        self.0 < 0x10000
    }
}
impl fmt::Debug for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Manufacturer({:#08x})", self.0)
    }
}

/// A complete system exclusive message with a 7-bit payload, the kind that
/// can cross over to a classic MIDI 1.0 cable.
///
/// The `F0`/`F7` framing bytes and the manufacturer prefix are not part of
/// `data`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Sysex7<'a> {
    /// Who the message belongs to, or the zero ID when unknown.
    pub manufacturer: Manufacturer,
    /// The payload after the manufacturer ID.
    pub data: &'a [u7],
}
impl<'a> Sysex7<'a> {
    /// Whether this message is a universal identity request, which an
    /// [`IdentityReply`] should answer.
    pub fn is_identity_request(&self) -> bool {
        self.manufacturer == Manufacturer::UNIVERSAL_NON_REALTIME
            && self.data.len() >= 3
            && self.data[1] == universal_sysex::GENERAL_INFORMATION
            && self.data[2] == universal_sysex::IDENTITY_REQUEST
    }
}

/// A complete system exclusive message with an 8-bit payload, native to
/// MIDI 2.0.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct Sysex8<'a> {
    /// Who the message belongs to, or the zero ID when omitted.
    pub manufacturer: Manufacturer,
    /// The stream the message was carried on.
    pub stream_id: u8,
    /// The payload after the manufacturer ID.
    pub data: &'a [u8],
}

/// Send a SysEx7 message as a run of data packets on the given group.
///
/// The manufacturer ID is put back in front of the payload: one byte for
/// classic IDs, a zero byte plus two bytes for extended IDs.
pub fn send_sysex7(sysex: &Sysex7, group: u4, mut sender: impl FnMut(Packet)) {
    let mut head = [u7::new(0); 3];
    let head: &[u7] = {
        let id = sysex.manufacturer.as_int();
        if sysex.manufacturer.is_single_byte() {
            head[0] = u7::from_int_lossy((id >> 16) as u8);
            &head[..1]
        } else {
            head[1] = u7::from_int_lossy((id >> 8) as u8);
            head[2] = u7::from_int_lossy(id as u8);
            &head[..3]
        }
    };
    let total = head.len() + sysex.data.len();
    let mut first = [u7::new(0); SYSEX7_PACKET_CAPACITY];
    first[..head.len()].copy_from_slice(head);
    if total <= SYSEX7_PACKET_CAPACITY {
        first[head.len()..total].copy_from_slice(sysex.data);
        sender(make_sysex7_packet(
            PacketFormat::Complete,
            group,
            &first[..total],
        ));
    } else {
        let take = SYSEX7_PACKET_CAPACITY - head.len();
        first[head.len()..].copy_from_slice(&sysex.data[..take]);
        sender(make_sysex7_packet(PacketFormat::Start, group, &first));
        let mut rest = &sysex.data[take..];
        while rest.len() > SYSEX7_PACKET_CAPACITY {
            sender(make_sysex7_packet(
                PacketFormat::Continue,
                group,
                &rest[..SYSEX7_PACKET_CAPACITY],
            ));
            rest = &rest[SYSEX7_PACKET_CAPACITY..];
        }
        sender(make_sysex7_packet(PacketFormat::End, group, rest));
    }
}

/// Send a SysEx8 message as a run of extended data packets on the given
/// group.
///
/// Classic manufacturer IDs are sent as a single byte with the top bit set,
/// extended IDs as a zero byte plus two bytes. The zero ID is sent as no
/// bytes at all, leaving the whole message to the payload.
pub fn send_sysex8(sysex: &Sysex8, group: u4, mut sender: impl FnMut(Packet)) {
    let mut head = [0; 3];
    let head: &[u8] = {
        let id = sysex.manufacturer.as_int();
        if id == 0 {
            &[]
        } else if sysex.manufacturer.is_single_byte() {
            head[0] = 0x80 | (id >> 16) as u8;
            &head[..1]
        } else {
            head[1] = (id >> 8) as u8;
            head[2] = id as u8;
            &head[..3]
        }
    };
    let total = head.len() + sysex.data.len();
    let mut first = [0; SYSEX8_PACKET_CAPACITY];
    first[..head.len()].copy_from_slice(head);
    if total <= SYSEX8_PACKET_CAPACITY {
        first[head.len()..total].copy_from_slice(sysex.data);
        sender(make_sysex8_packet(
            PacketFormat::Complete,
            group,
            sysex.stream_id,
            &first[..total],
        ));
    } else {
        let take = SYSEX8_PACKET_CAPACITY - head.len();
        first[head.len()..].copy_from_slice(&sysex.data[..take]);
        sender(make_sysex8_packet(
            PacketFormat::Start,
            group,
            sysex.stream_id,
            &first,
        ));
        let mut rest = &sysex.data[take..];
        while rest.len() > SYSEX8_PACKET_CAPACITY {
            sender(make_sysex8_packet(
                PacketFormat::Continue,
                group,
                sysex.stream_id,
                &rest[..SYSEX8_PACKET_CAPACITY],
            ));
            rest = &rest[SYSEX8_PACKET_CAPACITY..];
        }
        sender(make_sysex8_packet(
            PacketFormat::End,
            group,
            sysex.stream_id,
            rest,
        ));
    }
}

/// The payload of a universal identity reply, the message a device answers
/// an identity request with.
///
/// The reply is an ordinary universal non-realtime SysEx7;
/// [`as_sysex7`](IdentityReply::as_sysex7) packages it for [`send_sysex7`].
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub struct IdentityReply {
    data: [u7; 14],
    len: usize,
}
impl IdentityReply {
    /// Build an identity reply for the given device.
    ///
    /// Classic manufacturer IDs take one byte on the wire and extended IDs
    /// take three, so the reply is 12 or 14 bytes long. Devices that answer
    /// regardless of the requested target use `0x7F` as their device ID.
    pub fn new(
        manufacturer: Manufacturer,
        family: u14,
        model: u14,
        revision: u28,
        device_id: u7,
    ) -> IdentityReply {
        let mut data = [u7::new(0); 14];
        let mut len = 0;
        {
            let mut push = |byte: u8| {
                data[len] = u7::from_int_lossy(byte);
                len += 1;
            };
            let id = manufacturer.as_int();
            push(device_id.as_int());
            push(universal_sysex::GENERAL_INFORMATION);
            push(universal_sysex::IDENTITY_REPLY);
            if manufacturer.is_single_byte() {
                push((id >> 16) as u8);
            } else {
                push(0x00);
                push((id >> 8) as u8);
                push(id as u8);
            }
            //14-bit and 28-bit fields go out as 7-bit bytes, least
            //significant first
            push(family.as_int() as u8);
            push((family.as_int() >> 7) as u8);
            push(model.as_int() as u8);
            push((model.as_int() >> 7) as u8);
            push(revision.as_int() as u8);
            push((revision.as_int() >> 7) as u8);
            push((revision.as_int() >> 14) as u8);
            push((revision.as_int() >> 21) as u8);
        }
        IdentityReply { data, len }
    }

    /// Build an identity reply from the same [`DeviceIdentity`] that feeds
    /// the device identity stream notification.
    pub fn from_identity(identity: &DeviceIdentity, device_id: u7) -> IdentityReply {
        IdentityReply::new(
            identity.manufacturer,
            identity.family,
            identity.model,
            identity.revision,
            device_id,
        )
    }

    /// The bytes of the reply, from the device ID through the revision.
    #[inline]
    pub fn data(&self) -> &[u7] {
        &self.data[..self.len]
    }

    /// Package the reply as a SysEx7 message, ready to send.
    #[inline]
    pub fn as_sysex7(&self) -> Sysex7 {
        Sysex7 {
            manufacturer: Manufacturer::UNIVERSAL_NON_REALTIME,
            data: self.data(),
        }
    }
}
