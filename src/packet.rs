//! The Universal MIDI Packet itself: a group of 1 to 4 words, where the top
//! nibble of the first word decides the type and therefore the length.

use crate::prelude::*;

//Packet length in words, indexed by the type nibble.
//Reserved types also have well-defined lengths, so that unknown packets can
//still be framed and forwarded untouched.
const WORD_COUNT_BY_TYPE: [u8; 16] = [1, 1, 1, 2, 2, 4, 1, 1, 2, 2, 2, 3, 3, 4, 4, 4];

/// The coarse kind of a packet, as encoded in the top nibble of its first word.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketType {
    /// Jitter-reduction timestamps and NOOPs.
    Utility,
    /// System common and system realtime messages.
    System,
    /// MIDI 1.0 channel voice messages carried over UMP.
    Midi1ChannelVoice,
    /// 64-bit data messages, including SysEx7 payload packets.
    Data,
    /// MIDI 2.0 channel voice messages.
    Midi2ChannelVoice,
    /// 128-bit extended data messages, including SysEx8 payload packets.
    ExtendedData,
    /// 128-bit flex data messages.
    FlexData,
    /// Groupless 128-bit UMP stream messages.
    Stream,
    /// A type nibble that the UMP standard has not assigned yet.
    Reserved(u4),
}
impl PacketType {
    /// Get the packet type encoded by a type nibble.
    #[inline]
    pub fn from_code(code: u4) -> PacketType {
        match code.as_int() {
            0x0 => PacketType::Utility,
            0x1 => PacketType::System,
            0x2 => PacketType::Midi1ChannelVoice,
            0x3 => PacketType::Data,
            0x4 => PacketType::Midi2ChannelVoice,
            0x5 => PacketType::ExtendedData,
            0xD => PacketType::FlexData,
            0xF => PacketType::Stream,
            _ => PacketType::Reserved(code),
        }
    }

    /// Get the type nibble that encodes this packet type.
    #[inline]
    pub fn as_code(self) -> u4 {
        u4::new(match self {
            PacketType::Utility => 0x0,
            PacketType::System => 0x1,
            PacketType::Midi1ChannelVoice => 0x2,
            PacketType::Data => 0x3,
            PacketType::Midi2ChannelVoice => 0x4,
            PacketType::ExtendedData => 0x5,
            PacketType::FlexData => 0xD,
            PacketType::Stream => 0xF,
            PacketType::Reserved(code) => return code,
        })
    }

    /// The length of packets of this type, between 1 and 4 words.
    #[inline]
    pub fn word_count(self) -> usize {
        WORD_COUNT_BY_TYPE[self.as_code().as_int() as usize] as usize
    }
}

/// The position of a packet within the message it carries a piece of.
///
/// Messages that fit in one packet are sent as a single `Complete` packet.
/// Anything longer is sent as a `Start` packet, zero or more `Continue`
/// packets and an `End` packet.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PacketFormat {
    /// The whole message is contained in this single packet.
    Complete,
    /// The first packet of a multi-packet message.
    Start,
    /// Neither the first nor the last packet of a multi-packet message.
    Continue,
    /// The last packet of a multi-packet message.
    End,
}
impl PacketFormat {
    /// Get the packet format encoded by a 2-bit format field.
    #[inline]
    pub fn from_code(code: u2) -> PacketFormat {
        match code.as_int() {
            0b00 => PacketFormat::Complete,
            0b01 => PacketFormat::Start,
            0b10 => PacketFormat::Continue,
            _ => PacketFormat::End,
        }
    }

    /// Get the 2-bit field value that encodes this packet format.
    #[inline]
    pub fn as_code(self) -> u2 {
        u2::new(match self {
            PacketFormat::Complete => 0b00,
            PacketFormat::Start => 0b01,
            PacketFormat::Continue => 0b10,
            PacketFormat::End => 0b11,
        })
    }
}

/// A single Universal MIDI Packet, stored as up to 4 big-endian-ordered words.
///
/// The words beyond [`Packet::word_count`] are always zero, so packets can be
/// compared and hashed directly.
///
/// Bytes within a packet are numbered from the most significant byte of the
/// first word down, so byte 0 holds the type nibble and the group, byte 1
/// holds the status, and payload-bearing messages start their payload at some
/// fixed byte offset.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet {
    pub(crate) words: [u32; 4],
}
impl Packet {
    /// Create a packet from its first word, leaving the remaining words zero.
    #[inline]
    pub(crate) const fn from_word0(word: u32) -> Packet {
        Packet {
            words: [word, 0, 0, 0],
        }
    }

    /// Build a packet from the exact words that make it up.
    ///
    /// The slice must contain exactly as many words as the type nibble of its
    /// first word implies, between 1 and 4.
    pub fn from_words(words: &[u32]) -> Result<Packet> {
        let word0 = *words.first().ok_or(err_invalid!("empty word slice"))?;
        let count = PacketType::from_code(u4::from_int_lossy((word0 >> 28) as u8)).word_count();
        ensure!(
            words.len() == count,
            err_invalid!("word slice length does not match the packet type")
        );
        let mut packet = Packet::from_word0(word0);
        packet.words[..count].copy_from_slice(words);
        Ok(packet)
    }

    /// The type of this packet, taken from the top nibble of the first word.
    #[inline]
    pub fn kind(&self) -> PacketType {
        PacketType::from_code(u4::from_int_lossy((self.words[0] >> 28) as u8))
    }

    /// The length of this packet in words, between 1 and 4.
    #[inline]
    pub fn word_count(&self) -> usize {
        self.kind().word_count()
    }

    /// The words of this packet, ready to be sent over the wire.
    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words[..self.word_count()]
    }

    /// The group this packet is addressed to, in the `0..16` range.
    ///
    /// Stream packets carry no group: the bits read here belong to their
    /// format and status fields instead, so asking for the group of a stream
    /// packet panics in debug builds.
    #[inline]
    pub fn group(&self) -> u4 {
        debug_assert!(
            self.kind() != PacketType::Stream,
            "stream packets carry no group"
        );
        u4::from_int_lossy((self.words[0] >> 24) as u8)
    }

    /// Readdress this packet to another group.
    ///
    /// Stream packets carry no group, so readdressing one panics in debug
    /// builds.
    #[inline]
    pub fn set_group(&mut self, group: u4) {
        debug_assert!(
            self.kind() != PacketType::Stream,
            "stream packets carry no group"
        );
        self.words[0] = (self.words[0] & 0xF0FF_FFFF) | ((group.as_int() as u32) << 24);
    }

    /// The status byte of this packet.
    ///
    /// For groupful packets this is the whole second byte. Stream packets use
    /// a wider status that spills into the top byte, which
    /// [`status_10bit`](#method.status_10bit) reads in full.
    #[inline]
    pub fn status(&self) -> u8 {
        self.byte(1)
    }

    //Stream packets encode two format bits and a 10-bit status in their first
    //word. The extra two status bits are reserved-zero today, but comparing
    //all ten keeps reserved statuses from aliasing into known ones.
    #[inline]
    pub(crate) fn status_10bit(&self) -> u16 {
        bit_range(self.words[0], 16..26) as u16
    }

    /// Get one of the 16 numbered bytes of the packet.
    ///
    /// Bytes beyond the packet's own words read as zero.
    #[inline]
    pub fn byte(&self, index: usize) -> u8 {
        let shift = 24 - 8 * (index % 4) as u32;
        bit_range(self.words[index / 4], shift..shift + 8) as u8
    }

    /// Set one of the numbered bytes of the packet, leaving its siblings in
    /// the same word untouched.
    #[inline]
    pub fn set_byte(&mut self, index: usize, byte: u8) {
        debug_assert!(index < self.word_count() * 4);
        let shift = 24 - 8 * (index % 4) as u32;
        let word = &mut self.words[index / 4];
        *word = (*word & !(0xFF << shift)) | ((byte as u32) << shift);
    }

    /// Get one of the numbered bytes of the packet, masked down to 7 bits.
    #[inline]
    pub fn byte_7bit(&self, index: usize) -> u7 {
        u7::from_int_lossy(self.byte(index))
    }

    /// Set one of the numbered bytes of the packet to a 7-bit value, clearing
    /// its top bit.
    #[inline]
    pub fn set_byte_7bit(&mut self, index: usize, byte: u7) {
        self.set_byte(index, byte.as_int());
    }
}
impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Packet[")?;
        for (i, word) in self.words().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:08x}", word)?;
        }
        f.write_str("]")
    }
}

/// Iterate over the packets in a stream of words, framing each packet by the
/// length its type nibble implies.
///
/// Iteration yields an error and stops if the stream ends in the middle of a
/// packet. With the `strict` feature enabled, packets of reserved type are
/// rejected as well instead of flowing through untyped.
#[inline]
pub fn packets(words: &[u32]) -> PacketIter {
    PacketIter { words }
}

/// An iterator over the packets in a word stream, created by [`packets`].
#[derive(Clone, Debug)]
pub struct PacketIter<'a> {
    words: &'a [u32],
}
impl<'a> Iterator for PacketIter<'a> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Result<Packet>> {
        let word0 = *self.words.first()?;
        let kind = PacketType::from_code(u4::from_int_lossy((word0 >> 28) as u8));
        if cfg!(feature = "strict") {
            if let PacketType::Reserved(_) = kind {
                self.words = &[];
                return Some(Err(err_malformed!("reserved packet type").into()));
            }
        }
        let count = kind.word_count();
        if self.words.len() < count {
            self.words = &[];
            return Some(Err(
                err_invalid!("word stream ends in the middle of a packet").into()
            ));
        }
        let (head, rest) = self.words.split_at(count);
        self.words = rest;
        let mut packet = Packet::from_word0(word0);
        packet.words[..count].copy_from_slice(head);
        Some(Ok(packet))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        //Each packet takes between 1 and 4 words
        ((self.words.len() + 3) / 4, Some(self.words.len()))
    }
}
