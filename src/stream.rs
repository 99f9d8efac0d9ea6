//! UMP stream messages: the groupless 128-bit packets that describe a MIDI
//! endpoint, negotiate its protocol and enumerate its function blocks.
//!
//! Each kind of stream message gets a read-only view type with a checked
//! [`new`](EndpointDiscoveryView::new) constructor and a `make_*` function
//! that builds the packet. Names longer than a single packet travel as a run
//! of packets, produced by the `send_*` functions and reassembled by
//! [`StreamTextCollector`](crate::collector::StreamTextCollector).

use crate::{
    packet::{Packet, PacketFormat, PacketType},
    prelude::*,
    sysex::Manufacturer,
};

/// The major version of the UMP standard that this crate implements.
pub const UMP_VERSION_MAJOR: u8 = 1;
/// The minor version of the UMP standard that this crate implements.
pub const UMP_VERSION_MINOR: u8 = 1;

/// The maximum number of name bytes carried by one endpoint name packet.
pub const ENDPOINT_NAME_CAPACITY: usize = 14;
/// The maximum number of ID bytes carried by one product instance ID packet.
pub const PRODUCT_INSTANCE_ID_CAPACITY: usize = 14;
/// The longest product instance ID allowed on the wire.
pub const MAX_PRODUCT_INSTANCE_ID_LENGTH: usize = 16;
/// The maximum number of name bytes carried by one function block name packet.
pub const FUNCTION_BLOCK_NAME_CAPACITY: usize = 13;

/// The 10-bit status codes of UMP stream messages.
pub mod stream_status {
    pub const ENDPOINT_DISCOVERY: u16 = 0x00;
    pub const ENDPOINT_INFO: u16 = 0x01;
    pub const DEVICE_IDENTITY: u16 = 0x02;
    pub const ENDPOINT_NAME: u16 = 0x03;
    pub const PRODUCT_INSTANCE_ID: u16 = 0x04;
    pub const STREAM_CONFIGURATION_REQUEST: u16 = 0x05;
    pub const STREAM_CONFIGURATION_NOTIFY: u16 = 0x06;
    pub const FUNCTION_BLOCK_DISCOVERY: u16 = 0x10;
    pub const FUNCTION_BLOCK_INFO: u16 = 0x11;
    pub const FUNCTION_BLOCK_NAME: u16 = 0x12;
}

/// Bit flags selecting what a discovery message asks the other end to send.
pub mod discovery_filter {
    //Endpoint discovery flags
    pub const ENDPOINT_INFO: u8 = 0b00001;
    pub const DEVICE_IDENTITY: u8 = 0b00010;
    pub const ENDPOINT_NAME: u8 = 0b00100;
    pub const PRODUCT_INSTANCE_ID: u8 = 0b01000;
    pub const STREAM_CONFIGURATION: u8 = 0b10000;
    pub const ENDPOINT_ALL: u8 = 0b11111;

    //Function block discovery flags
    pub const FUNCTION_BLOCK_INFO: u8 = 0b01;
    pub const FUNCTION_BLOCK_NAME: u8 = 0b10;
    pub const FUNCTION_BLOCK_ALL: u8 = 0b11;
}

/// Protocol numbers, as carried by stream configuration messages.
pub mod protocol {
    /// The MIDI 1.0 protocol, carried over UMP.
    pub const MIDI1: u8 = 0x01;
    /// The MIDI 2.0 protocol.
    pub const MIDI2: u8 = 0x02;
}

/// Check whether a packet is a UMP stream message of any status.
#[inline]
pub fn is_stream_message(packet: &Packet) -> bool {
    packet.kind() == PacketType::Stream
}

/// Create an empty stream message with the given status and format.
///
/// The status is masked down to the 10-bit field. Prefer the specific
/// `make_*` functions for the statuses this crate knows about.
#[inline]
pub fn make_stream_message(status: u16, format: PacketFormat) -> Packet {
    Packet::from_word0(
        0xF000_0000
            | ((format.as_code().as_int() as u32) << 26)
            | (((status & 0x3FF) as u32) << 16),
    )
}

macro_rules! stream_view {
    {$(#[$attr:meta])* $name:ident => $($status:expr),+} => {
        $(#[$attr])*
        #[derive(Copy, Clone, Debug)]
        pub struct $name<'a> {
            packet: &'a Packet,
        }
        impl<'a> $name<'a> {
            /// View a packet as this kind of stream message, if it is one.
            #[inline]
            pub fn new(packet: &Packet) -> Option<$name> {
                if is_stream_message(packet)
                    && [$($status),+].contains(&packet.status_10bit())
                {
                    Some($name { packet })
                } else {
                    None
                }
            }
        }
    };
}

stream_view! {
    /// A request for the endpoint at the other end to describe itself.
    EndpointDiscoveryView => stream_status::ENDPOINT_DISCOVERY
}
impl<'a> EndpointDiscoveryView<'a> {
    /// The highest UMP version the sender supports, as `major << 8 | minor`.
    #[inline]
    pub fn ump_version(&self) -> u16 {
        (self.packet.words[0] & 0xFFFF) as u16
    }

    #[inline]
    pub fn ump_version_major(&self) -> u8 {
        self.packet.byte(2)
    }

    #[inline]
    pub fn ump_version_minor(&self) -> u8 {
        self.packet.byte(3)
    }

    /// The raw filter bitmap of [`discovery_filter`] flags.
    #[inline]
    pub fn filter(&self) -> u8 {
        (self.packet.words[1] & 0b11111) as u8
    }

    #[inline]
    pub fn requests_info(&self) -> bool {
        self.filter() & discovery_filter::ENDPOINT_INFO != 0
    }

    #[inline]
    pub fn requests_device_identity(&self) -> bool {
        self.filter() & discovery_filter::DEVICE_IDENTITY != 0
    }

    #[inline]
    pub fn requests_name(&self) -> bool {
        self.filter() & discovery_filter::ENDPOINT_NAME != 0
    }

    #[inline]
    pub fn requests_product_instance_id(&self) -> bool {
        self.filter() & discovery_filter::PRODUCT_INSTANCE_ID != 0
    }

    #[inline]
    pub fn requests_stream_configuration(&self) -> bool {
        self.filter() & discovery_filter::STREAM_CONFIGURATION != 0
    }
}

stream_view! {
    /// A description of an endpoint: how many function blocks it has and
    /// which protocols it speaks.
    EndpointInfoView => stream_status::ENDPOINT_INFO
}
impl<'a> EndpointInfoView<'a> {
    /// The UMP version the endpoint implements, as `major << 8 | minor`.
    #[inline]
    pub fn ump_version(&self) -> u16 {
        (self.packet.words[0] & 0xFFFF) as u16
    }

    #[inline]
    pub fn ump_version_major(&self) -> u8 {
        self.packet.byte(2)
    }

    #[inline]
    pub fn ump_version_minor(&self) -> u8 {
        self.packet.byte(3)
    }

    /// How many function blocks the endpoint has.
    #[inline]
    pub fn num_function_blocks(&self) -> u7 {
        self.packet.byte_7bit(4)
    }

    /// Whether the function block layout is fixed for the lifetime of the
    /// endpoint.
    #[inline]
    pub fn static_function_blocks(&self) -> bool {
        self.packet.byte(4) & 0x80 != 0
    }

    /// A bitmap of the protocols the endpoint supports, with bit 0 standing
    /// for MIDI 1.0 and bit 1 for MIDI 2.0.
    #[inline]
    pub fn protocols(&self) -> u8 {
        self.packet.byte(6) & 0b11
    }

    /// A bitmap of the jitter reduction timestamp extensions the endpoint
    /// supports, transmit in bit 0 and receive in bit 1.
    #[inline]
    pub fn extensions(&self) -> u8 {
        self.packet.byte(7) & 0b11
    }
}

/// The identity of a device: who makes it, which model it is and which
/// revision of it is running.
///
/// This is the same information a device reports through the universal
/// system exclusive identity reply, repackaged into a stream message.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceIdentity {
    pub manufacturer: Manufacturer,
    pub family: u14,
    pub model: u14,
    pub revision: u28,
}

stream_view! {
    /// A device identity notification.
    DeviceIdentityView => stream_status::DEVICE_IDENTITY
}
impl<'a> DeviceIdentityView<'a> {
    /// Unpack the identity carried by this message.
    pub fn identity(&self) -> DeviceIdentity {
        let w1 = self.packet.words[1];
        let w2 = self.packet.words[2];
        let w3 = self.packet.words[3];
        DeviceIdentity {
            manufacturer: Manufacturer::new(w1 & 0x007F_7F7F),
            family: u14::from_int_lossy((((w2 >> 24) & 0x7F) | ((w2 >> 9) & 0x3F80)) as u16),
            model: u14::from_int_lossy((((w2 >> 8) & 0x7F) | ((w2 << 7) & 0x3F80)) as u16),
            revision: u28::from_int_lossy(
                ((w3 >> 24) & 0x7F)
                    | ((w3 >> 9) & 0x3F80)
                    | ((w3 << 6) & 0x001F_C000)
                    | ((w3 << 21) & 0x0FE0_0000),
            ),
        }
    }
}

stream_view! {
    /// One packet of an endpoint name notification.
    EndpointNameView => stream_status::ENDPOINT_NAME
}
impl<'a> EndpointNameView<'a> {
    /// The place of this packet within the whole name.
    #[inline]
    pub fn format(&self) -> PacketFormat {
        stream_format(self.packet)
    }

    /// The name bytes carried by this packet.
    #[inline]
    pub fn payload(&self) -> PayloadBytes<'a> {
        PayloadBytes {
            packet: self.packet,
            index: 2,
        }
    }
}

stream_view! {
    /// One packet of a product instance ID notification.
    ProductInstanceIdView => stream_status::PRODUCT_INSTANCE_ID
}
impl<'a> ProductInstanceIdView<'a> {
    /// The place of this packet within the whole ID.
    #[inline]
    pub fn format(&self) -> PacketFormat {
        stream_format(self.packet)
    }

    /// The ID bytes carried by this packet.
    #[inline]
    pub fn payload(&self) -> PayloadBytes<'a> {
        PayloadBytes {
            packet: self.packet,
            index: 2,
        }
    }
}

stream_view! {
    /// A request to switch protocols, or the notification that answers it.
    StreamConfigurationView => stream_status::STREAM_CONFIGURATION_REQUEST,
        stream_status::STREAM_CONFIGURATION_NOTIFY
}
impl<'a> StreamConfigurationView<'a> {
    /// The protocol in use, one of the [`protocol`] constants.
    #[inline]
    pub fn protocol(&self) -> u8 {
        self.packet.byte(2) & 0b11
    }

    /// The jitter reduction timestamp bitmap, transmit in bit 0 and receive
    /// in bit 1.
    #[inline]
    pub fn extensions(&self) -> u8 {
        self.packet.byte(3) & 0b11
    }
}

stream_view! {
    /// A request for information about one function block, or all of them.
    FunctionBlockDiscoveryView => stream_status::FUNCTION_BLOCK_DISCOVERY
}
impl<'a> FunctionBlockDiscoveryView<'a> {
    /// The number of the function block being asked about, or `0xFF` to ask
    /// about all of them.
    #[inline]
    pub fn function_block(&self) -> u8 {
        self.packet.byte(2)
    }

    /// The raw filter bitmap of [`discovery_filter`] flags.
    #[inline]
    pub fn filter(&self) -> u8 {
        self.packet.byte(3) & 0b1111
    }

    /// Whether this discovery asks about the given function block.
    #[inline]
    pub fn requests_function_block(&self, block: u7) -> bool {
        self.function_block() == 0xFF || self.function_block() == block.as_int()
    }

    #[inline]
    pub fn requests_info(&self) -> bool {
        self.filter() & discovery_filter::FUNCTION_BLOCK_INFO != 0
    }

    #[inline]
    pub fn requests_name(&self) -> bool {
        self.filter() & discovery_filter::FUNCTION_BLOCK_NAME != 0
    }
}

/// The properties a function block advertises in its info notification.
///
/// The defaults describe an active bidirectional MIDI 2.0 block.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FunctionBlockOptions {
    pub active: bool,
    /// One of the `DIRECTION_*` constants, never zero.
    pub direction: u2,
    /// One of the `MIDI1_*` constants, or `NOT_MIDI1`.
    pub midi1: u2,
    /// One of the `UI_HINT_*` constants. When `UI_HINT_AS_DIRECTION`, the
    /// direction doubles as the hint on the wire.
    pub ui_hint: u2,
    pub ci_message_version: u7,
    pub max_num_sysex8_streams: u8,
}
impl FunctionBlockOptions {
    /// The function block only receives messages.
    pub const DIRECTION_INPUT: u2 = u2::new(0b01);
    /// The function block only transmits messages.
    pub const DIRECTION_OUTPUT: u2 = u2::new(0b10);
    /// Every input group of the block has a matching output group.
    pub const BIDIRECTIONAL: u2 = u2::new(0b11);

    /// The block does not represent a MIDI 1.0 connection.
    pub const NOT_MIDI1: u2 = u2::new(0b00);
    /// A MIDI 1.0 connection without bandwidth restrictions.
    pub const MIDI1_UNRESTRICTED: u2 = u2::new(0b01);
    /// A MIDI 1.0 connection restricted to 31.25 kbps.
    pub const MIDI1_31250: u2 = u2::new(0b10);

    /// Let the direction stand in for the UI hint.
    pub const UI_HINT_AS_DIRECTION: u2 = u2::new(0b00);
    /// Suggest presenting the block as a receiver.
    pub const UI_HINT_RECEIVER: u2 = u2::new(0b01);
    /// Suggest presenting the block as a sender.
    pub const UI_HINT_SENDER: u2 = u2::new(0b10);
}
impl Default for FunctionBlockOptions {
    fn default() -> FunctionBlockOptions {
        FunctionBlockOptions {
            active: true,
            direction: Self::BIDIRECTIONAL,
            midi1: Self::NOT_MIDI1,
            ui_hint: Self::UI_HINT_AS_DIRECTION,
            ci_message_version: u7::new(0),
            max_num_sysex8_streams: 0,
        }
    }
}

stream_view! {
    /// A description of a single function block.
    FunctionBlockInfoView => stream_status::FUNCTION_BLOCK_INFO
}
impl<'a> FunctionBlockInfoView<'a> {
    #[inline]
    pub fn active(&self) -> bool {
        self.packet.byte(2) & 0x80 != 0
    }

    /// The number of the function block being described.
    #[inline]
    pub fn function_block(&self) -> u7 {
        self.packet.byte_7bit(2)
    }

    #[inline]
    pub fn direction(&self) -> u2 {
        u2::from_int_lossy(self.packet.byte(3))
    }

    #[inline]
    pub fn midi1(&self) -> u2 {
        u2::from_int_lossy(self.packet.byte(3) >> 2)
    }

    #[inline]
    pub fn ui_hint(&self) -> u2 {
        u2::from_int_lossy(self.packet.byte(3) >> 4)
    }

    /// The first group the block spans.
    ///
    /// The wire field is 4 bits wide; the byte is returned as sent.
    #[inline]
    pub fn first_group(&self) -> u8 {
        self.packet.byte(4)
    }

    /// How many adjacent groups the block spans.
    ///
    /// The wire field is 4 bits wide; the byte is returned as sent.
    #[inline]
    pub fn num_groups_spanned(&self) -> u8 {
        self.packet.byte(5)
    }

    /// The MIDI-CI message version the block speaks, or zero if none.
    #[inline]
    pub fn ci_message_version(&self) -> u7 {
        self.packet.byte_7bit(6)
    }

    /// How many simultaneous SysEx8 streams the block supports.
    #[inline]
    pub fn max_num_sysex8_streams(&self) -> u8 {
        self.packet.byte(7)
    }
}

stream_view! {
    /// One packet of a function block name notification.
    FunctionBlockNameView => stream_status::FUNCTION_BLOCK_NAME
}
impl<'a> FunctionBlockNameView<'a> {
    /// The place of this packet within the whole name.
    #[inline]
    pub fn format(&self) -> PacketFormat {
        stream_format(self.packet)
    }

    /// The function block this name belongs to.
    #[inline]
    pub fn function_block(&self) -> u7 {
        self.packet.byte_7bit(2)
    }

    /// The name bytes carried by this packet.
    #[inline]
    pub fn payload(&self) -> PayloadBytes<'a> {
        PayloadBytes {
            packet: self.packet,
            index: 3,
        }
    }
}

#[inline]
fn stream_format(packet: &Packet) -> PacketFormat {
    PacketFormat::from_code(u2::from_int_lossy((packet.words[0] >> 26) as u8))
}

/// An iterator over the text bytes of a single stream message packet,
/// stopping at the first NUL padding byte.
///
/// The bytes are masked down to 7 bits, as the standard requires.
#[derive(Clone, Debug)]
pub struct PayloadBytes<'a> {
    packet: &'a Packet,
    index: usize,
}
impl<'a> Iterator for PayloadBytes<'a> {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.index >= 16 {
            return None;
        }
        let byte = self.packet.byte_7bit(self.index).as_int();
        if byte == 0 {
            self.index = 16;
            None
        } else {
            self.index += 1;
            Some(byte)
        }
    }
}

/// Create an endpoint discovery message asking for the categories set in the
/// given [`discovery_filter`] bitmap.
pub fn make_endpoint_discovery_message(filter: u8) -> Packet {
    let mut m = make_stream_message(stream_status::ENDPOINT_DISCOVERY, PacketFormat::Complete);
    m.set_byte(2, UMP_VERSION_MAJOR);
    m.set_byte(3, UMP_VERSION_MINOR);
    m.words[1] = filter as u32;
    m
}

/// Create an endpoint info notification.
pub fn make_endpoint_info_message(
    num_function_blocks: u7,
    static_function_blocks: bool,
    protocols: u8,
    extensions: u8,
) -> Packet {
    let static_flag = if static_function_blocks { 0x80 } else { 0x00 };
    let mut m = make_stream_message(stream_status::ENDPOINT_INFO, PacketFormat::Complete);
    m.set_byte(2, UMP_VERSION_MAJOR);
    m.set_byte(3, UMP_VERSION_MINOR);
    m.set_byte(4, static_flag | num_function_blocks.as_int());
    m.set_byte(6, protocols);
    m.set_byte(7, extensions);
    m
}

/// Create a device identity notification.
///
/// Each 14-bit and 28-bit field is spread over the packet as a little-endian
/// run of 7-bit bytes.
pub fn make_device_identity_message(identity: &DeviceIdentity) -> Packet {
    let mut m = make_stream_message(stream_status::DEVICE_IDENTITY, PacketFormat::Complete);
    let family = identity.family.as_int() as u32;
    let model = identity.model.as_int() as u32;
    let revision = identity.revision.as_int();
    m.words[1] = identity.manufacturer.as_int();
    m.words[2] = ((family << 24) & 0x7F00_0000)
        | ((family << 9) & 0x007F_0000)
        | ((model << 8) & 0x0000_7F00)
        | ((model >> 7) & 0x0000_007F);
    m.words[3] = ((revision << 24) & 0x7F00_0000)
        | ((revision << 9) & 0x007F_0000)
        | ((revision >> 6) & 0x0000_7F00)
        | ((revision >> 21) & 0x0000_007F);
    m
}

/// Create a single endpoint name packet.
///
/// # Panics
///
/// Panics if the chunk does not fit in a single packet. Use
/// [`send_endpoint_name`] to send names of arbitrary length.
pub fn make_endpoint_name_message(format: PacketFormat, name: &str) -> Packet {
    assert!(
        name.len() <= ENDPOINT_NAME_CAPACITY,
        "endpoint name packets carry at most 14 bytes"
    );
    endpoint_name_packet(format, name.as_bytes())
}

fn endpoint_name_packet(format: PacketFormat, chunk: &[u8]) -> Packet {
    let mut m = make_stream_message(stream_status::ENDPOINT_NAME, format);
    for (i, &byte) in chunk.iter().enumerate() {
        m.set_byte(2 + i, byte);
    }
    m
}

/// Create a single product instance ID packet.
///
/// Product instance IDs are at most 16 bytes long, so an ID never takes more
/// than two packets and `Continue` is not a valid format for them.
///
/// # Panics
///
/// Panics if the chunk does not fit in a single packet or the format is
/// `Continue`. Use [`send_product_instance_id`] to chunk correctly.
pub fn make_product_instance_id_message(format: PacketFormat, id: &str) -> Packet {
    assert!(
        id.len() <= PRODUCT_INSTANCE_ID_CAPACITY,
        "product instance id packets carry at most 14 bytes"
    );
    assert!(
        format != PacketFormat::Continue,
        "product instance ids never span more than two packets"
    );
    product_instance_id_packet(format, id.as_bytes())
}

fn product_instance_id_packet(format: PacketFormat, chunk: &[u8]) -> Packet {
    let mut m = make_stream_message(stream_status::PRODUCT_INSTANCE_ID, format);
    for (i, &byte) in chunk.iter().enumerate() {
        m.set_byte_7bit(2 + i, u7::from_int_lossy(byte));
    }
    m
}

/// Create a stream configuration request for the given protocol.
///
/// # Panics
///
/// Panics unless the protocol is one of the [`protocol`] constants.
pub fn make_stream_configuration_request(protocol: u8, extensions: u8) -> Packet {
    assert!(
        protocol == protocol::MIDI1 || protocol == protocol::MIDI2,
        "protocol must be midi1 or midi2"
    );
    let mut m = make_stream_message(
        stream_status::STREAM_CONFIGURATION_REQUEST,
        PacketFormat::Complete,
    );
    m.set_byte(2, protocol);
    m.set_byte(3, extensions);
    m
}

/// Create the notification that reports the active stream configuration.
///
/// # Panics
///
/// Panics unless the protocol is one of the [`protocol`] constants.
pub fn make_stream_configuration_notification(protocol: u8, extensions: u8) -> Packet {
    assert!(
        protocol == protocol::MIDI1 || protocol == protocol::MIDI2,
        "protocol must be midi1 or midi2"
    );
    let mut m = make_stream_message(
        stream_status::STREAM_CONFIGURATION_NOTIFY,
        PacketFormat::Complete,
    );
    m.set_byte(2, protocol);
    m.set_byte(3, extensions);
    m
}

/// Create a function block discovery message asking about one block, or
/// about all blocks with `0xFF`.
///
/// # Panics
///
/// Panics if the block number is neither below 32 nor `0xFF`.
pub fn make_function_block_discovery_message(function_block: u8, filter: u8) -> Packet {
    assert!(
        function_block == 0xFF || function_block < 32,
        "function block numbers are below 32"
    );
    let mut m = make_stream_message(
        stream_status::FUNCTION_BLOCK_DISCOVERY,
        PacketFormat::Complete,
    );
    m.set_byte(2, function_block);
    m.set_byte(3, filter);
    m
}

/// Create a function block info notification.
///
/// # Panics
///
/// Panics if the block number is 32 or above, if the direction is zero, if
/// the MIDI 1.0 field holds the reserved value 3, or if the UI hint
/// contradicts the direction.
pub fn make_function_block_info_message(
    function_block: u7,
    options: &FunctionBlockOptions,
    first_group: u4,
    num_groups_spanned: u4,
) -> Packet {
    assert!(function_block < 32, "function block numbers are below 32");
    assert!(
        options.direction != u2::new(0),
        "function blocks must declare a direction"
    );
    assert!(options.midi1.as_int() < 3, "reserved midi1 field value");
    assert!(
        options.ui_hint == 0 || (options.direction & options.ui_hint) != u2::new(0),
        "the ui hint must agree with the direction"
    );
    let mut m = make_stream_message(stream_status::FUNCTION_BLOCK_INFO, PacketFormat::Complete);
    let ui_hint = if options.ui_hint == 0 {
        options.direction
    } else {
        options.ui_hint
    };
    let active_flag = if options.active { 0x80 } else { 0x00 };
    m.set_byte(2, active_flag | (function_block.as_int() & 0x1F));
    m.set_byte(
        3,
        (ui_hint.as_int() << 4) | (options.midi1.as_int() << 2) | options.direction.as_int(),
    );
    m.set_byte(4, first_group.as_int());
    m.set_byte(5, num_groups_spanned.as_int());
    m.set_byte(6, options.ci_message_version.as_int());
    m.set_byte(7, options.max_num_sysex8_streams);
    m
}

/// Create a single function block name packet.
///
/// # Panics
///
/// Panics if the chunk does not fit in a single packet. Use
/// [`send_function_block_name`] to send names of arbitrary length.
pub fn make_function_block_name_message(
    format: PacketFormat,
    function_block: u7,
    name: &str,
) -> Packet {
    assert!(
        name.len() <= FUNCTION_BLOCK_NAME_CAPACITY,
        "function block name packets carry at most 13 bytes"
    );
    function_block_name_packet(format, function_block, name.as_bytes())
}

fn function_block_name_packet(format: PacketFormat, function_block: u7, chunk: &[u8]) -> Packet {
    let mut m = make_stream_message(stream_status::FUNCTION_BLOCK_NAME, format);
    m.set_byte(2, function_block.as_int());
    for (i, &byte) in chunk.iter().enumerate() {
        m.set_byte(3 + i, byte);
    }
    m
}

/// Send an endpoint name of arbitrary length as a run of packets.
///
/// Names of up to 14 bytes take a single `Complete` packet, anything longer
/// becomes a `Start`/`Continue`/`End` run.
pub fn send_endpoint_name(name: &str, mut sender: impl FnMut(Packet)) {
    let mut bytes = name.as_bytes();
    if bytes.len() <= ENDPOINT_NAME_CAPACITY {
        sender(endpoint_name_packet(PacketFormat::Complete, bytes));
    } else {
        sender(endpoint_name_packet(
            PacketFormat::Start,
            &bytes[..ENDPOINT_NAME_CAPACITY],
        ));
        bytes = &bytes[ENDPOINT_NAME_CAPACITY..];
        while bytes.len() > ENDPOINT_NAME_CAPACITY {
            sender(endpoint_name_packet(
                PacketFormat::Continue,
                &bytes[..ENDPOINT_NAME_CAPACITY],
            ));
            bytes = &bytes[ENDPOINT_NAME_CAPACITY..];
        }
        sender(endpoint_name_packet(PacketFormat::End, bytes));
    }
}

/// Send a product instance ID as one or two packets.
///
/// # Panics
///
/// Panics if the ID is longer than the 16 bytes the standard allows.
pub fn send_product_instance_id(id: &str, mut sender: impl FnMut(Packet)) {
    let bytes = id.as_bytes();
    assert!(
        bytes.len() <= MAX_PRODUCT_INSTANCE_ID_LENGTH,
        "product instance ids are at most 16 bytes long"
    );
    if bytes.len() <= PRODUCT_INSTANCE_ID_CAPACITY {
        sender(product_instance_id_packet(PacketFormat::Complete, bytes));
    } else {
        //With at most 16 bytes total, a start packet plus a tiny end packet
        //always suffice and continuation packets cannot occur
        sender(product_instance_id_packet(
            PacketFormat::Start,
            &bytes[..PRODUCT_INSTANCE_ID_CAPACITY],
        ));
        sender(product_instance_id_packet(
            PacketFormat::End,
            &bytes[PRODUCT_INSTANCE_ID_CAPACITY..],
        ));
    }
}

/// Send a function block name of arbitrary length as a run of packets.
pub fn send_function_block_name(function_block: u7, name: &str, mut sender: impl FnMut(Packet)) {
    let mut bytes = name.as_bytes();
    if bytes.len() <= FUNCTION_BLOCK_NAME_CAPACITY {
        sender(function_block_name_packet(
            PacketFormat::Complete,
            function_block,
            bytes,
        ));
    } else {
        sender(function_block_name_packet(
            PacketFormat::Start,
            function_block,
            &bytes[..FUNCTION_BLOCK_NAME_CAPACITY],
        ));
        bytes = &bytes[FUNCTION_BLOCK_NAME_CAPACITY..];
        while bytes.len() > FUNCTION_BLOCK_NAME_CAPACITY {
            sender(function_block_name_packet(
                PacketFormat::Continue,
                function_block,
                &bytes[..FUNCTION_BLOCK_NAME_CAPACITY],
            ));
            bytes = &bytes[FUNCTION_BLOCK_NAME_CAPACITY..];
        }
        sender(function_block_name_packet(
            PacketFormat::End,
            function_block,
            bytes,
        ));
    }
}
