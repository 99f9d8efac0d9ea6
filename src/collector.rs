//! Streaming reassembly of multi-packet messages.
//!
//! UMP slices long payloads into `Start`/`Continue`/`End` runs of packets.
//! The collectors here eat packets one at a time and hand each reassembled
//! message to a closure passed to the `feed` call, borrowing the payload
//! straight out of the collector's buffer.
//!
//! Collectors keep their bytes in a type implementing [`Buffer`]. With the
//! `alloc` feature the default buffer grows on demand, without it the
//! default is a small stack buffer, and the [`stack_buffer!`](crate::stack_buffer)
//! macro defines buffers of any fixed size.

use crate::{
    data::{Sysex7View, Sysex8View},
    packet::{Packet, PacketFormat},
    prelude::*,
    stream::{EndpointNameView, FunctionBlockNameView, ProductInstanceIdView},
    sysex::{Manufacturer, Sysex7, Sysex8},
};

/// Describes types that can hold the payload of a message while it is being
/// collected.
///
/// This trait is implemented by [`DefaultBuffer`], by `Vec<u8>` when the
/// `alloc` feature is enabled, and by the types the
/// [`stack_buffer!`](crate::stack_buffer) macro defines. It should very
/// rarely be implemented manually.
pub trait Buffer {
    fn push(&mut self, data: &[u8]) -> StdResult<(), ()>;
    fn clear(&mut self);
    fn as_slice(&self) -> &[u8];
}

/// A `Buffer` with virtually unlimited capacity.
#[cfg(feature = "alloc")]
impl Buffer for Vec<u8> {
    #[inline]
    fn push(&mut self, data: &[u8]) -> StdResult<(), ()> {
        self.extend_from_slice(data);
        Ok(())
    }
    #[inline]
    fn clear(&mut self) {
        Vec::clear(self)
    }
    #[inline]
    fn as_slice(&self) -> &[u8] {
        self
    }
}

/// Define a fixed-size stack buffer type, suitable for use with the
/// collectors in [`collector`](crate::collector).
///
/// # Usage
///
/// The `stack_buffer!` macro defines a buffer type, which can later be
/// instantiated and handed to a collector.
///
/// ```rust
/// umply::stack_buffer! {
///     struct MyBuffer([u8; 4096]);
/// }
///
/// use umply::collector::Sysex7Collector;
/// let collector = Sysex7Collector::with_buffer(MyBuffer::new());
/// ```
///
/// Buffers can have attributes, documentation, and be made `pub`lic.
///
/// ```rust
/// umply::stack_buffer! {
///     /// A very small buffer.
///     #[repr(C)]
///     pub struct MyBuffer([u8; 16]);
/// }
///
/// let collector = umply::collector::Sysex8Collector::<MyBuffer>::default();
/// ```
#[macro_export]
macro_rules! stack_buffer {
    {
        @impl_def {$($attr:meta)*} {$($pub:ident)?} {$name:ident} {$size:expr}
    } => {
        $(#[$attr])*
        #[derive(Clone)]
        $($pub)? struct $name {
            buf: [u8; $size],
            len: usize,
        }
        impl core::hash::Hash for $name {
            #[inline]
            fn hash<H: core::hash::Hasher>(&self, h: &mut H) {
                h.write(&self.buf[..self.len]);
                h.write(&[0xFF]);
            }
        }
        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                write!(f, concat!(stringify!($name), "["))?;
                for databyte in self.buf[..self.len].iter() {
                    write!(f, "{:02x}", databyte)?;
                }
                write!(f, "]")?;
                Ok(())
            }
        }
        impl $name {
            pub const MAX_CAP: usize = $size;
            #[inline]
            $($pub)? const fn new() -> $name {
                $name {
                    buf: [0; $size],
                    len: 0,
                }
            }
        }
        impl core::default::Default for $name {
            #[inline]
            fn default() -> $name {
                Self::new()
            }
        }
        impl $crate::collector::Buffer for $name {
            #[inline]
            fn push(&mut self, data: &[u8]) -> core::result::Result<(), ()> {
                let new_len = self.len + data.len();
                if new_len > Self::MAX_CAP {
                    Err(())
                } else {
                    self.buf[self.len..new_len].copy_from_slice(data);
                    self.len = new_len;
                    Ok(())
                }
            }
            #[inline]
            fn clear(&mut self) {
                self.len = 0;
            }
            #[inline]
            fn as_slice(&self) -> &[u8] {
                &self.buf[..self.len]
            }
        }
    };
    {
        $(#[$attr:meta])*
        struct $name:ident([u8; $size:expr]);
    }=> {
        $crate::stack_buffer!(@impl_def {$($attr)*} {} {$name} {$size});
    };
    {
        $(#[$attr:meta])*
        pub struct $name:ident([u8; $size:expr]);
    }=> {
        $crate::stack_buffer!(@impl_def {$($attr)*} {pub} {$name} {$size});
    };
}

macro_rules! default_buffer_def {
    ($($item:item)*) => {
        /// The default buffer type used by the collectors.
        /// By default it has a reasonable maximum capacity, but the `Buffer`
        /// trait can be implemented for fine-grained control.
        ///
        /// # Implementation notes
        ///
        /// Currently, when the `alloc` feature is used a `Vec` is used for
        /// the backing allocation, limited to a maximum of 64KB.
        ///
        /// When the `alloc` feature is disabled a 1KB stack buffer is used
        /// instead.
        ///
        /// This implementation is subject to change at any time, including
        /// reductions in size.
        #[derive(Clone, Hash, Default)]
        $($item)*
    };
}
pub use self::default_buf_impl::DefaultBuffer;

#[cfg(feature = "alloc")]
mod default_buf_impl {
    use super::*;

    default_buffer_def! {
        pub struct DefaultBuffer {
            buf: Vec<u8>,
        }
    }

    impl fmt::Debug for DefaultBuffer {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "DefaultBuffer[")?;
            for databyte in self.buf.iter() {
                write!(f, "{:02x}", databyte)?;
            }
            write!(f, "]")?;
            Ok(())
        }
    }
    impl DefaultBuffer {
        const MAX_CAP: usize = 64 * 1024;
        #[inline]
        pub const fn max_cap(&self) -> usize {
            Self::MAX_CAP
        }
        #[inline]
        pub const fn new() -> DefaultBuffer {
            DefaultBuffer { buf: Vec::new() }
        }
    }
    impl Buffer for DefaultBuffer {
        #[inline]
        fn push(&mut self, data: &[u8]) -> StdResult<(), ()> {
            if self.buf.len() + data.len() > Self::MAX_CAP {
                Err(())
            } else {
                self.buf.extend_from_slice(data);
                Ok(())
            }
        }
        #[inline]
        fn clear(&mut self) {
            self.buf.clear()
        }
        #[inline]
        fn as_slice(&self) -> &[u8] {
            &self.buf[..]
        }
    }
}

#[cfg(not(feature = "alloc"))]
mod default_buf_impl {
    use super::*;

    default_buffer_def! {
        pub struct DefaultBuffer {
            buf: InnerBuf,
        }
    }
    stack_buffer! {
        struct InnerBuf([u8; 1024]);
    }
    impl fmt::Debug for DefaultBuffer {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            fmt::Debug::fmt(&self.buf, f)
        }
    }
    impl DefaultBuffer {
        #[inline]
        pub const fn max_cap(&self) -> usize {
            InnerBuf::MAX_CAP
        }
        #[inline]
        pub const fn new() -> DefaultBuffer {
            DefaultBuffer {
                buf: InnerBuf::new(),
            }
        }
    }
    impl Buffer for DefaultBuffer {
        #[inline]
        fn push(&mut self, data: &[u8]) -> StdResult<(), ()> {
            self.buf.push(data)
        }
        #[inline]
        fn clear(&mut self) {
            self.buf.clear()
        }
        #[inline]
        fn as_slice(&self) -> &[u8] {
            self.buf.as_slice()
        }
    }
}

/// A streaming reassembler that turns runs of SysEx7 data packets back into
/// complete system exclusive messages.
///
/// Feed packets one at a time; whenever a message completes, the handler
/// closure receives it with the payload borrowed from the collector's
/// buffer. Packets that are not SysEx7 are ignored, so the whole incoming
/// packet stream can be fed without filtering.
#[derive(Clone, Debug, Default)]
pub struct Sysex7Collector<B = DefaultBuffer> {
    manufacturer: u32,
    id_bytes: u8,
    collecting: bool,
    max_data_size: usize,
    buffer: B,
}
impl Sysex7Collector {
    /// Create a collector with the default buffer type.
    #[inline]
    pub fn new() -> Sysex7Collector {
        Sysex7Collector::default()
    }
}
impl<B: Buffer> Sysex7Collector<B> {
    /// Create a collector that keeps its payload in the given buffer.
    #[inline]
    pub fn with_buffer(mut buffer: B) -> Sysex7Collector<B> {
        buffer.clear();
        Sysex7Collector {
            manufacturer: 0,
            id_bytes: 0,
            collecting: false,
            max_data_size: 0,
            buffer,
        }
    }

    /// Limit the number of payload bytes kept per message, with zero meaning
    /// no limit.
    ///
    /// Data beyond the limit is dropped; the truncated message is still
    /// delivered when its end packet arrives.
    #[inline]
    pub fn set_max_data_size(&mut self, max: usize) {
        self.max_data_size = max;
    }

    /// Drop any half-collected message and return to idle.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.manufacturer = 0;
        self.id_bytes = 0;
        self.collecting = false;
    }

    /// Process one packet, calling the handler if this packet completes a
    /// message.
    ///
    /// A `Start` or `Complete` packet abandons whatever came before it, and
    /// `Continue`/`End` packets without a preceding `Start` are ignored, so
    /// the collector resynchronizes on its own after packet loss.
    pub fn feed(&mut self, packet: &Packet, mut handler: impl FnMut(Sysex7)) {
        let view = match Sysex7View::new(packet) {
            Some(view) => view,
            None => return,
        };
        match view.format() {
            PacketFormat::Complete | PacketFormat::Start => {
                self.reset();
                self.collecting = true;
            }
            PacketFormat::Continue | PacketFormat::End => {
                if !self.collecting {
                    //Tail of a message whose start was never seen
                    return;
                }
            }
        }
        for i in 0..view.payload_size() {
            let byte = view.payload_byte(i).as_int();
            //The first bytes of the message hold the manufacturer ID: a
            //single nonzero byte, or a zero byte followed by two more
            match self.id_bytes {
                0 => {
                    if byte != 0 {
                        self.manufacturer = (byte as u32) << 16;
                        self.id_bytes = 3;
                    } else {
                        self.id_bytes = 1;
                    }
                }
                1 => {
                    self.manufacturer |= (byte as u32) << 8;
                    self.id_bytes = 2;
                }
                2 => {
                    self.manufacturer |= byte as u32;
                    self.id_bytes = 3;
                }
                _ => self.push_data(byte),
            }
        }
        match view.format() {
            PacketFormat::Complete | PacketFormat::End => {
                handler(Sysex7 {
                    manufacturer: Manufacturer::new(self.manufacturer),
                    data: u7::slice_from_int(self.buffer.as_slice()),
                });
                self.reset();
            }
            _ => {}
        }
    }

    fn push_data(&mut self, byte: u8) {
        if self.max_data_size != 0 && self.buffer.as_slice().len() >= self.max_data_size {
            //Truncate oversized messages, the framing state stays alive
            return;
        }
        let _ = self.buffer.push(&[byte]);
    }
}

//How far the manufacturer ID of a SysEx8 message has been parsed.
//The first payload byte after the stream ID decides the form of the ID:
//a byte with the top bit set is a complete single-byte ID, a zero byte
//announces two more ID bytes, and anything else means the message carries
//no ID at all.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum IdState {
    Detect,
    ThreeByteHigh,
    ThreeByteLow,
    Invalid,
    Done,
}

/// A streaming reassembler that turns runs of SysEx8 extended data packets
/// back into complete system exclusive messages.
///
/// SysEx8 packets carry a stream ID so that several messages can interleave;
/// a collector follows a single message at a time and ignores `Continue` and
/// `End` packets of foreign stream IDs. Use one collector per concurrent
/// stream to demultiplex fully.
#[derive(Clone, Debug)]
pub struct Sysex8Collector<B = DefaultBuffer> {
    stream_id: u8,
    manufacturer: u32,
    id_state: IdState,
    collecting: bool,
    max_data_size: usize,
    buffer: B,
}
impl Sysex8Collector {
    /// Create a collector with the default buffer type.
    #[inline]
    pub fn new() -> Sysex8Collector {
        Sysex8Collector::default()
    }
}
impl<B: Default> Default for Sysex8Collector<B> {
    #[inline]
    fn default() -> Sysex8Collector<B> {
        Sysex8Collector {
            stream_id: 0,
            manufacturer: 0,
            id_state: IdState::Detect,
            collecting: false,
            max_data_size: 0,
            buffer: B::default(),
        }
    }
}
impl<B: Buffer> Sysex8Collector<B> {
    /// Create a collector that keeps its payload in the given buffer.
    #[inline]
    pub fn with_buffer(mut buffer: B) -> Sysex8Collector<B> {
        buffer.clear();
        Sysex8Collector {
            stream_id: 0,
            manufacturer: 0,
            id_state: IdState::Detect,
            collecting: false,
            max_data_size: 0,
            buffer,
        }
    }

    /// The stream ID of the message currently being collected.
    #[inline]
    pub fn stream_id(&self) -> u8 {
        self.stream_id
    }

    /// Limit the number of payload bytes kept per message, with zero meaning
    /// no limit.
    ///
    /// Data beyond the limit is dropped; the truncated message is still
    /// delivered when its end packet arrives.
    #[inline]
    pub fn set_max_data_size(&mut self, max: usize) {
        self.max_data_size = max;
    }

    /// Drop any half-collected message and return to idle.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.stream_id = 0;
        self.manufacturer = 0;
        self.id_state = IdState::Detect;
        self.collecting = false;
    }

    /// Process one packet, calling the handler if this packet completes a
    /// message.
    ///
    /// A `Start` or `Complete` packet abandons whatever came before it and
    /// adopts the packet's stream ID. `Continue` and `End` packets are
    /// ignored while idle, and also when their stream ID does not match the
    /// message being collected.
    pub fn feed(&mut self, packet: &Packet, mut handler: impl FnMut(Sysex8)) {
        let view = match Sysex8View::new(packet) {
            Some(view) => view,
            None => return,
        };
        match view.format() {
            PacketFormat::Complete | PacketFormat::Start => {
                self.reset();
                self.collecting = true;
                self.stream_id = view.stream_id();
            }
            PacketFormat::Continue | PacketFormat::End => {
                if !self.collecting || view.stream_id() != self.stream_id {
                    //Either a tail without a start, or a packet that belongs
                    //to an interleaved message on another stream
                    return;
                }
            }
        }
        for i in 0..view.payload_size() {
            let byte = view.payload_byte(i);
            match self.id_state {
                IdState::Detect => {
                    if byte == 0x00 {
                        self.id_state = IdState::ThreeByteHigh;
                    } else if byte & 0x80 != 0 {
                        self.manufacturer = ((byte & 0x7F) as u32) << 16;
                        self.id_state = IdState::Done;
                    } else {
                        self.id_state = IdState::Invalid;
                        self.push_data(byte);
                    }
                }
                IdState::ThreeByteHigh => {
                    self.manufacturer |= ((byte & 0x7F) as u32) << 8;
                    self.id_state = IdState::ThreeByteLow;
                }
                IdState::ThreeByteLow => {
                    self.manufacturer |= (byte & 0x7F) as u32;
                    self.id_state = IdState::Done;
                }
                IdState::Invalid | IdState::Done => self.push_data(byte),
            }
        }
        match view.format() {
            PacketFormat::Complete | PacketFormat::End => {
                handler(Sysex8 {
                    manufacturer: Manufacturer::new(self.manufacturer),
                    stream_id: self.stream_id,
                    data: self.buffer.as_slice(),
                });
                self.reset();
            }
            _ => {}
        }
    }

    fn push_data(&mut self, byte: u8) {
        if self.max_data_size != 0 && self.buffer.as_slice().len() >= self.max_data_size {
            //Truncate oversized messages, the framing state stays alive
            return;
        }
        let _ = self.buffer.push(&[byte]);
    }
}

/// A fully reassembled text notification from the stream message family.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum StreamText<'a> {
    /// The name of the endpoint.
    EndpointName(&'a [u8]),
    /// The product instance ID of the endpoint.
    ProductInstanceId(&'a [u8]),
    /// The name of one function block.
    FunctionBlockName { function_block: u7, name: &'a [u8] },
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum TextKind {
    EndpointName,
    ProductInstanceId,
    FunctionBlockName(u7),
}

/// A streaming reassembler for the three kinds of text carried by stream
/// messages: endpoint names, product instance IDs and function block names.
///
/// Continuation packets must match the kind of text being collected, and for
/// function block names also the block number; anything else is ignored
/// until the next `Start` or `Complete` packet.
#[derive(Clone, Debug, Default)]
pub struct StreamTextCollector<B = DefaultBuffer> {
    kind: Option<TextKind>,
    max_data_size: usize,
    buffer: B,
}
impl StreamTextCollector {
    /// Create a collector with the default buffer type.
    #[inline]
    pub fn new() -> StreamTextCollector {
        StreamTextCollector::default()
    }
}
impl<B: Buffer> StreamTextCollector<B> {
    /// Create a collector that keeps its text in the given buffer.
    #[inline]
    pub fn with_buffer(mut buffer: B) -> StreamTextCollector<B> {
        buffer.clear();
        StreamTextCollector {
            kind: None,
            max_data_size: 0,
            buffer,
        }
    }

    /// Limit the number of text bytes kept per notification, with zero
    /// meaning no limit.
    #[inline]
    pub fn set_max_data_size(&mut self, max: usize) {
        self.max_data_size = max;
    }

    /// Drop any half-collected text and return to idle.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.kind = None;
    }

    /// Process one packet, calling the handler if this packet completes a
    /// text notification.
    pub fn feed(&mut self, packet: &Packet, mut handler: impl FnMut(StreamText)) {
        let (kind, format, payload) = if let Some(view) = EndpointNameView::new(packet) {
            (TextKind::EndpointName, view.format(), view.payload())
        } else if let Some(view) = ProductInstanceIdView::new(packet) {
            (TextKind::ProductInstanceId, view.format(), view.payload())
        } else if let Some(view) = FunctionBlockNameView::new(packet) {
            (
                TextKind::FunctionBlockName(view.function_block()),
                view.format(),
                view.payload(),
            )
        } else {
            return;
        };
        match format {
            PacketFormat::Complete | PacketFormat::Start => {
                self.reset();
                self.kind = Some(kind);
            }
            PacketFormat::Continue | PacketFormat::End => {
                if self.kind != Some(kind) {
                    //Tail of an unseen notification, or of a different text
                    //field altogether
                    return;
                }
            }
        }
        for byte in payload {
            self.push_data(byte);
        }
        match format {
            PacketFormat::Complete | PacketFormat::End => {
                let text = self.buffer.as_slice();
                handler(match kind {
                    TextKind::EndpointName => StreamText::EndpointName(text),
                    TextKind::ProductInstanceId => StreamText::ProductInstanceId(text),
                    TextKind::FunctionBlockName(function_block) => StreamText::FunctionBlockName {
                        function_block,
                        name: text,
                    },
                });
                self.reset();
            }
            _ => {}
        }
    }

    fn push_data(&mut self, byte: u8) {
        if self.max_data_size != 0 && self.buffer.as_slice().len() >= self.max_data_size {
            //Truncate oversized text, the framing state stays alive
            return;
        }
        let _ = self.buffer.push(&[byte]);
    }
}
