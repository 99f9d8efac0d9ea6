use crate::{
    collector::{Buffer, StreamTextCollector, Sysex7Collector, Sysex8Collector},
    is_sysex7, is_sysex8, make_sysex7_packet, make_sysex8_packet,
    num::{u14, u28, u4, u7},
    packets, send_sysex7, send_sysex8,
    stream::{
        self, discovery_filter, DeviceIdentity, DeviceIdentityView, EndpointDiscoveryView,
        EndpointInfoView, EndpointNameView, FunctionBlockDiscoveryView, FunctionBlockInfoView,
        FunctionBlockNameView, FunctionBlockOptions, ProductInstanceIdView,
        StreamConfigurationView,
    },
    IdentityReply, Manufacturer, Packet, PacketFormat, PacketType, StreamText, Sysex7, Sysex7View,
    Sysex8, Sysex8View,
};

/// Build a `vec` of packet formats.
macro_rules! formats {
    ($($format:ident),*) => {
        vec![$(PacketFormat::$format),*]
    };
}

/// An ASCII name of the given length, free of NUL bytes.
fn name_of_len(len: usize) -> String {
    (0..len).map(|i| (b'a' + (i % 26) as u8) as char).collect()
}

/// Payload bytes of the given length, 7-bit clean and free of NUL bytes.
fn data_of_len(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 0x60) as u8 + 0x10).collect()
}

fn sysex7_run(sysex: &Sysex7, group: u4) -> Vec<Packet> {
    let mut run = Vec::new();
    send_sysex7(sysex, group, |packet| run.push(packet));
    run
}

fn sysex8_run(sysex: &Sysex8, group: u4) -> Vec<Packet> {
    let mut run = Vec::new();
    send_sysex8(sysex, group, |packet| run.push(packet));
    run
}

fn collect_sysex7(run: &[Packet]) -> Vec<(Manufacturer, Vec<u8>)> {
    let mut out = Vec::new();
    let mut collector = Sysex7Collector::new();
    for packet in run {
        collector.feed(packet, |msg| {
            out.push((msg.manufacturer, u7::slice_as_int(msg.data).to_vec()));
        });
    }
    out
}

fn collect_sysex8(run: &[Packet]) -> Vec<(Manufacturer, u8, Vec<u8>)> {
    let mut out = Vec::new();
    let mut collector = Sysex8Collector::new();
    for packet in run {
        collector.feed(packet, |msg| {
            out.push((msg.manufacturer, msg.stream_id, msg.data.to_vec()));
        });
    }
    out
}

/// An owned copy of a collected text notification.
#[derive(Debug, PartialEq, Eq)]
enum OwnedText {
    Endpoint(Vec<u8>),
    Product(Vec<u8>),
    FunctionBlock(u7, Vec<u8>),
}

fn collect_text(run: &[Packet]) -> Vec<OwnedText> {
    let mut out = Vec::new();
    let mut collector = StreamTextCollector::new();
    for packet in run {
        collector.feed(packet, |text| {
            out.push(match text {
                StreamText::EndpointName(name) => OwnedText::Endpoint(name.to_vec()),
                StreamText::ProductInstanceId(id) => OwnedText::Product(id.to_vec()),
                StreamText::FunctionBlockName {
                    function_block,
                    name,
                } => OwnedText::FunctionBlock(function_block, name.to_vec()),
            });
        });
    }
    out
}

/// Test the packet framer on raw word streams.
mod framing {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_stream() {
        assert!(packets(&[]).next().is_none());
        assert!(Packet::from_words(&[]).is_err());
    }

    #[test]
    fn word_counts() {
        let cases: &[(u32, PacketType, usize)] = &[
            (0x0010_0000, PacketType::Utility, 1),
            (0x10F8_0000, PacketType::System, 1),
            (0x2090_3C40, PacketType::Midi1ChannelVoice, 1),
            (0x3004_0000, PacketType::Data, 2),
            (0x4090_3C00, PacketType::Midi2ChannelVoice, 2),
            (0x5003_0000, PacketType::ExtendedData, 4),
            (0xD000_0000, PacketType::FlexData, 4),
            (0xF000_0000, PacketType::Stream, 4),
        ];
        for &(word0, kind, count) in cases {
            let mut words = [0u32; 4];
            words[0] = word0;
            let packet = Packet::from_words(&words[..count]).unwrap();
            assert_eq!(packet.kind(), kind);
            assert_eq!(packet.word_count(), count);
            assert_eq!(packet.words(), &words[..count]);
        }
    }

    #[test]
    fn mixed_stream() {
        let words = [
            0x0010_0000,
            0x4090_3C00,
            0x1234_5678,
            0xF000_0000,
            0x0000_0000,
            0x0000_0000,
            0x0000_0000,
            0x3000_0000,
            0x0000_0000,
        ];
        let kinds: Vec<_> = packets(&words)
            .map(|packet| packet.unwrap().kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                PacketType::Utility,
                PacketType::Midi2ChannelVoice,
                PacketType::Stream,
                PacketType::Data,
            ]
        );
    }

    #[test]
    fn framing_matches_builders() {
        let built = vec![
            stream::make_endpoint_discovery_message(discovery_filter::ENDPOINT_ALL),
            make_sysex7_packet(
                PacketFormat::Complete,
                u4::new(0),
                u7::slice_from_int(&[0x7E, 0x01]),
            ),
        ];
        let mut words = Vec::new();
        for packet in &built {
            words.extend_from_slice(packet.words());
        }
        let reparsed: Vec<Packet> = packets(&words).map(|packet| packet.unwrap()).collect();
        assert_eq!(reparsed, built);
    }

    #[test]
    fn truncated_tail() {
        //A midi 2.0 channel voice packet is two words, only one is present
        let words = [0x4090_0000];
        let mut iter = packets(&words);
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none(), "the iterator stops after an error");
        assert!(Packet::from_words(&words).is_err());
        assert!(Packet::from_words(&[0x0000_0000, 0x0000_0000]).is_err());
    }

    #[test]
    #[cfg_attr(feature = "strict", should_panic)]
    fn reserved_passthrough() {
        let words = [0x6123_4567];
        let packet = packets(&words).next().unwrap().unwrap();
        assert_eq!(packet.kind(), PacketType::Reserved(u4::new(6)));
        assert_eq!(packet.word_count(), 1);
        assert_eq!(packet.words(), &words[..]);
    }

    #[test]
    fn group_and_bytes() {
        let mut packet = Packet::from_words(&[0x2090_3C40]).unwrap();
        assert_eq!(packet.group(), u4::new(0));
        assert_eq!(packet.status(), 0x90);
        packet.set_group(u4::new(0xA));
        assert_eq!(packet.words(), &[0x2A90_3C40]);
        assert_eq!(packet.byte(2), 0x3C);
        packet.set_byte(2, 0xC5);
        assert_eq!(packet.byte(2), 0xC5);
        assert_eq!(packet.byte_7bit(2), u7::new(0x45));
        packet.set_byte_7bit(3, u7::new(0x7F));
        assert_eq!(packet.words(), &[0x2A90_C57F]);
    }
}

/// Test the stream message builders against their views.
mod stream_messages {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn endpoint_discovery() {
        let m = stream::make_endpoint_discovery_message(discovery_filter::ENDPOINT_ALL);
        assert_eq!(m.kind(), PacketType::Stream);
        assert_eq!(m.word_count(), 4);
        let view = EndpointDiscoveryView::new(&m).unwrap();
        assert_eq!(view.ump_version_major(), 1);
        assert_eq!(view.ump_version_minor(), 1);
        assert_eq!(view.filter(), discovery_filter::ENDPOINT_ALL);
        assert!(view.requests_info());
        assert!(view.requests_device_identity());
        assert!(view.requests_name());
        assert!(view.requests_product_instance_id());
        assert!(view.requests_stream_configuration());

        let m = stream::make_endpoint_discovery_message(
            discovery_filter::DEVICE_IDENTITY | discovery_filter::ENDPOINT_NAME,
        );
        let view = EndpointDiscoveryView::new(&m).unwrap();
        assert!(!view.requests_info());
        assert!(view.requests_device_identity());
        assert!(view.requests_name());
        assert!(!view.requests_product_instance_id());
        assert!(!view.requests_stream_configuration());
    }

    #[test]
    fn view_rejects_other_statuses() {
        let discovery = stream::make_endpoint_discovery_message(discovery_filter::ENDPOINT_ALL);
        let info = stream::make_endpoint_info_message(u7::new(1), false, 0b10, 0b00);
        assert!(EndpointDiscoveryView::new(&info).is_none());
        assert!(EndpointInfoView::new(&discovery).is_none());
        assert!(FunctionBlockInfoView::new(&discovery).is_none());
        let not_stream = Packet::from_words(&[0x2090_3C40]).unwrap();
        assert!(EndpointDiscoveryView::new(&not_stream).is_none());
    }

    #[test]
    fn endpoint_info() {
        let m = stream::make_endpoint_info_message(u7::new(5), true, 0b11, 0b01);
        assert_eq!(m.words(), &[0xF001_0101, 0x8500_0301, 0, 0]);
        let view = EndpointInfoView::new(&m).unwrap();
        assert_eq!(view.ump_version(), 0x0101);
        assert_eq!(view.num_function_blocks(), u7::new(5));
        assert!(view.static_function_blocks());
        assert_eq!(view.protocols(), 0b11);
        assert_eq!(view.extensions(), 0b01);

        let m = stream::make_endpoint_info_message(u7::new(32), false, 0b10, 0b00);
        let view = EndpointInfoView::new(&m).unwrap();
        assert_eq!(view.num_function_blocks(), u7::new(32));
        assert!(!view.static_function_blocks());
    }

    #[test]
    fn device_identity() {
        let identity = DeviceIdentity {
            manufacturer: Manufacturer::from_bytes(u7::new(0x21), u7::new(0x09)),
            family: u14::new(0x1234),
            model: u14::new(0x0AAA),
            revision: u28::new(0x0ABC_DEF),
        };
        let m = stream::make_device_identity_message(&identity);
        //Each 14 and 28 bit field is spread into 7-bit bytes on the wire
        assert_eq!(m.words(), &[0xF002_0000, 0x0000_2109, 0x3424_2A15, 0x6F1B_2F05]);
        let view = DeviceIdentityView::new(&m).unwrap();
        assert_eq!(view.identity(), identity);

        let identity = DeviceIdentity {
            manufacturer: Manufacturer::from_byte(u7::new(0x41)),
            family: u14::new(0x3FFF),
            model: u14::new(0),
            revision: u28::new(0xFFF_FFFF),
        };
        let m = stream::make_device_identity_message(&identity);
        let view = DeviceIdentityView::new(&m).unwrap();
        assert_eq!(view.identity(), identity);
    }

    #[test]
    fn stream_configuration() {
        let m = stream::make_stream_configuration_request(stream::protocol::MIDI2, 0b11);
        let view = StreamConfigurationView::new(&m).unwrap();
        assert_eq!(view.protocol(), stream::protocol::MIDI2);
        assert_eq!(view.extensions(), 0b11);

        let m = stream::make_stream_configuration_notification(stream::protocol::MIDI1, 0b00);
        let view = StreamConfigurationView::new(&m).unwrap();
        assert_eq!(view.protocol(), stream::protocol::MIDI1);
        assert_eq!(view.extensions(), 0b00);
    }

    #[test]
    #[should_panic]
    fn reserved_protocol_rejected() {
        stream::make_stream_configuration_request(0, 0);
    }

    #[test]
    fn function_block_discovery() {
        let m = stream::make_function_block_discovery_message(0xFF, discovery_filter::FUNCTION_BLOCK_ALL);
        let view = FunctionBlockDiscoveryView::new(&m).unwrap();
        assert_eq!(view.function_block(), 0xFF);
        assert!(view.requests_function_block(u7::new(0)));
        assert!(view.requests_function_block(u7::new(31)));
        assert!(view.requests_info());
        assert!(view.requests_name());

        let m = stream::make_function_block_discovery_message(3, discovery_filter::FUNCTION_BLOCK_INFO);
        let view = FunctionBlockDiscoveryView::new(&m).unwrap();
        assert!(view.requests_function_block(u7::new(3)));
        assert!(!view.requests_function_block(u7::new(4)));
        assert!(view.requests_info());
        assert!(!view.requests_name());
    }

    #[test]
    fn function_block_info() {
        let options = FunctionBlockOptions {
            active: true,
            direction: FunctionBlockOptions::DIRECTION_INPUT,
            midi1: FunctionBlockOptions::MIDI1_31250,
            ui_hint: FunctionBlockOptions::UI_HINT_RECEIVER,
            ci_message_version: u7::new(0x11),
            max_num_sysex8_streams: 2,
        };
        let m = stream::make_function_block_info_message(u7::new(5), &options, u4::new(1), u4::new(2));
        let view = FunctionBlockInfoView::new(&m).unwrap();
        assert!(view.active());
        assert_eq!(view.function_block(), u7::new(5));
        assert_eq!(view.direction(), FunctionBlockOptions::DIRECTION_INPUT);
        assert_eq!(view.midi1(), FunctionBlockOptions::MIDI1_31250);
        assert_eq!(view.ui_hint(), FunctionBlockOptions::UI_HINT_RECEIVER);
        assert_eq!(view.first_group(), 1);
        assert_eq!(view.num_groups_spanned(), 2);
        assert_eq!(view.ci_message_version(), u7::new(0x11));
        assert_eq!(view.max_num_sysex8_streams(), 2);
    }

    #[test]
    fn function_block_info_defaults() {
        let options = FunctionBlockOptions::default();
        let m = stream::make_function_block_info_message(u7::new(0), &options, u4::new(0), u4::new(1));
        let view = FunctionBlockInfoView::new(&m).unwrap();
        assert!(view.active());
        assert_eq!(view.direction(), FunctionBlockOptions::BIDIRECTIONAL);
        assert_eq!(view.midi1(), FunctionBlockOptions::NOT_MIDI1);
        //With no explicit hint the direction stands in for it on the wire
        assert_eq!(view.ui_hint(), FunctionBlockOptions::BIDIRECTIONAL);

        let inactive = FunctionBlockOptions {
            active: false,
            ..FunctionBlockOptions::default()
        };
        let m = stream::make_function_block_info_message(u7::new(31), &inactive, u4::new(0), u4::new(1));
        let view = FunctionBlockInfoView::new(&m).unwrap();
        assert!(!view.active());
        assert_eq!(view.function_block(), u7::new(31));
    }

    #[test]
    #[should_panic]
    fn contradictory_ui_hint_rejected() {
        let options = FunctionBlockOptions {
            direction: FunctionBlockOptions::DIRECTION_INPUT,
            ui_hint: FunctionBlockOptions::UI_HINT_SENDER,
            ..FunctionBlockOptions::default()
        };
        stream::make_function_block_info_message(u7::new(0), &options, u4::new(0), u4::new(1));
    }
}

/// Test chunking and reassembly of names and other stream texts.
mod names {
    use super::*;
    use pretty_assertions::assert_eq;

    fn endpoint_name_run(len: usize) -> Vec<Packet> {
        let name = name_of_len(len);
        let mut run = Vec::new();
        stream::send_endpoint_name(&name, |packet| run.push(packet));
        run
    }

    fn endpoint_name_formats(run: &[Packet]) -> Vec<PacketFormat> {
        run.iter()
            .map(|packet| EndpointNameView::new(packet).unwrap().format())
            .collect()
    }

    #[test]
    fn endpoint_name_packet_counts() {
        let cases = [
            (0, 1),
            (13, 1),
            (14, 1),
            (15, 2),
            (27, 2),
            (28, 2),
            (29, 3),
        ];
        for &(len, expected) in cases.iter() {
            let run = endpoint_name_run(len);
            assert_eq!(
                run.len(),
                expected,
                "wrong packet count for a {} byte name",
                len
            );
        }
    }

    #[test]
    fn endpoint_name_formats_per_run() {
        assert_eq!(endpoint_name_formats(&endpoint_name_run(0)), formats![Complete]);
        assert_eq!(endpoint_name_formats(&endpoint_name_run(14)), formats![Complete]);
        assert_eq!(endpoint_name_formats(&endpoint_name_run(15)), formats![Start, End]);
        assert_eq!(endpoint_name_formats(&endpoint_name_run(28)), formats![Start, End]);
        assert_eq!(
            endpoint_name_formats(&endpoint_name_run(29)),
            formats![Start, Continue, End]
        );
    }

    #[test]
    fn endpoint_name_roundtrip() {
        for &len in [0, 1, 14, 15, 29, 60].iter() {
            let name = name_of_len(len);
            let run = endpoint_name_run(len);
            assert_eq!(
                collect_text(&run),
                vec![OwnedText::Endpoint(name.into_bytes())],
                "a {} byte name does not survive chunking",
                len
            );
        }
    }

    #[test]
    fn product_instance_id_never_continues() {
        for &(len, expected) in [(0, 1), (14, 1), (15, 2), (16, 2)].iter() {
            let id = name_of_len(len);
            let mut run = Vec::new();
            stream::send_product_instance_id(&id, |packet| run.push(packet));
            assert_eq!(run.len(), expected, "wrong packet count for a {} byte id", len);
            for packet in &run {
                let view = ProductInstanceIdView::new(packet).unwrap();
                assert_ne!(view.format(), PacketFormat::Continue);
            }
            assert_eq!(collect_text(&run), vec![OwnedText::Product(id.into_bytes())]);
        }
    }

    #[test]
    #[should_panic]
    fn oversized_product_instance_id_rejected() {
        stream::send_product_instance_id(&name_of_len(17), |_| {});
    }

    #[test]
    fn function_block_name_roundtrip() {
        let block = u7::new(9);
        for &(len, expected) in [(0, 1), (13, 1), (14, 2), (27, 3)].iter() {
            let name = name_of_len(len);
            let mut run = Vec::new();
            stream::send_function_block_name(block, &name, |packet| run.push(packet));
            assert_eq!(run.len(), expected, "wrong packet count for a {} byte name", len);
            for packet in &run {
                let view = FunctionBlockNameView::new(packet).unwrap();
                assert_eq!(view.function_block(), block, "every packet names its block");
            }
            assert_eq!(
                collect_text(&run),
                vec![OwnedText::FunctionBlock(block, name.into_bytes())]
            );
        }
    }

    #[test]
    fn foreign_tails_are_ignored() {
        let name = name_of_len(20);
        let mut run = Vec::new();
        stream::send_endpoint_name(&name, |packet| run.push(packet));
        //Splice the end of an unrelated function block name into the run
        run.insert(
            1,
            stream::make_function_block_name_message(PacketFormat::End, u7::new(1), "intruder"),
        );
        assert_eq!(collect_text(&run), vec![OwnedText::Endpoint(name.into_bytes())]);
    }

    #[test]
    fn mismatched_block_number_is_ignored() {
        let run = [
            stream::make_function_block_name_message(PacketFormat::Start, u7::new(1), "left"),
            stream::make_function_block_name_message(PacketFormat::End, u7::new(2), "wrong"),
            stream::make_function_block_name_message(PacketFormat::End, u7::new(1), "right"),
        ];
        assert_eq!(
            collect_text(&run),
            vec![OwnedText::FunctionBlock(u7::new(1), b"leftright".to_vec())]
        );
    }

    #[test]
    fn orphan_text_tails_deliver_nothing() {
        let run = [
            stream::make_endpoint_name_message(PacketFormat::Continue, "lost"),
            stream::make_endpoint_name_message(PacketFormat::End, "tail"),
        ];
        assert_eq!(collect_text(&run), vec![]);
    }
}

/// Test system exclusive packets, chunking and collection.
mod sysex {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sysex7_packet_layout() {
        let packet = make_sysex7_packet(
            PacketFormat::Start,
            u4::new(3),
            u7::slice_from_int(&[0x10, 0x20]),
        );
        assert_eq!(packet.words(), &[0x3312_1020, 0x0000_0000]);
        assert!(is_sysex7(&packet));
        let view = Sysex7View::new(&packet).unwrap();
        assert_eq!(view.group(), u4::new(3));
        assert_eq!(view.format(), PacketFormat::Start);
        assert_eq!(view.payload_size(), 2);
        assert_eq!(view.payload_byte(0), u7::new(0x10));
        assert_eq!(view.payload_byte(1), u7::new(0x20));
    }

    #[test]
    fn sysex8_packet_layout() {
        let packet = make_sysex8_packet(PacketFormat::Complete, u4::new(1), 0x42, &[0xAA, 0xBB]);
        assert_eq!(packet.words(), &[0x5103_42AA, 0xBB00_0000, 0, 0]);
        assert!(is_sysex8(&packet));
        let view = Sysex8View::new(&packet).unwrap();
        assert_eq!(view.group(), u4::new(1));
        assert_eq!(view.format(), PacketFormat::Complete);
        assert_eq!(view.stream_id(), 0x42);
        assert_eq!(view.payload_size(), 2);
        //SysEx8 payloads keep all eight bits
        assert_eq!(view.payload_byte(0), 0xAA);
        assert_eq!(view.payload_byte(1), 0xBB);
    }

    #[test]
    fn malformed_data_packets_rejected() {
        //Payload count 7 is out of range for sysex7
        let packet = Packet::from_words(&[0x3007_0000, 0]).unwrap();
        assert!(!is_sysex7(&packet));
        assert!(Sysex7View::new(&packet).is_none());
        //Status nibble above 0x30 is not a sysex7 format
        let packet = Packet::from_words(&[0x3040_0000, 0]).unwrap();
        assert!(!is_sysex7(&packet));
        //A sysex8 byte count of zero cannot even hold the stream ID
        let packet = Packet::from_words(&[0x5000_0000, 0, 0, 0]).unwrap();
        assert!(!is_sysex8(&packet));
        let packet = Packet::from_words(&[0x500F_0000, 0, 0, 0]).unwrap();
        assert!(!is_sysex8(&packet));
    }

    #[test]
    fn sysex7_single_packet_message() {
        let sysex = Sysex7 {
            manufacturer: Manufacturer::from_byte(u7::new(0x41)),
            data: u7::slice_from_int(&[1, 2, 3]),
        };
        let run = sysex7_run(&sysex, u4::new(0));
        assert_eq!(run.len(), 1);
        assert_eq!(run[0].words(), &[0x3004_4101, 0x0203_0000]);
        assert_eq!(
            collect_sysex7(&run),
            vec![(sysex.manufacturer, vec![1, 2, 3])]
        );
    }

    #[test]
    fn sysex7_roundtrip_manufacturer_forms() {
        let data = data_of_len(25);
        let manufacturers = [
            Manufacturer::from_byte(u7::new(0x41)),
            Manufacturer::from_bytes(u7::new(0x21), u7::new(0x09)),
            Manufacturer::DEVELOPMENT,
            Manufacturer::new(0),
        ];
        for &manufacturer in manufacturers.iter() {
            let sysex = Sysex7 {
                manufacturer,
                data: u7::slice_from_int(&data),
            };
            let run = sysex7_run(&sysex, u4::new(2));
            for packet in &run {
                assert_eq!(packet.group(), u4::new(2));
            }
            assert_eq!(
                collect_sysex7(&run),
                vec![(manufacturer, data.clone())],
                "manufacturer {:?} does not survive the trip",
                manufacturer
            );
        }
    }

    #[test]
    fn sysex7_chunk_formats() {
        //One head byte plus five data bytes exactly fill a single packet
        let data = data_of_len(5);
        let sysex = Sysex7 {
            manufacturer: Manufacturer::from_byte(u7::new(0x41)),
            data: u7::slice_from_int(&data),
        };
        let chunk_formats: Vec<_> = sysex7_run(&sysex, u4::new(0))
            .iter()
            .map(|packet| Sysex7View::new(packet).unwrap().format())
            .collect();
        assert_eq!(chunk_formats, formats![Complete]);

        let data = data_of_len(12);
        let sysex = Sysex7 {
            manufacturer: Manufacturer::from_byte(u7::new(0x41)),
            data: u7::slice_from_int(&data),
        };
        let chunk_formats: Vec<_> = sysex7_run(&sysex, u4::new(0))
            .iter()
            .map(|packet| Sysex7View::new(packet).unwrap().format())
            .collect();
        assert_eq!(chunk_formats, formats![Start, Continue, End]);
    }

    #[test]
    fn empty_sysex7_roundtrip() {
        let sysex = Sysex7 {
            manufacturer: Manufacturer::new(0),
            data: &[],
        };
        let run = sysex7_run(&sysex, u4::new(0));
        assert_eq!(run.len(), 1);
        assert_eq!(collect_sysex7(&run), vec![(Manufacturer::new(0), vec![])]);
    }

    #[test]
    fn sysex8_roundtrip_manufacturer_forms() {
        let data = data_of_len(30);
        let manufacturers = [
            Manufacturer::from_byte(u7::new(0x41)),
            Manufacturer::from_bytes(u7::new(0x21), u7::new(0x09)),
            Manufacturer::new(0),
        ];
        for &manufacturer in manufacturers.iter() {
            let sysex = Sysex8 {
                manufacturer,
                stream_id: 0x42,
                data: &data,
            };
            let run = sysex8_run(&sysex, u4::new(0));
            assert_eq!(
                collect_sysex8(&run),
                vec![(manufacturer, 0x42, data.clone())],
                "manufacturer {:?} does not survive the trip",
                manufacturer
            );
        }
    }

    #[test]
    fn sysex8_high_bit_data_survives() {
        let data: Vec<u8> = (0..40).map(|i| 0x80 | i as u8).collect();
        let sysex = Sysex8 {
            manufacturer: Manufacturer::from_bytes(u7::new(0x21), u7::new(0x09)),
            stream_id: 1,
            data: &data,
        };
        assert_eq!(
            collect_sysex8(&sysex8_run(&sysex, u4::new(0))),
            vec![(sysex.manufacturer, 1, data.clone())]
        );
    }

    #[test]
    fn sysex8_stream_id_demux() {
        let group = u4::new(0);
        let run = [
            make_sysex8_packet(PacketFormat::Start, group, 7, &[0xC1, 1, 2]),
            //An end packet for a stream nobody is collecting
            make_sysex8_packet(PacketFormat::End, group, 9, &[9, 9]),
            make_sysex8_packet(PacketFormat::End, group, 7, &[3, 4]),
        ];
        assert_eq!(
            collect_sysex8(&run),
            vec![(Manufacturer::from_byte(u7::new(0x41)), 7, vec![1, 2, 3, 4])]
        );
    }

    #[test]
    fn stream_id_is_visible_mid_collection() {
        let mut collector = Sysex8Collector::new();
        let packet = make_sysex8_packet(PacketFormat::Start, u4::new(0), 0x15, &[0xC1, 1]);
        collector.feed(&packet, |_| panic!("nothing complete yet"));
        assert_eq!(collector.stream_id(), 0x15);
    }

    #[test]
    fn new_message_preempts_unfinished_one() {
        let group = u4::new(0);
        let run = [
            make_sysex8_packet(PacketFormat::Start, group, 7, &[0xC1, 1]),
            make_sysex8_packet(PacketFormat::Start, group, 8, &[0xC2, 5]),
            make_sysex8_packet(PacketFormat::End, group, 8, &[6]),
        ];
        assert_eq!(
            collect_sysex8(&run),
            vec![(Manufacturer::from_byte(u7::new(0x42)), 8, vec![5, 6])]
        );

        let run = [
            make_sysex7_packet(PacketFormat::Start, group, u7::slice_from_int(&[0x41, 1, 2])),
            make_sysex7_packet(PacketFormat::Complete, group, u7::slice_from_int(&[0x7D])),
            //The previous run already ended, this tail is an orphan
            make_sysex7_packet(PacketFormat::End, group, u7::slice_from_int(&[3])),
        ];
        assert_eq!(
            collect_sysex7(&run),
            vec![(Manufacturer::DEVELOPMENT, vec![])]
        );
    }

    #[test]
    fn orphan_sysex_tails_deliver_nothing() {
        let group = u4::new(0);
        let run = [
            make_sysex7_packet(PacketFormat::Continue, group, u7::slice_from_int(&[1, 2])),
            make_sysex7_packet(PacketFormat::End, group, u7::slice_from_int(&[3])),
        ];
        assert_eq!(collect_sysex7(&run), vec![]);

        let run = [make_sysex8_packet(PacketFormat::End, group, 3, &[1])];
        assert_eq!(collect_sysex8(&run), vec![]);
    }

    #[test]
    fn collectors_ignore_unrelated_packets() {
        let mut collector = Sysex7Collector::new();
        let voice = Packet::from_words(&[0x4090_3C00, 0x1234_5678]).unwrap();
        let info = stream::make_endpoint_info_message(u7::new(1), false, 0b10, 0b00);
        collector.feed(&voice, |_| panic!("not sysex"));
        collector.feed(&info, |_| panic!("not sysex"));
    }

    #[test]
    fn oversized_messages_are_truncated() {
        let data = data_of_len(10);
        let sysex = Sysex7 {
            manufacturer: Manufacturer::from_byte(u7::new(0x41)),
            data: u7::slice_from_int(&data),
        };
        let run = sysex7_run(&sysex, u4::new(0));
        let mut out = Vec::new();
        let mut collector = Sysex7Collector::new();
        collector.set_max_data_size(4);
        for packet in &run {
            collector.feed(packet, |msg| {
                out.push((msg.manufacturer, u7::slice_as_int(msg.data).to_vec()));
            });
        }
        assert_eq!(out, vec![(sysex.manufacturer, data_of_len(4))]);

        //The collector stays usable after truncating
        let short = Sysex7 {
            manufacturer: Manufacturer::from_byte(u7::new(0x43)),
            data: u7::slice_from_int(&[1, 2]),
        };
        for packet in &sysex7_run(&short, u4::new(0)) {
            collector.feed(packet, |msg| {
                out.push((msg.manufacturer, u7::slice_as_int(msg.data).to_vec()));
            });
        }
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], (short.manufacturer, vec![1, 2]));
    }

    #[test]
    fn identity_request_predicate() {
        let request = Sysex7 {
            manufacturer: Manufacturer::UNIVERSAL_NON_REALTIME,
            data: u7::slice_from_int(&[0x00, 0x06, 0x01]),
        };
        assert!(request.is_identity_request());

        let wrong_sub_id = Sysex7 {
            manufacturer: Manufacturer::UNIVERSAL_NON_REALTIME,
            data: u7::slice_from_int(&[0x00, 0x06, 0x02]),
        };
        assert!(!wrong_sub_id.is_identity_request());

        let wrong_manufacturer = Sysex7 {
            manufacturer: Manufacturer::UNIVERSAL_REALTIME,
            data: u7::slice_from_int(&[0x00, 0x06, 0x01]),
        };
        assert!(!wrong_manufacturer.is_identity_request());

        let too_short = Sysex7 {
            manufacturer: Manufacturer::UNIVERSAL_NON_REALTIME,
            data: u7::slice_from_int(&[0x00]),
        };
        assert!(!too_short.is_identity_request());
    }

    #[test]
    fn identity_reply_bytes() {
        let reply = IdentityReply::new(
            Manufacturer::from_byte(u7::new(0x41)),
            u14::new(0x1234),
            u14::new(0x0AAA),
            u28::new(0x0ABC_DEF),
            u7::new(0),
        );
        assert_eq!(
            u7::slice_as_int(reply.data()),
            &[0x00, 0x06, 0x02, 0x41, 0x34, 0x24, 0x2A, 0x15, 0x6F, 0x1B, 0x2F, 0x05]
        );

        let reply = IdentityReply::new(
            Manufacturer::from_bytes(u7::new(0x21), u7::new(0x09)),
            u14::new(0x1234),
            u14::new(0x0AAA),
            u28::new(0x0ABC_DEF),
            u7::new(0x10),
        );
        assert_eq!(
            u7::slice_as_int(reply.data()),
            &[0x10, 0x06, 0x02, 0x00, 0x21, 0x09, 0x34, 0x24, 0x2A, 0x15, 0x6F, 0x1B, 0x2F, 0x05]
        );
    }

    #[test]
    fn identity_reply_from_identity() {
        let identity = DeviceIdentity {
            manufacturer: Manufacturer::from_byte(u7::new(0x41)),
            family: u14::new(0x1234),
            model: u14::new(0x0AAA),
            revision: u28::new(0x0ABC_DEF),
        };
        let reply = IdentityReply::from_identity(&identity, u7::new(0x7F));
        assert_eq!(
            u7::slice_as_int(reply.data()),
            &[0x7F, 0x06, 0x02, 0x41, 0x34, 0x24, 0x2A, 0x15, 0x6F, 0x1B, 0x2F, 0x05]
        );
    }

    #[test]
    fn identity_reply_roundtrip() {
        let reply = IdentityReply::new(
            Manufacturer::from_byte(u7::new(0x41)),
            u14::new(0x0102),
            u14::new(0x0304),
            u28::new(1),
            u7::new(0),
        );
        let sysex = reply.as_sysex7();
        assert_eq!(sysex.manufacturer, Manufacturer::UNIVERSAL_NON_REALTIME);
        let run = sysex7_run(&sysex, u4::new(0));
        assert_eq!(run.len(), 3);
        assert_eq!(
            collect_sysex7(&run),
            vec![(
                Manufacturer::UNIVERSAL_NON_REALTIME,
                u7::slice_as_int(reply.data()).to_vec()
            )]
        );
    }
}

/// Test the collector buffers themselves.
mod buffers {
    use super::*;
    use pretty_assertions::assert_eq;

    crate::stack_buffer! {
        struct TinyBuf([u8; 8]);
    }

    #[test]
    fn stack_buffer_limits() {
        let mut buf = TinyBuf::new();
        assert_eq!(TinyBuf::MAX_CAP, 8);
        buf.push(&[1, 2, 3, 4, 5, 6]).unwrap();
        assert!(buf.push(&[7, 8, 9]).is_err(), "pushing past capacity fails");
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4, 5, 6]);
        buf.push(&[7, 8]).unwrap();
        assert_eq!(buf.as_slice().len(), 8);
        buf.clear();
        assert!(buf.as_slice().is_empty());
    }

    #[test]
    fn full_stack_buffer_truncates_collection() {
        let data = data_of_len(20);
        let sysex = Sysex7 {
            manufacturer: Manufacturer::from_byte(u7::new(0x41)),
            data: u7::slice_from_int(&data),
        };
        let run = sysex7_run(&sysex, u4::new(0));
        let mut out = Vec::new();
        let mut collector = Sysex7Collector::with_buffer(TinyBuf::new());
        for packet in &run {
            collector.feed(packet, |msg| {
                out.push(u7::slice_as_int(msg.data).to_vec());
            });
        }
        assert_eq!(out, vec![data_of_len(8)]);
    }

    #[test]
    fn with_buffer_discards_stale_contents() {
        let mut dirty = TinyBuf::new();
        dirty.push(&[0x66; 4]).unwrap();
        let mut collector = Sysex7Collector::with_buffer(dirty);
        let packet = make_sysex7_packet(
            PacketFormat::Complete,
            u4::new(0),
            u7::slice_from_int(&[0x41, 1]),
        );
        let mut out = Vec::new();
        collector.feed(&packet, |msg| out.push(u7::slice_as_int(msg.data).to_vec()));
        assert_eq!(out, vec![vec![1]]);
    }

    #[cfg(feature = "alloc")]
    #[test]
    fn vec_buffer_collects() {
        let sysex = Sysex8 {
            manufacturer: Manufacturer::new(0),
            stream_id: 0,
            data: &data_of_len(100),
        };
        let run = sysex8_run(&sysex, u4::new(0));
        let mut out = Vec::new();
        let mut collector = Sysex8Collector::with_buffer(Vec::new());
        for packet in &run {
            collector.feed(packet, |msg| out.push(msg.data.to_vec()));
        }
        assert_eq!(out, vec![data_of_len(100)]);
    }
}
