use flowrelay::protocol::decode_datagram;
use flowrelay::protocol::field::FieldValue;
use flowrelay::protocol::template_cache::TemplateCache;
use hex_literal::hex;
use std::net::{IpAddr, Ipv4Addr};

fn exporter(last_octet: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(203, 0, 113, last_octet))
}

/// S1: a NetFlow v9 exporter sends a template, then a data set against it.
/// One record decodes, carrying a resolvable destination AS.
#[test]
fn netflow_v9_template_then_data_produces_one_record_with_as() {
    let cache = TemplateCache::new(4, 64);
    let exporter = exporter(1);

    let template_msg = hex!(
        "0009 0001 00000001 5f000000 00000001 00000001"
        "0000 0010"
        "0100 0002"
        "0008 0004"
        "0011 0002"
    );
    let outcome = decode_datagram(&template_msg, exporter, &cache).unwrap();
    assert_eq!(outcome.templates_learned, 1);
    assert_eq!(outcome.records.len(), 0);

    let data_msg = hex!(
        "0009 0001 00000002 5f000000 00000002 00000001"
        "0100 000a"
        "c6336401 0032"
    );
    let outcome = decode_datagram(&data_msg, exporter, &cache).unwrap();
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.orphan_data_sets, 0);

    let record = &outcome.records[0];
    let dst_as = record.field(17).unwrap();
    assert_eq!(dst_as.value(&data_msg), Some(FieldValue::U16(0x0032)));
}

/// S2: an IPFIX exporter advertises a template with a variable-length
/// field, then sends a data set using the 1-octet length form of that
/// encoding (RFC 7011 section 7).
#[test]
fn ipfix_variable_length_field_round_trips_through_the_short_form() {
    let cache = TemplateCache::new(4, 64);
    let exporter = exporter(2);

    // header(16) + set header(4) + template header(4) + 2 fields(4 each):
    // sourceIPv4Address(8)/4 fixed, then a variable-length field
    // (elementId 241 here is arbitrary; length 0xFFFF marks it variable).
    let template_msg = hex!(
        "000a 0020 00000000 00000001 00000001"
        "0002 0010"
        "0101 0002"
        "0008 0004"
        "00f1 ffff"
    );
    let outcome = decode_datagram(&template_msg, exporter, &cache).unwrap();
    assert_eq!(outcome.templates_learned, 1);

    // data: set header(4), template id 0x0101, content = 10.0.0.1 (4) +
    // variable field: length byte 0x03 + 3 payload bytes = 4 more bytes.
    // content length = 8, set length = 4 + 8 = 12 (0x0c), msg length = 16+4+8=28
    let data_msg = hex!(
        "000a 001c 00000000 00000002 00000001"
        "0101 000c"
        "0a000001 03aabbcc"
    );
    let outcome = decode_datagram(&data_msg, exporter, &cache).unwrap();
    assert_eq!(outcome.records.len(), 1);
    let variable_field = outcome.records[0].field(0x00f1).unwrap();
    assert_eq!(variable_field.length, 3);
    assert_eq!(
        variable_field.value(&data_msg),
        Some(FieldValue::Dyn(vec![0xaa, 0xbb, 0xcc]))
    );
}

/// S4: a template id is redefined with a different field layout; data sets
/// sent after the redefinition decode against the new layout, not the old
/// one.
#[test]
fn a_redefined_template_id_applies_to_subsequent_data_sets() {
    let cache = TemplateCache::new(4, 64);
    let exporter = exporter(3);

    // First definition of template 256: one 4-byte field (sourceIPv4Address).
    let first_template = hex!(
        "0009 0001 00000000 5f000000 00000001 00000001"
        "0000 000c"
        "0100 0001"
        "0008 0004"
    );
    decode_datagram(&first_template, exporter, &cache).unwrap();

    let data_against_first = hex!(
        "0009 0001 00000000 5f000000 00000002 00000001"
        "0100 0008"
        "0a000001"
    );
    let outcome = decode_datagram(&data_against_first, exporter, &cache).unwrap();
    assert_eq!(outcome.records[0].fields.len(), 1);

    // Redefine template 256 with two fields: source and destination AS.
    let second_template = hex!(
        "0009 0001 00000000 5f000000 00000003 00000001"
        "0000 0010"
        "0100 0002"
        "0010 0002"
        "0011 0002"
    );
    decode_datagram(&second_template, exporter, &cache).unwrap();

    let data_against_second = hex!(
        "0009 0001 00000000 5f000000 00000004 00000001"
        "0100 0008"
        "fc00 0032"
    );
    let outcome = decode_datagram(&data_against_second, exporter, &cache).unwrap();
    assert_eq!(outcome.records[0].fields.len(), 2);
    let src_as = outcome.records[0].field(16).unwrap();
    assert_eq!(
        src_as.value(&data_against_second),
        Some(FieldValue::U16(0xfc00))
    );
}

/// An unsupported version (NetFlow v5) is a counted decode error, not a
/// panic.
#[test]
fn an_unsupported_version_is_rejected_without_panicking() {
    let cache = TemplateCache::new(1, 16);
    let v5_like = hex!("0005 0001 00000000 00000000");
    assert!(decode_datagram(&v5_like, exporter(9), &cache).is_err());
}
