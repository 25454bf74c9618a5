use flowrelay::protocol::decode_datagram;
use flowrelay::protocol::template_cache::{TemplateCache, TemplateKey};
use hex_literal::hex;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

fn exporter(last_octet: u8) -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(198, 51, 100, last_octet))
}

/// S3: a data set arrives before its template is known (e.g. the template
/// was evicted, or the exporter is replaying an old sequence). The set is
/// counted as orphaned rather than decoded, and the dispatcher still
/// returns successfully -- the caller forwards the datagram unmodified.
#[test]
fn a_data_set_with_no_known_template_is_counted_as_orphaned() {
    let cache = TemplateCache::new(2, 16);
    let exporter = exporter(5);

    let data_msg = hex!(
        "000a 001a 00000000 00000002 00000001"
        "0101 000a"
        "0a000001 fc00"
    );
    let outcome = decode_datagram(&data_msg, exporter, &cache).unwrap();
    assert_eq!(outcome.orphan_data_sets, 1);
    assert_eq!(outcome.records.len(), 0);
    assert_eq!(outcome.decode_errors, 0);
}

/// Invariant: a template idle longer than the configured timeout is swept
/// from the cache, and a data set referencing it afterwards is orphaned
/// again.
#[test]
fn an_idle_template_is_evicted_and_later_data_is_orphaned() {
    let cache = TemplateCache::new(1, 16);
    let exporter = exporter(6);

    let template_msg = hex!(
        "000a 0020 00000000 00000001 00000001"
        "0002 0010"
        "0101 0002"
        "0008 0004"
        "0010 0002"
    );
    decode_datagram(&template_msg, exporter, &cache).unwrap();

    let key = TemplateKey {
        exporter,
        domain_id: 1,
        template_id: 0x0101,
    };
    assert!(cache.get(&key).is_some());

    let evicted = cache.sweep(Duration::from_secs(0));
    assert_eq!(evicted, 1);

    let data_msg = hex!(
        "000a 001a 00000000 00000002 00000001"
        "0101 000a"
        "0a000001 fc00"
    );
    let outcome = decode_datagram(&data_msg, exporter, &cache).unwrap();
    assert_eq!(outcome.orphan_data_sets, 1);
}

/// Per-exporter isolation: two exporters reusing the same template id get
/// independent template definitions, keyed by exporter address.
#[test]
fn two_exporters_reusing_the_same_template_id_do_not_collide() {
    let cache = TemplateCache::new(4, 16);
    let exporter_a = exporter(10);
    let exporter_b = exporter(11);

    let template_a = hex!(
        "000a 001c 00000000 00000001 00000001"
        "0002 000c"
        "0100 0001"
        "0008 0004"
    );
    let template_b = hex!(
        "000a 0020 00000000 00000001 00000002"
        "0002 0010"
        "0100 0002"
        "0008 0004"
        "0010 0002"
    );
    decode_datagram(&template_a, exporter_a, &cache).unwrap();
    decode_datagram(&template_b, exporter_b, &cache).unwrap();

    let key_a = TemplateKey {
        exporter: exporter_a,
        domain_id: 1,
        template_id: 0x0100,
    };
    let key_b = TemplateKey {
        exporter: exporter_b,
        domain_id: 1,
        template_id: 0x0100,
    };

    assert_eq!(cache.get(&key_a).unwrap().fields.len(), 1);
    assert_eq!(cache.get(&key_b).unwrap().fields.len(), 2);
}

/// S4: a template id is redefined with a different field layout. The cache
/// replaces the old definition and bumps its version; a template re-sent
/// with the same layout leaves the version untouched.
#[test]
fn redefining_a_template_with_a_new_layout_bumps_its_version() {
    let cache = TemplateCache::new(2, 16);
    let exporter = exporter(20);

    let one_field = hex!(
        "000a 001c 00000000 00000001 00000001"
        "0002 000c"
        "0100 0001"
        "0008 0004"
    );
    decode_datagram(&one_field, exporter, &cache).unwrap();

    let key = TemplateKey {
        exporter,
        domain_id: 1,
        template_id: 0x0100,
    };
    assert_eq!(cache.get(&key).unwrap().version, 0);

    decode_datagram(&one_field, exporter, &cache).unwrap();
    assert_eq!(cache.get(&key).unwrap().version, 0);

    let two_fields = hex!(
        "000a 0020 00000000 00000002 00000001"
        "0002 0010"
        "0100 0002"
        "0008 0004"
        "0010 0002"
    );
    decode_datagram(&two_fields, exporter, &cache).unwrap();
    let redefined = cache.get(&key).unwrap();
    assert_eq!(redefined.fields.len(), 2);
    assert_eq!(redefined.version, 1);
}
