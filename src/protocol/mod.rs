pub mod field;
pub mod header;
pub mod ie;
pub mod ipfix;
pub mod netflow9;
pub mod record;
pub mod template;
pub mod template_cache;

use std::net::IpAddr;

use header::{IpfixHeader, Netflow9Header};
use record::DecodeOutcome;
use template_cache::TemplateCache;

/// Dispatches a datagram to the NetFlow v9 or IPFIX decoder by its first
/// two octets, which are the version number in both protocols. Any other
/// version is a decode error, not a panic -- an exporter sending NetFlow v5
/// or garbage must not be able to take down a worker thread.
pub fn decode_datagram(
    datagram: &[u8],
    exporter: IpAddr,
    cache: &TemplateCache,
) -> Result<DecodeOutcome, String> {
    if datagram.len() < 2 {
        return Err("datagram shorter than a version field".to_string());
    }
    let version = u16::from_be_bytes([datagram[0], datagram[1]]);
    match version {
        Netflow9Header::VERSION => netflow9::decode(datagram, exporter, cache),
        IpfixHeader::VERSION => ipfix::decode(datagram, exporter, cache),
        other => Err(format!("unsupported flow export version {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    #[test]
    fn dispatches_on_version_field() {
        let cache = TemplateCache::new(1, 16);
        let exporter = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 1));

        let ipfix_header_only = hex!("000a 0010 00000000 00000000 00000000");
        assert!(decode_datagram(&ipfix_header_only, exporter, &cache).is_ok());

        let v9_header_only = hex!("0009 0000 00000000 00000000 00000000 00000000");
        assert!(decode_datagram(&v9_header_only, exporter, &cache).is_ok());

        let garbage = hex!("0005 0000");
        assert!(decode_datagram(&garbage, exporter, &cache).is_err());
    }
}
