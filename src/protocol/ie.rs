//! Well-known IPFIX/NetFlow v9 Information Element identifiers.
//!
//! A whole-registry enum over every IANA-assigned IPFIX element would have
//! to grow every time a new IE is assigned, and a record carrying an
//! unrecognized element would simply fail to parse. This relay only cares
//! about a handful of elements (the AS pair, plus what `stats templates`
//! reports about a set), so element IDs are carried as raw `u16`s and
//! matched against named constants here; anything else falls through to an
//! opaque byte span.

pub const OCTET_DELTA_COUNT: u16 = 1;
pub const PACKET_DELTA_COUNT: u16 = 2;
pub const PROTOCOL_IDENTIFIER: u16 = 4;
pub const SOURCE_TRANSPORT_PORT: u16 = 7;
pub const IPV4_SRC_ADDR: u16 = 8;
pub const INPUT_SNMP: u16 = 10;
pub const DESTINATION_TRANSPORT_PORT: u16 = 11;
pub const IPV4_DST_ADDR: u16 = 12;
pub const OUTPUT_SNMP: u16 = 14;
pub const BGP_SOURCE_AS_NUMBER: u16 = 16;
pub const BGP_DESTINATION_AS_NUMBER: u16 = 17;
pub const LAST_SWITCHED: u16 = 21;
pub const FIRST_SWITCHED: u16 = 22;
pub const IPV6_SRC_ADDR: u16 = 27;
pub const IPV6_DST_ADDR: u16 = 28;
pub const FLOW_SAMPLER_ID: u16 = 48;
pub const FLOW_START_SECONDS: u16 = 150;
pub const FLOW_END_SECONDS: u16 = 151;

/// Elements that are only ever carried in a 2- or 4-byte field in practice.
/// Used by the AS extractor to decide whether a field is even a candidate
/// before looking at the template's declared length.
pub fn is_as_number(element_id: u16) -> bool {
    element_id == BGP_SOURCE_AS_NUMBER || element_id == BGP_DESTINATION_AS_NUMBER
}

/// A short human name for the handful of elements the stats server reports
/// by name (`stats templates`); anything else is reported by numeric id.
pub fn name(element_id: u16) -> Option<&'static str> {
    match element_id {
        OCTET_DELTA_COUNT => Some("octetDeltaCount"),
        PACKET_DELTA_COUNT => Some("packetDeltaCount"),
        PROTOCOL_IDENTIFIER => Some("protocolIdentifier"),
        SOURCE_TRANSPORT_PORT => Some("sourceTransportPort"),
        IPV4_SRC_ADDR => Some("sourceIPv4Address"),
        INPUT_SNMP => Some("ingressInterface"),
        DESTINATION_TRANSPORT_PORT => Some("destinationTransportPort"),
        IPV4_DST_ADDR => Some("destinationIPv4Address"),
        OUTPUT_SNMP => Some("egressInterface"),
        BGP_SOURCE_AS_NUMBER => Some("bgpSourceAsNumber"),
        BGP_DESTINATION_AS_NUMBER => Some("bgpDestinationAsNumber"),
        LAST_SWITCHED => Some("flowEndSysUpTime"),
        FIRST_SWITCHED => Some("flowStartSysUpTime"),
        IPV6_SRC_ADDR => Some("sourceIPv6Address"),
        IPV6_DST_ADDR => Some("destinationIPv6Address"),
        FLOW_SAMPLER_ID => Some("flowSamplerID"),
        FLOW_START_SECONDS => Some("flowStartSeconds"),
        FLOW_END_SECONDS => Some("flowEndSeconds"),
        _ => None,
    }
}
