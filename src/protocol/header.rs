use std::convert::TryInto;

/// IPFIX message header, RFC 7011 section 3.1.
#[derive(Debug, PartialEq)]
pub struct IpfixHeader {
    pub version: u16,
    pub length: u16,
    pub export_time: u32,
    pub seq_number: u32,
    pub domain_id: u32,
}

impl IpfixHeader {
    pub const SIZE: usize = 16;
    pub const VERSION: u16 = 10;

    pub fn read(buf: &[u8]) -> Result<Self, String> {
        if buf.len() < Self::SIZE {
            return Err(format!(
                "short IPFIX header: need {} bytes, got {}",
                Self::SIZE,
                buf.len()
            ));
        }
        Ok(IpfixHeader {
            version: u16::from_be_bytes(buf[0..2].try_into().unwrap()),
            length: u16::from_be_bytes(buf[2..4].try_into().unwrap()),
            export_time: u32::from_be_bytes(buf[4..8].try_into().unwrap()),
            seq_number: u32::from_be_bytes(buf[8..12].try_into().unwrap()),
            domain_id: u32::from_be_bytes(buf[12..16].try_into().unwrap()),
        })
    }
}

/// NetFlow v9 message header, RFC 3954 section 5.1. Twenty octets, four more
/// than IPFIX's, carrying an explicit record `count` rather than a total
/// message length.
#[derive(Debug, PartialEq)]
pub struct Netflow9Header {
    pub version: u16,
    pub count: u16,
    pub sys_uptime: u32,
    pub unix_secs: u32,
    pub sequence_number: u32,
    pub source_id: u32,
}

impl Netflow9Header {
    pub const SIZE: usize = 20;
    pub const VERSION: u16 = 9;

    /// RFC 3954 section 5.2: NetFlow v9 template/options-template set ids,
    /// distinct from IPFIX's (`SetHeader::TEMPLATE_SET_ID` is 2, not 0).
    pub const TEMPLATE_SET_ID: u16 = 0;
    pub const OPTIONS_TEMPLATE_SET_ID: u16 = 1;

    pub fn read(buf: &[u8]) -> Result<Self, String> {
        if buf.len() < Self::SIZE {
            return Err(format!(
                "short NetFlow v9 header: need {} bytes, got {}",
                Self::SIZE,
                buf.len()
            ));
        }
        Ok(Netflow9Header {
            version: u16::from_be_bytes(buf[0..2].try_into().unwrap()),
            count: u16::from_be_bytes(buf[2..4].try_into().unwrap()),
            sys_uptime: u32::from_be_bytes(buf[4..8].try_into().unwrap()),
            unix_secs: u32::from_be_bytes(buf[8..12].try_into().unwrap()),
            sequence_number: u32::from_be_bytes(buf[12..16].try_into().unwrap()),
            source_id: u32::from_be_bytes(buf[16..20].try_into().unwrap()),
        })
    }
}

/// Set header, shared verbatim between NetFlow v9 and IPFIX (RFC 7011
/// section 3.3.2 / RFC 3954 section 5.2).
#[derive(Debug, PartialEq)]
pub struct SetHeader {
    pub id: u16,
    pub length: u16,
}

impl SetHeader {
    pub const SIZE: usize = 4;

    /// IPFIX-only (RFC 7011 section 3.3.2); NetFlow v9 uses
    /// `Netflow9Header::TEMPLATE_SET_ID`/`OPTIONS_TEMPLATE_SET_ID` (0/1)
    /// instead.
    pub const TEMPLATE_SET_ID: u16 = 2;
    pub const OPTIONS_TEMPLATE_SET_ID: u16 = 3;
    pub const MIN_DATA_SET_ID: u16 = 256;

    pub fn read(buf: &[u8]) -> Result<Self, String> {
        if buf.len() < Self::SIZE {
            return Err(format!(
                "short set header: need {} bytes, got {}",
                Self::SIZE,
                buf.len()
            ));
        }
        Ok(SetHeader {
            id: u16::from_be_bytes(buf[0..2].try_into().unwrap()),
            length: u16::from_be_bytes(buf[2..4].try_into().unwrap()),
        })
    }

    #[inline]
    pub fn content_size(&self) -> usize {
        self.length as usize - Self::SIZE
    }
}
