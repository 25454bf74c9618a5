use std::convert::TryInto;

/// One field in a template record. `enterprise_number` is set when the top
/// bit of the on-wire element id was set (RFC 7011 section 3.2); the
/// enterprise bit is stripped from `element_id` itself so callers never have
/// to mask it again.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateField {
    pub element_id: u16,
    pub length: u16,
    pub enterprise_number: Option<u32>,
}

impl TemplateField {
    const ENTERPRISE_BIT: u16 = 0x8000;

    /// Reads one field specifier. IPFIX field specifiers are 4 octets, plus
    /// 4 more for the enterprise number when the top bit is set. NetFlow v9
    /// has no enterprise bit; callers pass `enterprise_capable = false`.
    pub fn read(buf: &[u8], enterprise_capable: bool) -> Result<(Self, usize), String> {
        if buf.len() < 4 {
            return Err(format!(
                "short template field: need at least 4 bytes, got {}",
                buf.len()
            ));
        }
        let raw_id = u16::from_be_bytes(buf[0..2].try_into().unwrap());
        let length = u16::from_be_bytes(buf[2..4].try_into().unwrap());

        if enterprise_capable && raw_id & Self::ENTERPRISE_BIT != 0 {
            if buf.len() < 8 {
                return Err(format!(
                    "short enterprise template field: need 8 bytes, got {}",
                    buf.len()
                ));
            }
            let enterprise_number = u32::from_be_bytes(buf[4..8].try_into().unwrap());
            Ok((
                TemplateField {
                    element_id: raw_id & !Self::ENTERPRISE_BIT,
                    length,
                    enterprise_number: Some(enterprise_number),
                },
                8,
            ))
        } else {
            Ok((
                TemplateField {
                    element_id: raw_id,
                    length,
                    enterprise_number: None,
                },
                4,
            ))
        }
    }
}

/// A cached template: a (template id, exporter, domain) triple maps to this
/// via `template_cache::TemplateCache`. `scope_field_count` is nonzero only
/// for options templates (RFC 7011 section 3.4.2 / RFC 3954 section 8).
#[derive(Debug, Clone)]
pub struct Template {
    pub id: u16,
    pub fields: Vec<TemplateField>,
    pub scope_field_count: u16,
    pub version: u32,
}
