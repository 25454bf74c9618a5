use std::net::IpAddr;

use super::header::{Netflow9Header, SetHeader};
use super::record::{decode_data_set, DecodeOutcome};
use super::template::{Template, TemplateField};
use super::template_cache::{TemplateCache, TemplateKey};

pub fn decode(
    datagram: &[u8],
    exporter: IpAddr,
    cache: &TemplateCache,
) -> Result<DecodeOutcome, String> {
    let header = Netflow9Header::read(datagram)?;
    if header.version != Netflow9Header::VERSION {
        return Err(format!(
            "not a NetFlow v9 message (version {})",
            header.version
        ));
    }

    let mut outcome = DecodeOutcome::default();
    let mut offset = Netflow9Header::SIZE;

    while offset + SetHeader::SIZE <= datagram.len() {
        let set_header = match SetHeader::read(&datagram[offset..]) {
            Ok(h) => h,
            Err(_) => break,
        };
        if set_header.length < SetHeader::SIZE as u16 {
            outcome.decode_errors += 1;
            break;
        }
        let set_end = offset + set_header.length as usize;
        if set_end > datagram.len() {
            outcome.decode_errors += 1;
            break;
        }
        let content_start = offset + SetHeader::SIZE;
        let content = &datagram[content_start..set_end];

        match set_header.id {
            Netflow9Header::TEMPLATE_SET_ID => {
                outcome.templates_learned +=
                    read_template_set(content, header.source_id, exporter, cache)?;
            }
            Netflow9Header::OPTIONS_TEMPLATE_SET_ID => {
                outcome.templates_learned +=
                    read_options_template_set(content, header.source_id, exporter, cache)?;
            }
            id if id >= SetHeader::MIN_DATA_SET_ID => {
                let key = TemplateKey {
                    exporter,
                    domain_id: header.source_id,
                    template_id: id,
                };
                match cache.get(&key) {
                    Some(template) => {
                        outcome
                            .records
                            .extend(decode_data_set(content, content_start, &template));
                    }
                    None => outcome.orphan_data_sets += 1,
                }
            }
            _ => outcome.decode_errors += 1,
        }

        offset = set_end;
    }

    Ok(outcome)
}

fn read_template_set(
    content: &[u8],
    source_id: u32,
    exporter: IpAddr,
    cache: &TemplateCache,
) -> Result<usize, String> {
    let mut offset = 0;
    let mut learned = 0;

    while offset + 4 <= content.len() {
        let template_id = u16::from_be_bytes([content[offset], content[offset + 1]]);
        let field_count = u16::from_be_bytes([content[offset + 2], content[offset + 3]]);
        offset += 4;

        if field_count == 0 {
            continue;
        }

        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let (field, consumed) = TemplateField::read(&content[offset..], false)?;
            fields.push(field);
            offset += consumed;
        }

        cache.put(
            TemplateKey {
                exporter,
                domain_id: source_id,
                template_id,
            },
            Template {
                id: template_id,
                fields,
                scope_field_count: 0,
                version: 0,
            },
        );
        learned += 1;
    }

    Ok(learned)
}

/// NetFlow v9 options templates (RFC 3954 section 8) give scope and option
/// field lists as byte lengths rather than field counts, and have no
/// enterprise bit -- a different enough shape from IPFIX's options
/// templates that it gets its own reader rather than sharing `ipfix`'s.
fn read_options_template_set(
    content: &[u8],
    source_id: u32,
    exporter: IpAddr,
    cache: &TemplateCache,
) -> Result<usize, String> {
    const HEADER_SIZE: usize = 6;
    let mut offset = 0;
    let mut learned = 0;

    while offset + HEADER_SIZE <= content.len() {
        let template_id = u16::from_be_bytes([content[offset], content[offset + 1]]);
        let scope_length = u16::from_be_bytes([content[offset + 2], content[offset + 3]]) as usize;
        let option_length = u16::from_be_bytes([content[offset + 4], content[offset + 5]]) as usize;
        offset += HEADER_SIZE;

        if scope_length == 0 && option_length == 0 {
            continue;
        }
        if offset + scope_length + option_length > content.len() {
            return Err("truncated NetFlow v9 options template".to_string());
        }

        let scope_field_count = (scope_length / 4) as u16;
        let mut fields = Vec::with_capacity((scope_length + option_length) / 4);

        let mut field_offset = offset;
        let scope_end = offset + scope_length;
        while field_offset + 4 <= scope_end {
            let (field, consumed) = TemplateField::read(&content[field_offset..], false)?;
            fields.push(field);
            field_offset += consumed;
        }

        let option_end = scope_end + option_length;
        while field_offset + 4 <= option_end {
            let (field, consumed) = TemplateField::read(&content[field_offset..], false)?;
            fields.push(field);
            field_offset += consumed;
        }

        offset = option_end;

        cache.put(
            TemplateKey {
                exporter,
                domain_id: source_id,
                template_id,
            },
            Template {
                id: template_id,
                fields,
                scope_field_count,
                version: 0,
            },
        );
        learned += 1;
    }

    Ok(learned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    fn exporter() -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(198, 51, 100, 7))
    }

    #[test]
    fn learns_a_template_then_decodes_a_data_set() {
        let cache = TemplateCache::new(1, 16);

        // header (20) + set header (4) + template header (4) + 2 fields (4 each)
        let template_msg = hex!(
            "0009 0001 00000001 5f000000 00000001 00000001"
            "0000 0010"
            "0100 0002"
            "0008 0004"
            "0011 0002"
        );
        let outcome = decode(&template_msg, exporter(), &cache).unwrap();
        assert_eq!(outcome.templates_learned, 1);

        let data_msg = hex!(
            "0009 0001 00000002 5f000000 00000002 00000001"
            "0100 000a"
            "c6336401 0032"
        );
        let outcome = decode(&data_msg, exporter(), &cache).unwrap();
        assert_eq!(outcome.records.len(), 1);
        let dst_as = outcome.records[0].field(17).unwrap();
        assert_eq!(
            dst_as.value(&data_msg),
            Some(crate::protocol::field::FieldValue::U16(0x0032))
        );
    }

    #[test]
    fn rejects_a_non_v9_version() {
        let cache = TemplateCache::new(1, 16);
        let buf = hex!("000a 0001 00000000 00000000 00000000 00000000");
        assert!(decode(&buf, exporter(), &cache).is_err());
    }
}
