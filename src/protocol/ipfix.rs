use std::net::IpAddr;

use super::header::{IpfixHeader, SetHeader};
use super::record::{decode_data_set, DecodeOutcome};
use super::template::{Template, TemplateField};
use super::template_cache::{TemplateCache, TemplateKey};

pub fn decode(
    datagram: &[u8],
    exporter: IpAddr,
    cache: &TemplateCache,
) -> Result<DecodeOutcome, String> {
    let header = IpfixHeader::read(datagram)?;
    if header.version != IpfixHeader::VERSION {
        return Err(format!("not an IPFIX message (version {})", header.version));
    }
    if header.length as usize != datagram.len() {
        return Err(format!(
            "IPFIX header length {} does not match datagram length {}",
            header.length,
            datagram.len()
        ));
    }

    let mut outcome = DecodeOutcome::default();
    let mut offset = IpfixHeader::SIZE;

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
            SetHeader::TEMPLATE_SET_ID => {
                outcome.templates_learned +=
                    read_template_set(content, header.domain_id, exporter, cache)?;
            }
            SetHeader::OPTIONS_TEMPLATE_SET_ID => {
                outcome.templates_learned +=
                    read_options_template_set(content, header.domain_id, exporter, cache)?;
            }
            id if id >= SetHeader::MIN_DATA_SET_ID => {
                let key = TemplateKey {
                    exporter,
                    domain_id: header.domain_id,
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
    domain_id: u32,
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
            // withdrawal of a previously-advertised template; nothing to learn.
            continue;
        }

        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let (field, consumed) = TemplateField::read(&content[offset..], true)?;
            fields.push(field);
            offset += consumed;
        }

        cache.put(
            TemplateKey {
                exporter,
                domain_id,
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

fn read_options_template_set(
    content: &[u8],
    domain_id: u32,
    exporter: IpAddr,
    cache: &TemplateCache,
) -> Result<usize, String> {
    const HEADER_SIZE: usize = 6;
    let mut offset = 0;
    let mut learned = 0;

    while offset + HEADER_SIZE <= content.len() {
        let template_id = u16::from_be_bytes([content[offset], content[offset + 1]]);
        let field_count = u16::from_be_bytes([content[offset + 2], content[offset + 3]]);
        let scope_field_count = u16::from_be_bytes([content[offset + 4], content[offset + 5]]);
        offset += HEADER_SIZE;

        if field_count == 0 {
            continue;
        }

        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let (field, consumed) = TemplateField::read(&content[offset..], true)?;
            fields.push(field);
            offset += consumed;
        }

        cache.put(
            TemplateKey {
                exporter,
                domain_id,
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
