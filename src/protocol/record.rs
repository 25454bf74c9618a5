use super::field::FieldValue;
use super::template::Template;

/// One decoded field, referencing back into the original datagram buffer
/// rather than copying its value out. This is what lets the AS enrichment
/// path rewrite a field in place (`enrichment.enrich_in_place`) without
/// re-parsing or reserializing the record: it already knows exactly which
/// bytes to overwrite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedField {
    pub element_id: u16,
    pub enterprise_number: Option<u32>,
    pub offset: usize,
    pub length: usize,
}

impl DecodedField {
    pub fn value<'a>(&self, datagram: &'a [u8]) -> Option<FieldValue> {
        FieldValue::decode(datagram, self.offset, self.length)
    }
}

/// One decoded data record: the template it was decoded against plus the
/// byte-offset span of each field.
#[derive(Debug, Clone)]
pub struct DecodedRecord {
    pub template_id: u16,
    pub fields: Vec<DecodedField>,
}

impl DecodedRecord {
    pub fn field(&self, element_id: u16) -> Option<&DecodedField> {
        self.fields.iter().find(|f| f.element_id == element_id)
    }
}

/// Outcome of decoding one NetFlow v9 or IPFIX message: the records it
/// carried (already resolved against a cached template) plus counters for
/// the things that went wrong along the way, so the caller can fold them
/// into the global stats counters without this function reaching into
/// `stats::counters` itself.
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    pub records: Vec<DecodedRecord>,
    pub templates_learned: usize,
    pub orphan_data_sets: usize,
    pub decode_errors: usize,
}

/// Decodes every data record packed into one data set's content, stopping
/// when fewer bytes remain than the template's next field needs. RFC 7011
/// padding at the end of a set is silently ignored rather than demanding an
/// exact multiple of the record length.
pub fn decode_data_set(
    content: &[u8],
    content_start: usize,
    template: &Template,
) -> Vec<DecodedRecord> {
    let mut records = Vec::new();
    let mut offset = 0usize;

    loop {
        let mut fields = Vec::with_capacity(template.fields.len());
        let mut record_offset = offset;
        let mut ok = true;

        for field in &template.fields {
            let length = if field.length == 0xFFFF {
                match read_variable_length(content, record_offset) {
                    Some((len, header_len)) => {
                        record_offset += header_len;
                        len
                    }
                    None => {
                        ok = false;
                        break;
                    }
                }
            } else {
                field.length as usize
            };

            if record_offset + length > content.len() {
                ok = false;
                break;
            }

            fields.push(DecodedField {
                element_id: field.element_id,
                enterprise_number: field.enterprise_number,
                offset: content_start + record_offset,
                length,
            });
            record_offset += length;
        }

        if !ok || fields.is_empty() {
            break;
        }

        offset = record_offset;
        records.push(DecodedRecord {
            template_id: template.id,
            fields,
        });

        if offset >= content.len() {
            break;
        }
    }

    records
}

/// IPFIX variable-length encoding (RFC 7011 section 7): a single length
/// octet for lengths 0..=254, or 0xFF followed by a 2-octet length for
/// anything larger. Returns `(value_length, bytes_consumed_by_the_length_field)`.
fn read_variable_length(buf: &[u8], offset: usize) -> Option<(usize, usize)> {
    let marker = *buf.get(offset)?;
    if marker < 255 {
        Some((marker as usize, 1))
    } else {
        let hi = *buf.get(offset + 1)? as usize;
        let lo = *buf.get(offset + 2)? as usize;
        Some(((hi << 8) | lo, 3))
    }
}
