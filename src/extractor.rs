use std::collections::HashMap;
use std::net::IpAddr;

use crate::protocol::field::FieldValue;
use crate::protocol::ie;
use crate::protocol::record::DecodedRecord;

/// External AS resolution, queried only as a fallback when a record's own
/// srcAS/dstAS fields are absent or zero. No concrete backend (BGP table,
/// MaxMind database) is shipped; see `NullASLookup`.
pub trait ASLookup: Send + Sync {
    fn lookup(&self, addr: IpAddr) -> Option<u32>;
}

/// The only bundled implementor -- always misses. Wired up when
/// `enrichment.as_extraction` fallback querying is enabled but no real
/// backend is configured, so the extractor's fallback path is always
/// exercised the same way whether or not a real lookup is plugged in later.
pub struct NullASLookup;

impl ASLookup for NullASLookup {
    fn lookup(&self, _addr: IpAddr) -> Option<u32> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Source,
    Destination,
}

/// Result of extracting the AS pair from one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsPair {
    pub src_as: Option<u32>,
    pub dst_as: Option<u32>,
}

impl AsPair {
    /// True only when *both* fields resolved to a non-zero AS (§4.4: "If
    /// both are non-zero, the record is marked as_present").
    pub fn is_present(&self) -> bool {
        matches!(self.src_as, Some(v) if v != 0) && matches!(self.dst_as, Some(v) if v != 0)
    }
}

fn read_address_field(record: &DecodedRecord, datagram: &[u8], element_id: u16) -> Option<IpAddr> {
    let field = record.field(element_id)?;
    match field.value(datagram)? {
        FieldValue::U32(v) => Some(IpAddr::V4(std::net::Ipv4Addr::from(v))),
        FieldValue::U128(v) => Some(IpAddr::V6(std::net::Ipv6Addr::from(v))),
        FieldValue::Dyn(bytes) if bytes.len() == 16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(&bytes);
            Some(IpAddr::V6(std::net::Ipv6Addr::from(octets)))
        }
        _ => None,
    }
}

/// Extracts the primary srcAS/dstAS pair (IE 16 / IE 17), falling back to
/// `lookup` against the record's source/destination address when a field is
/// absent or zero and `as_extraction_fallback` is enabled. The returned pair
/// reflects the *decoded record view only* -- on-wire bytes are untouched
/// here; see `rewrite_in_place` for that.
pub fn extract(
    record: &DecodedRecord,
    datagram: &[u8],
    lookup: &dyn ASLookup,
    fallback_enabled: bool,
) -> AsPair {
    let src_as = record
        .field(ie::BGP_SOURCE_AS_NUMBER)
        .and_then(|f| f.value(datagram))
        .and_then(|v| v.as_u32())
        .filter(|v| *v != 0);
    let dst_as = record
        .field(ie::BGP_DESTINATION_AS_NUMBER)
        .and_then(|f| f.value(datagram))
        .and_then(|v| v.as_u32())
        .filter(|v| *v != 0);

    let src_as = src_as.or_else(|| {
        if !fallback_enabled {
            return None;
        }
        read_address_field(record, datagram, ie::IPV4_SRC_ADDR)
            .or_else(|| read_address_field(record, datagram, ie::IPV6_SRC_ADDR))
            .and_then(|addr| lookup.lookup(addr))
    });
    let dst_as = dst_as.or_else(|| {
        if !fallback_enabled {
            return None;
        }
        read_address_field(record, datagram, ie::IPV4_DST_ADDR)
            .or_else(|| read_address_field(record, datagram, ie::IPV6_DST_ADDR))
            .and_then(|addr| lookup.lookup(addr))
    });

    AsPair { src_as, dst_as }
}

/// Overwrites the on-wire AS fields with resolved values, per the
/// declared-length rule: a field declared exactly 4 bytes gets the full
/// value; a field declared wider than 4 bytes gets only its low 4 bytes
/// written, the rest left untouched; a field declared 2 bytes is never
/// rewritten (truncation risk outweighs the benefit).
pub fn rewrite_in_place(record: &DecodedRecord, datagram: &mut [u8], resolved: AsPair) {
    if let Some(value) = resolved.src_as {
        rewrite_field(record, datagram, ie::BGP_SOURCE_AS_NUMBER, value);
    }
    if let Some(value) = resolved.dst_as {
        rewrite_field(record, datagram, ie::BGP_DESTINATION_AS_NUMBER, value);
    }
}

fn rewrite_field(record: &DecodedRecord, datagram: &mut [u8], element_id: u16, value: u32) {
    let field = match record.field(element_id) {
        Some(f) => *f,
        None => return,
    };
    if field.length < 4 {
        return;
    }
    let bytes = value.to_be_bytes();
    let start = field.offset + (field.length - 4);
    if let Some(slice) = datagram.get_mut(start..start + 4) {
        slice.copy_from_slice(&bytes);
    }
}

const SKETCH_WIDTH: usize = 2048;
const SKETCH_DEPTH: usize = 4;
const HEAVY_HITTERS_CAP: usize = 256;

/// Count-min sketch over `(direction, as_number)` with a bounded
/// heavy-hitters list, used to answer `stats as_stats` without retaining an
/// unbounded per-AS counter map. No crate in the pack implements this; it is
/// a small, fixed-size frequency estimator, not a networking or
/// serialization concern, so it is written directly.
pub struct AsFrequency {
    rows: [Vec<u64>; SKETCH_DEPTH],
    seeds: [u64; SKETCH_DEPTH],
    heavy_hitters: HashMap<(Direction, u32), u64>,
}

impl AsFrequency {
    pub fn new() -> Self {
        AsFrequency {
            rows: std::array::from_fn(|_| vec![0u64; SKETCH_WIDTH]),
            seeds: [
                0x9E3779B97F4A7C15,
                0xC2B2AE3D27D4EB4F,
                0x165667B19E3779F9,
                0x27D4EB2F165667C5,
            ],
            heavy_hitters: HashMap::new(),
        }
    }

    fn slot(&self, row: usize, key: (Direction, u32)) -> usize {
        let mut hash = self.seeds[row];
        hash ^= key.1 as u64;
        hash = hash.wrapping_mul(0x100000001B3);
        hash ^= match key.0 {
            Direction::Source => 1,
            Direction::Destination => 2,
        };
        hash = hash.wrapping_mul(0x100000001B3);
        (hash as usize) % SKETCH_WIDTH
    }

    /// Increments the estimated count for `key` and returns the new
    /// estimate (the minimum across all rows, per count-min sketch
    /// semantics), promoting `key` into the heavy-hitters list if the
    /// estimate now exceeds the current minimum tracked there.
    pub fn record(&mut self, key: (Direction, u32)) -> u64 {
        let mut estimate = u64::MAX;
        for row in 0..SKETCH_DEPTH {
            let idx = self.slot(row, key);
            self.rows[row][idx] += 1;
            estimate = estimate.min(self.rows[row][idx]);
        }

        if self.heavy_hitters.len() < HEAVY_HITTERS_CAP {
            self.heavy_hitters.insert(key, estimate);
        } else if let Some(current) = self.heavy_hitters.get_mut(&key) {
            *current = estimate;
        } else if let Some(min_key) = self
            .heavy_hitters
            .iter()
            .min_by_key(|(_, count)| **count)
            .map(|(k, _)| *k)
        {
            if estimate > self.heavy_hitters[&min_key] {
                self.heavy_hitters.remove(&min_key);
                self.heavy_hitters.insert(key, estimate);
            }
        }

        estimate
    }

    /// Returns the current heavy-hitters list, sorted by descending
    /// estimated count.
    pub fn top(&self, n: usize) -> Vec<(Direction, u32, u64)> {
        let mut entries: Vec<(Direction, u32, u64)> = self
            .heavy_hitters
            .iter()
            .map(|((direction, as_number), count)| (*direction, *as_number, *count))
            .collect();
        entries.sort_by(|a, b| b.2.cmp(&a.2));
        entries.truncate(n);
        entries
    }
}

impl Default for AsFrequency {
    fn default() -> Self {
        Self::new()
    }
}
