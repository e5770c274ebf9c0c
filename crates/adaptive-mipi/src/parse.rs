//! Device-tree table parsers.
//!
//! Two shapes are supported:
//!
//! - **Bucketed** (`rf-table-lists`): one phandle per bandwidth bucket, each
//!   resolving to a node whose children are rows with named properties.
//! - **Strided** (`sdp-*-table`): one flat `u32` array cut into fixed-width
//!   rows, each handed to a row decoder.
//!
//! Both are all or nothing. The first bad row fails the whole load.

use heapless::Vec;
use platform::DeviceNode;

use crate::config::{MAX_BANDWIDTH_BUCKETS, MAX_MIPI_FREQ, MAX_STRIDE};
use crate::error::ParseError;
use crate::keys;
use crate::table::{BandChannelRange, BandwidthBucket, RatingRow};

/// Parse `bucket_count` bandwidth buckets referenced by `rf-table-lists`.
///
/// Every row must carry exactly `candidate_count` ratings.
///
/// # Errors
///
/// [`ParseError::BucketCount`] for a count outside `1..=2`,
/// [`ParseError::MissingTable`] for a dangling phandle, or the first row
/// error.
pub fn parse_bandwidth_buckets<D: DeviceNode>(
    node: &D,
    bucket_count: usize,
    candidate_count: usize,
) -> Result<Vec<BandwidthBucket, MAX_BANDWIDTH_BUCKETS>, ParseError> {
    if bucket_count == 0 || bucket_count > MAX_BANDWIDTH_BUCKETS {
        return Err(ParseError::BucketCount {
            max: MAX_BANDWIDTH_BUCKETS,
            found: bucket_count,
        });
    }

    let mut buckets = Vec::new();
    for index in 0..bucket_count {
        let table = node
            .parse_phandle(keys::RF_TABLE_LISTS, index)
            .ok_or(ParseError::MissingTable { index })?;
        let mut bucket = BandwidthBucket::new();
        for entry in table.children() {
            bucket.push(parse_rating_row(&entry, candidate_count)?)?;
        }
        trace!("bucket {}: {} rows", index, bucket.len());
        buckets
            .push(bucket)
            .map_err(|_| ParseError::BucketCount {
                max: MAX_BANDWIDTH_BUCKETS,
                found: bucket_count,
            })?;
    }
    Ok(buckets)
}

/// Read the band id and channel range every row node carries.
pub(crate) fn parse_range<D: DeviceNode>(entry: &D) -> Result<BandChannelRange, ParseError> {
    let band = entry
        .read_u32(keys::RF_BAND_ID)
        .map_err(ParseError::config(keys::RF_BAND_ID))?;
    let mut range = [0u32; 2];
    entry
        .read_u32_array(keys::RF_CHANNEL_RANGE, &mut range)
        .map_err(ParseError::config(keys::RF_CHANNEL_RANGE))?;
    let [from, to] = range;
    BandChannelRange::new(band, from, to).validate()
}

/// Parse one child of a bandwidth table.
pub fn parse_rating_row<D: DeviceNode>(
    entry: &D,
    candidate_count: usize,
) -> Result<RatingRow, ParseError> {
    let range = parse_range(entry)?;

    let found = entry
        .count_u32_elems(keys::RATING)
        .map_err(ParseError::config(keys::RATING))?;
    if found != candidate_count {
        return Err(ParseError::RatingLength {
            expected: candidate_count,
            found,
        });
    }
    let mut buf = [0u32; MAX_MIPI_FREQ];
    let rating = buf.get_mut(..found).ok_or(ParseError::TooMany {
        key: keys::RATING,
        max: MAX_MIPI_FREQ,
        found,
    })?;
    entry
        .read_u32_array(keys::RATING, rating)
        .map_err(ParseError::config(keys::RATING))?;

    let row = RatingRow::new(range, rating)?;
    if entry.has_property(keys::OSC_FREQ_OVERRIDE) {
        let osc = entry
            .read_u32(keys::OSC_FREQ_OVERRIDE)
            .map_err(ParseError::config(keys::OSC_FREQ_OVERRIDE))?;
        return Ok(row.with_osc_override(osc));
    }
    Ok(row)
}

/// Validate a strided layout and return its row count.
fn strided_rows(key: &'static str, len: usize, stride: usize, capacity: usize) -> Result<usize, ParseError> {
    if stride == 0 || stride > MAX_STRIDE {
        return Err(ParseError::InvalidStride { stride });
    }
    if len.checked_rem(stride) != Some(0) {
        return Err(ParseError::Stride { key, len, stride });
    }
    let rows = len.checked_div(stride).unwrap_or(0);
    if rows > capacity {
        return Err(ParseError::TableFull { capacity });
    }
    Ok(rows)
}

/// Parse the flat array `key` as rows of `stride` values.
///
/// `decode` sees each row in order as a slice of exactly `stride` values.
/// An empty property yields an empty table.
///
/// # Errors
///
/// [`ParseError::Config`] when `key` is missing, [`ParseError::Stride`] when
/// its length is not a multiple of `stride`, [`ParseError::InvalidStride`]
/// for a zero or oversized stride, [`ParseError::TableFull`] past `CAP`
/// rows, or the first error of `decode`.
pub fn parse_strided_table<D, R, F, const CAP: usize>(
    node: &D,
    key: &'static str,
    stride: usize,
    mut decode: F,
) -> Result<Vec<R, CAP>, ParseError>
where
    D: DeviceNode,
    F: FnMut(&[u32]) -> Result<R, ParseError>,
{
    let len = node.count_u32_elems(key).map_err(ParseError::config(key))?;
    let rows = strided_rows(key, len, stride, CAP)?;

    let mut out = Vec::new();
    let mut buf = [0u32; MAX_STRIDE];
    let words = buf
        .get_mut(..stride)
        .ok_or(ParseError::InvalidStride { stride })?;
    let mut index = 0usize;
    for _ in 0..rows {
        for slot in words.iter_mut() {
            *slot = node
                .read_u32_index(key, index)
                .map_err(ParseError::config(key))?;
            index = index.saturating_add(1);
        }
        out.push(decode(words)?)
            .map_err(|_| ParseError::TableFull { capacity: CAP })?;
    }
    Ok(out)
}

/// [`parse_strided_table`] over an in-memory array.
///
/// # Errors
///
/// As [`parse_strided_table`], minus the missing-key case.
pub fn split_strided<R, F, const CAP: usize>(
    key: &'static str,
    values: &[u32],
    stride: usize,
    decode: F,
) -> Result<Vec<R, CAP>, ParseError>
where
    F: FnMut(&[u32]) -> Result<R, ParseError>,
{
    strided_rows(key, values.len(), stride, CAP)?;
    let mut out = Vec::new();
    for row in values.chunks_exact(stride).map(decode) {
        out.push(row?)
            .map_err(|_| ParseError::TableFull { capacity: CAP })?;
    }
    Ok(out)
}
