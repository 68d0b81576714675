//! Encoded polyline codec
//!
//! Route geometry arrives from the directions service as an ASCII string in
//! the common polyline format: each coordinate component is stored as the
//! delta from the previous point, scaled by 1e5, zig-zag folded so the sign
//! lives in the lowest bit, then split into 5-bit chunks. Every chunk except
//! the last of a value carries the 0x20 continuation bit, and each chunk is
//! offset by 63 to land in the printable range `'?'..='~'`.

use crate::core::{Coordinate, WaypointSequence, POLYLINE_SCALE};
use crate::validation::error::{GeometryFault, SimulationError, SimulationResult};
use tracing::debug;

const CHUNK_OFFSET: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;
const MAX_CHUNK_BYTE: u8 = b'~';

/// Seven chunks hold 35 bits, far more than any scaled degree delta needs
const MAX_CHUNKS_PER_VALUE: u32 = 7;

/// Decode an encoded polyline into waypoints.
///
/// The empty string is a valid, empty route. Any malformed input is rejected
/// as a whole; a partially decoded sequence is never returned.
pub fn decode(encoded: &str) -> SimulationResult<WaypointSequence> {
    let bytes = encoded.as_bytes();
    let mut waypoints = Vec::with_capacity(bytes.len() / 4);
    let mut position = 0usize;
    let mut lat = 0i64;
    let mut lon = 0i64;

    while position < bytes.len() {
        let point_start = position;
        let delta_lat = decode_value(bytes, &mut position)?;

        if position >= bytes.len() {
            return Err(SimulationError::MalformedGeometry {
                position: point_start,
                fault: GeometryFault::MissingLongitude,
            });
        }
        let delta_lon = decode_value(bytes, &mut position)?;

        lat = accumulate(lat, delta_lat, point_start)?;
        lon = accumulate(lon, delta_lon, point_start)?;

        waypoints.push(Coordinate::new(
            lat as f64 / POLYLINE_SCALE,
            lon as f64 / POLYLINE_SCALE,
        ));
    }

    debug!(bytes = bytes.len(), waypoints = waypoints.len(), "decoded route geometry");
    Ok(waypoints)
}

/// Encode waypoints into a polyline string.
///
/// Each component is rounded to five decimals before deltas are taken, so
/// rounding error never accumulates along the route.
pub fn encode(waypoints: &[Coordinate]) -> String {
    let mut encoded = String::with_capacity(waypoints.len() * 8);
    let mut prev_lat = 0i64;
    let mut prev_lon = 0i64;

    for waypoint in waypoints {
        let lat = (waypoint.lat * POLYLINE_SCALE).round() as i64;
        let lon = (waypoint.lon * POLYLINE_SCALE).round() as i64;

        encode_value(lat - prev_lat, &mut encoded);
        encode_value(lon - prev_lon, &mut encoded);

        prev_lat = lat;
        prev_lon = lon;
    }

    encoded
}

/// Read one zig-zag encoded value starting at `position`, advancing past it
fn decode_value(bytes: &[u8], position: &mut usize) -> SimulationResult<i64> {
    let value_start = *position;
    let mut result = 0i64;
    let mut chunks = 0u32;

    loop {
        let Some(&byte) = bytes.get(*position) else {
            return Err(SimulationError::MalformedGeometry {
                position: value_start,
                fault: GeometryFault::Truncated,
            });
        };
        if !(CHUNK_OFFSET..=MAX_CHUNK_BYTE).contains(&byte) {
            return Err(SimulationError::MalformedGeometry {
                position: *position,
                fault: GeometryFault::InvalidCharacter(byte),
            });
        }
        if chunks == MAX_CHUNKS_PER_VALUE {
            return Err(SimulationError::MalformedGeometry {
                position: value_start,
                fault: GeometryFault::Overflow,
            });
        }

        let chunk = (byte - CHUNK_OFFSET) as i64;
        result |= (chunk & CHUNK_MASK) << (5 * chunks);
        chunks += 1;
        *position += 1;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    Ok(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}

fn encode_value(value: i64, out: &mut String) {
    let mut folded = if value < 0 { !(value << 1) } else { value << 1 };

    while folded >= CONTINUATION_BIT {
        out.push(((CONTINUATION_BIT | (folded & CHUNK_MASK)) as u8 + CHUNK_OFFSET) as char);
        folded >>= 5;
    }
    out.push((folded as u8 + CHUNK_OFFSET) as char);
}

fn accumulate(total: i64, delta: i64, position: usize) -> SimulationResult<i64> {
    total.checked_add(delta).ok_or(SimulationError::MalformedGeometry {
        position,
        fault: GeometryFault::Overflow,
    })
}
