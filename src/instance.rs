//! City coordinate files.
//!
//! Two formats are accepted.
//!
//! Plain text: the first data line is the city count `n`, followed by `n`
//! lines of `x y`. Blank lines and lines starting with `#` are skipped
//! anywhere. Tokens after the second coordinate on a line are ignored, as
//! are lines after the `n`-th city.
//!
//! ```text
//! # unit square
//! 4
//! 0 0
//! 0 1
//! 1 1
//! 1 0
//! ```
//!
//! TSPLIB: any file with a `NODE_COORD_SECTION` line. Header keys other
//! than `DIMENSION` and `EDGE_WEIGHT_TYPE` are ignored; the section holds
//! `id x y` lines up to `EOF` or the first blank line. Distances are always
//! Euclidean, whatever `EDGE_WEIGHT_TYPE` says.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::InstanceError;

/// Reads and parses a coordinate file.
pub fn load_points<P: AsRef<Path>>(path: P) -> Result<Vec<(f64, f64)>, InstanceError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "opening instance");
    let text = fs::read_to_string(path).map_err(|source| InstanceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let points = parse_points(&text)?;
    info!(path = %path.display(), cities = points.len(), "instance loaded");
    Ok(points)
}

/// Parses coordinate-file text, plain or TSPLIB.
pub fn parse_points(text: &str) -> Result<Vec<(f64, f64)>, InstanceError> {
    if text.lines().any(|l| l.trim_start().starts_with(COORD_SECTION)) {
        return parse_tsplib(text);
    }
    parse_plain(text)
}

const COORD_SECTION: &str = "NODE_COORD_SECTION";

fn parse_plain(text: &str) -> Result<Vec<(f64, f64)>, InstanceError> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'));

    let n = lines
        .next()
        .and_then(|l| l.split_whitespace().next())
        .and_then(|tok| tok.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .ok_or(InstanceError::BadCount)?;

    let mut points = Vec::with_capacity(n);
    for line in lines.take(n) {
        let city = points.len() + 1;
        let mut tokens = line.split_whitespace();
        let mut coord = || {
            tokens
                .next()
                .and_then(|tok| tok.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        match (coord(), coord()) {
            (Some(x), Some(y)) => points.push((x, y)),
            _ => return Err(InstanceError::BadCoordinate(city)),
        }
    }

    if points.len() != n {
        return Err(InstanceError::Truncated {
            expected: n,
            read: points.len(),
        });
    }
    Ok(points)
}

fn parse_tsplib(text: &str) -> Result<Vec<(f64, f64)>, InstanceError> {
    let mut lines = text.lines().map(str::trim);
    let mut dimension = None;

    for line in lines.by_ref() {
        if line.starts_with(COORD_SECTION) {
            break;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "DIMENSION" => {
                let n = value
                    .parse::<usize>()
                    .ok()
                    .filter(|&n| n > 0)
                    .ok_or(InstanceError::BadCount)?;
                dimension = Some(n);
            }
            "EDGE_WEIGHT_TYPE" if !matches!(value, "EUC_2D" | "CEIL_2D") => {
                warn!(edge_weight_type = value, "using Euclidean distances");
            }
            _ => {}
        }
    }

    let mut points = Vec::with_capacity(dimension.unwrap_or(0));
    for line in lines.take_while(|l| !l.is_empty() && !l.starts_with("EOF")) {
        let city = points.len() + 1;
        let mut tokens = line.split_whitespace().skip(1);
        let mut coord = || {
            tokens
                .next()
                .and_then(|tok| tok.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        match (coord(), coord()) {
            (Some(x), Some(y)) => points.push((x, y)),
            _ => return Err(InstanceError::BadCoordinate(city)),
        }
    }

    match dimension {
        _ if points.is_empty() => Err(InstanceError::BadCount),
        Some(n) if n != points.len() => Err(InstanceError::Truncated {
            expected: n,
            read: points.len(),
        }),
        _ => Ok(points),
    }
}
