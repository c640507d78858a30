//! The endpoint-slice sub-language: `name`, `name[]`, `name[k]`,
//! `name[a:b]`, `name[a:b:s]`, `name[:b]`, `name[a:]`, `name[:]`.
//!
//! This is the single tight parser for the grammar in spec.md §6:
//!
//! ```text
//! Path      := Segment ("." Segment)*
//! Segment   := Ident ("[" Slice "]")?
//! Slice     := Int | Int? ":" Int? (":" Int?)?
//! ```
//!
//! Name resolution (does `name` refer to a real `Component`?) is the
//! caller's job; this module only turns text into `(name, start, stop,
//! step)` once a component's declared `count` is known.

use crate::error::SliceError;

/// The slice portion of a segment, before it has been resolved against a
/// component's `count`. `None` means "not specified, use the default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSlice {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: Option<i64>,
}

impl RawSlice {
    /// The slice that selects the full range, i.e. `name` or `name[]` or
    /// `name[:]`.
    pub fn full() -> Self {
        Self::default()
    }
}

/// A parsed-but-unresolved path segment: `name` plus its raw slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSegment<'a> {
    pub name: &'a str,
    pub slice: RawSlice,
}

/// A fully resolved slice: `0 <= start < stop <= count`, `step >= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSlice {
    pub start: u32,
    pub stop: u32,
    pub step: u32,
}

impl ResolvedSlice {
    /// The indices this slice selects, in order.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        (self.start..self.stop).step_by(self.step as usize)
    }
}

/// Split a dotted path (`"nic[0:8:2].port[0]"`) into its raw segments.
pub fn parse_path(path: &str) -> Result<Vec<RawSegment<'_>>, SliceError> {
    path.split('.').map(parse_segment).collect()
}

/// Parse a single `name` or `name[expr]` segment.
pub fn parse_segment(segment: &str) -> Result<RawSegment<'_>, SliceError> {
    let malformed = || SliceError::Malformed {
        segment: segment.to_string(),
        expr: segment.to_string(),
    };

    let Some(open) = segment.find('[') else {
        if segment.contains(']') {
            return Err(malformed());
        }
        return Ok(RawSegment {
            name: segment,
            slice: RawSlice::full(),
        });
    };

    if !segment.ends_with(']') {
        return Err(malformed());
    }
    let name = &segment[..open];
    let expr = &segment[open + 1..segment.len() - 1];
    if name.is_empty() || expr.contains('[') {
        return Err(malformed());
    }

    let slice = parse_slice_expr(segment, expr)?;
    Ok(RawSegment { name, slice })
}

fn parse_slice_expr(segment: &str, expr: &str) -> Result<RawSlice, SliceError> {
    let malformed = |expr: &str| SliceError::Malformed {
        segment: segment.to_string(),
        expr: expr.to_string(),
    };

    if expr.is_empty() {
        return Ok(RawSlice::full());
    }

    if !expr.contains(':') {
        // Singleton index: "k" -> start=k, stop=k+1, step=1.
        let k: i64 = expr.trim().parse().map_err(|_| malformed(expr))?;
        let next = k.checked_add(1).ok_or_else(|| malformed(expr))?;
        return Ok(RawSlice {
            start: Some(k),
            stop: Some(next),
            step: Some(1),
        });
    }

    let parts: Vec<&str> = expr.split(':').collect();
    if parts.len() > 3 {
        return Err(malformed(expr));
    }

    let parse_opt = |s: &str| -> Result<Option<i64>, SliceError> {
        if s.trim().is_empty() {
            Ok(None)
        } else {
            s.trim().parse().map(Some).map_err(|_| malformed(expr))
        }
    };

    let start = parse_opt(parts[0])?;
    let stop = parts.get(1).map(|s| parse_opt(s)).transpose()?.flatten();
    let step = parts.get(2).map(|s| parse_opt(s)).transpose()?.flatten();

    Ok(RawSlice { start, stop, step })
}

/// Resolve a raw slice against a component's declared `count`, applying
/// defaults (`start=0`, `stop=count`, `step=1`) and validating bounds.
pub fn resolve_slice(segment: &str, raw: RawSlice, count: u32) -> Result<ResolvedSlice, SliceError> {
    let start = raw.start.unwrap_or(0);
    let stop = raw.stop.unwrap_or(i64::from(count));
    let step = raw.step.unwrap_or(1);

    if step < 1 {
        return Err(SliceError::NonPositiveStep {
            segment: segment.to_string(),
            step,
        });
    }
    if start < 0 || stop < 0 || start > i64::from(u32::MAX) || stop > i64::from(u32::MAX) {
        return Err(SliceError::Malformed {
            segment: segment.to_string(),
            expr: format!("{start}:{stop}:{step}"),
        });
    }

    let (start, stop, step) = (start as u32, stop as u32, step as u32);

    if start > stop {
        return Err(SliceError::StartAfterStop {
            segment: segment.to_string(),
            start,
            stop,
        });
    }
    if start >= count || stop > count {
        return Err(SliceError::OutOfRange {
            name: segment.to_string(),
            start,
            stop,
            count,
        });
    }

    Ok(ResolvedSlice { start, stop, step })
}
