//! Selection expression parsing for the command line.
//!
//! An expression is a comma-separated list of items, unioned together:
//!
//! | item            | meaning                                        |
//! |-----------------|------------------------------------------------|
//! | `N`             | single index                                   |
//! | `A..B`          | half-open range `[A, B)`                       |
//! | `A+COUNT`       | `COUNT` indices starting at `A`                |
//! | `A:WxH/STRIDE`  | `H` rows of `W` indices, rows `STRIDE` apart   |
//!
//! Numbers are decimal or `0x`-prefixed hex.

use anyhow::{Context, Result, anyhow, bail};
use core_buffer::{IndexSelection, SelectionBuilder};

pub fn parse_selection(expr: &str) -> Result<IndexSelection> {
    let mut builder = SelectionBuilder::new();
    for item in expr.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        add_item(&mut builder, item).with_context(|| format!("selection item `{item}`"))?;
    }
    builder
        .build(false)
        .with_context(|| format!("selection `{expr}` selects nothing"))
}

fn add_item(builder: &mut SelectionBuilder, item: &str) -> Result<()> {
    if let Some((start, rest)) = item.split_once(':') {
        let (width, rest) = rest
            .split_once('x')
            .ok_or_else(|| anyhow!("expected WxH/STRIDE after `:`"))?;
        let (height, stride) = rest
            .split_once('/')
            .ok_or_else(|| anyhow!("expected /STRIDE after the box size"))?;
        let grid = IndexSelection::grid(
            parse_number(start)?,
            parse_number(width)?,
            parse_number(height)?,
            parse_number(stride)?,
        )?;
        builder.add(&grid);
    } else if let Some((start, end)) = item.split_once("..") {
        let (start, end) = (parse_number(start)?, parse_number(end)?);
        if end <= start {
            bail!("range end {end} must exceed start {start}");
        }
        builder.add_linear(start, end - start);
    } else if let Some((start, count)) = item.split_once('+') {
        let range = IndexSelection::range(parse_number(start)?, parse_number(count)?)?;
        builder.add(&range);
    } else {
        builder.add_index(parse_number(item)?);
    }
    Ok(())
}

pub fn parse_number(text: &str) -> Result<usize> {
    let text = text.trim();
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("invalid number `{text}`"))
}

/// Clap value parser for byte arguments (`255`, `0xff`).
pub fn parse_byte(text: &str) -> Result<u8, String> {
    let value = parse_number(text).map_err(|e| format!("{e:#}"))?;
    u8::try_from(value).map_err(|_| format!("{value} does not fit in a byte"))
}
