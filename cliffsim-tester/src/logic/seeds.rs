use anyhow::{Context, Result, bail};
use std::collections::HashSet;

pub const DEFAULT_SEED: u64 = 1337;

/// Widest `a..b` range accepted on the command line.
pub const MAX_RANGE_SPAN: u64 = 10_000;

/// Resolve CLI seed tokens into a deduplicated, ordered seed list.
///
/// Accepts literal integers (negative values use their magnitude) and
/// inclusive ranges written `a..b`. An empty list falls back to
/// [`DEFAULT_SEED`].
///
/// # Errors
///
/// Fails on tokens that are neither integers nor well-formed ranges, on
/// descending ranges and on ranges wider than [`MAX_RANGE_SPAN`].
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        for seed in parse_token(token)? {
            if seen.insert(seed) {
                seeds.push(seed);
            }
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}

fn parse_token(token: &str) -> Result<Vec<u64>> {
    if let Some((start, end)) = token.split_once("..") {
        let start = parse_seed(start).with_context(|| format!("bad range start in {token}"))?;
        let end = parse_seed(end).with_context(|| format!("bad range end in {token}"))?;
        if end < start {
            bail!("Seed range {token} is descending");
        }
        if end - start >= MAX_RANGE_SPAN {
            bail!("Seed range {token} spans more than {MAX_RANGE_SPAN} seeds");
        }
        return Ok((start..=end).collect());
    }

    Ok(vec![parse_seed(token)?])
}

fn parse_seed(raw: &str) -> Result<u64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value.unsigned_abs());
    }
    if let Ok(value) = raw.parse::<u64>() {
        return Ok(value);
    }
    bail!("Unrecognized seed token: {raw}")
}
