use std::collections::HashMap;

use crate::error::{ResolverError, Result};
use crate::template::flatten::FlatPath;

/// Normalize a dotted key fragment into a template variable name.
pub fn normalize(fragment: &str) -> String {
    fragment.to_lowercase().replace(['-', '.'], "_")
}

/// Name built from the last `take` segments of `path`.
fn suffix_name(segments: &[String], take: usize) -> String {
    let start = segments.len().saturating_sub(take);
    normalize(&segments[start..].join("."))
}

/// Derive a unique variable name for every path.
///
/// Each path starts from its last two segments (or one, for top-level keys).
/// Paths whose names collide are lengthened one segment at a time until every
/// name is unique. Two paths that still collide when fully spelled out are an
/// error.
pub fn derive_variable_names(paths: &[&FlatPath]) -> Result<Vec<String>> {
    let segments: Vec<Vec<String>> = paths.iter().map(|p| p.segment_names()).collect();
    let mut takes: Vec<usize> = segments.iter().map(|s| s.len().min(2)).collect();

    loop {
        let names: Vec<String> = segments
            .iter()
            .zip(&takes)
            .map(|(segs, take)| suffix_name(segs, *take))
            .collect();

        let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, name) in names.iter().enumerate() {
            groups.entry(name.as_str()).or_default().push(idx);
        }

        let mut colliding: Vec<&Vec<usize>> = groups.values().filter(|g| g.len() > 1).collect();
        if colliding.is_empty() {
            return Ok(names);
        }
        // Report the earliest collision in document order.
        colliding.sort_by_key(|g| g[0]);

        let mut progressed = false;
        for group in &colliding {
            for &idx in group.iter() {
                if takes[idx] < segments[idx].len() {
                    takes[idx] += 1;
                    progressed = true;
                }
            }
        }

        if !progressed {
            let group = colliding[0];
            return Err(ResolverError::VariableCollision {
                name: names[group[0]].clone(),
                paths: group.iter().map(|&i| paths[i].to_string()).collect(),
            });
        }
    }
}
