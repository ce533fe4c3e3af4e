//! Word-level diff between an original and a transformed text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    Equal,
    Insert,
    Delete,
    Replace,
}

/// A run of consecutive words sharing one kind of change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    pub kind: DiffKind,
    /// Words from the original text (empty for inserts)
    pub original: String,
    /// Words from the transformed text (empty for deletes)
    pub replacement: String,
}

enum Op<'a> {
    Keep(&'a str),
    Remove(&'a str),
    Add(&'a str),
}

/// Edit script over whitespace tokens. The common prefix and suffix are kept
/// as is; the middle is aligned with Hirschberg's linear-space LCS.
fn edit_script<'a>(a: &[&'a str], b: &[&'a str]) -> Vec<Op<'a>> {
    let prefix = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut ops = Vec::with_capacity(a.len().max(b.len()));
    ops.extend(a[..prefix].iter().map(|&w| Op::Keep(w)));
    align(
        &a[prefix..a.len() - suffix],
        &b[prefix..b.len() - suffix],
        &mut ops,
    );
    ops.extend(a[a.len() - suffix..].iter().map(|&w| Op::Keep(w)));
    ops
}

/// Last row of the LCS table of `a` against `b`: entry `j` is the LCS length
/// of `a` and `b[..j]`.
fn lcs_row(a: &[&str], b: &[&str]) -> Vec<usize> {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev
}

fn align<'a>(a: &[&'a str], b: &[&'a str], ops: &mut Vec<Op<'a>>) {
    if a.is_empty() {
        ops.extend(b.iter().map(|&w| Op::Add(w)));
        return;
    }
    if b.is_empty() {
        ops.extend(a.iter().map(|&w| Op::Remove(w)));
        return;
    }
    if a.len() == 1 {
        match b.iter().position(|&w| w == a[0]) {
            Some(k) => {
                ops.extend(b[..k].iter().map(|&w| Op::Add(w)));
                ops.push(Op::Keep(a[0]));
                ops.extend(b[k + 1..].iter().map(|&w| Op::Add(w)));
            }
            None => {
                ops.push(Op::Remove(a[0]));
                ops.extend(b.iter().map(|&w| Op::Add(w)));
            }
        }
        return;
    }

    // Split `b` where the forward LCS of the top half and the backward LCS
    // of the bottom half sum to the maximum
    let mid = a.len() / 2;
    let forward = lcs_row(&a[..mid], b);
    let a_rev: Vec<&str> = a[mid..].iter().rev().copied().collect();
    let b_rev: Vec<&str> = b.iter().rev().copied().collect();
    let backward = lcs_row(&a_rev, &b_rev);
    let split = (0..=b.len())
        .max_by_key(|&j| forward[j] + backward[b.len() - j])
        .unwrap_or(0);

    align(&a[..mid], &b[..split], ops);
    align(&a[mid..], &b[split..], ops);
}

fn flush_equal(runs: &mut Vec<DiffEntry>, equal: &mut Vec<&str>) {
    if equal.is_empty() {
        return;
    }
    let text = equal.join(" ");
    runs.push(DiffEntry {
        kind: DiffKind::Equal,
        original: text.clone(),
        replacement: text,
    });
    equal.clear();
}

fn flush_change(runs: &mut Vec<DiffEntry>, removed: &mut Vec<&str>, added: &mut Vec<&str>) {
    let kind = match (removed.is_empty(), added.is_empty()) {
        (true, true) => return,
        (false, true) => DiffKind::Delete,
        (true, false) => DiffKind::Insert,
        (false, false) => DiffKind::Replace,
    };
    runs.push(DiffEntry {
        kind,
        original: removed.join(" "),
        replacement: added.join(" "),
    });
    removed.clear();
    added.clear();
}

/// All runs, unchanged ones included, in text order.
pub fn diff_runs(original: &str, transformed: &str) -> Vec<DiffEntry> {
    let a: Vec<&str> = original.split_whitespace().collect();
    let b: Vec<&str> = transformed.split_whitespace().collect();

    let mut runs = Vec::new();
    let mut equal = Vec::new();
    let mut removed = Vec::new();
    let mut added = Vec::new();

    for op in edit_script(&a, &b) {
        match op {
            Op::Keep(word) => {
                flush_change(&mut runs, &mut removed, &mut added);
                equal.push(word);
            }
            Op::Remove(word) => {
                flush_equal(&mut runs, &mut equal);
                removed.push(word);
            }
            Op::Add(word) => {
                flush_equal(&mut runs, &mut equal);
                added.push(word);
            }
        }
    }
    flush_change(&mut runs, &mut removed, &mut added);
    flush_equal(&mut runs, &mut equal);
    runs
}

/// Changed runs only.
pub fn word_diff(original: &str, transformed: &str) -> Vec<DiffEntry> {
    diff_runs(original, transformed)
        .into_iter()
        .filter(|entry| entry.kind != DiffKind::Equal)
        .collect()
}
