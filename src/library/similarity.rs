//! Ratcliff/Obershelp string similarity.

/// Similarity of two strings in `[0, 1]`: twice the number of matching characters over the total length.
/// Matching characters are found by taking the longest common substring, then recursing on both sides of it.
pub fn ratio(a: &str, b: &str) -> f64 {
	let a: Vec<char> = a.chars().collect();
	let b: Vec<char> = b.chars().collect();
	let total = a.len() + b.len();
	if total == 0 {
		return 1.0;
	}
	2.0 * matching_chars(&a, &b) as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
	let (start_a, start_b, len) = longest_common_substring(a, b);
	if len == 0 {
		return 0;
	}
	len + matching_chars(&a[..start_a], &b[..start_b]) + matching_chars(&a[start_a + len..], &b[start_b + len..])
}

/// (start in a, start in b, length), the earliest in `a` among the longest.
fn longest_common_substring(a: &[char], b: &[char]) -> (usize, usize, usize) {
	let mut best = (0, 0, 0);
	// lengths of common suffixes ending at the previous char of a
	let mut prev = vec![0usize; b.len() + 1];
	for i in 0..a.len() {
		let mut row = vec![0usize; b.len() + 1];
		for j in 0..b.len() {
			if a[i] == b[j] {
				row[j + 1] = prev[j] + 1;
				if row[j + 1] > best.2 {
					best = (i + 1 - row[j + 1], j + 1 - row[j + 1], row[j + 1]);
				}
			}
		}
		prev = row;
	}
	best
}
