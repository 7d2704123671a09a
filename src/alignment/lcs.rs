/// Longest-common-subsequence alignment of expected against recognized
/// spellings.
///
/// Returns, for every expected position, the index of the recognized unit
/// it was paired with. Ties resolve deterministically: a match is taken as
/// soon as it is optimal, otherwise recognized insertions are skipped before
/// expected units.
pub fn align_lcs(expected: &[String], recognized: &[String]) -> Vec<Option<usize>> {
    let e_len = expected.len();
    let r_len = recognized.len();
    let mut mapping = vec![None; e_len];
    if e_len == 0 || r_len == 0 {
        return mapping;
    }

    let expected: Vec<&str> = expected.iter().map(|s| normalize(s)).collect();
    let recognized: Vec<&str> = recognized.iter().map(|s| normalize(s)).collect();
    let mut table = SuffixTable::new(&expected, &recognized);
    let matched = table.total();

    let (mut i, mut j) = (0usize, 0usize);
    while i < e_len && j < r_len {
        table.load_rows_for(i);
        let here = table.at(i, j);
        if same_unit(expected[i], recognized[j]) && here == table.at(i + 1, j + 1) + 1 {
            mapping[i] = Some(j);
            i += 1;
            j += 1;
        } else if table.at(i, j + 1) == here {
            j += 1;
        } else {
            i += 1;
        }
    }

    tracing::debug!(
        expected = e_len,
        recognized = r_len,
        matched,
        stride = table.stride,
        "lcs: sequences aligned"
    );
    mapping
}

/// `suffix[i][j]`, the LCS length of `expected[i..]` and `recognized[j..]`,
/// without holding the whole table.
///
/// Only every `stride`-th row is kept. The forward walk never moves back up,
/// so the rows between two checkpoints are rebuilt once, block by block.
/// Memory is `O(sqrt(E) * R)` instead of `O(E * R)`.
struct SuffixTable<'a> {
    expected: &'a [&'a str],
    recognized: &'a [&'a str],
    width: usize,
    stride: usize,
    /// `checkpoints[c]` is row `min(c * stride, E)`.
    checkpoints: Vec<Vec<u32>>,
    /// Rows `block_start..=block_end`, row-major.
    block: Vec<u32>,
    block_start: usize,
    block_end: usize,
}

impl<'a> SuffixTable<'a> {
    fn new(expected: &'a [&'a str], recognized: &'a [&'a str]) -> Self {
        let e_len = expected.len();
        let width = recognized.len() + 1;
        let stride = ((e_len as f64).sqrt().ceil() as usize).max(1);

        let mut checkpoints = vec![Vec::new(); e_len.div_ceil(stride) + 1];
        let mut below = vec![0u32; width];
        if let Some(last) = checkpoints.last_mut() {
            *last = below.clone();
        }
        let mut row = vec![0u32; width];
        for i in (0..e_len).rev() {
            fill_row(expected[i], recognized, &below, &mut row);
            std::mem::swap(&mut row, &mut below);
            if i % stride == 0 {
                checkpoints[i / stride] = below.clone();
            }
        }

        Self {
            expected,
            recognized,
            width,
            stride,
            checkpoints,
            block: Vec::new(),
            block_start: 0,
            block_end: 0,
        }
    }

    fn total(&self) -> u32 {
        self.checkpoints[0][0]
    }

    /// Makes rows `i` and `i + 1` available.
    fn load_rows_for(&mut self, i: usize) {
        if self.block_start <= i && i < self.block_end {
            return;
        }
        let start = (i / self.stride) * self.stride;
        let end = (start + self.stride).min(self.expected.len());
        let width = self.width;

        self.block.clear();
        self.block.resize((end - start + 1) * width, 0);
        let top = (end - start) * width;
        self.block[top..].copy_from_slice(&self.checkpoints[end.div_ceil(self.stride)]);
        for r in (start..end).rev() {
            let (upper, lower) = self.block.split_at_mut((r - start + 1) * width);
            fill_row(
                self.expected[r],
                self.recognized,
                &lower[..width],
                &mut upper[(r - start) * width..],
            );
        }
        self.block_start = start;
        self.block_end = end;
    }

    fn at(&self, i: usize, j: usize) -> u32 {
        self.block[(i - self.block_start) * self.width + j]
    }
}

/// Builds row `i` of the suffix table from row `i + 1`.
fn fill_row(expected: &str, recognized: &[&str], below: &[u32], row: &mut [u32]) {
    let r_len = recognized.len();
    row[r_len] = 0;
    for j in (0..r_len).rev() {
        row[j] = if same_unit(expected, recognized[j]) {
            below[j + 1] + 1
        } else {
            below[j].max(row[j + 1])
        };
    }
}

/// Drops a trailing pronunciation variant marker such as `(2)`.
fn normalize(spelling: &str) -> &str {
    let trimmed = spelling.trim();
    if let Some(open) = trimmed.rfind('(') {
        let variant = &trimmed[open + 1..];
        if let Some(digits) = variant.strip_suffix(')') {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return &trimmed[..open];
            }
        }
    }
    trimmed
}

#[inline]
fn same_unit(expected: &str, recognized: &str) -> bool {
    expected.eq_ignore_ascii_case(recognized)
}
