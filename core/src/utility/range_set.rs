use std::cmp::Ordering;
use std::ops::Range;

/// An ordered set of disjoint index ranges.
/// Used to describe which triangles of a mesh belong to a submesh without keeping a set of every index.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
	ranges: Vec<Range<usize>>,
	total_size: usize,
}

impl std::fmt::Debug for RangeSet {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let ranges_fmt = self
			.ranges
			.iter()
			.map(|range| format!("[{},{})", range.start, range.end))
			.collect::<Vec<_>>();
		write!(
			f,
			"RangeSet(count={}, ranges=[{}])",
			self.total_size,
			ranges_fmt.join(", ")
		)
	}
}

impl FromIterator<Range<usize>> for RangeSet {
	fn from_iter<T: IntoIterator<Item = Range<usize>>>(iter: T) -> Self {
		let mut set = Self::default();
		for range in iter {
			set.insert_range(range);
		}
		set
	}
}

impl RangeSet {
	pub fn len(&self) -> usize {
		self.total_size
	}

	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}

	pub fn ranges(&self) -> &[Range<usize>] {
		&self.ranges
	}

	/// The exclusive upper bound of the highest index in the set.
	pub fn end(&self) -> usize {
		self.ranges.last().map(|range| range.end).unwrap_or(0)
	}

	pub fn contains(&self, idx: usize) -> bool {
		self.find(idx).is_ok()
	}

	/// Returns true if any index of `range` is already in the set.
	pub fn intersects(&self, range: &Range<usize>) -> bool {
		if range.start >= range.end {
			return false;
		}
		let first_after = self.ranges.partition_point(|existing| existing.end <= range.start);
		match self.ranges.get(first_after) {
			Some(existing) => existing.start < range.end,
			None => false,
		}
	}

	pub fn intersects_set(&self, other: &RangeSet) -> bool {
		other.ranges.iter().any(|range| self.intersects(range))
	}

	#[profiling::function]
	pub fn insert(&mut self, idx: usize) {
		let range_idx = match self.find(idx) {
			Ok(_) => return,
			Err(range_idx) => range_idx,
		};
		self.total_size += 1;
		self.ranges.insert(range_idx, idx..idx + 1);
		self.merge_ranges_around(range_idx);
	}

	#[profiling::function]
	pub fn insert_range(&mut self, range: Range<usize>) {
		if range.start >= range.end {
			return;
		}
		// Every existing range in [first, last) overlaps or touches the new one.
		let first = self.ranges.partition_point(|existing| existing.end < range.start);
		let last = self.ranges.partition_point(|existing| existing.start <= range.end);
		let mut merged = range;
		let mut removed_size = 0;
		for existing in self.ranges[first..last].iter() {
			merged.start = merged.start.min(existing.start);
			merged.end = merged.end.max(existing.end);
			removed_size += existing.end - existing.start;
		}
		self.total_size = self.total_size - removed_size + (merged.end - merged.start);
		self.ranges.splice(first..last, std::iter::once(merged));
	}

	pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
		self.ranges.iter().flat_map(|range| range.clone())
	}

	/// Ok(index) if the range at `index` contains `idx`.
	/// Err(index) is the position a new range starting at `idx` would be inserted at.
	fn find(&self, idx: usize) -> Result<usize, usize> {
		self.ranges.binary_search_by(|range| -> Ordering {
			if range.end <= idx {
				return Ordering::Less;
			}
			if idx < range.start {
				return Ordering::Greater;
			}
			Ordering::Equal
		})
	}

	fn merge_ranges_around(&mut self, mut range_idx: usize) {
		if range_idx > 0 && self.is_contiguous(range_idx - 1, range_idx) {
			let next = self.ranges.remove(range_idx);
			self.ranges[range_idx - 1].end = next.end;
			range_idx -= 1;
		}
		if range_idx + 1 < self.ranges.len() && self.is_contiguous(range_idx, range_idx + 1) {
			let next = self.ranges.remove(range_idx + 1);
			self.ranges[range_idx].end = next.end;
		}
	}

	fn is_contiguous(&self, r1_idx: usize, r2_idx: usize) -> bool {
		match (self.ranges.get(r1_idx), self.ranges.get(r2_idx)) {
			(Some(r1), Some(r2)) => r1.end == r2.start,
			_ => false,
		}
	}
}
