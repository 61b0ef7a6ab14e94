use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrtError;
use crate::progress::Reporter;
use crate::types::{
    ElementSnapshot, LayoutComparisonResult, LayoutDiff, LayoutStatus, PositionDiff, SizeDiff,
    StructureSnapshot,
};
use crate::Result;

/// What to do when a snapshot lists the same xpath more than once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateXpathPolicy {
    /// Keep the position of the first occurrence, the data of the last one.
    #[default]
    Last,
    First,
    /// Fail with [`PrtError::InvalidSnapshot`].
    Reject,
}

impl fmt::Display for DuplicateXpathPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DuplicateXpathPolicy::Last => "last",
            DuplicateXpathPolicy::First => "first",
            DuplicateXpathPolicy::Reject => "reject",
        })
    }
}

impl FromStr for DuplicateXpathPolicy {
    type Err = PrtError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last" => Ok(DuplicateXpathPolicy::Last),
            "first" => Ok(DuplicateXpathPolicy::First),
            "reject" => Ok(DuplicateXpathPolicy::Reject),
            other => Err(PrtError::Config(format!(
                "Unknown duplicate xpath policy: {other} (valid: last, first, reject)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LayoutComparator {
    /// Maximum `layout_diff_ratio` that still passes
    pub threshold: f64,
    pub duplicates: DuplicateXpathPolicy,
}

impl Default for LayoutComparator {
    fn default() -> Self {
        Self {
            threshold: 0.002,
            duplicates: DuplicateXpathPolicy::Last,
        }
    }
}

impl LayoutComparator {
    pub fn compare_files(
        &self,
        baseline: &Path,
        current: &Path,
        reporter: &dyn Reporter,
    ) -> Result<LayoutComparisonResult> {
        reporter.debug("Loading structure snapshots...");
        let baseline = load_structure_snapshot(baseline)?;
        let current = load_structure_snapshot(current)?;
        self.compare(&baseline, &current, reporter)
    }

    pub fn compare(
        &self,
        baseline: &StructureSnapshot,
        current: &StructureSnapshot,
        reporter: &dyn Reporter,
    ) -> Result<LayoutComparisonResult> {
        let baseline_index = ElementIndex::build(&baseline.elements, self.duplicates, "baseline")?;
        let current_index = ElementIndex::build(&current.elements, self.duplicates, "current")?;

        let mut layout_diffs = Vec::new();
        let (mut added, mut removed, mut moved, mut resized) = (0u32, 0u32, 0u32, 0u32);
        let mut max_shift = 0.0f64;

        for base_el in baseline_index.iter() {
            let Some(cur_el) = current_index.get(&base_el.xpath) else {
                removed += 1;
                layout_diffs.push(LayoutDiff {
                    xpath: base_el.xpath.clone(),
                    selector: base_el.selector.clone(),
                    status: LayoutStatus::Removed,
                    baseline_rect: Some(base_el.rect),
                    current_rect: None,
                    position_diff: None,
                    size_diff: None,
                    total_shift: None,
                });
                continue;
            };

            let dx = cur_el.rect.x - base_el.rect.x;
            let dy = cur_el.rect.y - base_el.rect.y;
            let dw = cur_el.rect.width - base_el.rect.width;
            let dh = cur_el.rect.height - base_el.rect.height;

            let has_moved = dx != 0.0 || dy != 0.0;
            let has_resized = dw != 0.0 || dh != 0.0;
            if !has_moved && !has_resized {
                continue;
            }

            let total_shift = dx.hypot(dy);
            max_shift = max_shift.max(total_shift);

            // Moved and resized counts toward both tallies but is reported once.
            if has_moved {
                moved += 1;
            }
            if has_resized {
                resized += 1;
            }
            let status = if has_moved {
                LayoutStatus::Moved
            } else {
                LayoutStatus::Resized
            };

            layout_diffs.push(LayoutDiff {
                xpath: base_el.xpath.clone(),
                selector: cur_el.selector.clone(),
                status,
                baseline_rect: Some(base_el.rect),
                current_rect: Some(cur_el.rect),
                position_diff: Some(PositionDiff { dx, dy }),
                size_diff: Some(SizeDiff { dw, dh }),
                total_shift: Some(total_shift),
            });
        }

        for cur_el in current_index.iter() {
            if baseline_index.contains(&cur_el.xpath) {
                continue;
            }
            added += 1;
            layout_diffs.push(LayoutDiff {
                xpath: cur_el.xpath.clone(),
                selector: cur_el.selector.clone(),
                status: LayoutStatus::Added,
                baseline_rect: None,
                current_rect: Some(cur_el.rect),
                position_diff: None,
                size_diff: None,
                total_shift: None,
            });
        }

        let unique = baseline_index.len() + added as usize;
        let changes = moved + resized + added + removed;
        let layout_diff_ratio = if unique > 0 {
            f64::from(changes) / unique as f64
        } else {
            0.0
        };
        let pass = layout_diff_ratio <= self.threshold;

        reporter.debug(&format!(
            "Layout comparison: {added} added, {removed} removed, {moved} moved, {resized} resized"
        ));
        reporter.debug(&format!(
            "Max shift: {max_shift:.2}px, diff ratio: {:.4}%",
            layout_diff_ratio * 100.0
        ));

        Ok(LayoutComparisonResult {
            added_elements: added,
            removed_elements: removed,
            moved_elements: moved,
            resized_elements: resized,
            max_shift,
            layout_diff_ratio,
            layout_diffs,
            pass,
        })
    }
}

/// Read and parse a structure snapshot JSON file.
pub fn load_structure_snapshot(path: &Path) -> Result<StructureSnapshot> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| PrtError::invalid_snapshot(path, e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| PrtError::invalid_snapshot(path, e.to_string()))
}

/// Elements keyed by xpath, iterated in first-occurrence order.
struct ElementIndex<'a> {
    order: Vec<&'a ElementSnapshot>,
    by_xpath: HashMap<&'a str, usize>,
}

impl<'a> ElementIndex<'a> {
    fn build(
        elements: &'a [ElementSnapshot],
        policy: DuplicateXpathPolicy,
        label: &str,
    ) -> Result<Self> {
        let mut order: Vec<&ElementSnapshot> = Vec::with_capacity(elements.len());
        let mut by_xpath = HashMap::with_capacity(elements.len());

        for el in elements {
            match by_xpath.get(el.xpath.as_str()) {
                None => {
                    by_xpath.insert(el.xpath.as_str(), order.len());
                    order.push(el);
                }
                Some(&slot) => match policy {
                    DuplicateXpathPolicy::Last => order[slot] = el,
                    DuplicateXpathPolicy::First => {}
                    DuplicateXpathPolicy::Reject => {
                        return Err(PrtError::invalid_snapshot(
                            label,
                            format!("duplicate xpath {}", el.xpath),
                        ));
                    }
                },
            }
        }

        Ok(Self { order, by_xpath })
    }

    fn get(&self, xpath: &str) -> Option<&'a ElementSnapshot> {
        self.by_xpath.get(xpath).map(|&slot| self.order[slot])
    }

    fn contains(&self, xpath: &str) -> bool {
        self.by_xpath.contains_key(xpath)
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn iter(&self) -> impl Iterator<Item = &'a ElementSnapshot> + '_ {
        self.order.iter().copied()
    }
}
