//! Marketplace report data.
//!
//! Turns teacher and school snapshots into a paginated sequence of text and
//! number blocks under fixed section headings. Rendering to a page layout is
//! left to the consumer; [`Report::render_text`] gives a plain-text view.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ReportConfig;
use crate::entity::{ContactFields, School, Teacher};
use crate::error::ValidationError;

/// Bucket for records with no value in a breakdown category.
pub const UNSPECIFIED: &str = "Unspecified";

const NOT_SET: &str = "-";

/// Aggregate counts for both record families.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    /// All teacher records.
    pub total_teachers: usize,
    /// Teachers shown publicly.
    pub active_teachers: usize,
    /// Promoted teachers.
    pub featured_teachers: usize,
    /// All school records.
    pub total_schools: usize,
    /// Schools shown publicly.
    pub active_schools: usize,
    /// Promoted schools.
    pub featured_schools: usize,
}

impl ReportStats {
    /// Counts over the given snapshots.
    #[must_use]
    pub fn from_records(teachers: &[Teacher], schools: &[School]) -> Self {
        Self {
            total_teachers: teachers.len(),
            active_teachers: teachers.iter().filter(|t| t.is_active).count(),
            featured_teachers: teachers.iter().filter(|t| t.is_featured).count(),
            total_schools: schools.len(),
            active_schools: schools.iter().filter(|s| s.is_active).count(),
            featured_schools: schools.iter().filter(|s| s.is_featured).count(),
        }
    }
}

/// One unit of report content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum ReportBlock {
    /// Section title.
    Heading {
        /// Heading text.
        text: String,
    },
    /// A labelled count.
    Metric {
        /// What is counted.
        label: String,
        /// The count.
        value: usize,
    },
    /// A category count with its share of the total.
    Share {
        /// Category.
        label: String,
        /// Records in the category.
        count: usize,
        /// `count * 100 / total`, one decimal.
        percent: f64,
    },
    /// A directory row.
    Row {
        /// Cell texts.
        cells: Vec<String>,
    },
    /// Vertical spacing.
    Blank,
}

impl ReportBlock {
    fn heading(text: &str) -> Self {
        Self::Heading {
            text: text.to_string(),
        }
    }

    fn metric(label: &str, value: usize) -> Self {
        Self::Metric {
            label: label.to_string(),
            value,
        }
    }

    const fn is_heading(&self) -> bool {
        matches!(self, Self::Heading { .. })
    }
}

/// A paginated report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Report title.
    pub title: String,
    /// When the report was built.
    pub generated_at: DateTime<Utc>,
    /// Aggregate counts shown in the summary.
    pub stats: ReportStats,
    /// Pages of blocks; never empty.
    pub pages: Vec<Vec<ReportBlock>>,
}

impl Report {
    /// Builds a report stamped with the current time.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidReportConfig`] for unusable layout
    /// limits.
    pub fn build(
        teachers: &[Teacher],
        schools: &[School],
        config: &ReportConfig,
    ) -> Result<Self, ValidationError> {
        Self::build_at(teachers, schools, config, Utc::now())
    }

    /// Builds a report with an explicit timestamp.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidReportConfig`] for unusable layout
    /// limits.
    pub fn build_at(
        teachers: &[Teacher],
        schools: &[School],
        config: &ReportConfig,
        generated_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        let stats = ReportStats::from_records(teachers, schools);

        let mut blocks = Vec::new();
        summary_section(&mut blocks, &stats);
        breakdown_section(
            &mut blocks,
            "Teachers by District",
            teachers.iter().map(|t| category(t.district.as_deref())),
            teachers.len(),
        );
        breakdown_section(
            &mut blocks,
            "Teachers by Subject",
            teachers.iter().flat_map(teacher_subjects),
            teachers.len(),
        );
        breakdown_section(
            &mut blocks,
            "Schools by Type",
            schools.iter().map(|s| category(s.school_type.as_deref())),
            schools.len(),
        );
        school_directory(&mut blocks, schools, config.directory_limit);
        teacher_directory(&mut blocks, teachers, config.directory_limit);

        let pages = paginate(blocks, config.rows_per_page);
        debug!(
            teachers = stats.total_teachers,
            schools = stats.total_schools,
            pages = pages.len(),
            "report built"
        );

        Ok(Self {
            title: config.title.clone(),
            generated_at,
            stats,
            pages,
        })
    }

    /// Number of pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Plain-text rendering with a `Page n of m` footer on every page.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let total = self.pages.len();
        for (index, page) in self.pages.iter().enumerate() {
            if index == 0 {
                let _ = writeln!(out, "{}", self.title);
                let _ = writeln!(out, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M UTC"));
                out.push('\n');
            }
            for block in page {
                render_block(&mut out, block);
            }
            let _ = writeln!(out, "\nPage {} of {total}", index + 1);
            if index + 1 < total {
                out.push('\n');
            }
        }
        out
    }
}

fn render_block(out: &mut String, block: &ReportBlock) {
    let _ = match block {
        ReportBlock::Heading { text } => {
            writeln!(out, "{text}\n{}", "=".repeat(text.chars().count()))
        }
        ReportBlock::Metric { label, value } => writeln!(out, "{label}: {value}"),
        ReportBlock::Share {
            label,
            count,
            percent,
        } => writeln!(out, "{label}: {count} ({percent:.1}%)"),
        ReportBlock::Row { cells } => writeln!(out, "{}", cells.join(" | ")),
        ReportBlock::Blank => writeln!(out),
    };
}

/// `count * 100 / total` rounded to one decimal; `0.0` for an empty total.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

/// Splits blocks into pages of at most `rows_per_page` blocks.
///
/// A heading never closes a page: it is carried over to start the next one.
#[must_use]
pub fn paginate(blocks: Vec<ReportBlock>, rows_per_page: usize) -> Vec<Vec<ReportBlock>> {
    let budget = rows_per_page.max(2);
    let mut pages = Vec::new();
    let mut current: Vec<ReportBlock> = Vec::with_capacity(budget);

    for block in blocks {
        current.push(block);
        if current.len() < budget {
            continue;
        }
        let carried = if current.last().is_some_and(ReportBlock::is_heading) {
            current.pop()
        } else {
            None
        };
        pages.push(std::mem::replace(&mut current, Vec::with_capacity(budget)));
        current.extend(carried);
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    pages
}

fn summary_section(blocks: &mut Vec<ReportBlock>, stats: &ReportStats) {
    blocks.push(ReportBlock::heading("Summary"));
    blocks.push(ReportBlock::metric("Total teachers", stats.total_teachers));
    blocks.push(ReportBlock::metric("Active teachers", stats.active_teachers));
    blocks.push(ReportBlock::metric("Featured teachers", stats.featured_teachers));
    blocks.push(ReportBlock::metric("Total schools", stats.total_schools));
    blocks.push(ReportBlock::metric("Active schools", stats.active_schools));
    blocks.push(ReportBlock::metric("Featured schools", stats.featured_schools));
    blocks.push(ReportBlock::Blank);
}

fn category(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(UNSPECIFIED)
        .to_string()
}

/// Distinct non-blank subjects, or the unspecified bucket.
fn teacher_subjects(teacher: &Teacher) -> Vec<String> {
    let subjects: BTreeSet<&str> = teacher
        .subjects
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if subjects.is_empty() {
        vec![UNSPECIFIED.to_string()]
    } else {
        subjects.into_iter().map(str::to_string).collect()
    }
}

fn breakdown_section(
    blocks: &mut Vec<ReportBlock>,
    title: &str,
    labels: impl Iterator<Item = String>,
    total: usize,
) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut rows: Vec<(String, usize)> = counts.into_iter().collect();
    rows.sort_by(|a, b| (Reverse(a.1), &a.0).cmp(&(Reverse(b.1), &b.0)));

    blocks.push(ReportBlock::heading(title));
    for (label, count) in rows {
        blocks.push(ReportBlock::Share {
            percent: percentage(count, total),
            label,
            count,
        });
    }
    blocks.push(ReportBlock::Blank);
}

fn cell(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(NOT_SET)
        .to_string()
}

fn school_directory(blocks: &mut Vec<ReportBlock>, schools: &[School], limit: usize) {
    let mut sorted: Vec<&School> = schools.iter().collect();
    sorted.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });

    blocks.push(ReportBlock::heading("School Directory"));
    blocks.push(ReportBlock::Row {
        cells: ["Name", "District", "Type", "Email"].map(String::from).to_vec(),
    });
    for school in sorted.iter().take(limit) {
        blocks.push(ReportBlock::Row {
            cells: vec![
                school.name.trim().to_string(),
                cell(school.district.as_deref()),
                cell(school.school_type.as_deref()),
                cell(school.email.as_deref()),
            ],
        });
    }
    if sorted.len() > limit {
        blocks.push(ReportBlock::metric("Not listed", sorted.len() - limit));
    }
    blocks.push(ReportBlock::Blank);
}

fn teacher_directory(blocks: &mut Vec<ReportBlock>, teachers: &[Teacher], limit: usize) {
    let mut sorted: Vec<&Teacher> = teachers.iter().collect();
    sorted.sort_by(|a, b| {
        a.full_name
            .to_lowercase()
            .cmp(&b.full_name.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });

    blocks.push(ReportBlock::heading("Teacher Directory"));
    blocks.push(ReportBlock::Row {
        cells: ["Name", "District", "Subjects", "Contact"].map(String::from).to_vec(),
    });
    for teacher in sorted.iter().take(limit) {
        let subjects = teacher_subjects(teacher);
        let subjects = if subjects == [UNSPECIFIED] {
            NOT_SET.to_string()
        } else {
            subjects.join(", ")
        };
        blocks.push(ReportBlock::Row {
            cells: vec![
                teacher.full_name.trim().to_string(),
                cell(teacher.district.as_deref()),
                subjects,
                cell(teacher.phone().or_else(|| teacher.email())),
            ],
        });
    }
    if sorted.len() > limit {
        blocks.push(ReportBlock::metric("Not listed", sorted.len() - limit));
    }
}
