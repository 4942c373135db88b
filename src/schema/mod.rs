//! Schema registry: the twelve QC tables, their typed optional fields and the
//! static field→table map used by the filter compiler.

mod tables;

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::QcError;

/// Name of the sample key column shared by every table.
pub const SAMPLE_KEY: &str = "sample";

/// Declared storage type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Real => "real",
            FieldType::Text => "text",
            FieldType::Date => "date",
        }
    }

    /// SQLite column affinity; dates are stored as ISO-8601 text
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Real => "REAL",
            FieldType::Text | FieldType::Date => "TEXT",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Integer | FieldType::Real)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub ty: FieldType,
}

/// The twelve QC tables. Declaration order is the fixed table-iteration order
/// used by aggregation and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QcTable {
    ReportedAges,
    BsRate,
    Coverage,
    Fastp,
    Markdup,
    PicardAlignmentSummary,
    PicardGcBias,
    PicardGcBiasSummary,
    PicardHs,
    PicardInsertSize,
    PicardQualityYield,
    Screen,
}

/// Per-table schema view.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub table: QcTable,
    pub sample_key: &'static str,
    pub fields: &'static [FieldDef],
}

impl TableSchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

impl QcTable {
    pub const ALL: [QcTable; 12] = [
        QcTable::ReportedAges,
        QcTable::BsRate,
        QcTable::Coverage,
        QcTable::Fastp,
        QcTable::Markdup,
        QcTable::PicardAlignmentSummary,
        QcTable::PicardGcBias,
        QcTable::PicardGcBiasSummary,
        QcTable::PicardHs,
        QcTable::PicardInsertSize,
        QcTable::PicardQualityYield,
        QcTable::Screen,
    ];

    /// SQL table name
    pub fn table_name(&self) -> &'static str {
        match self {
            QcTable::ReportedAges => "reported_ages",
            QcTable::BsRate => "bs_rate",
            QcTable::Coverage => "coverage",
            QcTable::Fastp => "fastp",
            QcTable::Markdup => "markdup",
            QcTable::PicardAlignmentSummary => "picard_alignment_summary",
            QcTable::PicardGcBias => "picard_gc_bias",
            QcTable::PicardGcBiasSummary => "picard_gc_bias_summary",
            QcTable::PicardHs => "picard_hs",
            QcTable::PicardInsertSize => "picard_insert_size",
            QcTable::PicardQualityYield => "picard_quality_yield",
            QcTable::Screen => "screen",
        }
    }

    /// Name used for API payload keys and export file names
    pub fn display_name(&self) -> &'static str {
        match self {
            QcTable::ReportedAges => "ReportedAges",
            QcTable::BsRate => "BsRate",
            QcTable::Coverage => "Coverage",
            QcTable::Fastp => "Fastp",
            QcTable::Markdup => "Markdup",
            QcTable::PicardAlignmentSummary => "PicardAlignmentSummary",
            QcTable::PicardGcBias => "PicardGcBias",
            QcTable::PicardGcBiasSummary => "PicardGcBiasSummary",
            QcTable::PicardHs => "PicardHs",
            QcTable::PicardInsertSize => "PicardInsertSize",
            QcTable::PicardQualityYield => "PicardQualityYield",
            QcTable::Screen => "Screen",
        }
    }

    /// Workbook sheet name this table is ingested from
    pub fn sheet_name(&self) -> &'static str {
        match self {
            QcTable::ReportedAges => "ages",
            QcTable::BsRate => "bsrate",
            QcTable::Coverage => "coverage",
            QcTable::Fastp => "fastp",
            QcTable::Markdup => "markdup",
            QcTable::PicardAlignmentSummary => "picard.alignmentSummary",
            QcTable::PicardGcBias => "picard.gcBias",
            QcTable::PicardGcBiasSummary => "picard.gcBiasSummary",
            QcTable::PicardHs => "picard.hs",
            QcTable::PicardInsertSize => "picard.insertSize",
            QcTable::PicardQualityYield => "picard.qualityYield",
            QcTable::Screen => "screen",
        }
    }

    pub fn from_sheet_name(sheet: &str) -> Option<QcTable> {
        let sheet = sheet.trim();
        QcTable::ALL.into_iter().find(|t| t.sheet_name() == sheet)
    }

    pub fn schema(&self) -> TableSchema {
        let fields = match self {
            QcTable::ReportedAges => tables::REPORTED_AGES,
            QcTable::BsRate => tables::BS_RATE,
            QcTable::Coverage => tables::COVERAGE,
            QcTable::Fastp => tables::FASTP,
            QcTable::Markdup => tables::MARKDUP,
            QcTable::PicardAlignmentSummary => tables::PICARD_ALIGNMENT_SUMMARY,
            QcTable::PicardGcBias => tables::PICARD_GC_BIAS,
            QcTable::PicardGcBiasSummary => tables::PICARD_GC_BIAS_SUMMARY,
            QcTable::PicardHs => tables::PICARD_HS,
            QcTable::PicardInsertSize => tables::PICARD_INSERT_SIZE,
            QcTable::PicardQualityYield => tables::PICARD_QUALITY_YIELD,
            QcTable::Screen => tables::SCREEN,
        };
        TableSchema {
            table: *self,
            sample_key: SAMPLE_KEY,
            fields,
        }
    }
}

impl fmt::Display for QcTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for QcTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.display_name())
    }
}

/// Fields that may appear in a filter expression, each bound to exactly one
/// owning table. Names shared by several tables (e.g. `total_reads`) are
/// not filterable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    LambdaDnaConversionRate,
    Puc19Vector,
    PctSelectedBases,
    Fold80BasePenalty,
    PctTargetBases10x,
    PercentDuplication,
    MeanInsertSize,
    DuplicationRate,
    Age,
    Human,
}

impl FilterField {
    pub const ALL: [FilterField; 10] = [
        FilterField::LambdaDnaConversionRate,
        FilterField::Puc19Vector,
        FilterField::PctSelectedBases,
        FilterField::Fold80BasePenalty,
        FilterField::PctTargetBases10x,
        FilterField::PercentDuplication,
        FilterField::MeanInsertSize,
        FilterField::DuplicationRate,
        FilterField::Age,
        FilterField::Human,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FilterField::LambdaDnaConversionRate => "lambda_dna_conversion_rate",
            FilterField::Puc19Vector => "puc19vector",
            FilterField::PctSelectedBases => "pct_selected_bases",
            FilterField::Fold80BasePenalty => "fold_80_base_penalty",
            FilterField::PctTargetBases10x => "pct_target_bases_10x",
            FilterField::PercentDuplication => "percent_duplication",
            FilterField::MeanInsertSize => "mean_insert_size",
            FilterField::DuplicationRate => "duplication_rate",
            FilterField::Age => "age",
            FilterField::Human => "human",
        }
    }

    pub fn table(&self) -> QcTable {
        match self {
            FilterField::LambdaDnaConversionRate | FilterField::Puc19Vector => QcTable::BsRate,
            FilterField::PctSelectedBases
            | FilterField::Fold80BasePenalty
            | FilterField::PctTargetBases10x => QcTable::PicardHs,
            FilterField::PercentDuplication => QcTable::Markdup,
            FilterField::MeanInsertSize => QcTable::PicardInsertSize,
            FilterField::DuplicationRate => QcTable::Fastp,
            FilterField::Age => QcTable::ReportedAges,
            FilterField::Human => QcTable::Screen,
        }
    }

    /// Column accessor into the owning table's schema
    pub fn column(&self) -> FieldDef {
        // every variant names a declared numeric field of its table
        self.table()
            .schema()
            .field(self.name())
            .copied()
            .unwrap_or(FieldDef {
                name: self.name(),
                ty: FieldType::Real,
            })
    }
}

impl FromStr for FilterField {
    type Err = QcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| QcError::UnknownFilterField(s.to_string()))
    }
}
