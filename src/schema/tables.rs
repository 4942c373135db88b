//! Field declarations for the twelve QC tables.
//!
//! Every field is optional; the sample key is declared separately on
//! [`super::TableSchema`].

use super::FieldDef;
use super::FieldType::{Date, Integer, Real, Text};

const fn f(name: &'static str, ty: super::FieldType) -> FieldDef {
    FieldDef { name, ty }
}

pub(super) const REPORTED_AGES: &[FieldDef] = &[
    f("gender", Text),
    f("age", Integer),
    f("sample_date", Date),
    f("menopausal_status", Text),
    f("ptid", Text),
    f("esti_gender", Text),
    f("cfdna", Real),
    f("wbc", Real),
    f("colon", Real),
    f("liver", Real),
    f("ovary", Real),
    f("pancreas", Real),
    f("prostate", Real),
    f("small_intestine", Real),
    f("spleen", Real),
    f("stomach", Real),
    f("adj_ovary_menopause", Real),
    f("adj_ovary_no_menopause", Real),
];

pub(super) const BS_RATE: &[FieldDef] = &[
    f("puc19vector", Real),
    f("lambda_dna_conversion_rate", Real),
];

pub(super) const COVERAGE: &[FieldDef] = &[
    f("pct_v2_sites_5x", Real),
    f("pct_v2_sites_15x", Real),
    f("pct_v2_sites_20x", Real),
    f("pct_pcages_sites_5x", Real),
    f("pct_pcages_sites_15x", Real),
    f("pct_pcages_sites_20x", Real),
    f("pct_horvath_sites_5x", Real),
    f("pct_horvath_sites_15x", Real),
    f("pct_horvath_sites_20x", Real),
    f("pct_skinblood_sites_5x", Real),
    f("pct_skinblood_sites_15x", Real),
    f("pct_skinblood_sites_20x", Real),
];

// fastp reports several summary counts pre-formatted, so they stay text.
pub(super) const FASTP: &[FieldDef] = &[
    f("total_reads", Text),
    f("total_bases", Text),
    f("q20_bases", Text),
    f("q30_bases", Text),
    f("q20_rate", Text),
    f("q30_rate", Text),
    f("read1_mean_length", Text),
    f("read2_mean_length", Text),
    f("gc_content", Text),
    f("passed_filter_reads", Integer),
    f("corrected_reads", Integer),
    f("corrected_bases", Integer),
    f("low_quality_reads", Integer),
    f("too_many_n_reads", Integer),
    f("too_short_reads", Integer),
    f("too_long_reads", Integer),
    f("duplication_rate", Real),
    f("adapter_trimmed_reads", Integer),
    f("adapter_trimmed_bases", Integer),
    f("read1_adapter_sequence", Text),
    f("read2_adapter_sequence", Text),
    f("total_polyx_trimmed_reads", Integer),
    f("polyx_trimmed_reads", Text),
    f("total_polyx_trimmed_bases", Integer),
    f("polyx_trimmed_bases", Text),
    f("read1_total_reads", Text),
    f("read1_total_bases", Text),
    f("read1_q20_bases", Text),
    f("read1_q30_bases", Text),
    f("read2_total_reads", Text),
    f("read2_total_bases", Text),
    f("read2_q20_bases", Text),
    f("read2_q30_bases", Text),
];

pub(super) const MARKDUP: &[FieldDef] = &[
    f("total_read_pairs", Integer),
    f("read_pair_duplicates", Integer),
    f("percent_duplication", Real),
];

pub(super) const PICARD_ALIGNMENT_SUMMARY: &[FieldDef] = &[
    f("category", Text),
    f("total_reads", Integer),
    f("pf_reads", Integer),
    f("pct_pf_reads", Real),
    f("pf_noise_reads", Integer),
    f("pf_reads_aligned", Integer),
    f("pct_pf_reads_aligned", Real),
    f("pf_aligned_bases", Integer),
    f("pf_hq_aligned_reads", Integer),
    f("pf_hq_aligned_bases", Integer),
    f("pf_hq_aligned_q20_bases", Integer),
    f("pf_hq_median_mismatches", Real),
    f("pf_mismatch_rate", Real),
    f("pf_hq_error_rate", Real),
    f("pf_indel_rate", Real),
    f("mean_read_length", Real),
    f("sd_read_length", Real),
    f("median_read_length", Integer),
    f("mad_read_length", Integer),
    f("min_read_length", Integer),
    f("max_read_length", Integer),
    f("mean_aligned_read_length", Real),
    f("reads_aligned_in_pairs", Integer),
    f("pct_reads_aligned_in_pairs", Real),
    f("pf_reads_improper_pairs", Integer),
    f("pct_pf_reads_improper_pairs", Real),
    f("bad_cycles", Integer),
    f("strand_balance", Real),
    f("pct_chimeras", Real),
    f("pct_adapter", Real),
    f("pct_softclip", Real),
    f("pct_hardclip", Real),
    f("avg_pos_3prime_softclip_length", Real),
    f("library", Text),
    f("read_group", Text),
];

pub(super) const PICARD_GC_BIAS: &[FieldDef] = &[
    f("accumulation_level", Real),
    f("reads_used", Integer),
    f("gc", Integer),
    f("windows", Integer),
    f("read_starts", Integer),
    f("mean_base_quality", Real),
    f("normalized_coverage", Real),
    f("error_bar_width", Real),
    f("library", Text),
    f("read_group", Text),
];

pub(super) const PICARD_GC_BIAS_SUMMARY: &[FieldDef] = &[
    f("accumulation_level", Real),
    f("reads_used", Integer),
    f("window_size", Integer),
    f("total_clusters", Integer),
    f("aligned_reads", Integer),
    f("at_dropout", Real),
    f("gc_dropout", Real),
    f("gc_nc_0_19", Real),
    f("gc_nc_20_39", Real),
    f("gc_nc_40_59", Real),
    f("gc_nc_60_79", Real),
    f("gc_nc_80_100", Real),
    f("library", Text),
    f("read_group", Text),
];

pub(super) const PICARD_HS: &[FieldDef] = &[
    f("bait_set", Text),
    f("bait_territory", Integer),
    f("bait_design_efficiency", Real),
    f("on_bait_bases", Integer),
    f("near_bait_bases", Integer),
    f("off_bait_bases", Integer),
    f("pct_selected_bases", Real),
    f("pct_off_bait", Real),
    f("on_bait_vs_selected", Real),
    f("mean_bait_coverage", Real),
    f("pct_usable_bases_on_bait", Real),
    f("pct_usable_bases_on_target", Real),
    f("fold_enrichment", Real),
    f("hs_library_size", Integer),
    f("hs_penalty_10x", Real),
    f("hs_penalty_20x", Real),
    f("hs_penalty_30x", Real),
    f("hs_penalty_40x", Real),
    f("hs_penalty_50x", Real),
    f("hs_penalty_100x", Real),
    f("target_territory", Integer),
    f("genome_size", Integer),
    f("total_reads", Integer),
    f("pf_reads", Integer),
    f("pf_bases", Integer),
    f("pf_unique_reads", Integer),
    f("pf_uq_reads_aligned", Integer),
    f("pf_bases_aligned", Integer),
    f("pf_uq_bases_aligned", Integer),
    f("on_target_bases", Integer),
    f("pct_pf_reads", Real),
    f("pct_pf_uq_reads", Real),
    f("pct_pf_uq_reads_aligned", Real),
    f("mean_target_coverage", Real),
    f("median_target_coverage", Real),
    f("max_target_coverage", Real),
    f("min_target_coverage", Real),
    f("zero_cvg_targets_pct", Real),
    f("pct_exc_dupe", Real),
    f("pct_exc_adapter", Real),
    f("pct_exc_mapq", Real),
    f("pct_exc_baseq", Real),
    f("pct_exc_overlap", Real),
    f("pct_exc_off_target", Real),
    f("fold_80_base_penalty", Real),
    f("pct_target_bases_1x", Real),
    f("pct_target_bases_2x", Real),
    f("pct_target_bases_10x", Real),
    f("pct_target_bases_20x", Real),
    f("pct_target_bases_30x", Real),
    f("pct_target_bases_40x", Real),
    f("pct_target_bases_50x", Real),
    f("pct_target_bases_100x", Real),
    f("pct_target_bases_250x", Real),
    f("pct_target_bases_500x", Real),
    f("pct_target_bases_1000x", Real),
    f("pct_target_bases_2500x", Real),
    f("pct_target_bases_5000x", Real),
    f("pct_target_bases_10000x", Real),
    f("pct_target_bases_25000x", Real),
    f("pct_target_bases_50000x", Real),
    f("pct_target_bases_100000x", Real),
    f("at_dropout", Real),
    f("gc_dropout", Real),
    f("het_snp_sensitivity", Real),
    f("het_snp_q", Real),
    f("library", Text),
    f("read_group", Text),
];

pub(super) const PICARD_INSERT_SIZE: &[FieldDef] = &[
    f("median_insert_size", Integer),
    f("mode_insert_size", Integer),
    f("median_absolute_deviation", Integer),
    f("min_insert_size", Integer),
    f("max_insert_size", Integer),
    f("mean_insert_size", Real),
    f("standard_deviation", Real),
    f("read_pairs", Integer),
    f("pair_orientation", Text),
    f("width_of_10_percent", Integer),
    f("width_of_20_percent", Integer),
    f("width_of_30_percent", Integer),
    f("width_of_40_percent", Integer),
    f("width_of_50_percent", Integer),
    f("width_of_60_percent", Integer),
    f("width_of_70_percent", Integer),
    f("width_of_80_percent", Integer),
    f("width_of_90_percent", Integer),
    f("width_of_95_percent", Integer),
    f("width_of_99_percent", Integer),
    f("library", Text),
    f("read_group", Text),
];

pub(super) const PICARD_QUALITY_YIELD: &[FieldDef] = &[
    f("total_reads", Integer),
    f("pf_reads", Integer),
    f("read_length", Integer),
    f("total_bases", Integer),
    f("pf_bases", Integer),
    f("q20_bases", Integer),
    f("pf_q20_bases", Integer),
    f("q30_bases", Integer),
    f("pf_q30_bases", Integer),
    f("q20_equivalent_yield", Integer),
    f("pf_q20_equivalent_yield", Integer),
];

pub(super) const SCREEN: &[FieldDef] = &[
    f("human", Real),
    f("dna", Real),
    f("puc19", Real),
    f("human_unmap", Real),
    f("sample_r1r2", Text),
];
