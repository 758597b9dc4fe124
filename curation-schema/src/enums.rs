use serde::Serialize;

/// Closed value sets stored as their variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Enumeration {
    ReferenceGenome,
    AlterationType,
    ArticleType,
    TumorForm,
    EligibilityCriteriaType,
    GenomeFragmentType,
    SequenceType,
    FdaSubmissionTypeKey,
}

impl Enumeration {
    pub const fn name(self) -> &'static str {
        match self {
            Enumeration::ReferenceGenome => "ReferenceGenome",
            Enumeration::AlterationType => "AlterationType",
            Enumeration::ArticleType => "ArticleType",
            Enumeration::TumorForm => "TumorForm",
            Enumeration::EligibilityCriteriaType => "EligibilityCriteriaType",
            Enumeration::GenomeFragmentType => "GenomeFragmentType",
            Enumeration::SequenceType => "SequenceType",
            Enumeration::FdaSubmissionTypeKey => "FdaSubmissionTypeKey",
        }
    }

    pub const fn variants(self) -> &'static [&'static str] {
        match self {
            Enumeration::ReferenceGenome => &["GRCh37", "GRCh38"],
            Enumeration::AlterationType => &[
                "GENOMIC_CHANGE",
                "CDNA_CHANGE",
                "PROTEIN_CHANGE",
                "MUTATION",
                "COPY_NUMBER_ALTERATION",
                "STRUCTURAL_VARIANT",
                "ONCOGENIC_MUTATIONS",
                "GAIN_OF_FUNCTION_MUTATIONS",
                "ANY",
            ],
            Enumeration::ArticleType => &["PUBMED", "ABSTRACT"],
            Enumeration::TumorForm => &["SOLID", "LIQUID", "MIXED"],
            Enumeration::EligibilityCriteriaType => &["INCLUSION", "EXCLUSION"],
            Enumeration::GenomeFragmentType => {
                &["GENE", "EXON", "FIVE_PRIME_UTR", "THREE_PRIME_UTR"]
            }
            Enumeration::SequenceType => &["PROTEIN", "CDNA"],
            Enumeration::FdaSubmissionTypeKey => &["PMA", "PMN", "HDE", "DE_NOVO"],
        }
    }

    /// Exact, case-sensitive match against the declared variants.
    pub fn parse(self, raw: &str) -> Option<&'static str> {
        self.variants().iter().copied().find(|v| *v == raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_sensitive() {
        assert_eq!(Enumeration::ReferenceGenome.parse("GRCh38"), Some("GRCh38"));
        assert_eq!(Enumeration::ReferenceGenome.parse("grch38"), None);
        assert_eq!(Enumeration::TumorForm.parse("LIQUID"), Some("LIQUID"));
    }
}
