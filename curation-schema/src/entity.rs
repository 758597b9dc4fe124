use crate::catalog;
use crate::field::FieldDef;
use crate::relation::RelationDef;

/// Every entity exposed under `/api/<path>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Flag,
    Synonym,
    NciThesaurus,
    Gene,
    SeqRegion,
    EnsemblGene,
    Transcript,
    GenomeFragment,
    Sequence,
    Consequence,
    Alteration,
    Article,
    CancerType,
    ClinicalTrial,
    EligibilityCriteria,
    CompanionDiagnosticDevice,
    FdaSubmissionType,
    FdaSubmission,
    Drug,
    FdaDrug,
    Treatment,
    Association,
    Evidence,
    GenomicIndicator,
    History,
}

impl EntityKind {
    pub const ALL: [EntityKind; 25] = [
        EntityKind::Flag,
        EntityKind::Synonym,
        EntityKind::NciThesaurus,
        EntityKind::Gene,
        EntityKind::SeqRegion,
        EntityKind::EnsemblGene,
        EntityKind::Transcript,
        EntityKind::GenomeFragment,
        EntityKind::Sequence,
        EntityKind::Consequence,
        EntityKind::Alteration,
        EntityKind::Article,
        EntityKind::CancerType,
        EntityKind::ClinicalTrial,
        EntityKind::EligibilityCriteria,
        EntityKind::CompanionDiagnosticDevice,
        EntityKind::FdaSubmissionType,
        EntityKind::FdaSubmission,
        EntityKind::Drug,
        EntityKind::FdaDrug,
        EntityKind::Treatment,
        EntityKind::Association,
        EntityKind::Evidence,
        EntityKind::GenomicIndicator,
        EntityKind::History,
    ];

    pub fn def(self) -> &'static EntityDef {
        match self {
            EntityKind::Flag => &catalog::FLAG,
            EntityKind::Synonym => &catalog::SYNONYM,
            EntityKind::NciThesaurus => &catalog::NCI_THESAURUS,
            EntityKind::Gene => &catalog::GENE,
            EntityKind::SeqRegion => &catalog::SEQ_REGION,
            EntityKind::EnsemblGene => &catalog::ENSEMBL_GENE,
            EntityKind::Transcript => &catalog::TRANSCRIPT,
            EntityKind::GenomeFragment => &catalog::GENOME_FRAGMENT,
            EntityKind::Sequence => &catalog::SEQUENCE,
            EntityKind::Consequence => &catalog::CONSEQUENCE,
            EntityKind::Alteration => &catalog::ALTERATION,
            EntityKind::Article => &catalog::ARTICLE,
            EntityKind::CancerType => &catalog::CANCER_TYPE,
            EntityKind::ClinicalTrial => &catalog::CLINICAL_TRIAL,
            EntityKind::EligibilityCriteria => &catalog::ELIGIBILITY_CRITERIA,
            EntityKind::CompanionDiagnosticDevice => &catalog::COMPANION_DIAGNOSTIC_DEVICE,
            EntityKind::FdaSubmissionType => &catalog::FDA_SUBMISSION_TYPE,
            EntityKind::FdaSubmission => &catalog::FDA_SUBMISSION,
            EntityKind::Drug => &catalog::DRUG,
            EntityKind::FdaDrug => &catalog::FDA_DRUG,
            EntityKind::Treatment => &catalog::TREATMENT,
            EntityKind::Association => &catalog::ASSOCIATION,
            EntityKind::Evidence => &catalog::EVIDENCE,
            EntityKind::GenomicIndicator => &catalog::GENOMIC_INDICATOR,
            EntityKind::History => &catalog::HISTORY,
        }
    }

    /// Resolve the URL segment after `/api/`.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.def().path == path)
    }
}

/// Static description of one entity: its table, scalar fields and relations.
#[derive(Debug)]
pub struct EntityDef {
    pub kind: EntityKind,
    /// camelCase entity name used in alert headers and logs.
    pub name: &'static str,
    pub path: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldDef],
    pub relations: &'static [RelationDef],
    /// Text fields matched by free-text search; the first one ranks results.
    pub search_fields: &'static [&'static str],
}

impl EntityDef {
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn relation_by_filter_key(&self, key: &str) -> Option<&'static RelationDef> {
        self.relations.iter().find(|r| r.matches_filter_key(key))
    }

    pub fn owned_relations(&self) -> impl Iterator<Item = &'static RelationDef> {
        self.relations.iter().filter(|r| r.is_owned())
    }

    pub fn search_columns(&self) -> impl Iterator<Item = &'static FieldDef> {
        self.search_fields.iter().filter_map(|name| self.field(name))
    }
}
