//! The entity catalog.
//!
//! Join tables are named `rel_<owner>__<target>`; both sides of a
//! many-to-many point at the same table with the columns swapped.

use crate::entity::{EntityDef, EntityKind};
use crate::enums::Enumeration;
use crate::field::FieldDef;
use crate::relation::RelationDef;

pub static FLAG: EntityDef = EntityDef {
    kind: EntityKind::Flag,
    name: "flag",
    path: "flags",
    table: "flag",
    fields: &[
        FieldDef::text("type", "type").required(),
        FieldDef::text("flag", "flag").required(),
        FieldDef::text("name", "name").required(),
        FieldDef::text("description", "description").required(),
    ],
    relations: &[
        RelationDef::inverse(
            "alteration",
            EntityKind::Alteration,
            "rel_alteration__flag",
            "flag_id",
            "alteration_id",
        ),
        RelationDef::inverse(
            "article",
            EntityKind::Article,
            "rel_article__flag",
            "flag_id",
            "article_id",
        ),
        RelationDef::inverse(
            "drug",
            EntityKind::Drug,
            "rel_drug__flag",
            "flag_id",
            "drug_id",
        ),
        RelationDef::inverse(
            "gene",
            EntityKind::Gene,
            "rel_gene__flag",
            "flag_id",
            "gene_id",
        ),
        RelationDef::inverse(
            "transcript",
            EntityKind::Transcript,
            "rel_transcript__flag",
            "flag_id",
            "transcript_id",
        ),
    ],
    search_fields: &["name", "flag"],
};

pub static SYNONYM: EntityDef = EntityDef {
    kind: EntityKind::Synonym,
    name: "synonym",
    path: "synonyms",
    table: "synonym",
    fields: &[
        FieldDef::text("type", "type").required(),
        FieldDef::text("source", "source").required(),
        FieldDef::text("code", "code"),
        FieldDef::text("name", "name").required(),
        FieldDef::text("note", "note"),
    ],
    relations: &[
        RelationDef::inverse(
            "article",
            EntityKind::Article,
            "rel_article__synonym",
            "synonym_id",
            "article_id",
        ),
        RelationDef::inverse(
            "cancerType",
            EntityKind::CancerType,
            "rel_cancer_type__synonym",
            "synonym_id",
            "cancer_type_id",
        ),
        RelationDef::inverse(
            "gene",
            EntityKind::Gene,
            "rel_gene__synonym",
            "synonym_id",
            "gene_id",
        ),
        RelationDef::inverse(
            "nciThesaurus",
            EntityKind::NciThesaurus,
            "rel_nci_thesaurus__synonym",
            "synonym_id",
            "nci_thesaurus_id",
        ),
    ],
    search_fields: &["name", "code"],
};

pub static NCI_THESAURUS: EntityDef = EntityDef {
    kind: EntityKind::NciThesaurus,
    name: "nciThesaurus",
    path: "nci-thesauruses",
    table: "nci_thesaurus",
    fields: &[
        FieldDef::text("version", "version").required(),
        FieldDef::text("code", "code").required(),
        FieldDef::text("preferredName", "preferred_name"),
        FieldDef::text("displayName", "display_name").required(),
    ],
    relations: &[
        RelationDef::many_to_many(
            "synonyms",
            "synonym",
            EntityKind::Synonym,
            "rel_nci_thesaurus__synonym",
            "nci_thesaurus_id",
            "synonym_id",
        ),
        RelationDef::one_to_many("drug", EntityKind::Drug, "nci_thesaurus_id"),
    ],
    search_fields: &["displayName", "code", "preferredName"],
};

pub static GENE: EntityDef = EntityDef {
    kind: EntityKind::Gene,
    name: "gene",
    path: "genes",
    table: "gene",
    fields: &[
        FieldDef::integer("entrezGeneId", "entrez_gene_id"),
        FieldDef::text("hugoSymbol", "hugo_symbol").required(),
        FieldDef::text("hgncId", "hgnc_id"),
    ],
    relations: &[
        RelationDef::many_to_many(
            "flags",
            "flag",
            EntityKind::Flag,
            "rel_gene__flag",
            "gene_id",
            "flag_id",
        ),
        RelationDef::many_to_many(
            "synonyms",
            "synonym",
            EntityKind::Synonym,
            "rel_gene__synonym",
            "gene_id",
            "synonym_id",
        ),
        RelationDef::one_to_many("ensemblGene", EntityKind::EnsemblGene, "gene_id"),
        RelationDef::one_to_many("transcript", EntityKind::Transcript, "gene_id"),
        RelationDef::one_to_many("evidence", EntityKind::Evidence, "gene_id"),
        RelationDef::inverse(
            "alteration",
            EntityKind::Alteration,
            "rel_alteration__gene",
            "gene_id",
            "alteration_id",
        ),
    ],
    search_fields: &["hugoSymbol", "hgncId"],
};

pub static SEQ_REGION: EntityDef = EntityDef {
    kind: EntityKind::SeqRegion,
    name: "seqRegion",
    path: "seq-regions",
    table: "seq_region",
    fields: &[
        FieldDef::text("name", "name").required().unique(),
        FieldDef::text("chromosome", "chromosome").required(),
        FieldDef::text("description", "description"),
    ],
    relations: &[
        RelationDef::one_to_many("ensemblGene", EntityKind::EnsemblGene, "seq_region_id"),
        RelationDef::one_to_many("genomeFragment", EntityKind::GenomeFragment, "seq_region_id"),
    ],
    search_fields: &["name", "chromosome"],
};

pub static ENSEMBL_GENE: EntityDef = EntityDef {
    kind: EntityKind::EnsemblGene,
    name: "ensemblGene",
    path: "ensembl-genes",
    table: "ensembl_gene",
    fields: &[
        FieldDef::enumeration(
            "referenceGenome",
            "reference_genome",
            Enumeration::ReferenceGenome,
        )
        .required(),
        FieldDef::text("ensemblGeneId", "ensembl_gene_id").required(),
        FieldDef::boolean("canonical", "canonical").required(),
        FieldDef::integer("start", "start").required(),
        FieldDef::integer("end", "end").required(),
        FieldDef::integer("strand", "strand").required(),
    ],
    relations: &[
        RelationDef::many_to_one("gene", EntityKind::Gene, "gene_id"),
        RelationDef::many_to_one("seqRegion", EntityKind::SeqRegion, "seq_region_id"),
        RelationDef::one_to_many("transcript", EntityKind::Transcript, "ensembl_gene_id"),
    ],
    search_fields: &["ensemblGeneId"],
};

pub static TRANSCRIPT: EntityDef = EntityDef {
    kind: EntityKind::Transcript,
    name: "transcript",
    path: "transcripts",
    table: "transcript",
    fields: &[
        FieldDef::enumeration(
            "referenceGenome",
            "reference_genome",
            Enumeration::ReferenceGenome,
        ),
        FieldDef::text("ensemblTranscriptId", "ensembl_transcript_id"),
        FieldDef::boolean("canonical", "canonical").required(),
        FieldDef::text("ensemblProteinId", "ensembl_protein_id"),
        FieldDef::text("referenceSequenceId", "reference_sequence_id"),
        FieldDef::text("description", "description"),
    ],
    relations: &[
        RelationDef::many_to_one("ensemblGene", EntityKind::EnsemblGene, "ensembl_gene_id"),
        RelationDef::many_to_one("gene", EntityKind::Gene, "gene_id"),
        RelationDef::many_to_many(
            "flags",
            "flag",
            EntityKind::Flag,
            "rel_transcript__flag",
            "transcript_id",
            "flag_id",
        ),
        RelationDef::one_to_many("sequence", EntityKind::Sequence, "transcript_id"),
        RelationDef::one_to_many("fragments", EntityKind::GenomeFragment, "transcript_id"),
        RelationDef::inverse(
            "alteration",
            EntityKind::Alteration,
            "rel_alteration__transcript",
            "transcript_id",
            "alteration_id",
        ),
    ],
    search_fields: &["ensemblTranscriptId", "referenceSequenceId", "ensemblProteinId"],
};

pub static GENOME_FRAGMENT: EntityDef = EntityDef {
    kind: EntityKind::GenomeFragment,
    name: "genomeFragment",
    path: "genome-fragments",
    table: "genome_fragment",
    fields: &[
        FieldDef::integer("start", "start"),
        FieldDef::integer("end", "end"),
        FieldDef::integer("strand", "strand"),
        FieldDef::enumeration("type", "type", Enumeration::GenomeFragmentType).required(),
    ],
    relations: &[
        RelationDef::many_to_one("seqRegion", EntityKind::SeqRegion, "seq_region_id"),
        RelationDef::many_to_one("transcript", EntityKind::Transcript, "transcript_id"),
    ],
    search_fields: &[],
};

pub static SEQUENCE: EntityDef = EntityDef {
    kind: EntityKind::Sequence,
    name: "sequence",
    path: "sequences",
    table: "sequence",
    fields: &[
        FieldDef::enumeration("sequenceType", "sequence_type", Enumeration::SequenceType)
            .required(),
        FieldDef::text("sequence", "sequence"),
    ],
    relations: &[RelationDef::many_to_one(
        "transcript",
        EntityKind::Transcript,
        "transcript_id",
    )],
    search_fields: &[],
};

pub static CONSEQUENCE: EntityDef = EntityDef {
    kind: EntityKind::Consequence,
    name: "consequence",
    path: "consequences",
    table: "consequence",
    fields: &[
        FieldDef::enumeration("type", "type", Enumeration::AlterationType).required(),
        FieldDef::text("term", "term").required().unique(),
        FieldDef::text("name", "name").required(),
        FieldDef::boolean("isGenerallyTruncating", "is_generally_truncating").required(),
        FieldDef::text("description", "description"),
    ],
    relations: &[RelationDef::one_to_many(
        "alteration",
        EntityKind::Alteration,
        "consequence_id",
    )],
    search_fields: &["name", "term"],
};

pub static ALTERATION: EntityDef = EntityDef {
    kind: EntityKind::Alteration,
    name: "alteration",
    path: "alterations",
    table: "alteration",
    fields: &[
        FieldDef::enumeration("type", "type", Enumeration::AlterationType).required(),
        FieldDef::text("name", "name").required(),
        FieldDef::text("alteration", "alteration").required(),
        FieldDef::text("proteinChange", "protein_change").required(),
        FieldDef::integer("start", "start"),
        FieldDef::integer("end", "end"),
        FieldDef::text("refResidues", "ref_residues"),
        FieldDef::text("variantResidues", "variant_residues"),
    ],
    relations: &[
        RelationDef::many_to_many(
            "flags",
            "flag",
            EntityKind::Flag,
            "rel_alteration__flag",
            "alteration_id",
            "flag_id",
        ),
        RelationDef::many_to_many(
            "genes",
            "gene",
            EntityKind::Gene,
            "rel_alteration__gene",
            "alteration_id",
            "gene_id",
        ),
        RelationDef::many_to_many(
            "transcripts",
            "transcript",
            EntityKind::Transcript,
            "rel_alteration__transcript",
            "alteration_id",
            "transcript_id",
        ),
        RelationDef::many_to_one("consequence", EntityKind::Consequence, "consequence_id"),
        RelationDef::inverse(
            "association",
            EntityKind::Association,
            "rel_association__alteration",
            "alteration_id",
            "association_id",
        ),
    ],
    search_fields: &["alteration", "name", "proteinChange"],
};

pub static ARTICLE: EntityDef = EntityDef {
    kind: EntityKind::Article,
    name: "article",
    path: "articles",
    table: "article",
    fields: &[
        FieldDef::enumeration("type", "type", Enumeration::ArticleType).required(),
        FieldDef::text("uid", "uid"),
        FieldDef::text("title", "title"),
        FieldDef::text("content", "content"),
        FieldDef::text("link", "link"),
        FieldDef::text("authors", "authors"),
        FieldDef::instant("date", "date"),
        FieldDef::text("additionalInfo", "additional_info"),
    ],
    relations: &[
        RelationDef::many_to_many(
            "flags",
            "flag",
            EntityKind::Flag,
            "rel_article__flag",
            "article_id",
            "flag_id",
        ),
        RelationDef::many_to_many(
            "synonyms",
            "synonym",
            EntityKind::Synonym,
            "rel_article__synonym",
            "article_id",
            "synonym_id",
        ),
        RelationDef::inverse(
            "association",
            EntityKind::Association,
            "rel_association__article",
            "article_id",
            "association_id",
        ),
    ],
    search_fields: &["uid", "title", "authors"],
};

pub static CANCER_TYPE: EntityDef = EntityDef {
    kind: EntityKind::CancerType,
    name: "cancerType",
    path: "cancer-types",
    table: "cancer_type",
    fields: &[
        FieldDef::text("code", "code"),
        FieldDef::text("color", "color"),
        FieldDef::integer("level", "level").required(),
        FieldDef::text("mainType", "main_type").required(),
        FieldDef::text("subtype", "subtype"),
        FieldDef::text("tissue", "tissue"),
        FieldDef::enumeration("tumorForm", "tumor_form", Enumeration::TumorForm).required(),
    ],
    relations: &[
        RelationDef::many_to_one("parent", EntityKind::CancerType, "parent_id"),
        RelationDef::one_to_many("children", EntityKind::CancerType, "parent_id"),
        RelationDef::many_to_many(
            "synonyms",
            "synonym",
            EntityKind::Synonym,
            "rel_cancer_type__synonym",
            "cancer_type_id",
            "synonym_id",
        ),
        RelationDef::inverse(
            "association",
            EntityKind::Association,
            "rel_association__cancer_type",
            "cancer_type_id",
            "association_id",
        ),
    ],
    search_fields: &["mainType", "subtype", "code"],
};

pub static CLINICAL_TRIAL: EntityDef = EntityDef {
    kind: EntityKind::ClinicalTrial,
    name: "clinicalTrial",
    path: "clinical-trials",
    table: "clinical_trial",
    fields: &[
        FieldDef::text("nctId", "nct_id"),
        FieldDef::text("briefTitle", "brief_title").required(),
        FieldDef::text("phase", "phase"),
        FieldDef::text("status", "status"),
    ],
    relations: &[
        RelationDef::one_to_many(
            "eligibilityCriteria",
            EntityKind::EligibilityCriteria,
            "clinical_trial_id",
        ),
        RelationDef::many_to_many(
            "associations",
            "association",
            EntityKind::Association,
            "rel_clinical_trial__association",
            "clinical_trial_id",
            "association_id",
        ),
    ],
    search_fields: &["nctId", "briefTitle"],
};

pub static ELIGIBILITY_CRITERIA: EntityDef = EntityDef {
    kind: EntityKind::EligibilityCriteria,
    name: "eligibilityCriteria",
    path: "eligibility-criteria",
    table: "eligibility_criteria",
    fields: &[
        FieldDef::enumeration("type", "type", Enumeration::EligibilityCriteriaType).required(),
        FieldDef::integer("priority", "priority"),
        FieldDef::text("criteria", "criteria"),
    ],
    relations: &[
        RelationDef::many_to_one("clinicalTrial", EntityKind::ClinicalTrial, "clinical_trial_id"),
        RelationDef::many_to_many(
            "associations",
            "association",
            EntityKind::Association,
            "rel_eligibility_criteria__association",
            "eligibility_criteria_id",
            "association_id",
        ),
    ],
    search_fields: &["criteria"],
};

pub static COMPANION_DIAGNOSTIC_DEVICE: EntityDef = EntityDef {
    kind: EntityKind::CompanionDiagnosticDevice,
    name: "companionDiagnosticDevice",
    path: "companion-diagnostic-devices",
    table: "companion_diagnostic_device",
    fields: &[
        FieldDef::text("name", "name").required(),
        FieldDef::text("manufacturer", "manufacturer").required(),
    ],
    relations: &[RelationDef::one_to_many(
        "fdaSubmission",
        EntityKind::FdaSubmission,
        "companion_diagnostic_device_id",
    )],
    search_fields: &["name", "manufacturer"],
};

pub static FDA_SUBMISSION_TYPE: EntityDef = EntityDef {
    kind: EntityKind::FdaSubmissionType,
    name: "fdaSubmissionType",
    path: "fda-submission-types",
    table: "fda_submission_type",
    fields: &[
        FieldDef::enumeration("type", "type", Enumeration::FdaSubmissionTypeKey).required(),
        FieldDef::text("name", "name").required(),
        FieldDef::text("shortName", "short_name"),
        FieldDef::text("description", "description"),
    ],
    relations: &[RelationDef::one_to_many(
        "fdaSubmission",
        EntityKind::FdaSubmission,
        "type_id",
    )],
    search_fields: &["name", "shortName"],
};

pub static FDA_SUBMISSION: EntityDef = EntityDef {
    kind: EntityKind::FdaSubmission,
    name: "fdaSubmission",
    path: "fda-submissions",
    table: "fda_submission",
    fields: &[
        FieldDef::text("number", "number").required(),
        FieldDef::text("supplementNumber", "supplement_number"),
        FieldDef::text("deviceName", "device_name").required(),
        FieldDef::text("genericName", "generic_name"),
        FieldDef::instant("dateReceived", "date_received"),
        FieldDef::instant("decisionDate", "decision_date"),
        FieldDef::text("description", "description"),
        FieldDef::text("platform", "platform"),
        FieldDef::boolean("curated", "curated").required(),
        FieldDef::boolean("genetic", "genetic").required(),
        FieldDef::text("note", "note"),
    ],
    relations: &[
        RelationDef::many_to_one(
            "companionDiagnosticDevice",
            EntityKind::CompanionDiagnosticDevice,
            "companion_diagnostic_device_id",
        ),
        RelationDef::many_to_one("type", EntityKind::FdaSubmissionType, "type_id"),
    ],
    search_fields: &["number", "deviceName", "genericName"],
};

pub static DRUG: EntityDef = EntityDef {
    kind: EntityKind::Drug,
    name: "drug",
    path: "drugs",
    table: "drug",
    fields: &[
        FieldDef::text("uuid", "uuid").required().unique().generated(),
        FieldDef::text("name", "name").required(),
    ],
    relations: &[
        RelationDef::many_to_one("nciThesaurus", EntityKind::NciThesaurus, "nci_thesaurus_id"),
        RelationDef::many_to_many(
            "flags",
            "flag",
            EntityKind::Flag,
            "rel_drug__flag",
            "drug_id",
            "flag_id",
        ),
        RelationDef::one_to_many("fdaDrug", EntityKind::FdaDrug, "drug_id"),
        RelationDef::inverse(
            "treatment",
            EntityKind::Treatment,
            "rel_treatment__drug",
            "drug_id",
            "treatment_id",
        ),
    ],
    search_fields: &["name"],
};

pub static FDA_DRUG: EntityDef = EntityDef {
    kind: EntityKind::FdaDrug,
    name: "fdaDrug",
    path: "fda-drugs",
    table: "fda_drug",
    fields: &[
        FieldDef::text("applicationNumber", "application_number")
            .required()
            .unique(),
        FieldDef::text("sponsorName", "sponsor_name"),
        FieldDef::text("overallMarketingStatus", "overall_marketing_status"),
    ],
    relations: &[RelationDef::many_to_one(
        "drug",
        EntityKind::Drug,
        "drug_id",
    )],
    search_fields: &["applicationNumber", "sponsorName"],
};

pub static TREATMENT: EntityDef = EntityDef {
    kind: EntityKind::Treatment,
    name: "treatment",
    path: "treatments",
    table: "treatment",
    fields: &[FieldDef::text("name", "name")],
    relations: &[
        RelationDef::many_to_many(
            "drugs",
            "drug",
            EntityKind::Drug,
            "rel_treatment__drug",
            "treatment_id",
            "drug_id",
        ),
        RelationDef::inverse(
            "association",
            EntityKind::Association,
            "rel_association__treatment",
            "treatment_id",
            "association_id",
        ),
    ],
    search_fields: &["name"],
};

pub static ASSOCIATION: EntityDef = EntityDef {
    kind: EntityKind::Association,
    name: "association",
    path: "associations",
    table: "association",
    fields: &[FieldDef::text("name", "name")],
    relations: &[
        RelationDef::many_to_many(
            "alterations",
            "alteration",
            EntityKind::Alteration,
            "rel_association__alteration",
            "association_id",
            "alteration_id",
        ),
        RelationDef::many_to_many(
            "articles",
            "article",
            EntityKind::Article,
            "rel_association__article",
            "association_id",
            "article_id",
        ),
        RelationDef::many_to_many(
            "cancerTypes",
            "cancerType",
            EntityKind::CancerType,
            "rel_association__cancer_type",
            "association_id",
            "cancer_type_id",
        ),
        RelationDef::many_to_many(
            "treatments",
            "treatment",
            EntityKind::Treatment,
            "rel_association__treatment",
            "association_id",
            "treatment_id",
        ),
        RelationDef::one_to_many("evidence", EntityKind::Evidence, "association_id"),
        RelationDef::inverse(
            "clinicalTrial",
            EntityKind::ClinicalTrial,
            "rel_clinical_trial__association",
            "association_id",
            "clinical_trial_id",
        ),
        RelationDef::inverse(
            "eligibilityCriteria",
            EntityKind::EligibilityCriteria,
            "rel_eligibility_criteria__association",
            "association_id",
            "eligibility_criteria_id",
        ),
        RelationDef::inverse(
            "genomicIndicator",
            EntityKind::GenomicIndicator,
            "rel_genomic_indicator__association",
            "association_id",
            "genomic_indicator_id",
        ),
    ],
    search_fields: &["name"],
};

pub static EVIDENCE: EntityDef = EntityDef {
    kind: EntityKind::Evidence,
    name: "evidence",
    path: "evidences",
    table: "evidence",
    fields: &[
        FieldDef::text("uuid", "uuid").generated(),
        FieldDef::text("evidenceType", "evidence_type").required(),
        FieldDef::text("knownEffect", "known_effect"),
        FieldDef::text("description", "description"),
        FieldDef::text("note", "note"),
    ],
    relations: &[
        RelationDef::many_to_one("association", EntityKind::Association, "association_id"),
        RelationDef::many_to_one("gene", EntityKind::Gene, "gene_id"),
    ],
    search_fields: &["evidenceType", "knownEffect"],
};

pub static GENOMIC_INDICATOR: EntityDef = EntityDef {
    kind: EntityKind::GenomicIndicator,
    name: "genomicIndicator",
    path: "genomic-indicators",
    table: "genomic_indicator",
    fields: &[
        FieldDef::text("uuid", "uuid").required().unique().generated(),
        FieldDef::text("type", "type").required(),
        FieldDef::text("name", "name").required(),
        FieldDef::text("description", "description"),
    ],
    relations: &[RelationDef::many_to_many(
        "associations",
        "association",
        EntityKind::Association,
        "rel_genomic_indicator__association",
        "genomic_indicator_id",
        "association_id",
    )],
    search_fields: &["name", "type"],
};

pub static HISTORY: EntityDef = EntityDef {
    kind: EntityKind::History,
    name: "history",
    path: "histories",
    table: "history",
    fields: &[
        FieldDef::text("type", "type").required(),
        FieldDef::instant("updatedTime", "updated_time").required(),
        FieldDef::text("updatedBy", "updated_by"),
        FieldDef::text("entityName", "entity_name").required(),
        FieldDef::integer("entityId", "entity_id"),
    ],
    relations: &[],
    search_fields: &["entityName", "updatedBy"],
};

#[cfg(test)]
mod tests {
    use crate::entity::EntityKind;
    use crate::relation::RelationKind;
    use std::collections::HashSet;

    #[test]
    fn paths_and_tables_are_unique() {
        let mut paths = HashSet::new();
        let mut tables = HashSet::new();
        for kind in EntityKind::ALL {
            let def = kind.def();
            assert_eq!(def.kind, kind, "{} points at the wrong kind", def.name);
            assert!(paths.insert(def.path), "duplicate path {}", def.path);
            assert!(tables.insert(def.table), "duplicate table {}", def.table);
            assert_eq!(EntityKind::from_path(def.path), Some(kind));
        }
    }

    #[test]
    fn field_names_and_filter_keys_do_not_collide() {
        for kind in EntityKind::ALL {
            let def = kind.def();
            let mut names = HashSet::new();
            names.insert("id".to_string());
            for field in def.fields {
                assert!(
                    names.insert(field.name.to_string()),
                    "{}.{} declared twice",
                    def.name,
                    field.name
                );
            }
            for relation in def.relations {
                assert!(
                    names.insert(relation.filter_key()),
                    "{}.{} collides with another filter",
                    def.name,
                    relation.filter_key()
                );
            }
            let owned: Vec<_> = def.owned_relations().map(|r| r.name).collect();
            for name in owned {
                assert!(
                    def.field(name).is_none(),
                    "{}.{} is both a field and a relation",
                    def.name,
                    name
                );
            }
        }
    }

    #[test]
    fn many_to_many_sides_share_a_join_table() {
        for kind in EntityKind::ALL {
            let def = kind.def();
            for relation in def.relations {
                let (RelationKind::ManyToMany(join) | RelationKind::InverseManyToMany(join)) =
                    relation.kind
                else {
                    continue;
                };
                let other = relation.target.def();
                let mirrored = other.relations.iter().any(|r| match r.kind {
                    RelationKind::ManyToMany(j) | RelationKind::InverseManyToMany(j) => {
                        j.table == join.table
                            && j.self_column == join.target_column
                            && j.target_column == join.self_column
                            && r.target == kind
                            && r.is_owned() != relation.is_owned()
                    }
                    _ => false,
                });
                assert!(
                    mirrored,
                    "{} has no mirror on {} for {}",
                    def.name, other.name, join.table
                );
            }
        }
    }

    #[test]
    fn one_to_many_matches_a_foreign_key() {
        for kind in EntityKind::ALL {
            let def = kind.def();
            for relation in def.relations {
                let RelationKind::OneToMany { column } = relation.kind else {
                    continue;
                };
                let other = relation.target.def();
                let found = other.relations.iter().any(|r| {
                    r.target == kind && r.kind == RelationKind::ManyToOne { column }
                });
                assert!(found, "{}.{} has no foreign key", def.name, relation.filter);
            }
        }
    }

    #[test]
    fn search_fields_are_text() {
        for kind in EntityKind::ALL {
            let def = kind.def();
            assert_eq!(
                def.search_columns().count(),
                def.search_fields.len(),
                "{} names an unknown search field",
                def.name
            );
            assert!(
                def.search_columns()
                    .all(|f| f.kind == crate::field::FieldKind::Text),
                "{} searches a non-text field",
                def.name
            );
        }
    }
}
