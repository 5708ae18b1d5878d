//! Rule-based academic query classifier.
//!
//! Maps a free-text query to an academic category and a student scenario by
//! keyword occurrence, in a fixed table order so the first listed match wins.
//! Keywords match whole words or phrases only. Confidence is constant for a
//! keyword hit; there is no learned scoring.

use serde::{Deserialize, Serialize};

use crate::text::contains_any_term;

/// Confidence reported for any keyword-table hit.
pub const RULE_MATCH_CONFIDENCE: f64 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicCategory {
    Medicine,
    Nursing,
    Dentistry,
    SoftwareEngineering,
    Mathematics,
    Law,
    Administration,
}

impl AcademicCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Medicine => "medicine",
            Self::Nursing => "nursing",
            Self::Dentistry => "dentistry",
            Self::SoftwareEngineering => "software_engineering",
            Self::Mathematics => "mathematics",
            Self::Law => "law",
            Self::Administration => "administration",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentScenario {
    FirstSemester,
    PracticeLab,
    Research,
    Professional,
    Postgraduate,
}

impl StudentScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstSemester => "first_semester",
            Self::PracticeLab => "practice_lab",
            Self::Research => "research",
            Self::Professional => "professional",
            Self::Postgraduate => "postgraduate",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Classification {
    pub category: Option<AcademicCategory>,
    pub confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Guidance {
    pub category: AcademicCategory,
    pub scenario: Option<StudentScenario>,
    pub related_subjects: Vec<String>,
    pub typical_products: Vec<String>,
    pub tips: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueryAnalysis {
    pub classification: Classification,
    pub scenario: Option<StudentScenario>,
    pub guidance: Option<Guidance>,
}

// Query classification. Table order decides overlaps, so nursing must stay
// ahead of medicine.
const CLASSIFICATION_RULES: &[(AcademicCategory, &[&str])] = &[
    (
        AcademicCategory::Nursing,
        &[
            "enfermería", "enfermeria", "cuidados de enfermería", "fundamentos de enfermería",
            "gerencia del cuidado", "cuidados al adulto", "nursing", "nurse", "nurses",
            "patient care",
        ],
    ),
    (
        AcademicCategory::Medicine,
        &[
            "medicina", "anatomía", "fisiología", "patología", "cardiología", "clínica",
            "hospital", "paciente", "diagnóstico", "medicine", "medical", "anatomy",
            "physiology", "pathology", "clinical", "patient", "diagnosis",
        ],
    ),
    (
        AcademicCategory::SoftwareEngineering,
        &[
            "programación", "python", "java", "javascript", "algoritmo", "software", "desarrollo",
            "código", "programar", "programming", "algorithm", "developer", "coding",
        ],
    ),
    (
        AcademicCategory::Mathematics,
        &[
            "cálculo", "álgebra", "geometría", "ecuaciones", "matemáticas", "calculus",
            "algebra",
            "geometry", "equations", "mathematics", "math",
        ],
    ),
    (
        AcademicCategory::Law,
        &[
            "derecho", "jurídico", "ley", "constitucional", "penal", "civil", "legal",
            "constitutional", "jurisprudence",
        ],
    ),
    (
        AcademicCategory::Administration,
        &[
            "administración", "contabilidad", "finanzas", "marketing", "empresa", "accounting",
            "finance", "business", "management",
        ],
    ),
    (
        AcademicCategory::Dentistry,
        &["odontología", "dental", "dentistry", "ortodoncia", "orthodontics", "endodoncia"],
    ),
];

// Product matching. Wider than the query rules so catalog names and
// descriptions written in English are reachable.
const CATALOG_KEYWORDS: &[(AcademicCategory, &[&str])] = &[
    (
        AcademicCategory::Medicine,
        &[
            "medicine", "medical", "physiology", "clinical", "diagnosis", "pathology", "harrison",
            "guyton", "stethoscope", "otoscope", "medicina", "semiología",
        ],
    ),
    (
        AcademicCategory::Nursing,
        &[
            "nursing", "stethoscope", "sphygmomanometer", "blood pressure", "enfermería",
            "farmacología",
        ],
    ),
    (
        AcademicCategory::Dentistry,
        &["dentistry", "dental", "oral", "sterilizer", "micromotor", "odontología"],
    ),
    (
        AcademicCategory::SoftwareEngineering,
        &[
            "software", "programming", "algorithms", "data structures", "design patterns",
            "clean code", "laptop", "raspberry", "iot", "programación",
        ],
    ),
    (
        AcademicCategory::Mathematics,
        &["algebra", "calculus", "statistics", "geometry", "calculator", "cálculo", "álgebra"],
    ),
    (
        AcademicCategory::Law,
        &[
            "law", "legal", "civil", "penal", "constitutional", "kelsen", "jurisprudence",
            "derecho",
        ],
    ),
    (
        AcademicCategory::Administration,
        &["accounting", "finance", "marketing", "economics", "business", "contabilidad"],
    ),
];

// "práctica profesional" resolves to practice/lab because that row is
// checked first.
const SCENARIO_RULES: &[(StudentScenario, &[&str])] = &[
    (
        StudentScenario::FirstSemester,
        &[
            "primer semestre", "inicio de carrera", "principiante", "básico", "first semester",
            "freshman", "beginner",
        ],
    ),
    (
        StudentScenario::PracticeLab,
        &[
            "práctica", "laboratorio", "experimentos", "práctica clínica", "practice", "lab",
            "labs", "experiment", "experiments",
        ],
    ),
    (
        StudentScenario::Research,
        &[
            "tesis", "investigación", "proyecto de grado", "monografía", "thesis", "research",
            "dissertation",
        ],
    ),
    (
        StudentScenario::Professional,
        &["empleo", "pasantía", "empleabilidad", "internship", "employment", "job"],
    ),
    (
        StudentScenario::Postgraduate,
        &[
            "especialización", "maestría", "posgrado", "doctorado", "specialization", "master",
            "masters", "postgraduate", "phd",
        ],
    ),
];

#[derive(Clone, Debug, Default)]
pub struct AcademicClassifier;

impl AcademicClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, query: &str) -> Classification {
        let lowered = query.to_lowercase();
        CLASSIFICATION_RULES
            .iter()
            .find(|(_, keywords)| contains_any_term(&lowered, keywords))
            .map(|(category, _)| Classification {
                category: Some(*category),
                confidence: RULE_MATCH_CONFIDENCE,
            })
            .unwrap_or(Classification { category: None, confidence: 0.0 })
    }

    pub fn detect_scenario(&self, query: &str) -> Option<StudentScenario> {
        let lowered = query.to_lowercase();
        SCENARIO_RULES
            .iter()
            .find(|(_, keywords)| contains_any_term(&lowered, keywords))
            .map(|(scenario, _)| *scenario)
    }

    /// Keywords used to decide whether a product belongs to `category`.
    pub fn catalog_keywords(&self, category: AcademicCategory) -> &'static [&'static str] {
        CATALOG_KEYWORDS
            .iter()
            .find(|(candidate, _)| *candidate == category)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }

    pub fn guidance(
        &self,
        category: AcademicCategory,
        scenario: Option<StudentScenario>,
    ) -> Guidance {
        let (related_subjects, typical_products): (&[&str], &[&str]) = match category {
            AcademicCategory::SoftwareEngineering => (
                &["Algorithms", "Data Structures", "Databases"],
                &["Programming books", "Software licenses", "Development hardware"],
            ),
            AcademicCategory::Nursing => (
                &["Basic Care", "Pharmacology", "Semiology"],
                &["Stethoscopes", "Sphygmomanometers", "Venipuncture kits"],
            ),
            AcademicCategory::Medicine => (
                &["Semiology", "Physiology", "Pharmacology"],
                &["Stethoscopes", "Otoscopes", "Diagnostic kits"],
            ),
            AcademicCategory::Dentistry => (
                &["Oral Pathology", "Surgery", "Periodontics"],
                &["Dental equipment", "Surgical instruments", "Anatomical models"],
            ),
            AcademicCategory::Law => (
                &["Constitutional Law", "Criminal Law", "Civil Law"],
                &["Civil codes", "Court gazettes", "Legal software"],
            ),
            AcademicCategory::Mathematics => (
                &["Calculus", "Linear Algebra", "Statistics"],
                &["Graphing calculators", "Math textbooks"],
            ),
            AcademicCategory::Administration => (
                &["Accounting", "Finance", "Marketing"],
                &["Accounting software", "Business textbooks"],
            ),
        };

        Guidance {
            category,
            scenario,
            related_subjects: to_owned_list(related_subjects),
            typical_products: to_owned_list(typical_products),
            tips: to_owned_list(scenario_tips(category, scenario)),
        }
    }

    /// Classification, scenario and guidance for one query in a single pass.
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        let classification = self.classify(query);
        let scenario = self.detect_scenario(query);
        let guidance = classification.category.map(|category| self.guidance(category, scenario));
        QueryAnalysis { classification, scenario, guidance }
    }
}

fn scenario_tips(
    category: AcademicCategory,
    scenario: Option<StudentScenario>,
) -> &'static [&'static str] {
    use AcademicCategory as C;
    use StudentScenario as S;

    match (category, scenario) {
        (C::SoftwareEngineering, Some(S::FirstSemester)) => &[
            "Start with programming fundamentals",
            "Being a beginner is fine; everyone starts there",
            "Look for books like 'Clean Code' for good practices",
        ],
        (C::SoftwareEngineering, Some(S::PracticeLab)) => &[
            "You will need a capable laptop for development",
            "Consider boards like the Raspberry Pi for IoT work",
            "Look for IDE and development software licenses",
        ],
        (C::Nursing, Some(S::PracticeLab)) => &[
            "Look for practice mannequins for simulation",
            "Vital-sign monitoring equipment is essential",
            "Consider pharmacology books written for nursing",
        ],
        (C::Medicine, Some(S::Research)) => &[
            "Look for medical research methodology books",
            "Consider equipment for diagnostic aids",
            "Medical English material can be useful",
        ],
        (C::Dentistry, Some(S::PracticeLab)) => &[
            "Look for turbines and micromotors for practice",
            "Sterilizers are indispensable",
            "Consider dental planning software",
        ],
        (C::Law, Some(S::Professional)) => &[
            "Look for legal clinic opportunities",
            "Consider audio equipment for recording hearings",
            "Legal databases are very useful",
        ],
        _ => &[],
    }
}

fn to_owned_list(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

#[cfg(test)]
mod tests {
    use super::{AcademicCategory, AcademicClassifier, StudentScenario, RULE_MATCH_CONFIDENCE};

    #[test]
    fn classifies_spanish_and_english_queries() {
        let classifier = AcademicClassifier::new();

        let medicine = classifier.classify("Necesito libros de Fisiología");
        assert_eq!(medicine.category, Some(AcademicCategory::Medicine));
        assert_eq!(medicine.confidence, RULE_MATCH_CONFIDENCE);

        let software = classifier.classify("best book for Python programming");
        assert_eq!(software.category, Some(AcademicCategory::SoftwareEngineering));

        let law = classifier.classify("código civil comentado");
        assert_eq!(
            law.category,
            Some(AcademicCategory::SoftwareEngineering),
            "`código` is a software keyword and that row is checked before law"
        );
    }

    #[test]
    fn unclassified_query_has_zero_confidence() {
        let classification = AcademicClassifier::new().classify("something unrelated");
        assert_eq!(classification.category, None);
        assert_eq!(classification.confidence, 0.0);
    }

    #[test]
    fn table_order_breaks_overlaps() {
        let classifier = AcademicClassifier::new();
        // Both medicine ("clinical") and law ("legal") keywords present.
        let result = classifier.classify("clinical legal ethics");
        assert_eq!(result.category, Some(AcademicCategory::Medicine));
    }

    #[test]
    fn detects_student_scenarios() {
        let classifier = AcademicClassifier::new();
        assert_eq!(
            classifier.detect_scenario("soy principiante en primer semestre"),
            Some(StudentScenario::FirstSemester)
        );
        assert_eq!(
            classifier.detect_scenario("busco práctica profesional"),
            Some(StudentScenario::PracticeLab)
        );
        assert_eq!(
            classifier.detect_scenario("working on my thesis"),
            Some(StudentScenario::Research)
        );
        assert_eq!(classifier.detect_scenario("hello"), None);
    }

    #[test]
    fn guidance_includes_scenario_tips_when_known() {
        let classifier = AcademicClassifier::new();
        let guidance = classifier
            .guidance(AcademicCategory::SoftwareEngineering, Some(StudentScenario::PracticeLab));
        assert_eq!(guidance.related_subjects.len(), 3);
        assert!(guidance.tips.iter().any(|tip| tip.contains("Raspberry Pi")));

        let no_tips = classifier.guidance(AcademicCategory::Mathematics, None);
        assert!(no_tips.tips.is_empty());
        assert!(!no_tips.typical_products.is_empty());
    }

    #[test]
    fn analyze_combines_all_signals() {
        let analysis = AcademicClassifier::new().analyze("medicine research project");
        assert_eq!(analysis.classification.category, Some(AcademicCategory::Medicine));
        assert_eq!(analysis.scenario, Some(StudentScenario::Research));
        let guidance = analysis.guidance.expect("guidance for classified query");
        assert_eq!(guidance.tips.len(), 3);
    }

    #[test]
    fn nursing_queries_get_their_own_category_and_tips() {
        let classifier = AcademicClassifier::new();

        let analysis = classifier.analyze("material para práctica de enfermería");
        assert_eq!(analysis.classification.category, Some(AcademicCategory::Nursing));
        assert_eq!(analysis.scenario, Some(StudentScenario::PracticeLab));
        let guidance = analysis.guidance.expect("guidance for nursing");
        assert!(guidance.tips.iter().any(|tip| tip.contains("mannequins")));

        assert_eq!(
            classifier.classify("nursing pharmacology notes").category,
            Some(AcademicCategory::Nursing)
        );
        assert_eq!(
            classifier.classify("clinical diagnosis handbook").category,
            Some(AcademicCategory::Medicine)
        );
    }

    #[test]
    fn keywords_embedded_in_longer_words_do_not_match() {
        let classifier = AcademicClassifier::new();

        assert_eq!(classifier.detect_scenario("is the laptop available?"), None);
        assert_eq!(classifier.detect_scenario("mastering excel"), None);
        assert_eq!(classifier.detect_scenario("a jobless summer"), None);
        assert_eq!(classifier.classify("an impatient customer").category, None);
        assert_eq!(classifier.classify("the aftermath").category, None);
        assert_eq!(classifier.classify("flawless delivery").category, None);
    }

    #[test]
    fn whole_words_and_phrases_still_match() {
        let classifier = AcademicClassifier::new();

        assert_eq!(classifier.detect_scenario("chem lab kit"), Some(StudentScenario::PracticeLab));
        assert_eq!(
            classifier.detect_scenario("applying for a master's degree"),
            Some(StudentScenario::Postgraduate)
        );
        assert_eq!(
            classifier.classify("math, for first semester").category,
            Some(AcademicCategory::Mathematics)
        );
        assert_eq!(
            classifier.detect_scenario("curso de inicio de carrera"),
            Some(StudentScenario::FirstSemester)
        );
    }

    #[test]
    fn every_category_has_catalog_keywords() {
        let classifier = AcademicClassifier::new();
        let categories = [
            AcademicCategory::Medicine,
            AcademicCategory::Nursing,
            AcademicCategory::Dentistry,
            AcademicCategory::SoftwareEngineering,
            AcademicCategory::Mathematics,
            AcademicCategory::Law,
            AcademicCategory::Administration,
        ];
        for category in categories {
            assert!(!classifier.catalog_keywords(category).is_empty(), "{}", category.as_str());
        }
    }
}
