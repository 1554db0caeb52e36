//! Diabetes feature vector (20 fields).
//!
//! The diabetes model was trained on a clinical dataset with thirteen symptom
//! questions. The intake form asks far fewer, so most symptoms are answered by
//! a proxy signal. The mapping lives in [`DIABETES_SYMPTOM_PROXIES`].

use super::{indicator, FeatureVector, OBESITY_BMI};
use crate::domain::PatientRecord;

/// Intake answer that stands in for a symptom field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxySource {
    /// polyuria == "yes"
    Polyuria,
    /// polydipsia == "yes"
    Polydipsia,
    /// fatigue == "yes"
    Fatigue,
    /// smoking is "yes" or "former"
    Smoking,
    /// stress > 7
    Stress,
}

impl ProxySource {
    /// 1.0 when the proxy condition holds for `record`.
    #[must_use]
    pub fn flag(self, record: &PatientRecord) -> f64 {
        indicator(match self {
            Self::Polyuria => record.has_polyuria(),
            Self::Polydipsia => record.has_polydipsia(),
            Self::Fatigue => record.reports_fatigue(),
            Self::Smoking => record.smokes(),
            Self::Stress => record.is_irritable(),
        })
    }
}

/// Symptom field -> intake answer that populates it, in model order.
///
/// Five distinct symptoms collapse onto `fatigue` and five onto `smoking`.
/// This is deliberately degraded input, not a bug.
pub const DIABETES_SYMPTOM_PROXIES: [(&str, ProxySource); 13] = [
    ("Polyuria", ProxySource::Polyuria),
    ("Polydipsia", ProxySource::Polydipsia),
    ("sudden weight loss", ProxySource::Fatigue),
    ("weakness", ProxySource::Fatigue),
    ("Polyphagia", ProxySource::Fatigue),
    ("Genital thrush", ProxySource::Smoking),
    ("visual blurring", ProxySource::Fatigue),
    ("Itching", ProxySource::Smoking),
    ("Irritability", ProxySource::Stress),
    ("delayed healing", ProxySource::Smoking),
    ("partial paresis", ProxySource::Fatigue),
    ("muscle stiffness", ProxySource::Smoking),
    ("Alopecia", ProxySource::Smoking),
];

/// Diabetes model input.
#[derive(Debug, Clone, PartialEq)]
pub struct DiabetesFeatures {
    pub age: f64,
    pub gender: f64,
    pub polyuria: f64,
    pub polydipsia: f64,
    pub sudden_weight_loss: f64,
    pub weakness: f64,
    pub polyphagia: f64,
    pub genital_thrush: f64,
    pub visual_blurring: f64,
    pub itching: f64,
    pub irritability: f64,
    pub delayed_healing: f64,
    pub partial_paresis: f64,
    pub muscle_stiffness: f64,
    pub alopecia: f64,
    pub obesity: f64,
    /// Number of symptom fields set (excludes Age and Obesity)
    pub symptom_count: f64,
    pub polyuria_polydipsia_interaction: f64,
    pub age_obesity_interaction: f64,
    pub age_gender_interaction: f64,
}

impl DiabetesFeatures {
    /// Build the vector from an intake record and its precomputed BMI.
    #[must_use]
    pub fn encode(record: &PatientRecord, bmi: f64) -> Self {
        let flag = |source: ProxySource| source.flag(record);

        let age = f64::from(record.age);
        let gender = indicator(record.is_male());
        let obesity = indicator(bmi > OBESITY_BMI);
        let polyuria = flag(ProxySource::Polyuria);
        let polydipsia = flag(ProxySource::Polydipsia);
        let symptom_count = DIABETES_SYMPTOM_PROXIES
            .iter()
            .map(|(_, source)| flag(*source))
            .sum::<f64>();

        Self {
            age,
            gender,
            polyuria,
            polydipsia,
            sudden_weight_loss: flag(ProxySource::Fatigue),
            weakness: flag(ProxySource::Fatigue),
            polyphagia: flag(ProxySource::Fatigue),
            genital_thrush: flag(ProxySource::Smoking),
            visual_blurring: flag(ProxySource::Fatigue),
            itching: flag(ProxySource::Smoking),
            irritability: flag(ProxySource::Stress),
            delayed_healing: flag(ProxySource::Smoking),
            partial_paresis: flag(ProxySource::Fatigue),
            muscle_stiffness: flag(ProxySource::Smoking),
            alopecia: flag(ProxySource::Smoking),
            obesity,
            symptom_count,
            polyuria_polydipsia_interaction: polyuria * polydipsia,
            age_obesity_interaction: age * obesity,
            age_gender_interaction: age * gender,
        }
    }
}

impl FeatureVector for DiabetesFeatures {
    const NAMES: &'static [&'static str] = &[
        "Age",
        "Gender",
        "Polyuria",
        "Polydipsia",
        "sudden weight loss",
        "weakness",
        "Polyphagia",
        "Genital thrush",
        "visual blurring",
        "Itching",
        "Irritability",
        "delayed healing",
        "partial paresis",
        "muscle stiffness",
        "Alopecia",
        "Obesity",
        "symptom_count",
        "polyuria_polydipsia_interaction",
        "age_obesity_interaction",
        "age_gender_interaction",
    ];

    const NUMERIC: &'static [&'static str] = &[
        "Age",
        "symptom_count",
        "age_obesity_interaction",
        "age_gender_interaction",
    ];

    fn to_vec(&self) -> Vec<f64> {
        vec![
            self.age,
            self.gender,
            self.polyuria,
            self.polydipsia,
            self.sudden_weight_loss,
            self.weakness,
            self.polyphagia,
            self.genital_thrush,
            self.visual_blurring,
            self.itching,
            self.irritability,
            self.delayed_healing,
            self.partial_paresis,
            self.muscle_stiffness,
            self.alopecia,
            self.obesity,
            self.symptom_count,
            self.polyuria_polydipsia_interaction,
            self.age_obesity_interaction,
            self.age_gender_interaction,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{high_risk_record, low_risk_record};

    #[test]
    fn test_proxy_table_matches_vector() {
        let mut smoker = low_risk_record();
        smoker.smoking = "former".into();
        let mut stressed = low_risk_record();
        stressed.stress = 9;

        for record in [high_risk_record(), low_risk_record(), smoker, stressed] {
            let row = DiabetesFeatures::encode(&record, record.bmi()).to_row();
            for (name, source) in DIABETES_SYMPTOM_PROXIES {
                assert_eq!(
                    row.get(name),
                    Some(source.flag(&record)),
                    "{name} does not follow its proxy"
                );
            }
        }
    }

    #[test]
    fn test_symptom_count_from_fatigue_only() {
        let mut record = low_risk_record();
        record.fatigue = "yes".into();
        record.smoking = "no".into();
        record.stress = 5;

        let features = DiabetesFeatures::encode(&record, record.bmi());
        assert!((features.symptom_count - 5.0).abs() < f64::EPSILON);
        assert!((features.irritability).abs() < f64::EPSILON);
        assert!((features.itching).abs() < f64::EPSILON);
    }

    #[test]
    fn test_symptom_count_excludes_age_and_obesity() {
        let mut record = low_risk_record();
        record.weight = 120.0;
        let features = DiabetesFeatures::encode(&record, record.bmi());
        assert!((features.obesity - 1.0).abs() < f64::EPSILON);
        assert!(features.symptom_count.abs() < f64::EPSILON);
    }

    #[test]
    fn test_obesity_boundary() {
        let record = low_risk_record();
        assert!(DiabetesFeatures::encode(&record, 30.0).obesity.abs() < f64::EPSILON);
        assert!((DiabetesFeatures::encode(&record, 30.01).obesity - 1.0).abs() < f64::EPSILON);

        // 30 kg at 100 cm is exactly BMI 30.
        let mut exact = low_risk_record();
        exact.height = 100.0;
        exact.weight = 30.0;
        assert!(DiabetesFeatures::encode(&exact, exact.bmi()).obesity.abs() < f64::EPSILON);
    }

    #[test]
    fn test_interactions() {
        let record = high_risk_record();
        let features = DiabetesFeatures::encode(&record, record.bmi());

        assert!((features.polyuria_polydipsia_interaction - 1.0).abs() < f64::EPSILON);
        assert!((features.age_obesity_interaction - 45.0).abs() < f64::EPSILON);
        assert!((features.age_gender_interaction - 45.0).abs() < f64::EPSILON);

        let female = low_risk_record();
        let features = DiabetesFeatures::encode(&female, female.bmi());
        assert!(features.age_gender_interaction.abs() < f64::EPSILON);
        assert!(features.age_obesity_interaction.abs() < f64::EPSILON);
    }

    #[test]
    fn test_high_risk_vector() {
        let record = high_risk_record();
        let features = DiabetesFeatures::encode(&record, record.bmi());

        // polyuria, polydipsia, five fatigue proxies, irritability
        assert!((features.symptom_count - 8.0).abs() < f64::EPSILON);
        assert!((features.obesity - 1.0).abs() < f64::EPSILON);
        assert!((features.gender - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_every_field_sits_at_its_name() {
        let f = DiabetesFeatures {
            age: 1.0,
            gender: 2.0,
            polyuria: 3.0,
            polydipsia: 4.0,
            sudden_weight_loss: 5.0,
            weakness: 6.0,
            polyphagia: 7.0,
            genital_thrush: 8.0,
            visual_blurring: 9.0,
            itching: 10.0,
            irritability: 11.0,
            delayed_healing: 12.0,
            partial_paresis: 13.0,
            muscle_stiffness: 14.0,
            alopecia: 15.0,
            obesity: 16.0,
            symptom_count: 17.0,
            polyuria_polydipsia_interaction: 18.0,
            age_obesity_interaction: 19.0,
            age_gender_interaction: 20.0,
        };

        let expected: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(f.to_vec(), expected);

        let row = f.to_row();
        for (name, value) in [
            ("Age", f.age),
            ("Gender", f.gender),
            ("Polyuria", f.polyuria),
            ("Polydipsia", f.polydipsia),
            ("sudden weight loss", f.sudden_weight_loss),
            ("weakness", f.weakness),
            ("Polyphagia", f.polyphagia),
            ("Genital thrush", f.genital_thrush),
            ("visual blurring", f.visual_blurring),
            ("Itching", f.itching),
            ("Irritability", f.irritability),
            ("delayed healing", f.delayed_healing),
            ("partial paresis", f.partial_paresis),
            ("muscle stiffness", f.muscle_stiffness),
            ("Alopecia", f.alopecia),
            ("Obesity", f.obesity),
            ("symptom_count", f.symptom_count),
            ("polyuria_polydipsia_interaction", f.polyuria_polydipsia_interaction),
            ("age_obesity_interaction", f.age_obesity_interaction),
            ("age_gender_interaction", f.age_gender_interaction),
        ] {
            assert_eq!(row.get(name), Some(value), "{name}");
        }
    }

    #[test]
    fn test_high_risk_vector_layout() {
        let record = high_risk_record();

        #[rustfmt::skip]
        let expected = vec![
            45.0, 1.0, 1.0, 1.0, 1.0,
            1.0, 1.0, 0.0, 1.0, 0.0,
            1.0, 0.0, 1.0, 0.0, 0.0,
            1.0, 8.0, 1.0, 45.0, 45.0,
        ];
        assert_eq!(DiabetesFeatures::encode(&record, record.bmi()).to_vec(), expected);
    }
}
