//! Field configuration registry.
//!
//! Static description of every questionnaire: plain fields, Yes/No questions
//! that demand an explanation when answered "Yes", and repeatable sections.
//! Validation, default values and comment breadcrumbs are all derived from
//! these tables.

use crate::domain::field_path::FieldPath;
use crate::domain::models::FormType;
use serde::Serialize;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "options", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    TextArea,
    Email,
    Phone,
    /// `DD/MM/YYYY`
    Date,
    /// A [`FieldKind::Date`] that must also satisfy the minimum applicant age.
    DateOfBirth,
    PassportNumber,
    Country,
    Number,
    Select(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: true,
            min_len: None,
            max_len: Some(200),
        }
    }

    const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    const fn min(self, len: usize) -> Self {
        Self {
            min_len: Some(len),
            ..self
        }
    }

    const fn max(self, len: usize) -> Self {
        Self {
            max_len: Some(len),
            ..self
        }
    }
}

const fn text(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::Text)
}

const fn long_text(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::TextArea).max(2000)
}

const fn date(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::Date)
}

const fn country(name: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::Country).max(100)
}

const fn select(name: &'static str, label: &'static str, options: &'static [&'static str]) -> FieldSpec {
    FieldSpec::new(name, label, FieldKind::Select(options))
}

/// Question answered with `{ value: "Yes" | "No", explanation }`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YesNoSpec {
    pub name: &'static str,
    pub label: &'static str,
}

const fn yes_no(name: &'static str, label: &'static str) -> YesNoSpec {
    YesNoSpec { name, label }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub fields: &'static [FieldSpec],
    /// Applies only while the section is marked applicable.
    pub min_entries: usize,
    pub max_entries: usize,
    pub allow_not_applicable: bool,
}

impl SectionSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSpec {
    pub form_type: FormType,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
    pub yes_no: &'static [YesNoSpec],
    pub sections: &'static [SectionSpec],
}

impl FormSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn yes_no(&self, name: &str) -> Option<&YesNoSpec> {
        self.yes_no.iter().find(|y| y.name == name)
    }

    pub fn section(&self, name: &str) -> Option<&SectionSpec> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Every top-level key of the form payload, in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .map(|f| f.name)
            .chain(self.yes_no.iter().map(|y| y.name))
            .chain(self.sections.iter().map(|s| s.name))
    }
}

const SEX: &[&str] = &["Male", "Female"];
const MARITAL_STATUS: &[&str] = &[
    "Single",
    "Married",
    "Civil Partnership",
    "Separated",
    "Divorced",
    "Widowed",
];
const PASSPORT_TYPES: &[&str] = &["Regular", "Official", "Diplomatic", "Other"];
const EDUCATION_LEVELS: &[&str] = &[
    "Primary",
    "Secondary",
    "Vocational",
    "Bachelor",
    "Master",
    "Doctorate",
];
const OCCUPATIONS: &[&str] = &[
    "Employed",
    "Self-Employed",
    "Student",
    "Retired",
    "Homemaker",
    "Unemployed",
    "Other",
];
const CHILD_RELATIONSHIPS: &[&str] = &["Son", "Daughter", "Stepchild", "Adopted Child"];
const VISIT_PURPOSES: &[&str] = &[
    "Tourism",
    "Business",
    "Study",
    "Work",
    "Family Visit",
    "Transit",
    "Other",
];

static APPLICANT_INFO: FormSpec = FormSpec {
    form_type: FormType::ApplicantInfo,
    title: "Personal Information",
    fields: &[
        text("surname", "Surname").max(100),
        text("givenNames", "Given Names").max(100),
        text("fullNameNative", "Full Name in Native Alphabet").optional().max(200),
        select("sex", "Sex", SEX),
        select("maritalStatus", "Marital Status", MARITAL_STATUS),
        FieldSpec::new("dateOfBirth", "Date of Birth", FieldKind::DateOfBirth),
        text("cityOfBirth", "City of Birth").max(100),
        country("countryOfBirth", "Country of Birth"),
        country("nationality", "Nationality"),
        text("nationalIdNumber", "National Identification Number").optional().max(50),
    ],
    yes_no: &[
        yes_no("hasOtherNames", "Have you ever used other names?"),
        yes_no(
            "hasOtherNationality",
            "Do you hold or have you held any nationality other than the one indicated above?",
        ),
        yes_no(
            "isPermanentResidentElsewhere",
            "Are you a permanent resident of a country other than your country of nationality?",
        ),
    ],
    sections: &[],
};

static PASSPORT_INFO: FormSpec = FormSpec {
    form_type: FormType::PassportInfo,
    title: "Passport Information",
    fields: &[
        select("passportType", "Passport Type", PASSPORT_TYPES),
        FieldSpec::new("passportNumber", "Passport Number", FieldKind::PassportNumber),
        text("passportBookNumber", "Passport Book Number").optional().max(50),
        country("issuingCountry", "Country That Issued Passport"),
        text("issuanceCity", "City of Issuance").max(100),
        date("issuanceDate", "Issuance Date"),
        date("expirationDate", "Expiration Date"),
    ],
    yes_no: &[yes_no(
        "hasLostPassport",
        "Have you ever lost a passport or had one stolen?",
    )],
    sections: &[],
};

static CONTACT_INFO: FormSpec = FormSpec {
    form_type: FormType::ContactInfo,
    title: "Address and Phone",
    fields: &[
        long_text("homeAddress", "Home Address").max(500),
        text("city", "City").max(100),
        text("stateProvince", "State/Province").optional().max(100),
        text("postalCode", "Postal Code").optional().max(20),
        country("country", "Country"),
        FieldSpec::new("primaryPhone", "Primary Phone Number", FieldKind::Phone),
        FieldSpec::new("secondaryPhone", "Secondary Phone Number", FieldKind::Phone).optional(),
        FieldSpec::new("email", "Email Address", FieldKind::Email),
    ],
    yes_no: &[yes_no(
        "hasDifferentMailingAddress",
        "Is your mailing address different from your home address?",
    )],
    sections: &[],
};

static FAMILY_INFO: FormSpec = FormSpec {
    form_type: FormType::FamilyInfo,
    title: "Family Information",
    fields: &[
        text("fatherSurname", "Father's Surname").max(100),
        text("fatherGivenNames", "Father's Given Names").max(100),
        date("fatherDateOfBirth", "Father's Date of Birth").optional(),
        text("motherSurname", "Mother's Surname").max(100),
        text("motherGivenNames", "Mother's Given Names").max(100),
        date("motherDateOfBirth", "Mother's Date of Birth").optional(),
    ],
    yes_no: &[yes_no(
        "hasRelativesInDestination",
        "Do you have any immediate relatives in the destination country?",
    )],
    sections: &[
        SectionSpec {
            name: "spouse",
            label: "Spouse",
            fields: &[
                text("fullName", "Full Name").max(200),
                date("dateOfBirth", "Date of Birth"),
                country("nationality", "Nationality"),
                text("cityOfBirth", "City of Birth").max(100),
            ],
            min_entries: 1,
            max_entries: 1,
            allow_not_applicable: true,
        },
        SectionSpec {
            name: "children",
            label: "Children",
            fields: &[
                text("fullName", "Full Name").max(200),
                date("dateOfBirth", "Date of Birth"),
                select("relationship", "Relationship", CHILD_RELATIONSHIPS),
            ],
            min_entries: 1,
            max_entries: 20,
            allow_not_applicable: true,
        },
    ],
};

static EDUCATION_INFO: FormSpec = FormSpec {
    form_type: FormType::EducationInfo,
    title: "Education",
    fields: &[select("highestLevel", "Highest Level of Education", EDUCATION_LEVELS)],
    yes_no: &[],
    sections: &[SectionSpec {
        name: "education",
        label: "Education",
        fields: &[
            text("institutionName", "Name of Institution").max(200),
            long_text("address", "Address").max(500),
            text("courseOfStudy", "Course of Study").max(200),
            date("dateFrom", "Date of Attendance From"),
            date("dateTo", "Date of Attendance To"),
        ],
        min_entries: 1,
        max_entries: 10,
        allow_not_applicable: false,
    }],
};

static WORK_HISTORY: FormSpec = FormSpec {
    form_type: FormType::WorkHistory,
    title: "Work History",
    fields: &[select("primaryOccupation", "Primary Occupation", OCCUPATIONS)],
    yes_no: &[yes_no(
        "wasDismissed",
        "Have you ever been dismissed or asked to leave a job?",
    )],
    sections: &[SectionSpec {
        name: "workHistory",
        label: "Work History",
        fields: &[
            text("companyName", "Company Name").min(2).max(200),
            text("jobTitle", "Job Title").max(100),
            long_text("address", "Employer Address").max(500),
            FieldSpec::new("phone", "Employer Phone", FieldKind::Phone).optional(),
            date("dateFrom", "Employed From"),
            date("dateTo", "Employed To").optional(),
            long_text("duties", "Briefly Describe Your Duties"),
        ],
        min_entries: 1,
        max_entries: 10,
        allow_not_applicable: true,
    }],
};

static TRAVEL_HISTORY: FormSpec = FormSpec {
    form_type: FormType::TravelHistory,
    title: "Previous Travel",
    fields: &[],
    yes_no: &[
        yes_no("hasBeenRefusedVisa", "Have you ever been refused a visa?"),
        yes_no("hasOverstayed", "Have you ever stayed longer than permitted by a visa?"),
    ],
    sections: &[SectionSpec {
        name: "previousVisits",
        label: "Previous Visits",
        fields: &[
            country("countryVisited", "Country Visited"),
            date("dateOfArrival", "Date of Arrival"),
            FieldSpec::new("lengthOfStayDays", "Length of Stay (days)", FieldKind::Number),
            select("purpose", "Purpose of Visit", VISIT_PURPOSES),
        ],
        min_entries: 1,
        max_entries: 25,
        allow_not_applicable: true,
    }],
};

static MILITARY_SERVICE: FormSpec = FormSpec {
    form_type: FormType::MilitaryService,
    title: "Military Service",
    fields: &[],
    yes_no: &[
        yes_no(
            "hasWeaponsTraining",
            "Do you have any specialized skills or training, such as firearms or explosives?",
        ),
        yes_no(
            "hasServedInParamilitary",
            "Have you ever served in a paramilitary unit, vigilante unit or rebel group?",
        ),
    ],
    sections: &[SectionSpec {
        name: "service",
        label: "Military Service",
        fields: &[
            country("country", "Country"),
            text("branch", "Branch of Service").max(100),
            text("rank", "Rank/Position").max(100),
            text("specialty", "Military Specialty").optional().max(100),
            date("dateFrom", "Date of Service From"),
            date("dateTo", "Date of Service To"),
        ],
        min_entries: 1,
        max_entries: 5,
        allow_not_applicable: true,
    }],
};

static SECURITY_BACKGROUND: FormSpec = FormSpec {
    form_type: FormType::SecurityBackground,
    title: "Security and Background",
    fields: &[],
    yes_no: &[
        yes_no(
            "hasCommunicableDisease",
            "Do you have a communicable disease of public health significance?",
        ),
        yes_no(
            "hasMentalDisorder",
            "Do you have a mental or physical disorder that poses a threat to the safety of others?",
        ),
        yes_no("isDrugAbuser", "Are you or have you ever been a drug abuser or addict?"),
        yes_no(
            "hasBeenArrested",
            "Have you ever been arrested or convicted for any offense or crime?",
        ),
        yes_no(
            "hasViolatedDrugLaws",
            "Have you ever violated any law related to controlled substances?",
        ),
        yes_no(
            "hasTerroristActivity",
            "Have you ever engaged in or supported terrorist activities?",
        ),
        yes_no("hasBeenDeported", "Have you ever been removed or deported from any country?"),
        yes_no(
            "hasAssistedIllegalEntry",
            "Have you ever assisted others to obtain a visa or entry by fraud?",
        ),
    ],
    sections: &[],
};

pub fn form_spec(form_type: FormType) -> &'static FormSpec {
    match form_type {
        FormType::ApplicantInfo => &APPLICANT_INFO,
        FormType::PassportInfo => &PASSPORT_INFO,
        FormType::ContactInfo => &CONTACT_INFO,
        FormType::FamilyInfo => &FAMILY_INFO,
        FormType::EducationInfo => &EDUCATION_INFO,
        FormType::WorkHistory => &WORK_HISTORY,
        FormType::TravelHistory => &TRAVEL_HISTORY,
        FormType::MilitaryService => &MILITARY_SERVICE,
        FormType::SecurityBackground => &SECURITY_BACKGROUND,
    }
}

pub fn default_yes_no() -> Value {
    json!({ "value": "No", "explanation": "" })
}

/// Blank answers for one new entry of a repeatable section.
pub fn default_entry(section: &SectionSpec) -> Map<String, Value> {
    section
        .fields
        .iter()
        .map(|f| (f.name.to_string(), Value::String(String::new())))
        .collect()
}

/// Empty answers for a form: `""` for plain fields, `No` for Yes/No
/// questions and an applicable section without entries.
pub fn generate_default_values(form_type: FormType) -> Map<String, Value> {
    let spec = form_spec(form_type);
    let mut values = Map::new();
    for field in spec.fields {
        values.insert(field.name.to_string(), Value::String(String::new()));
    }
    for question in spec.yes_no {
        values.insert(question.name.to_string(), default_yes_no());
    }
    for section in spec.sections {
        values.insert(
            section.name.to_string(),
            json!({ "status": "APPLICABLE", "entries": [] }),
        );
    }
    values
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathResolveError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("'{0}' is not a repeatable section")]
    NotASection(String),
    #[error("entry {index} is out of range for '{section}'")]
    IndexOutOfRange { section: String, index: usize },
}

/// Checks a path against the registry, turning a bare section name into
/// [`FieldPath::Section`].
pub fn resolve_path(form_type: FormType, path: FieldPath) -> Result<FieldPath, PathResolveError> {
    let spec = form_spec(form_type);
    match path {
        FieldPath::Field(name) | FieldPath::Section(name) => {
            if spec.section(&name).is_some() {
                Ok(FieldPath::Section(name))
            } else if spec.field(&name).is_some() || spec.yes_no(&name).is_some() {
                Ok(FieldPath::Field(name))
            } else {
                Err(PathResolveError::UnknownField(name))
            }
        }
        FieldPath::Entry {
            section,
            index,
            field,
        } => {
            let Some(section_spec) = spec.section(&section) else {
                return Err(if spec.field(&section).is_some() || spec.yes_no(&section).is_some() {
                    PathResolveError::NotASection(section)
                } else {
                    PathResolveError::UnknownField(section)
                });
            };
            if index.0 >= section_spec.max_entries {
                return Err(PathResolveError::IndexOutOfRange {
                    section,
                    index: index.0,
                });
            }
            if section_spec.field(&field).is_none() {
                return Err(PathResolveError::UnknownField(format!("{}.{}", section, field)));
            }
            Ok(FieldPath::Entry {
                section,
                index,
                field,
            })
        }
    }
}

/// Human-readable label chain, e.g. `Work History > Entry 1 > Company Name`.
/// Top-level fields and whole sections are a single label.
pub fn breadcrumb(form_type: FormType, path: &FieldPath) -> Option<String> {
    let spec = form_spec(form_type);
    match path {
        FieldPath::Field(name) | FieldPath::Section(name) => spec
            .field(name)
            .map(|f| f.label)
            .or_else(|| spec.yes_no(name).map(|y| y.label))
            .or_else(|| spec.section(name).map(|s| s.label))
            .map(str::to_string),
        FieldPath::Entry {
            section,
            index,
            field,
        } => {
            let section_spec = spec.section(section)?;
            let field_spec = section_spec.field(field)?;
            Some(format!(
                "{} > Entry {} > {}",
                section_spec.label,
                index.ordinal(),
                field_spec.label
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_values_match_registry_keys() {
        for form_type in FormType::ALL {
            let defaults = generate_default_values(form_type);
            let keys: HashSet<&str> = defaults.keys().map(String::as_str).collect();
            let expected: HashSet<&str> = form_spec(form_type).keys().collect();
            assert_eq!(keys, expected, "key mismatch for {}", form_type);

            let spec = form_spec(form_type);
            for field in spec.fields {
                assert_eq!(defaults[field.name], json!(""));
            }
            for question in spec.yes_no {
                assert_eq!(
                    defaults[question.name],
                    json!({ "value": "No", "explanation": "" })
                );
            }
        }
    }

    #[test]
    fn keys_are_unique_per_form() {
        for form_type in FormType::ALL {
            let keys: Vec<&str> = form_spec(form_type).keys().collect();
            let unique: HashSet<&str> = keys.iter().copied().collect();
            assert_eq!(keys.len(), unique.len(), "duplicate key in {}", form_type);
            assert!(!keys.is_empty());
        }
    }

    #[test]
    fn sections_declare_sane_bounds() {
        for form_type in FormType::ALL {
            for section in form_spec(form_type).sections {
                assert!(section.max_entries >= section.min_entries);
                assert!(!section.fields.is_empty());
            }
        }
    }

    #[test]
    fn breadcrumbs_are_label_chains() {
        let path = FieldPath::entry("workHistory", 0, "companyName");
        assert_eq!(
            breadcrumb(FormType::WorkHistory, &path).as_deref(),
            Some("Work History > Entry 1 > Company Name")
        );
        let path = FieldPath::field("passportNumber");
        assert_eq!(
            breadcrumb(FormType::PassportInfo, &path).as_deref(),
            Some("Passport Number")
        );
        assert_eq!(
            breadcrumb(FormType::FamilyInfo, &FieldPath::Section("children".to_string())).as_deref(),
            Some("Children")
        );
        assert!(breadcrumb(FormType::PassportInfo, &FieldPath::field("surname")).is_none());
    }

    #[test]
    fn resolve_normalizes_sections_and_rejects_unknown() {
        let resolved = resolve_path(FormType::FamilyInfo, FieldPath::field("children")).unwrap();
        assert_eq!(resolved, FieldPath::Section("children".to_string()));

        let err = resolve_path(FormType::FamilyInfo, FieldPath::field("employer")).unwrap_err();
        assert_eq!(err, PathResolveError::UnknownField("employer".to_string()));

        let err = resolve_path(
            FormType::FamilyInfo,
            FieldPath::entry("fatherSurname", 0, "fullName"),
        )
        .unwrap_err();
        assert_eq!(err, PathResolveError::NotASection("fatherSurname".to_string()));

        let err =
            resolve_path(FormType::FamilyInfo, FieldPath::entry("spouse", 1, "fullName")).unwrap_err();
        assert!(matches!(err, PathResolveError::IndexOutOfRange { index: 1, .. }));
    }

    #[test]
    fn schema_serializes_select_options() {
        let json = serde_json::to_value(form_spec(FormType::ApplicantInfo)).unwrap();
        let sex = &json["fields"][3];
        assert_eq!(sex["name"], "sex");
        assert_eq!(sex["kind"]["type"], "select");
        assert_eq!(sex["kind"]["options"], json!(["Male", "Female"]));
    }
}
